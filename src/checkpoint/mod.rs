/*!
 * Resumable-run bookkeeping.
 *
 * The checkpoint store remembers which sub-files of each document have been
 * fully translated so an interrupted run can pick up where it stopped:
 * - `models`: the persisted record layout
 * - `store`: loading, marking and clearing with atomic writes
 */

pub mod models;
pub mod store;

pub use models::{CheckpointState, DocumentRecord};
pub use store::CheckpointStore;
