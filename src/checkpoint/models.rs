/*!
 * Persisted checkpoint record.
 *
 * On disk the state is one JSON object keyed by document identifier:
 *
 * ```json
 * { "book": { "processed_files": ["ch1.xhtml", "ch2.xhtml"] } }
 * ```
 */

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Progress of one document
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentRecord {
    /// Sub-files whose translation finished
    #[serde(default)]
    pub processed_files: BTreeSet<String>,
}

/// Whole checkpoint state, document identifier to record
pub type CheckpointState = BTreeMap<String, DocumentRecord>;
