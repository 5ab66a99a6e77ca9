/*!
 * Reassembly of translated chunks into one document.
 */

use crate::errors::PipelineError;

use super::chunk::Chunk;

/// Joins chunk bodies back together in split order
pub struct Reassembler;

impl Reassembler {
    /// Concatenate chunk bodies, preferring translations over source content.
    ///
    /// Whitespace trimmed off by the splitter is put back around each body.
    /// Chunks must come from a single split in their original order; ids that
    /// are not strictly increasing or mixed `file_id`s are rejected.
    pub fn build(chunks: &[Chunk]) -> Result<String, PipelineError> {
        Self::check_order(chunks)?;

        let capacity = chunks
            .iter()
            .map(|c| c.leading_whitespace.len() + c.body().len() + c.trailing_whitespace.len())
            .sum();
        let mut out = String::with_capacity(capacity);

        for chunk in chunks {
            out.push_str(&chunk.leading_whitespace);
            out.push_str(chunk.body());
            out.push_str(&chunk.trailing_whitespace);
        }
        Ok(out)
    }

    fn check_order(chunks: &[Chunk]) -> Result<(), PipelineError> {
        let mut previous: Option<u64> = None;

        for chunk in chunks {
            let id: u64 = chunk.id.parse().map_err(|_| {
                PipelineError::InvalidInput(format!("chunk id {:?} is not a sequence number", chunk.id))
            })?;

            if previous.is_some_and(|prev| id <= prev) {
                return Err(PipelineError::InvalidInput(format!(
                    "chunk {} is out of order",
                    chunk.id
                )));
            }
            if chunk.file_id != chunks[0].file_id {
                return Err(PipelineError::InvalidInput(format!(
                    "chunk {} belongs to '{}' but the sequence is for '{}'",
                    chunk.id, chunk.file_id, chunks[0].file_id
                )));
            }
            previous = Some(id);
        }
        Ok(())
    }
}
