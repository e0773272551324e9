//! Best-effort extraction of a structured block from free-form model output
//!
//! Advisor answers are natural language that should contain one JSON object.
//! Balanced top-level `{...}` blocks are located left to right (string
//! literals and escapes are honoured, so braces inside strings do not count)
//! and the first one that deserialises as a whole wins. A block that does not
//! fit the requested shape is rejected outright; nothing is salvaged from it.

use serde::de::DeserializeOwned;

#[derive(thiserror::Error, Debug)]
pub enum ExtractionError {
    #[error("no balanced brace block found")]
    NoBlock,

    #[error("block failed to parse: {0}")]
    Invalid(#[from] serde_json::Error),
}

/// Every balanced top-level `{...}` slice of `text`, left to right
///
/// Stops at the first `{` that never closes.
pub fn blocks(text: &str) -> impl Iterator<Item = &str> {
    let mut cursor = 0usize;
    std::iter::from_fn(move || {
        let start = cursor + text[cursor..].find('{')?;
        let end = block_end(text, start)?;
        cursor = end;
        Some(&text[start..end])
    })
}

/// Byte offset just past the `}` closing the brace at `start`
fn block_end(text: &str, start: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset + c.len_utf8());
                }
            }
            _ => {}
        }
    }

    None
}

/// Deserialises the first block that parses completely into `T`
///
/// When blocks exist but none fits, the error from the last one is returned.
pub fn extract<T: DeserializeOwned>(text: &str) -> Result<T, ExtractionError> {
    let mut last_error = None;
    for block in blocks(text) {
        match serde_json::from_str(block) {
            Ok(value) => return Ok(value),
            Err(e) => last_error = Some(e),
        }
    }
    Err(last_error.map_or(ExtractionError::NoBlock, ExtractionError::Invalid))
}
