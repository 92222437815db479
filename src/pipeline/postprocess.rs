//! Post-processing: strip code fences the model added anyway.
//!
//! The diagram and merge prompts both ask for bare Mermaid, but models
//! regularly wrap the answer in ```` ```mermaid … ``` ````. Stored verbatim,
//! that would put the fence inside the page's `mermaid` code block and
//! break rendering.

use once_cell::sync::Lazy;
use regex::Regex;

static RE_FENCE: Lazy<Regex> = Lazy::new(|| Regex::new(r"```(?:mermaid)?").unwrap());

/// Remove every ```` ```mermaid ```` and ```` ``` ```` marker and trim.
///
/// Text without any marker is returned unchanged, so applying this twice
/// gives the same result as applying it once.
pub fn strip_code_fences(input: &str) -> String {
    if !RE_FENCE.is_match(input) {
        return input.to_string();
    }
    RE_FENCE.replace_all(input, "").trim().to_string()
}
