//! Shared parsing for the wire names of status-like enums.

use std::fmt;

/// A string did not name any variant of the expected enum.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseStatusError {
    pub kind: &'static str,
    pub value: String,
}

impl fmt::Display for ParseStatusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {} '{}'", self.kind, self.value)
    }
}

impl std::error::Error for ParseStatusError {}

/// Look `raw` up among `(wire_name, variant)` pairs.
///
/// Matching ignores ASCII case and treats `-` and spaces as `_`, so
/// `"in transit"`, `"in-transit"` and `"IN_TRANSIT"` are all accepted.
pub(crate) fn parse_keyword<T: Copy>(
    raw: &str,
    table: &[(&'static str, T)],
    kind: &'static str,
) -> Result<T, ParseStatusError> {
    let normalized: String = raw
        .trim()
        .chars()
        .map(|c| if c == '-' || c == ' ' { '_' } else { c })
        .collect();
    table
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(&normalized))
        .map(|(_, v)| *v)
        .ok_or_else(|| ParseStatusError {
            kind,
            value: raw.to_string(),
        })
}
