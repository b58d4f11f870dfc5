mod error;
mod grammar;

pub use error::ParseError;

use crate::{Keystring, LevelSpec};

/// Parse a level specification such as `"0:24, 1:22, 2:20"`.
///
/// # Errors
///
/// Returns [`ParseError`] if the text is malformed or describes an invalid
/// set of levels.
pub fn parse_levels(input: &str) -> Result<LevelSpec, ParseError> {
    use winnow::Parser;
    let pairs = grammar::level_pairs
        .parse(input)
        .map_err(|e| ParseError::new(e.to_string()))?;
    LevelSpec::new(pairs)
}

/// Parse a dispatch keystring, `"key=value"` or `"key=*"`.
///
/// # Errors
///
/// Returns [`ParseError`] if the text has no key, no `=` or no value.
pub fn parse_keystring(input: &str) -> Result<Keystring, ParseError> {
    use winnow::Parser;
    grammar::keystring
        .parse(input)
        .map_err(|e| ParseError::new(e.to_string()))
}
