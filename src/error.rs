use thiserror::Error;

use crate::parse::ParseError;
use crate::CompileError;

/// Unified error type covering configuration text and rule compilation.
#[derive(Debug, Error)]
pub enum StyleError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Compile(#[from] CompileError),
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{tag, FeatureKind, FeatureType, LevelSpec, RuleSet, RuleSetBuilder};

    fn load(levels: &str) -> Result<RuleSet, StyleError> {
        let levels: LevelSpec = levels.parse()?;
        let rules = RuleSetBuilder::new(FeatureKind::Polyline)
            .levels(levels)
            .rule(|r| r.when(tag("highway").exists()).with_type(FeatureType::builder(0x2).level(4)))
            .compile()?;
        Ok(rules)
    }

    #[test]
    fn both_error_kinds_convert() {
        assert!(load("0:24 1:22 2:20 3:18 4:16").is_ok());
        assert!(matches!(load("0:24 0:22"), Err(StyleError::Parse(_))));
        assert!(matches!(load("0:24 1:22"), Err(StyleError::Compile(_))));
    }

    #[test]
    fn messages_pass_through() {
        let err = load("0:24 1:22").unwrap_err();
        assert_eq!(err.to_string(), "level number 4 too large, max=1");
    }
}
