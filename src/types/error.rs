use std::fmt;

use thiserror::Error;

use super::feature_type::FeatureKind;

/// Position of a rule in the style source, as reported by the parser that
/// produced it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceLocation {
    pub file: String,
    pub line: u32,
}

impl SourceLocation {
    #[must_use]
    pub fn new(file: impl Into<String>, line: u32) -> Self {
        Self {
            file: file.into(),
            line,
        }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file, self.line)
    }
}

fn at(location: &Option<SourceLocation>) -> String {
    location
        .as_ref()
        .map(|l| format!("{l}: "))
        .unwrap_or_default()
}

/// Errors that make a rule set impossible to load.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompileError {
    #[error("{}rule '{predicate}' has no indexable tag test; it must start from at least one tag=value or tag=*", at(.location))]
    NotIndexable {
        predicate: String,
        location: Option<SourceLocation>,
    },

    #[error("{}finalize rules must not carry a feature type", at(.location))]
    TypedFinalizeRule { location: Option<SourceLocation> },

    #[error("{}only one finalize section is allowed", at(.location))]
    DuplicateFinalize { location: Option<SourceLocation> },

    #[error("{}invalid type {code:#x} for {kind}", at(.location))]
    InvalidTypeCode {
        kind: FeatureKind,
        code: u32,
        location: Option<SourceLocation>,
    },

    #[error("{}resolution {resolution} is outside 0-24", at(.location))]
    InvalidResolution {
        resolution: u8,
        location: Option<SourceLocation>,
    },

    #[error("{}level number {level} too large, max={max}", at(.location))]
    LevelOutOfRange {
        level: u8,
        max: u8,
        location: Option<SourceLocation>,
    },

    #[error("{}{attribute} {value} is out of range", at(.location))]
    InvalidRoadAttribute {
        attribute: &'static str,
        value: u8,
        location: Option<SourceLocation>,
    },

    #[error("{}no type definition given", at(.location))]
    MissingType { location: Option<SourceLocation> },

    #[error("{}rule has no condition", at(.location))]
    MissingCondition { location: Option<SourceLocation> },

    #[error("{}invalid keystring '{keystring}'", at(.location))]
    InvalidKeystring {
        keystring: String,
        location: Option<SourceLocation>,
    },
}

impl CompileError {
    /// Attach a source location unless one is already present.
    #[must_use]
    pub fn at(mut self, location: Option<&SourceLocation>) -> Self {
        let slot = match &mut self {
            CompileError::NotIndexable { location, .. }
            | CompileError::TypedFinalizeRule { location }
            | CompileError::DuplicateFinalize { location }
            | CompileError::InvalidTypeCode { location, .. }
            | CompileError::InvalidResolution { location, .. }
            | CompileError::LevelOutOfRange { location, .. }
            | CompileError::InvalidRoadAttribute { location, .. }
            | CompileError::MissingType { location }
            | CompileError::MissingCondition { location }
            | CompileError::InvalidKeystring { location, .. } => location,
        };
        if slot.is_none() {
            *slot = location.cloned();
        }
        self
    }

    /// The source location of the offending rule, if known.
    #[must_use]
    pub fn location(&self) -> Option<&SourceLocation> {
        match self {
            CompileError::NotIndexable { location, .. }
            | CompileError::TypedFinalizeRule { location }
            | CompileError::DuplicateFinalize { location }
            | CompileError::InvalidTypeCode { location, .. }
            | CompileError::InvalidResolution { location, .. }
            | CompileError::LevelOutOfRange { location, .. }
            | CompileError::InvalidRoadAttribute { location, .. }
            | CompileError::MissingType { location }
            | CompileError::MissingCondition { location }
            | CompileError::InvalidKeystring { location, .. } => location.as_ref(),
        }
    }
}
