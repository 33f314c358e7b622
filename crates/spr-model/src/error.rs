//! Error types for the registration model

/// Errors constructing model values
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    /// Identifier is not a valid dotted binary name
    #[error("invalid identifier '{name}': {reason}")]
    InvalidIdentifier {
        /// Offending name
        name: String,
        /// Why it was rejected
        reason: String,
    },

    /// Resource path is malformed
    #[error("invalid resource path '{path}': {reason}")]
    InvalidResourcePath {
        /// Offending path
        path: String,
        /// Why it was rejected
        reason: String,
    },
}

impl ModelError {
    /// Create invalid identifier error
    pub fn invalid_identifier(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidIdentifier {
            name: name.into(),
            reason: reason.into(),
        }
    }

    /// Create invalid resource path error
    pub fn invalid_resource_path(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidResourcePath {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Errors parsing a registry artifact
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LineFormatError {
    /// Metadata line before any identifier
    #[error("line {line}: '{text}' does not follow an implementation line")]
    DanglingMetadata {
        /// 1-based line number
        line: usize,
        /// Line content
        text: String,
    },

    /// `#position=` value is not an integer
    #[error("line {line}: invalid position '{value}'")]
    InvalidPosition {
        /// 1-based line number
        line: usize,
        /// Unparsed value
        value: String,
    },

    /// Identifier line is not a valid binary name
    #[error("line {line}: {source}")]
    InvalidIdentifier {
        /// 1-based line number
        line: usize,
        /// Underlying model error
        #[source]
        source: ModelError,
    },
}

impl LineFormatError {
    /// 1-based line number of the failure
    #[inline]
    #[must_use]
    pub fn line(&self) -> usize {
        match self {
            Self::DanglingMetadata { line, .. }
            | Self::InvalidPosition { line, .. }
            | Self::InvalidIdentifier { line, .. } => *line,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn model_error_display() {
        let err = ModelError::invalid_identifier("a..b", "empty segment");
        assert_eq!(err.to_string(), "invalid identifier 'a..b': empty segment");
    }

    #[test]
    fn line_error_reports_line() {
        let err = LineFormatError::InvalidPosition {
            line: 4,
            value: "abc".to_string(),
        };
        assert_eq!(err.line(), 4);
        assert_eq!(err.to_string(), "line 4: invalid position 'abc'");
    }
}
