//! Custom error types for xmldiff.

#[derive(Debug, thiserror::Error)]
pub enum ParseError {
    #[error("File not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to read file {path}: {source}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed XML in {path} at byte {position}: {message}")]
    Malformed {
        path: String,
        position: u64,
        message: String,
    },

    #[error("No root element in {path}")]
    EmptyDocument { path: String },
}

#[derive(Debug, thiserror::Error)]
pub enum OutputError {
    #[error("Unknown output format: {format}")]
    UnknownFormat { format: String },

    #[error("Failed to serialize to JSON: {source}")]
    JsonSerializationError {
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    ReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid TOML in {path}: {source}")]
    TomlError {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Unknown element selector: {name}")]
    UnknownSelector { name: String },

    #[error("Invalid namespace binding '{binding}', expected PREFIX=URI")]
    InvalidNamespace { binding: String },

    #[error("Unknown check mode: {mode}")]
    UnknownCheck { mode: String },
}

#[derive(Debug, thiserror::Error)]
pub enum XmlDiffError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Output(#[from] OutputError),

    #[error(transparent)]
    Config(#[from] ConfigError),
}

impl ParseError {
    pub fn file_not_found(path: impl Into<String>) -> Self {
        Self::FileNotFound { path: path.into() }
    }

    pub fn read_error(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::ReadError {
            path: path.into(),
            source,
        }
    }

    pub fn malformed(path: impl Into<String>, position: u64, message: impl Into<String>) -> Self {
        Self::Malformed {
            path: path.into(),
            position,
            message: message.into(),
        }
    }

    pub fn empty_document(path: impl Into<String>) -> Self {
        Self::EmptyDocument { path: path.into() }
    }
}

impl ConfigError {
    pub fn unknown_selector(name: impl Into<String>) -> Self {
        Self::UnknownSelector { name: name.into() }
    }

    pub fn invalid_namespace(binding: impl Into<String>) -> Self {
        Self::InvalidNamespace {
            binding: binding.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = ParseError::file_not_found("test.xml");
        assert_eq!(err.to_string(), "File not found: test.xml");
    }

    #[test]
    fn test_malformed_error_has_position() {
        let err = ParseError::malformed("a.xml", 17, "unexpected end tag");
        assert_eq!(
            err.to_string(),
            "Malformed XML in a.xml at byte 17: unexpected end tag"
        );
    }

    #[test]
    fn test_output_error_display() {
        let err = OutputError::UnknownFormat {
            format: "yaml".to_string(),
        };
        assert_eq!(err.to_string(), "Unknown output format: yaml");
    }

    #[test]
    fn test_error_from_parse_error() {
        let err: XmlDiffError = ParseError::file_not_found("test.xml").into();
        assert!(matches!(err, XmlDiffError::Parse(_)));
    }

    #[test]
    fn test_config_errors() {
        let err: XmlDiffError = ConfigError::unknown_selector("by-color").into();
        assert!(err.to_string().contains("by-color"));
        assert!(ConfigError::invalid_namespace("x")
            .to_string()
            .contains("PREFIX=URI"));
    }
}
