//! Error Model
//!
//! Every failure maps onto one of four kinds so callers (the batch driver,
//! the CLI) can report without matching on every variant.

use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

pub type ForgeResult<T> = Result<T, ForgeError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    IoFailure,
    ParseFailure,
}

#[derive(Debug, Error)]
pub enum ForgeError {
    #[error("Palette not found: {0}")]
    PaletteNotFound(String),

    #[error("Template not found: {format} style '{name}'")]
    TemplateNotFound { format: String, name: String },

    #[error("Preset not found: {0}")]
    PresetNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Invalid color for {field}: {value}")]
    InvalidColor { field: String, value: String },

    #[error("Unresolved placeholders in template '{template}': {}", .tokens.join(", "))]
    UnresolvedPlaceholders { template: String, tokens: Vec<String> },

    #[error("I/O error on {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {}: {message}", .path.display())]
    Parse { path: PathBuf, message: String },

    #[error("Unusable font {}: {message}", .path.display())]
    Font { path: PathBuf, message: String },

    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ForgeError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }

    pub fn parse(path: impl Into<PathBuf>, message: impl ToString) -> Self {
        Self::Parse { path: path.into(), message: message.to_string() }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::PaletteNotFound(_) | Self::TemplateNotFound { .. } | Self::PresetNotFound(_) => {
                ErrorKind::NotFound
            }
            Self::InvalidInput(_) => ErrorKind::InvalidInput,
            Self::Io { .. } | Self::Image(_) => ErrorKind::IoFailure,
            Self::InvalidColor { .. }
            | Self::UnresolvedPlaceholders { .. }
            | Self::Parse { .. }
            | Self::Font { .. }
            | Self::Serialization(_) => ErrorKind::ParseFailure,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_cover_lookup_failures() {
        assert_eq!(ForgeError::PaletteNotFound("x".into()).kind(), ErrorKind::NotFound);
        assert_eq!(
            ForgeError::TemplateNotFound { format: "svg".into(), name: "x".into() }.kind(),
            ErrorKind::NotFound
        );
    }

    #[test]
    fn unresolved_lists_tokens() {
        let err = ForgeError::UnresolvedPlaceholders {
            template: "wave".into(),
            tokens: vec!["{{A}}".into(), "{{B}}".into()],
        };
        assert_eq!(err.kind(), ErrorKind::ParseFailure);
        assert!(err.to_string().contains("{{A}}, {{B}}"));
    }

    #[test]
    fn io_message_leaves_cause_to_source_chain() {
        let cause = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err = ForgeError::io("mine.json", cause);
        assert_eq!(err.to_string(), "I/O error on mine.json");
        assert_eq!(std::error::Error::source(&err).unwrap().to_string(), "gone");
        assert_eq!(err.kind(), ErrorKind::IoFailure);
    }
}
