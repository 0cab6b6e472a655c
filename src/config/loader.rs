//! Loading and saving plan and run documents.
//!
//! Documents are JSON or YAML, chosen by file extension.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::path::Path;
use tracing::{debug, info};

use crate::error::{DocumentError, PlanCheckError, Result};

/// Supported document encodings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    /// `.json`
    Json,
    /// `.yaml` or `.yml`
    Yaml,
}

impl DocumentFormat {
    /// Picks the format from a path's extension.
    ///
    /// # Errors
    ///
    /// Returns an error for any other extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);

        match extension.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("yaml" | "yml") => Ok(Self::Yaml),
            _ => Err(PlanCheckError::Document(DocumentError::UnsupportedFormat {
                path: path.to_path_buf(),
            })),
        }
    }
}

/// Decodes a document from a string.
///
/// # Errors
///
/// Returns an error if the content does not decode into `T`.
pub fn parse_document<T>(content: &str, format: DocumentFormat, location: &str) -> Result<T>
where
    T: DeserializeOwned,
{
    debug!("Parsing {format:?} document from {location}");

    let parsed = match format {
        DocumentFormat::Json => {
            serde_json::from_str(content).map_err(|e| DocumentError::parse(location, e.to_string()))
        }
        DocumentFormat::Yaml => {
            serde_yaml::from_str(content).map_err(|e| DocumentError::parse(location, e.to_string()))
        }
    };

    Ok(parsed?)
}

/// Reads and decodes a document from disk.
///
/// # Errors
///
/// Returns an error if the file is missing, has an unsupported extension or
/// does not decode into `T`.
pub fn load_document<T>(path: impl AsRef<Path>) -> Result<T>
where
    T: DeserializeOwned,
{
    let path = path.as_ref();
    info!("Loading document from: {}", path.display());

    let format = DocumentFormat::from_path(path)?;
    if !path.exists() {
        return Err(PlanCheckError::Document(DocumentError::NotFound {
            path: path.to_path_buf(),
        }));
    }

    let content = std::fs::read_to_string(path)?;
    parse_document(&content, format, &path.display().to_string())
}

/// Encodes a document into a string.
///
/// # Errors
///
/// Returns an error if `value` cannot be encoded.
pub fn render_document<T>(value: &T, format: DocumentFormat) -> Result<String>
where
    T: Serialize,
{
    let rendered = match format {
        DocumentFormat::Json => serde_json::to_string_pretty(value).map_err(|e| e.to_string()),
        DocumentFormat::Yaml => serde_yaml::to_string(value).map_err(|e| e.to_string()),
    };

    rendered.map_err(|message| PlanCheckError::Document(DocumentError::Serialize { message }))
}

/// Encodes a document and writes it to disk.
///
/// # Errors
///
/// Returns an error if the extension is unsupported, encoding fails or the
/// file cannot be written.
pub fn save_document<T>(path: impl AsRef<Path>, value: &T) -> Result<()>
where
    T: Serialize,
{
    let path = path.as_ref();
    let content = render_document(value, DocumentFormat::from_path(path)?)?;
    std::fs::write(path, content)?;
    info!("Wrote document to: {}", path.display());
    Ok(())
}
