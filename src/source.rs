//! Text acquisition boundary.
//!
//! The pipeline consumes a plain `&str` and never cares where it came from.
//! A [`TextSource`] supplies that text and may fail before the core ever
//! runs; the failure belongs to the caller of the whole program, not to the
//! pipeline. The core performs no retries — retry policy, if any, lives out
//! here.

use std::io::Read;
use std::path::PathBuf;
use thiserror::Error;

/// Failure modes of text acquisition.
#[derive(Debug, Error)]
pub enum SourceError {
    /// Reading a local source failed.
    #[error("failed to read {name}")]
    Io {
        name: String,
        #[source]
        source: std::io::Error,
    },

    /// Fetching a remote source failed (connection, TLS, or a non-success
    /// HTTP status).
    #[cfg(feature = "fetch")]
    #[error("failed to fetch {url}")]
    Http {
        url: String,
        #[source]
        source: reqwest::Error,
    },
}

/// Supplies the raw text for a pipeline run.
pub trait TextSource {
    /// Acquire the full text, or report why it could not be obtained.
    fn fetch(&self) -> Result<String, SourceError>;
}

/// Reads the text from a file on disk.
#[derive(Debug, Clone)]
pub struct FileSource {
    path: PathBuf,
}

impl FileSource {
    /// Create a source for the given path.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl TextSource for FileSource {
    fn fetch(&self) -> Result<String, SourceError> {
        std::fs::read_to_string(&self.path).map_err(|source| SourceError::Io {
            name: self.path.display().to_string(),
            source,
        })
    }
}

/// Reads the text from standard input.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdinSource;

impl TextSource for StdinSource {
    fn fetch(&self) -> Result<String, SourceError> {
        let mut text = String::new();
        std::io::stdin()
            .lock()
            .read_to_string(&mut text)
            .map_err(|source| SourceError::Io {
                name: "stdin".to_string(),
                source,
            })?;
        Ok(text)
    }
}

/// Downloads the text from a URL.
///
/// Non-success HTTP statuses are reported as errors, matching the usual
/// fetch-then-check contract.
#[cfg(feature = "fetch")]
#[derive(Debug, Clone)]
pub struct HttpSource {
    url: String,
}

#[cfg(feature = "fetch")]
impl HttpSource {
    /// Create a source for the given URL.
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

#[cfg(feature = "fetch")]
impl TextSource for HttpSource {
    fn fetch(&self) -> Result<String, SourceError> {
        let wrap = |source: reqwest::Error| SourceError::Http {
            url: self.url.clone(),
            source,
        };
        reqwest::blocking::get(&self.url)
            .map_err(wrap)?
            .error_for_status()
            .map_err(wrap)?
            .text()
            .map_err(wrap)
    }
}
