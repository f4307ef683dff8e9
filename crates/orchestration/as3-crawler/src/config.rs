//! Configuration for a crawl.

use as3_error::{CrawlError, Result};
use serde::{Deserialize, Serialize};

/// Default number of concurrent listing calls.
pub const DEFAULT_PARALLELISM: usize = 100;

/// Default folder delimiter.
pub const DEFAULT_DELIMITER: char = '/';

/// Parameters of one crawl.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Folder depth after which a subtree is listed flatly (`None` = never)
    pub max_level: Option<usize>,

    /// Maximum children a folder fans out to before they are grouped (`None` = unbounded)
    pub max_folders: Option<usize>,

    /// Folder delimiter
    pub delimiter: char,

    /// Maximum concurrent listing calls
    pub parallelism: usize,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self {
            max_level: None,
            max_folders: None,
            delimiter: DEFAULT_DELIMITER,
            parallelism: DEFAULT_PARALLELISM,
        }
    }
}

impl CrawlConfig {
    /// Create a new crawl configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the maximum folder depth listed with separate requests.
    pub fn with_max_level(mut self, max_level: Option<usize>) -> Self {
        self.max_level = max_level;
        self
    }

    /// Set the maximum number of folders a listing fans out to.
    pub fn with_max_folders(mut self, max_folders: Option<usize>) -> Self {
        self.max_folders = max_folders;
        self
    }

    /// Set the folder delimiter.
    pub fn with_delimiter(mut self, delimiter: char) -> Self {
        self.delimiter = delimiter;
        self
    }

    /// Set the maximum concurrent listing calls.
    pub fn with_parallelism(mut self, parallelism: usize) -> Self {
        self.parallelism = parallelism;
        self
    }

    /// Check the parameters.
    pub fn validate(&self) -> Result<()> {
        if self.parallelism == 0 {
            return Err(CrawlError::Config(
                "parallelism must be at least 1".to_string(),
            ));
        }
        if self.max_folders == Some(0) {
            return Err(CrawlError::Config(
                "max_folders must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Parse a delimiter argument, which must be exactly one character.
pub fn parse_delimiter(value: &str) -> Result<char> {
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Ok(c),
        _ => Err(CrawlError::Config(
            "Delimiter must be exactly one character.".to_string(),
        )),
    }
}
