// Error taxonomy of the converter.

use thiserror::Error;


/// Errors raised while building the dictionaries.
///
/// Rows with missing fields are not errors, they are skipped and counted.
#[derive(Debug, Error)]
pub enum DictError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("spreadsheet error: {0}")]
    Spreadsheet(String),

    #[error("invalid rule pattern: {0}")]
    Regex(#[from] regex::Error),

    #[error("cache error: {0}")]
    Cache(String),

    #[error("{tool} not found in PATH")]
    ToolMissing { tool: String },

    #[error("{tool} failed ({status}): {stderr}")]
    ToolFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("failed to parse configuration file: {0}")]
    TomlParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, DictError>;

impl From<bincode::Error> for DictError {
    fn from(e: bincode::Error) -> Self {
        DictError::Cache(e.to_string())
    }
}

impl From<calamine::Error> for DictError {
    fn from(e: calamine::Error) -> Self {
        DictError::Spreadsheet(e.to_string())
    }
}
