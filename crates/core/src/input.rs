//! Operator inputs: the inventory file and the industry choice.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Extensions the mapping server knows how to parse.
pub const ALLOWED_EXTENSIONS: [&str; 3] = ["xlsx", "xls", "csv"];

/// Errors raised while validating operator input.
#[derive(Debug, Error)]
pub enum InputError {
    #[error("Allowed formats: .xlsx, .xls, .csv")]
    UnsupportedFormat(String),

    #[error("Cannot read {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Unknown industry: {0}")]
    UnknownIndustry(String),
}

/// Reference to the inventory spreadsheet chosen by the operator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileHandle {
    path: PathBuf,
    name: String,
    size_bytes: u64,
}

impl FileHandle {
    /// Build a handle for a local file, checking its extension and size.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, InputError> {
        let path = path.as_ref();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        let ext = path
            .extension()
            .map(|e| e.to_string_lossy().to_lowercase())
            .unwrap_or_default();
        if !ALLOWED_EXTENSIONS.contains(&ext.as_str()) {
            return Err(InputError::UnsupportedFormat(name));
        }

        let metadata = std::fs::metadata(path).map_err(|source| InputError::Unreadable {
            path: path.display().to_string(),
            source,
        })?;
        if !metadata.is_file() {
            return Err(InputError::Unreadable {
                path: path.display().to_string(),
                source: std::io::Error::new(std::io::ErrorKind::InvalidInput, "not a file"),
            });
        }

        Ok(Self {
            path: path.to_path_buf(),
            name,
            size_bytes: metadata.len(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn size_bytes(&self) -> u64 {
        self.size_bytes
    }

    /// Size formatted the way the upload zone shows it, e.g. `12.3 KB`.
    pub fn display_size(&self) -> String {
        format!("{:.1} KB", self.size_bytes as f64 / 1024.0)
    }
}

/// Industry lens applied to the taxonomy mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Industry {
    #[serde(rename = "Banking & FS")]
    BankingFs,
    #[serde(rename = "Healthcare")]
    Healthcare,
    #[serde(rename = "Retail")]
    Retail,
    #[serde(rename = "Manufacturing")]
    Manufacturing,
}

impl Industry {
    pub const ALL: [Industry; 4] = [
        Industry::BankingFs,
        Industry::Healthcare,
        Industry::Retail,
        Industry::Manufacturing,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Industry::BankingFs => "Banking & FS",
            Industry::Healthcare => "Healthcare",
            Industry::Retail => "Retail",
            Industry::Manufacturing => "Manufacturing",
        }
    }
}

impl fmt::Display for Industry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Industry {
    type Err = InputError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Industry::ALL
            .into_iter()
            .find(|i| i.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| InputError::UnknownIndustry(wanted.to_string()))
    }
}
