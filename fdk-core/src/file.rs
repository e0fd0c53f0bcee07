//! File system entries

use serde::{Deserialize, Serialize};

/// One entry reported by a driver listing
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct File {
    pub path: String,
    pub is_dir: bool,
}

impl File {
    pub fn file(path: impl Into<String>) -> Self {
        Self { path: path.into(), is_dir: false }
    }

    pub fn directory(path: impl Into<String>) -> Self {
        Self { path: path.into(), is_dir: true }
    }

    pub fn name(&self) -> &str {
        let trimmed = self.path.trim_end_matches('/');
        trimmed.rsplit('/').next().unwrap_or(trimmed)
    }
}
