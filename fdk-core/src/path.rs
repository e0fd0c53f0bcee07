//! Driver path normalization

use serde::{Deserialize, Serialize};
use std::fmt;

/// A normalized path inside a driver's namespace.
///
/// Leading, trailing and repeated separators are ignored, `.` segments are
/// dropped and `..` pops the previous segment. A path can never climb above
/// the driver root.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct DriverPath {
    segments: Vec<String>,
}

impl DriverPath {
    pub fn new(path: impl AsRef<str>) -> Self {
        Self::root().join(path)
    }

    pub fn root() -> Self {
        Self {
            segments: Vec::new(),
        }
    }

    pub fn join(&self, name: impl AsRef<str>) -> Self {
        let mut segments = self.segments.clone();
        for part in name.as_ref().split('/').filter(|s| !s.is_empty()) {
            match part {
                "." => {}
                ".." => {
                    segments.pop();
                }
                _ => segments.push(part.to_string()),
            }
        }
        Self { segments }
    }

    pub fn parent(&self) -> Option<Self> {
        if self.segments.is_empty() {
            None
        } else {
            let mut segments = self.segments.clone();
            segments.pop();
            Some(Self { segments })
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.segments.last().map(|s| s.as_str())
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn is_root(&self) -> bool {
        self.segments.is_empty()
    }

    /// Whether `self` is `other` or lies underneath it.
    pub fn starts_with(&self, other: &DriverPath) -> bool {
        self.segments.starts_with(&other.segments)
    }

    /// Path relative to the driver root, without a leading separator
    /// (`""` for the root).
    pub fn to_relative_string(&self) -> String {
        self.segments.join("/")
    }

    pub fn to_path_string(&self) -> String {
        format!("/{}", self.segments.join("/"))
    }
}

impl From<&str> for DriverPath {
    fn from(path: &str) -> Self {
        Self::new(path)
    }
}

impl fmt::Display for DriverPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_path_string())
    }
}
