//! Driver configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{FdkError, FdkResult};

/// String-keyed configuration handed to a driver builder.
///
/// The core attaches no meaning to the keys; each builder checks the ones it
/// needs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DriverConfig {
    values: HashMap<String, String>,
}

impl DriverConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Fetch a mandatory, non-empty key on behalf of `driver`.
    pub fn require(&self, driver: &str, key: &str) -> FdkResult<&str> {
        match self.get(key) {
            None => Err(FdkError::construction(driver, format!("'{key}' not specified"))),
            Some(v) if v.trim().is_empty() => {
                Err(FdkError::construction(driver, format!("'{key}' must not be empty")))
            }
            Some(v) => Ok(v),
        }
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl From<HashMap<String, String>> for DriverConfig {
    fn from(values: HashMap<String, String>) -> Self {
        Self { values }
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for DriverConfig {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> Extend<(K, V)> for DriverConfig {
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        self.values
            .extend(iter.into_iter().map(|(k, v)| (k.into(), v.into())));
    }
}
