//! Flat `key=value` properties loaded from the file named on the command line.
//!
//! The file uses Java properties syntax: `#` and `!` comments, `=`, `:` or
//! whitespace separators, backslash line continuations and `\uXXXX` escapes.
//! Values are kept verbatim otherwise; nothing is expanded from the environment.

use crate::error::PropertiesError;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufReader, ErrorKind};
use std::path::Path;
use std::str::FromStr;

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Properties {
    entries: BTreeMap<String, String>,
}

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    /// Read every entry of `path`. Later duplicates win.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PropertiesError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => PropertiesError::NotFound(path.to_path_buf()),
            _ => PropertiesError::Read {
                path: path.to_path_buf(),
                source: e,
            },
        })?;
        let entries: BTreeMap<String, String> = java_properties::read(BufReader::new(file))
            .map_err(|e| map_parse_error(path, e))?
            .into_iter()
            .collect();
        tracing::debug!(path = %path.display(), count = entries.len(), "loaded properties");
        Ok(Self { entries })
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.insert(key.into(), value.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    pub fn get_or<'a>(&'a self, key: &str, default: &'a str) -> &'a str {
        self.get(key).unwrap_or(default)
    }

    /// Parse the value under `key`; `Ok(None)` when the key is absent.
    pub fn parse<T>(&self, key: &str) -> Result<Option<T>, PropertiesError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        let Some(raw) = self.get(key) else {
            return Ok(None);
        };
        raw.trim()
            .parse::<T>()
            .map(Some)
            .map_err(|e| PropertiesError::Invalid {
                key: key.to_string(),
                value: raw.to_string(),
                reason: e.to_string(),
            })
    }

    pub fn parse_or<T>(&self, key: &str, default: T) -> Result<T, PropertiesError>
    where
        T: FromStr,
        T::Err: std::fmt::Display,
    {
        Ok(self.parse(key)?.unwrap_or(default))
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl FromIterator<(String, String)> for Properties {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
        }
    }
}

fn map_parse_error(path: &Path, err: java_properties::PropertiesError) -> PropertiesError {
    match err.line_number() {
        Some(line) => PropertiesError::Malformed {
            path: path.to_path_buf(),
            line,
            content: err.to_string(),
        },
        None => PropertiesError::Read {
            path: path.to_path_buf(),
            source: std::io::Error::new(ErrorKind::InvalidData, err.to_string()),
        },
    }
}
