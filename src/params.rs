//! Request parameters parsed from path, query or form strings.
//!
//! A parse failure becomes a `400 Bad Request` naming the offending input:
//!
//! ```ignore
//! async fn show(Path(id): Path<Param<i64>>) -> Result<String, AppError> {
//!     Ok(format!("widget {}", id.into_inner()))
//! }
//! ```

use crate::error::AppError;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Param<T>(T);

impl<T> Param<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    pub fn parse(raw: &str) -> Result<Self, AppError> {
        raw.parse::<T>().map(Param).map_err(|e| AppError::InvalidParam {
            param: raw.to_string(),
            reason: e.to_string(),
        })
    }
}

impl<T> Param<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Param<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T: fmt::Display> fmt::Display for Param<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl<'de, T> Deserialize<'de> for Param<T>
where
    T: FromStr,
    T::Err: fmt::Display,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Param::parse(&raw).map_err(serde::de::Error::custom)
    }
}
