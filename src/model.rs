use std::fmt::{Display, Formatter};
use std::path::PathBuf;

/// A parsed `KEY=VALUE` entry from a `.env` file or input buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub key: String,
    pub value: String,
    pub source: Option<PathBuf>,
    pub line: u32,
}

/// Summary of a process or load operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct LoadReport {
    pub loaded: usize,
    pub skipped_existing: usize,
    /// Entries the store refused to hold.
    pub rejected: usize,
    pub files_read: usize,
}

impl LoadReport {
    pub(crate) fn merge(&mut self, other: LoadReport) {
        self.loaded += other.loaded;
        self.skipped_existing += other.skipped_existing;
        self.rejected += other.rejected;
        self.files_read += other.files_read;
    }
}

/// A stored environment string cast to its native type.
///
/// | stored             | value         |
/// |--------------------|---------------|
/// | `null`             | `Null`        |
/// | `true`, `1`, `on`  | `Bool(true)`  |
/// | `false`, `0`, `off`| `Bool(false)` |
/// | anything else      | `Str`         |
///
/// Matching is exact and case-sensitive: `On` stays a string.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum EnvValue {
    #[default]
    Null,
    Bool(bool),
    Str(String),
}

impl EnvValue {
    pub fn cast(raw: &str) -> Self {
        match raw {
            "null" => Self::Null,
            "true" | "1" | "on" => Self::Bool(true),
            "false" | "0" | "off" => Self::Bool(false),
            other => Self::Str(other.to_owned()),
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(value) => Some(*value),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(value) => Some(value.as_str()),
            _ => None,
        }
    }

    /// Whether a required read should treat this value as not set.
    ///
    /// `Bool(false)` is an explicit value and never counts as unset.
    pub fn is_unset(&self) -> bool {
        match self {
            Self::Null => true,
            Self::Bool(_) => false,
            Self::Str(value) => value.is_empty() || value == "0",
        }
    }
}

impl Display for EnvValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(value) => write!(f, "{value}"),
            Self::Str(value) => write!(f, "{value}"),
        }
    }
}

impl From<bool> for EnvValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<&str> for EnvValue {
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<String> for EnvValue {
    fn from(value: String) -> Self {
        Self::Str(value)
    }
}

impl<T: Into<EnvValue>> From<Option<T>> for EnvValue {
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}
