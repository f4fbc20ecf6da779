use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use crate::error::Error;
use crate::interpolate::{ParsedSet, interpolate, interpolate_entry};
use crate::loader::EnvLoader;
use crate::model::{EnvValue, LoadReport};
use crate::parser::parse_lenient_with_source;
use crate::store::ProcessStore;

/// Environment context: resolved variables plus interpolation and typed reads.
///
/// Every read and write goes through the wrapped [`ProcessStore`], which is
/// in-memory unless built with [`ProcessStore::process`].
#[derive(Debug, Clone, Default)]
pub struct Env {
    store: ProcessStore,
}

impl Env {
    /// Create a context over an empty in-memory store.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_store(store: ProcessStore) -> Self {
        Self { store }
    }

    /// Snapshot the process environment and load `.env` files relative to
    /// `app_root` with the default [`EnvLoader`] settings.
    pub fn boot(app_root: impl AsRef<Path>) -> Result<Self, Error> {
        let mut env = Self::with_store(ProcessStore::snapshot());
        EnvLoader::new().app_root(app_root).load(&mut env)?;
        Ok(env)
    }

    pub fn store(&self) -> &ProcessStore {
        &self.store
    }

    pub fn into_store(self) -> ProcessStore {
        self.store
    }

    /// Parse `text` in dotenv syntax and store every resolved value.
    ///
    /// Keys already present in the store are kept unless `overwrite` is set.
    /// Malformed statements are skipped.
    pub fn process(&mut self, text: &str, overwrite: bool) -> LoadReport {
        self.process_with_source(text, None, overwrite)
    }

    pub(crate) fn process_with_source(
        &mut self,
        text: &str,
        source: Option<&Path>,
        overwrite: bool,
    ) -> LoadReport {
        let entries = parse_lenient_with_source(text, source);
        let parsed: ParsedSet = entries
            .iter()
            .map(|entry| (entry.key.clone(), entry.value.clone()))
            .collect();

        let mut report = LoadReport::default();
        for entry in &entries {
            if !overwrite && self.store.contains_key(&entry.key) {
                report.skipped_existing += 1;
                tracing::debug!(key = %entry.key, "keeping existing variable");
                continue;
            }

            let value = interpolate_entry(&entry.key, &entry.value, &parsed, &self.store);
            if self.store.set(&entry.key, &value) {
                report.loaded += 1;
            } else {
                report.rejected += 1;
            }
        }

        tracing::debug!(
            loaded = report.loaded,
            skipped_existing = report.skipped_existing,
            rejected = report.rejected,
            source = ?source,
            "processed dotenv text"
        );
        report
    }

    /// Resolve references in `value` against `parsed` and this store.
    pub fn interpolate(&self, value: &str, parsed: &ParsedSet) -> String {
        interpolate(value, parsed, &self.store)
    }

    /// Read and cast `key`, or [`EnvValue::Null`] when it is not set.
    pub fn get(&self, key: &str) -> EnvValue {
        self.get_or(key, EnvValue::Null)
    }

    /// Read and cast `key`, or return `default` when it is not set.
    pub fn get_or(&self, key: &str, default: impl Into<EnvValue>) -> EnvValue {
        match self.store.get(key) {
            Some(raw) => EnvValue::cast(&raw),
            None => default.into(),
        }
    }

    /// Like [`Env::get_or`], but fails when the result is unset.
    ///
    /// `null`, the empty string and `"0"` count as unset; an explicit
    /// `false` does not.
    pub fn get_or_fail(
        &self,
        key: &str,
        default: impl Into<EnvValue>,
    ) -> Result<EnvValue, Error> {
        let value = self.get_or(key, default);
        if value.is_unset() {
            return Err(Error::MissingKey {
                key: key.to_owned(),
            });
        }
        Ok(value)
    }

    /// The stored string for `key`, without casting.
    pub fn raw(&self, key: &str) -> Option<String> {
        self.store.get(key)
    }

    /// Parse the stored string for `key` into `T`.
    ///
    /// Returns `Ok(None)` when the key is not set.
    pub fn get_parsed<T>(&self, key: &str) -> Result<Option<T>, Error>
    where
        T: FromStr,
        T::Err: Display,
    {
        let Some(raw) = self.store.get(key) else {
            return Ok(None);
        };
        raw.parse::<T>()
            .map(Some)
            .map_err(|err: T::Err| Error::InvalidValue {
                key: key.to_owned(),
                message: err.to_string(),
            })
    }

    /// Interpolate `value` against the store alone and assign it to `key`.
    ///
    /// Returns `false` when a process-backed store refuses the pair.
    pub fn set(&mut self, key: &str, value: &str) -> bool {
        let value = interpolate(value, &ParsedSet::new(), &self.store);
        self.store.set(key, &value)
    }
}
