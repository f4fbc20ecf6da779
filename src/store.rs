use std::collections::BTreeMap;

/// Key/value table that resolved variables are read from and written into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessStore {
    kind: StoreKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum StoreKind {
    /// Reads and writes go to the current process environment.
    ///
    /// Writes use [`std::env::set_var`], which mutates global process state
    /// and is not thread-safe for concurrent environment access.
    Process,
    Memory(BTreeMap<String, String>),
}

impl Default for ProcessStore {
    fn default() -> Self {
        Self::memory()
    }
}

impl ProcessStore {
    /// Create a store backed by the real process environment.
    ///
    /// # Safety
    ///
    /// The caller must ensure no other threads concurrently read or write the
    /// process environment while this store is mutated.
    pub unsafe fn process() -> Self {
        Self {
            kind: StoreKind::Process,
        }
    }

    /// Create an empty in-memory store.
    pub fn memory() -> Self {
        Self::from_memory(BTreeMap::new())
    }

    pub fn from_memory(map: BTreeMap<String, String>) -> Self {
        Self {
            kind: StoreKind::Memory(map),
        }
    }

    /// Copy the current process environment into an in-memory store.
    ///
    /// Variables whose name or value is not valid unicode are converted lossily.
    pub fn snapshot() -> Self {
        let map = std::env::vars_os()
            .map(|(key, value)| {
                (
                    key.to_string_lossy().into_owned(),
                    value.to_string_lossy().into_owned(),
                )
            })
            .collect();
        Self::from_memory(map)
    }

    pub fn as_memory(&self) -> Option<&BTreeMap<String, String>> {
        match &self.kind {
            StoreKind::Memory(map) => Some(map),
            StoreKind::Process => None,
        }
    }

    pub fn into_memory(self) -> Option<BTreeMap<String, String>> {
        match self.kind {
            StoreKind::Memory(map) => Some(map),
            StoreKind::Process => None,
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        match &self.kind {
            StoreKind::Process => is_portable_key(key) && std::env::var_os(key).is_some(),
            StoreKind::Memory(map) => map.contains_key(key),
        }
    }

    pub fn get(&self, key: &str) -> Option<String> {
        match &self.kind {
            StoreKind::Process if !is_portable_key(key) => None,
            StoreKind::Process => {
                std::env::var_os(key).map(|value| value.to_string_lossy().into_owned())
            }
            StoreKind::Memory(map) => map.get(key).cloned(),
        }
    }

    /// Store `value` under `key`. Returns `false` when a process-backed
    /// store cannot hold the pair (empty key, `=` or NUL in it, NUL in the
    /// value); nothing is written then.
    pub(crate) fn set(&mut self, key: &str, value: &str) -> bool {
        match &mut self.kind {
            StoreKind::Process if !is_portable_key(key) || value.contains('\0') => {
                tracing::warn!(key, "refusing to export variable to the process environment");
                false
            }
            StoreKind::Process => {
                // SAFETY: upheld by the caller of `ProcessStore::process`.
                unsafe { std::env::set_var(key, value) };
                true
            }
            StoreKind::Memory(map) => {
                map.insert(key.to_owned(), value.to_owned());
                true
            }
        }
    }
}

/// Names the platform environment accepts without panicking.
fn is_portable_key(key: &str) -> bool {
    !key.is_empty() && !key.contains(['=', '\0'])
}
