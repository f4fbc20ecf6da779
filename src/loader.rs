use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::env::Env;
use crate::error::Error;
use crate::model::LoadReport;

/// Overrides the location of the primary env file.
pub const ENV_PATH_VAR: &str = "ENV_PATH";
/// When `"true"`, a missing primary env file is tolerated.
pub const ENV_SILENT_VAR: &str = "ENV_SILENT";
/// When equal to [`TESTING_NODE_ENV`], the testing overlay is loaded.
pub const NODE_ENV_VAR: &str = "NODE_ENV";

pub const DEFAULT_ENV_FILE: &str = ".env";
pub const TESTING_ENV_FILE: &str = ".env.testing";
pub const TESTING_NODE_ENV: &str = "testing";

/// Builder-style loader for the primary env file and the testing overlay.
///
/// Settings left unset on the builder are read from the [`Env`] being
/// loaded (`ENV_PATH`, `ENV_SILENT`, `NODE_ENV`).
#[derive(Debug, Clone, Default)]
pub struct EnvLoader {
    app_root: Option<PathBuf>,
    env_path: Option<PathBuf>,
    silent: Option<bool>,
    node_env: Option<String>,
}

impl EnvLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Base directory for relative env paths. Defaults to the current directory.
    pub fn app_root(mut self, app_root: impl AsRef<Path>) -> Self {
        self.app_root = Some(app_root.as_ref().to_path_buf());
        self
    }

    pub fn env_path(mut self, env_path: impl AsRef<Path>) -> Self {
        self.env_path = Some(env_path.as_ref().to_path_buf());
        self
    }

    pub fn silent(mut self, silent: bool) -> Self {
        self.silent = Some(silent);
        self
    }

    pub fn node_env(mut self, node_env: impl Into<String>) -> Self {
        self.node_env = Some(node_env.into());
        self
    }

    /// The primary env file this loader would read for `env`.
    pub fn primary_path(&self, env: &Env) -> PathBuf {
        let env_path = self.env_path.clone().unwrap_or_else(|| {
            env.raw(ENV_PATH_VAR)
                .filter(|path| !path.is_empty())
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_ENV_FILE))
        });

        if env_path.is_absolute() {
            env_path
        } else {
            self.root().join(env_path)
        }
    }

    /// Read the primary file, then the testing overlay when enabled, and
    /// process both into `env`.
    ///
    /// The primary file never overwrites existing keys; the overlay does.
    pub fn load(&self, env: &mut Env) -> Result<LoadReport, Error> {
        let primary = self.primary_path(env);
        let silent = self
            .silent
            .unwrap_or_else(|| env.raw(ENV_SILENT_VAR).as_deref() == Some("true"));
        let overlay = self
            .is_testing(env)
            .then(|| self.root().join(TESTING_ENV_FILE));

        let mut report = LoadReport::default();
        if let Some(text) = read_env_file(&primary, silent)? {
            report.merge(env.process_with_source(&text, Some(&primary), false));
            report.files_read += 1;
        }

        if let Some(overlay) = overlay
            && let Some(text) = read_env_file(&overlay, true)?
        {
            report.merge(env.process_with_source(&text, Some(&overlay), true));
            report.files_read += 1;
        }

        tracing::debug!(
            files_read = report.files_read,
            loaded = report.loaded,
            skipped_existing = report.skipped_existing,
            rejected = report.rejected,
            "loaded env files"
        );
        Ok(report)
    }

    fn root(&self) -> &Path {
        self.app_root.as_deref().unwrap_or(Path::new(""))
    }

    fn is_testing(&self, env: &Env) -> bool {
        match &self.node_env {
            Some(node_env) => node_env == TESTING_NODE_ENV,
            None => env.raw(NODE_ENV_VAR).as_deref() == Some(TESTING_NODE_ENV),
        }
    }
}

/// Read an env file as UTF-8. A missing file is `Ok(None)` when `optional`,
/// otherwise [`Error::MissingFile`].
fn read_env_file(path: &Path, optional: bool) -> Result<Option<String>, Error> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(err) if err.kind() == ErrorKind::NotFound => {
            if optional {
                tracing::debug!(path = %path.display(), "optional env file not found");
                return Ok(None);
            }
            return Err(Error::MissingFile {
                path: path.to_path_buf(),
            });
        }
        Err(err) => return Err(err.into()),
    };

    let text = std::str::from_utf8(&bytes)?;
    tracing::debug!(path = %path.display(), "read env file");
    Ok(Some(text.to_owned()))
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use super::*;
    use crate::store::ProcessStore;

    fn env_with(pairs: &[(&str, &str)]) -> Env {
        let map: BTreeMap<String, String> = pairs
            .iter()
            .map(|(key, value)| (key.to_string(), value.to_string()))
            .collect();
        Env::with_store(ProcessStore::from_memory(map))
    }

    #[test]
    fn primary_path_defaults_to_dotenv_under_root() {
        let loader = EnvLoader::new().app_root("/srv/app");
        assert_eq!(
            loader.primary_path(&Env::new()),
            PathBuf::from("/srv/app/.env")
        );
    }

    #[test]
    fn primary_path_reads_env_path_from_store() {
        let loader = EnvLoader::new().app_root("/srv/app");

        let relative = env_with(&[(ENV_PATH_VAR, "config/.env.local")]);
        assert_eq!(
            loader.primary_path(&relative),
            PathBuf::from("/srv/app/config/.env.local")
        );

        let absolute = env_with(&[(ENV_PATH_VAR, "/etc/app.env")]);
        assert_eq!(loader.primary_path(&absolute), PathBuf::from("/etc/app.env"));

        let empty = env_with(&[(ENV_PATH_VAR, "")]);
        assert_eq!(loader.primary_path(&empty), PathBuf::from("/srv/app/.env"));
    }

    #[test]
    fn builder_env_path_wins_over_store() {
        let loader = EnvLoader::new().app_root("/srv/app").env_path("custom.env");
        let env = env_with(&[(ENV_PATH_VAR, "ignored.env")]);

        assert_eq!(loader.primary_path(&env), PathBuf::from("/srv/app/custom.env"));
    }

    #[test]
    fn testing_mode_follows_builder_then_store() {
        let testing = env_with(&[(NODE_ENV_VAR, "testing")]);
        assert!(EnvLoader::new().is_testing(&testing));
        assert!(!EnvLoader::new().node_env("production").is_testing(&testing));
        assert!(EnvLoader::new().node_env("testing").is_testing(&Env::new()));
        assert!(!EnvLoader::new().is_testing(&env_with(&[(NODE_ENV_VAR, "Testing")])));
    }
}
