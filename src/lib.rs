//! Load `.env` files with `$VAR` interpolation and read values back typed.
//!
//! [`Env`] is an explicit environment context. [`Env::process`] parses
//! dotenv text, resolves `$NAME`, `${NAME}` and `\$` escapes, and stores the
//! results without touching keys that already exist unless asked to
//! overwrite. [`Env::get`] casts stored strings through a fixed table
//! (`null`, `true`/`1`/`on`, `false`/`0`/`off`).
//!
//! [`EnvLoader`] reads the primary file (`ENV_PATH`, default `.env`) and
//! the `.env.testing` overlay when `NODE_ENV=testing`.
//!
//! Contexts are in-memory by default. Writing through to the process
//! environment requires the `unsafe` [`ProcessStore::process`] constructor,
//! because callers must guarantee no concurrent process-environment access.

mod env;
mod error;
mod interpolate;
mod loader;
mod model;
mod parser;
mod store;

pub use env::Env;
pub use error::{Error, ParseError, ParseErrorKind};
pub use interpolate::{ParsedSet, interpolate};
pub use loader::{
    DEFAULT_ENV_FILE, ENV_PATH_VAR, ENV_SILENT_VAR, EnvLoader, NODE_ENV_VAR, TESTING_ENV_FILE,
    TESTING_NODE_ENV,
};
pub use model::{Entry, EnvValue, LoadReport};
pub use parser::{parse_str, parse_str_lenient};
pub use store::ProcessStore;
