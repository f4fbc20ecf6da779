use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// The primary env file does not exist and silencing was not requested.
    #[error("the {} file is missing", path.display())]
    MissingFile { path: PathBuf },
    /// A required key resolved to an unset value.
    #[error("make sure to define environment variable {key}")]
    MissingKey { key: String },
    #[error("invalid value for {key}: {message}")]
    InvalidValue { key: String, message: String },
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error("invalid UTF-8 input: {0}")]
    InvalidEncoding(#[from] std::str::Utf8Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("parse error at line {line}, column {column}: {kind}")]
pub struct ParseError {
    pub line: u32,
    pub column: u32,
    pub kind: ParseErrorKind,
}

impl ParseError {
    pub(crate) fn new(line: u32, column: u32, kind: ParseErrorKind) -> Self {
        Self { line, column, kind }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ParseErrorKind {
    #[error("invalid syntax")]
    InvalidSyntax,
    #[error("missing key")]
    MissingKey,
    #[error("invalid key")]
    InvalidKey,
    #[error("unterminated quote")]
    UnterminatedQuote,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_names_the_path() {
        let err = Error::MissingFile {
            path: PathBuf::from("/srv/app/.env"),
        };
        assert_eq!(err.to_string(), "the /srv/app/.env file is missing");
    }

    #[test]
    fn parse_error_display_includes_position() {
        let err = Error::from(ParseError::new(3, 7, ParseErrorKind::UnterminatedQuote));
        assert_eq!(
            err.to_string(),
            "parse error at line 3, column 7: unterminated quote"
        );
    }
}
