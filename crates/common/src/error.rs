//! Configuration errors

use std::path::PathBuf;

use thiserror::Error;

/// Errors raised while loading or validating configuration
#[derive(Error, Debug)]
pub enum Error {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl Error {
    pub fn read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Read {
            path: path.into(),
            source,
        }
    }

    pub fn parse(path: impl Into<PathBuf>, source: toml::de::Error) -> Self {
        Error::Parse {
            path: path.into(),
            source,
        }
    }
}

/// Result alias using common Error
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn read_error_names_the_file() {
        let err = Error::read(
            "/etc/ghctl/config.toml",
            std::io::Error::new(std::io::ErrorKind::NotFound, "no such file"),
        );
        assert_eq!(
            err.to_string(),
            "cannot read /etc/ghctl/config.toml: no such file"
        );
    }

    #[test]
    fn parse_error_keeps_source() {
        let source = toml::from_str::<toml::Table>("[api\n").unwrap_err();
        let err = Error::parse("config.toml", source);
        assert!(err.to_string().starts_with("cannot parse config.toml: "));
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn invalid_message() {
        let err = Error::Invalid("api.timeout_secs must be greater than 0".into());
        assert_eq!(
            err.to_string(),
            "invalid configuration: api.timeout_secs must be greater than 0"
        );
    }
}
