//! Loader errors

use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("cannot read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no Go packages found under {0}")]
    NoPackages(PathBuf),

    #[error("import cycle not allowed: {}", .0.join(" -> "))]
    ImportCycle(Vec<String>),

    #[error("found packages {first} and {second} in {path}")]
    MixedPackages {
        path: String,
        first: String,
        second: String,
    },
}

impl LoadError {
    pub fn code(&self) -> &'static str {
        match self {
            LoadError::Io { .. } => "E2001",
            LoadError::NoPackages(_) => "E2002",
            LoadError::ImportCycle(_) => "E2003",
            LoadError::MixedPackages { .. } => "E2004",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cycle_message() {
        let err = LoadError::ImportCycle(vec!["a".into(), "b".into(), "a".into()]);
        assert_eq!(err.to_string(), "import cycle not allowed: a -> b -> a");
        assert_eq!(err.code(), "E2003");
    }
}
