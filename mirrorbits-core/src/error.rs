// src/error.rs
//! Error taxonomy shared by every admin operation.
//!
//! Operations never terminate the process themselves. They return an
//! [`AdminError`] and the binary decides the exit status through
//! [`AdminError::is_fatal`].

use thiserror::Error;

pub type Result<T, E = AdminError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum AdminError {
    /// Bad arguments. Carries the usage text to print.
    #[error("{0}")]
    Usage(String),

    #[error("nothing to match")]
    NothingToMatch,

    #[error("no match for {0}")]
    NoMatch(String),

    #[error("{query} matches several mirrors")]
    Ambiguous { query: String, candidates: Vec<String> },

    #[error("mirror {0} already exists")]
    AlreadyExists(String),

    #[error("mirror {0} does not exist")]
    NotFound(String),

    #[error("the identifier cannot contain whitespace: {0:?}")]
    InvalidIdentifier(String),

    #[error("you *must* pass at least an HTTP URL")]
    MissingHttp,

    #[error("can't parse {kind} url {value:?}: {reason}")]
    InvalidUrl {
        kind: &'static str,
        value: String,
        reason: String,
    },

    #[error("local repository not indexed, you should run 'refresh' first")]
    NotIndexed,

    #[error("cannot scan a mirror without a proper rsync or FTP url")]
    NoSyncMethod,

    #[error("configuration: {0}")]
    Configuration(String),

    #[error("no pid found, ensure the server is running")]
    NoRunningInstance,

    #[error("unable to signal pid {pid}: {source}")]
    Signal {
        pid: i32,
        #[source]
        source: nix::Error,
    },

    #[error("editor failed: {0}")]
    Editor(String),

    #[error("parse error: {0}")]
    Parse(String),

    #[error("store: {0}")]
    Store(#[from] rusqlite::Error),

    #[error("io: {0}")]
    Io(#[from] std::io::Error),
}

impl AdminError {
    /// Whether the invocation should end with a non-zero status.
    ///
    /// Resolver outcomes, usage errors and daemon signaling problems are
    /// reported and the command returns normally.
    pub fn is_fatal(&self) -> bool {
        !matches!(
            self,
            AdminError::Usage(_)
                | AdminError::NothingToMatch
                | AdminError::NoMatch(_)
                | AdminError::Ambiguous { .. }
                | AdminError::NoRunningInstance
                | AdminError::Signal { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolver_outcomes_are_not_fatal() {
        assert!(!AdminError::NoMatch("x".into()).is_fatal());
        assert!(
            !AdminError::Ambiguous {
                query: "a".into(),
                candidates: vec!["ab".into(), "ac".into()],
            }
            .is_fatal()
        );
        assert!(!AdminError::NoRunningInstance.is_fatal());
    }

    #[test]
    fn validation_and_store_errors_are_fatal() {
        assert!(AdminError::AlreadyExists("m".into()).is_fatal());
        assert!(AdminError::MissingHttp.is_fatal());
        assert!(AdminError::Store(rusqlite::Error::InvalidQuery).is_fatal());
        assert!(AdminError::Configuration("EDITOR".into()).is_fatal());
    }
}
