//! Error taxonomy for the host side of the protocol.

use std::path::PathBuf;
use std::time::Duration;

use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    /// No usable runtime: unknown name, missing binary, or nothing installed.
    #[error("{0}")]
    RuntimeUnavailable(String),

    /// The runtime rejected the program before running it (syntax errors).
    #[error("{0}")]
    Runtime(String),

    /// The snippet threw; carries the string rendering of the thrown value.
    #[error("{0}")]
    Program(String),

    /// The snippet finished but its result could not be encoded as JSON.
    #[error("result could not be represented as JSON")]
    Unrepresentable,

    #[error("runtime exited with status {status}: stdout: {stdout:?}, stderr: {stderr:?}")]
    ProcessExited {
        status: i32,
        stdout: String,
        stderr: String,
    },

    #[error("runtime did not finish within {0:?}")]
    Timeout(Duration),

    /// The child wrote something that is not a valid result line.
    #[error("malformed result line: {0}")]
    Protocol(String),

    #[error("cannot encode program as {encoding}: {}", .path.display())]
    SourceEncoding { encoding: &'static str, path: PathBuf },

    #[error("runtime output is not valid {0}")]
    OutputEncoding(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    /// True when the engine itself failed, as opposed to the program throwing
    /// or returning something unencodable.
    pub fn is_runtime_error(&self) -> bool {
        matches!(
            self,
            Error::RuntimeUnavailable(_)
                | Error::Runtime(_)
                | Error::ProcessExited { .. }
                | Error::Timeout(_)
        )
    }
}
