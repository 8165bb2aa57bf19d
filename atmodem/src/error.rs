use std::io;
use std::path::PathBuf;

use atmodem_core::ModemError;
use atmodem_dial::DialError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    #[error("modem error: {0}")]
    Modem(#[from] ModemError),

    #[error("dialler error: {0}")]
    Dial(#[from] DialError),

    #[error("poll error: {0}")]
    Poll(io::Error),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("invalid config {}: {source}", path.display())]
    Config {
        path: PathBuf,
        source: serde_json::Error,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
