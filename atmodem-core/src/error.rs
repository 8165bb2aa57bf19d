use std::io;

use thiserror::Error;

/// Errors raised while the modem talks to its DTE sink.
#[derive(Error, Debug)]
pub enum ModemError {
    #[error("dte i/o error: {0}")]
    Io(#[from] io::Error),
}

pub type Result<T> = std::result::Result<T, ModemError>;
