use std::io;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum DialError {
    #[error("malformed address {0:?}, expected host:port")]
    Address(String),

    #[error("no address found for {0}")]
    Unresolved(String),

    #[error("line I/O error: {0}")]
    IO(#[from] io::Error),
}
