//! Line-side backends for [`atmodem_core::Dialler`].
//!
//! - [`TcpDialler`] places calls as non-blocking TCP connections driven by a
//!   `mio` poll loop (see [`Pollable`]).
//! - [`LoopbackDialler`] connects every call to a line that echoes payload,
//!   handy for trying the command set without a network.

mod address;
mod errors;
mod loopback;
mod pollable;
mod tcp;

pub use crate::address::parse_address;
pub use crate::errors::DialError;
pub use crate::loopback::LoopbackDialler;
pub use crate::pollable::Pollable;
pub use crate::tcp::TcpDialler;
