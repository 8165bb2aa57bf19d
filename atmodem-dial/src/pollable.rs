use mio::Token;

/// Dialler whose sockets live in a mio poll loop.
pub trait Pollable {
    /// Token the dialler registers its sockets under.
    fn token(&self) -> Token;

    /// Handle readiness reported for [`token`](Self::token).
    fn on_ready(&mut self, readable: bool, writable: bool);
}
