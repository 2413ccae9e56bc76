use std::net::Ipv4Addr;
use thiserror::Error;

/// Errors surfaced to callers of interfaces and the router.
///
/// Routine forwarding outcomes (no matching route, TTL exhausted) are not errors; the router
/// counts and logs them instead.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    #[error("malformed frame: {0}")]
    Malformed(&'static str),

    #[error("prefix length {0} is longer than 32 bits")]
    InvalidPrefixLength(u8),

    #[error("route refers to unknown interface {0}")]
    UnknownInterface(usize),

    #[error("a route for {prefix}/{prefix_length} already exists")]
    DuplicateRoute { prefix: Ipv4Addr, prefix_length: u8 },
}

pub type Result<T> = std::result::Result<T, Error>;

impl From<&'static str> for Error {
    fn from(reason: &'static str) -> Self {
        Error::Malformed(reason)
    }
}
