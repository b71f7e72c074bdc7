//! Per-connection facts handed to us by the protocol layer.

use std::fmt;
use std::net::SocketAddr;

/// One authenticated connection.
///
/// Owned by the protocol implementation; the jail, cache and provider
/// chain only ever read it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Session {
    username: String,
    client_address: Option<SocketAddr>,
}

impl Session {
    pub fn new(username: impl Into<String>, client_address: Option<SocketAddr>) -> Self {
        Self {
            username: username.into(),
            client_address,
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn client_address(&self) -> Option<SocketAddr> {
        self.client_address
    }
}

impl fmt::Display for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.client_address {
            Some(addr) => write!(f, "{}@{}", self.username, addr),
            None => write!(f, "{}", self.username),
        }
    }
}
