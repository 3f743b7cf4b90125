//! Client session state.

use protocol::ViewportHint;
use std::net::SocketAddr;

/// A connected client session.
#[derive(Debug)]
pub struct Client {
    /// Unique client ID.
    pub id: u32,
    /// Remote address.
    pub addr: SocketAddr,
    /// The live player driven by this connection, once joined. Cleared
    /// when the player is eliminated.
    pub player_id: Option<u32>,
    /// Viewport dimensions reported with the latest join, if any.
    pub viewport: Option<ViewportHint>,
    /// Last activity timestamp.
    pub last_activity: std::time::Instant,
}

impl Client {
    /// Create a new client session.
    pub fn new(id: u32, addr: SocketAddr) -> Self {
        Self {
            id,
            addr,
            player_id: None,
            viewport: None,
            last_activity: std::time::Instant::now(),
        }
    }

    /// Update activity timestamp.
    pub fn touch(&mut self) {
        self.last_activity = std::time::Instant::now();
    }
}
