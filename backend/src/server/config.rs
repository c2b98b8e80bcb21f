//! HTTP server configuration object.

use std::net::SocketAddr;

use actix_web::web;

use crate::inbound::http::state::HttpState;

/// Everything [`super::create_server`] needs to serve requests.
pub struct ServerConfig {
    pub(crate) bind_addr: SocketAddr,
    pub(crate) http_state: web::Data<HttpState>,
}

impl ServerConfig {
    /// Wrap `http_state` for sharing across worker threads.
    #[must_use]
    pub fn new(bind_addr: SocketAddr, http_state: HttpState) -> Self {
        Self {
            bind_addr,
            http_state: web::Data::new(http_state),
        }
    }

    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }
}
