//! Blocking HTTP listener for [`FeedbackApi`].
//!
//! Requests are served one at a time on the calling thread.

use std::io::Read;
use std::net::SocketAddr;

use tiny_http::{Header, Request, Response, Server};

use super::{ApiResponse, FeedbackApi, CORS_HEADERS};
use crate::error::Result;

/// Largest request body accepted. Feedback bodies are a few dozen bytes.
const MAX_BODY_BYTES: u64 = 64 * 1024;

pub struct ApiServer {
    server: Server,
    api: FeedbackApi,
}

impl ApiServer {
    /// Bind on all interfaces at `port` (0 picks a free port).
    ///
    /// Also creates the feedback file if it does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the port cannot be bound or the store cannot be
    /// initialized.
    pub fn bind(api: FeedbackApi, port: u16) -> Result<Self> {
        api.store().init()?;
        let server = Server::http(SocketAddr::from(([0, 0, 0, 0], port)))?;
        Ok(Self { server, api })
    }

    /// Bound address, useful when binding port 0.
    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Serve until [`ApiServer::unblock`] is called from another thread.
    pub fn run(&self) {
        if let Some(addr) = self.local_addr() {
            tracing::info!(%addr, store = %self.api.store().path().display(), "feedback server listening");
        }
        for request in self.server.incoming_requests() {
            handle_request(&self.api, request);
        }
        tracing::info!("feedback server stopped");
    }

    /// Serve exactly one request, blocking until it arrives.
    ///
    /// # Errors
    ///
    /// Returns an error if receiving from the socket fails.
    pub fn serve_one(&self) -> Result<()> {
        let request = self.server.recv()?;
        handle_request(&self.api, request);
        Ok(())
    }

    /// Make a `run` loop on another thread return. Share the server through
    /// an `Arc` to call this while it runs.
    pub fn unblock(&self) {
        self.server.unblock();
    }
}

fn handle_request(api: &FeedbackApi, mut request: Request) {
    let method = request.method().as_str().to_string();
    let url = request.url().to_string();

    let mut body = Vec::new();
    let read = request
        .as_reader()
        .take(MAX_BODY_BYTES)
        .read_to_end(&mut body);
    let response = match read {
        Ok(_) => api.handle(&method, &url, &body),
        Err(e) => {
            tracing::warn!(%method, %url, error = %e, "failed to read request body");
            ApiResponse::error(400, "Invalid JSON")
        }
    };
    tracing::debug!(%method, %url, status = response.status, "request handled");

    if let Err(e) = request.respond(to_tiny(response)) {
        tracing::warn!(%method, %url, error = %e, "failed to write response");
    }
}

fn to_tiny(response: ApiResponse) -> Response<std::io::Cursor<Vec<u8>>> {
    let mut tiny = Response::from_data(response.body).with_status_code(response.status);
    let content_type = response.content_type.map(|ct| ("Content-Type", ct));
    for (name, value) in CORS_HEADERS.into_iter().chain(content_type) {
        match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(header) => tiny.add_header(header),
            Err(()) => tracing::warn!(name, "invalid response header"),
        }
    }
    tiny
}
