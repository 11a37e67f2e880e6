//! In-process HTTP fixture for integration tests that need a real socket.

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Canned response served by [`serve_scripted`].
pub struct Reply {
    pub status: u16,
    pub body: String,
}

impl Reply {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    fn status_line(&self) -> String {
        let reason = match self.status {
            200 => "OK",
            204 => "No Content",
            404 => "Not Found",
            500 => "Internal Server Error",
            503 => "Service Unavailable",
            _ => "Unknown",
        };
        format!("HTTP/1.1 {} {reason}", self.status)
    }

    fn render(&self) -> String {
        format!(
            "{}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            self.status_line(),
            self.body.len(),
            self.body
        )
    }
}

/// Bind `addr` and answer each connection with whatever `script` decides.
/// The listener runs until the test process exits.
pub async fn serve_scripted<S, Fut>(addr: SocketAddr, script: S)
where
    S: Fn() -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Reply> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await.expect("bind fixture endpoint");
    let script = Arc::new(script);

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let script = script.clone();
            tokio::spawn(async move {
                // Drain the request head before replying so the client
                // never sees a reset while still writing
                let mut head = [0u8; 1024];
                let _ = socket.read(&mut head).await;

                let reply = script().await;
                let _ = socket.write_all(reply.render().as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });
}
