//! Shared utilities for integration tests.

use std::convert::Infallible;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use hello_listener::{Server, ServerError};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::task::JoinHandle;

/// Run `start` on a background task and wait for the bound address.
pub async fn spawn_server(server: Arc<Server>) -> (SocketAddr, JoinHandle<Result<Infallible, ServerError>>) {
    let runner = Arc::clone(&server);
    let handle = tokio::spawn(async move { runner.start().await });

    let addr = tokio::time::timeout(Duration::from_secs(5), server.get_address())
        .await
        .expect("server did not become ready")
        .expect("server failed to bind");

    (addr, handle)
}

/// Connect, optionally send `payload`, half-close, and read until the server closes.
#[allow(dead_code)]
pub async fn exchange(addr: SocketAddr, payload: Option<&[u8]>) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.expect("connect failed");
    match payload {
        Some(bytes) => stream.write_all(bytes).await.expect("write failed"),
        None => stream.shutdown().await.expect("half-close failed"),
    }

    let mut reply = Vec::new();
    tokio::time::timeout(Duration::from_secs(5), stream.read_to_end(&mut reply))
        .await
        .expect("server did not close the connection")
        .expect("read failed");
    reply
}

/// Find a port that is free right now.
#[allow(dead_code)]
pub fn free_port() -> u16 {
    std::net::TcpListener::bind("127.0.0.1:0")
        .and_then(|listener| listener.local_addr())
        .map(|addr| addr.port())
        .expect("no free port")
}
