//! Shared helpers for the integration tests.
#![allow(dead_code)]

use std::net::SocketAddr;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
    task::JoinHandle,
};
use webrail::{App, Response, Server};

/// Launches `app` on an ephemeral localhost port.
pub async fn start(app: App) -> (SocketAddr, JoinHandle<webrail::Result<()>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let server = Server::builder().listener(listener).app(app).build().unwrap();
    (addr, tokio::spawn(server.launch()))
}

/// Writes `raw` in one go and reads until the server closes the connection.
pub async fn exchange(addr: SocketAddr, raw: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw).await.unwrap();

    let mut reply = Vec::new();
    let _ = stream.read_to_end(&mut reply).await;
    reply
}

pub async fn get(addr: SocketAddr, path: &str) -> Response {
    let raw = format!("GET {path} HTTP/1.1\r\nHost: {addr}\r\n\r\n");
    Response::from_http(&exchange(addr, raw.as_bytes()).await).unwrap()
}

pub fn text(response: &Response) -> &str {
    std::str::from_utf8(response.get_body()).unwrap()
}
