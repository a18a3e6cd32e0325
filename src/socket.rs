/*!
    This module provides the trait [GatewaySocket] and its TCP implementor.

    The core of the crate only needs a reliable byte stream to the gateway: one full frame
    sent per call, one reply received per call. Anything honoring that contract can stand in,
    including an in-memory drive emulator for tests. Response timeouts are enforced by the
    caller ([crate::client::OdClient]), not by the implementor.
*/

use std::io;
use std::net::SocketAddr;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;


/// default TCP port of the gateway (the standard modbus port)
pub const GATEWAY_PORT: u16 = 502;

/// trait implementing the byte-stream transport carrying the gateway frames
#[allow(async_fn_in_trait)]
pub trait GatewaySocket {
    /// send one complete frame, the whole buffer in one write
    async fn send(&mut self, data: &[u8]) -> io::Result<()>;
    /// receive one reply into the given buffer, returning the number of bytes read
    async fn receive(&mut self, data: &mut [u8]) -> io::Result<usize>;
}

/// TCP connection to one gateway, one per axis controller
pub struct TcpSocket {
    stream: TcpStream,
}

impl TcpSocket {
    /// open a connection to the controller at the given address (port is usually [GATEWAY_PORT])
    pub async fn connect(address: SocketAddr) -> io::Result<Self> {
        let stream = TcpStream::connect(address).await?;
        // frames are tiny and latency-bound
        stream.set_nodelay(true)?;
        Ok(Self {stream})
    }
}

impl GatewaySocket for TcpSocket {
    async fn send(&mut self, data: &[u8]) -> io::Result<()> {
        self.stream.write_all(data).await
    }
    async fn receive(&mut self, data: &mut [u8]) -> io::Result<usize> {
        self.stream.read(data).await
    }
}
