//! TCP-backed channel ports for the reference harness.
//!
//! Each directional link is one TCP connection. The socket's read timeout
//! provides the blocking bounded wait the engine expects; reads hand back
//! whatever bytes the stream has, which may be a partial frame or several
//! frames run together.

use std::io::{ErrorKind, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use tracing::info;

use rdt_lab_engine::{ChannelClosed, ChannelPort};

/// How long the client keeps retrying while the server comes up.
const CONNECT_WINDOW: Duration = Duration::from_secs(5);

pub struct TcpChannelPort {
    stream: TcpStream,
}

impl TcpChannelPort {
    /// Server side: accept one peer connection on `port`.
    pub fn listen(port: u16) -> Result<Self> {
        let listener = TcpListener::bind(("0.0.0.0", port))
            .with_context(|| format!("binding link port {port}"))?;
        let (stream, peer) = listener
            .accept()
            .with_context(|| format!("accepting peer on port {port}"))?;
        info!("link established with {peer} on port {port}");
        let _ = stream.set_nodelay(true);
        Ok(Self { stream })
    }

    /// Client side: connect to the server's link on `port`, retrying while
    /// the server is still starting up.
    pub fn connect(server: &str, port: u16) -> Result<Self> {
        let give_up = Instant::now() + CONNECT_WINDOW;
        loop {
            match TcpStream::connect((server, port)) {
                Ok(stream) => {
                    info!("link established to {server}:{port}");
                    let _ = stream.set_nodelay(true);
                    return Ok(Self { stream });
                }
                Err(_) if Instant::now() < give_up => {
                    std::thread::sleep(Duration::from_millis(100));
                }
                Err(err) => {
                    return Err(err)
                        .with_context(|| format!("connecting to {server}:{port}"));
                }
            }
        }
    }
}

impl ChannelPort for TcpChannelPort {
    fn transmit(&mut self, bytes: &[u8]) -> Result<(), ChannelClosed> {
        self.stream.write_all(bytes).map_err(|_| ChannelClosed)
    }

    fn recv_timeout(&mut self, wait: Duration) -> Result<Vec<u8>, ChannelClosed> {
        // A zero read timeout would disable the timeout entirely.
        let wait = wait.max(Duration::from_millis(1));
        if self.stream.set_read_timeout(Some(wait)).is_err() {
            return Err(ChannelClosed);
        }
        let mut buf = [0u8; 4096];
        match self.stream.read(&mut buf) {
            Ok(0) => Err(ChannelClosed),
            Ok(n) => Ok(buf[..n].to_vec()),
            Err(err)
                if matches!(
                    err.kind(),
                    ErrorKind::WouldBlock | ErrorKind::TimedOut | ErrorKind::Interrupted
                ) =>
            {
                Ok(Vec::new())
            }
            Err(_) => Err(ChannelClosed),
        }
    }
}
