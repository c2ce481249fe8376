use std::io;
use std::net::SocketAddr;

use tokio::net::TcpListener;

/// Binds `addr`, moving on to the following ports while the requested one is
/// taken. At most `max_tries` ports are tried; other bind errors are returned
/// immediately.
pub async fn bind_with_fallback(addr: SocketAddr, max_tries: u16) -> io::Result<TcpListener> {
    let mut candidate = addr;
    let mut tries = 0;

    loop {
        tries += 1;
        match TcpListener::bind(candidate).await {
            Ok(listener) => return Ok(listener),
            Err(e) if e.kind() == io::ErrorKind::AddrInUse && tries < max_tries => {
                let Some(next_port) = candidate.port().checked_add(1) else {
                    return Err(e);
                };
                tracing::warn!(port = candidate.port(), next_port, "port in use, trying next");
                candidate.set_port(next_port);
            }
            Err(e) => return Err(e),
        }
    }
}
