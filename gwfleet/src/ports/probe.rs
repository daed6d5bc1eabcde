//! Live port availability probing.

use std::net::{Ipv4Addr, SocketAddrV4, TcpListener};

/// Answers whether a host port can currently be bound.
pub trait PortProbe: Send + Sync {
    fn is_available(&self, port: u16) -> bool;
}

/// Probes by binding a transient listener on `127.0.0.1` and dropping it.
#[derive(Clone, Copy, Debug, Default)]
pub struct LoopbackProbe;

impl PortProbe for LoopbackProbe {
    fn is_available(&self, port: u16) -> bool {
        match TcpListener::bind(SocketAddrV4::new(Ipv4Addr::LOCALHOST, port)) {
            Ok(_listener) => true,
            Err(e) => {
                tracing::debug!(port, error = %e, "Port is not available (bind check failed)");
                false
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bound_port_is_unavailable() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        assert!(!LoopbackProbe.is_available(port));

        drop(listener);
        assert!(LoopbackProbe.is_available(port));
    }
}
