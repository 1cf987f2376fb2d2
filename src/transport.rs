use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpStream, ToSocketAddrs};
use std::time::Duration;

use socket2::{Domain, Protocol, Socket, Type};
use tracing::{debug, info};

use crate::error::Result;

/// SimPLEX listens on a fixed port.
pub const SIMPLEX_PORT: u16 = 15650;
/// Replies are read with a single receive of at most this many bytes.
pub const BUFFER_SIZE: usize = 4096;

/// One request line out, one reply chunk back.
pub trait Transport {
    fn send(&mut self, line: &str) -> Result<()>;
    fn receive(&mut self) -> Result<Vec<u8>>;
}

/// Blocking TCP connection to a SimPLEX host. Closed on drop.
#[derive(Debug)]
pub struct TcpTransport {
    stream: TcpStream,
    peer: SocketAddr,
}

/// Try each address in turn; the last connect error wins if none answer.
fn connect_any(addrs: impl IntoIterator<Item = SocketAddr>) -> io::Result<(Socket, SocketAddr)> {
    let mut last_err = None;
    for peer in addrs {
        let attempt = Socket::new(Domain::for_address(peer), Type::STREAM, Some(Protocol::TCP))
            .and_then(|socket| {
                socket.set_reuse_address(true)?;
                socket.connect(&peer.into())?;
                Ok(socket)
            });
        match attempt {
            Ok(socket) => return Ok((socket, peer)),
            Err(e) => {
                debug!(%peer, error = %e, "connect attempt failed");
                last_err = Some(e);
            }
        }
    }
    Err(last_err.unwrap_or_else(|| {
        io::Error::new(io::ErrorKind::AddrNotAvailable, "no address to connect to")
    }))
}

impl TcpTransport {
    pub fn open(host: &str, port: u16, read_timeout: Option<Duration>) -> Result<Self> {
        let (socket, peer) = connect_any((host, port).to_socket_addrs()?)?;

        let stream: TcpStream = socket.into();
        stream.set_nonblocking(false)?;
        stream.set_read_timeout(read_timeout)?;
        info!(%peer, "connected to SimPLEX");
        Ok(Self { stream, peer })
    }

    /// Shut the connection down, reporting any error. Dropping the
    /// transport releases the socket as well, silently.
    pub fn close(self) -> Result<()> {
        info!(peer = %self.peer, "closing SimPLEX connection");
        match self.stream.shutdown(Shutdown::Both) {
            Err(e) if e.kind() != io::ErrorKind::NotConnected => Err(e.into()),
            _ => Ok(()),
        }
    }
}

impl Transport for TcpTransport {
    fn send(&mut self, line: &str) -> Result<()> {
        self.stream.write_all(line.as_bytes())?;
        self.stream.flush()?;
        Ok(())
    }

    fn receive(&mut self) -> Result<Vec<u8>> {
        let mut buf = vec![0u8; BUFFER_SIZE];
        let n = self.stream.read(&mut buf)?;
        buf.truncate(n);
        debug!(bytes = n, "received reply");
        Ok(buf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::TcpListener;
    use std::thread;

    use crate::error::Error;

    #[test]
    fn send_and_receive_over_loopback() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            let (mut s, _) = listener.accept().unwrap();
            let mut buf = [0u8; 64];
            let n = s.read(&mut buf).unwrap();
            s.write_all(&buf[..n]).unwrap();
        });

        let mut t = TcpTransport::open("127.0.0.1", port, None).unwrap();
        t.send("NULL").unwrap();
        assert_eq!(t.receive().unwrap(), b"NULL");
        server.join().unwrap();
        t.close().unwrap();
    }

    #[test]
    fn receive_caps_at_buffer_size() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let server = thread::spawn(move || {
            let (mut s, _) = listener.accept().unwrap();
            s.write_all(&vec![b'x'; BUFFER_SIZE * 2]).unwrap();
        });

        let mut t = TcpTransport::open("127.0.0.1", port, None).unwrap();
        server.join().unwrap();
        let got = t.receive().unwrap();
        assert!(!got.is_empty() && got.len() <= BUFFER_SIZE);
    }

    #[test]
    fn read_timeout_surfaces_as_transport_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let mut t =
            TcpTransport::open("127.0.0.1", port, Some(Duration::from_millis(50))).unwrap();
        let (_held, _) = listener.accept().unwrap();
        assert!(matches!(t.receive(), Err(Error::Transport(_))));
    }

    #[test]
    fn falls_through_to_next_address() {
        let dead = {
            let l = TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap()
        };
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let live = listener.local_addr().unwrap();

        let (_socket, peer) = connect_any([dead, live]).unwrap();
        assert_eq!(peer, live);
        let (_accepted, _) = listener.accept().unwrap();
    }

    #[test]
    fn no_addresses_is_addr_not_available() {
        let err = connect_any(std::iter::empty()).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::AddrNotAvailable);
    }

    #[test]
    fn connect_by_hostname() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        // localhost may resolve to ::1 first; the IPv4 entry must still be tried
        let t = TcpTransport::open("localhost", port, None).unwrap();
        let (_accepted, _) = listener.accept().unwrap();
        t.close().unwrap();
    }

    #[test]
    fn connect_refused_is_transport_error() {
        let port = {
            let l = TcpListener::bind("127.0.0.1:0").unwrap();
            l.local_addr().unwrap().port()
        };
        assert!(matches!(
            TcpTransport::open("127.0.0.1", port, None),
            Err(Error::Transport(_))
        ));
    }
}
