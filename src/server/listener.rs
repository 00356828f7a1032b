use std::io;
use std::net::SocketAddr;
use std::os::fd::{AsRawFd, RawFd};

use mio::net::{TcpListener, TcpStream};
use socket2::{Domain, Protocol, Socket, Type};

/// Outcome of a single non-blocking accept attempt.
#[derive(Debug)]
pub enum Accept {
    /// Nothing to accept right now.
    Pending,
    Ready(TcpStream, SocketAddr),
    Failed(io::Error),
}

/// Owns the listening socket.
pub struct Acceptor {
    listener: TcpListener,
}

impl Acceptor {
    /// Binds `addr` with `SO_REUSEADDR`, switches to non-blocking mode and
    /// starts listening with the given backlog.
    pub fn start(addr: SocketAddr, backlog: i32) -> io::Result<Self> {
        let socket = Socket::new(Domain::for_address(addr), Type::STREAM, Some(Protocol::TCP))?;
        socket.set_reuse_address(true)?;
        socket.set_nonblocking(true)?;
        socket.bind(&addr.into())?;
        socket.listen(backlog)?;

        let std_listener: std::net::TcpListener = socket.into();
        let listener = TcpListener::from_std(std_listener);

        Ok(Self { listener })
    }

    pub fn fd(&self) -> RawFd {
        self.listener.as_raw_fd()
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    /// Attempts one accept. Never blocks; the returned stream is already in
    /// non-blocking mode.
    pub fn poll_accept(&self) -> Accept {
        loop {
            match self.listener.accept() {
                Ok((stream, peer)) => return Accept::Ready(stream, peer),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => return Accept::Pending,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Accept::Failed(e),
            }
        }
    }
}
