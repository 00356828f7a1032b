use std::net::SocketAddr;
use std::os::fd::{AsRawFd, RawFd};
use std::rc::Rc;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::task::Poll;

use anyhow::Context;
use mio::net::TcpStream;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::http::connection::{Connection, ConnectionContext, Outcome};
use crate::http::error::HandlerError;
use crate::server::listener::{Accept, Acceptor};
use crate::server::reactor::{Interest, ReadyBatch, ReadyEvent, Reactor};
use crate::server::registry::Registry;

/// The event loop: one thread, one reactor, every connection.
pub struct Server {
    reactor: Reactor,
    acceptor: Acceptor,
    registry: Registry<Connection<TcpStream>>,
    ctx: Rc<ConnectionContext>,
    shutdown: Arc<AtomicBool>,
    batch: ReadyBatch,
}

impl Server {
    /// Binds the listening socket and creates the reactor. Nothing is served
    /// until [`Server::run`].
    pub fn bind(cfg: &Config) -> anyhow::Result<Self> {
        let addr: SocketAddr = cfg
            .server
            .listen_addr
            .parse()
            .with_context(|| format!("invalid listen address {}", cfg.server.listen_addr))?;

        if cfg.http.arena_region_size < cfg.http.max_header_bytes {
            warn!(
                region = cfg.http.arena_region_size,
                max_header_bytes = cfg.http.max_header_bytes,
                "arena region is smaller than the header limit, large header values will be rejected"
            );
        }

        let reactor = Reactor::new(cfg.server.max_events).context("failed to create reactor")?;
        let acceptor = Acceptor::start(addr, cfg.server.backlog)
            .with_context(|| format!("failed to listen on {}", addr))?;

        Ok(Self {
            reactor,
            acceptor,
            registry: Registry::new(cfg.server.max_connections),
            ctx: Rc::new(ConnectionContext::from_config(cfg)),
            shutdown: Arc::new(AtomicBool::new(false)),
            batch: ReadyBatch::new(),
        })
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.acceptor.local_addr()
    }

    /// Flag that stops the loop at the start of its next iteration.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Routes SIGINT and SIGTERM to the shutdown flag.
    pub fn install_signal_handlers(&self) -> anyhow::Result<()> {
        for signal in [signal_hook::consts::SIGINT, signal_hook::consts::SIGTERM] {
            signal_hook::flag::register(signal, Arc::clone(&self.shutdown))
                .with_context(|| format!("failed to register handler for signal {}", signal))?;
        }
        Ok(())
    }

    pub fn connection_count(&self) -> usize {
        self.registry.len()
    }

    /// Runs until the shutdown flag is set. The flag is checked once per
    /// reactor wait, never in the middle of a batch.
    pub fn run(&mut self) -> anyhow::Result<()> {
        let listener_fd = self.acceptor.fd();
        info!(addr = %self.local_addr()?, "Listening");

        self.reactor
            .register(listener_fd, Interest::Read)
            .context("failed to arm listening socket")?;

        while !self.shutdown.load(Ordering::Relaxed) {
            match self.reactor.block_until_ready(&mut self.batch) {
                Ok(n) => tracing::trace!(events = n, "reactor woke"),
                Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e).context("reactor wait failed"),
            }

            let batch = std::mem::take(&mut self.batch);
            for event in &batch {
                if event.fd == listener_fd {
                    self.on_acceptable(listener_fd)?;
                } else {
                    self.on_ready(*event);
                }
            }
            self.batch = batch;
        }

        info!(connections = self.registry.len(), "Shutdown signal received");
        Ok(())
    }

    fn on_acceptable(&mut self, listener_fd: RawFd) -> anyhow::Result<()> {
        let accepted = self.acceptor.poll_accept();

        // The listener is re-armed whatever the accept outcome.
        self.reactor
            .register(listener_fd, Interest::Read)
            .context("failed to re-arm listening socket")?;

        match accepted {
            Accept::Pending => {}
            Accept::Ready(stream, peer) => {
                let fd = stream.as_raw_fd();

                if self.registry.is_full() {
                    warn!(
                        fd,
                        %peer,
                        capacity = self.registry.capacity(),
                        "Connection limit reached, refusing connection"
                    );
                    return Ok(());
                }

                info!(fd, %peer, "Accepted connection");
                self.registry
                    .insert(fd, Connection::new(fd, stream, Rc::clone(&self.ctx)));

                if let Err(e) = self.reactor.register(fd, Interest::Read) {
                    warn!(fd, error = %e, "failed to arm new connection");
                    self.close(fd);
                }
            }
            Accept::Failed(e) => {
                warn!(error = %e, "failed to accept connection, dropping it and moving on");
            }
        }

        Ok(())
    }

    fn on_ready(&mut self, event: ReadyEvent) {
        let fd = event.fd;
        let Some(conn) = self.registry.get_mut(fd) else {
            debug!(fd, "no handler found for descriptor, ignoring event");
            return;
        };

        match conn.poll(&mut self.reactor) {
            // The connection re-armed itself before yielding.
            Poll::Pending => {}
            Poll::Ready(Ok(Outcome::KeepAlive)) => {
                if let Err(e) = self.reactor.register(fd, Interest::Read) {
                    warn!(fd, error = %e, "failed to re-arm connection");
                    self.close(fd);
                }
            }
            Poll::Ready(Ok(Outcome::Close)) => {
                debug!(fd, "Connection closed after response");
                self.close(fd);
            }
            Poll::Ready(Err(HandlerError::PeerClosed)) => {
                debug!(fd, "Peer closed connection");
                self.close(fd);
            }
            Poll::Ready(Err(e)) => {
                warn!(fd, error = %e, "failure while handling connection, dropping it");
                self.close(fd);
            }
        }
    }

    /// Tears a connection down. Only the driver ever does this.
    fn close(&mut self, fd: RawFd) {
        if let Err(e) = self.reactor.deregister(fd) {
            debug!(fd, error = %e, "deregister failed");
        }
        self.registry.remove(fd);
    }
}
