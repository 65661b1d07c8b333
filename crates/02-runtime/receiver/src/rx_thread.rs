//! Receive thread.
//!
//! Binds the UDP socket, then loops: receive with a read timeout equal to
//! the poll interval, decode, dispatch each message inline. The stop token is
//! checked between receives, so shutdown takes at most one poll interval.

use std::io;
use std::net::{SocketAddr, UdpSocket};
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use log::{debug, trace};
use router::DistributeError;
use transport::{panic_message, Diagnostics};
use wire::Decoder;

use crate::config::ListenerConfig;
use crate::dispatch::Dispatch;
use crate::error::ReceiverError;
use crate::lifecycle::Shared;

/// Largest UDP payload.
const MAX_DATAGRAM_SIZE: usize = 65_535;

pub(crate) struct RxContext {
    pub generation: u64,
    pub config: ListenerConfig,
    pub dispatch: Dispatch,
    pub decoder: Arc<dyn Decoder>,
    pub stop: Arc<AtomicBool>,
    pub shared: Arc<Shared>,
    pub diagnostics: Diagnostics,
}

pub(crate) fn bind(port: u16, poll_interval: Duration) -> Result<UdpSocket, ReceiverError> {
    let socket = UdpSocket::bind(SocketAddr::from(([0, 0, 0, 0], port)))
        .map_err(|source| ReceiverError::Bind { port, source })?;
    socket
        .set_read_timeout(Some(poll_interval))
        .map_err(ReceiverError::Socket)?;
    Ok(socket)
}

pub(crate) fn run(ctx: RxContext) {
    let port = ctx.config.port;
    let mode = ctx.dispatch.mode();
    debug!("receive thread starting (port {port}, mode {mode})");
    let diagnostics = &ctx.diagnostics;
    diagnostics.info(format!("starting listener on port {port}"));

    let socket = match bind(port, ctx.config.poll_interval()) {
        Ok(socket) => socket,
        Err(err) => {
            debug!("receive thread failed to start: {err}");
            diagnostics.error(format!("listener failed to start: {err}"));
            ctx.shared.mark_failed(ctx.generation);
            return;
        }
    };

    match socket.local_addr() {
        Ok(addr) => ctx.shared.mark_bound(ctx.generation, addr),
        Err(err) => debug!("local_addr unavailable: {err}"),
    }

    let mut buf = vec![0u8; MAX_DATAGRAM_SIZE];
    while !ctx.stop.load(Ordering::Acquire) {
        match socket.recv_from(&mut buf) {
            Ok((len, from)) => handle_datagram(&ctx, &buf[..len], from),
            Err(err) if is_timeout(&err) => {}
            Err(err) => {
                debug!("recv failed on port {port}: {err}");
                diagnostics.warn(format!("receive failed: {err}"));
                thread::sleep(ctx.config.poll_interval());
            }
        }
    }

    drop(socket);
    debug!("receive thread exiting (port {port})");
    diagnostics.info(format!("listener on port {port} shut down"));
}

fn is_timeout(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut | io::ErrorKind::Interrupted
    )
}

fn handle_datagram(ctx: &RxContext, datagram: &[u8], from: SocketAddr) {
    let stats = ctx.shared.stats();
    stats.record_datagram();
    trace!("{} bytes from {from}", datagram.len());

    let packet = match ctx.decoder.decode(datagram, ctx.config.port) {
        Ok(packet) => packet,
        Err(err) => {
            stats.record_decode_failure();
            debug!("dropping datagram from {from}: {err}");
            let warning = format!("dropping packet from {from}: {err}");
            ctx.diagnostics.warn(warning);
            return;
        }
    };

    for message in packet.messages() {
        let outcome = panic::catch_unwind(AssertUnwindSafe(|| {
            ctx.dispatch.handle(message, stats, &ctx.diagnostics)
        }));
        if let Err(payload) = outcome {
            stats.record_handler_failure();
            let err = DistributeError::Handler {
                address: message.address.clone(),
                reason: panic_message(payload.as_ref()).to_owned(),
            };
            ctx.diagnostics.error(err.to_string());
        }
    }
}
