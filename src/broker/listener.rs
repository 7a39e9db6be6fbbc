//! TCP listener: accepts connections and serves framed requests.
//!
//! One task per connection; frames on each connection are served strictly in
//! order (read, dispatch, write, repeat), so responses can never interleave
//! out of order on a single socket. Connections do not share mutable state;
//! the registry is read-only after startup.

use std::sync::Arc;

use futures::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::watch;
use tokio_util::codec::{FramedRead, FramedWrite, LengthDelimitedCodec};
use tracing::{debug, error, info, warn};

use crate::broker::dispatch;
use crate::broker::registry::HandlerRegistry;

/// Connection-serving knobs, taken from `Config` at startup
#[derive(Debug, Clone, Copy)]
pub struct ListenerSettings {
    pub max_frame_size: usize,
    pub log_connections: bool,
}

/// Accept loop. Runs until the shutdown signal flips to true.
pub async fn run(
    listener: TcpListener,
    registry: Arc<HandlerRegistry>,
    settings: ListenerSettings,
    mut shutdown: watch::Receiver<bool>,
) {
    info!(addr = %listener.local_addr().map(|a| a.to_string()).unwrap_or_default(),
          "listening for client connections");
    loop {
        tokio::select! {
            accepted = listener.accept() => {
                match accepted {
                    Ok((socket, peer)) => {
                        if settings.log_connections {
                            info!(%peer, "accepted connection");
                        } else {
                            debug!(%peer, "accepted connection");
                        }
                        let registry = Arc::clone(&registry);
                        tokio::spawn(async move {
                            if let Err(e) = handle_connection(socket, registry, settings.max_frame_size).await {
                                warn!(%peer, error = %e, "connection ended with error");
                            } else if settings.log_connections {
                                info!(%peer, "connection closed");
                            } else {
                                debug!(%peer, "connection closed");
                            }
                        });
                    }
                    Err(e) => {
                        // Transient accept errors (EMFILE etc); keep serving.
                        error!(error = %e, "failed to accept connection");
                    }
                }
            }
            _ = shutdown.changed() => {
                if *shutdown.borrow() {
                    info!("shutdown signal received, stopping accept loop");
                    return;
                }
            }
        }
    }
}

/// Serve one connection until the peer closes it.
///
/// The read codec keeps the 4-byte size prefix in the frame (num_skip 0,
/// adjustment 4) so the parser can verify the declared size against the
/// actual frame length. The write codec prepends the response size prefix.
async fn handle_connection(
    socket: TcpStream,
    registry: Arc<HandlerRegistry>,
    max_frame_size: usize,
) -> std::io::Result<()> {
    let (read_half, write_half) = socket.into_split();

    let read_codec = LengthDelimitedCodec::builder()
        .max_frame_length(max_frame_size)
        .length_field_length(4)
        .length_adjustment(4)
        .num_skip(0)
        .new_codec();
    let mut frames_in = FramedRead::new(read_half, read_codec);

    let write_codec = LengthDelimitedCodec::builder()
        .max_frame_length(max_frame_size)
        .length_field_length(4)
        .new_codec();
    let mut frames_out = FramedWrite::new(write_half, write_codec);

    while let Some(frame) = frames_in.next().await {
        let frame = frame?;
        let response = dispatch::process_frame(&registry, frame.freeze());
        frames_out.send(response.freeze()).await?;
    }
    Ok(())
}
