//! Per-connection worker
//!
//! The reader side parses lines and calls into the coordinator; a separate
//! writer task drains the connection's event channel onto the socket. A
//! failure on either side tears the whole connection down.

use crate::coordinator::TurnCoordinator;
use crate::error::Result;
use crate::protocol::{ClientCommand, ServerEvent};
use crate::registry::{ConnectionRegistry, EventReceiver};
use crate::types::ConnectionId;
use crate::utils::generate_connection_id;
use anyhow::Context;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::net::TcpStream;
use tracing::{debug, info, warn};

/// Longest inbound line accepted, newline excluded
pub const MAX_LINE_BYTES: usize = 4096;

/// Serve one client until it quits, disconnects, or fails
pub async fn handle_connection(
    stream: TcpStream,
    peer: SocketAddr,
    coordinator: TurnCoordinator,
    registry: Arc<ConnectionRegistry>,
) -> Result<()> {
    let (reader, writer) = stream.into_split();
    serve_connection(reader, writer, peer, coordinator, registry).await
}

/// Drive one connection over any byte stream pair
pub async fn serve_connection<R, W>(
    reader: R,
    mut writer: W,
    peer: SocketAddr,
    coordinator: TurnCoordinator,
    registry: Arc<ConnectionRegistry>,
) -> Result<()>
where
    R: AsyncRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let connection = generate_connection_id();
    debug!("Accepted {} as connection {}", peer, connection);

    let events = registry.register(connection)?;
    let player = match coordinator.admit(connection).await {
        Ok(player) => player,
        Err(err) => {
            registry.unregister(connection)?;
            drop(events);
            writer
                .write_all(ServerEvent::Error(err.to_string()).to_line().as_bytes())
                .await
                .context("Failed to send rejection")?;
            let _ = writer.shutdown().await;
            info!("Turned away {}: {}", peer, err);
            return Ok(());
        }
    };

    let mut writer_task = tokio::spawn(write_events(writer, events, connection));
    let (result, written) = tokio::select! {
        result = read_commands(reader, &coordinator, &player) => (result, None),
        written = &mut writer_task => (Ok(()), Some(written)),
    };
    if let Err(err) = &result {
        warn!("Connection error for {} ({}): {}", player, peer, err);
    }

    coordinator.disconnect(connection).await;
    let written = match written {
        Some(written) => written,
        None => writer_task.await,
    };
    match written {
        Ok(Ok(())) => result,
        Ok(Err(err)) => {
            warn!("Writer for {} ({}) stopped: {}", player, peer, err);
            result.and(Err(err))
        }
        Err(err) => {
            warn!("Writer task for {} failed: {}", player, err);
            result
        }
    }
}

enum InboundLine {
    Text(String),
    /// Bytes discarded from a line over [`MAX_LINE_BYTES`]
    Oversized(usize),
}

/// Read one line, buffering at most [`MAX_LINE_BYTES`] plus the newline
async fn next_line<R>(reader: &mut R, buf: &mut Vec<u8>) -> std::io::Result<Option<InboundLine>>
where
    R: AsyncBufRead + Unpin,
{
    let limit = MAX_LINE_BYTES as u64 + 1;
    buf.clear();
    if (&mut *reader).take(limit).read_until(b'\n', buf).await? == 0 {
        return Ok(None);
    }

    if buf.len() > MAX_LINE_BYTES && buf.last() != Some(&b'\n') {
        let mut discarded = buf.len();
        loop {
            buf.clear();
            let read = (&mut *reader).take(limit).read_until(b'\n', buf).await?;
            discarded += read;
            if read == 0 || buf.last() == Some(&b'\n') {
                break;
            }
        }
        return Ok(Some(InboundLine::Oversized(discarded)));
    }

    let decoded = String::from_utf8_lossy(buf);
    let line = decoded.strip_suffix('\n').unwrap_or(&*decoded);
    let line = line.strip_suffix('\r').unwrap_or(line);
    Ok(Some(InboundLine::Text(line.to_string())))
}

/// Feed inbound lines to the coordinator until EOF or `QUIT`
pub async fn read_commands<R>(reader: R, coordinator: &TurnCoordinator, player: &str) -> Result<()>
where
    R: AsyncRead + Unpin,
{
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::new();
    while let Some(inbound) = next_line(&mut reader, &mut buf)
        .await
        .with_context(|| format!("Failed to read from {}", player))?
    {
        let line = match inbound {
            InboundLine::Text(line) => line,
            InboundLine::Oversized(len) => {
                warn!("Dropping {} byte line from {}", len, player);
                continue;
            }
        };

        match ClientCommand::parse(&line) {
            Some(ClientCommand::Flip(index)) => coordinator.flip(player, index).await,
            Some(ClientCommand::Chat(text)) => coordinator.chat(player, &text).await,
            Some(ClientCommand::Quit) => {
                info!("{} quit", player);
                break;
            }
            None => debug!("Dropping malformed line from {}: {:?}", player, line),
        }
    }
    Ok(())
}

/// Write every queued event to the socket; ends when the registry drops the channel
pub async fn write_events<W>(
    mut writer: W,
    mut events: EventReceiver,
    connection: ConnectionId,
) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    while let Some(event) = events.recv().await {
        writer
            .write_all(event.to_line().as_bytes())
            .await
            .with_context(|| format!("Failed to write {} to {}", event.kind(), connection))?;
    }
    let _ = writer.shutdown().await;
    Ok(())
}
