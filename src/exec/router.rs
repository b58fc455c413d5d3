// src/exec/router.rs

//! Stream router tasks: one reader per piped output channel.

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::debug;

use crate::engine::ProcessEvent;

/// Upper bound on the size of one emitted chunk.
pub const CHUNK_SIZE: usize = 64 * 1024;

/// Subscribe to output channel `index` of process `pid`.
///
/// Every chunk read becomes a `ChannelData` event. The reader stops on EOF,
/// on a read error (logged, never fatal), or when the supervisor stops
/// listening; it always finishes with `ChannelClosed`.
pub fn spawn_reader<R>(
    readers: &mut JoinSet<()>,
    pid: u32,
    index: usize,
    reader: R,
    events: mpsc::Sender<ProcessEvent>,
) where
    R: AsyncRead + Unpin + Send + 'static,
{
    readers.spawn(async move {
        pump(pid, index, reader, &events).await;
        let _ = events.send(ProcessEvent::ChannelClosed { pid, index }).await;
    });
}

async fn pump<R>(pid: u32, index: usize, mut reader: R, events: &mpsc::Sender<ProcessEvent>)
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; CHUNK_SIZE];

    loop {
        match reader.read(&mut buf).await {
            Ok(0) => {
                debug!(pid, index, "output channel reached EOF");
                return;
            }
            Ok(n) => {
                let event = ProcessEvent::ChannelData {
                    pid,
                    index,
                    data: buf[..n].to_vec(),
                };
                if events.send(event).await.is_err() {
                    debug!(pid, index, "supervisor gone; detaching output channel");
                    return;
                }
            }
            Err(e) => {
                debug!(pid, index, error = %e, "output channel error");
                return;
            }
        }
    }
}
