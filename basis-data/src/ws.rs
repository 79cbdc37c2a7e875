//! The WebSocket streaming harness shared by the streaming venue adapters.
//!
//! Three cooperating tasks service one connection:
//!
//! - the **connection owner** holds exclusive access to the socket. It is the
//!   only task that dials or closes, and it services three request kinds on
//!   its channel: borrow-for-use (`BorrowReader` / `BorrowWriter`, lending a
//!   half of the current socket), `Reconnect` (close and re-dial with the
//!   subscription message, retrying with the configured backoff until
//!   success), and `Close`;
//! - the **reader** borrows the read half, enforces a read deadline of
//!   `ping_interval + 1s`, drops keep-alive replies, and forwards every other
//!   text frame to the adapter;
//! - the **heartbeat ticker** borrows the write half and sends the venue's
//!   ping payload every `ping_interval`.
//!
//! Each lease is tagged with the connection generation; a failed read or
//! write requests a reconnect naming the generation it observed, and the
//! owner ignores requests for superseded generations. Reconnect storms
//! therefore collapse to a single re-dial, there is never more than one
//! in-flight socket per harness, and no task ever observes a stale handle.

use crate::shutdown::Shutdown;
use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::{mpsc, oneshot};
use tokio_tungstenite::{
    connect_async, tungstenite::protocol::Message, MaybeTlsStream, WebSocketStream,
};
use tracing::{info, warn};

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type ReadHalf = SplitStream<Socket>;
type WriteHalf = SplitSink<Socket, Message>;

/// Streaming connection parameters for one venue.
#[derive(Debug, Clone)]
pub struct WsConfig {
    pub url: String,
    /// Subscription payload sent after every (re)connect.
    pub subscribe: Option<String>,
    /// Application-level keep-alive payload, written every `ping_interval`.
    pub ping_payload: Option<String>,
    /// Keep-alive reply marker; matching frames are dropped by the reader.
    pub pong_payload: Option<String>,
    pub ping_interval: Duration,
    pub reconnect_backoff: Duration,
}

impl WsConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            subscribe: None,
            ping_payload: None,
            pong_payload: None,
            ping_interval: Duration::from_secs(15),
            reconnect_backoff: Duration::from_secs(1),
        }
    }
}

/// A borrowed half of the current socket, tagged with the connection
/// generation so a failure can name the socket it observed.
struct Lease<Half> {
    generation: u64,
    half: Half,
}

/// Requests serviced by the connection-owner task.
enum SocketRequest {
    /// Borrow the read half of the current socket.
    BorrowReader(oneshot::Sender<Lease<ReadHalf>>),
    /// Borrow the write half of the current socket.
    BorrowWriter(oneshot::Sender<Lease<WriteHalf>>),
    /// The named generation failed: close it and dial a replacement.
    Reconnect { generation: u64 },
    /// Tear the connection down and end the harness.
    Close,
}

/// Spawn the harness tasks; decoded text frames arrive on the returned
/// channel.
///
/// The tasks run until shutdown is requested or the receiver is dropped.
pub fn spawn(config: WsConfig, shutdown: Shutdown) -> mpsc::Receiver<String> {
    let (frame_tx, frame_rx) = mpsc::channel(64);
    let (request_tx, request_rx) = mpsc::channel(8);

    if let Some(ping) = config.ping_payload.clone() {
        tokio::spawn(heartbeat(request_tx.clone(), ping, config.ping_interval));
    }
    tokio::spawn(reader(request_tx, config.clone(), frame_tx));
    tokio::spawn(own_socket(config, request_rx, shutdown));

    frame_rx
}

struct Connection {
    generation: u64,
    read_half: Option<ReadHalf>,
    write_half: Option<WriteHalf>,
}

/// The connection owner: sole holder of the socket handle.
async fn own_socket(
    config: WsConfig,
    mut requests: mpsc::Receiver<SocketRequest>,
    mut shutdown: Shutdown,
) {
    let Some(mut connection) = dial(&config, 1, &mut shutdown).await else {
        return;
    };
    loop {
        let request = tokio::select! {
            request = requests.recv() => match request {
                Some(request) => request,
                None => return,
            },
            _ = shutdown.recv() => return,
        };
        match request {
            SocketRequest::BorrowReader(reply) => {
                if let Some(half) = connection.read_half.take() {
                    let _ = reply.send(Lease {
                        generation: connection.generation,
                        half,
                    });
                }
            }
            SocketRequest::BorrowWriter(reply) => {
                if let Some(half) = connection.write_half.take() {
                    let _ = reply.send(Lease {
                        generation: connection.generation,
                        half,
                    });
                }
            }
            SocketRequest::Reconnect { generation } if generation == connection.generation => {
                warn!(url = %config.url, generation, "socket failed, reconnecting");
                let next = connection.generation + 1;
                drop(connection);
                tokio::time::sleep(config.reconnect_backoff).await;
                connection = match dial(&config, next, &mut shutdown).await {
                    Some(connection) => connection,
                    None => return,
                };
            }
            // A reconnect naming an older generation raced one that already
            // completed: the replacement socket is up, nothing to do.
            SocketRequest::Reconnect { .. } => {}
            SocketRequest::Close => return,
        }
    }
}

/// Dial and subscribe for a new generation, or `None` on shutdown.
async fn dial(config: &WsConfig, generation: u64, shutdown: &mut Shutdown) -> Option<Connection> {
    let socket = tokio::select! {
        socket = persistent_connect(config) => socket,
        _ = shutdown.recv() => return None,
    };
    let (write_half, read_half) = socket.split();
    Some(Connection {
        generation,
        read_half: Some(read_half),
        write_half: Some(write_half),
    })
}

/// Dial and subscribe, retrying with the configured backoff until success.
async fn persistent_connect(config: &WsConfig) -> Socket {
    loop {
        match connect(config).await {
            Ok(socket) => {
                info!(url = %config.url, "connected");
                return socket;
            }
            Err(error) => warn!(url = %config.url, %error, "connect failed"),
        }
        tokio::time::sleep(config.reconnect_backoff).await;
    }
}

async fn connect(config: &WsConfig) -> Result<Socket, crate::DataError> {
    let (mut socket, _) = connect_async(config.url.as_str()).await?;
    if let Some(subscribe) = &config.subscribe {
        socket.send(Message::Text(subscribe.clone())).await?;
    }
    Ok(socket)
}

/// The reader task: borrow the read half, read under the deadline, forward
/// frames, request a reconnect on failure.
async fn reader(
    requests: mpsc::Sender<SocketRequest>,
    config: WsConfig,
    frames: mpsc::Sender<String>,
) {
    let deadline = config.ping_interval + Duration::from_secs(1);
    loop {
        let (reply_tx, reply_rx) = oneshot::channel();
        if requests
            .send(SocketRequest::BorrowReader(reply_tx))
            .await
            .is_err()
        {
            return;
        }
        let Ok(Lease {
            generation,
            half: mut stream,
        }) = reply_rx.await
        else {
            return;
        };

        let reason = loop {
            let frame = match tokio::time::timeout(deadline, stream.next()).await {
                Err(_) => break "read deadline exceeded".to_string(),
                Ok(None) => break "connection closed".to_string(),
                Ok(Some(Err(error))) => break error.to_string(),
                Ok(Some(Ok(frame))) => frame,
            };
            let Message::Text(text) = frame else {
                continue;
            };
            if config.pong_payload.as_deref() == Some(text.trim()) {
                continue;
            }
            if frames.send(text).await.is_err() {
                // The adapter is gone; tear the harness down.
                let _ = requests.send(SocketRequest::Close).await;
                return;
            }
        };

        warn!(url = %config.url, generation, %reason, "read failed");
        drop(stream);
        if requests
            .send(SocketRequest::Reconnect { generation })
            .await
            .is_err()
        {
            return;
        }
    }
}

/// The heartbeat ticker: borrow the write half, ping every interval, request
/// a reconnect on write failure.
async fn heartbeat(requests: mpsc::Sender<SocketRequest>, ping: String, interval: Duration) {
    loop {
        let (reply_tx, reply_rx) = oneshot::channel();
        if requests
            .send(SocketRequest::BorrowWriter(reply_tx))
            .await
            .is_err()
        {
            return;
        }
        let Ok(Lease {
            generation,
            half: mut sink,
        }) = reply_rx.await
        else {
            return;
        };

        let mut ticker = tokio::time::interval(interval);
        // The first tick fires immediately; the subscription just went out,
        // so skip it.
        ticker.tick().await;
        loop {
            ticker.tick().await;
            if let Err(error) = sink.send(Message::Text(ping.clone())).await {
                warn!(generation, %error, "ping write failed");
                break;
            }
        }

        drop(sink);
        if requests
            .send(SocketRequest::Reconnect { generation })
            .await
            .is_err()
        {
            return;
        }
    }
}
