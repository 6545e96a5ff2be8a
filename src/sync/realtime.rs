//! Realtime change channel over a WebSocket.
//!
//! Joins a single channel topic, then pumps frames in a background task:
//! heartbeats go out on a fixed interval and every row-change frame is
//! turned into one signal on the caller's notifier.

use futures::stream::{SplitSink, SplitStream};
use futures::{SinkExt, StreamExt};
use std::time::Duration;
use tokio::net::TcpStream;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, timeout, Instant};
use tokio_tungstenite::{connect_async, tungstenite::Message, MaybeTlsStream, WebSocketStream};

use super::error::RemoteError;
use super::protocol::ChannelMessage;
use super::remote::ChangeNotifier;

/// Timeout for the join reply.
const JOIN_TIMEOUT: Duration = Duration::from_secs(10);
/// Interval between heartbeats; the server drops sockets silent for 60s.
const HEARTBEAT_INTERVAL: Duration = Duration::from_secs(25);

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;
type WsSource = SplitStream<WsStream>;

/// Handle to an open change subscription.
///
/// `close` leaves the channel gracefully. Dropping the handle without
/// closing aborts the background task.
#[derive(Debug)]
pub struct Subscription {
    shutdown: Option<oneshot::Sender<()>>,
    task: Option<JoinHandle<()>>,
}

impl Subscription {
    pub fn new(shutdown: oneshot::Sender<()>, task: JoinHandle<()>) -> Self {
        Self {
            shutdown: Some(shutdown),
            task: Some(task),
        }
    }

    /// True while the background task is still running.
    pub fn is_active(&self) -> bool {
        self.task.as_ref().is_some_and(|task| !task.is_finished())
    }

    /// Asks the background task to leave the channel and stop.
    pub fn close(mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        // Detach so the task can finish its leave handshake.
        self.task.take();
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(task) = self.task.take() {
            task.abort();
        }
    }
}

/// Connects, joins `join.topic`, and starts pumping change signals.
pub(crate) async fn open_channel(
    ws_url: &str,
    join: ChannelMessage,
    notify: ChangeNotifier,
) -> Result<Subscription, RemoteError> {
    let (ws_stream, _) = connect_async(ws_url)
        .await
        .map_err(|e| RemoteError::WebSocketError(e.to_string()))?;

    let (mut sender, mut receiver) = ws_stream.split();

    let topic = join.topic.clone();
    let join_ref = join.msg_ref.clone().unwrap_or_default();
    let encoded = join
        .encode()
        .map_err(|e| RemoteError::HandshakeError(e.to_string()))?;

    sender
        .send(Message::text(encoded))
        .await
        .map_err(|e| RemoteError::WebSocketError(e.to_string()))?;

    await_join(&mut receiver, &join_ref).await?;
    tracing::debug!(topic = %topic, "joined realtime channel");

    let (shutdown_tx, shutdown_rx) = oneshot::channel();
    let task = tokio::spawn(pump(sender, receiver, topic, notify, shutdown_rx));

    Ok(Subscription::new(shutdown_tx, task))
}

/// Waits for the `phx_reply` to the join request.
async fn await_join(receiver: &mut WsSource, join_ref: &str) -> Result<(), RemoteError> {
    let reply = timeout(JOIN_TIMEOUT, async {
        while let Some(msg_result) = receiver.next().await {
            match msg_result {
                Ok(Message::Text(text)) => {
                    let frame = match ChannelMessage::decode(text.as_str()) {
                        Ok(frame) => frame,
                        Err(e) => {
                            tracing::debug!(error = %e, "skipping undecodable frame during join");
                            continue;
                        }
                    };
                    match frame.reply_status(join_ref) {
                        Some("ok") => return Ok(()),
                        Some(status) => {
                            return Err(RemoteError::HandshakeError(format!(
                                "server replied '{}': {}",
                                status, frame.payload["response"]
                            )));
                        }
                        None => {}
                    }
                }
                Ok(Message::Close(_)) => {
                    return Err(RemoteError::HandshakeError(
                        "Server closed connection during join".to_string(),
                    ));
                }
                Ok(_) => {
                    // Ignore other message types
                }
                Err(e) => {
                    return Err(RemoteError::WebSocketError(e.to_string()));
                }
            }
        }
        Err(RemoteError::HandshakeError(
            "Connection closed before join completed".to_string(),
        ))
    })
    .await;

    match reply {
        Ok(result) => result,
        Err(_) => Err(RemoteError::HandshakeTimeout),
    }
}

async fn pump(
    mut sender: WsSink,
    mut receiver: WsSource,
    topic: String,
    notify: ChangeNotifier,
    mut shutdown: oneshot::Receiver<()>,
) {
    let mut heartbeat = interval_at(Instant::now() + HEARTBEAT_INTERVAL, HEARTBEAT_INTERVAL);
    // ref "1" was the join
    let mut next_ref: u64 = 2;

    loop {
        tokio::select! {
            _ = &mut shutdown => {
                let leave = ChannelMessage::leave(&topic, &next_ref.to_string());
                if let Ok(encoded) = leave.encode() {
                    let _ = sender.send(Message::text(encoded)).await;
                }
                let _ = sender.send(Message::Close(None)).await;
                tracing::debug!(topic = %topic, "left realtime channel");
                break;
            }
            _ = heartbeat.tick() => {
                let beat = ChannelMessage::heartbeat(&next_ref.to_string());
                next_ref += 1;
                let sent = match beat.encode() {
                    Ok(encoded) => sender
                        .send(Message::text(encoded))
                        .await
                        .map_err(|e| e.to_string()),
                    Err(e) => Err(e.to_string()),
                };
                if let Err(e) = sent {
                    tracing::warn!(topic = %topic, error = %e, "realtime heartbeat failed");
                    break;
                }
            }
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Text(text))) => match ChannelMessage::decode(text.as_str()) {
                    Ok(frame) if frame.is_change(&topic) => {
                        if notify.send(()).is_err() {
                            tracing::debug!(topic = %topic, "change listener gone");
                            break;
                        }
                    }
                    Ok(frame) if frame.is_channel_closed(&topic) => {
                        tracing::warn!(
                            topic = %topic,
                            event = %frame.event,
                            "realtime channel closed by server"
                        );
                        break;
                    }
                    Ok(_) => {}
                    Err(e) => {
                        tracing::debug!(error = %e, "skipping undecodable realtime frame");
                    }
                },
                Some(Ok(Message::Ping(data))) => {
                    if sender.send(Message::Pong(data)).await.is_err() {
                        break;
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    tracing::warn!(topic = %topic, "realtime socket closed");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(topic = %topic, error = %e, "realtime socket error");
                    break;
                }
            }
        }
    }
}
