//! Application session for the corona-tray background process.
//!
//! `AppSession` holds everything request handlers need for the lifetime of
//! the process. `run` reads newline-delimited JSON requests, handles each
//! one in its own task, and funnels replies to a single writer.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;
use tokio::task::JoinSet;
use tracing::{debug, error, info, warn};

use corona_core::{AppSettings, DataAggregator, Reply, Request};

// ============================================================================
// Constants
// ============================================================================

/// Buffer size for the reply channel.
const CHANNEL_BUFFER_SIZE: usize = 32;

// ============================================================================
// Session
// ============================================================================

/// State shared by all request handlers; created at startup, dropped at shutdown.
pub struct AppSession {
    aggregator: DataAggregator,
    closed: AtomicBool,
}

impl AppSession {
    pub fn new(aggregator: DataAggregator) -> Self {
        Self {
            aggregator,
            closed: AtomicBool::new(false),
        }
    }

    pub fn settings(&self) -> &AppSettings {
        self.aggregator.settings()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn close(&self) {
        self.closed.store(true, Ordering::SeqCst);
    }

    /// Handle one request, returning the reply to send (if the request has one).
    pub async fn handle(&self, request: Request) -> Option<Reply> {
        let channel = request.channel();
        debug!(request = channel, "Handling request");

        match request {
            Request::OnlineStatus { online } => Some(match self.aggregator.get_stats(online).await {
                Ok(corona) => Reply::CoronaData { corona },
                Err(e) => Self::failed(channel, e),
            }),
            Request::Refresh { online } => Some(match self.aggregator.refresh(online).await {
                Ok(corona) => Reply::RefreshBack { corona },
                Err(e) => Self::failed(channel, e),
            }),
            Request::GetAllCountries { online } => {
                Some(match self.aggregator.list_all_countries(online).await {
                    Ok(countries) => Reply::SendAllCountries { countries },
                    Err(e) => Self::failed(channel, e),
                })
            }
            Request::ManualCountrySelection {
                country_code,
                locate_style,
            } => {
                info!(code = %country_code, style = %locate_style, "Country selection changed");
                self.settings()
                    .select_country(&country_code, &locate_style)
                    .err()
                    .map(|e| Self::failed(channel, e))
            }
            Request::OpenAtLogin { is_open_at_login } => {
                info!(open_at_login = is_open_at_login, "Launch at login changed");
                self.settings()
                    .set_open_at_login(is_open_at_login)
                    .err()
                    .map(|e| Self::failed(channel, e))
            }
            Request::CloseApp => {
                info!("Close requested");
                self.close();
                None
            }
        }
    }

    fn failed(channel: &str, e: impl std::fmt::Display) -> Reply {
        error!(request = channel, error = %e, "Request failed");
        Reply::error(Some(channel), e.to_string())
    }
}

// ============================================================================
// Request loop
// ============================================================================

/// Serve requests from `input` until it closes or `close-app` arrives.
/// In-flight requests are drained before returning the writer.
pub async fn run<R, W>(session: Arc<AppSession>, input: R, output: W) -> Result<W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin + Send + 'static,
{
    let (tx, rx) = mpsc::channel(CHANNEL_BUFFER_SIZE);
    let writer = tokio::spawn(write_replies(rx, output));
    let mut in_flight = JoinSet::new();
    let mut lines = input.lines();

    while !session.is_closed() {
        let line = match lines.next_line().await.context("Failed to read request")? {
            Some(line) => line,
            None => {
                debug!("Request stream closed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let request: Request = match serde_json::from_str(&line) {
            Ok(request) => request,
            Err(e) => {
                warn!(error = %e, "Ignoring malformed request");
                send_reply(&tx, Reply::error(None, format!("Malformed request: {}", e))).await;
                continue;
            }
        };

        if matches!(request, Request::CloseApp) {
            session.handle(request).await;
            break;
        }

        let session = Arc::clone(&session);
        let tx = tx.clone();
        in_flight.spawn(async move {
            if let Some(reply) = session.handle(request).await {
                send_reply(&tx, reply).await;
            }
        });
    }

    while let Some(joined) = in_flight.join_next().await {
        if let Err(e) = joined {
            error!(error = %e, "Request task panicked");
        }
    }
    drop(tx);

    writer.await.context("Reply writer task failed")?
}

/// Helper to send replies, logging any channel errors
async fn send_reply(tx: &mpsc::Sender<Reply>, reply: Reply) {
    if let Err(e) = tx.send(reply).await {
        error!(error = %e, "Failed to send reply - channel closed");
    }
}

/// Write each reply as one JSON line.
async fn write_replies<W>(mut rx: mpsc::Receiver<Reply>, mut output: W) -> Result<W>
where
    W: AsyncWrite + Unpin,
{
    while let Some(reply) = rx.recv().await {
        let mut line = serde_json::to_string(&reply).context("Failed to serialize reply")?;
        line.push('\n');
        output
            .write_all(line.as_bytes())
            .await
            .context("Failed to write reply")?;
        output.flush().await.context("Failed to flush reply")?;
    }
    Ok(output)
}
