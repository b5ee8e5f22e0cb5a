use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::lookup_host;
use tokio::sync::mpsc;
use tokio::time::Instant;

use crate::error::{FixError, Result, TransportError};
use crate::field::FieldRegistry;
use crate::session::{connect, DisconnectReason, InboundMessage, SessionConfig, SessionHandle};
use crate::transport;

/// Reconnect policy: exponential backoff between attempts.
#[derive(Debug, Clone)]
pub struct RetryConfig {
    pub initial_delay: Duration,
    pub max_delay: Duration,
    pub backoff_factor: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_factor: 2.0,
        }
    }
}

impl RetryConfig {
    fn delay_for(&self, attempt: u32) -> Duration {
        let factor = self.backoff_factor.powi(attempt.saturating_sub(1) as i32);
        self.initial_delay.mul_f64(factor).min(self.max_delay)
    }
}

/// Lifecycle notifications from the reconnect loop.
#[derive(Debug, Clone)]
pub enum ConnectorEvent {
    Attempting { attempt: u32 },
    ResolvedAddress(SocketAddr),
    Connected,
    Disconnected { reason: DisconnectReason },
}

/// Application callbacks driven by the persistent connector. Default
/// implementations ignore everything, so implementors pick what they
/// care about.
#[async_trait]
pub trait FixHandler: Send {
    async fn on_session_active(&mut self, _session: &SessionHandle) {}
    async fn on_message(&mut self, _session: &SessionHandle, _msg: InboundMessage) {}
    async fn on_disconnect(&mut self, _reason: DisconnectReason) {}
}

/// Wraps the session engine with a reconnect loop: on any
/// non-user-requested disconnect, wait out the backoff and dial a
/// freshly resolved address. A user-initiated close is terminal.
pub struct PersistentConnector {
    addr: String,
    session_config: SessionConfig,
    registry: Arc<FieldRegistry>,
    retry: RetryConfig,
    events_tx: Option<mpsc::UnboundedSender<ConnectorEvent>>,
}

impl PersistentConnector {
    pub fn new(addr: impl Into<String>, session_config: SessionConfig, registry: Arc<FieldRegistry>) -> Self {
        Self {
            addr: addr.into(),
            session_config,
            registry,
            retry: RetryConfig::default(),
            events_tx: None,
        }
    }

    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Subscribes to lifecycle events. Call before [`run`](Self::run).
    pub fn events(&mut self) -> mpsc::UnboundedReceiver<ConnectorEvent> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.events_tx = Some(tx);
        rx
    }

    fn emit(&self, event: ConnectorEvent) {
        if let Some(tx) = &self.events_tx {
            let _ = tx.send(event);
        }
    }

    /// Runs sessions until the user requests a close or an attempt fails
    /// beyond recovery. Each session is handed to `handler` through its
    /// lifecycle callbacks. Backoff escalates across consecutive
    /// failures whether the dial itself failed or the session died right
    /// after connecting; only a session that stayed up past the backoff
    /// cap resets the escalation.
    pub async fn run<H: FixHandler>(self, handler: &mut H) -> Result<()> {
        let mut attempt: u32 = 0;
        loop {
            attempt += 1;
            self.emit(ConnectorEvent::Attempting { attempt });

            let stream = match self.dial_fresh().await {
                Ok(stream) => stream,
                Err(err) => {
                    let delay = self.retry.delay_for(attempt);
                    tracing::warn!(%err, ?delay, attempt, "connect failed, backing off");
                    self.emit(ConnectorEvent::Disconnected {
                        reason: DisconnectReason::TransportFailed,
                    });
                    tokio::time::sleep(delay).await;
                    continue;
                }
            };
            self.emit(ConnectorEvent::Connected);
            let session_started = Instant::now();

            let (session, mut inbound) =
                connect(stream, self.session_config.clone(), self.registry.clone());
            handler.on_session_active(&session).await;

            // Pump inbound messages until the engine task ends; the
            // reader pipe closing is the end-of-session signal.
            while let Some(msg) = inbound.recv().await {
                handler.on_message(&session, msg).await;
            }
            let (reason, error) = session.closed().await;
            handler.on_disconnect(reason).await;
            self.emit(ConnectorEvent::Disconnected { reason });

            match reason {
                DisconnectReason::UserRequested => return Ok(()),
                _ => {
                    if let Some(err) = error {
                        tracing::warn!(%err, ?reason, "session lost, reconnecting");
                    }
                    if session_started.elapsed() >= self.retry.max_delay {
                        attempt = 0;
                    }
                    let delay = self.retry.delay_for(attempt.max(1));
                    tracing::debug!(?delay, attempt, "reconnecting after backoff");
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// Resolves the address anew on every attempt so DNS failover is
    /// honored across reconnects.
    async fn dial_fresh(&self) -> Result<tokio::net::TcpStream> {
        let resolved = lookup_host(&self.addr)
            .await
            .map_err(TransportError::Io)?
            .next()
            .ok_or_else(|| {
                FixError::Transport(TransportError::Io(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("no addresses for {}", self.addr),
                )))
            })?;
        self.emit(ConnectorEvent::ResolvedAddress(resolved));
        let stream = transport::dial(&resolved.to_string()).await?;
        Ok(stream)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn backoff_grows_and_caps() {
        let retry = RetryConfig::default();
        assert_eq!(retry.delay_for(1), Duration::from_secs(1));
        assert_eq!(retry.delay_for(2), Duration::from_secs(2));
        assert_eq!(retry.delay_for(3), Duration::from_secs(4));
        assert_eq!(retry.delay_for(10), Duration::from_secs(30));
    }
}
