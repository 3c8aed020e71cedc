//! Telemetry sinks: where simulated records go.
//!
//! A sink is bound to one unit and knows that unit's device name and domain.
//! Submission never blocks the simulation tick; delivery is the receiver's
//! concern.

use serde::Serialize;
use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::types::{Domain, TelemetryRecord};

/// Errors returned when a record cannot be submitted
#[derive(Debug, thiserror::Error)]
pub enum SinkError {
    #[error("sink for '{0}' is disconnected")]
    Disconnected(String),

    #[error("telemetry channel closed")]
    ChannelClosed,

    #[error("sink I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("telemetry serialization error: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Destination for one unit's telemetry.
///
/// The loop checks [`is_connected`](TelemetrySink::is_connected) before
/// advancing a unit; a unit whose sink is down is not advanced that tick.
pub trait TelemetrySink: Send + 'static {
    fn is_connected(&self) -> bool;

    /// Fire-and-forget submission
    fn publish(&mut self, record: &TelemetryRecord) -> Result<(), SinkError>;

    /// Human-readable name for logging (e.g. "stdout", "channel").
    fn sink_name(&self) -> &str;
}

/// Record wrapped with its origin, as delivered downstream
#[derive(Debug, Clone, Serialize)]
pub struct TelemetryMessage {
    pub device: String,
    pub domain: Domain,
    pub telemetry: TelemetryRecord,
}

// ============================================================================
// Stdout Sink (JSON lines)
// ============================================================================

/// Writes `{"device", "domain", "telemetry"}` as one JSON line on stdout
pub struct StdoutSink {
    device: String,
    domain: Domain,
}

impl StdoutSink {
    pub fn new(device: impl Into<String>, domain: Domain) -> Self {
        Self {
            device: device.into(),
            domain,
        }
    }
}

#[derive(Serialize)]
struct BorrowedMessage<'a> {
    device: &'a str,
    domain: Domain,
    telemetry: &'a TelemetryRecord,
}

impl TelemetrySink for StdoutSink {
    fn is_connected(&self) -> bool {
        true
    }

    fn publish(&mut self, record: &TelemetryRecord) -> Result<(), SinkError> {
        let message = BorrowedMessage {
            device: &self.device,
            domain: self.domain,
            telemetry: record,
        };
        let mut line = serde_json::to_vec(&message)?;
        line.push(b'\n');

        let mut out = std::io::stdout().lock();
        out.write_all(&line)?;
        out.flush()?;
        Ok(())
    }

    fn sink_name(&self) -> &str {
        "stdout"
    }
}

// ============================================================================
// Channel Sink (in-process)
// ============================================================================

/// Shared connectivity flag for a [`ChannelSink`]
#[derive(Debug, Clone)]
pub struct SinkHandle {
    connected: Arc<AtomicBool>,
}

impl SinkHandle {
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }
}

/// Create the channel that [`ChannelSink`]s submit into
pub fn telemetry_channel() -> (
    mpsc::UnboundedSender<TelemetryMessage>,
    mpsc::UnboundedReceiver<TelemetryMessage>,
) {
    mpsc::unbounded_channel()
}

/// Submits records into an unbounded tokio channel.
///
/// Reports disconnected when its [`SinkHandle`] says so or the receiver is gone.
pub struct ChannelSink {
    device: String,
    domain: Domain,
    tx: mpsc::UnboundedSender<TelemetryMessage>,
    connected: Arc<AtomicBool>,
}

impl ChannelSink {
    /// New sink, initially connected, plus the handle that toggles it
    pub fn new(
        device: impl Into<String>,
        domain: Domain,
        tx: mpsc::UnboundedSender<TelemetryMessage>,
    ) -> (Self, SinkHandle) {
        let connected = Arc::new(AtomicBool::new(true));
        let handle = SinkHandle {
            connected: Arc::clone(&connected),
        };
        let sink = Self {
            device: device.into(),
            domain,
            tx,
            connected,
        };
        (sink, handle)
    }
}

impl TelemetrySink for ChannelSink {
    fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire) && !self.tx.is_closed()
    }

    fn publish(&mut self, record: &TelemetryRecord) -> Result<(), SinkError> {
        if !self.connected.load(Ordering::Acquire) {
            return Err(SinkError::Disconnected(self.device.clone()));
        }
        self.tx
            .send(TelemetryMessage {
                device: self.device.clone(),
                domain: self.domain,
                telemetry: record.clone(),
            })
            .map_err(|_| SinkError::ChannelClosed)
    }

    fn sink_name(&self) -> &str {
        "channel"
    }
}
