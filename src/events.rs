//! Notifications published to the rendering layer.

use crate::analysis::{AnalysisKind, AnalysisResult};
use crate::force::{ForceEdge, MetricKind};
use std::sync::mpsc::Sender;
use std::sync::Mutex;

#[derive(Debug, Clone)]
pub enum VectoEvent {
    AnalysisStarted {
        kind: AnalysisKind,
    },
    AnalysisCompleted {
        result: AnalysisResult,
    },
    AnalysisFailed {
        kind: AnalysisKind,
        error: String,
    },
    ForceMatrixUpdated {
        metric: MetricKind,
        edges: Vec<ForceEdge>,
    },
}

impl VectoEvent {
    /// Get event type name
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::AnalysisStarted { .. } => "AnalysisStarted",
            Self::AnalysisCompleted { .. } => "AnalysisCompleted",
            Self::AnalysisFailed { .. } => "AnalysisFailed",
            Self::ForceMatrixUpdated { .. } => "ForceMatrixUpdated",
        }
    }
}

/// Fire-and-forget receiver of [`VectoEvent`]s. Implementations must not
/// block for long; nothing waits on or acknowledges delivery.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: &VectoEvent);
}

/// Discards everything.
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&self, _event: &VectoEvent) {}
}

/// Logs each event through `tracing`.
pub struct TracingSink;

impl EventSink for TracingSink {
    fn emit(&self, event: &VectoEvent) {
        match event {
            VectoEvent::AnalysisStarted { kind } => {
                tracing::debug!(kind = %kind, "Analysis started");
            }
            VectoEvent::AnalysisCompleted { result } => {
                tracing::info!(kind = %result.kind(), "Analysis completed");
            }
            VectoEvent::AnalysisFailed { kind, error } => {
                tracing::warn!(kind = %kind, error = %error, "Analysis failed");
            }
            VectoEvent::ForceMatrixUpdated { metric, edges } => {
                tracing::debug!(metric = %metric, edges = edges.len(), "Force matrix updated");
            }
        }
    }
}

/// Keeps every event in memory; handy for tests and replay.
#[derive(Default)]
pub struct CollectingSink {
    events: Mutex<Vec<VectoEvent>>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<VectoEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }

    pub fn event_types(&self) -> Vec<&'static str> {
        self.events().iter().map(VectoEvent::event_type).collect()
    }

    pub fn clear(&self) {
        if let Ok(mut events) = self.events.lock() {
            events.clear();
        }
    }
}

impl EventSink for CollectingSink {
    fn emit(&self, event: &VectoEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}

/// Forwards events over an mpsc channel. A dropped receiver is ignored.
pub struct ChannelSink {
    sender: Mutex<Sender<VectoEvent>>,
}

impl ChannelSink {
    pub fn new(sender: Sender<VectoEvent>) -> Self {
        Self {
            sender: Mutex::new(sender),
        }
    }
}

impl EventSink for ChannelSink {
    fn emit(&self, event: &VectoEvent) {
        if let Ok(sender) = self.sender.lock() {
            let _ = sender.send(event.clone());
        }
    }
}
