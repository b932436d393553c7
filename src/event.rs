use serde::Serialize;
use std::sync::{Arc, Mutex};

/// Reason for an early, non-error loop termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WarningReason {
    /// The per-iteration step size vanished at the current working precision.
    StabilityFloor,
    /// The `4t` denominator rounded to exactly zero.
    DenominatorUnderflow,
}

/// Typed progress/diagnostic events emitted by the engine at defined points.
///
/// The engine only emits; how (or whether) events are displayed is entirely
/// up to the sink, so the numeric core never formats text.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ComputeEvent {
    Started {
        target_digits: usize,
        max_iterations: u32,
    },
    /// Emitted every 5th iteration.
    Progress {
        iteration: u32,
        reliable_digits: usize,
        estimated_remaining_seconds: f64,
    },
    Warning {
        reason: WarningReason,
    },
    Interrupted,
    Fault {
        message: String,
    },
    Completed {
        iterations_run: u32,
        elapsed_seconds: f64,
        digits_produced: usize,
    },
}

/// Port for consumers of the event stream.
pub trait EventSink: Send {
    fn emit(&mut self, event: ComputeEvent);
}

pub type EventSinkBox = Box<dyn EventSink>;

/// Sink that discards every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl EventSink for NullSink {
    fn emit(&mut self, _event: ComputeEvent) {}
}

/// In-memory sink that records the full event sequence.
///
/// Cloning shares the underlying log, so a caller can keep one handle and give
/// another to the engine.
#[derive(Debug, Default, Clone)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<ComputeEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the events recorded so far, in emission order.
    pub fn events(&self) -> Vec<ComputeEvent> {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: ComputeEvent) {
        self.events
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .push(event);
    }
}
