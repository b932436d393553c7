use crate::event::{ComputeEvent, EventSink, WarningReason};

/// Renders compute events as human-readable lines on stderr.
///
/// This is the thin console collaborator from the engine's point of view; the
/// numeric core only ever talks to the `EventSink` trait.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleReporter;

impl ConsoleReporter {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for ConsoleReporter {
    fn emit(&mut self, event: ComputeEvent) {
        match event {
            ComputeEvent::Started {
                target_digits,
                max_iterations,
            } => {
                eprintln!("target precision: {target_digits} digits | max iterations: {max_iterations}");
            }
            ComputeEvent::Progress {
                iteration,
                reliable_digits,
                estimated_remaining_seconds,
            } => {
                eprintln!(
                    "iter {iteration:03} | reliable digits: {reliable_digits:05} | est. remaining: {estimated_remaining_seconds:.1}s"
                );
            }
            ComputeEvent::Warning {
                reason: WarningReason::StabilityFloor,
            } => {
                eprintln!("warning: step size vanished at working precision, stopping early");
            }
            ComputeEvent::Warning {
                reason: WarningReason::DenominatorUnderflow,
            } => {
                eprintln!("warning: denominator underflowed to zero, stopping early");
            }
            ComputeEvent::Interrupted => {
                eprintln!("interrupted, reporting best estimate so far");
            }
            ComputeEvent::Fault { message } => {
                eprintln!("internal fault: {message}");
            }
            ComputeEvent::Completed {
                iterations_run,
                elapsed_seconds,
                digits_produced,
            } => {
                eprintln!(
                    "completed: {iterations_run} iterations in {elapsed_seconds:.2}s, {digits_produced} reliable digits"
                );
            }
        }
    }
}
