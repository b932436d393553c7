use agm_pi::cancel::CancelToken;
use agm_pi::engine::PiEngine;
use agm_pi::error::PiError;
use agm_pi::event::{ComputeEvent, EventSink, RecordingSink};

/// Pi to 100 fractional digits, used as the reference value.
const PI_100: &str = "3.1415926535897932384626433832795028841971693993751058209749445923078164062862089986280348253421170679";

fn pi_prefix(fraction_digits: usize) -> &'static str {
    &PI_100[..2 + fraction_digits]
}

#[test]
fn test_fifty_digit_scenario() {
    let mut engine = PiEngine::default();
    let result = engine.compute(50, 20).unwrap();

    assert_eq!(result.digits(), pi_prefix(50));
    assert!(result.iterations_run <= 20);
}

#[test]
fn test_sixty_digits_converge() {
    let mut engine = PiEngine::default();
    let result = engine.compute(60, 30).unwrap();
    assert_eq!(result.digits(), pi_prefix(60));
}

#[test]
fn test_rounding_is_idempotent() {
    let mut engine = PiEngine::default();
    let result = engine.compute(40, 20).unwrap();

    let first = result.digits();
    let second = result.digits();
    assert_eq!(first, second);
    assert_eq!(first.len(), 2 + 40);
}

#[test]
fn test_exhausted_iteration_cap_still_returns() {
    let mut engine = PiEngine::default();
    let result = engine.compute(80, 3).unwrap();

    assert_eq!(result.iterations_run, 3);
    // Not converged, but finite and printable at full width.
    assert_eq!(result.digits().len(), 2 + 80);
    assert!(result.digits().starts_with("3.14"));
}

#[test]
fn test_invalid_arguments() {
    let mut engine = PiEngine::default();
    assert!(matches!(
        engine.compute(0, 10),
        Err(PiError::InvalidArgument(_))
    ));
    assert!(matches!(
        engine.compute(10, 0),
        Err(PiError::InvalidArgument(_))
    ));
}

#[test]
fn test_event_stream_order_and_progress() {
    let sink = RecordingSink::new();
    let mut engine = PiEngine::new(Box::new(sink.clone()));
    engine.compute(50, 20).unwrap();

    let events = sink.events();
    assert!(matches!(events.first(), Some(ComputeEvent::Started { .. })));
    assert!(matches!(
        events.last(),
        Some(ComputeEvent::Completed {
            digits_produced: 50,
            ..
        })
    ));
    assert!(events.iter().any(|event| matches!(
        event,
        ComputeEvent::Progress { iteration: 5, .. }
    )));
}

#[test]
fn test_progress_reliable_digits_never_decrease() {
    let sink = RecordingSink::new();
    let mut engine = PiEngine::new(Box::new(sink.clone()));
    // Large target so the loop runs long enough to emit several progress events.
    engine.compute(1500, 25).unwrap();

    let reported: Vec<usize> = sink
        .events()
        .iter()
        .filter_map(|event| match event {
            ComputeEvent::Progress {
                reliable_digits, ..
            } => Some(*reliable_digits),
            _ => None,
        })
        .collect();
    assert!(reported.len() >= 2);
    assert!(reported.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[test]
fn test_cancelled_before_first_iteration() {
    let token = CancelToken::new();
    token.cancel();

    let sink = RecordingSink::new();
    let mut engine = PiEngine::new(Box::new(sink.clone())).with_cancel_token(token);
    let result = engine.compute(20, 10).unwrap();

    assert_eq!(result.iterations_run, 0);
    assert!(
        sink.events()
            .iter()
            .any(|event| matches!(event, ComputeEvent::Interrupted))
    );
}

/// Sink that flips the cancellation flag as soon as it sees a progress event,
/// giving a deterministic mid-loop interrupt.
struct CancelOnProgress {
    inner: RecordingSink,
    token: CancelToken,
}

impl EventSink for CancelOnProgress {
    fn emit(&mut self, event: ComputeEvent) {
        if matches!(event, ComputeEvent::Progress { .. }) {
            self.token.cancel();
        }
        self.inner.emit(event);
    }
}

#[test]
fn test_cancelled_mid_loop() {
    let recording = RecordingSink::new();
    let token = CancelToken::new();
    let sink = CancelOnProgress {
        inner: recording.clone(),
        token: token.clone(),
    };

    // Target far beyond what 5 iterations can reach, so cancellation wins.
    let mut engine = PiEngine::new(Box::new(sink)).with_cancel_token(token);
    let result = engine.compute(2000, 40).unwrap();

    assert_eq!(result.iterations_run, 5);
    assert!(result.iterations_run < 40);

    let events = recording.events();
    assert!(
        events
            .iter()
            .any(|event| matches!(event, ComputeEvent::Interrupted))
    );
    assert!(matches!(events.last(), Some(ComputeEvent::Completed { .. })));
}
