use crate::cancel::CancelToken;
use crate::context::MathContext;
use crate::error::{PiError, Result};
use crate::event::{ComputeEvent, EventSinkBox, NullSink, WarningReason};
use dashu::float::DBig;
use std::time::{Duration, Instant};

/// Extra digits carried above the reliable-digit estimate.
const PRECISION_HEADROOM: usize = 100;
/// Hard ceiling on working precision, relative to the target.
const MAX_PRECISION_HEADROOM: usize = 200;
/// Consecutive stable estimates required before declaring convergence.
const REQUIRED_STABLE_ITERATIONS: u32 = 2;
/// A progress event is emitted every this many iterations.
const PROGRESS_INTERVAL: u32 = 5;

/// Outcome of one `compute` call.
#[derive(Debug, Clone)]
pub struct ComputeResult {
    /// Best pi approximation, truncated to `target_digits` fractional digits.
    pub value: DBig,
    /// Iterations actually executed, which may be fewer than requested.
    pub iterations_run: u32,
    /// Wall-clock time spent inside `compute`.
    pub elapsed: Duration,
    /// The digit count the caller asked for.
    pub target_digits: usize,
}

impl ComputeResult {
    pub fn elapsed_seconds(&self) -> f64 {
        self.elapsed.as_secs_f64()
    }

    /// The value rendered with exactly `target_digits` digits after the
    /// decimal point, zero-padded if the trailing digits happen to be zero.
    pub fn digits(&self) -> String {
        let raw = self.value.to_string();
        let (int_part, frac_part) = match raw.split_once('.') {
            Some((int_part, frac_part)) => (int_part.to_string(), frac_part.to_string()),
            None => (raw, String::new()),
        };
        let mut frac = frac_part;
        frac.truncate(self.target_digits);
        while frac.len() < self.target_digits {
            frac.push('0');
        }
        format!("{int_part}.{frac}")
    }
}

// Loop state that must survive early exits so finalization can report it.
struct LoopOutcome {
    best: DBig,
    iterations_run: u32,
    reached_digits: usize,
}

/// Computes pi with the Gauss-Legendre arithmetic-geometric-mean iteration.
///
/// The engine owns an event sink for progress/diagnostic reporting and a
/// cancellation token checked between iterations. All numeric state lives
/// inside a single `compute` call; the engine itself is reusable.
pub struct PiEngine {
    sink: EventSinkBox,
    cancel: CancelToken,
}

impl Default for PiEngine {
    fn default() -> Self {
        Self::new(Box::new(NullSink))
    }
}

impl PiEngine {
    pub fn new(sink: EventSinkBox) -> Self {
        Self {
            sink,
            cancel: CancelToken::new(),
        }
    }

    /// Installs an externally shared cancellation token.
    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Runs up to `max_iterations` AGM steps toward `target_digits` fractional
    /// digits of pi.
    ///
    /// Only the two preconditions can produce an `Err`. Every runtime
    /// condition inside the loop (convergence, precision floor, denominator
    /// underflow, cancellation, internal fault) ends the loop gracefully and
    /// is reported through the event stream; finalization runs on every exit
    /// path and the best estimate accepted so far is always returned.
    pub fn compute(&mut self, target_digits: usize, max_iterations: u32) -> Result<ComputeResult> {
        if target_digits == 0 {
            return Err(PiError::InvalidArgument(
                "target digit count must be at least 1".to_string(),
            ));
        }
        if max_iterations == 0 {
            return Err(PiError::InvalidArgument(
                "iteration cap must be at least 1".to_string(),
            ));
        }

        self.sink.emit(ComputeEvent::Started {
            target_digits,
            max_iterations,
        });

        let start = Instant::now();
        let mut ctx = MathContext::new(target_digits + PRECISION_HEADROOM);
        let mut outcome = LoopOutcome {
            best: DBig::ZERO,
            iterations_run: 0,
            reached_digits: 0,
        };

        if let Err(fault) = self.run_loop(&mut ctx, target_digits, max_iterations, start, &mut outcome) {
            tracing::warn!(error = %fault, "iteration aborted by internal fault");
            self.sink.emit(ComputeEvent::Fault {
                message: fault.to_string(),
            });
        }

        // Finalization: restore the target precision and truncate the best
        // estimate. Runs on every exit path, including cancellation and fault.
        ctx.set_digits(target_digits + 1);
        let value = ctx.round(truncate_to_digits(&outcome.best, target_digits));
        let elapsed = start.elapsed();

        self.sink.emit(ComputeEvent::Completed {
            iterations_run: outcome.iterations_run,
            elapsed_seconds: elapsed.as_secs_f64(),
            digits_produced: outcome.reached_digits,
        });

        Ok(ComputeResult {
            value,
            iterations_run: outcome.iterations_run,
            elapsed,
            target_digits,
        })
    }

    fn run_loop(
        &mut self,
        ctx: &mut MathContext,
        target_digits: usize,
        max_iterations: u32,
        start: Instant,
        outcome: &mut LoopOutcome,
    ) -> Result<()> {
        let one = ctx.value_from(1);
        let two = ctx.value_from(2);
        let four = ctx.value_from(4);

        let mut a = one.clone();
        let mut b = ctx.div(&one, &ctx.sqrt(&two));
        let mut t = ctx.parse("0.25")?;
        let mut p = one;

        let threshold = MathContext::pow10(-(target_digits as i64));
        let mut stable_count = 0u32;

        for iteration in 1..=max_iterations {
            if self.cancel.is_cancelled() {
                self.sink.emit(ComputeEvent::Interrupted);
                return Ok(());
            }
            outcome.iterations_run = iteration;

            let a_prev = a.clone();
            let b_prev = b.clone();
            a = ctx.div(&ctx.add(&a_prev, &b_prev), &two);
            b = ctx.sqrt(&ctx.mul(&a_prev, &b_prev));
            let delta = ctx.sub(&a_prev, &a);
            let delta_sq = ctx.mul(&delta, &delta);

            // Stability guard: the step size is below the numeric floor.
            if delta_sq == DBig::ZERO {
                self.sink.emit(ComputeEvent::Warning {
                    reason: WarningReason::StabilityFloor,
                });
                return Ok(());
            }

            t = ctx.sub(&t, &ctx.mul(&p, &delta_sq));
            p = ctx.mul(&p, &two);
            if t < DBig::ZERO {
                return Err(PiError::Numeric(
                    "correction accumulator went negative".to_string(),
                ));
            }

            // Division guard.
            let denominator = ctx.mul(&four, &t);
            if denominator == DBig::ZERO {
                self.sink.emit(ComputeEvent::Warning {
                    reason: WarningReason::DenominatorUnderflow,
                });
                return Ok(());
            }

            let sum = ctx.add(&a, &b);
            let current = ctx.div(&ctx.mul(&sum, &sum), &denominator);

            let diff = if current >= outcome.best {
                ctx.sub(&current, &outcome.best)
            } else {
                ctx.sub(&outcome.best, &current)
            };

            // Adaptive precision: carry only as many digits as the observed
            // convergence rate justifies, plus headroom.
            let reliable = if diff == DBig::ZERO {
                ctx.set_digits(target_digits + PRECISION_HEADROOM);
                target_digits
            } else {
                let estimated = reliable_digits(&diff, target_digits);
                ctx.set_digits(
                    (target_digits + MAX_PRECISION_HEADROOM).min(estimated + PRECISION_HEADROOM),
                );
                estimated
            };
            outcome.reached_digits = reliable;
            tracing::debug!(iteration, reliable, working_digits = ctx.digits(), "agm step");

            if diff < threshold {
                stable_count += 1;
                if stable_count >= REQUIRED_STABLE_ITERATIONS {
                    outcome.reached_digits = target_digits;
                    return Ok(());
                }
            } else {
                stable_count = 0;
                outcome.best = current;
            }

            if iteration % PROGRESS_INTERVAL == 0 {
                let average = start.elapsed().as_secs_f64() / f64::from(iteration);
                self.sink.emit(ComputeEvent::Progress {
                    iteration,
                    reliable_digits: reliable,
                    estimated_remaining_seconds: average * f64::from(max_iterations - iteration),
                });
            }
        }

        Ok(())
    }
}

/// Largest `k <= target` with `diff <= 10^-k`, i.e. `floor(-log10(diff))`
/// clamped to `[0, target]`. Returns the sentinel 0 for any difference of one
/// or more, so no logarithm (and no failure mode) is involved.
fn reliable_digits(diff: &DBig, target: usize) -> usize {
    if *diff > DBig::ONE {
        return 0;
    }
    let (mut lo, mut hi) = (0usize, target);
    while lo < hi {
        let mid = lo + (hi - lo).div_ceil(2);
        if *diff <= MathContext::pow10(-(mid as i64)) {
            lo = mid;
        } else {
            hi = mid - 1;
        }
    }
    lo
}

/// Round-toward-zero at `digits` fractional digits, via exact decimal shifts.
fn truncate_to_digits(value: &DBig, digits: usize) -> DBig {
    let shifted = value.clone() * MathContext::pow10(digits as i64);
    shifted.trunc() * MathContext::pow10(-(digits as i64))
}
