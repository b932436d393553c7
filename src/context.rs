use crate::error::{PiError, Result};
use dashu::base::SquareRoot;
use dashu::float::DBig;

/// A call-scoped arbitrary-precision context.
///
/// Every arithmetic operation the AGM loop performs goes through one of these
/// methods, which round the result to the context's current digit count. The
/// context is owned by a single `compute` invocation; there is no process-wide
/// precision setting, so repeated or concurrent computations cannot interfere
/// with each other.
#[derive(Debug, Clone)]
pub struct MathContext {
    digits: usize,
}

impl MathContext {
    /// Creates a context carrying `digits` significant decimal digits.
    pub fn new(digits: usize) -> Self {
        Self { digits }
    }

    /// The number of significant digits currently carried.
    pub fn digits(&self) -> usize {
        self.digits
    }

    /// Rescales the context; subsequent operations round to the new width.
    /// Values produced earlier keep the digits they already have.
    pub fn set_digits(&mut self, digits: usize) {
        self.digits = digits;
    }

    /// Rounds a value to the context's current digit count.
    pub fn round(&self, value: DBig) -> DBig {
        value.with_precision(self.digits).value()
    }

    /// Brings a small integer constant into the context.
    pub fn value_from(&self, value: u32) -> DBig {
        self.round(DBig::from(value))
    }

    /// Parses a decimal literal at the context's precision.
    pub fn parse(&self, literal: &str) -> Result<DBig> {
        literal
            .parse::<DBig>()
            .map(|value| self.round(value))
            .map_err(|e| PiError::Numeric(format!("cannot parse decimal literal {literal:?}: {e}")))
    }

    pub fn add(&self, lhs: &DBig, rhs: &DBig) -> DBig {
        self.round(lhs.clone() + rhs.clone())
    }

    pub fn sub(&self, lhs: &DBig, rhs: &DBig) -> DBig {
        self.round(lhs.clone() - rhs.clone())
    }

    pub fn mul(&self, lhs: &DBig, rhs: &DBig) -> DBig {
        self.round(lhs.clone() * rhs.clone())
    }

    /// Quotient at the context's precision. `rhs` must be nonzero.
    pub fn div(&self, lhs: &DBig, rhs: &DBig) -> DBig {
        self.round(lhs.clone() / rhs.clone())
    }

    /// Square root at the context's precision. `value` must be nonnegative.
    pub fn sqrt(&self, value: &DBig) -> DBig {
        self.round(self.round(value.clone()).sqrt())
    }

    /// Exact power of ten, used for convergence thresholds and final rounding.
    pub fn pow10(exponent: i64) -> DBig {
        format!("1e{exponent}")
            .parse::<DBig>()
            .expect("power-of-ten literal")
    }
}
