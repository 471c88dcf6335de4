//! Fixed-point arithmetic
//!
//! All ledger math runs on `u128` with checked operations. Silent wraparound
//! would corrupt the shared aggregates, so every overflow surfaces as a
//! [`MathError`]. Each division states its rounding direction in its name.

use thiserror::Error;

/// Precision of the accrual multipliers (1e18 = 1.0)
pub const SCALE: u128 = 1_000_000_000_000_000_000;

/// Basis-point denominator for ltv, thresholds, bonus and apr (10_000 = 100%)
pub const PRECISION_BASE: u128 = 10_000;

/// 365 * 24 * 3600
pub const SECONDS_PER_YEAR: u128 = 31_536_000;

/// Arithmetic failures. Always fatal for the operation that hit them.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum MathError {
    #[error("Arithmetic overflow")]
    Overflow,

    #[error("Arithmetic underflow")]
    Underflow,

    #[error("Division by zero")]
    DivisionByZero,
}

/// `a + b`
#[inline]
pub fn add(a: u128, b: u128) -> Result<u128, MathError> {
    a.checked_add(b).ok_or(MathError::Overflow)
}

/// `a - b`, failing instead of going below zero
#[inline]
pub fn sub(a: u128, b: u128) -> Result<u128, MathError> {
    a.checked_sub(b).ok_or(MathError::Underflow)
}

/// `a * b`
#[inline]
pub fn mul(a: u128, b: u128) -> Result<u128, MathError> {
    a.checked_mul(b).ok_or(MathError::Overflow)
}

/// `floor(a * b / denominator)`
pub fn mul_div_floor(a: u128, b: u128, denominator: u128) -> Result<u128, MathError> {
    if denominator == 0 {
        return Err(MathError::DivisionByZero);
    }
    Ok(mul(a, b)? / denominator)
}

/// `ceil(a * b / denominator)`
pub fn mul_div_ceil(a: u128, b: u128, denominator: u128) -> Result<u128, MathError> {
    if denominator == 0 {
        return Err(MathError::DivisionByZero);
    }
    let product = mul(a, b)?;
    let quotient = product / denominator;
    if product % denominator == 0 {
        Ok(quotient)
    } else {
        add(quotient, 1)
    }
}

/// `10^exponent`
pub fn pow10(exponent: u32) -> Result<u128, MathError> {
    10u128.checked_pow(exponent).ok_or(MathError::Overflow)
}

/// Absolute difference of two unsigned values
#[inline]
pub fn abs_diff(a: u128, b: u128) -> u128 {
    a.abs_diff(b)
}
