//! Deterministic basis-point fee policy.
//!
//! The fee is computed once, before proof generation, and bound into the
//! ext-data hash. The circuit re-derives the balance equation including
//! the fee, so a miscalculated fee yields a proof the verifier rejects
//! rather than an accepted incorrect transfer.

use crate::error::FeeError;

/// Basis-point denominator.
pub const RATE_DENOMINATOR: u64 = 10_000;

/// Deposit fee rate in basis points.
pub const DEPOSIT_FEE_RATE: u64 = 50;

/// Withdrawal fee rate in basis points.
pub const WITHDRAW_FEE_RATE: u64 = 25;

/// Tolerance (basis points) when validating a caller-supplied fee against
/// policy, absorbing rate changes that race in-flight transactions.
pub const FEE_ERROR_MARGIN: u64 = 100;

fn floor_rate(amount: u64, rate: u64) -> u64 {
    ((amount as u128) * (rate as u128) / (RATE_DENOMINATOR as u128)) as u64
}

/// `floor(amount * DEPOSIT_FEE_RATE / RATE_DENOMINATOR)`.
pub fn deposit_fee(amount: u64) -> u64 {
    floor_rate(amount, DEPOSIT_FEE_RATE)
}

/// `floor(amount * WITHDRAW_FEE_RATE / RATE_DENOMINATOR)`.
pub fn withdrawal_fee(amount: u64) -> u64 {
    floor_rate(amount, WITHDRAW_FEE_RATE)
}

/// Validate a caller-supplied fee against the configured rates.
///
/// Accepts any fee of at least `expected * (1 - FEE_ERROR_MARGIN/10000)`
/// where `expected` is the policy fee for the external amount's direction.
/// No fee is required when `ext_amount` is zero.
pub fn validate_fee(ext_amount: i64, provided_fee: u64) -> Result<(), FeeError> {
    let expected = match ext_amount {
        0 => return Ok(()),
        a if a > 0 => deposit_fee(a as u64),
        a => withdrawal_fee(a.checked_neg().ok_or(FeeError::Overflow)? as u64),
    };

    let minimum = if expected > 0 {
        ((expected as u128) * ((RATE_DENOMINATOR - FEE_ERROR_MARGIN) as u128)
            / (RATE_DENOMINATOR as u128)) as u64
    } else {
        0
    };

    if provided_fee < minimum {
        return Err(FeeError::BelowPolicy {
            provided: provided_fee,
            minimum,
        });
    }
    Ok(())
}
