//! Fee and commission policy.
//!
//! Everything here is pure integer arithmetic over [`Paise`] so the same inputs always produce bit-identical
//! outputs. These figures are recomputed wherever they are needed (checkout, audits, dispute reconciliation)
//! rather than trusted from historical rows.
//!
//! The platform retains [`COMMISSION_RATE_BPS`] of the order total out of the settled amount. The gateway's
//! surcharge ([`GATEWAY_RATE_BPS`] plus [`GATEWAY_FLAT_FEE`]) is passed through to the buyer on top of the
//! order total; commission is never computed from that inflated figure.

use thiserror::Error;

use crate::Paise;

/// Platform commission: 2.5% of the order total.
pub const COMMISSION_RATE_BPS: i64 = 250;
/// Gateway percentage fee: 2% of the order total.
pub const GATEWAY_RATE_BPS: i64 = 200;
/// Gateway flat per-transaction charge: ₹3.00.
pub const GATEWAY_FLAT_FEE: Paise = Paise::new(300);

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FeeError {
    #[error("Cannot compute fees on a negative amount ({0})")]
    InvalidAmount(Paise),
}

/// Rounds `amount × bps / 10_000` half-up at paise precision.
fn round_bps(amount: Paise, bps: i64) -> Paise {
    let scaled = amount.value() as i128 * bps as i128;
    Paise::new(((scaled + 5_000) / 10_000) as i64)
}

fn ensure_non_negative(amount: Paise) -> Result<(), FeeError> {
    if amount.is_negative() {
        Err(FeeError::InvalidAmount(amount))
    } else {
        Ok(())
    }
}

/// The platform's retained share of an order's value.
pub fn commission(order_total: Paise) -> Result<Paise, FeeError> {
    ensure_non_negative(order_total)?;
    Ok(round_bps(order_total, COMMISSION_RATE_BPS))
}

/// The gateway's charge for collecting `order_total`, passed through to the buyer.
pub fn gateway_fee(order_total: Paise) -> Result<Paise, FeeError> {
    ensure_non_negative(order_total)?;
    Ok(round_bps(order_total, GATEWAY_RATE_BPS) + GATEWAY_FLAT_FEE)
}

/// What the buyer is actually asked to pay: the order total plus the gateway surcharge.
pub fn amount_to_charge(order_total: Paise) -> Result<Paise, FeeError> {
    Ok(order_total + gateway_fee(order_total)?)
}
