//! Pre-flight checks for outbound payment requests.
//!
//! The gateway rejects bad requests too, but a round trip to find that out is wasted latency and (worse) the
//! failure arrives as an opaque gateway message. Everything here fails before any network call is made, and
//! nothing is ever silently coerced.

use mpg_common::Paise;
use regex::Regex;

use crate::{data_objects::NewPaymentRequest, error::GatewayError};

/// The smallest amount the gateway will collect.
pub const MIN_PAYMENT_REQUEST: Paise = Paise::from_rupees(9);
/// The gateway refuses one- and two-character purposes.
pub const MIN_PURPOSE_LEN: usize = 3;

pub fn validate_payment_request(request: &NewPaymentRequest) -> Result<(), GatewayError> {
    if request.purpose.trim().chars().count() < MIN_PURPOSE_LEN {
        return Err(GatewayError::Validation(format!(
            "Purpose must be at least {MIN_PURPOSE_LEN} characters, got '{}'",
            request.purpose
        )));
    }
    if request.amount < MIN_PAYMENT_REQUEST {
        return Err(GatewayError::Validation(format!(
            "Amount {} is below the gateway minimum of {MIN_PAYMENT_REQUEST}",
            request.amount
        )));
    }
    if request.buyer_name.trim().is_empty() {
        return Err(GatewayError::Validation("Buyer name is required".to_string()));
    }
    let email_re = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    if !email_re.is_match(&request.buyer_email) {
        return Err(GatewayError::Validation(format!("'{}' is not a valid email address", request.buyer_email)));
    }
    let phone_re = Regex::new(r"^(\+91)?[6-9][0-9]{9}$").unwrap();
    if !phone_re.is_match(&request.buyer_phone) {
        return Err(GatewayError::Validation(format!(
            "'{}' is not a valid Indian mobile number",
            request.buyer_phone
        )));
    }
    Ok(())
}
