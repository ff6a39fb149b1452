//! The authenticated principal, as handed to us by the upstream identity proxy.
//!
//! Session issuance and token validation happen upstream; by the time a request reaches this server the
//! proxy has already authenticated the caller and stamped the request with the principal headers. This
//! module only reads them back. Role checks for specific operations happen in the handlers, where the
//! order's parties are known.

use std::{
    fmt::Display,
    future::{ready, Ready},
    str::FromStr,
};

use actix_web::{dev::Payload, FromRequest, HttpRequest};
use log::debug;
use mandi_payment_engine::db_types::Order;
use serde::{Deserialize, Serialize};

use crate::errors::{AuthError, ServerError};

pub const USER_ID_HEADER: &str = "X-Mandi-User-Id";
pub const ROLE_HEADER: &str = "X-Mandi-Role";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// A street-food vendor buying raw material.
    Vendor,
    /// A raw-material supplier fulfilling orders.
    Supplier,
    /// Marketplace operations staff.
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Vendor => write!(f, "Vendor"),
            Role::Supplier => write!(f, "Supplier"),
            Role::Admin => write!(f, "Admin"),
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "vendor" => Ok(Role::Vendor),
            "supplier" => Ok(Role::Supplier),
            "admin" => Ok(Role::Admin),
            other => Err(format!("Unknown role: {other}")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Principal {
    pub user_id: String,
    pub role: Role,
}

impl Principal {
    fn from_headers(req: &HttpRequest) -> Result<Self, ServerError> {
        let user_id = req
            .headers()
            .get(USER_ID_HEADER)
            .ok_or(AuthError::MissingPrincipal)?
            .to_str()
            .map_err(|e| AuthError::MalformedPrincipal(e.to_string()))?
            .to_string();
        if user_id.is_empty() {
            return Err(AuthError::MissingPrincipal.into());
        }
        let role = req
            .headers()
            .get(ROLE_HEADER)
            .ok_or(AuthError::MissingPrincipal)?
            .to_str()
            .map_err(|e| AuthError::MalformedPrincipal(e.to_string()))?
            .parse::<Role>()
            .map_err(AuthError::MalformedPrincipal)?;
        debug!("💻️ Request principal: {user_id} ({role})");
        Ok(Self { user_id, role })
    }

    pub fn require_role(&self, role: Role) -> Result<(), ServerError> {
        if self.role == role || self.role == Role::Admin {
            Ok(())
        } else {
            Err(ServerError::InsufficientPermissions(format!("{role} role required")))
        }
    }

    /// Admins see every order; vendors and suppliers only the ones they are party to.
    pub fn may_view(&self, order: &Order) -> bool {
        self.role == Role::Admin || self.user_id == order.vendor_id || self.user_id == order.supplier_id
    }

    pub fn is_order_vendor(&self, order: &Order) -> bool {
        self.role == Role::Admin || (self.role == Role::Vendor && self.user_id == order.vendor_id)
    }

    pub fn is_order_supplier(&self, order: &Order) -> bool {
        self.role == Role::Admin || (self.role == Role::Supplier && self.user_id == order.supplier_id)
    }
}

impl FromRequest for Principal {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Principal::from_headers(req))
    }
}
