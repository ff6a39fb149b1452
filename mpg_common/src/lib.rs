mod money;

pub mod fees;
pub mod op;
mod secret;

pub use money::{Paise, PaiseConversionError};
pub use secret::Secret;
