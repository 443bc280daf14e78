//! Relay orchestrators: the token manager and the effect relay built on top of it.

mod relay;
mod token;

pub use relay::*;
pub use token::*;
