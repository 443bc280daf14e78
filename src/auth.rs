//! Provider credentials and the access-token model cached by the token manager.

pub mod credentials;
pub mod secret;
pub mod token;

pub use credentials::*;
pub use secret::*;
pub use token::*;
