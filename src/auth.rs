//! Credential model: the validated credential set, secrets, and authentication modes.

pub mod credential;
pub mod mode;
pub mod secret;

pub use credential::*;
pub use mode::*;
pub use secret::*;
