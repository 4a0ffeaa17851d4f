//! Request handlers.

pub mod account;
pub mod health;
pub mod session;

pub use account::*;
pub use health::*;
pub use session::*;
