//! Shared types for the twin relay server.

mod push;
mod relay;
mod twin;

pub use push::*;
pub use relay::*;
pub use twin::*;
