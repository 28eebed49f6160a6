//! Twin registry, relay connections and notification dispatch.

mod dispatcher;
mod error;
mod push;
mod registry;
mod relay;

pub use dispatcher::{NotificationDispatcher, NotificationTemplate};
pub use error::TwinError;
pub use push::{is_expo_push_token, ExpoPushClient, PushError, PushProvider, DEFAULT_EXPO_ENDPOINT};
pub use registry::TwinRegistry;
pub use relay::{read_loop, write_loop, Inbound, RelayCommand, RelayHub, RelayLink};

/// Result type for twin relay operations.
pub type Result<T> = std::result::Result<T, TwinError>;
