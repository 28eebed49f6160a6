//! Shared application state.

use crate::config::Config;
use std::sync::Arc;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use twinrelay_core::{
    ExpoPushClient, NotificationDispatcher, NotificationTemplate, PushProvider, RelayHub,
    TwinRegistry,
};

/// Shared application state.
pub struct AppState {
    pub registry: TwinRegistry,
    pub relay: RelayHub,
    pub dispatcher: NotificationDispatcher,
    pub config: Config,
}

impl AppState {
    /// State backed by the Expo push service configured in `config.push`.
    pub fn new(config: Config, shutdown: CancellationToken) -> twinrelay_core::Result<Self> {
        let provider = ExpoPushClient::new(
            config.push.endpoint.clone(),
            config.push.access_token.clone(),
            Duration::from_secs(config.push.timeout_secs),
        )?;
        Ok(Self::with_provider(config, Arc::new(provider), shutdown))
    }

    pub fn with_provider(
        config: Config,
        provider: Arc<dyn PushProvider>,
        shutdown: CancellationToken,
    ) -> Self {
        let template = NotificationTemplate {
            title: config.push.title.clone(),
            body: config.push.body.clone(),
        };

        Self {
            registry: TwinRegistry::with_seed(config.seed.clone()),
            relay: RelayHub::new(shutdown),
            dispatcher: NotificationDispatcher::new(provider, template),
            config,
        }
    }
}
