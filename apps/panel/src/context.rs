use std::{sync::Arc, time::Duration};

use anyhow::Context;
use backend_client::BackendClient;

use crate::config::Settings;

/// Handle passed to everything that talks to the printer. Built once at
/// start-up from settings; there is no process-wide client.
#[derive(Clone)]
pub struct PanelContext {
    pub client: Arc<dyn BackendClient>,
    pub poll_interval: Duration,
}

impl PanelContext {
    pub fn from_settings(settings: &Settings) -> anyhow::Result<Self> {
        let client = backend_client::connect(&settings.client_config())
            .with_context(|| format!("failed to set up {} backend", settings.backend))?;
        Ok(Self {
            client,
            poll_interval: settings.poll_interval(),
        })
    }
}
