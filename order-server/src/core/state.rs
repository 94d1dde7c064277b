//! Server state
//!
//! [`AppState`] holds shared references to every service the handlers
//! need. Cloning is shallow (Arc / pool handles).

use std::sync::Arc;

use crate::core::Config;
use crate::db::DbService;
use crate::notify::{LogNotifier, Notifier};
use crate::payments::card::CardGateway;
use crate::payments::gateway::Gateways;
use crate::payments::momo::MomoGateway;
use shared::AppResult;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub db: DbService,
    pub gateways: Gateways,
    pub notifier: Arc<dyn Notifier>,
}

impl AppState {
    /// Initialize the full production state: database (with migrations),
    /// gateway clients and the default notifier.
    pub async fn initialize(config: &Config) -> AppResult<Self> {
        let db = DbService::new(&config.database_path).await?;

        let card = CardGateway::new(
            config.card_base_url.clone(),
            config.card_api_key.clone(),
            config.gateway_timeout_ms,
        )?;
        let momo = MomoGateway::new(
            config.momo_base_url.clone(),
            config.momo_api_user.clone(),
            config.momo_api_key.clone(),
            config.momo_target_env.clone(),
            config.gateway_timeout_ms,
        )?;
        let gateways = Gateways::new(Arc::new(card), Arc::new(momo));

        Ok(Self {
            config: config.clone(),
            db,
            gateways,
            notifier: Arc::new(LogNotifier),
        })
    }

    /// Assemble state from parts (tests inject stub gateways/notifiers).
    pub fn with_parts(
        config: Config,
        db: DbService,
        gateways: Gateways,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            config,
            db,
            gateways,
            notifier,
        }
    }
}
