//! Shared application state

use league_forms::{
    DesignLibrary, DisabledNotifier, SubmissionNotifier, SubmissionService, SubmissionStore, TemplateStore,
};
use league_orders::OrderBook;
use league_settings::{EmailNotifier, LogMailer, Mailer, SettingsStore};
use league_teams::{KitPricingRegistry, TeamRegistry};
use std::sync::Arc;

use crate::config::ServerConfig;
use crate::notify::ApprovalEmails;

/// Services constructed once at startup and shared by every handler
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<ServerConfig>,
    pub forms: Arc<SubmissionService>,
    pub designs: Arc<DesignLibrary>,
    pub settings: Arc<SettingsStore>,
    pub email: EmailNotifier,
    pub teams: Arc<TeamRegistry>,
    pub kit_pricing: Arc<KitPricingRegistry>,
    pub orders: Arc<OrderBook>,
}

impl AppState {
    /// Wire state with the development mailer
    pub fn new(config: ServerConfig) -> Self {
        let mailer = Arc::new(LogMailer::new(&config.mail.from_name, &config.mail.from_email));
        Self::with_mailer(config, mailer)
    }

    pub fn with_mailer(config: ServerConfig, mailer: Arc<dyn Mailer>) -> Self {
        let settings = Arc::new(SettingsStore::open(config.settings_path()));
        let email = EmailNotifier::new(settings.clone(), mailer);

        let templates = Arc::new(TemplateStore::new());

        let notifier: Arc<dyn SubmissionNotifier> = if config.mail.enabled {
            Arc::new(ApprovalEmails::new(email.clone(), templates.clone(), config.base_url.clone()))
        } else {
            tracing::warn!("mail disabled; approval emails will not be sent");
            Arc::new(DisabledNotifier)
        };
        let forms = SubmissionService::new(templates, Arc::new(SubmissionStore::new()), notifier);

        Self {
            designs: Arc::new(DesignLibrary::open(config.designs_path())),
            forms: Arc::new(forms),
            settings,
            email,
            teams: Arc::new(TeamRegistry::new()),
            kit_pricing: Arc::new(KitPricingRegistry::new()),
            orders: Arc::new(OrderBook::new()),
            config: Arc::new(config),
        }
    }
}
