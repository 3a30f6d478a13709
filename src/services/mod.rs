//! Domain services and the [`CasClient`] that groups them.
//!
//! Every service holds a clone of the same [`HateoasClient`], so they share
//! one transport and one link cache.

pub mod calendar;
pub mod notifications;
pub mod payments;
pub mod users;

use std::sync::Arc;

use crate::config::ClientConfig;
use crate::discovery::HateoasClient;
use crate::error::ApiError;
use crate::traits::{StaticTokenProvider, TokenProvider};
use crate::transport::HttpTransport;

pub use calendar::{CalendarService, EventFilter};
pub use notifications::{NotificationsService, Platform};
pub use payments::PaymentsService;
pub use users::UsersService;

/// Entry point to the CAS backend.
#[derive(Debug, Clone)]
pub struct CasClient {
    api: HateoasClient,
    calendar: CalendarService,
    payments: PaymentsService,
    users: UsersService,
    notifications: NotificationsService,
}

impl CasClient {
    /// Build a client from configuration, authenticating with
    /// `config.api_token` when one is set.
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let mut transport = HttpTransport::new(&config.api_url)?;
        if let Some(token) = &config.api_token {
            transport = transport.with_token_provider(Arc::new(StaticTokenProvider::new(token)));
        }
        Ok(Self::from_transport(transport))
    }

    /// Build a client whose tokens come from `provider`.
    pub fn with_token_provider(
        config: &ClientConfig,
        provider: Arc<dyn TokenProvider>,
    ) -> Result<Self, ApiError> {
        let transport = HttpTransport::new(&config.api_url)?.with_token_provider(provider);
        Ok(Self::from_transport(transport))
    }

    pub fn from_transport(transport: HttpTransport) -> Self {
        let api = HateoasClient::new(transport);
        Self {
            calendar: CalendarService::new(api.clone()),
            payments: PaymentsService::new(api.clone()),
            users: UsersService::new(api.clone()),
            notifications: NotificationsService::new(api.clone()),
            api,
        }
    }

    /// The discovery client shared by all services.
    pub fn api(&self) -> &HateoasClient {
        &self.api
    }

    pub fn calendar(&self) -> &CalendarService {
        &self.calendar
    }

    pub fn payments(&self) -> &PaymentsService {
        &self.payments
    }

    pub fn users(&self) -> &UsersService {
        &self.users
    }

    pub fn notifications(&self) -> &NotificationsService {
        &self.notifications
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use url::Url;

    #[test]
    fn services_share_one_link_cache() {
        let config = ClientConfig::new(Url::parse("http://localhost:8080").unwrap());
        let client = CasClient::new(&config).unwrap();
        assert_eq!(client.api().transport().base_url(), "http://localhost:8080");
        assert!(client.api().get_link("eventos").is_none());
    }
}
