//! Push-notification device registration.

use serde::de::IgnoredAny;
use tracing::info;

use crate::discovery::HateoasClient;
use crate::models::users::DeviceTokenRequest;
use crate::transport::{ApiResult, RequestOptions};

const REGISTER_DEVICE_PATH: &str = "/api/notificaciones/registrar-dispositivo";
const DEVICE_TOKENS_PATH: &str = "/api/device-tokens";

/// Platform a device token belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Ios,
    Android,
    Windows,
    MacOs,
    Linux,
    Web,
}

impl Platform {
    /// Guess the platform from a user-agent string.
    pub fn detect(user_agent: &str) -> Self {
        let ua = user_agent.to_lowercase();
        if ["iphone", "ipad", "ipod"].iter().any(|d| ua.contains(d)) {
            Self::Ios
        } else if ua.contains("android") {
            Self::Android
        } else if ua.contains("windows") {
            Self::Windows
        } else if ua.contains("mac") {
            Self::MacOs
        } else if ua.contains("linux") {
            Self::Linux
        } else {
            Self::Web
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Ios => "ios",
            Self::Android => "android",
            Self::Windows => "windows",
            Self::MacOs => "macos",
            Self::Linux => "linux",
            Self::Web => "web",
        }
    }
}

#[derive(Debug, Clone)]
pub struct NotificationsService {
    api: HateoasClient,
}

impl NotificationsService {
    pub fn new(api: HateoasClient) -> Self {
        Self { api }
    }

    pub async fn register_device_token(
        &self,
        token: &str,
        platform: Option<Platform>,
    ) -> ApiResult<()> {
        let request = DeviceTokenRequest {
            token: token.to_string(),
            platform: platform.map(|p| p.as_str().to_string()),
        };
        let response = self
            .api
            .transport()
            .post::<IgnoredAny, _>(REGISTER_DEVICE_PATH, &request, RequestOptions::default())
            .await?;
        info!(
            "Registered device token for platform {}",
            request.platform.as_deref().unwrap_or("unknown")
        );
        Ok(response.discard())
    }

    /// Drop a device token, e.g. on logout.
    pub async fn unregister_device_token(&self, token: &str) -> ApiResult<()> {
        let url = format!("{DEVICE_TOKENS_PATH}?token={}", urlencoding::encode(token));
        let response = self
            .api
            .transport()
            .delete::<IgnoredAny>(&url, RequestOptions::default())
            .await?;
        Ok(response.discard())
    }

    /// Register a token with the platform detected from `user_agent`.
    pub async fn register_current_device(&self, token: &str, user_agent: &str) -> ApiResult<()> {
        self.register_device_token(token, Some(Platform::detect(user_agent)))
            .await
    }
}
