//! # HTTP Transport
//!
//! Thin wrapper over `reqwest` that every other layer goes through. It:
//!
//! - resolves relative paths against the configured base URL;
//! - attaches `Authorization: Bearer <token>` when a [`TokenProvider`] is
//!   configured and the request requires auth;
//! - maps non-2xx statuses to typed [`ApiError`]s;
//! - decodes the JSON body and, separately, its `_links` map.
//!
//! Nothing here panics or returns early with anything but an `Err`: network
//! failures, bad statuses and decode failures all surface as [`ApiError`].

use std::future::Future;
use std::sync::Arc;

use reqwest::header::{ACCEPT, CONTENT_TYPE};
use reqwest::{Client, Method};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use crate::error::ApiError;
use crate::models::{LinkMap, Linked};
use crate::traits::TokenProvider;

const USER_AGENT: &str = concat!("cas-client/", env!("CARGO_PKG_VERSION"));

/// Per-request options.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestOptions {
    /// Attach the bearer token when one is available. Defaults to `true`.
    pub require_auth: bool,
}

impl Default for RequestOptions {
    fn default() -> Self {
        Self { require_auth: true }
    }
}

impl RequestOptions {
    /// Options for endpoints that must be called without credentials.
    pub fn public() -> Self {
        Self {
            require_auth: false,
        }
    }
}

/// A decoded response body together with the `_links` it carried.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse<T> {
    pub data: T,
    pub links: LinkMap,
}

impl<T> ApiResponse<T> {
    pub fn into_data(self) -> T {
        self.data
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            data: f(self.data),
            links: self.links,
        }
    }

    /// Drop the body, keeping the links.
    pub fn discard(self) -> ApiResponse<()> {
        self.map(|_| ())
    }
}

impl<T> Linked for ApiResponse<T> {
    fn links(&self) -> &LinkMap {
        &self.links
    }
}

pub type ApiResult<T> = Result<ApiResponse<T>, ApiError>;

/// Await an API call and keep only its data.
///
/// For call sites that signal failure through `Err` alone and have no use
/// for the link map, such as the query layer.
pub async fn fetch_or_throw<T, F>(call: F) -> Result<T, ApiError>
where
    F: Future<Output = ApiResult<T>>,
{
    call.await.map(ApiResponse::into_data)
}

/// HTTP client bound to one backend.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    token_provider: Option<Arc<dyn TokenProvider>>,
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token_provider.is_some())
            .finish()
    }
}

impl HttpTransport {
    pub fn new(base_url: &Url) -> Result<Self, ApiError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| ApiError::Network {
                url: "client_init".to_string(),
                message: e.to_string(),
            })?;

        Ok(Self {
            client,
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            token_provider: None,
        })
    }

    pub fn with_token_provider(mut self, provider: Arc<dyn TokenProvider>) -> Self {
        self.token_provider = Some(provider);
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URLs pass through; anything else is appended to the base URL.
    pub fn resolve_url(&self, url: &str) -> String {
        if url.starts_with("http://") || url.starts_with("https://") {
            return url.to_string();
        }
        if url.starts_with('/') {
            format!("{}{url}", self.base_url)
        } else {
            format!("{}/{url}", self.base_url)
        }
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> ApiResult<T> {
        self.request(Method::GET, url, None, options).await
    }

    pub async fn post<T, B>(&self, url: &str, body: &B, options: RequestOptions) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = encode_body(body)?;
        self.request(Method::POST, url, Some(body), options).await
    }

    pub async fn put<T, B>(&self, url: &str, body: &B, options: RequestOptions) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = encode_body(body)?;
        self.request(Method::PUT, url, Some(body), options).await
    }

    pub async fn patch<T, B>(&self, url: &str, body: &B, options: RequestOptions) -> ApiResult<T>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        let body = encode_body(body)?;
        self.request(Method::PATCH, url, Some(body), options).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        url: &str,
        options: RequestOptions,
    ) -> ApiResult<T> {
        self.request(Method::DELETE, url, None, options).await
    }

    /// Perform a request and decode its body as `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        url: &str,
        body: Option<Value>,
        options: RequestOptions,
    ) -> ApiResult<T> {
        let resolved = self.resolve_url(url);

        let mut builder = self
            .client
            .request(method.clone(), &resolved)
            .header(CONTENT_TYPE, "application/json")
            .header(ACCEPT, "application/json");

        if options.require_auth
            && let Some(provider) = &self.token_provider
        {
            match provider.token().await {
                Some(token) => builder = builder.bearer_auth(token),
                None => warn!(
                    "Request to {} requires auth but no token is available",
                    resolved
                ),
            }
        }

        if let Some(body) = &body {
            builder = builder.json(body);
        }

        debug!("[API] {} {}", method, resolved);

        let response = builder.send().await.map_err(|e| {
            warn!("{} {} failed: {}", method, resolved, e);
            ApiError::Network {
                url: resolved.clone(),
                message: e.to_string(),
            }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| ApiError::Network {
            url: resolved.clone(),
            message: e.to_string(),
        })?;

        if !status.is_success() {
            let payload = serde_json::from_str(&text)
                .unwrap_or_else(|_| Value::Object(serde_json::Map::new()));
            let err = ApiError::from_status(status.as_u16(), payload);
            warn!("{} {} returned {}: {}", method, resolved, status, err);
            return Err(err);
        }

        decode_body(&resolved, &text)
    }
}

fn encode_body<B: Serialize + ?Sized>(body: &B) -> Result<Value, ApiError> {
    serde_json::to_value(body).map_err(|e| ApiError::InvalidRequest {
        message: format!("request body is not serializable: {e}"),
    })
}

/// Decode a successful response body and its `_links`.
///
/// An empty body decodes as JSON `null`, so endpoints answering 204 work
/// with `()` or [`serde::de::IgnoredAny`].
pub(crate) fn decode_body<T: DeserializeOwned>(url: &str, text: &str) -> ApiResult<T> {
    let decode_err = |e: serde_json::Error| ApiError::Decode {
        url: url.to_string(),
        message: e.to_string(),
    };

    let value: Value = if text.trim().is_empty() {
        Value::Null
    } else {
        serde_json::from_str(text).map_err(decode_err)?
    };

    let links = match value.get("_links") {
        Some(raw) => serde_json::from_value::<LinkMap>(raw.clone()).map_err(decode_err)?,
        None => LinkMap::new(),
    };

    let data = serde_json::from_value(value).map_err(decode_err)?;
    Ok(ApiResponse { data, links })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::IgnoredAny;

    fn transport(base: &str) -> HttpTransport {
        HttpTransport::new(&Url::parse(base).unwrap()).unwrap()
    }

    #[test]
    fn resolves_relative_and_absolute_urls() {
        let t = transport("http://localhost:8080/");
        assert_eq!(t.base_url(), "http://localhost:8080");
        assert_eq!(t.resolve_url("/api"), "http://localhost:8080/api");
        assert_eq!(t.resolve_url("api/pagos"), "http://localhost:8080/api/pagos");
        assert_eq!(
            t.resolve_url("https://other.example.org/api/x"),
            "https://other.example.org/api/x"
        );
        assert_eq!(
            t.resolve_url("http://localhost:9090/api"),
            "http://localhost:9090/api"
        );
    }

    #[test]
    fn decode_extracts_links_next_to_data() {
        let body = r#"{"mensaje":"hola","_links":{"self":{"href":"/api"}}}"#;
        let resp: ApiResponse<serde_json::Value> = decode_body("/api", body).unwrap();
        assert_eq!(resp.data["mensaje"], "hola");
        assert_eq!(resp.link_href("self").as_deref(), Some("/api"));
    }

    #[test]
    fn decode_tolerates_empty_body_for_unit_responses() {
        let resp: ApiResponse<IgnoredAny> = decode_body("/api/x", "").unwrap();
        assert!(resp.links.is_empty());
        let resp: ApiResponse<()> = decode_body("/api/x", "  ").unwrap();
        assert!(resp.discard().links.is_empty());
    }

    #[test]
    fn decode_rejects_malformed_links() {
        let body = r#"{"_links":{"self":"not-a-link-object"}}"#;
        let err = decode_body::<serde_json::Value>("/api", body).unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }

    #[test]
    fn decode_rejects_invalid_json() {
        let err = decode_body::<serde_json::Value>("/api", "<html>").unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }
}
