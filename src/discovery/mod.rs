//! # Link Discovery
//!
//! The backend publishes its entry points as link relations on `GET /api`.
//! [`HateoasClient`] fetches that root once, caches `relation → href`, and
//! lets callers navigate by relation name instead of hard-coded paths.
//!
//! Root discovery is single-flight: while one discovery request is running,
//! every other caller waits for its outcome instead of issuing its own. The
//! first caller publishes the outcome on a `tokio::sync::watch` channel that
//! the others subscribe to.
//!
//! The cache only grows until [`HateoasClient::clear_cache`] is called (on
//! logout), so a new session re-discovers with its own role-based links.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use tokio::sync::watch;
use tracing::{debug, info, warn};

use crate::error::ApiError;
use crate::models::{ApiRoot, Collection, HealthResponse, Linked};
use crate::transport::{ApiResponse, ApiResult, HttpTransport, RequestOptions};

/// Discovery entry point.
pub const ROOT_PATH: &str = "/api";
const HEALTH_PATH: &str = "/actuator/health";

type DiscoveryOutcome = ApiResult<ApiRoot>;

#[derive(Default)]
struct DiscoveryState {
    root: Option<ApiRoot>,
    links: HashMap<String, String>,
    /// Ticket and receiver of the discovery currently running, if any.
    in_flight: Option<(u64, watch::Receiver<Option<DiscoveryOutcome>>)>,
    next_ticket: u64,
}

impl DiscoveryState {
    fn owns_flight(&self, ticket: u64) -> bool {
        matches!(&self.in_flight, Some((current, _)) if *current == ticket)
    }
}

enum Turn {
    Lead(u64, watch::Sender<Option<DiscoveryOutcome>>),
    Follow(u64, watch::Receiver<Option<DiscoveryOutcome>>),
}

/// API client that navigates the backend through discovered links.
///
/// Cheap to clone; clones share the link cache.
#[derive(Clone)]
pub struct HateoasClient {
    transport: HttpTransport,
    state: Arc<Mutex<DiscoveryState>>,
}

impl std::fmt::Debug for HateoasClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.state.lock();
        f.debug_struct("HateoasClient")
            .field("transport", &self.transport)
            .field("discovered", &state.root.is_some())
            .field("cached_links", &state.links.len())
            .finish()
    }
}

impl HateoasClient {
    pub fn new(transport: HttpTransport) -> Self {
        Self {
            transport,
            state: Arc::new(Mutex::new(DiscoveryState::default())),
        }
    }

    pub fn transport(&self) -> &HttpTransport {
        &self.transport
    }

    /// Fetch the API root and cache its link relations.
    ///
    /// Returns the cached root when discovery already succeeded. A failed
    /// discovery is not cached; the next call tries again.
    pub async fn discover_api(&self) -> DiscoveryOutcome {
        loop {
            let turn = {
                let mut state = self.state.lock();
                if let Some(root) = &state.root {
                    return Ok(ApiResponse {
                        data: root.clone(),
                        links: root.links.clone(),
                    });
                }
                match &state.in_flight {
                    Some((ticket, rx)) => Turn::Follow(*ticket, rx.clone()),
                    None => {
                        state.next_ticket += 1;
                        let ticket = state.next_ticket;
                        let (tx, rx) = watch::channel(None);
                        state.in_flight = Some((ticket, rx));
                        Turn::Lead(ticket, tx)
                    }
                }
            };

            match turn {
                Turn::Lead(ticket, tx) => return self.run_discovery(ticket, tx).await,
                Turn::Follow(ticket, mut rx) => {
                    let shared = rx
                        .wait_for(Option::is_some)
                        .await
                        .map(|outcome| outcome.clone());
                    if let Ok(Some(outcome)) = shared {
                        return outcome;
                    }
                    // The leading call was dropped before publishing; retry.
                    let mut state = self.state.lock();
                    if state.owns_flight(ticket) {
                        state.in_flight = None;
                    }
                }
            }
        }
    }

    async fn run_discovery(
        &self,
        ticket: u64,
        tx: watch::Sender<Option<DiscoveryOutcome>>,
    ) -> DiscoveryOutcome {
        debug!("Discovering API root at {}", ROOT_PATH);
        let outcome = self
            .transport
            .get::<ApiRoot>(ROOT_PATH, RequestOptions::default())
            .await;

        {
            let mut state = self.state.lock();
            // A clear_cache() while in flight disowns this discovery.
            if state.owns_flight(ticket) {
                state.in_flight = None;
                match &outcome {
                    Ok(response) => {
                        for (rel, relation) in &response.links {
                            match relation.href() {
                                Some(href) => {
                                    state.links.insert(rel.clone(), href);
                                }
                                None => warn!("Skipping link '{}' with invalid href", rel),
                            }
                        }
                        state.root = Some(response.data.clone());
                        info!("API root discovered with {} link relations", state.links.len());
                    }
                    Err(e) => warn!("API discovery failed: {}", e),
                }
            }
        }

        tx.send_replace(Some(outcome.clone()));
        outcome
    }

    /// Cached href for `rel`, without triggering discovery.
    pub fn get_link(&self, rel: &str) -> Option<String> {
        self.state.lock().links.get(rel).cloned()
    }

    pub fn has_link(&self, rel: &str) -> bool {
        self.state.lock().links.contains_key(rel)
    }

    /// GET the resource behind root relation `rel`.
    ///
    /// Discovers the API first when `rel` is not cached yet.
    pub async fn follow_link<T: DeserializeOwned>(
        &self,
        rel: &str,
        options: RequestOptions,
    ) -> ApiResult<T> {
        if !self.has_link(rel)
            && let Err(e) = self.discover_api().await
        {
            debug!("Discovery failed while resolving '{}': {}", rel, e);
        }

        let Some(href) = self.get_link(rel) else {
            return Err(ApiError::LinkUnavailable {
                rel: rel.to_string(),
            });
        };
        self.transport.get(&href, options).await
    }

    /// GET the resource behind relation `rel` of `resource`.
    ///
    /// Only the resource's own links are consulted, never the root cache.
    pub async fn follow_resource_link<T, R>(
        &self,
        resource: &R,
        rel: &str,
        options: RequestOptions,
    ) -> ApiResult<T>
    where
        T: DeserializeOwned,
        R: Linked + ?Sized,
    {
        let Some(href) = resource.link_href(rel) else {
            return Err(ApiError::ResourceLinkMissing {
                rel: rel.to_string(),
            });
        };
        self.transport.get(&href, options).await
    }

    /// Forget the root, every cached relation and any discovery in flight.
    pub fn clear_cache(&self) {
        let mut state = self.state.lock();
        state.root = None;
        state.links.clear();
        state.in_flight = None;
        debug!("Link cache cleared");
    }

    /// Items of a HAL collection; see [`extract_collection`].
    pub fn extract_collection<T: Clone>(&self, collection: &Collection<T>) -> Vec<T> {
        extract_collection(collection)
    }

    /// The cached API root, if discovered.
    pub fn api_info(&self) -> Option<ApiRoot> {
        self.state.lock().root.clone()
    }

    pub fn is_profile_complete(&self) -> bool {
        self.state
            .lock()
            .root
            .as_ref()
            .and_then(|root| root.profile_complete)
            .unwrap_or(false)
    }

    pub fn user_roles(&self) -> Vec<String> {
        self.state
            .lock()
            .root
            .as_ref()
            .and_then(|root| root.roles.clone())
            .unwrap_or_default()
    }

    pub fn has_role(&self, role: &str) -> bool {
        self.user_roles().iter().any(|r| r == role)
    }

    /// Whether the backend reports itself `UP`. Any failure counts as down.
    pub async fn check_health(&self) -> bool {
        match self
            .transport
            .get::<HealthResponse>(HEALTH_PATH, RequestOptions::public())
            .await
        {
            Ok(response) => response.data.status == "UP",
            Err(e) => {
                debug!("Health check failed: {}", e);
                false
            }
        }
    }
}

/// Items of the first embedded list of a collection, or none.
///
/// The embedded key name varies per resource type (`eventoCalendarioModelList`,
/// `users`, ...), so whichever key is present is used.
pub fn extract_collection<T: Clone>(collection: &Collection<T>) -> Vec<T> {
    collection.embedded_items().to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extract_collection_takes_whatever_key_is_embedded() {
        let collection: Collection<u32> =
            serde_json::from_value(json!({"_embedded": {"anyName": [4, 5, 6]}})).unwrap();
        assert_eq!(extract_collection(&collection), vec![4, 5, 6]);
    }

    #[test]
    fn extract_collection_of_missing_embedded_is_empty() {
        let collection: Collection<u32> = serde_json::from_value(json!({})).unwrap();
        assert!(extract_collection(&collection).is_empty());
    }

    #[test]
    fn fresh_client_has_no_links() {
        let transport =
            HttpTransport::new(&url::Url::parse("http://localhost:8080").unwrap()).unwrap();
        let client = HateoasClient::new(transport);
        assert_eq!(client.get_link("eventos"), None);
        assert!(!client.is_profile_complete());
        assert!(client.user_roles().is_empty());
        assert!(client.api_info().is_none());
    }
}
