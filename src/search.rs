//! # Product Suggestions
//!
//! Debounced, best-effort product lookup while the operator types.
//!
//! ## Latest Wins
//!
//! Every keystroke takes a new [`RequestId`] right away. A request is only
//! sent once the debounce delay has passed with no newer keystroke, and a
//! response is only applied while its id is still the latest one. Stale
//! responses are dropped, never merged:
//!
//! ```text
//! keystroke  "p"    "pe"   "pen"
//! id          1      2      3
//! debounce    ✗      ✗      ✓ ── GET ?q=pen ──► applied
//!
//! keystroke  "pen"           "pencil"
//! id          3               4
//! request     ── GET (slow) ─────────────────► discarded (3 ≠ 4)
//!                             ── GET ──► applied
//! ```
//!
//! Nothing is cancelled: superseded work runs to completion and is ignored.
//! Failures are logged and clear the list; search never blocks printing.

use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::error::EtiquetaError;
use crate::product::SelectedProduct;

/// Default delay between the last keystroke and the request.
pub const DEFAULT_DEBOUNCE: Duration = Duration::from_millis(300);

/// Most suggestions kept from one response.
pub const MAX_SUGGESTIONS: usize = 10;

/// Monotonically increasing suggestion request id.
pub type RequestId = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SuggestionState {
    Idle,
    Pending(RequestId),
    Resolved(RequestId),
}

/// What happened to a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Applied,
    /// A newer request superseded it
    Discarded,
}

// ============================================================================
// TRACKER
// ============================================================================

/// Tracks which suggestion request is current.
#[derive(Debug, Clone)]
pub struct SuggestionTracker {
    latest: RequestId,
    state: SuggestionState,
    suggestions: Vec<SelectedProduct>,
}

impl Default for SuggestionTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl SuggestionTracker {
    pub fn new() -> Self {
        Self {
            latest: 0,
            state: SuggestionState::Idle,
            suggestions: Vec::new(),
        }
    }

    /// Start a new request, superseding any earlier one.
    pub fn begin(&mut self) -> RequestId {
        self.latest += 1;
        self.state = SuggestionState::Pending(self.latest);
        self.latest
    }

    pub fn is_latest(&self, id: RequestId) -> bool {
        id == self.latest
    }

    pub fn state(&self) -> SuggestionState {
        self.state
    }

    pub fn suggestions(&self) -> &[SelectedProduct] {
        &self.suggestions
    }

    /// Apply `products` if `id` is still the latest request.
    pub fn resolve(&mut self, id: RequestId, mut products: Vec<SelectedProduct>) -> Outcome {
        if !self.is_latest(id) {
            tracing::debug!(id, latest = self.latest, "discarding stale suggestions");
            return Outcome::Discarded;
        }
        products.truncate(MAX_SUGGESTIONS);
        self.suggestions = products;
        self.state = SuggestionState::Resolved(id);
        Outcome::Applied
    }

    /// Record a failed request. Clears the list when `id` is the latest.
    pub fn fail(&mut self, id: RequestId, error: &EtiquetaError) -> Outcome {
        if !self.is_latest(id) {
            return Outcome::Discarded;
        }
        tracing::warn!(id, error = %error, "product suggestions failed");
        self.suggestions.clear();
        self.state = SuggestionState::Idle;
        Outcome::Applied
    }

    /// Drop all suggestions and supersede anything in flight.
    pub fn clear(&mut self) -> RequestId {
        self.latest += 1;
        self.suggestions.clear();
        self.state = SuggestionState::Idle;
        self.latest
    }
}

// ============================================================================
// SOURCES
// ============================================================================

/// Where suggestions come from.
#[async_trait]
pub trait ProductSource: Send + Sync {
    async fn search(&self, query: &str) -> Result<Vec<SelectedProduct>, EtiquetaError>;
}

#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogResponse {
    List(Vec<SelectedProduct>),
    Wrapped { products: Vec<SelectedProduct> },
}

impl CatalogResponse {
    fn into_products(self) -> Vec<SelectedProduct> {
        match self {
            Self::List(products) | Self::Wrapped { products } => products,
        }
    }
}

/// The store's REST product API.
#[derive(Debug, Clone)]
pub struct RestCatalog {
    client: reqwest::Client,
    base_url: String,
    token: Option<String>,
}

impl RestCatalog {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, EtiquetaError> {
        let client = reqwest::Client::builder()
            .user_agent("etiqueta/0.1")
            .timeout(Duration::from_secs(10))
            .build()
            .map_err(|e| EtiquetaError::Network(format!("HTTP client error: {}", e)))?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            token,
        })
    }
}

#[async_trait]
impl ProductSource for RestCatalog {
    async fn search(&self, query: &str) -> Result<Vec<SelectedProduct>, EtiquetaError> {
        let mut request = self
            .client
            .get(format!("{}/products/search", self.base_url))
            .query(&[("q", query)]);
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| EtiquetaError::Network(format!("product search failed: {}", e)))?;
        let body: CatalogResponse = response
            .json()
            .await
            .map_err(|e| EtiquetaError::Network(format!("invalid product search response: {}", e)))?;
        Ok(body.into_products())
    }
}

// ============================================================================
// SERVICE
// ============================================================================

/// Debounced suggestion lookups over a [`ProductSource`].
#[derive(Clone)]
pub struct SuggestionService {
    source: Arc<dyn ProductSource>,
    tracker: Arc<Mutex<SuggestionTracker>>,
    debounce: Duration,
}

impl SuggestionService {
    pub fn new(source: Arc<dyn ProductSource>) -> Self {
        Self {
            source,
            tracker: Arc::new(Mutex::new(SuggestionTracker::new())),
            debounce: DEFAULT_DEBOUNCE,
        }
    }

    pub fn with_debounce(mut self, debounce: Duration) -> Self {
        self.debounce = debounce;
        self
    }

    /// Current suggestion list.
    pub async fn suggestions(&self) -> Vec<SelectedProduct> {
        self.tracker.lock().await.suggestions().to_vec()
    }

    pub async fn state(&self) -> SuggestionState {
        self.tracker.lock().await.state()
    }

    /// Register a keystroke and look it up in the background.
    pub async fn input(&self, query: &str) -> RequestId {
        let query = query.trim().to_string();
        let mut tracker = self.tracker.lock().await;
        if query.is_empty() {
            return tracker.clear();
        }
        let id = tracker.begin();
        drop(tracker);

        let service = self.clone();
        tokio::spawn(async move {
            service.run(id, query).await;
        });
        id
    }

    /// Register a keystroke and wait for its own result.
    ///
    /// Returns `None` when a newer keystroke superseded this one.
    pub async fn suggest(&self, query: &str) -> Option<Vec<SelectedProduct>> {
        let query = query.trim();
        let id = {
            let mut tracker = self.tracker.lock().await;
            if query.is_empty() {
                tracker.clear();
                return Some(Vec::new());
            }
            tracker.begin()
        };
        self.run(id, query.to_string()).await
    }

    async fn run(&self, id: RequestId, query: String) -> Option<Vec<SelectedProduct>> {
        tokio::time::sleep(self.debounce).await;
        if !self.tracker.lock().await.is_latest(id) {
            tracing::debug!(id, "keystroke superseded before request");
            return None;
        }

        let result = self.source.search(&query).await;
        let mut tracker = self.tracker.lock().await;
        let outcome = match result {
            Ok(products) => tracker.resolve(id, products),
            Err(e) => tracker.fail(id, &e),
        };
        match outcome {
            Outcome::Applied => Some(tracker.suggestions().to_vec()),
            Outcome::Discarded => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex as StdMutex;

    fn product(name: &str) -> SelectedProduct {
        SelectedProduct {
            name: name.to_string(),
            price: 10.0,
            discount_percent: 0.0,
            sku: name.to_uppercase(),
            barcode: None,
            variants: Vec::new(),
        }
    }

    /// Answers with one product named after the query; "slow" queries lag.
    #[derive(Default)]
    struct FakeSource {
        calls: StdMutex<Vec<String>>,
    }

    #[async_trait]
    impl ProductSource for FakeSource {
        async fn search(&self, query: &str) -> Result<Vec<SelectedProduct>, EtiquetaError> {
            self.calls.lock().unwrap().push(query.to_string());
            if query.starts_with("slow") {
                tokio::time::sleep(Duration::from_millis(150)).await;
            }
            if query == "boom" {
                return Err(EtiquetaError::Network("offline".to_string()));
            }
            Ok(vec![product(query)])
        }
    }

    fn service() -> (SuggestionService, Arc<FakeSource>) {
        let source = Arc::new(FakeSource::default());
        let service = SuggestionService::new(source.clone()).with_debounce(Duration::from_millis(20));
        (service, source)
    }

    #[test]
    fn test_stale_resolution_discarded() {
        let mut tracker = SuggestionTracker::new();
        let first = tracker.begin();
        let second = tracker.begin();

        assert_eq!(tracker.resolve(first, vec![product("old")]), Outcome::Discarded);
        assert!(tracker.suggestions().is_empty());
        assert_eq!(tracker.state(), SuggestionState::Pending(second));

        assert_eq!(tracker.resolve(second, vec![product("new")]), Outcome::Applied);
        assert_eq!(tracker.suggestions()[0].name, "new");
        assert_eq!(tracker.state(), SuggestionState::Resolved(second));
    }

    #[test]
    fn test_failure_clears_list() {
        let mut tracker = SuggestionTracker::new();
        let id = tracker.begin();
        tracker.resolve(id, vec![product("pen")]);

        let next = tracker.begin();
        let err = EtiquetaError::Network("timeout".to_string());
        assert_eq!(tracker.fail(id, &err), Outcome::Discarded);
        assert_eq!(tracker.suggestions().len(), 1);

        assert_eq!(tracker.fail(next, &err), Outcome::Applied);
        assert!(tracker.suggestions().is_empty());
        assert_eq!(tracker.state(), SuggestionState::Idle);
    }

    #[test]
    fn test_resolution_is_capped() {
        let mut tracker = SuggestionTracker::new();
        let id = tracker.begin();
        let many = (0..25).map(|i| product(&format!("p{}", i))).collect();
        tracker.resolve(id, many);
        assert_eq!(tracker.suggestions().len(), MAX_SUGGESTIONS);
    }

    #[tokio::test]
    async fn test_debounce_sends_only_last_keystroke() {
        let (service, source) = service();
        for query in ["p", "pe", "pen"] {
            service.input(query).await;
        }
        tokio::time::sleep(Duration::from_millis(120)).await;

        assert_eq!(*source.calls.lock().unwrap(), vec!["pen"]);
        assert_eq!(service.suggestions().await[0].name, "pen");
    }

    #[tokio::test]
    async fn test_slow_stale_response_not_applied() {
        let (service, source) = service();
        service.input("slow pen").await;
        // Let the first request go out, then type again
        tokio::time::sleep(Duration::from_millis(60)).await;
        let id = service.input("pencil").await;
        tokio::time::sleep(Duration::from_millis(300)).await;

        assert_eq!(source.calls.lock().unwrap().len(), 2);
        let suggestions = service.suggestions().await;
        assert_eq!(suggestions.len(), 1);
        assert_eq!(suggestions[0].name, "pencil");
        assert_eq!(service.state().await, SuggestionState::Resolved(id));
    }

    #[tokio::test]
    async fn test_empty_query_clears_without_request() {
        let (service, source) = service();
        assert_eq!(service.suggest("pen").await.unwrap().len(), 1);
        assert_eq!(service.suggest("   ").await, Some(Vec::new()));
        assert!(service.suggestions().await.is_empty());
        assert_eq!(source.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_network_failure_is_best_effort() {
        let (service, _) = service();
        service.suggest("pen").await;
        assert_eq!(service.suggest("boom").await, Some(Vec::new()));
        assert_eq!(service.state().await, SuggestionState::Idle);
    }

    #[tokio::test]
    async fn test_superseded_suggest_returns_none() {
        let (service, _) = service();
        let waiting = service.clone();
        let first = tokio::spawn(async move { waiting.suggest("pe").await });
        tokio::time::sleep(Duration::from_millis(5)).await;
        let second = service.suggest("pen").await;

        assert_eq!(first.await.unwrap(), None);
        assert_eq!(second.unwrap()[0].name, "pen");
    }

    #[test]
    fn test_catalog_response_shapes() {
        let bare: CatalogResponse =
            serde_json::from_str(r#"[{"name":"Pen","price":10,"sku":"P1"}]"#).unwrap();
        let wrapped: CatalogResponse =
            serde_json::from_str(r#"{"products":[{"name":"Pen","price":10,"sku":"P1"}]}"#).unwrap();
        assert_eq!(bare.into_products(), wrapped.into_products());
    }

    #[tokio::test]
    async fn test_rest_catalog_request() {
        use axum::{Json, Router, extract::Query, http::HeaderMap, routing::get};
        use std::collections::HashMap;

        async fn search(
            headers: HeaderMap,
            Query(params): Query<HashMap<String, String>>,
        ) -> Json<serde_json::Value> {
            let auth = headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string();
            Json(serde_json::json!({
                "products": [{ "name": params["q"], "price": 5, "sku": auth }]
            }))
        }

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let app = Router::new().route("/api/products/search", get(search));
        tokio::spawn(async move { axum::serve(listener, app).await.unwrap() });

        let catalog = RestCatalog::new(&format!("http://{}/api/", addr), Some("secret".to_string())).unwrap();
        let products = catalog.search("gel pen").await.unwrap();
        assert_eq!(products[0].name, "gel pen");
        assert_eq!(products[0].sku, "Bearer secret");
    }
}
