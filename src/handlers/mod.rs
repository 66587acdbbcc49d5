pub mod links;
pub mod redirect;
pub mod todos;

#[cfg(test)]
pub(crate) mod testing {
    use crate::{
        allocator::Allocator,
        cache::LinkCache,
        config::AppConfig,
        db,
        models::ShortLink,
        shortid::RandomGenerator,
        store::{self, InMemoryLinkStore, LinkStore},
        AppState,
    };
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Request, StatusCode},
        Router,
    };
    use std::sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    };
    use tower::ServiceExt;

    pub fn config() -> AppConfig {
        AppConfig {
            database_url: "memory".into(),
            host: "127.0.0.1".into(),
            port: 8000,
            base_url: "http://localhost:8000".into(),
            short_id_length: 6,
            max_attempts: 10,
            rng_seed: None,
        }
    }

    pub async fn app() -> (Router, Arc<AppState>) {
        app_with(Arc::new(InMemoryLinkStore::new()), LinkCache::new()).await
    }

    pub async fn app_with(links: Arc<dyn LinkStore>, cache: LinkCache) -> (Router, Arc<AppState>) {
        let db = db::connect_in_memory().await.unwrap();
        let allocator = Allocator::new(links.clone(), Arc::new(RandomGenerator::default()));
        let state = Arc::new(AppState {
            db,
            config: config(),
            links,
            allocator,
            cache,
        });
        (crate::router(state.clone()), state)
    }

    /// In-memory store that, once armed, hands out a row from `find_by_id`
    /// only after a full delete of it (row and cache entry) has run.
    pub struct DeleteDuringLookup {
        inner: InMemoryLinkStore,
        cache: LinkCache,
        armed: AtomicBool,
    }

    impl DeleteDuringLookup {
        pub fn new(cache: LinkCache) -> Arc<Self> {
            Arc::new(Self {
                inner: InMemoryLinkStore::new(),
                cache,
                armed: AtomicBool::new(false),
            })
        }

        pub fn arm(&self) {
            self.armed.store(true, Ordering::SeqCst);
        }
    }

    #[async_trait]
    impl LinkStore for DeleteDuringLookup {
        async fn find_by_target(&self, url: &str) -> store::Result<Option<ShortLink>> {
            self.inner.find_by_target(url).await
        }

        async fn find_by_id(&self, short_id: &str) -> store::Result<Option<ShortLink>> {
            let found = self.inner.find_by_id(short_id).await?;
            if found.is_some() && self.armed.swap(false, Ordering::SeqCst) {
                self.inner.delete_by_id(short_id).await?;
                self.cache.remove(short_id);
            }
            Ok(found)
        }

        async fn insert(&self, short_id: &str, url: &str) -> store::Result<ShortLink> {
            self.inner.insert(short_id, url).await
        }

        async fn delete_by_id(&self, short_id: &str) -> store::Result<bool> {
            self.inner.delete_by_id(short_id).await
        }

        async fn list_all(&self) -> store::Result<Vec<ShortLink>> {
            self.inner.list_all().await
        }
    }

    /// Send one request and return status, headers and the body as JSON
    /// (`Null` for an empty body).
    pub async fn send(
        app: &Router,
        method: &str,
        uri: &str,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, axum::http::HeaderMap, serde_json::Value) {
        let mut request = Request::builder().method(method).uri(uri);
        let body = match body {
            Some(json) => {
                request = request.header("content-type", "application/json");
                Body::from(json.to_string())
            }
            None => Body::empty(),
        };

        let response = app
            .clone()
            .oneshot(request.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or(serde_json::Value::Null)
        };
        (status, headers, json)
    }
}
