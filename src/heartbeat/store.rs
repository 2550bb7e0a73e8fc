//! # Tracking store abstraction and built-in stores.
//!
//! The heartbeat loop reports liveness through a [`TrackingStore`]. The store is
//! owned by the heartbeat process for its whole lifetime; every error it returns
//! is treated as transient.
//!
//! Built-in stores:
//! - [`ConsoleTrackingStore`] - logs each heartbeat (`--tracker console`)
//! - [`CompositeTrackingStore`] - fans out to several stores
//! - [`TrackingFn`] - closure-backed store, handy for tests and embedding
//! - `WebTrackingStore` - HTTP tracking service (`--tracker api --tracker-api web`, feature `web`)

use std::borrow::Cow;
use std::future::Future;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use crate::error::TrackingError;

/// Shared handle to a tracking store.
pub type TrackingStoreRef = Arc<dyn TrackingStore>;

/// # Receiver of liveness reports.
///
/// # Example
/// ```
/// use async_trait::async_trait;
/// use runvisor::{TrackingError, TrackingStore};
///
/// struct Noop;
///
/// #[async_trait]
/// impl TrackingStore for Noop {
///     fn name(&self) -> &str { "noop" }
///
///     async fn heartbeat(&self, _run_id: &str) -> Result<(), TrackingError> {
///         Ok(())
///     }
/// }
/// ```
#[async_trait]
pub trait TrackingStore: Send + Sync + 'static {
    /// Stable store name for logs.
    fn name(&self) -> &str;

    /// Records that the driver of `run_id` is still alive.
    async fn heartbeat(&self, run_id: &str) -> Result<(), TrackingError>;
}

/// Store that only writes a log line per heartbeat.
#[derive(Debug, Default, Clone, Copy)]
pub struct ConsoleTrackingStore;

#[async_trait]
impl TrackingStore for ConsoleTrackingStore {
    fn name(&self) -> &str {
        "console"
    }

    async fn heartbeat(&self, run_id: &str) -> Result<(), TrackingError> {
        info!(run_id, "heartbeat");
        Ok(())
    }
}

/// Store that forwards every heartbeat to all inner stores.
///
/// All stores are called even if an earlier one fails; the combined error
/// names every failing store.
pub struct CompositeTrackingStore {
    stores: Vec<TrackingStoreRef>,
}

impl CompositeTrackingStore {
    /// Creates a composite over `stores`.
    pub fn new(stores: Vec<TrackingStoreRef>) -> Self {
        Self { stores }
    }

    /// Number of inner stores.
    pub fn len(&self) -> usize {
        self.stores.len()
    }

    /// `true` if there are no inner stores.
    pub fn is_empty(&self) -> bool {
        self.stores.is_empty()
    }
}

#[async_trait]
impl TrackingStore for CompositeTrackingStore {
    fn name(&self) -> &str {
        "composite"
    }

    async fn heartbeat(&self, run_id: &str) -> Result<(), TrackingError> {
        let mut failures = Vec::new();
        for store in &self.stores {
            if let Err(e) = store.heartbeat(run_id).await {
                failures.push(format!("{}: {e}", store.name()));
            }
        }
        if failures.is_empty() {
            Ok(())
        } else {
            Err(TrackingError::other(failures.join("; ")))
        }
    }
}

/// Function-backed tracking store.
///
/// Wraps a closure that *creates* a new future per heartbeat.
///
/// ## Example
/// ```rust
/// use runvisor::{TrackingFn, TrackingError, TrackingStore, TrackingStoreRef};
///
/// let store: TrackingStoreRef = TrackingFn::arc("memory", |run_id: String| async move {
///     assert!(!run_id.is_empty());
///     Ok::<_, TrackingError>(())
/// });
/// assert_eq!(store.name(), "memory");
/// ```
#[derive(Debug)]
pub struct TrackingFn<F> {
    name: Cow<'static, str>,
    f: F,
}

impl<F> TrackingFn<F> {
    /// Creates a new function-backed store.
    pub fn new(name: impl Into<Cow<'static, str>>, f: F) -> Self {
        Self {
            name: name.into(),
            f,
        }
    }

    /// Creates the store and returns it as a shared handle.
    pub fn arc(name: impl Into<Cow<'static, str>>, f: F) -> Arc<Self> {
        Arc::new(Self::new(name, f))
    }
}

#[async_trait]
impl<F, Fut> TrackingStore for TrackingFn<F>
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<(), TrackingError>> + Send + 'static,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn heartbeat(&self, run_id: &str) -> Result<(), TrackingError> {
        (self.f)(run_id.to_owned()).await
    }
}

/// Builds the store selected by the heartbeat command line.
///
/// ### Tracker names
/// - `console` → [`ConsoleTrackingStore`]
/// - `api` → store for `tracker_api` (`web` → `WebTrackingStore`)
///
/// Empty names are skipped; no names at all selects `console`. More than one
/// store is wrapped in a [`CompositeTrackingStore`].
pub fn build_tracking_store(
    trackers: &[String],
    tracker_api: &str,
    tracker_url: &str,
    api_token: Option<&str>,
) -> Result<TrackingStoreRef, TrackingError> {
    let mut stores: Vec<TrackingStoreRef> = Vec::new();
    for name in trackers.iter().map(|t| t.trim()).filter(|t| !t.is_empty()) {
        match name {
            "console" => stores.push(Arc::new(ConsoleTrackingStore)),
            "api" => stores.push(build_api_store(tracker_api, tracker_url, api_token)?),
            other => {
                return Err(TrackingError::Unsupported {
                    name: other.to_string(),
                });
            }
        }
    }

    match stores.len() {
        0 => Ok(Arc::new(ConsoleTrackingStore)),
        1 => Ok(stores.remove(0)),
        _ => Ok(Arc::new(CompositeTrackingStore::new(stores))),
    }
}

#[cfg(feature = "web")]
fn build_api_store(
    tracker_api: &str,
    tracker_url: &str,
    api_token: Option<&str>,
) -> Result<TrackingStoreRef, TrackingError> {
    match tracker_api {
        "web" => {
            let mut store = crate::heartbeat::WebTrackingStore::new(tracker_url)?;
            if let Some(token) = api_token {
                store = store.with_token(token);
            }
            Ok(Arc::new(store))
        }
        other => Err(TrackingError::Unsupported {
            name: format!("api/{other}"),
        }),
    }
}

#[cfg(not(feature = "web"))]
fn build_api_store(
    tracker_api: &str,
    _tracker_url: &str,
    _api_token: Option<&str>,
) -> Result<TrackingStoreRef, TrackingError> {
    Err(TrackingError::Unsupported {
        name: format!("api/{tracker_api}"),
    })
}
