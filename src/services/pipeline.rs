// Pipeline service: reads with remote-first fallback, dual-write updates.
// The webhook source is primary; the local store is the fallback for reads and
// the best-effort mirror for writes. Legs never block or roll back each other.

use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use serde::Serialize;

use crate::error::{ApiError, DealError};
use crate::remote::client::RemoteError;
use crate::remote::RemoteSource;
use crate::services::dashboard::compute_dashboard;
use crate::signals::{DashboardCache, DealEvent, EventBus, WriteLeg};
use crate::store::DealStore;
use crate::types::{DashboardData, DataSource, Deal, DealInput, DealPatch, Origin, Sourced};
use crate::validation::{validate_input, validate_patch};
use crate::vocabulary::Vocabulary;

/// Pause between a failed remote read and its retry.
const RETRY_DELAY: Duration = Duration::from_millis(250);

/// Default age limit for a cached webhook dashboard.
const DEFAULT_DASHBOARD_TTL: Duration = Duration::from_secs(15);

/// Outcome of one write leg.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LegOutcome {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deal: Option<Deal>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ApiError>,
}

impl LegOutcome {
    fn from_result(result: &Result<Option<Deal>, DealError>) -> Self {
        match result {
            Ok(deal) => Self {
                ok: true,
                deal: deal.clone(),
                error: None,
            },
            Err(e) => Self {
                ok: false,
                deal: None,
                error: Some(ApiError::from(e)),
            },
        }
    }
}

/// Independent results of an update's remote and local legs.
///
/// `local` is `None` when the record is remote-origin and no local write was
/// attempted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DualWriteReport {
    pub id: i64,
    pub origin: Origin,
    pub remote: LegOutcome,
    pub local: Option<LegOutcome>,
}

impl DualWriteReport {
    pub fn any_succeeded(&self) -> bool {
        self.remote.ok || self.local.as_ref().is_some_and(|l| l.ok)
    }
}

pub struct PipelineService {
    store: Arc<Mutex<DealStore>>,
    remote: Option<Arc<dyn RemoteSource>>,
    vocabulary: Arc<Vocabulary>,
    bus: Arc<EventBus>,
    cache: Arc<DashboardCache>,
    fetch_retries: u32,
    dashboard_ttl: Duration,
}

impl PipelineService {
    pub fn new(
        store: DealStore,
        remote: Option<Arc<dyn RemoteSource>>,
        vocabulary: Arc<Vocabulary>,
        fetch_retries: u32,
    ) -> Self {
        let bus = Arc::new(EventBus::new());
        let cache = Arc::new(DashboardCache::new());
        bus.subscribe(cache.clone());
        Self {
            store: Arc::new(Mutex::new(store)),
            remote,
            vocabulary,
            bus,
            cache,
            fetch_retries,
            dashboard_ttl: DEFAULT_DASHBOARD_TTL,
        }
    }

    /// Serve a fetched webhook dashboard for at most `ttl`. The webhook can
    /// change without any write passing through this service.
    pub fn with_dashboard_ttl(mut self, ttl: Duration) -> Self {
        self.dashboard_ttl = ttl;
        self
    }

    pub fn vocabulary(&self) -> &Vocabulary {
        &self.vocabulary
    }

    pub fn bus(&self) -> &EventBus {
        &self.bus
    }

    // -----------------------------------------------------------------------
    // Reads
    // -----------------------------------------------------------------------

    /// Deals from the webhook source, or the local store when it fails.
    pub async fn fetch_deals(&self) -> Sourced<Vec<Deal>> {
        if let Some(remote) = &self.remote {
            match self.with_retry("deal list", || remote.fetch_all()).await {
                Ok(deals) => {
                    return Sourced {
                        source: DataSource::Remote,
                        data: deals,
                    }
                }
                Err(e) => log::warn!("Remote deal list unavailable, using local store: {}", e),
            }
        }
        Sourced {
            source: DataSource::Local,
            data: self.local_deals(),
        }
    }

    /// Dashboard from the webhook source, or computed from the local store.
    /// A webhook answer is served from cache until a write invalidates it or
    /// it is older than the dashboard TTL.
    pub async fn dashboard(&self) -> Sourced<DashboardData> {
        if let Some(remote) = &self.remote {
            if let Some(data) = self
                .cache
                .get_fresh(DataSource::Remote, Some(self.dashboard_ttl))
            {
                return Sourced {
                    source: DataSource::Remote,
                    data,
                };
            }
            let generation = self.cache.generation();
            match self.with_retry("dashboard", || remote.fetch_dashboard()).await {
                Ok(data) => {
                    self.cache.put(DataSource::Remote, data.clone(), generation);
                    return Sourced {
                        source: DataSource::Remote,
                        data,
                    };
                }
                Err(e) => log::warn!("Remote dashboard unavailable, computing locally: {}", e),
            }
        }
        Sourced {
            source: DataSource::Local,
            data: self.local_dashboard(),
        }
    }

    /// Run a remote read, retrying retryable failures up to `fetch_retries`
    /// times. An empty payload falls back immediately.
    async fn with_retry<T, F, Fut>(&self, what: &str, mut call: F) -> Result<T, RemoteError>
    where
        F: FnMut() -> Fut,
        Fut: std::future::Future<Output = Result<T, RemoteError>>,
    {
        let mut attempt = 0;
        loop {
            match call().await {
                Ok(value) => return Ok(value),
                Err(e) if e.is_retryable() && attempt < self.fetch_retries => {
                    attempt += 1;
                    log::info!(
                        "Remote {} failed ({}), retry {}/{}",
                        what,
                        e,
                        attempt,
                        self.fetch_retries
                    );
                    tokio::time::sleep(RETRY_DELAY).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    pub fn local_deals(&self) -> Vec<Deal> {
        self.store.lock().list()
    }

    pub fn local_deal(&self, id: i64) -> Result<Deal, DealError> {
        self.store.lock().get(id).ok_or(DealError::NotFound(id))
    }

    pub fn local_dashboard(&self) -> DashboardData {
        if let Some(data) = self.cache.get_fresh(DataSource::Local, None) {
            return data;
        }
        let generation = self.cache.generation();
        let data = compute_dashboard(&self.local_deals(), &self.vocabulary);
        self.cache.put(DataSource::Local, data.clone(), generation);
        data
    }

    // -----------------------------------------------------------------------
    // Writes
    // -----------------------------------------------------------------------

    /// Create a deal in the local store. The webhook has no create endpoint.
    pub fn create_deal(&self, input: DealInput) -> Result<Deal, DealError> {
        let input = validate_input(input, &self.vocabulary)?;
        let deal = self.store.lock().create(input)?;
        log::info!("Created local deal {} ({})", deal.id, deal.client_name);
        self.bus.publish(DealEvent::RecordsChanged {
            id: Some(deal.id),
            leg: WriteLeg::Local,
        });
        Ok(deal)
    }

    /// Update only the local store, as the local REST API does.
    pub fn local_update(&self, id: i64, patch: DealPatch) -> Result<Deal, DealError> {
        let patch = validate_patch(patch, &self.vocabulary)?;
        let deal = self.write_local(id, &patch)?;
        self.bus.publish(DealEvent::RecordsChanged {
            id: Some(id),
            leg: WriteLeg::Local,
        });
        Ok(deal)
    }

    pub fn delete_deal(&self, id: i64) -> Result<(), DealError> {
        if !self.store.lock().delete(id) {
            return Err(DealError::NotFound(id));
        }
        log::info!("Deleted local deal {}", id);
        self.bus.publish(DealEvent::RecordsChanged {
            id: Some(id),
            leg: WriteLeg::Local,
        });
        Ok(())
    }

    fn write_local(&self, id: i64, patch: &DealPatch) -> Result<Deal, DealError> {
        self.store
            .lock()
            .update(id, patch)
            .ok_or(DealError::NotFound(id))
    }

    /// Update a deal on the webhook source and, for local-origin records, in
    /// the local store as well.
    ///
    /// Only validation fails the call as a whole. After that each leg runs to
    /// completion on its own and is reported separately; nothing is retried.
    pub async fn update_deal(
        &self,
        id: i64,
        origin: Origin,
        patch: DealPatch,
    ) -> Result<DualWriteReport, DealError> {
        let patch = validate_patch(patch, &self.vocabulary)?;
        if patch.is_empty() {
            return Err(DealError::Validation("no fields to update".into()));
        }

        let remote_leg = async {
            let remote = self.remote.as_ref().ok_or(RemoteError::NotConfigured)?;
            remote.update(id, &patch).await?;
            Ok::<Option<Deal>, DealError>(None)
        };
        let local_leg = async {
            match origin {
                Origin::Local => Some(self.write_local(id, &patch).map(Some)),
                Origin::Remote => None,
            }
        };
        let (remote_result, local_result) = tokio::join!(remote_leg, local_leg);

        self.report_leg(id, WriteLeg::Remote, &remote_result);
        if let Some(result) = &local_result {
            self.report_leg(id, WriteLeg::Local, result);
        }

        let report = DualWriteReport {
            id,
            origin,
            remote: LegOutcome::from_result(&remote_result),
            local: local_result.as_ref().map(LegOutcome::from_result),
        };
        if !report.any_succeeded() {
            log::warn!("Update of deal {} failed on every attempted leg", id);
        }
        Ok(report)
    }

    fn report_leg(&self, id: i64, leg: WriteLeg, result: &Result<Option<Deal>, DealError>) {
        match result {
            Ok(_) => {
                self.bus.publish(DealEvent::WriteSucceeded { id, leg });
                self.bus.publish(DealEvent::RecordsChanged { id: Some(id), leg });
            }
            Err(e) => self.bus.publish(DealEvent::WriteFailed {
                id,
                leg,
                error: e.to_string(),
            }),
        }
    }
}
