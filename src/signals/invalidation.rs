//! Dashboard cache invalidated by deal events.
//!
//! One slot per [`DataSource`]: the webhook's precomputed dashboard and the
//! one derived from the local store. Any `RecordsChanged` event marks both
//! stale, since a mirrored write can move either number.
//!
//! Every invalidation bumps a generation counter. A caller reads the
//! generation before computing a snapshot and hands it back to [`put`];
//! a snapshot computed across an invalidation is dropped instead of stored.
//!
//! [`put`]: DashboardCache::put

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use parking_lot::Mutex;

use super::bus::{DealEvent, DealEventListener};
use crate::types::{DashboardData, DataSource};

#[derive(Debug, Clone)]
struct Slot {
    data: DashboardData,
    computed_at: DateTime<Utc>,
    stale: bool,
}

impl Slot {
    fn age(&self) -> Duration {
        Utc::now()
            .signed_duration_since(self.computed_at)
            .to_std()
            .unwrap_or(Duration::ZERO)
    }
}

#[derive(Debug, Default)]
pub struct DashboardCache {
    remote: Mutex<Option<Slot>>,
    local: Mutex<Option<Slot>>,
    generation: AtomicU64,
}

impl DashboardCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn slot(&self, source: DataSource) -> &Mutex<Option<Slot>> {
        match source {
            DataSource::Remote => &self.remote,
            DataSource::Local => &self.local,
        }
    }

    /// Current invalidation generation. Read it before computing a snapshot.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// The cached dashboard for `source`, unless missing, stale, or older
    /// than `max_age`. `None` means no age limit.
    pub fn get_fresh(&self, source: DataSource, max_age: Option<Duration>) -> Option<DashboardData> {
        self.slot(source)
            .lock()
            .as_ref()
            .filter(|slot| !slot.stale)
            .filter(|slot| max_age.map_or(true, |max| slot.age() < max))
            .map(|slot| slot.data.clone())
    }

    /// Store a snapshot computed at `generation`. Returns false, leaving the
    /// slot alone, when an invalidation happened since.
    pub fn put(&self, source: DataSource, data: DashboardData, generation: u64) -> bool {
        let mut slot = self.slot(source).lock();
        if self.generation() != generation {
            log::debug!(
                "Dropping {:?} dashboard computed at generation {} (now {})",
                source,
                generation,
                self.generation()
            );
            return false;
        }
        *slot = Some(Slot {
            data,
            computed_at: Utc::now(),
            stale: false,
        });
        true
    }

    pub fn invalidate_all(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        for source in [DataSource::Remote, DataSource::Local] {
            if let Some(slot) = self.slot(source).lock().as_mut() {
                slot.stale = true;
            }
        }
    }
}

impl DealEventListener for DashboardCache {
    fn on_event(&self, event: &DealEvent) {
        if let DealEvent::RecordsChanged { id, leg } = event {
            log::debug!(
                "Invalidating dashboard cache after {:?} change (deal {:?})",
                leg,
                id
            );
            self.invalidate_all();
        }
    }
}
