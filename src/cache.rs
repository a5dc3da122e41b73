use crate::github::types::{ActivityItem, GithubStats, RepoSummary};
#[cfg(test)]
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Source of "now" in milliseconds since the Unix epoch.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// Wall clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

/// Clock that only moves when told to.
#[cfg(test)]
pub(crate) struct ManualClock {
    now: AtomicI64,
}

#[cfg(test)]
impl ManualClock {
    pub(crate) fn new(start_millis: i64) -> Self {
        Self {
            now: AtomicI64::new(start_millis),
        }
    }

    pub(crate) fn advance(&self, by: Duration) {
        self.now.fetch_add(by.as_millis() as i64, Ordering::SeqCst);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now_millis(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Stats,
    Repos,
    Activity,
}

impl PayloadKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PayloadKind::Stats => "stats",
            PayloadKind::Repos => "repos",
            PayloadKind::Activity => "activity",
        }
    }
}

/// A derived upstream payload as handed back to clients.
#[derive(Debug, Clone, PartialEq)]
pub enum CachedPayload {
    Stats(GithubStats),
    Repos(Vec<RepoSummary>),
    Activity(Vec<ActivityItem>),
}

impl CachedPayload {
    pub fn kind(&self) -> PayloadKind {
        match self {
            CachedPayload::Stats(_) => PayloadKind::Stats,
            CachedPayload::Repos(_) => PayloadKind::Repos,
            CachedPayload::Activity(_) => PayloadKind::Activity,
        }
    }
}

/// Result of consulting the cache for one payload kind.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup {
    Fresh(CachedPayload),
    Stale(CachedPayload),
    Missing,
}

#[derive(Debug, Clone)]
struct Stamped {
    payload: CachedPayload,
    updated_at: i64,
}

#[derive(Default)]
struct Entries {
    stats: Option<Stamped>,
    repos: Option<Stamped>,
    activity: Option<Stamped>,
}

impl Entries {
    fn slot(&self, kind: PayloadKind) -> &Option<Stamped> {
        match kind {
            PayloadKind::Stats => &self.stats,
            PayloadKind::Repos => &self.repos,
            PayloadKind::Activity => &self.activity,
        }
    }

    fn slot_mut(&mut self, kind: PayloadKind) -> &mut Option<Stamped> {
        match kind {
            PayloadKind::Stats => &mut self.stats,
            PayloadKind::Repos => &mut self.repos,
            PayloadKind::Activity => &mut self.activity,
        }
    }
}

/// Last good upstream payloads, each with its own refresh time.
///
/// Entries are never evicted: an expired entry stays readable so a failed
/// refresh can fall back to it. The lock is only held for the duration of a
/// single read or write, never across an upstream call.
pub struct FreshnessCache {
    entries: Mutex<Entries>,
    ttl_millis: i64,
    clock: Arc<dyn Clock>,
}

impl FreshnessCache {
    pub fn new(ttl: Duration) -> Self {
        Self::with_clock(ttl, Arc::new(SystemClock))
    }

    pub fn with_clock(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            entries: Mutex::new(Entries::default()),
            ttl_millis: ttl.as_millis() as i64,
            clock,
        }
    }

    pub fn get(&self, kind: PayloadKind) -> Option<CachedPayload> {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries.slot(kind).as_ref().map(|s| s.payload.clone())
    }

    /// Store a payload and stamp its kind as refreshed now.
    pub fn put(&self, payload: CachedPayload) {
        let updated_at = self.clock.now_millis();
        let kind = payload.kind();
        let mut entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        *entries.slot_mut(kind) = Some(Stamped {
            payload,
            updated_at,
        });
    }

    pub fn is_fresh(&self, kind: PayloadKind) -> bool {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        entries
            .slot(kind)
            .as_ref()
            .is_some_and(|s| self.within_ttl(s.updated_at))
    }

    /// Payload and freshness read together under one lock.
    pub fn lookup(&self, kind: PayloadKind) -> Lookup {
        let entries = self.entries.lock().unwrap_or_else(|e| e.into_inner());
        match entries.slot(kind) {
            Some(s) if self.within_ttl(s.updated_at) => Lookup::Fresh(s.payload.clone()),
            Some(s) => Lookup::Stale(s.payload.clone()),
            None => Lookup::Missing,
        }
    }

    fn within_ttl(&self, updated_at: i64) -> bool {
        self.clock.now_millis() - updated_at < self.ttl_millis
    }
}
