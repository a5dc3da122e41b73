use crate::cache::{CachedPayload, FreshnessCache, Lookup, PayloadKind};
use crate::error::AppResult;
use crate::github::client::{GithubClient, UpstreamError};
use crate::github::types::{
    ActivityItem, ActivityResponse, GithubStats, RepoSummary, ReposResponse, StatsResponse,
};
use axum::extract::State;
use axum::Json;
use std::future::Future;
use std::sync::Arc;

const STALE_NOTE: &str = "Using cached data due to API error";

pub struct GithubState {
    pub client: GithubClient,
    pub cache: Arc<FreshnessCache>,
    pub recent_repos_limit: u32,
}

/// Typed view over one slot of the freshness cache.
trait Payload: Sized {
    const KIND: PayloadKind;
    fn into_cached(self) -> CachedPayload;
    fn from_cached(payload: CachedPayload) -> Option<Self>;
}

impl Payload for GithubStats {
    const KIND: PayloadKind = PayloadKind::Stats;
    fn into_cached(self) -> CachedPayload {
        CachedPayload::Stats(self)
    }
    fn from_cached(payload: CachedPayload) -> Option<Self> {
        match payload {
            CachedPayload::Stats(s) => Some(s),
            _ => None,
        }
    }
}

impl Payload for Vec<RepoSummary> {
    const KIND: PayloadKind = PayloadKind::Repos;
    fn into_cached(self) -> CachedPayload {
        CachedPayload::Repos(self)
    }
    fn from_cached(payload: CachedPayload) -> Option<Self> {
        match payload {
            CachedPayload::Repos(r) => Some(r),
            _ => None,
        }
    }
}

impl Payload for Vec<ActivityItem> {
    const KIND: PayloadKind = PayloadKind::Activity;
    fn into_cached(self) -> CachedPayload {
        CachedPayload::Activity(self)
    }
    fn from_cached(payload: CachedPayload) -> Option<Self> {
        match payload {
            CachedPayload::Activity(a) => Some(a),
            _ => None,
        }
    }
}

struct Served<T> {
    value: T,
    cached: bool,
    error: Option<&'static str>,
}

/// Serve from cache while fresh; otherwise run `fetch`, store the result and
/// return it. A failed fetch falls back to the expired entry when one exists.
async fn serve<T, Fut>(cache: &FreshnessCache, fetch: Fut) -> Result<Served<T>, UpstreamError>
where
    T: Payload + Clone,
    Fut: Future<Output = Result<T, UpstreamError>>,
{
    let kind = T::KIND;
    let stale = match cache.lookup(kind) {
        Lookup::Fresh(p) => match T::from_cached(p) {
            Some(value) => {
                tracing::debug!(kind = kind.as_str(), "github cache hit");
                return Ok(Served {
                    value,
                    cached: true,
                    error: None,
                });
            }
            None => None,
        },
        Lookup::Stale(p) => T::from_cached(p),
        Lookup::Missing => None,
    };

    match fetch.await {
        Ok(value) => {
            cache.put(value.clone().into_cached());
            tracing::info!(kind = kind.as_str(), "github data refreshed");
            Ok(Served {
                value,
                cached: false,
                error: None,
            })
        }
        Err(e) => match stale {
            Some(value) => {
                tracing::warn!(kind = kind.as_str(), error = %e, "github fetch failed, serving stale cache");
                Ok(Served {
                    value,
                    cached: true,
                    error: Some(STALE_NOTE),
                })
            }
            None => Err(e),
        },
    }
}

/// GET /api/github/stats - Profile counts, star/fork totals and top languages.
pub async fn stats(State(state): State<Arc<GithubState>>) -> AppResult<Json<StatsResponse>> {
    let served = serve(&state.cache, state.client.fetch_profile_and_repo_summary()).await?;
    Ok(Json(StatsResponse {
        stats: served.value,
        cached: served.cached,
        error: served.error,
    }))
}

/// GET /api/github/repos - Recently updated repositories.
pub async fn repos(State(state): State<Arc<GithubState>>) -> Json<ReposResponse> {
    let fetch = state.client.fetch_recent_repos(state.recent_repos_limit);
    match serve(&state.cache, fetch).await {
        Ok(served) => Json(ReposResponse {
            repos: served.value,
            cached: served.cached,
            error: served.error,
        }),
        Err(e) => {
            tracing::error!(error = %e, "failed to fetch github repos");
            Json(ReposResponse {
                repos: Vec::new(),
                cached: false,
                error: Some("Failed to fetch repositories"),
            })
        }
    }
}

/// GET /api/github/activity - Recent push events.
pub async fn activity(State(state): State<Arc<GithubState>>) -> Json<ActivityResponse> {
    match serve(&state.cache, state.client.fetch_recent_activity()).await {
        Ok(served) => Json(ActivityResponse {
            activity: served.value,
            cached: served.cached,
            error: served.error,
        }),
        Err(e) => {
            tracing::error!(error = %e, "failed to fetch github activity");
            Json(ActivityResponse {
                activity: Vec::new(),
                cached: false,
                error: Some("Failed to fetch activity"),
            })
        }
    }
}
