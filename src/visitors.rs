use crate::error::AppResult;
use crate::geo::GeoClient;
use crate::storage::visits::{self, NewVisit};
use crate::types::{DailyVisits, LenientQuery, RecentVisit, VisitorResponse};
use axum::extract::{ConnectInfo, Request, State};
use axum::http::{header, HeaderMap};
use axum::Json;
use deadpool_sqlite::Pool;
use std::net::SocketAddr;
use std::sync::Arc;

const TOP_COUNTRIES: usize = 5;
const DAILY_SERIES_DAYS: usize = 30;

pub struct VisitorState {
    pub pool: Pool,
    pub geo: GeoClient,
}

/// Source address of the request: first `X-Forwarded-For` hop, then
/// `X-Real-IP`, then the TCP peer.
pub fn client_ip(headers: &HeaderMap, peer: Option<SocketAddr>) -> String {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .map(str::trim)
        .filter(|v| !v.is_empty());
    let real_ip = headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty());

    forwarded
        .or(real_ip)
        .map(str::to_string)
        .or_else(|| peer.map(|p| p.ip().to_string()))
        .unwrap_or_else(|| "unknown".to_string())
}

/// GET /api/visitors - Record this hit and return the running totals.
pub async fn track_visit(
    State(state): State<Arc<VisitorState>>,
    query: LenientQuery,
    request: Request,
) -> AppResult<Json<VisitorResponse>> {
    let peer = request
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| *addr);
    let headers = request.headers();
    let ip_address = client_ip(headers, peer);
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let page = query
        .get("page")
        .filter(|p| !p.is_empty())
        .unwrap_or("/")
        .to_string();

    let (country, city) = state.geo.lookup(&ip_address).await.into_parts();
    let visited_at = chrono::Utc::now();

    let id = visits::record_visit(
        &state.pool,
        NewVisit {
            ip_address,
            user_agent,
            page,
            country: country.clone(),
            city: city.clone(),
            visited_at,
        },
    )
    .await?;
    tracing::debug!(id, country = %country, "visit recorded");

    // Read after the insert so the totals include this hit
    let summary = visits::summarize(&state.pool, TOP_COUNTRIES).await?;

    Ok(Json(VisitorResponse {
        total_views: summary.total_views,
        unique_visitors: summary.unique_visitors,
        countries: summary.countries,
        recent_visit: RecentVisit {
            country,
            city,
            time: visited_at.to_rfc3339_opts(chrono::SecondsFormat::Millis, true),
        },
    }))
}

/// GET /api/visitors/stats - Daily visit series, newest day first.
pub async fn visitor_stats(
    State(state): State<Arc<VisitorState>>,
) -> AppResult<Json<Vec<DailyVisits>>> {
    let series = visits::daily_visit_series(&state.pool, DAILY_SERIES_DAYS).await?;
    Ok(Json(series))
}
