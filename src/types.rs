use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use serde::Serialize;
use std::collections::HashMap;
use std::convert::Infallible;

/// Visitor count for a single country.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CountryCount {
    pub country: String,
    pub count: i64,
}

/// One day of the daily visit series.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct DailyVisits {
    pub date: String,
    pub visits: i64,
    pub unique_visitors: i64,
}

/// Aggregates read back after recording a visit.
#[derive(Debug, Clone)]
pub struct VisitSummary {
    pub total_views: i64,
    pub unique_visitors: i64,
    pub countries: Vec<CountryCount>,
}

#[derive(Debug, Serialize)]
pub struct RecentVisit {
    pub country: String,
    pub city: String,
    pub time: String,
}

/// Response for `GET /api/visitors`.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorResponse {
    pub total_views: i64,
    pub unique_visitors: i64,
    pub countries: Vec<CountryCount>,
    pub recent_visit: RecentVisit,
}

/// Query string reduced to the first value of each key. Never rejects, so a
/// repeated or malformed parameter falls back to the handler's default.
#[derive(Debug, Default)]
pub struct LenientQuery(HashMap<String, String>);

impl LenientQuery {
    pub fn parse(raw: &str) -> Self {
        let mut values = HashMap::new();
        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            values
                .entry(key.into_owned())
                .or_insert_with(|| value.into_owned());
        }
        Self(values)
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for LenientQuery {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts.uri.query().map(Self::parse).unwrap_or_default())
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
}
