use crate::storage::StoreError;
use crate::types::{CountryCount, DailyVisits, VisitSummary};
use chrono::{DateTime, Utc};
use deadpool_sqlite::Pool;
use rusqlite::{params, Connection};

/// Country and city value stored when geolocation has nothing better.
pub const UNKNOWN: &str = "Unknown";

/// SQLite `CURRENT_TIMESTAMP` layout, so `DATE(visited_at)` groups by day.
const VISITED_AT_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// A visitor hit about to be recorded.
#[derive(Debug, Clone)]
pub struct NewVisit {
    pub ip_address: String,
    pub user_agent: String,
    pub page: String,
    pub country: String,
    pub city: String,
    pub visited_at: DateTime<Utc>,
}

async fn with_conn<T, F>(pool: &Pool, f: F) -> Result<T, StoreError>
where
    F: FnOnce(&mut Connection) -> rusqlite::Result<T> + Send + 'static,
    T: Send + 'static,
{
    let conn = pool.get().await?;
    let result = conn.interact(f).await?;
    Ok(result?)
}

/// Append a visitor row and return its store-assigned id.
pub async fn record_visit(pool: &Pool, visit: NewVisit) -> Result<i64, StoreError> {
    with_conn(pool, move |conn| {
        conn.execute(
            "INSERT INTO visitors (ip_address, user_agent, page, country, city, visited_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                visit.ip_address,
                visit.user_agent,
                visit.page,
                visit.country,
                visit.city,
                visit.visited_at.format(VISITED_AT_FORMAT).to_string(),
            ],
        )?;
        Ok(conn.last_insert_rowid())
    })
    .await
}

pub async fn count_all_visits(pool: &Pool) -> Result<i64, StoreError> {
    with_conn(pool, |conn| count_all(conn)).await
}

pub async fn count_distinct_sources(pool: &Pool) -> Result<i64, StoreError> {
    with_conn(pool, |conn| count_distinct(conn)).await
}

/// Countries ordered by visit count, highest first. `Unknown` is never included.
pub async fn top_countries_by_count(
    pool: &Pool,
    limit: usize,
) -> Result<Vec<CountryCount>, StoreError> {
    with_conn(pool, move |conn| top_countries(conn, limit)).await
}

/// Total, distinct and top countries read in a single pooled interaction.
pub async fn summarize(pool: &Pool, top_limit: usize) -> Result<VisitSummary, StoreError> {
    with_conn(pool, move |conn| {
        Ok(VisitSummary {
            total_views: count_all(conn)?,
            unique_visitors: count_distinct(conn)?,
            countries: top_countries(conn, top_limit)?,
        })
    })
    .await
}

/// Per-day visit and distinct-visitor counts for the `limit` most recent days,
/// newest first.
pub async fn daily_visit_series(pool: &Pool, limit: usize) -> Result<Vec<DailyVisits>, StoreError> {
    with_conn(pool, move |conn| {
        let mut stmt = conn.prepare_cached(
            "SELECT DATE(visited_at) AS day, COUNT(*), COUNT(DISTINCT ip_address)
             FROM visitors
             GROUP BY day
             ORDER BY day DESC
             LIMIT ?1",
        )?;
        let rows = stmt.query_map(params![limit as i64], |row| {
            Ok(DailyVisits {
                date: row.get(0)?,
                visits: row.get(1)?,
                unique_visitors: row.get(2)?,
            })
        })?;
        rows.collect()
    })
    .await
}

fn count_all(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM visitors", [], |row| row.get(0))
}

fn count_distinct(conn: &Connection) -> rusqlite::Result<i64> {
    conn.query_row(
        "SELECT COUNT(DISTINCT ip_address) FROM visitors",
        [],
        |row| row.get(0),
    )
}

fn top_countries(conn: &Connection, limit: usize) -> rusqlite::Result<Vec<CountryCount>> {
    let mut stmt = conn.prepare_cached(
        "SELECT country, COUNT(*) AS visits
         FROM visitors
         WHERE country != ?1
         GROUP BY country
         ORDER BY visits DESC, country ASC
         LIMIT ?2",
    )?;
    let rows = stmt.query_map(params![UNKNOWN, limit as i64], |row| {
        Ok(CountryCount {
            country: row.get(0)?,
            count: row.get(1)?,
        })
    })?;
    rows.collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseConfig;
    use crate::storage::sqlite;
    use chrono::TimeZone;

    async fn test_pool() -> (tempfile::TempDir, Pool) {
        let dir = tempfile::tempdir().unwrap();
        let config = DatabaseConfig {
            path: dir.path().join("visitors.db"),
            pool_size: 2,
        };
        let pool = sqlite::create_pool(&config).unwrap();
        sqlite::init_pool(&pool).await.unwrap();
        (dir, pool)
    }

    fn visit(ip: &str, country: &str, at: DateTime<Utc>) -> NewVisit {
        NewVisit {
            ip_address: ip.to_string(),
            user_agent: "test-agent".to_string(),
            page: "/".to_string(),
            country: country.to_string(),
            city: UNKNOWN.to_string(),
            visited_at: at,
        }
    }

    fn day(d: u32, h: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, d, h, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn test_record_visit_assigns_increasing_ids() {
        let (_dir, pool) = test_pool().await;
        let first = record_visit(&pool, visit("10.0.0.1", "France", day(1, 9)))
            .await
            .unwrap();
        let second = record_visit(&pool, visit("10.0.0.2", "France", day(1, 10)))
            .await
            .unwrap();
        assert!(second > first);
    }

    #[tokio::test]
    async fn test_counts_track_total_and_distinct() {
        let (_dir, pool) = test_pool().await;
        for ip in ["1.1.1.1", "1.1.1.1", "2.2.2.2"] {
            record_visit(&pool, visit(ip, UNKNOWN, day(2, 12))).await.unwrap();
        }
        assert_eq!(count_all_visits(&pool).await.unwrap(), 3);
        assert_eq!(count_distinct_sources(&pool).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_top_countries_excludes_unknown_and_sorts_desc() {
        let (_dir, pool) = test_pool().await;
        let rows = [
            ("1.0.0.1", "Japan"),
            ("1.0.0.2", "Brazil"),
            ("1.0.0.3", "Brazil"),
            ("1.0.0.4", UNKNOWN),
            ("1.0.0.5", UNKNOWN),
            ("1.0.0.6", UNKNOWN),
            ("1.0.0.7", "Brazil"),
            ("1.0.0.8", "Japan"),
            ("1.0.0.9", "Kenya"),
        ];
        for (ip, country) in rows {
            record_visit(&pool, visit(ip, country, day(3, 8))).await.unwrap();
        }

        let top = top_countries_by_count(&pool, 5).await.unwrap();
        assert_eq!(
            top,
            vec![
                CountryCount { country: "Brazil".into(), count: 3 },
                CountryCount { country: "Japan".into(), count: 2 },
                CountryCount { country: "Kenya".into(), count: 1 },
            ]
        );

        let limited = top_countries_by_count(&pool, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].country, "Brazil");
    }

    #[tokio::test]
    async fn test_summarize_matches_individual_queries() {
        let (_dir, pool) = test_pool().await;
        record_visit(&pool, visit("5.5.5.5", "Chile", day(4, 1))).await.unwrap();
        record_visit(&pool, visit("5.5.5.5", "Chile", day(4, 2))).await.unwrap();

        let summary = summarize(&pool, 5).await.unwrap();
        assert_eq!(summary.total_views, 2);
        assert_eq!(summary.unique_visitors, 1);
        assert!(summary.unique_visitors <= summary.total_views);
        assert_eq!(summary.countries.len(), 1);
    }

    #[tokio::test]
    async fn test_daily_series_newest_first_and_capped() {
        let (_dir, pool) = test_pool().await;
        record_visit(&pool, visit("9.9.9.1", UNKNOWN, day(5, 9))).await.unwrap();
        record_visit(&pool, visit("9.9.9.1", UNKNOWN, day(6, 9))).await.unwrap();
        record_visit(&pool, visit("9.9.9.2", UNKNOWN, day(6, 18))).await.unwrap();
        record_visit(&pool, visit("9.9.9.2", UNKNOWN, day(6, 23))).await.unwrap();
        record_visit(&pool, visit("9.9.9.3", UNKNOWN, day(7, 0))).await.unwrap();

        let series = daily_visit_series(&pool, 2).await.unwrap();
        assert_eq!(
            series,
            vec![
                DailyVisits { date: "2026-03-07".into(), visits: 1, unique_visitors: 1 },
                DailyVisits { date: "2026-03-06".into(), visits: 3, unique_visitors: 2 },
            ]
        );
    }
}
