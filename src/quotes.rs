use crate::types::LenientQuery;
use axum::Json;
use rand::seq::SliceRandom;

pub const QUOTES: &[&str] = &[
    "The best way to predict the future is to invent it. - Alan Kay",
    "Simplicity is prerequisite for reliability. - Edsger W. Dijkstra",
    "Programs must be written for people to read, and only incidentally for machines to execute. - Harold Abelson",
    "Make it work, make it right, make it fast. - Kent Beck",
    "Talk is cheap. Show me the code. - Linus Torvalds",
    "First, solve the problem. Then, write the code. - John Johnson",
    "Any fool can write code that a computer can understand. Good programmers write code that humans can understand. - Martin Fowler",
    "Premature optimization is the root of all evil. - Donald Knuth",
];

pub const MAX_QUOTES: usize = 5;

/// Up to `count` distinct quotes in random order. `count` is clamped to
/// `1..=MAX_QUOTES`.
pub fn pick(count: usize) -> Vec<&'static str> {
    let count = count.clamp(1, MAX_QUOTES.min(QUOTES.len()));
    let mut all = QUOTES.to_vec();
    all.shuffle(&mut rand::thread_rng());
    all.truncate(count);
    all
}

/// Lenient `count` parsing: anything that is not a positive integer means 1.
fn requested_count(raw: Option<&str>) -> usize {
    raw.and_then(|v| v.trim().parse::<usize>().ok()).unwrap_or(1)
}

/// GET /api/quotes?count=N
pub async fn random_quotes(query: LenientQuery) -> Json<Vec<&'static str>> {
    Json(pick(requested_count(query.get("count"))))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_pick_clamps_low_and_high() {
        assert_eq!(pick(0).len(), 1);
        assert_eq!(pick(1).len(), 1);
        assert_eq!(pick(3).len(), 3);
        assert_eq!(pick(5).len(), 5);
        assert_eq!(pick(50).len(), 5);
    }

    #[test]
    fn test_pick_is_distinct_and_from_list() {
        for _ in 0..100 {
            let picked = pick(5);
            let unique: HashSet<_> = picked.iter().collect();
            assert_eq!(unique.len(), picked.len());
            assert!(picked.iter().all(|q| QUOTES.contains(q)));
        }
    }

    #[test]
    fn test_requested_count_parsing() {
        assert_eq!(requested_count(None), 1);
        assert_eq!(requested_count(Some("3")), 3);
        assert_eq!(requested_count(Some(" 4 ")), 4);
        assert_eq!(requested_count(Some("abc")), 1);
        assert_eq!(requested_count(Some("-2")), 1);
    }
}
