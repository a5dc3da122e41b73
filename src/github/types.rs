use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const NO_DESCRIPTION: &str = "No description provided";
pub const TOP_LANGUAGES: usize = 5;

// ── GitHub REST wire types (only the fields we read) ──

#[derive(Debug, Clone, Deserialize)]
pub struct GhUser {
    #[serde(default)]
    pub followers: u64,
    #[serde(default)]
    pub following: u64,
    #[serde(default)]
    pub public_repos: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GhRepo {
    pub name: String,
    pub html_url: String,
    pub description: Option<String>,
    pub language: Option<String>,
    #[serde(default)]
    pub stargazers_count: u64,
    #[serde(default)]
    pub forks_count: u64,
    #[serde(default)]
    pub watchers_count: u64,
    #[serde(default)]
    pub size: u64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub homepage: Option<String>,
    pub topics: Option<Vec<String>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GhEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub created_at: DateTime<Utc>,
    pub repo: GhEventRepo,
    #[serde(default)]
    pub payload: GhEventPayload,
}

#[derive(Debug, Clone, Deserialize)]
pub struct GhEventRepo {
    pub name: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct GhEventPayload {
    pub commits: Option<Vec<serde_json::Value>>,
    pub size: Option<u64>,
}

// ── Derived payloads served to the front end ──

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LanguageCount {
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct GithubStats {
    pub followers: u64,
    pub following: u64,
    pub public_repos: u64,
    pub total_stars: u64,
    pub total_forks: u64,
    pub languages: Vec<LanguageCount>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct RepoSummary {
    pub name: String,
    pub url: String,
    pub description: String,
    pub language: Option<String>,
    pub stars: u64,
    pub forks: u64,
    pub watchers: u64,
    pub size: u64,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
    pub homepage: Option<String>,
    pub topics: Vec<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ActivityItem {
    pub date: String,
    pub commits: u64,
    pub repo: String,
}

// ── Endpoint responses ──

#[derive(Debug, Serialize)]
pub struct StatsResponse {
    #[serde(flatten)]
    pub stats: GithubStats,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct ReposResponse {
    pub repos: Vec<RepoSummary>,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

#[derive(Debug, Serialize)]
pub struct ActivityResponse {
    pub activity: Vec<ActivityItem>,
    pub cached: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<&'static str>,
}

// ── Reshaping ──

/// Profile counts plus star/fork totals and the top languages across `repos`.
pub fn summarize_profile(user: &GhUser, repos: &[GhRepo]) -> GithubStats {
    GithubStats {
        followers: user.followers,
        following: user.following,
        public_repos: user.public_repos,
        total_stars: repos.iter().map(|r| r.stargazers_count).sum(),
        total_forks: repos.iter().map(|r| r.forks_count).sum(),
        languages: language_histogram(repos, TOP_LANGUAGES),
    }
}

/// Repos per language, most common first. Ties keep the order in which the
/// language first appeared. Repos without a language are skipped.
pub fn language_histogram(repos: &[GhRepo], top: usize) -> Vec<LanguageCount> {
    let mut counts: Vec<LanguageCount> = Vec::new();
    for lang in repos.iter().filter_map(|r| r.language.as_deref()) {
        match counts.iter_mut().find(|c| c.name == lang) {
            Some(entry) => entry.count += 1,
            None => counts.push(LanguageCount {
                name: lang.to_string(),
                count: 1,
            }),
        }
    }
    // sort_by is stable, so first-seen order survives among equal counts
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts.truncate(top);
    counts
}

impl From<GhRepo> for RepoSummary {
    fn from(repo: GhRepo) -> Self {
        Self {
            name: repo.name,
            url: repo.html_url,
            description: repo
                .description
                .filter(|d| !d.is_empty())
                .unwrap_or_else(|| NO_DESCRIPTION.to_string()),
            language: repo.language,
            stars: repo.stargazers_count,
            forks: repo.forks_count,
            watchers: repo.watchers_count,
            size: repo.size,
            created_at: repo.created_at,
            updated_at: repo.updated_at,
            homepage: repo.homepage.filter(|h| !h.is_empty()),
            topics: repo.topics.unwrap_or_default(),
        }
    }
}

/// Push events only, as (day, commit count, repo full name).
pub fn push_activity(events: Vec<GhEvent>) -> Vec<ActivityItem> {
    events
        .into_iter()
        .filter(|e| e.kind == "PushEvent")
        .map(|e| ActivityItem {
            date: e.created_at.date_naive().to_string(),
            commits: e
                .payload
                .commits
                .as_ref()
                .map(|c| c.len() as u64)
                .or(e.payload.size)
                .unwrap_or(0),
            repo: e.repo.name,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn repo(name: &str, language: Option<&str>, stars: u64, forks: u64) -> GhRepo {
        serde_json::from_value(json!({
            "name": name,
            "html_url": format!("https://github.com/octocat/{name}"),
            "description": null,
            "language": language,
            "stargazers_count": stars,
            "forks_count": forks,
            "watchers_count": stars,
            "size": 10,
            "created_at": "2020-01-01T00:00:00Z",
            "updated_at": "2026-01-01T00:00:00Z",
            "homepage": "",
            "topics": null,
        }))
        .unwrap()
    }

    #[test]
    fn test_summarize_profile_sums_stars_and_forks() {
        let user = GhUser {
            followers: 7,
            following: 3,
            public_repos: 3,
        };
        let repos = vec![
            repo("a", Some("Rust"), 5, 1),
            repo("b", Some("Go"), 2, 0),
            repo("c", None, 10, 4),
        ];
        let stats = summarize_profile(&user, &repos);
        assert_eq!(stats.total_stars, 17);
        assert_eq!(stats.total_forks, 5);
        assert_eq!(stats.followers, 7);
        assert_eq!(stats.public_repos, 3);
    }

    #[test]
    fn test_language_histogram_ties_keep_source_order() {
        let repos = vec![
            repo("a", Some("Go"), 0, 0),
            repo("b", Some("Rust"), 0, 0),
            repo("c", Some("Rust"), 0, 0),
            repo("d", Some("Python"), 0, 0),
            repo("e", Some("Go"), 0, 0),
            repo("f", None, 0, 0),
            repo("g", Some("C"), 0, 0),
        ];
        let names: Vec<(String, u64)> = language_histogram(&repos, 5)
            .into_iter()
            .map(|l| (l.name, l.count))
            .collect();
        assert_eq!(
            names,
            vec![
                ("Go".to_string(), 2),
                ("Rust".to_string(), 2),
                ("Python".to_string(), 1),
                ("C".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_language_histogram_truncates_to_top() {
        let repos: Vec<GhRepo> = ["A", "B", "C", "D", "E", "F", "G"]
            .iter()
            .map(|l| repo(l, Some(*l), 0, 0))
            .collect();
        assert_eq!(language_histogram(&repos, TOP_LANGUAGES).len(), 5);
    }

    #[test]
    fn test_repo_summary_defaults() {
        let summary = RepoSummary::from(repo("plain", None, 1, 2));
        assert_eq!(summary.description, NO_DESCRIPTION);
        assert!(summary.topics.is_empty());
        assert_eq!(summary.homepage, None);
        assert_eq!(summary.url, "https://github.com/octocat/plain");

        let value = serde_json::to_value(&summary).unwrap();
        assert_eq!(value["createdAt"], "2020-01-01T00:00:00Z");
        assert_eq!(value["stars"], 1);
    }

    #[test]
    fn test_push_activity_filters_and_counts() {
        let events: Vec<GhEvent> = serde_json::from_value(json!([
            {
                "type": "PushEvent",
                "created_at": "2026-02-10T21:15:00Z",
                "repo": { "name": "octocat/hello" },
                "payload": { "commits": [{}, {}, {}] }
            },
            {
                "type": "WatchEvent",
                "created_at": "2026-02-10T20:00:00Z",
                "repo": { "name": "octocat/other" },
                "payload": {}
            },
            {
                "type": "PushEvent",
                "created_at": "2026-02-09T08:00:00Z",
                "repo": { "name": "octocat/sized" },
                "payload": { "size": 2 }
            }
        ]))
        .unwrap();

        let activity = push_activity(events);
        assert_eq!(
            activity,
            vec![
                ActivityItem {
                    date: "2026-02-10".into(),
                    commits: 3,
                    repo: "octocat/hello".into()
                },
                ActivityItem {
                    date: "2026-02-09".into(),
                    commits: 2,
                    repo: "octocat/sized".into()
                },
            ]
        );
    }

    #[test]
    fn test_stats_response_flattens_and_hides_absent_error() {
        let resp = StatsResponse {
            stats: GithubStats {
                followers: 1,
                following: 2,
                public_repos: 3,
                total_stars: 4,
                total_forks: 5,
                languages: vec![],
            },
            cached: false,
            error: None,
        };
        let value = serde_json::to_value(&resp).unwrap();
        assert_eq!(value["publicRepos"], 3);
        assert_eq!(value["totalStars"], 4);
        assert_eq!(value["cached"], false);
        assert!(value.get("error").is_none());
    }
}
