//! Leaderboard
//!
//! A local top-10 table persisted to LocalStorage, plus an optional remote
//! board behind the async `ScoreBoard` gateway. Remote failures surface as
//! `LeaderboardError` so the UI can tell "unavailable" apart from "empty".

use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::persistence::{KeyValueStore, StorageError, load_json, save_json};
use crate::ui::LeaderboardView;

/// Maximum number of high scores to keep
pub const MAX_HIGH_SCORES: usize = 10;

/// Longest accepted player name (characters)
pub const MAX_NAME_LEN: usize = 20;

/// Leaderboard gateway failures
#[derive(Debug, Error)]
pub enum LeaderboardError {
    #[error("leaderboard unavailable: {0}")]
    Unavailable(String),

    #[error("leaderboard request failed: {0}")]
    Request(String),

    #[error("bad leaderboard response: {0}")]
    Decode(String),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// A single leaderboard entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeaderboardEntry {
    pub name: String,
    pub score: u64,
    /// Waves cleared
    pub wave: u32,
    /// Unix timestamp (ms) when achieved
    pub timestamp: f64,
}

impl LeaderboardEntry {
    /// Build an entry; the name is trimmed and cut to 20 characters
    pub fn new(name: &str, score: u64, wave: u32, timestamp: f64) -> Self {
        Self {
            name: clean_name(name),
            score,
            wave,
            timestamp,
        }
    }
}

/// Trim, cut to `MAX_NAME_LEN` chars, and fall back to "Anonymous"
pub fn clean_name(name: &str) -> String {
    let name: String = name.trim().chars().take(MAX_NAME_LEN).collect();
    if name.is_empty() {
        "Anonymous".to_string()
    } else {
        name
    }
}

/// High score table, sorted by score descending
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct HighScores {
    pub entries: Vec<LeaderboardEntry>,
}

impl HighScores {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Check if a score would make the table
    pub fn qualifies(&self, score: u64) -> bool {
        if self.entries.len() < MAX_HIGH_SCORES {
            return true;
        }
        self.entries.last().map(|e| score > e.score).unwrap_or(true)
    }

    /// Rank a score would achieve (1-indexed, None if it doesn't qualify)
    pub fn potential_rank(&self, score: u64) -> Option<usize> {
        if !self.qualifies(score) {
            return None;
        }
        let rank = self.entries.iter().position(|e| score > e.score);
        Some(rank.unwrap_or(self.entries.len()) + 1)
    }

    /// Insert an entry, keeping the top 10.
    /// Returns the rank achieved (1-indexed) or None if it didn't qualify.
    pub fn add(&mut self, entry: LeaderboardEntry) -> Option<usize> {
        if !self.qualifies(entry.score) {
            return None;
        }

        // Ties go below existing entries
        let pos = self.entries.iter().position(|e| entry.score > e.score);
        let rank = match pos {
            Some(i) => {
                self.entries.insert(i, entry);
                i + 1
            }
            None => {
                self.entries.push(entry);
                self.entries.len()
            }
        };
        self.entries.truncate(MAX_HIGH_SCORES);
        Some(rank)
    }

    pub fn add_score(&mut self, name: &str, score: u64, wave: u32, timestamp: f64) -> Option<usize> {
        self.add(LeaderboardEntry::new(name, score, wave, timestamp))
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn top_score(&self) -> Option<u64> {
        self.entries.first().map(|e| e.score)
    }
}

/// Async leaderboard gateway
#[allow(async_fn_in_trait)]
pub trait ScoreBoard {
    /// Record a finished run
    fn submit(&self, entry: LeaderboardEntry) -> impl Future<Output = Result<(), LeaderboardError>>;

    /// Top entries, best first
    fn fetch(&self) -> impl Future<Output = Result<Vec<LeaderboardEntry>, LeaderboardError>>;
}

/// Leaderboard kept in a key-value store
pub struct LocalScoreBoard<S> {
    store: S,
}

impl<S: KeyValueStore> LocalScoreBoard<S> {
    pub const STORAGE_KEY: &'static str = "spaceBattleLeaderboard";

    pub fn new(store: S) -> Self {
        Self { store }
    }

    /// Current table; unreadable data reads as empty
    pub fn table(&self) -> HighScores {
        match load_json::<Vec<LeaderboardEntry>>(&self.store, Self::STORAGE_KEY) {
            Ok(entries) => HighScores {
                entries: entries.unwrap_or_default(),
            },
            Err(e) => {
                log::warn!("Failed to load local leaderboard: {}", e);
                HighScores::new()
            }
        }
    }

    /// Insert into the stored table
    pub fn record(&self, entry: LeaderboardEntry) -> Result<Option<usize>, LeaderboardError> {
        let mut table = self.table();
        let rank = table.add(entry);
        save_json(&self.store, Self::STORAGE_KEY, &table.entries)?;
        log::info!("High scores saved ({} entries)", table.entries.len());
        Ok(rank)
    }

    pub fn clear(&self) {
        if let Err(e) = self.store.remove(Self::STORAGE_KEY) {
            log::warn!("Failed to clear local leaderboard: {}", e);
        }
    }
}

impl<S: KeyValueStore> ScoreBoard for LocalScoreBoard<S> {
    async fn submit(&self, entry: LeaderboardEntry) -> Result<(), LeaderboardError> {
        self.record(entry).map(|_| ())
    }

    async fn fetch(&self) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        Ok(self.table().entries)
    }
}

/// Row layout of the hosted leaderboard table
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteRow {
    pub player_name: String,
    pub score: u64,
    pub wave: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl RemoteRow {
    pub fn from_entry(entry: &LeaderboardEntry) -> Self {
        Self {
            player_name: entry.name.clone(),
            score: entry.score,
            wave: entry.wave,
            created_at: None,
        }
    }

    pub fn into_entry(self, timestamp: f64) -> LeaderboardEntry {
        LeaderboardEntry::new(&self.player_name, self.score, self.wave, timestamp)
    }
}

/// Hosted leaderboard over a REST table endpoint
#[derive(Debug, Clone)]
pub struct RemoteScoreBoard {
    endpoint: String,
    api_key: String,
}

impl RemoteScoreBoard {
    pub fn new(endpoint: &str, api_key: &str) -> Self {
        Self {
            endpoint: endpoint.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        }
    }

    fn table_url(&self) -> String {
        format!("{}/rest/v1/leaderboard", self.endpoint)
    }

    fn top_url(&self) -> String {
        format!(
            "{}?select=player_name,score,wave,created_at&order=score.desc&limit={}",
            self.table_url(),
            MAX_HIGH_SCORES
        )
    }

    #[cfg(target_arch = "wasm32")]
    async fn request(&self, method: &str, url: &str, body: Option<String>) -> Result<String, LeaderboardError> {
        use wasm_bindgen::JsCast;
        use wasm_bindgen_futures::JsFuture;
        use web_sys::{Headers, Request, RequestInit, RequestMode, Response};

        let js_err = |e: wasm_bindgen::JsValue| LeaderboardError::Request(format!("{:?}", e));

        let window = web_sys::window()
            .ok_or_else(|| LeaderboardError::Unavailable("no window".to_string()))?;

        let headers = Headers::new().map_err(js_err)?;
        headers.set("apikey", &self.api_key).map_err(js_err)?;
        headers
            .set("Authorization", &format!("Bearer {}", self.api_key))
            .map_err(js_err)?;
        headers.set("Content-Type", "application/json").map_err(js_err)?;

        let init = RequestInit::new();
        init.set_method(method);
        init.set_mode(RequestMode::Cors);
        init.set_headers(&headers);
        if let Some(body) = body {
            init.set_body(&wasm_bindgen::JsValue::from_str(&body));
        }

        let request = Request::new_with_str_and_init(url, &init).map_err(js_err)?;
        let response = JsFuture::from(window.fetch_with_request(&request))
            .await
            .map_err(|e| LeaderboardError::Unavailable(format!("{:?}", e)))?;
        let response: Response = response
            .dyn_into()
            .map_err(|_| LeaderboardError::Decode("not a Response".to_string()))?;
        if !response.ok() {
            return Err(LeaderboardError::Request(format!(
                "HTTP {} {}",
                response.status(),
                response.status_text()
            )));
        }
        let text = JsFuture::from(response.text().map_err(js_err)?)
            .await
            .map_err(js_err)?;
        Ok(text.as_string().unwrap_or_default())
    }
}

#[cfg(target_arch = "wasm32")]
impl ScoreBoard for RemoteScoreBoard {
    async fn submit(&self, entry: LeaderboardEntry) -> Result<(), LeaderboardError> {
        let body = serde_json::to_string(&RemoteRow::from_entry(&entry))
            .map_err(|e| LeaderboardError::Decode(e.to_string()))?;
        self.request("POST", &self.table_url(), Some(body)).await?;
        log::info!("Submitted score {} for {}", entry.score, entry.name);
        Ok(())
    }

    async fn fetch(&self) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        let text = self.request("GET", &self.top_url(), None).await?;
        let rows: Vec<RemoteRow> =
            serde_json::from_str(&text).map_err(|e| LeaderboardError::Decode(e.to_string()))?;
        Ok(rows
            .into_iter()
            .map(|row| {
                let ts = row
                    .created_at
                    .as_deref()
                    .map(js_sys::Date::parse)
                    .filter(|t| t.is_finite())
                    .unwrap_or_else(js_sys::Date::now);
                row.into_entry(ts)
            })
            .collect())
    }
}

/// Native stubs
#[cfg(not(target_arch = "wasm32"))]
impl ScoreBoard for RemoteScoreBoard {
    async fn submit(&self, _entry: LeaderboardEntry) -> Result<(), LeaderboardError> {
        Err(LeaderboardError::Unavailable(format!(
            "no HTTP client for {}",
            self.table_url()
        )))
    }

    async fn fetch(&self) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
        Err(LeaderboardError::Unavailable(format!(
            "no HTTP client for {}",
            self.top_url()
        )))
    }
}

/// Fetch from a board, keeping failures distinct from an empty result
pub async fn fetch_view(board: &impl ScoreBoard, fallback: HighScores) -> LeaderboardView {
    match board.fetch().await {
        Ok(entries) => LeaderboardView::Entries(entries),
        Err(e) => {
            log::error!("Failed to load leaderboard: {}", e);
            LeaderboardView::Unavailable {
                reason: e.to_string(),
                local: fallback.entries,
            }
        }
    }
}

/// Submit a run, then fetch the board; submission failures still show the board
pub async fn submit_then_fetch(
    board: &impl ScoreBoard,
    entry: LeaderboardEntry,
    fallback: HighScores,
) -> LeaderboardView {
    if let Err(e) = board.submit(entry).await {
        log::error!("Failed to submit score: {}", e);
    }
    fetch_view(board, fallback).await
}

/// Format a timestamp as a relative date string
#[cfg(target_arch = "wasm32")]
pub fn format_date(timestamp: f64) -> String {
    let now = js_sys::Date::now();
    let diff_mins = (now - timestamp) / 60_000.0;
    let diff_hours = diff_mins / 60.0;
    let diff_days = diff_hours / 24.0;

    if diff_days >= 1.0 {
        let days = diff_days.floor() as i32;
        if days == 1 {
            "Yesterday".to_string()
        } else if days < 7 {
            format!("{} days ago", days)
        } else {
            let date = js_sys::Date::new(&wasm_bindgen::JsValue::from_f64(timestamp));
            format!(
                "{}/{}/{}",
                date.get_month() + 1,
                date.get_date(),
                date.get_full_year() % 100
            )
        }
    } else if diff_hours >= 1.0 {
        let hours = diff_hours.floor() as i32;
        if hours == 1 {
            "1 hour ago".to_string()
        } else {
            format!("{} hours ago", hours)
        }
    } else if diff_mins >= 1.0 {
        let mins = diff_mins.floor() as i32;
        if mins == 1 {
            "1 min ago".to_string()
        } else {
            format!("{} mins ago", mins)
        }
    } else {
        "Just now".to_string()
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub fn format_date(_timestamp: f64) -> String {
    "N/A".to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryStore;

    struct DownBoard;

    impl ScoreBoard for DownBoard {
        async fn submit(&self, _entry: LeaderboardEntry) -> Result<(), LeaderboardError> {
            Err(LeaderboardError::Request("HTTP 503".to_string()))
        }

        async fn fetch(&self) -> Result<Vec<LeaderboardEntry>, LeaderboardError> {
            Err(LeaderboardError::Unavailable("offline".to_string()))
        }
    }

    #[test]
    fn test_keeps_top_ten_sorted() {
        let mut scores = HighScores::new();
        for i in 0..15u64 {
            scores.add_score("p", i * 100, 1, i as f64);
        }
        assert_eq!(scores.entries.len(), MAX_HIGH_SCORES);
        assert_eq!(scores.top_score(), Some(1400));
        assert!(scores.entries.windows(2).all(|w| w[0].score >= w[1].score));
        assert!(!scores.qualifies(500));
        assert_eq!(scores.potential_rank(1450), Some(1));
    }

    #[test]
    fn test_ties_rank_below() {
        let mut scores = HighScores::new();
        scores.add_score("first", 500, 3, 1.0);
        assert_eq!(scores.add_score("second", 500, 3, 2.0), Some(2));
        assert_eq!(scores.entries[0].name, "first");
    }

    #[test]
    fn test_name_cleanup() {
        let entry = LeaderboardEntry::new("  abcdefghijklmnopqrstuvwxyz  ", 1, 0, 0.0);
        assert_eq!(entry.name, "abcdefghijklmnopqrst");
        assert_eq!(clean_name("   "), "Anonymous");
        assert_eq!(clean_name("ÅÄÖåäöÅÄÖåäöÅÄÖåäöÅÄÖ").chars().count(), 20);
    }

    #[test]
    fn test_local_board_persists() {
        let store = MemoryStore::new();
        let board = LocalScoreBoard::new(&store);
        pollster::block_on(board.submit(LeaderboardEntry::new("ace", 900, 4, 1.0))).unwrap();
        pollster::block_on(board.submit(LeaderboardEntry::new("bob", 1200, 6, 2.0))).unwrap();

        let reopened = LocalScoreBoard::new(&store);
        let entries = pollster::block_on(reopened.fetch()).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].name, "bob");

        reopened.clear();
        assert!(reopened.table().is_empty());
    }

    #[test]
    fn test_unavailable_is_not_empty() {
        let mut local = HighScores::new();
        local.add_score("ace", 900, 4, 1.0);

        let view = pollster::block_on(fetch_view(&DownBoard, local.clone()));
        match view {
            LeaderboardView::Unavailable { local: entries, .. } => assert_eq!(entries.len(), 1),
            other => panic!("expected Unavailable, got {:?}", other),
        }

        let empty = LocalScoreBoard::new(MemoryStore::new());
        let view = pollster::block_on(fetch_view(&empty, local));
        assert_eq!(view, LeaderboardView::Entries(Vec::new()));
    }

    #[test]
    fn test_failed_submit_still_fetches() {
        let view = pollster::block_on(submit_then_fetch(
            &DownBoard,
            LeaderboardEntry::new("ace", 1, 0, 0.0),
            HighScores::new(),
        ));
        assert!(matches!(view, LeaderboardView::Unavailable { .. }));
    }

    #[test]
    fn test_remote_row_shape() {
        let entry = LeaderboardEntry::new("ace", 1500, 7, 0.0);
        let json = serde_json::to_value(RemoteRow::from_entry(&entry)).unwrap();
        assert_eq!(json["player_name"], "ace");
        assert_eq!(json["wave"], 7);
        assert!(json.get("created_at").is_none());
    }

    #[cfg(not(target_arch = "wasm32"))]
    #[test]
    fn test_native_remote_is_unavailable() {
        let board = RemoteScoreBoard::new("https://example.invalid/", "key");
        let result = pollster::block_on(board.fetch());
        assert!(matches!(result, Err(LeaderboardError::Unavailable(_))));
    }
}
