//! In-memory store for testing.
//!
//! Records every call by operation name so tests can assert how often the
//! cache reached the backing store, and can be switched into a failing mode
//! to exercise refresh errors.

use std::cmp::Ordering as CmpOrdering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use guildboard_core::{
    AutocompleteEntry, GuildMetricRow, GuildRow, GuildSummaryRow, GuildboardError,
    GuildboardResult, HistoryEvent, HistoryFilter, PageRequest, PlayerGuildRow, PlayerMetricRow,
    PlayerRankingRow, PlayerRow, RankingQuery, SitemapLinks, UpstreamError,
};

use crate::store::{LeaderboardStore, PatronSource};

const MOCK_SOURCE: &str = "mock-store";

fn read_lock<T>(lock: &RwLock<T>) -> GuildboardResult<RwLockReadGuard<'_, T>> {
    lock.read()
        .map_err(|_| GuildboardError::from(UpstreamError::LockPoisoned))
}

fn write_lock<T>(lock: &RwLock<T>) -> GuildboardResult<RwLockWriteGuard<'_, T>> {
    lock.write()
        .map_err(|_| GuildboardError::from(UpstreamError::LockPoisoned))
}

fn page_window<T>(rows: Vec<T>, page: PageRequest) -> Vec<T> {
    let offset = usize::try_from(page.offset()).unwrap_or(usize::MAX);
    rows.into_iter()
        .skip(offset)
        .take(page.limit() as usize)
        .collect()
}

#[derive(Debug, Default)]
struct MockData {
    guilds: HashMap<String, GuildRow>,
    position_changes: HashMap<String, i32>,
    discords: HashMap<String, String>,
    guild_metrics: HashMap<String, Vec<GuildMetricRow>>,
    players: HashMap<String, PlayerRow>,
    player_guilds: HashMap<String, PlayerGuildRow>,
    player_metrics: HashMap<String, Vec<PlayerMetricRow>>,
    history: Vec<HistoryEvent>,
    rankings: Vec<PlayerRankingRow>,
}

/// In-memory mock of the leaderboard database.
#[derive(Debug, Default)]
pub struct MockStore {
    data: Arc<RwLock<MockData>>,
    calls: Mutex<HashMap<&'static str, usize>>,
    failing: AtomicBool,
}

impl MockStore {
    pub fn new() -> Self {
        Self::default()
    }

    // === Seeding ===

    pub fn insert_guild(&self, guild: GuildRow) -> GuildboardResult<()> {
        write_lock(&self.data)?.guilds.insert(guild.id.clone(), guild);
        Ok(())
    }

    pub fn set_position_change(&self, guild_id: &str, change: i32) -> GuildboardResult<()> {
        write_lock(&self.data)?
            .position_changes
            .insert(guild_id.to_string(), change);
        Ok(())
    }

    pub fn set_discord(&self, guild_id: &str, invite: &str) -> GuildboardResult<()> {
        write_lock(&self.data)?
            .discords
            .insert(guild_id.to_string(), invite.to_string());
        Ok(())
    }

    pub fn push_guild_metric(&self, guild_id: &str, row: GuildMetricRow) -> GuildboardResult<()> {
        write_lock(&self.data)?
            .guild_metrics
            .entry(guild_id.to_string())
            .or_default()
            .push(row);
        Ok(())
    }

    pub fn insert_player(&self, player: PlayerRow) -> GuildboardResult<()> {
        write_lock(&self.data)?
            .players
            .insert(player.uuid.clone(), player);
        Ok(())
    }

    pub fn set_player_guild(&self, uuid: &str, guild: PlayerGuildRow) -> GuildboardResult<()> {
        write_lock(&self.data)?
            .player_guilds
            .insert(uuid.to_string(), guild);
        Ok(())
    }

    pub fn push_player_metric(&self, row: PlayerMetricRow) -> GuildboardResult<()> {
        write_lock(&self.data)?
            .player_metrics
            .entry(row.uuid.clone())
            .or_default()
            .push(row);
        Ok(())
    }

    pub fn push_history(&self, event: HistoryEvent) -> GuildboardResult<()> {
        write_lock(&self.data)?.history.push(event);
        Ok(())
    }

    pub fn push_ranking(&self, row: PlayerRankingRow) -> GuildboardResult<()> {
        write_lock(&self.data)?.rankings.push(row);
        Ok(())
    }

    /// Clear all stored data and call counts.
    pub fn clear(&self) -> GuildboardResult<()> {
        *write_lock(&self.data)? = MockData::default();
        self.reset_calls();
        Ok(())
    }

    // === Inspection ===

    /// Make every subsequent operation fail with an unavailable error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    /// Number of calls to one operation, e.g. `"load_guild_by_id"`.
    pub fn calls(&self, operation: &str) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.get(operation).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls
            .lock()
            .map(|calls| calls.values().sum())
            .unwrap_or(0)
    }

    pub fn reset_calls(&self) {
        if let Ok(mut calls) = self.calls.lock() {
            calls.clear();
        }
    }

    fn record(&self, operation: &'static str) -> GuildboardResult<()> {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(operation).or_insert(0) += 1;
        }
        if self.failing.load(Ordering::SeqCst) {
            return Err(GuildboardError::unavailable(
                MOCK_SOURCE,
                format!("{operation} failed (injected)"),
            ));
        }
        Ok(())
    }
}

#[async_trait]
impl LeaderboardStore for MockStore {
    async fn load_guild_summaries(&self) -> GuildboardResult<Vec<GuildSummaryRow>> {
        self.record("load_guild_summaries")?;
        let data = read_lock(&self.data)?;
        let mut rows: Vec<GuildSummaryRow> = data
            .guilds
            .values()
            .map(|guild| GuildSummaryRow {
                id: guild.id.clone(),
                name: guild.name.clone(),
                member_count: u32::try_from(guild.member_uuids.len()).unwrap_or(u32::MAX),
                scores: guild.scores.clone(),
                scammers: guild.scammers,
                position_change: data.position_changes.get(&guild.id).copied().unwrap_or(0),
                captured_at: guild.captured_at,
            })
            .collect();
        rows.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(rows)
    }

    async fn load_guild_by_id(&self, guild_id: &str) -> GuildboardResult<Option<GuildRow>> {
        self.record("load_guild_by_id")?;
        Ok(read_lock(&self.data)?.guilds.get(guild_id).cloned())
    }

    async fn load_guild_by_name(&self, name: &str) -> GuildboardResult<Option<GuildRow>> {
        self.record("load_guild_by_name")?;
        Ok(read_lock(&self.data)?
            .guilds
            .values()
            .find(|guild| guild.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn load_players(&self, uuids: &[String]) -> GuildboardResult<Vec<PlayerRow>> {
        self.record("load_players")?;
        let data = read_lock(&self.data)?;
        Ok(uuids
            .iter()
            .filter_map(|uuid| data.players.get(uuid).cloned())
            .collect())
    }

    async fn load_guild_discord(&self, guild_id: &str) -> GuildboardResult<Option<String>> {
        self.record("load_guild_discord")?;
        Ok(read_lock(&self.data)?.discords.get(guild_id).cloned())
    }

    async fn load_guild_metrics(&self, guild_id: &str) -> GuildboardResult<Vec<GuildMetricRow>> {
        self.record("load_guild_metrics")?;
        let mut rows = read_lock(&self.data)?
            .guild_metrics
            .get(guild_id)
            .cloned()
            .unwrap_or_default();
        rows.sort_by_key(|row| row.captured_at);
        Ok(rows)
    }

    async fn load_autocomplete(&self) -> GuildboardResult<Vec<AutocompleteEntry>> {
        self.record("load_autocomplete")?;
        let mut entries: Vec<AutocompleteEntry> = read_lock(&self.data)?
            .guilds
            .values()
            .map(|guild| AutocompleteEntry {
                id: guild.id.clone(),
                name: guild.name.clone(),
            })
            .collect();
        entries.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(entries)
    }

    async fn load_sitemap_links(&self) -> GuildboardResult<SitemapLinks> {
        self.record("load_sitemap_links")?;
        let data = read_lock(&self.data)?;
        let mut guilds: Vec<String> = data.guilds.values().map(|g| g.name.clone()).collect();
        let mut players: Vec<String> = data.players.values().map(|p| p.name.clone()).collect();
        guilds.sort();
        players.sort();
        Ok(SitemapLinks { guilds, players })
    }

    async fn load_player_by_uuid(&self, uuid: &str) -> GuildboardResult<Option<PlayerRow>> {
        self.record("load_player_by_uuid")?;
        Ok(read_lock(&self.data)?.players.get(uuid).cloned())
    }

    async fn load_player_by_name(&self, name: &str) -> GuildboardResult<Option<PlayerRow>> {
        self.record("load_player_by_name")?;
        Ok(read_lock(&self.data)?
            .players
            .values()
            .find(|player| player.name.eq_ignore_ascii_case(name))
            .cloned())
    }

    async fn load_player_guild(&self, uuid: &str) -> GuildboardResult<Option<PlayerGuildRow>> {
        self.record("load_player_guild")?;
        Ok(read_lock(&self.data)?.player_guilds.get(uuid).cloned())
    }

    async fn load_player_metrics(&self, uuid: &str) -> GuildboardResult<Vec<PlayerMetricRow>> {
        self.record("load_player_metrics")?;
        let mut rows = read_lock(&self.data)?
            .player_metrics
            .get(uuid)
            .cloned()
            .unwrap_or_default();
        rows.sort_by_key(|row| row.captured_at);
        Ok(rows)
    }

    async fn load_history_page(
        &self,
        filter: &HistoryFilter,
        page: PageRequest,
    ) -> GuildboardResult<(Vec<HistoryEvent>, u64)> {
        self.record("load_history_page")?;
        let mut matching: Vec<HistoryEvent> = read_lock(&self.data)?
            .history
            .iter()
            .filter(|event| match filter {
                HistoryFilter::Guild(guild_id) => event.guild_id == *guild_id,
                HistoryFilter::Player(uuid) => event.player_uuid == *uuid,
            })
            .cloned()
            .collect();
        // Stable sort keeps insertion order within one capture.
        matching.sort_by(|a, b| b.captured_at.cmp(&a.captured_at));

        let total = matching.len() as u64;
        Ok((page_window(matching, page), total))
    }

    async fn load_ranking_page(
        &self,
        query: &RankingQuery,
    ) -> GuildboardResult<(Vec<PlayerRankingRow>, u64)> {
        self.record("load_ranking_page")?;
        let mut matching: Vec<PlayerRankingRow> = read_lock(&self.data)?
            .rankings
            .iter()
            .filter(|row| query.matches_name(&row.name))
            .cloned()
            .collect();

        let field = query.sort_field;
        matching.sort_by(|a, b| {
            let a = a.sort_value(field).unwrap_or(f64::NEG_INFINITY);
            let b = b.sort_value(field).unwrap_or(f64::NEG_INFINITY);
            let ascending = a.partial_cmp(&b).unwrap_or(CmpOrdering::Equal);
            if query.reverse {
                ascending
            } else {
                ascending.reverse()
            }
        });

        let total = matching.len() as u64;
        Ok((page_window(matching, query.page), total))
    }
}

/// Patron source returning a fixed count.
#[derive(Debug, Default)]
pub struct MockPatronSource {
    count: AtomicU64,
    calls: AtomicUsize,
    failing: AtomicBool,
}

impl MockPatronSource {
    pub fn new(count: u64) -> Self {
        Self {
            count: AtomicU64::new(count),
            ..Default::default()
        }
    }

    pub fn set_count(&self, count: u64) {
        self.count.store(count, Ordering::SeqCst);
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl PatronSource for MockPatronSource {
    async fn patron_count(&self) -> GuildboardResult<u64> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.failing.load(Ordering::SeqCst) {
            return Err(GuildboardError::unavailable("patron-source", "unreachable (injected)"));
        }
        Ok(self.count.load(Ordering::SeqCst))
    }
}
