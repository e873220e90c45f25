//! Guildboard Test Utilities
//!
//! Shared test infrastructure for the Guildboard workspace:
//! - Fixtures: a fixed clock instant, ready-made rows and a seeded mock store
//! - Proptest generators for ids, names, scores and history kinds
//! - Assertions for error classification
//!
//! # Example
//!
//! ```ignore
//! use guildboard_test_utils::fixtures::{seeded_store, fixed_now, LUCID_ID};
//!
//! let store = seeded_store(fixed_now())?;
//! assert!(store.load_guild_by_id(LUCID_ID).await?.is_some());
//! ```

// Re-export mocks from their source crate
pub use guildboard_storage::{
    Clock, Freshness, LeaderboardStore, ManualClock, MockPatronSource, MockStore, PatronSource,
    SharedClock,
};

// Re-export core types for convenience
pub use guildboard_core::{
    is_guild_id, is_player_uuid, CacheKey, GuildMetricRow, GuildRow, GuildScores,
    GuildboardError, GuildboardResult, HistoryEvent, HistoryKind, PlayerGuildRow,
    PlayerMetricRow, PlayerRankingRow, PlayerRow, PlayerScores, QueryError, RankingSortField,
    Timestamp,
};

// ============================================================================
// FIXTURES
// ============================================================================

/// Ready-made rows and a seeded mock store.
pub mod fixtures {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    /// Guild id of the seeded "Lucid" guild.
    pub const LUCID_ID: &str = "5ff8ed8f8ea8c9724b8fb5a2";
    pub const LUCID_NAME: &str = "Lucid";
    pub const LUCID_DISCORD: &str = "https://discord.gg/lucid";

    /// Members of Lucid. `DEMO_UUID` is the only one with a metric history.
    pub const DEMO_UUID: &str = "0c8a5f2e7b6d4e1a9f3c2b1a0d9e8f7c";
    pub const DEMO_NAME: &str = "DemoPlayer";
    pub const SECOND_UUID: &str = "1d9b6a3f8c7e5f2b0a4d3c2b1e0f9a8d";
    pub const SECOND_NAME: &str = "Second";

    /// Listed in the guild but never snapshotted as a player.
    pub const UNKNOWN_MEMBER_UUID: &str = "ffffffffffffffffffffffffffffffff";

    /// A fixed reference instant: 2024-01-01T00:00:00Z.
    pub fn fixed_now() -> Timestamp {
        Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    pub fn hours_before(now: Timestamp, hours: i64) -> Timestamp {
        now - Duration::hours(hours)
    }

    pub fn guild_scores() -> GuildScores {
        GuildScores {
            senither_weight: Some(4_000.0),
            lily_weight: Some(3_500.0),
            skills: Some(38.5),
            catacombs: Some(31.2),
            slayer: Some(1_250_000.0),
        }
    }

    pub fn player_scores() -> PlayerScores {
        PlayerScores {
            senither_weight: Some(5_200.0),
            lily_weight: Some(4_100.0),
            average_skill: Some(42.0),
            catacombs: Some(35.0),
            total_slayer: Some(2_000_000.0),
        }
    }

    pub fn guild_row(id: &str, name: &str, members: &[&str], captured_at: Timestamp) -> GuildRow {
        GuildRow {
            id: id.to_string(),
            name: name.to_string(),
            member_uuids: members.iter().map(|uuid| uuid.to_string()).collect(),
            scores: guild_scores(),
            scammers: 0,
            captured_at,
        }
    }

    pub fn player_row(uuid: &str, name: &str, captured_at: Timestamp) -> PlayerRow {
        PlayerRow {
            uuid: uuid.to_string(),
            name: name.to_string(),
            scores: player_scores(),
            scam_reason: None,
            captured_at,
        }
    }

    pub fn player_metric_row(uuid: &str, name: &str, captured_at: Timestamp) -> PlayerMetricRow {
        PlayerMetricRow {
            uuid: uuid.to_string(),
            name: name.to_string(),
            scores: player_scores(),
            captured_at,
        }
    }

    pub fn guild_metric_row(member_count: u32, captured_at: Timestamp) -> GuildMetricRow {
        GuildMetricRow {
            scores: guild_scores(),
            member_count,
            captured_at,
        }
    }

    pub fn history_event(
        kind: HistoryKind,
        player_uuid: &str,
        guild_id: &str,
        captured_at: Timestamp,
    ) -> HistoryEvent {
        HistoryEvent {
            kind,
            player_uuid: player_uuid.to_string(),
            player_name: format!("player-{}", &player_uuid[..player_uuid.len().min(6)]),
            guild_id: guild_id.to_string(),
            guild_name: format!("guild-{}", &guild_id[..guild_id.len().min(6)]),
            captured_at,
        }
    }

    pub fn ranking_row(uuid: &str, name: &str, senither: Option<f64>) -> PlayerRankingRow {
        PlayerRankingRow {
            uuid: uuid.to_string(),
            name: name.to_string(),
            latest_senither: senither,
            latest_lily: senither.map(|w| w * 0.8),
            latest_nw: None,
            latest_sb_xp: None,
            latest_slayer: None,
            latest_cata: None,
            latest_asl: None,
        }
    }

    /// A store holding Lucid, two of its three listed members, a discord
    /// link, two guild metric samples and a metric history for the demo
    /// player.
    pub fn seeded_store(now: Timestamp) -> GuildboardResult<MockStore> {
        let store = MockStore::new();
        let captured = hours_before(now, 1);

        store.insert_guild(guild_row(
            LUCID_ID,
            LUCID_NAME,
            &[DEMO_UUID, SECOND_UUID, UNKNOWN_MEMBER_UUID],
            captured,
        ))?;
        store.set_discord(LUCID_ID, LUCID_DISCORD)?;
        store.push_guild_metric(LUCID_ID, guild_metric_row(3, hours_before(now, 48)))?;
        store.push_guild_metric(LUCID_ID, guild_metric_row(3, captured))?;

        store.insert_player(player_row(DEMO_UUID, DEMO_NAME, captured))?;
        store.insert_player(player_row(SECOND_UUID, SECOND_NAME, captured))?;
        store.set_player_guild(
            DEMO_UUID,
            PlayerGuildRow {
                guild_id: LUCID_ID.to_string(),
                guild_name: LUCID_NAME.to_string(),
                captured_at: captured,
            },
        )?;
        store.push_player_metric(player_metric_row(DEMO_UUID, DEMO_NAME, hours_before(now, 24)))?;
        store.push_player_metric(player_metric_row(DEMO_UUID, DEMO_NAME, captured))?;

        store.reset_calls();
        Ok(store)
    }
}

// ============================================================================
// GENERATORS
// ============================================================================

/// Proptest strategies for leaderboard values.
pub mod generators {
    use super::*;
    use proptest::prelude::*;

    pub fn arb_guild_id() -> impl Strategy<Value = String> {
        "[0-9a-f]{24}"
    }

    pub fn arb_player_uuid() -> impl Strategy<Value = String> {
        "[0-9a-f]{32}"
    }

    /// Display names that can never be mistaken for an id.
    pub fn arb_display_name() -> impl Strategy<Value = String> {
        "[A-Z][A-Za-z_ ]{2,15}"
    }

    pub fn arb_history_kind() -> impl Strategy<Value = HistoryKind> {
        prop_oneof![Just(HistoryKind::Joined), Just(HistoryKind::Left)]
    }

    pub fn arb_history_kinds(max_len: usize) -> impl Strategy<Value = Vec<HistoryKind>> {
        prop::collection::vec(arb_history_kind(), 0..=max_len)
    }

    pub fn arb_member_count() -> impl Strategy<Value = u32> {
        0u32..=300
    }

    fn arb_weight() -> impl Strategy<Value = Option<f64>> {
        prop::option::of(0.0f64..20_000.0)
    }

    pub fn arb_guild_scores() -> impl Strategy<Value = GuildScores> {
        (arb_weight(), arb_weight(), arb_weight(), arb_weight(), arb_weight()).prop_map(
            |(senither_weight, lily_weight, skills, catacombs, slayer)| GuildScores {
                senither_weight,
                lily_weight,
                skills,
                catacombs,
                slayer,
            },
        )
    }

    pub fn arb_page_params() -> impl Strategy<Value = (i64, i64)> {
        (-5i64..50, -5i64..100)
    }

    pub fn arb_sort_field() -> impl Strategy<Value = RankingSortField> {
        prop::sample::select(RankingSortField::ALL.to_vec())
    }
}

// ============================================================================
// ASSERTIONS
// ============================================================================

/// Assertion helpers for results.
pub mod assertions {
    use super::*;

    pub fn assert_transient<T: std::fmt::Debug>(result: &GuildboardResult<T>) {
        match result {
            Err(e) => assert!(e.is_transient(), "Expected transient error, got {:?}", e),
            Ok(v) => panic!("Expected transient error, got Ok({:?})", v),
        }
    }

    pub fn assert_query_error<T: std::fmt::Debug>(result: &GuildboardResult<T>, expected: QueryError) {
        match result {
            Err(GuildboardError::Query(actual)) => assert_eq!(actual, &expected),
            other => panic!("Expected query error {:?}, got {:?}", expected, other),
        }
    }

    pub fn assert_kinds(actual: &[HistoryKind], expected: &[HistoryKind]) {
        assert_eq!(actual, expected, "history order mismatch");
    }
}
