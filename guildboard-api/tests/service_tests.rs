//! Integration Tests for the Cached Leaderboard Service
//!
//! Drives [`LeaderboardService`] against the in-memory mock store with a
//! manual clock, asserting on store call counts to observe cache behavior.

use std::sync::Arc;

use guildboard_api::{LeaderboardService, ServiceConfig};
use guildboard_core::{multiplier, CacheTtls, HistoryKind, HistoryPage, QueryError};
use guildboard_test_utils::assertions::{assert_kinds, assert_query_error, assert_transient};
use guildboard_test_utils::fixtures::*;
use guildboard_test_utils::{Clock, ManualClock, MockPatronSource, MockStore, PlayerGuildRow};

// ============================================================================
// TEST HARNESS
// ============================================================================

struct Harness {
    store: Arc<MockStore>,
    patrons: Arc<MockPatronSource>,
    clock: Arc<ManualClock>,
    service: Arc<LeaderboardService>,
}

impl Harness {
    fn new() -> Self {
        Self::with_config(ServiceConfig::default())
    }

    fn with_config(config: ServiceConfig) -> Self {
        let clock = Arc::new(ManualClock::new(fixed_now()));
        let store = Arc::new(seeded_store(clock.now()).expect("seed store"));
        let patrons = Arc::new(MockPatronSource::new(42));
        let service = Arc::new(LeaderboardService::new(
            store.clone(),
            patrons.clone(),
            &config,
            clock.clone(),
        ));
        Self {
            store,
            patrons,
            clock,
            service,
        }
    }
}

// ============================================================================
// GUILD LOOKUPS
// ============================================================================

#[tokio::test]
async fn test_second_lookup_within_ttl_hits_cache() {
    let h = Harness::new();

    let first = h.service.get_one(LUCID_ID).await.unwrap().unwrap();
    h.clock.advance_secs(59);
    let second = h.service.get_one(LUCID_ID).await.unwrap().unwrap();

    assert_eq!(first, second);
    assert_eq!(h.store.calls("load_guild_by_id"), 1);
    assert_eq!(h.store.calls("load_players"), 1);
}

#[tokio::test]
async fn test_lookup_after_ttl_reloads() {
    let h = Harness::new();
    h.service.get_one(LUCID_ID).await.unwrap();

    let renamed = guild_row(LUCID_ID, "Lucid Dreams", &[DEMO_UUID], h.clock.now());
    h.store.insert_guild(renamed).unwrap();
    h.clock.advance_secs(61);

    let reloaded = h.service.get_one(LUCID_ID).await.unwrap().unwrap();
    assert_eq!(reloaded.name, "Lucid Dreams");
    assert_eq!(h.store.calls("load_guild_by_id"), 2);

    // The new name is an alias of the refreshed record.
    let calls = h.store.total_calls();
    let by_new_name = h.service.get_one("lucid dreams").await.unwrap().unwrap();
    assert_eq!(by_new_name.id, LUCID_ID);
    assert_eq!(h.store.total_calls(), calls);
}

#[tokio::test]
async fn test_name_lookup_populates_id_alias() {
    let h = Harness::new();

    let by_name = h.service.get_one("LUCID").await.unwrap().unwrap();
    assert_eq!(h.store.calls("load_guild_by_name"), 1);
    assert_eq!(h.store.calls("load_guild_by_id"), 0);

    let calls = h.store.total_calls();
    let by_id = h.service.get_one(LUCID_ID).await.unwrap().unwrap();
    assert!(Arc::ptr_eq(&by_name, &by_id));
    assert_eq!(h.store.total_calls(), calls);
}

#[tokio::test]
async fn test_guild_record_uses_resolved_member_count() {
    let h = Harness::new();
    let guild = h.service.get_one(LUCID_ID).await.unwrap().unwrap();

    // Three uuids are listed, two resolve to player snapshots.
    assert_eq!(guild.members.len(), 2);
    assert_eq!(guild.member_count, 2);
    assert_eq!(guild.multiplier, multiplier(2));
    assert_eq!(guild.discord.as_deref(), Some(LUCID_DISCORD));
    assert_eq!(guild.age_seconds, 3600);
}

#[tokio::test]
async fn test_unknown_guild_is_not_cached() {
    let h = Harness::new();

    assert!(h.service.get_one("nobody").await.unwrap().is_none());
    assert_eq!(h.store.calls("load_guild_by_name"), 1);
    assert_eq!(h.store.calls("load_guild_by_id"), 1);

    assert!(h.service.get_one("nobody").await.unwrap().is_none());
    assert_eq!(h.store.calls("load_guild_by_name"), 2);
}

#[tokio::test]
async fn test_id_shaped_key_tries_id_first() {
    let h = Harness::new();
    let unknown_id = "aaaaaaaaaaaaaaaaaaaaaaaa";

    assert!(h.service.get_one(unknown_id).await.unwrap().is_none());
    assert_eq!(h.store.calls("load_guild_by_id"), 1);
    assert_eq!(h.store.calls("load_guild_by_name"), 1);
}

#[tokio::test]
async fn test_blank_key_skips_store() {
    let h = Harness::new();
    assert!(h.service.get_one("   ").await.unwrap().is_none());
    assert!(h.service.get_player("").await.unwrap().is_none());
    assert_eq!(h.store.total_calls(), 0);
}

#[tokio::test]
async fn test_all_guilds_view_is_cached() {
    let h = Harness::new();

    let guilds = h.service.get_all().await.unwrap();
    assert_eq!(guilds.len(), 1);
    assert_eq!(guilds[0].members, 3);
    assert_eq!(guilds[0].multiplier, multiplier(3));

    h.service.get_all().await.unwrap();
    assert_eq!(h.store.calls("load_guild_summaries"), 1);

    h.clock.advance_secs(61);
    h.service.get_all().await.unwrap();
    assert_eq!(h.store.calls("load_guild_summaries"), 2);
}

#[tokio::test]
async fn test_guild_metrics_are_weighted() {
    let h = Harness::new();

    let series = h.service.get_metrics_series(LUCID_ID).await.unwrap().unwrap();
    assert_eq!(series.guild_id, LUCID_ID);
    assert_eq!(series.samples.len(), 2);

    let expected = (4_000.0 * multiplier(3) * 100.0).round() / 100.0;
    assert_eq!(series.samples[0].scores.senither_weight, Some(expected));

    assert!(h
        .service
        .get_metrics_series("bbbbbbbbbbbbbbbbbbbbbbbb")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_concurrent_lookups_share_one_service() {
    let h = Harness::new();

    let mut handles = Vec::new();
    for _ in 0..16 {
        let service = Arc::clone(&h.service);
        handles.push(tokio::spawn(async move { service.get_one(LUCID_ID).await }));
    }
    for handle in handles {
        let guild = handle.await.unwrap().unwrap().unwrap();
        assert_eq!(guild.id, LUCID_ID);
    }

    // No single-flight: concurrent misses may each load, but never more
    // than once per request.
    let loads = h.store.calls("load_guild_by_id");
    assert!((1..=16).contains(&loads));
}

// ============================================================================
// REFRESH FAILURES
// ============================================================================

#[tokio::test]
async fn test_strict_refresh_failure_surfaces() {
    let h = Harness::new();
    h.service.get_one(LUCID_ID).await.unwrap();

    h.clock.advance_secs(61);
    h.store.set_failing(true);

    let result = h.service.get_one(LUCID_ID).await;
    assert_transient(&result);
}

#[tokio::test]
async fn test_tolerant_refresh_failure_serves_previous_value() {
    let h = Harness::with_config(ServiceConfig::default().with_serve_stale_on_error(true));
    let before = h.service.get_one(LUCID_ID).await.unwrap().unwrap();

    h.clock.advance_secs(61);
    h.store.set_failing(true);

    let after = h.service.get_one(LUCID_ID).await.unwrap().unwrap();
    assert_eq!(before, after);

    let stats = h.service.cache_stats().await;
    assert_eq!(stats["guild"].refresh_failures, 1);
}

#[tokio::test]
async fn test_failure_without_previous_value_surfaces_even_when_tolerant() {
    let h = Harness::with_config(ServiceConfig::default().with_serve_stale_on_error(true));
    h.store.set_failing(true);
    assert_transient(&h.service.get_one(LUCID_ID).await);
}

// ============================================================================
// SWEEP
// ============================================================================

#[tokio::test]
async fn test_sweep_evicts_only_expired_entries() {
    let h = Harness::new();

    h.service.get_one(LUCID_ID).await.unwrap();
    h.clock.advance_secs(50);
    h.service.get_player(DEMO_UUID).await.unwrap();
    h.clock.advance_secs(20);

    let report = h.service.sweep().await;
    assert_eq!(report.evicted_from("guild"), 2);
    assert_eq!(report.evicted_from("player"), 0);
    assert_eq!(report.total(), 2);

    let stats = h.service.cache_stats().await;
    assert_eq!(stats["guild"].entry_count, 0);
    assert_eq!(stats["player"].entry_count, 2);

    // Evicted guild loads again; surviving player does not.
    let calls = h.store.calls("load_player_by_uuid");
    h.service.get_one(LUCID_ID).await.unwrap();
    h.service.get_player(DEMO_UUID).await.unwrap();
    assert_eq!(h.store.calls("load_guild_by_id"), 2);
    assert_eq!(h.store.calls("load_player_by_uuid"), calls);
}

#[tokio::test]
async fn test_invalidate_drops_all_aliases() {
    let h = Harness::new();
    h.service.get_one(LUCID_NAME).await.unwrap();

    assert_eq!(h.service.invalidate_guild(LUCID_ID).await, 2);
    let stats = h.service.cache_stats().await;
    assert_eq!(stats["guild"].entry_count, 0);
}

// ============================================================================
// PLAYERS
// ============================================================================

#[tokio::test]
async fn test_player_lookup_by_name_and_uuid_share_entry() {
    let h = Harness::new();

    let by_name = h.service.get_player("demoplayer").await.unwrap().unwrap();
    assert_eq!(by_name.uuid, DEMO_UUID);
    assert_eq!(by_name.guild_name.as_deref(), Some(LUCID_NAME));

    let calls = h.store.total_calls();
    h.service.get_player(DEMO_UUID).await.unwrap().unwrap();
    assert_eq!(h.store.total_calls(), calls);
}

#[tokio::test]
async fn test_player_guild_dropped_after_25_hours() {
    let h = Harness::new();
    h.store
        .set_player_guild(
            DEMO_UUID,
            PlayerGuildRow {
                guild_id: LUCID_ID.to_string(),
                guild_name: LUCID_NAME.to_string(),
                captured_at: hours_before(h.clock.now(), 26),
            },
        )
        .unwrap();

    let player = h.service.get_player(DEMO_UUID).await.unwrap().unwrap();
    assert_eq!(player.guild_name, None);
}

#[tokio::test]
async fn test_player_metrics_by_name_resolve_uuid() {
    let h = Harness::new();

    let series = h.service.get_player_metrics("DemoPlayer").await.unwrap().unwrap();
    assert_eq!(series.uuid, DEMO_UUID);
    assert_eq!(series.samples.len(), 2);
    assert_eq!(h.store.calls("load_player_by_name"), 1);

    let calls = h.store.total_calls();
    h.service.get_player_metrics(DEMO_UUID).await.unwrap().unwrap();
    assert_eq!(h.store.total_calls(), calls);

    assert!(h.service.get_player_metrics("ghost").await.unwrap().is_none());
}

#[tokio::test]
async fn test_renamed_player_metrics_cached_under_current_name() {
    let h = Harness::new();
    let uuid = "2e0c7b4a9d8f6e5c4b3a29180f7e6d5c";
    let now = h.clock.now();
    h.store
        .insert_player(player_row(uuid, "NewName", hours_before(now, 1)))
        .unwrap();
    h.store
        .push_player_metric(player_metric_row(uuid, "OldName", hours_before(now, 48)))
        .unwrap();
    h.store
        .push_player_metric(player_metric_row(uuid, "NewName", hours_before(now, 1)))
        .unwrap();

    let series = h.service.get_player_metrics("NewName").await.unwrap().unwrap();
    assert_eq!(series.name, "NewName");
    assert_eq!(series.samples.len(), 2);

    h.clock.advance_secs(30);
    h.service.get_player_metrics("NewName").await.unwrap().unwrap();
    assert_eq!(h.store.calls("load_player_metrics"), 1);
}

// ============================================================================
// HISTORY
// ============================================================================

fn seed_history(h: &Harness) {
    // Oldest first: join, join, leave, leave, join
    let kinds = [
        HistoryKind::Joined,
        HistoryKind::Joined,
        HistoryKind::Left,
        HistoryKind::Left,
        HistoryKind::Joined,
    ];
    for (i, kind) in kinds.into_iter().enumerate() {
        let captured_at = hours_before(h.clock.now(), 10 - i as i64);
        h.store
            .push_history(history_event(kind, DEMO_UUID, LUCID_ID, captured_at))
            .unwrap();
    }
}

#[tokio::test]
async fn test_player_history_is_reordered() {
    let h = Harness::new();
    seed_history(&h);

    let page = h
        .service
        .get_history_page(None, Some(DEMO_UUID), 1, 10)
        .await
        .unwrap();

    assert!(matches!(page, HistoryPage::Player(_)));
    assert_eq!(page.total(), 5);
    assert_kinds(
        &page.kinds(),
        &[
            HistoryKind::Joined,
            HistoryKind::Left,
            HistoryKind::Joined,
            HistoryKind::Left,
            HistoryKind::Joined,
        ],
    );
}

#[tokio::test]
async fn test_guild_history_keeps_store_order() {
    let h = Harness::new();
    seed_history(&h);

    let page = h
        .service
        .get_history_page(Some(LUCID_ID), None, 1, 10)
        .await
        .unwrap();

    assert!(matches!(page, HistoryPage::Guild(_)));
    assert_kinds(
        &page.kinds(),
        &[
            HistoryKind::Joined,
            HistoryKind::Left,
            HistoryKind::Left,
            HistoryKind::Joined,
            HistoryKind::Joined,
        ],
    );
}

#[tokio::test]
async fn test_history_page_serializes_with_paginate_block() {
    let h = Harness::new();
    seed_history(&h);

    let page = h
        .service
        .get_history_page(None, Some(DEMO_UUID), 1, 2)
        .await
        .unwrap();
    let json = serde_json::to_value(&page).unwrap();

    assert_eq!(json["paginate"]["current_page"], 1);
    assert_eq!(json["paginate"]["last_page"], 3);
    assert_eq!(json["paginate"]["total"], 5);
    assert_eq!(json["data"].as_array().unwrap().len(), 2);
    assert_eq!(json["data"][0]["type"], "joined");
    assert_eq!(json["data"][0]["guild_id"], LUCID_ID);
}

#[tokio::test]
async fn test_history_paging_clamps_and_windows() {
    let h = Harness::new();
    for i in 0..25 {
        let kind = if i % 2 == 0 {
            HistoryKind::Joined
        } else {
            HistoryKind::Left
        };
        let captured_at = hours_before(h.clock.now(), 100 - i);
        h.store
            .push_history(history_event(kind, SECOND_UUID, LUCID_ID, captured_at))
            .unwrap();
    }

    let page = h
        .service
        .get_history_page(Some(LUCID_ID), None, 3, 10)
        .await
        .unwrap();
    assert_eq!(page.len(), 5);
    assert_eq!(page.total(), 25);

    let HistoryPage::Guild(clamped) = h
        .service
        .get_history_page(Some(LUCID_ID), None, 0, 0)
        .await
        .unwrap()
    else {
        panic!("expected a guild page");
    };
    assert_eq!(clamped.paginate.current_page, 1);
    assert_eq!(clamped.paginate.last_page, 3);
    assert_eq!(clamped.data.len(), 10);
}

#[tokio::test]
async fn test_history_requires_exactly_one_filter() {
    let h = Harness::new();

    let both = h
        .service
        .get_history_page(Some(LUCID_ID), Some(DEMO_UUID), 1, 10)
        .await;
    assert_query_error(&both, QueryError::ConflictingFilters);

    let neither = h.service.get_history_page(None, Some("  "), 1, 10).await;
    assert_query_error(&neither, QueryError::MissingFilter);

    assert_eq!(h.store.calls("load_history_page"), 0);
}

// ============================================================================
// RANKING
// ============================================================================

fn seed_ranking(h: &Harness) {
    for i in 0..30 {
        let uuid = format!("{:032x}", i + 1);
        let name = if i < 3 {
            format!("Dev{}", i)
        } else {
            format!("Player{}", i)
        };
        h.store
            .push_ranking(ranking_row(&uuid, &name, Some(1_000.0 + i as f64)))
            .unwrap();
    }
}

#[tokio::test]
async fn test_invalid_sort_field_fails_before_query() {
    let h = Harness::new();
    let result = h
        .service
        .get_player_ranking_page("latest_password", false, 1, None)
        .await;

    assert_query_error(
        &result,
        QueryError::InvalidSortField {
            field: "latest_password".to_string(),
        },
    );
    assert_eq!(h.store.calls("load_ranking_page"), 0);
}

#[tokio::test]
async fn test_ranking_pages_are_fixed_size_and_sorted() {
    let h = Harness::new();
    seed_ranking(&h);

    let first = h
        .service
        .get_player_ranking_page("latest_senither", false, 1, None)
        .await
        .unwrap();
    assert_eq!(first.data.len(), 25);
    assert_eq!(first.paginate.total, 30);
    assert_eq!(first.paginate.last_page, 2);
    assert_eq!(first.data[0].latest_senither, Some(1_029.0));

    let second = h
        .service
        .get_player_ranking_page("latest_senither", false, 2, None)
        .await
        .unwrap();
    assert_eq!(second.data.len(), 5);

    let reversed = h
        .service
        .get_player_ranking_page("latest_lily", true, 1, None)
        .await
        .unwrap();
    assert_eq!(reversed.data[0].name, "Dev0");
}

#[tokio::test]
async fn test_ranking_prefix_filter_is_case_insensitive() {
    let h = Harness::new();
    seed_ranking(&h);

    let page = h
        .service
        .get_player_ranking_page("latest_senither", false, 1, Some("dev"))
        .await
        .unwrap();
    assert_eq!(page.paginate.total, 3);
    assert!(page.data.iter().all(|row| row.name.starts_with("Dev")));
}

// ============================================================================
// STATS AND AUTOCOMPLETE
// ============================================================================

#[tokio::test]
async fn test_stats_cache_patron_count() {
    let h = Harness::new();

    let stats = h.service.get_stats().await.unwrap();
    assert_eq!(stats.guilds_tracked, 1);
    assert_eq!(stats.players_tracked, 3);
    assert_eq!(stats.patrons, Some(42));
    assert_eq!(stats.top_guilds.len(), 1);

    h.patrons.set_count(50);
    h.clock.advance_secs(600);
    let stats = h.service.get_stats().await.unwrap();
    assert_eq!(stats.patrons, Some(42));
    assert_eq!(h.patrons.calls(), 1);

    h.clock.advance_secs(3_001);
    let stats = h.service.get_stats().await.unwrap();
    assert_eq!(stats.patrons, Some(50));
    assert_eq!(h.patrons.calls(), 2);
}

#[tokio::test]
async fn test_stats_survive_patron_failure() {
    let h = Harness::new();
    h.patrons.set_failing(true);

    let stats = h.service.get_stats().await.unwrap();
    assert_eq!(stats.patrons, None);
    assert_eq!(stats.guilds_tracked, 1);
}

#[tokio::test]
async fn test_stats_rank_top_three_guilds() {
    let h = Harness::new();
    let now = h.clock.now();
    for (id, weight) in [
        ("aaaaaaaaaaaaaaaaaaaaaaa1", 9_000.0),
        ("aaaaaaaaaaaaaaaaaaaaaaa2", 1_000.0),
        ("aaaaaaaaaaaaaaaaaaaaaaa3", 7_000.0),
    ] {
        let mut row = guild_row(id, id, &[DEMO_UUID, SECOND_UUID, UNKNOWN_MEMBER_UUID], now);
        row.scores.senither_weight = Some(weight);
        h.store.insert_guild(row).unwrap();
    }

    let stats = h.service.get_stats().await.unwrap();
    let top: Vec<&str> = stats.top_guilds.iter().map(|g| g.id.as_str()).collect();
    assert_eq!(
        top,
        vec!["aaaaaaaaaaaaaaaaaaaaaaa1", "aaaaaaaaaaaaaaaaaaaaaaa3", LUCID_ID]
    );
}

#[tokio::test]
async fn test_autocomplete_uses_long_ttl() {
    let h = Harness::new();

    let entries = h.service.get_autocomplete().await.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].name, LUCID_NAME);

    h.clock.advance_secs(300);
    h.service.get_autocomplete().await.unwrap();
    assert_eq!(h.store.calls("load_autocomplete"), 1);

    h.clock.advance_secs(301);
    h.service.get_autocomplete().await.unwrap();
    assert_eq!(h.store.calls("load_autocomplete"), 2);
}

#[tokio::test]
async fn test_sitemap_cached_for_an_hour() {
    let h = Harness::new();

    let links = h.service.get_sitemap().await.unwrap();
    assert_eq!(links.guilds, vec![LUCID_NAME]);
    assert_eq!(links.players, vec![DEMO_NAME, SECOND_NAME]);

    h.clock.advance_secs(3599);
    h.service.get_sitemap().await.unwrap();
    assert_eq!(h.store.calls("load_sitemap_links"), 1);

    h.clock.advance_secs(2);
    h.service.get_sitemap().await.unwrap();
    assert_eq!(h.store.calls("load_sitemap_links"), 2);

    let stats = h.service.cache_stats().await;
    assert_eq!(stats["sitemap"].entry_count, 1);
}

#[tokio::test]
async fn test_custom_ttls_apply_per_namespace() {
    let ttls = CacheTtls::new().with_record_ttl(std::time::Duration::from_secs(5));
    let h = Harness::with_config(ServiceConfig::default().with_ttls(ttls));

    h.service.get_one(LUCID_ID).await.unwrap();
    h.clock.advance_secs(6);
    h.service.get_one(LUCID_ID).await.unwrap();
    assert_eq!(h.store.calls("load_guild_by_id"), 2);
}
