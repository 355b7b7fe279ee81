//! Reporting service integration tests
//!
//! Drives ReportingService::summary against a real SQLite database:
//! per-agent rollups, distinct session counts, zero-activity handling
//! and timeline bucketing. Date parsing edge cases are covered by the
//! service's unit tests; this file is about the SQL aggregation.

use std::sync::{Arc, Once};

use chrono::{DateTime, Utc};
use serde_json::json;

use reftracker::commission::CommissionPlan;
use reftracker::config::init_config;
use reftracker::services::{Granularity, ReportingService};
use reftracker::storage::backend::SeaOrmStorage;
use reftracker::storage::{Agent, NewClick, NewConversion};

use tempfile::TempDir;

// =============================================================================
// Test Setup
// =============================================================================

static INIT: Once = Once::new();

fn init_test_config() {
    INIT.call_once(|| {
        init_config();
    });
}

async fn create_temp_storage() -> (Arc<SeaOrmStorage>, TempDir) {
    init_test_config();

    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let db_path = temp_dir.path().join("reporting_test.db");
    let db_url = format!("sqlite://{}?mode=rwc", db_path.display());

    let storage = Arc::new(
        SeaOrmStorage::new(&db_url, "sqlite")
            .await
            .expect("Failed to create storage"),
    );

    (storage, temp_dir)
}

async fn seed_agent(storage: &Arc<SeaOrmStorage>, code: &str, name: &str) -> Agent {
    storage
        .insert_agent(
            code,
            name,
            None,
            None,
            &CommissionPlan::Fixed { amount: 10000 },
        )
        .await
        .expect("Failed to seed agent")
}

async fn click(storage: &Arc<SeaOrmStorage>, agent_id: i64, session_code: &str) {
    storage
        .insert_click(&NewClick {
            agent_id,
            session_code: session_code.to_string(),
            ..Default::default()
        })
        .await
        .expect("Failed to insert click");
}

async fn convert(
    storage: &Arc<SeaOrmStorage>,
    agent_id: i64,
    session_code: &str,
    estimated_value: i64,
    commission_amount: i64,
) {
    storage
        .insert_conversion(&NewConversion {
            agent_id,
            session_code: session_code.to_string(),
            click_id: None,
            form_data: json!({"name": "Sato"}),
            estimated_value,
            commission_amount,
        })
        .await
        .expect("Failed to insert conversion");
}

/// Range wide enough to always contain rows created with `Utc::now()`.
fn wide_range() -> (DateTime<Utc>, DateTime<Utc>) {
    ReportingService::parse_date_range_strict(Some("2000-01-01"), Some("2099-01-01"))
        .expect("range should parse")
}

// =============================================================================
// Aggregation
// =============================================================================

#[tokio::test]
async fn test_summary_counts_clicks_and_distinct_sessions() {
    let (storage, _dir) = create_temp_storage().await;
    let agent = seed_agent(&storage, "Ab3kM9", "Kita Branch").await;
    click(&storage, agent.id, "sess_1").await;
    click(&storage, agent.id, "sess_1").await;
    click(&storage, agent.id, "sess_2").await;

    let reporting = ReportingService::new(storage);
    let (start, end) = wide_range();
    let report = reporting
        .summary(start, end, Granularity::Day, false)
        .await
        .expect("summary should build");

    assert_eq!(report.totals.clicks, 3);
    assert_eq!(report.totals.sessions, 2);
    assert_eq!(report.totals.conversions, 0);
    assert_eq!(report.agents.len(), 1);
    assert_eq!(report.agents[0].clicks, 3);
    assert_eq!(report.agents[0].sessions, 2);
}

#[tokio::test]
async fn test_summary_rate_is_zero_without_clicks() {
    let (storage, _dir) = create_temp_storage().await;
    let agent = seed_agent(&storage, "Ab3kM9", "Kita Branch").await;
    // Conversion without any tracked click, e.g. blocked script.
    convert(&storage, agent.id, "sess_direct", 100, 10000).await;

    let reporting = ReportingService::new(storage);
    let (start, end) = wide_range();
    let report = reporting
        .summary(start, end, Granularity::Day, false)
        .await
        .expect("summary should build");

    assert_eq!(report.totals.conversions, 1);
    assert_eq!(report.totals.conversion_rate, 0.0);
    assert_eq!(report.agents[0].conversion_rate, 0.0);
    assert!(report.totals.conversion_rate.is_finite());
}

#[tokio::test]
async fn test_summary_merges_agents_into_totals() {
    let (storage, _dir) = create_temp_storage().await;
    let first = seed_agent(&storage, "Ab3kM9", "Kita Branch").await;
    let second = seed_agent(&storage, "Xy7nP2", "South Office").await;

    click(&storage, first.id, "sess_1").await;
    click(&storage, first.id, "sess_2").await;
    convert(&storage, first.id, "sess_1", 100, 10000).await;

    click(&storage, second.id, "sess_3").await;
    convert(&storage, second.id, "sess_3", 4_500_000, 540_000).await;

    let reporting = ReportingService::new(storage);
    let (start, end) = wide_range();
    let report = reporting
        .summary(start, end, Granularity::Day, false)
        .await
        .expect("summary should build");

    assert_eq!(report.totals.clicks, 3);
    assert_eq!(report.totals.sessions, 3);
    assert_eq!(report.totals.conversions, 2);
    assert_eq!(report.totals.estimated_value, 4_500_100);
    assert_eq!(report.totals.commission, 550_000);
    assert!((report.totals.conversion_rate - 2.0 / 3.0).abs() < 1e-9);

    assert_eq!(report.agents.len(), 2);
    let first_row = report
        .agents
        .iter()
        .find(|a| a.code == "Ab3kM9")
        .expect("first agent should be listed");
    assert!((first_row.conversion_rate - 0.5).abs() < 1e-9);
    assert_eq!(first_row.commission, 10000);

    let second_row = report
        .agents
        .iter()
        .find(|a| a.code == "Xy7nP2")
        .expect("second agent should be listed");
    assert!((second_row.conversion_rate - 1.0).abs() < 1e-9);
    assert_eq!(second_row.estimated_value, 4_500_000);
}

#[tokio::test]
async fn test_summary_window_excludes_other_activity() {
    let (storage, _dir) = create_temp_storage().await;
    let agent = seed_agent(&storage, "Ab3kM9", "Kita Branch").await;
    click(&storage, agent.id, "sess_1").await;
    convert(&storage, agent.id, "sess_1", 100, 10000).await;

    let reporting = ReportingService::new(storage);
    // A window far in the past sees none of today's rows.
    let (start, end) =
        ReportingService::parse_date_range_strict(Some("2000-01-01"), Some("2001-01-01"))
            .expect("range should parse");

    let report = reporting
        .summary(start, end, Granularity::Day, false)
        .await
        .expect("summary should build");
    assert_eq!(report.totals.clicks, 0);
    assert_eq!(report.totals.commission, 0);
    assert!(report.agents.is_empty());
    assert!(report.timeline.is_empty());

    // With the full roster the agent still shows up, owed nothing.
    let report = reporting
        .summary(start, end, Granularity::Day, true)
        .await
        .expect("summary should build");
    assert_eq!(report.agents.len(), 1);
    assert_eq!(report.agents[0].code, "Ab3kM9");
    assert_eq!(report.agents[0].clicks, 0);
    assert_eq!(report.agents[0].commission, 0);
}

// =============================================================================
// Timeline bucketing
// =============================================================================

#[tokio::test]
async fn test_summary_buckets_by_granularity() {
    let (storage, _dir) = create_temp_storage().await;
    let agent = seed_agent(&storage, "Ab3kM9", "Kita Branch").await;
    click(&storage, agent.id, "sess_1").await;
    click(&storage, agent.id, "sess_2").await;
    convert(&storage, agent.id, "sess_1", 100, 10000).await;

    let reporting = ReportingService::new(storage);
    let (start, end) = wide_range();

    let report = reporting
        .summary(start, end, Granularity::Day, false)
        .await
        .expect("summary should build");
    assert_eq!(report.granularity, "day");
    assert_eq!(report.timeline.len(), 1);
    let bucket = &report.timeline[0];
    assert_eq!(bucket.period, Utc::now().format("%Y-%m-%d").to_string());
    assert_eq!(bucket.clicks, 2);
    assert_eq!(bucket.conversions, 1);
    assert_eq!(bucket.commission, 10000);
    assert!((bucket.conversion_rate - 0.5).abs() < 1e-9);

    let report = reporting
        .summary(start, end, Granularity::Month, false)
        .await
        .expect("summary should build");
    assert_eq!(report.granularity, "month");
    assert_eq!(report.timeline.len(), 1);
    assert_eq!(
        report.timeline[0].period,
        Utc::now().format("%Y-%m").to_string()
    );
}
