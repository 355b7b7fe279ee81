//! Reporting service layer
//!
//! Aggregates clicks and conversions per agent and per date bucket,
//! shared between the HTTP admin API and the CLI report command.
//!
//! Counting happens in SQL; this layer only merges the aggregate rows
//! over the agent roster and fills in the zero rows.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use sea_orm::{DbBackend, sea_query::Expr};
use serde::Serialize;
use strum::{Display, EnumString};
use tracing::{debug, info};

use crate::errors::{ReftrackerError, Result};
use crate::storage::SeaOrmStorage;

// ============ Public types ============

/// Date bucket width for timelines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum Granularity {
    #[default]
    Day,
    Month,
}

/// One roster line of the summary report.
#[derive(Debug, Clone, Serialize)]
pub struct AgentReportRow {
    pub code: String,
    pub name: String,
    pub active: bool,
    pub clicks: i64,
    pub sessions: i64,
    pub conversions: i64,
    /// conversions / clicks, zero when there are no clicks
    pub conversion_rate: f64,
    pub estimated_value: i64,
    pub commission: i64,
}

/// Whole-range totals.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ReportTotals {
    pub clicks: i64,
    pub sessions: i64,
    pub conversions: i64,
    pub conversion_rate: f64,
    pub estimated_value: i64,
    pub commission: i64,
}

/// One date bucket of the timeline.
#[derive(Debug, Clone, Serialize)]
pub struct TimelineBucket {
    pub period: String,
    pub clicks: i64,
    pub conversions: i64,
    pub conversion_rate: f64,
    pub estimated_value: i64,
    pub commission: i64,
}

/// Full summary report payload.
#[derive(Debug, Clone, Serialize)]
pub struct SummaryReport {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub granularity: String,
    pub totals: ReportTotals,
    pub agents: Vec<AgentReportRow>,
    pub timeline: Vec<TimelineBucket>,
}

fn rate(conversions: i64, clicks: i64) -> f64 {
    if clicks > 0 {
        conversions as f64 / clicks as f64
    } else {
        0.0
    }
}

// ============ ReportingService ============

pub struct ReportingService {
    storage: Arc<SeaOrmStorage>,
}

impl ReportingService {
    pub fn new(storage: Arc<SeaOrmStorage>) -> Self {
        Self { storage }
    }

    /// Parses a date range without silent fallback: both bounds or
    /// neither, either RFC3339 or plain YYYY-MM-DD, start not after end.
    /// An empty range defaults to the last 30 days.
    pub fn parse_date_range_strict(
        start_date: Option<&str>,
        end_date: Option<&str>,
    ) -> Result<(DateTime<Utc>, DateTime<Utc>)> {
        match (start_date, end_date) {
            (Some(s), Some(e)) => {
                let start = Self::parse_date(s).ok_or_else(|| {
                    ReftrackerError::date_parse(format!(
                        "invalid start date '{}': expected RFC3339 or YYYY-MM-DD",
                        s
                    ))
                })?;
                let end = Self::parse_date(e).ok_or_else(|| {
                    ReftrackerError::date_parse(format!(
                        "invalid end date '{}': expected RFC3339 or YYYY-MM-DD",
                        e
                    ))
                })?;
                if start > end {
                    return Err(ReftrackerError::invalid_argument(
                        "start date must not be later than end date",
                    ));
                }
                Ok((start, end))
            }
            (Some(_), None) => Err(ReftrackerError::date_parse(
                "start date is provided but end date is missing",
            )),
            (None, Some(_)) => Err(ReftrackerError::date_parse(
                "end date is provided but start date is missing",
            )),
            (None, None) => Ok(Self::default_date_range()),
        }
    }

    fn parse_date(s: &str) -> Option<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(s)
            .ok()
            .map(|dt| dt.with_timezone(&Utc))
            .or_else(|| {
                chrono::NaiveDate::parse_from_str(s, "%Y-%m-%d")
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
                    .map(|dt| dt.and_utc())
            })
    }

    fn default_date_range() -> (DateTime<Utc>, DateTime<Utc>) {
        let end = Utc::now();
        let start = end - Duration::days(30);
        (start, end)
    }

    fn get_db_backend(&self) -> DbBackend {
        match self.storage.get_backend_name() {
            "sqlite" => DbBackend::Sqlite,
            "mysql" => DbBackend::MySql,
            _ => DbBackend::Postgres,
        }
    }

    /// Builds the date bucket expression for the active backend. Both
    /// the clicks and conversions tables name their instant column
    /// `created_at`, so one expression serves both.
    fn date_format_expr(&self, granularity: Granularity) -> Expr {
        let (sqlite_fmt, mysql_fmt, pg_fmt) = match granularity {
            Granularity::Day => ("%Y-%m-%d", "%Y-%m-%d", "YYYY-MM-DD"),
            Granularity::Month => ("%Y-%m", "%Y-%m", "YYYY-MM"),
        };

        match self.get_db_backend() {
            DbBackend::Sqlite => Expr::cust(format!("strftime('{}', created_at)", sqlite_fmt)),
            DbBackend::MySql => Expr::cust(format!("DATE_FORMAT(created_at, '{}')", mysql_fmt)),
            _ => Expr::cust(format!("TO_CHAR(created_at, '{}')", pg_fmt)),
        }
    }

    /// Builds the summary report for a range.
    ///
    /// `full_roster` keeps agents without any activity in the output as
    /// all-zero rows; otherwise they are skipped.
    pub async fn summary(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        granularity: Granularity,
        full_roster: bool,
    ) -> Result<SummaryReport> {
        info!(
            "Reporting: summary from {} to {}, granularity={}, full_roster={}",
            start, end, granularity, full_roster
        );

        let date_expr = self.date_format_expr(granularity);
        let (click_rows, conversion_rows, click_buckets, conversion_buckets) = tokio::try_join!(
            self.storage.clicks_by_agent(start, end),
            self.storage.conversions_by_agent(start, end),
            self.storage.clicks_timeline(start, end, date_expr.clone()),
            self.storage.conversions_timeline(start, end, date_expr),
        )
        .map_err(|e| {
            ReftrackerError::database_operation(format!("report query failed: {}", e))
        })?;

        let clicks_by_agent: HashMap<i64, _> =
            click_rows.into_iter().map(|r| (r.agent_id, r)).collect();
        let conversions_by_agent: HashMap<i64, _> = conversion_rows
            .into_iter()
            .map(|r| (r.agent_id, r))
            .collect();

        let roster = self.storage.list_agents(true).await?;
        let mut totals = ReportTotals::default();
        let mut agents = Vec::with_capacity(roster.len());

        for agent in roster {
            let clicks = clicks_by_agent.get(&agent.id);
            let conversions = conversions_by_agent.get(&agent.id);

            let click_count = clicks.map(|r| r.clicks).unwrap_or(0);
            let session_count = clicks.and_then(|r| r.sessions).unwrap_or(0);
            let conversion_count = conversions.map(|r| r.conversions).unwrap_or(0);
            let estimated_value = conversions.and_then(|r| r.estimated_sum).unwrap_or(0);
            let commission = conversions.and_then(|r| r.commission_sum).unwrap_or(0);

            totals.clicks += click_count;
            totals.sessions += session_count;
            totals.conversions += conversion_count;
            totals.estimated_value += estimated_value;
            totals.commission += commission;

            if !full_roster && click_count == 0 && conversion_count == 0 {
                continue;
            }

            agents.push(AgentReportRow {
                code: agent.code,
                name: agent.name,
                active: agent.active,
                clicks: click_count,
                sessions: session_count,
                conversions: conversion_count,
                conversion_rate: rate(conversion_count, click_count),
                estimated_value,
                commission,
            });
        }
        totals.conversion_rate = rate(totals.conversions, totals.clicks);

        // Bucket labels are zero padded, so the BTreeMap order is
        // already chronological.
        let mut buckets: BTreeMap<String, TimelineBucket> = BTreeMap::new();
        for row in click_buckets {
            buckets
                .entry(row.label.clone())
                .or_insert_with(|| empty_bucket(row.label))
                .clicks = row.count;
        }
        for row in conversion_buckets {
            let bucket = buckets
                .entry(row.label.clone())
                .or_insert_with(|| empty_bucket(row.label));
            bucket.conversions = row.count;
            bucket.estimated_value = row.estimated_sum.unwrap_or(0);
            bucket.commission = row.commission_sum.unwrap_or(0);
        }
        let timeline: Vec<TimelineBucket> = buckets
            .into_values()
            .map(|mut b| {
                b.conversion_rate = rate(b.conversions, b.clicks);
                b
            })
            .collect();

        debug!(
            "Reporting: summary built, {} agents, {} buckets",
            agents.len(),
            timeline.len()
        );

        Ok(SummaryReport {
            start,
            end,
            granularity: granularity.to_string(),
            totals,
            agents,
            timeline,
        })
    }
}

fn empty_bucket(period: String) -> TimelineBucket {
    TimelineBucket {
        period,
        clicks: 0,
        conversions: 0,
        conversion_rate: 0.0,
        estimated_value: 0,
        commission: 0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_range_strict_accepts_plain_dates() {
        let (start, end) =
            ReportingService::parse_date_range_strict(Some("2026-01-01"), Some("2026-01-31"))
                .unwrap();
        assert!(start < end);
        assert_eq!(start.format("%Y-%m-%d").to_string(), "2026-01-01");
    }

    #[test]
    fn test_parse_date_range_strict_accepts_rfc3339() {
        let (start, _) = ReportingService::parse_date_range_strict(
            Some("2026-01-01T09:30:00Z"),
            Some("2026-01-02T00:00:00Z"),
        )
        .unwrap();
        assert_eq!(start.format("%H:%M").to_string(), "09:30");
    }

    #[test]
    fn test_parse_date_range_strict_rejects_inverted_range() {
        let result =
            ReportingService::parse_date_range_strict(Some("2026-02-01"), Some("2026-01-01"));
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_date_range_strict_rejects_half_range() {
        assert!(ReportingService::parse_date_range_strict(Some("2026-01-01"), None).is_err());
        assert!(ReportingService::parse_date_range_strict(None, Some("2026-01-01")).is_err());
    }

    #[test]
    fn test_parse_date_range_defaults_to_last_30_days() {
        let (start, end) = ReportingService::parse_date_range_strict(None, None).unwrap();
        let days = (end - start).num_days();
        assert_eq!(days, 30);
    }

    #[test]
    fn test_rate_is_zero_without_clicks() {
        assert_eq!(rate(5, 0), 0.0);
        assert_eq!(rate(0, 0), 0.0);
        assert!((rate(1, 4) - 0.25).abs() < f64::EPSILON);
    }

    #[test]
    fn test_granularity_round_trip() {
        assert_eq!("day".parse::<Granularity>().unwrap(), Granularity::Day);
        assert_eq!("month".parse::<Granularity>().unwrap(), Granularity::Month);
        assert!("week".parse::<Granularity>().is_err());
        assert_eq!(Granularity::Month.to_string(), "month");
    }
}
