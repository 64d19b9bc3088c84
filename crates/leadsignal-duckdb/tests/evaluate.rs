use chrono::{DateTime, Duration, NaiveDate, NaiveTime, Utc};
use leadsignal_core::alert::{AlertStatus, AlertTransition};
use leadsignal_core::campaign::CampaignCalendar;
use leadsignal_core::config::EvaluatorConfig;
use leadsignal_core::evaluator::evaluate;
use leadsignal_core::lead::{LeadQuality, LeadSubmission};
use leadsignal_core::performance::PerformanceInput;
use leadsignal_core::trigger::{CreateTriggerRequest, Metric, Operator, Severity};
use leadsignal_duckdb::DuckDbBackend;

fn config() -> EvaluatorConfig {
    EvaluatorConfig {
        calendar: CampaignCalendar {
            start: NaiveDate::from_ymd_opt(2026, 1, 5).expect("date"),
            timezone: chrono_tz::Europe::Amsterdam,
            total_weeks: 13,
        },
        performance_window_days: 7,
        lead_window_days: 28,
    }
}

/// Noon UTC on the given 0-based campaign day.
fn campaign_day(offset: i64) -> DateTime<Utc> {
    (config().calendar.start + Duration::days(offset))
        .and_time(NaiveTime::from_hms_opt(12, 0, 0).expect("time"))
        .and_utc()
}

fn trigger(
    name: &str,
    pattern: &str,
    metric: Metric,
    op: Operator,
    threshold: f64,
) -> CreateTriggerRequest {
    CreateTriggerRequest {
        trigger_name: name.to_string(),
        adset_pattern: pattern.to_string(),
        market: None,
        metric,
        operator: op,
        threshold_value: Some(threshold),
        severity: Severity::Critical,
        evaluation_week: None,
        is_active: Some(true),
        description: None,
    }
}

fn lead(adset: &str) -> LeadSubmission {
    LeadSubmission {
        name: "Lead".to_string(),
        email: "lead@example.be".to_string(),
        phone: None,
        postal_code: None,
        market: Some("be".to_string()),
        language: Some("fr".to_string()),
        landing_page: None,
        message: None,
        utm_source: Some("facebook".to_string()),
        utm_medium: None,
        utm_campaign: None,
        utm_content: Some(adset.to_string()),
        utm_term: None,
    }
}

async fn seed_scenario(db: &DuckDbBackend, now: DateTime<Utc>) {
    db.insert_performance(&[PerformanceInput {
        date: (now - Duration::days(1)).date_naive(),
        campaign_name: Some("spring".to_string()),
        adset_name: "A".to_string(),
        spent: 100.0,
        frequency: 1.4,
        clicks: 40,
    }])
    .await
    .expect("performance");

    for quality in [Some(LeadQuality::Sql), Some(LeadQuality::Mql), None, None] {
        let stored = db
            .insert_lead(lead("A"), now - Duration::days(2))
            .await
            .expect("lead");
        if quality.is_some() {
            db.set_lead_quality(&stored.id, quality)
                .await
                .expect("quality");
        }
    }
}

#[tokio::test]
async fn evaluation_creates_one_alert_and_deduplicates() {
    let db = DuckDbBackend::open_in_memory().expect("open");
    let now = campaign_day(20);
    seed_scenario(&db, now).await;
    db.create_trigger(trigger("CPL too high", "A", Metric::Cpl, Operator::Gt, 20.0))
        .await
        .expect("trigger");

    let first = evaluate(&db, &config(), now).await.expect("first run");
    assert_eq!(first.current_week, 3);
    assert_eq!(first.triggers_checked, 1);
    assert_eq!(first.adsets_analyzed, 1);
    assert_eq!(first.new_alerts_created, 1);

    let alerts = db.list_alerts(None, 10).await.expect("alerts");
    assert_eq!(alerts.len(), 1);
    assert_eq!(alerts[0].metric_value, 25.0);
    assert_eq!(alerts[0].status, AlertStatus::Open);
    assert_eq!(alerts[0].campaign_week, 3);

    let second = evaluate(&db, &config(), now).await.expect("second run");
    assert_eq!(second.new_alerts_created, 0);
    assert_eq!(db.list_alerts(None, 10).await.expect("alerts").len(), 1);

    db.transition_alert(&alerts[0].id, AlertTransition::Acknowledge)
        .await
        .expect("ack");
    let third = evaluate(&db, &config(), now).await.expect("third run");
    assert_eq!(third.new_alerts_created, 1);
}

#[tokio::test]
async fn malformed_feed_rows_are_skipped() {
    let db = DuckDbBackend::open_in_memory().expect("open");
    let now = campaign_day(30);
    seed_scenario(&db, now).await;
    {
        let conn = db.conn_for_test().await;
        conn.execute(
            r#"
            INSERT INTO ad_performance_daily (date, campaign_name, adset_name, spent, frequency, clicks)
            VALUES (CAST(?1 AS DATE), 'spring', 'B', 'n/a', '1.0', '3')
            "#,
            leadsignal_duckdb::duckdb::params![(now - Duration::days(1)).date_naive().to_string()],
        )
        .expect("seed malformed row");
    }
    db.create_trigger(trigger("Any spend", "%", Metric::Cpc, Operator::Gte, 0.0))
        .await
        .expect("trigger");

    let summary = evaluate(&db, &config(), now).await.expect("run");
    assert_eq!(summary.adsets_analyzed, 1);
    assert_eq!(summary.new_alerts_created, 1);
    let alerts = db.list_alerts(None, 10).await.expect("alerts");
    assert_eq!(alerts[0].adset_name, "A");
    assert_eq!(alerts[0].metric_value, 2.5);
}

#[tokio::test]
async fn week_restricted_trigger_is_not_checked_in_other_weeks() {
    let db = DuckDbBackend::open_in_memory().expect("open");
    let now = campaign_day(40);
    seed_scenario(&db, now).await;
    let mut req = trigger("Week 3 only", "A", Metric::Cpl, Operator::Gt, 20.0);
    req.evaluation_week = Some(3);
    db.create_trigger(req).await.expect("trigger");

    let summary = evaluate(&db, &config(), now).await.expect("run");
    assert_eq!(summary.current_week, 6);
    assert_eq!(summary.triggers_checked, 0);
    assert_eq!(summary.new_alerts_created, 0);
}
