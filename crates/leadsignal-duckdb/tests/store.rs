use chrono::{Duration, NaiveDate, TimeZone, Utc};
use leadsignal_core::alert::{AlertStatus, AlertTransition, NewAlert};
use leadsignal_core::lead::{LeadQuality, LeadSubmission};
use leadsignal_core::performance::PerformanceInput;
use leadsignal_core::trigger::{
    CreateTriggerRequest, Metric, Operator, Severity, UpdateTriggerRequest,
};
use leadsignal_duckdb::{DuckDbBackend, TransitionOutcome};

fn create_request(name: &str, pattern: &str) -> CreateTriggerRequest {
    CreateTriggerRequest {
        trigger_name: name.to_string(),
        adset_pattern: pattern.to_string(),
        market: None,
        metric: Metric::Cpl,
        operator: Operator::Gt,
        threshold_value: Some(20.0),
        severity: Severity::Warning,
        evaluation_week: None,
        is_active: None,
        description: None,
    }
}

fn new_alert(trigger_id: &str, adset: &str) -> NewAlert {
    NewAlert {
        trigger_id: trigger_id.to_string(),
        trigger_name: "CPL too high".to_string(),
        adset_name: adset.to_string(),
        metric: Metric::Cpl,
        operator: Operator::Gt,
        metric_value: 25.0,
        threshold_value: 20.0,
        severity: Severity::Warning,
        campaign_week: 3,
        message: "CPL too high: A cpl is 25.00 (> 20.00)".to_string(),
    }
}

fn submission(utm_content: Option<&str>) -> LeadSubmission {
    LeadSubmission {
        name: "Jan Jansen".to_string(),
        email: "jan@example.nl".to_string(),
        phone: Some(" ".to_string()),
        postal_code: Some("1012AB".to_string()),
        market: Some("NL".to_string()),
        language: Some("nl".to_string()),
        landing_page: Some("/nl/dakisolatie".to_string()),
        message: None,
        utm_source: Some("facebook".to_string()),
        utm_medium: Some("paid".to_string()),
        utm_campaign: Some("spring".to_string()),
        utm_content: utm_content.map(str::to_string),
        utm_term: None,
    }
}

#[tokio::test]
async fn trigger_crud_roundtrip() {
    let db = DuckDbBackend::open_in_memory().expect("open");

    let created = db
        .create_trigger(create_request("  High CPL  ", "retargeting_%"))
        .await
        .expect("create");
    assert!(created.id.starts_with("trg_"));
    assert_eq!(created.trigger_name, "High CPL");
    assert!(created.is_active);
    assert_eq!(created.severity, Severity::Warning);

    let updated = db
        .update_trigger(
            &created.id,
            UpdateTriggerRequest {
                evaluation_week: Some(Some(3)),
                market: Some(Some("nl".to_string())),
                is_active: Some(false),
                ..UpdateTriggerRequest::default()
            },
        )
        .await
        .expect("update")
        .expect("exists");
    assert_eq!(updated.evaluation_week, Some(3));
    assert_eq!(updated.market.as_deref(), Some("nl"));
    assert_eq!(updated.adset_pattern, "retargeting_%");
    assert!(!updated.is_active);

    let cleared = db
        .update_trigger(
            &created.id,
            UpdateTriggerRequest {
                evaluation_week: Some(None),
                ..UpdateTriggerRequest::default()
            },
        )
        .await
        .expect("update")
        .expect("exists");
    assert_eq!(cleared.evaluation_week, None);
    assert_eq!(cleared.market.as_deref(), Some("nl"));

    assert_eq!(db.list_triggers().await.expect("list").len(), 1);
    assert!(db.list_active_triggers().await.expect("active").is_empty());

    assert!(db.delete_trigger(&created.id).await.expect("delete"));
    assert!(!db.delete_trigger(&created.id).await.expect("delete again"));
    assert!(db.get_trigger(&created.id).await.expect("get").is_none());
}

#[tokio::test]
async fn undecodable_trigger_rows_are_skipped_for_evaluation() {
    let db = DuckDbBackend::open_in_memory().expect("open");
    db.create_trigger(create_request("valid", "%"))
        .await
        .expect("create");
    {
        let conn = db.conn_for_test().await;
        conn.execute(
            r#"
            INSERT INTO decision_triggers (id, trigger_name, adset_pattern, metric, operator)
            VALUES ('trg_legacy', 'legacy', '%', 'ctr', 'gt')
            "#,
            [],
        )
        .expect("seed legacy trigger");
    }

    let active = db.list_active_triggers().await.expect("active");
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].trigger_name, "valid");
    assert!(db.list_triggers().await.is_err());
}

#[tokio::test]
async fn performance_upsert_and_window() {
    let db = DuckDbBackend::open_in_memory().expect("open");
    let day = |d| NaiveDate::from_ymd_opt(2026, 3, d).expect("date");
    let row = |date, spent| PerformanceInput {
        date,
        campaign_name: None,
        adset_name: "lookalike_nl".to_string(),
        spent,
        frequency: 1.5,
        clicks: 12,
    };

    db.insert_performance(&[row(day(1), 10.0), row(day(5), 20.0)])
        .await
        .expect("insert");
    db.insert_performance(&[row(day(5), 25.5)])
        .await
        .expect("re-import");

    let rows = db.performance_since(day(2)).await.expect("window");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].date.as_deref(), Some("2026-03-05"));
    assert_eq!(rows[0].campaign_name, None);
    assert_eq!(rows[0].spent.as_deref(), Some("25.5"));
    assert_eq!(rows[0].clicks.as_deref(), Some("12"));
}

#[tokio::test]
async fn lead_intake_quality_and_window() {
    let db = DuckDbBackend::open_in_memory().expect("open");
    let now = Utc
        .with_ymd_and_hms(2026, 3, 10, 12, 0, 0)
        .single()
        .expect("valid time");

    let old = db
        .insert_lead(submission(Some("A")), now - Duration::days(40))
        .await
        .expect("old lead");
    let recent = db
        .insert_lead(submission(Some("A")), now - Duration::days(2))
        .await
        .expect("recent lead");
    assert_eq!(recent.market.as_deref(), Some("nl"));
    assert_eq!(recent.phone, None);
    assert_eq!(recent.kwaliteit, None);

    let rated = db
        .set_lead_quality(&recent.id, Some(LeadQuality::Deal))
        .await
        .expect("rate")
        .expect("exists");
    assert_eq!(rated.kwaliteit.as_deref(), Some("deal"));
    assert!(db
        .set_lead_quality("missing", Some(LeadQuality::Sql))
        .await
        .expect("rate missing")
        .is_none());

    let rows = db
        .leads_since(now - Duration::days(28))
        .await
        .expect("window");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].utm_content.as_deref(), Some("A"));
    assert_eq!(rows[0].kwaliteit.as_deref(), Some("deal"));

    let counts = db
        .lead_quality_counts(
            (now - Duration::days(60)).date_naive(),
            now.date_naive(),
        )
        .await
        .expect("counts");
    assert!(counts.contains(&(Some("deal".to_string()), 1)));
    assert!(counts.contains(&(None, 1)));
    assert!(!old.id.is_empty());
}

#[tokio::test]
async fn open_alert_uniqueness_is_enforced_by_storage() {
    let db = DuckDbBackend::open_in_memory().expect("open");

    let inserted = db
        .insert_alerts(&[new_alert("trg_1", "A"), new_alert("trg_1", "B")])
        .await
        .expect("insert");
    assert_eq!(inserted, 2);

    // A concurrent run that missed the open alert fails as a whole.
    let err = db
        .insert_alerts(&[new_alert("trg_2", "A"), new_alert("trg_1", "A")])
        .await;
    assert!(err.is_err());
    let open = db.open_alert_keys().await.expect("open keys");
    assert_eq!(open.len(), 2);
    assert!(open.iter().all(|k| k.trigger_id == "trg_1"));
}

#[tokio::test]
async fn acknowledge_and_resolve_release_the_open_slot() {
    let db = DuckDbBackend::open_in_memory().expect("open");
    db.insert_alerts(&[new_alert("trg_1", "A")])
        .await
        .expect("insert");
    let alert = db
        .list_alerts(Some(AlertStatus::Open), 10)
        .await
        .expect("list")
        .pop()
        .expect("one open alert");
    assert!(alert.id.starts_with("alr_"));
    assert_eq!(alert.campaign_week, 3);

    let acknowledged = match db
        .transition_alert(&alert.id, AlertTransition::Acknowledge)
        .await
        .expect("ack")
    {
        TransitionOutcome::Applied(alert) => alert,
        other => panic!("unexpected outcome: {other:?}"),
    };
    assert_eq!(acknowledged.status, AlertStatus::Acknowledged);
    assert!(acknowledged.acknowledged_at.is_some());

    assert_eq!(
        db.transition_alert(&alert.id, AlertTransition::Acknowledge)
            .await
            .expect("ack twice"),
        TransitionOutcome::Rejected(AlertStatus::Acknowledged)
    );
    assert!(db.open_alert_keys().await.expect("keys").is_empty());

    // The pair may fire again once the earlier alert is no longer open.
    db.insert_alerts(&[new_alert("trg_1", "A")])
        .await
        .expect("reopen");

    match db
        .transition_alert(&alert.id, AlertTransition::Resolve)
        .await
        .expect("resolve")
    {
        TransitionOutcome::Applied(resolved) => {
            assert_eq!(resolved.status, AlertStatus::Resolved);
            assert!(resolved.resolved_at.is_some());
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert_eq!(
        db.transition_alert("alr_missing", AlertTransition::Resolve)
            .await
            .expect("missing"),
        TransitionOutcome::NotFound
    );
    assert_eq!(db.list_alerts(None, 10).await.expect("all").len(), 2);
    assert_eq!(
        db.list_alerts(Some(AlertStatus::Open), 10)
            .await
            .expect("open")
            .len(),
        1
    );
}
