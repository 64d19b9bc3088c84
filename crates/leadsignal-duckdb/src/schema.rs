/// DuckDB initialization SQL.
///
/// Executed once at database open time via `Connection::execute_batch`.
/// All statements use `IF NOT EXISTS` so they are safe to re-run on every
/// startup.
///
/// `memory_limit` is passed at runtime from `Config.duckdb_memory_limit`
/// (env `LEADSIGNAL_DUCKDB_MEMORY`, default `"1GB"`). An explicit limit is
/// always set: the DuckDB default (80% of system RAM) is not acceptable for a
/// server process.
///
/// NOTE: DuckDB treats NULLs as distinct in UNIQUE indexes. `triggered_alerts.open_key`
/// relies on this: it holds `trigger_id:adset_name` while an alert is open and
/// is set to NULL when the alert is acknowledged or resolved, so any number of
/// closed alerts can share a pair but only one open alert can.
///
/// Tables whose rows are updated in place carry no secondary indexes: DuckDB
/// rewrites updates of indexed columns as delete + insert.
pub fn init_sql(memory_limit: &str) -> String {
    format!(
        r#"SET memory_limit = '{memory_limit}';
SET threads = 2;

-- ===========================================
-- DECISION TRIGGERS (operator-managed rules)
-- ===========================================
CREATE TABLE IF NOT EXISTS decision_triggers (
    id              VARCHAR PRIMARY KEY,           -- 'trg_' + 21 alnum
    trigger_name    VARCHAR NOT NULL,
    adset_pattern   VARCHAR NOT NULL,              -- exact name or wildcard ('%' / '*')
    market          VARCHAR,                       -- optional ad-set name segment, e.g. 'nl'
    metric          VARCHAR NOT NULL,              -- 'cpl' | 'frequency' | 'cpc' | 'days_without_lead' | 'conversion_rate'
    operator        VARCHAR NOT NULL,              -- 'gt' | 'gte' | 'lt' | 'lte'
    threshold_value DOUBLE,                        -- NULL = never fires
    severity        VARCHAR NOT NULL DEFAULT 'warning',
    evaluation_week INTEGER,                       -- NULL = every campaign week
    is_active       BOOLEAN NOT NULL DEFAULT TRUE,
    description     VARCHAR,
    created_at      TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    updated_at      TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);

-- ===========================================
-- AD PERFORMANCE (daily, per campaign + ad set)
-- ===========================================
-- Numeric columns hold the feed's values as delivered. The aggregator
-- parses them row by row and skips rows it cannot read.
CREATE TABLE IF NOT EXISTS ad_performance_daily (
    date            DATE NOT NULL,
    campaign_name   VARCHAR NOT NULL DEFAULT '',
    adset_name      VARCHAR NOT NULL,
    spent           VARCHAR,
    frequency       VARCHAR,
    clicks          VARCHAR,
    imported_at     TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    PRIMARY KEY (date, campaign_name, adset_name)
);

-- ===========================================
-- LEAD SUBMISSIONS (landing-page forms)
-- ===========================================
CREATE TABLE IF NOT EXISTS lead_submissions (
    id              VARCHAR PRIMARY KEY,           -- UUID v4
    name            VARCHAR NOT NULL,
    email           VARCHAR NOT NULL,
    phone           VARCHAR,
    postal_code     VARCHAR,
    market          VARCHAR,
    language        VARCHAR,
    landing_page    VARCHAR,
    message         VARCHAR,
    utm_source      VARCHAR,
    utm_medium      VARCHAR,
    utm_campaign    VARCHAR,
    utm_content     VARCHAR,                       -- ad-set attribution key
    utm_term        VARCHAR,
    kwaliteit       VARCHAR,                       -- quality label; NULL until rated
    created_at      TIMESTAMP NOT NULL,
    updated_at      TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
);
CREATE INDEX IF NOT EXISTS idx_lead_submissions_created
    ON lead_submissions(created_at DESC);
CREATE INDEX IF NOT EXISTS idx_lead_submissions_utm_content
    ON lead_submissions(utm_content, created_at);

-- ===========================================
-- TRIGGERED ALERTS
-- ===========================================
CREATE TABLE IF NOT EXISTS triggered_alerts (
    id              VARCHAR PRIMARY KEY,           -- 'alr_' + 21 alnum
    trigger_id      VARCHAR NOT NULL,
    trigger_name    VARCHAR NOT NULL,
    adset_name      VARCHAR NOT NULL,
    metric          VARCHAR NOT NULL,
    operator        VARCHAR NOT NULL,
    metric_value    DOUBLE NOT NULL,
    threshold_value DOUBLE NOT NULL,
    severity        VARCHAR NOT NULL,
    campaign_week   INTEGER NOT NULL,
    message         VARCHAR NOT NULL,
    status          VARCHAR NOT NULL DEFAULT 'open', -- 'open' | 'acknowledged' | 'resolved'
    open_key        VARCHAR UNIQUE,                -- trigger_id || ':' || adset_name while open
    created_at      TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
    acknowledged_at TIMESTAMP,
    resolved_at     TIMESTAMP
);
"#
    )
}
