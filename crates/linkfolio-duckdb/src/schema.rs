/// DuckDB initialization SQL.
///
/// Executed once at database open time via `Connection::execute_batch`.
/// All statements use `IF NOT EXISTS` so they are safe to re-run on every
/// startup.
///
/// `memory_limit` comes from `Config.duckdb_memory_limit`
/// (env `LINKFOLIO_DUCKDB_MEMORY`, default `"1GB"`). Always set explicitly:
/// the DuckDB default of 80% of system RAM is not acceptable for a server.
///
/// `occurred_at` is nullable. Rows written by other tools may lack it; the
/// query layer skips such rows instead of failing the whole read.
pub fn init_sql(memory_limit: &str) -> String {
    format!(
        r#"SET memory_limit = '{memory_limit}';
SET threads = 2;

-- ===========================================
-- PROFILE VIEWS (one row per public page load)
-- ===========================================
CREATE TABLE IF NOT EXISTS profile_views (
    id              VARCHAR PRIMARY KEY,           -- UUID v4
    owner_id        VARCHAR NOT NULL,
    occurred_at     TIMESTAMP,                     -- UTC
    referrer        VARCHAR,
    user_agent      VARCHAR
);
CREATE INDEX IF NOT EXISTS idx_profile_views_owner_time
    ON profile_views(owner_id, occurred_at);

-- ===========================================
-- LINK CLICKS (one row per outbound link activation)
-- ===========================================
CREATE TABLE IF NOT EXISTS link_clicks (
    id              VARCHAR PRIMARY KEY,           -- UUID v4
    owner_id        VARCHAR NOT NULL,
    occurred_at     TIMESTAMP,                     -- UTC
    link_kind       VARCHAR NOT NULL,              -- 'social' | 'custom'
    link_id         VARCHAR,
    link_label      VARCHAR NOT NULL,
    referrer        VARCHAR
);
CREATE INDEX IF NOT EXISTS idx_link_clicks_owner_time
    ON link_clicks(owner_id, occurred_at);
"#
    )
}
