//! Database schema and migrations for ChatZone.
//!
//! Migrations are applied in order when the database is opened; the
//! schema_version table records which ones already ran.

/// Database migrations.
pub const MIGRATIONS: &[&str] = &[
    // v1: durable key-value surface
    r#"
CREATE TABLE kv_store (
    key         TEXT PRIMARY KEY,
    value       TEXT NOT NULL,           -- JSON document
    updated_at  TEXT NOT NULL DEFAULT (datetime('now'))
);
"#,
];
