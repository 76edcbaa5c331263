//! SQL schema for the Chronicle SQLite store.
//!
//! Executed once at connection startup via `PRAGMA user_version`. Future
//! migrations will be gated on that version number.

/// Full schema DDL; idempotent thanks to `CREATE TABLE IF NOT EXISTS`.
pub const SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS companies (
    company_id      TEXT PRIMARY KEY,
    name            TEXT NOT NULL,
    status          TEXT NOT NULL DEFAULT 'lead',  -- tag of CompanyStatus
    industry        TEXT,
    website         TEXT,
    account_manager TEXT,
    created_at      TEXT NOT NULL,   -- ISO 8601 UTC
    updated_at      TEXT NOT NULL,
    deleted_at      TEXT             -- NULL = live; set = soft-deleted
);

CREATE TABLE IF NOT EXISTS contacts (
    contact_id  TEXT PRIMARY KEY,
    company_id  TEXT NOT NULL REFERENCES companies(company_id) ON DELETE CASCADE,
    name        TEXT NOT NULL,
    email       TEXT,
    phone       TEXT,
    title       TEXT,
    is_primary  INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL,
    updated_at  TEXT NOT NULL,
    deleted_at  TEXT
);

-- Activities are strictly append-only.
-- No UPDATE or DELETE is ever issued against this table.
-- subject_kind/subject_id carry no foreign key: a record may refer to an
-- entity that has since been purged.
CREATE TABLE IF NOT EXISTS activities (
    activity_id      TEXT PRIMARY KEY,
    subject_kind     TEXT NOT NULL,   -- tag of SubjectKind
    subject_id       TEXT NOT NULL,
    actor_id         TEXT NOT NULL,
    kind             TEXT NOT NULL,   -- tag of ActivityKind
    description      TEXT NOT NULL,
    properties       TEXT NOT NULL DEFAULT '{}',
    system_generated INTEGER NOT NULL DEFAULT 1,
    recorded_at      TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS contacts_company_idx   ON contacts(company_id);
CREATE INDEX IF NOT EXISTS activities_subject_idx
    ON activities(subject_kind, subject_id, recorded_at);
CREATE INDEX IF NOT EXISTS activities_kind_idx    ON activities(kind);

PRAGMA user_version = 1;
";
