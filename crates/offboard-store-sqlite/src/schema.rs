//! SQL schemas for the two SQLite planes.
//!
//! Executed once at connection startup. Both are idempotent thanks to
//! `CREATE TABLE IF NOT EXISTS`; `PRAGMA user_version` gates future
//! migrations.

/// Data plane: staff profiles and the back-office relations that point at
/// them. `staff_sessions` and `savings_transactions` are optional modules
/// and deliberately absent here.
pub const DATA_SCHEMA: &str = "
PRAGMA journal_mode = WAL;
PRAGMA foreign_keys = ON;

CREATE TABLE IF NOT EXISTS profiles (
    id          TEXT PRIMARY KEY,
    full_name   TEXT NOT NULL,
    email       TEXT NOT NULL UNIQUE,
    role        TEXT NOT NULL,              -- Role discriminant, snake_case
    is_active   INTEGER NOT NULL DEFAULT 1,
    created_at  TEXT NOT NULL
);

-- Permission grants. Removed outright with the account.
CREATE TABLE IF NOT EXISTS user_roles (
    id          TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL REFERENCES profiles(id),
    role        TEXT NOT NULL,
    granted_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS notifications (
    id          TEXT PRIMARY KEY,
    user_id     TEXT NOT NULL REFERENCES profiles(id) ON DELETE CASCADE,
    message     TEXT NOT NULL,
    is_read     INTEGER NOT NULL DEFAULT 0,
    created_at  TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS branches (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    manager_id  TEXT REFERENCES profiles(id)
);

CREATE TABLE IF NOT EXISTS clients (
    id                  TEXT PRIMARY KEY,
    full_name           TEXT NOT NULL,
    assigned_officer_id TEXT REFERENCES profiles(id),
    created_by          TEXT REFERENCES profiles(id),
    created_at          TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS loans (
    id               TEXT PRIMARY KEY,
    client_id        TEXT NOT NULL REFERENCES clients(id),
    principal_cents  INTEGER NOT NULL,
    loan_officer_id  TEXT REFERENCES profiles(id),
    approved_by      TEXT REFERENCES profiles(id),
    created_at       TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS repayments (
    id           TEXT PRIMARY KEY,
    loan_id      TEXT NOT NULL REFERENCES loans(id),
    amount_cents INTEGER NOT NULL,
    recorded_by  TEXT REFERENCES profiles(id),
    recorded_at  TEXT NOT NULL
);

-- The audit trail survives its actors.
CREATE TABLE IF NOT EXISTS audit_logs (
    id          TEXT PRIMARY KEY,
    actor_id    TEXT REFERENCES profiles(id) ON DELETE SET NULL,
    action      TEXT NOT NULL,
    created_at  TEXT NOT NULL
);

-- One row per completed staff removal. No foreign key: the target is gone.
CREATE TABLE IF NOT EXISTS deletion_events (
    event_id      TEXT PRIMARY KEY,
    target_id     TEXT NOT NULL,
    requested_by  TEXT,
    outcome       TEXT NOT NULL,
    steps_applied INTEGER NOT NULL,
    rows_affected INTEGER NOT NULL,
    recorded_at   TEXT NOT NULL
);

CREATE INDEX IF NOT EXISTS profiles_role_idx     ON profiles(role, is_active);
CREATE INDEX IF NOT EXISTS user_roles_user_idx   ON user_roles(user_id);
CREATE INDEX IF NOT EXISTS notifications_user_idx ON notifications(user_id);
CREATE INDEX IF NOT EXISTS loans_officer_idx     ON loans(loan_officer_id);

PRAGMA user_version = 1;
";

/// Identity plane: one login per staff account.
pub const IDENTITY_SCHEMA: &str = "
PRAGMA journal_mode = WAL;

CREATE TABLE IF NOT EXISTS identities (
    id          TEXT PRIMARY KEY,
    email       TEXT NOT NULL UNIQUE,
    created_at  TEXT NOT NULL
);

PRAGMA user_version = 1;
";
