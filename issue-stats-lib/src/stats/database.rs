//! SQLite-backed registry, token store, and snapshot table.

use super::{CredentialLookup, Package, PackageRegistry, SnapshotStore, StatSnapshot, Window, WindowCounts, WindowTotals};
use crate::Result;
use camino::Utf8Path;
use chrono::{DateTime, SecondsFormat, Utc};
use ohno::{IntoAppError, app_err};
use rusqlite::{Connection, OptionalExtension, Row, params};

const LOG_TARGET: &str = "  database";

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS packages (
        id INTEGER PRIMARY KEY,
        handle TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        repository TEXT,
        developer_id INTEGER NOT NULL
    );

    CREATE TABLE IF NOT EXISTS oauth_tokens (
        provider TEXT NOT NULL,
        user_id INTEGER NOT NULL,
        token TEXT NOT NULL,
        PRIMARY KEY (provider, user_id)
    );

    CREATE TABLE IF NOT EXISTS package_issue_stats (
        package_id INTEGER NOT NULL REFERENCES packages(id),
        period INTEGER NOT NULL,
        open_issues INTEGER NOT NULL CHECK (open_issues >= 0),
        closed_issues INTEGER NOT NULL CHECK (closed_issues >= 0),
        open_pulls INTEGER NOT NULL CHECK (open_pulls >= 0),
        merged_pulls INTEGER NOT NULL CHECK (merged_pulls >= 0),
        date_updated TEXT NOT NULL,
        PRIMARY KEY (package_id, period)
    );
";

const UPSERT_SNAPSHOT: &str = "
    INSERT INTO package_issue_stats
        (package_id, period, open_issues, closed_issues, open_pulls, merged_pulls, date_updated)
    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
    ON CONFLICT(package_id, period) DO UPDATE SET
        open_issues = excluded.open_issues,
        closed_issues = excluded.closed_issues,
        open_pulls = excluded.open_pulls,
        merged_pulls = excluded.merged_pulls,
        date_updated = excluded.date_updated
";

/// A SQLite database holding packages, provider tokens, and issue statistics.
#[derive(Debug)]
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if needed) the database at `path` and make sure all tables exist.
    pub fn open(path: &Utf8Path) -> Result<Self> {
        let conn = Connection::open(path).into_app_err_with(|| format!("opening database '{path}'"))?;
        log::debug!(target: LOG_TARGET, "Opened database '{path}'");
        Self::bootstrap(conn)
    }

    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().into_app_err("opening in-memory database")?;
        Self::bootstrap(conn)
    }

    fn bootstrap(conn: Connection) -> Result<Self> {
        conn.execute_batch(SCHEMA).into_app_err("creating database schema")?;
        Ok(Self { conn })
    }

    /// Register a package, replacing any existing row with the same id.
    pub fn insert_package(&self, package: &Package) -> Result<()> {
        let _ = self
            .conn
            .execute(
                "INSERT OR REPLACE INTO packages (id, handle, name, repository, developer_id) VALUES (?1, ?2, ?3, ?4, ?5)",
                params![package.id, package.handle, package.name, package.repository, package.developer_id],
            )
            .into_app_err_with(|| format!("inserting package '{}'", package.handle))?;
        Ok(())
    }

    /// Store the token `user_id` granted for `provider`.
    pub fn insert_token(&self, provider: &str, user_id: i64, token: &str) -> Result<()> {
        let _ = self
            .conn
            .execute(
                "INSERT OR REPLACE INTO oauth_tokens (provider, user_id, token) VALUES (?1, ?2, ?3)",
                params![provider, user_id, token],
            )
            .into_app_err_with(|| format!("storing {provider} token for user {user_id}"))?;
        Ok(())
    }

    fn map_package(row: &Row<'_>) -> rusqlite::Result<Package> {
        Ok(Package {
            id: row.get(0)?,
            handle: row.get(1)?,
            name: row.get(2)?,
            repository: row.get(3)?,
            developer_id: row.get(4)?,
        })
    }
}

impl PackageRegistry for Database {
    fn packages(&self, handle: Option<&str>) -> Result<Vec<Package>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, handle, name, repository, developer_id FROM packages
                 WHERE ?1 IS NULL OR handle = ?1
                 ORDER BY id",
            )
            .into_app_err("preparing package query")?;

        let rows = stmt.query_map(params![handle], Self::map_package).into_app_err("querying packages")?;
        rows.collect::<rusqlite::Result<Vec<_>>>().into_app_err("reading packages")
    }
}

impl CredentialLookup for Database {
    fn lookup(&self, provider: &str, user_id: i64) -> Result<Option<String>> {
        self.conn
            .query_row(
                "SELECT token FROM oauth_tokens WHERE lower(provider) = lower(?1) AND user_id = ?2",
                params![provider, user_id],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map(|token| token.filter(|t| !t.is_empty()))
            .into_app_err_with(|| format!("looking up {provider} token for user {user_id}"))
    }
}

impl SnapshotStore for Database {
    fn save(&self, package_id: i64, totals: &WindowTotals, computed_at: DateTime<Utc>) -> Result<()> {
        let timestamp = computed_at.to_rfc3339_opts(SecondsFormat::AutoSi, true);

        // Only a shared borrow of the connection is available here.
        let tx = self.conn.unchecked_transaction().into_app_err("starting snapshot transaction")?;
        {
            let mut stmt = tx.prepare_cached(UPSERT_SNAPSHOT).into_app_err("preparing snapshot upsert")?;
            for (window, counts) in totals.iter() {
                let _ = stmt
                    .execute(params![
                        package_id,
                        window.days(),
                        to_sql_count(counts.open_issues)?,
                        to_sql_count(counts.closed_issues)?,
                        to_sql_count(counts.open_pulls)?,
                        to_sql_count(counts.merged_pulls)?,
                        timestamp,
                    ])
                    .into_app_err_with(|| format!("writing {window} snapshot for package {package_id}"))?;
            }
        }
        tx.commit().into_app_err("committing snapshots")?;

        log::debug!(target: LOG_TARGET, "Stored {} snapshot(s) for package {package_id}", Window::COUNT);
        Ok(())
    }

    fn load(&self, package_id: i64) -> Result<Vec<StatSnapshot>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT period, open_issues, closed_issues, open_pulls, merged_pulls, date_updated
                 FROM package_issue_stats WHERE package_id = ?1 ORDER BY period DESC",
            )
            .into_app_err("preparing snapshot query")?;

        let rows = stmt
            .query_map(params![package_id], |row| {
                Ok((
                    row.get::<_, u32>(0)?,
                    [row.get::<_, i64>(1)?, row.get::<_, i64>(2)?, row.get::<_, i64>(3)?, row.get::<_, i64>(4)?],
                    row.get::<_, String>(5)?,
                ))
            })
            .into_app_err("querying snapshots")?;

        let mut snapshots = Vec::with_capacity(Window::COUNT);
        for row in rows {
            let (period, [open_issues, closed_issues, open_pulls, merged_pulls], date_updated) = row.into_app_err("reading snapshot row")?;
            let window = Window::from_days(period).ok_or_else(|| app_err!("unknown snapshot period {period} for package {package_id}"))?;
            let computed_at = DateTime::parse_from_rfc3339(&date_updated)
                .into_app_err_with(|| format!("parsing snapshot timestamp '{date_updated}'"))?
                .to_utc();

            snapshots.push(StatSnapshot {
                package_id,
                window,
                counts: WindowCounts {
                    open_issues: from_sql_count(open_issues)?,
                    closed_issues: from_sql_count(closed_issues)?,
                    open_pulls: from_sql_count(open_pulls)?,
                    merged_pulls: from_sql_count(merged_pulls)?,
                },
                computed_at,
            });
        }

        Ok(snapshots)
    }
}

fn to_sql_count(count: u64) -> Result<i64> {
    i64::try_from(count).into_app_err_with(|| format!("count {count} does not fit in a database integer"))
}

fn from_sql_count(value: i64) -> Result<u64> {
    u64::try_from(value).into_app_err_with(|| format!("stored count {value} is negative"))
}
