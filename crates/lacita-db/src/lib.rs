// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Context, Result, bail};
use lacita_app::{
    Consultation, ConsultationId, ConsultationStatus, ListPage, OwnerId, PageRequest, StatusCounts,
    StatusFilter,
};
use rusqlite::types::Value;
use rusqlite::{Connection, OptionalExtension, params, params_from_iter};
use std::collections::BTreeSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use time::format_description::well_known::Rfc3339;
use time::{OffsetDateTime, UtcOffset};
use uuid::Uuid;

mod validation;
pub use validation::{escape_like, normalize_search, validate_db_path};

pub const APP_NAME: &str = "lacita";

const REQUIRED_SCHEMA: &[(&str, &[&str])] = &[(
    "consultations",
    &[
        "id",
        "user_id",
        "first_name",
        "last_name",
        "reason",
        "scheduled_at",
        "is_completed",
        "created_at",
        "updated_at",
    ],
)];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct RequiredIndex {
    name: &'static str,
    create_sql: &'static str,
}

const REQUIRED_INDEXES: &[RequiredIndex] = &[
    RequiredIndex {
        name: "idx_consultations_user_id",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_consultations_user_id ON consultations (user_id);",
    },
    RequiredIndex {
        name: "idx_consultations_user_schedule",
        create_sql: "CREATE INDEX IF NOT EXISTS idx_consultations_user_schedule ON consultations (user_id, scheduled_at DESC);",
    },
];

// Mirrors lacita_app::derive_status exactly; the bound parameter is the
// caller-supplied `now` in storage form.
const STATUS_CASE: &str = "CASE \
     WHEN is_completed = 1 THEN 'complete' \
     WHEN is_completed = 0 THEN 'incomplete' \
     WHEN scheduled_at > ? THEN 'upcoming' \
     ELSE 'pending' \
   END";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewConsultation {
    pub first_name: String,
    pub last_name: String,
    pub reason: String,
    pub scheduled_at: OffsetDateTime,
}

pub struct Store {
    conn: Connection,
}

impl Store {
    pub fn open(path: &Path) -> Result<Self> {
        let printable = path.to_string_lossy().to_string();
        validate_db_path(&printable)?;
        let conn = Connection::open(path)
            .with_context(|| format!("open database at {}", path.display()))?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("open in-memory database")?;
        configure_connection(&conn)?;
        Ok(Self { conn })
    }

    pub fn raw_connection(&self) -> &Connection {
        &self.conn
    }

    pub fn bootstrap(&self) -> Result<()> {
        if has_user_tables(&self.conn)? {
            validate_schema(&self.conn)?;
        } else {
            self.conn
                .execute_batch(include_str!("sql/schema.sql"))
                .context("create schema")?;
        }

        ensure_required_indexes(&self.conn)?;
        Ok(())
    }

    pub fn create_consultation(
        &self,
        owner: &OwnerId,
        new: &NewConsultation,
        now: OffsetDateTime,
    ) -> Result<ConsultationId> {
        let id = ConsultationId::new(Uuid::new_v4().to_string());
        let now_raw = format_datetime(now)?;
        let scheduled_raw = format_datetime(new.scheduled_at)?;

        self.conn
            .execute(
                "
                INSERT INTO consultations
                  (id, user_id, first_name, last_name, reason,
                   scheduled_at, is_completed, created_at, updated_at)
                VALUES (?, ?, ?, ?, ?, ?, NULL, ?, ?)
                ",
                params![
                    id.as_str(),
                    owner.as_str(),
                    new.first_name,
                    new.last_name,
                    new.reason,
                    scheduled_raw,
                    now_raw,
                    now_raw,
                ],
            )
            .context("insert consultation")?;
        Ok(id)
    }

    /// One page of the owner's consultations, newest schedule first
    /// with `id DESC` as the stable tiebreak. The search predicate is
    /// skipped for whitespace-only input; the status filter is derived
    /// in-store from the same rule the app uses. `has_more` is the
    /// count-equals-limit heuristic, so callers must tolerate one
    /// trailing empty page.
    pub fn list_page(
        &self,
        owner: &OwnerId,
        request: &PageRequest,
        now: OffsetDateTime,
    ) -> Result<ListPage> {
        if request.limit == 0 {
            bail!("page limit must be positive");
        }
        let now_raw = format_datetime(now)?;

        let mut sql = format!(
            "
            SELECT
              id, user_id, first_name, last_name, reason,
              scheduled_at, is_completed, created_at, updated_at,
              {STATUS_CASE} AS status
            FROM consultations
            WHERE user_id = ?
            ",
        );
        let mut values: Vec<Value> = vec![
            Value::from(now_raw.clone()),
            Value::from(owner.as_str().to_owned()),
        ];

        if let Some(term) = normalize_search(&request.search) {
            // SQLite LIKE is case-insensitive for ASCII.
            sql.push_str("  AND reason LIKE ? ESCAPE '\\'\n");
            values.push(Value::from(format!("%{}%", escape_like(&term))));
        }

        if let StatusFilter::Only(status) = request.filter {
            sql.push_str(&format!("  AND {STATUS_CASE} = ?\n"));
            values.push(Value::from(now_raw));
            values.push(Value::from(status.as_str().to_owned()));
        }

        sql.push_str("ORDER BY scheduled_at DESC, id DESC\nLIMIT ? OFFSET ?");
        values.push(Value::from(request.limit as i64));
        values.push(Value::from(request.offset as i64));

        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("prepare consultations page query")?;
        let mapped = stmt
            .query_map(params_from_iter(values), consultation_from_row)
            .context("query consultations page")?;
        let rows = mapped
            .collect::<rusqlite::Result<Vec<_>>>()
            .context("collect consultations page")?;

        let has_more = rows.len() == request.limit;
        Ok(ListPage { rows, has_more })
    }

    pub fn get_consultation(
        &self,
        owner: &OwnerId,
        id: &ConsultationId,
        now: OffsetDateTime,
    ) -> Result<Option<Consultation>> {
        let now_raw = format_datetime(now)?;
        let sql = format!(
            "
            SELECT
              id, user_id, first_name, last_name, reason,
              scheduled_at, is_completed, created_at, updated_at,
              {STATUS_CASE} AS status
            FROM consultations
            WHERE user_id = ? AND id = ?
            ",
        );
        self.conn
            .query_row(
                &sql,
                params![now_raw, owner.as_str(), id.as_str()],
                consultation_from_row,
            )
            .optional()
            .context("query consultation by id")
    }

    /// Scoped completion update: only a row matching both the id and
    /// the owner is touched. Returns whether a row was affected; an
    /// update against someone else's row is a silent no-op the caller
    /// treats as failure.
    pub fn set_completion(
        &self,
        owner: &OwnerId,
        id: &ConsultationId,
        is_completed: bool,
        now: OffsetDateTime,
    ) -> Result<bool> {
        let now_raw = format_datetime(now)?;
        let affected = self
            .conn
            .execute(
                "
                UPDATE consultations
                SET is_completed = ?, updated_at = ?
                WHERE id = ? AND user_id = ?
                ",
                params![is_completed, now_raw, id.as_str(), owner.as_str()],
            )
            .context("update consultation completion")?;
        Ok(affected > 0)
    }

    /// Per-status counts for the owner, derived with the same rule as
    /// the list query so the two views agree for a given `now`.
    pub fn status_counts(&self, owner: &OwnerId, now: OffsetDateTime) -> Result<StatusCounts> {
        let now_raw = format_datetime(now)?;
        let sql = format!(
            "
            SELECT {STATUS_CASE} AS status, COUNT(*)
            FROM consultations
            WHERE user_id = ?
            GROUP BY status
            ",
        );
        let mut stmt = self
            .conn
            .prepare(&sql)
            .context("prepare status counts query")?;
        let mapped = stmt
            .query_map(params![now_raw, owner.as_str()], |row| {
                let status: String = row.get(0)?;
                let count: i64 = row.get(1)?;
                Ok((status, count))
            })
            .context("query status counts")?;

        let mut counts = StatusCounts::default();
        for entry in mapped {
            let (status_raw, count) = entry.context("collect status counts")?;
            let status = ConsultationStatus::parse(&status_raw)
                .with_context(|| format!("unknown consultation status {status_raw}"))?;
            let count = usize::try_from(count).unwrap_or(0);
            match status {
                ConsultationStatus::Upcoming => counts.upcoming = count,
                ConsultationStatus::Pending => counts.pending = count,
                ConsultationStatus::Complete => counts.complete = count,
                ConsultationStatus::Incomplete => counts.incomplete = count,
            }
            counts.total += count;
        }
        Ok(counts)
    }
}

pub fn default_db_path() -> Result<PathBuf> {
    if let Some(override_path) = env::var_os("LACITA_DB_PATH") {
        return Ok(PathBuf::from(override_path));
    }

    let data_root = dirs::data_local_dir().ok_or_else(|| {
        anyhow::anyhow!(
            "cannot resolve data directory; set LACITA_DB_PATH to a writable database path"
        )
    })?;

    let app_dir = data_root.join(APP_NAME);
    fs::create_dir_all(&app_dir)
        .with_context(|| format!("create data directory {}", app_dir.display()))?;
    Ok(app_dir.join("lacita.db"))
}

fn consultation_from_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Consultation> {
    let scheduled_raw: String = row.get(5)?;
    let created_raw: String = row.get(7)?;
    let updated_raw: String = row.get(8)?;
    let status_raw: String = row.get(9)?;

    let status = ConsultationStatus::parse(&status_raw).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            9,
            rusqlite::types::Type::Text,
            Box::new(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("unknown consultation status {status_raw}"),
            )),
        )
    })?;

    Ok(Consultation {
        id: ConsultationId::new(row.get::<_, String>(0)?),
        owner_id: OwnerId::new(row.get::<_, String>(1)?),
        first_name: row.get(2)?,
        last_name: row.get(3)?,
        reason: row.get(4)?,
        scheduled_at: parse_datetime(&scheduled_raw).map_err(to_sql_error)?,
        is_completed: row.get(6)?,
        status,
        created_at: parse_datetime(&created_raw).map_err(to_sql_error)?,
        updated_at: parse_datetime(&updated_raw).map_err(to_sql_error)?,
    })
}

fn has_user_tables(conn: &Connection) -> Result<bool> {
    let count: i64 = conn
        .query_row(
            "
            SELECT COUNT(*)
            FROM sqlite_master
            WHERE type = 'table'
              AND name NOT LIKE 'sqlite_%'
            ",
            [],
            |row| row.get(0),
        )
        .context("count user tables")?;
    Ok(count > 0)
}

fn validate_schema(conn: &Connection) -> Result<()> {
    for (table, required_columns) in REQUIRED_SCHEMA {
        if !table_exists(conn, table)? {
            bail!(
                "database is missing required table `{table}`; use a lacita-compatible database or migrate first"
            );
        }

        let columns = table_columns(conn, table)?;
        let missing: Vec<&str> = required_columns
            .iter()
            .copied()
            .filter(|column| !columns.contains(*column))
            .collect();

        if !missing.is_empty() {
            bail!(
                "table `{table}` is missing required columns: {}; run migration before launching",
                missing.join(", ")
            );
        }
    }

    Ok(())
}

fn ensure_required_indexes(conn: &Connection) -> Result<()> {
    for index in REQUIRED_INDEXES {
        conn.execute_batch(index.create_sql)
            .with_context(|| format!("ensure required index `{}`", index.name))?;
    }
    Ok(())
}

fn table_exists(conn: &Connection, table: &str) -> Result<bool> {
    let exists = conn
        .query_row(
            "
            SELECT EXISTS(
              SELECT 1
              FROM sqlite_master
              WHERE type = 'table' AND name = ?
            )
            ",
            params![table],
            |row| row.get::<_, i64>(0),
        )
        .with_context(|| format!("check table existence for {table}"))?;
    Ok(exists == 1)
}

fn table_columns(conn: &Connection, table: &str) -> Result<BTreeSet<String>> {
    let mut stmt = conn
        .prepare(&format!("PRAGMA table_info({table})"))
        .with_context(|| format!("inspect columns for {table}"))?;
    let rows = stmt
        .query_map([], |row| row.get::<_, String>(1))
        .with_context(|| format!("query column info for {table}"))?;

    let names = rows
        .collect::<rusqlite::Result<BTreeSet<_>>>()
        .with_context(|| format!("collect columns for {table}"))?;
    Ok(names)
}

fn configure_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA foreign_keys = ON;
        PRAGMA journal_mode = WAL;
        PRAGMA synchronous = NORMAL;
        PRAGMA busy_timeout = 5000;
        ",
    )
    .context("configure sqlite pragmas")
}

// Normalized to UTC before formatting so that text ordering of the
// stored column matches chronological ordering.
fn format_datetime(value: OffsetDateTime) -> Result<String> {
    value
        .to_offset(UtcOffset::UTC)
        .format(&Rfc3339)
        .context("format timestamp")
}

fn parse_datetime(raw: &str) -> Result<OffsetDateTime> {
    OffsetDateTime::parse(raw, &Rfc3339)
        .with_context(|| format!("unsupported datetime format {raw:?}"))
}

fn to_sql_error(error: anyhow::Error) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Text,
        Box::new(std::io::Error::new(
            std::io::ErrorKind::InvalidData,
            error.to_string(),
        )),
    )
}
