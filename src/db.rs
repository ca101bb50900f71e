use std::path::Path;

use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::Connection;

use crate::document::OrganizationDocument;

pub fn connect(path: &Path) -> Result<Connection> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let conn = Connection::open(path)?;
    conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        CREATE TABLE IF NOT EXISTS organizations (
            uuid              TEXT PRIMARY KEY,
            organization_name TEXT NOT NULL,
            stamped_at        TEXT NOT NULL,
            founded_on        TEXT,
            country           TEXT,
            city              TEXT,
            linkedin          TEXT NOT NULL DEFAULT '',
            funding_stage     TEXT,
            document          TEXT NOT NULL,
            loaded_at         TEXT NOT NULL DEFAULT (datetime('now'))
        );
        CREATE INDEX IF NOT EXISTS idx_organizations_stamped ON organizations(stamped_at);
        ",
    )?;
    Ok(())
}

/// Fixed-width RFC 3339 so text ordering matches time ordering.
fn stamp(t: &DateTime<Utc>) -> String {
    t.to_rfc3339_opts(SecondsFormat::Micros, true)
}

// ── Loading ──

/// Decode an extraction artifact (one JSON array of documents).
pub fn read_artifact(path: &Path) -> Result<Vec<OrganizationDocument>> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let docs = serde_json::from_str(&raw).with_context(|| format!("decoding {}", path.display()))?;
    Ok(docs)
}

/// Upsert by uuid; a later extraction replaces the stored document.
pub fn insert_documents(conn: &Connection, docs: &[OrganizationDocument]) -> Result<usize> {
    let tx = conn.unchecked_transaction()?;
    let mut count = 0;
    {
        let mut stmt = tx.prepare(
            "INSERT OR REPLACE INTO organizations
             (uuid, organization_name, stamped_at, founded_on, country, city, linkedin, funding_stage, document)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
        )?;
        for d in docs {
            let founded_on = d.founded_on.map(|f| f.to_string());
            count += stmt.execute(rusqlite::params![
                d.uuid,
                d.organization_name,
                stamp(&d.timestamp),
                founded_on,
                d.country,
                d.city,
                d.linkedin,
                d.funding_stage,
                serde_json::to_string(d)?,
            ])?;
        }
    }
    tx.commit()?;
    Ok(count)
}

// ── Queries ──

pub struct LinkedInTarget {
    pub uuid: String,
    pub organization_name: String,
    pub linkedin: String,
    pub stamped_at: String,
}

/// Organizations stamped after midnight UTC of `since` that have a LinkedIn
/// page, newest first.
pub fn fetch_after(conn: &Connection, since: NaiveDate, limit: Option<usize>) -> Result<Vec<LinkedInTarget>> {
    let cutoff = stamp(&since.and_time(chrono::NaiveTime::MIN).and_utc());
    let sql = format!(
        "SELECT uuid, organization_name, linkedin, stamped_at
         FROM organizations
         WHERE stamped_at > ?1 AND linkedin <> ''
         ORDER BY stamped_at DESC{}",
        match limit {
            Some(n) => format!(" LIMIT {}", n),
            None => String::new(),
        }
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt
        .query_map([cutoff], |row| {
            Ok(LinkedInTarget {
                uuid: row.get(0)?,
                organization_name: row.get(1)?,
                linkedin: row.get(2)?,
                stamped_at: row.get(3)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;
    Ok(rows)
}

pub fn count(conn: &Connection) -> Result<i64> {
    Ok(conn.query_row("SELECT COUNT(*) FROM organizations", [], |r| r.get(0))?)
}

pub fn fetch_document(conn: &Connection, uuid: &str) -> Result<Option<OrganizationDocument>> {
    let mut stmt = conn.prepare("SELECT document FROM organizations WHERE uuid = ?1")?;
    let mut rows = stmt.query([uuid])?;
    match rows.next()? {
        Some(row) => {
            let raw: String = row.get(0)?;
            Ok(Some(serde_json::from_str(&raw)?))
        }
        None => Ok(None),
    }
}
