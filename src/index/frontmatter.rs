//! Key/value frontmatter index.
//!
//! Pages may open with a frontmatter block:
//!
//! ```text
//! ---
//! title: Lab Inventory
//! owner: ines
//! ---
//! ```
//!
//! This backend mirrors those fields into a queryable sqlite table.

use super::operator::{IndexError, IndexOperator};
use crate::page_store::PageStore;
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

pub struct FrontmatterIndex {
    conn: Mutex<Connection>,
    store: Arc<dyn PageStore>,
}

impl FrontmatterIndex {
    pub fn new(store: Arc<dyn PageStore>, db_path: &Path) -> Result<Self, IndexError> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS page_frontmatter (
                page_id TEXT NOT NULL,
                key TEXT NOT NULL,
                value TEXT NOT NULL,
                PRIMARY KEY (page_id, key)
            );
        "#,
        )?;

        Ok(Self {
            conn: Mutex::new(conn),
            store,
        })
    }

    /// Value of one frontmatter field, if indexed.
    pub fn value_of(&self, page_id: &str, key: &str) -> Result<Option<String>, IndexError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt =
            conn.prepare("SELECT value FROM page_frontmatter WHERE page_id = ? AND key = ?")?;
        let mut rows = stmt.query(params![page_id, key])?;
        match rows.next()? {
            Some(row) => Ok(Some(row.get(0)?)),
            None => Ok(None),
        }
    }

    /// Pages whose frontmatter has `key` = `value`, sorted by identifier.
    pub fn pages_with(&self, key: &str, value: &str) -> Result<Vec<String>, IndexError> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn.prepare(
            "SELECT page_id FROM page_frontmatter WHERE key = ? AND value = ? ORDER BY page_id",
        )?;
        let rows = stmt.query_map(params![key, value], |row| row.get(0))?;
        Ok(rows.collect::<Result<Vec<String>, _>>()?)
    }
}

/// Extract `key: value` pairs from a leading frontmatter block.
///
/// Returns nothing unless the content starts with a `---` line and closes
/// the block with another one.
fn parse_frontmatter(content: &str) -> Vec<(String, String)> {
    let mut lines = content.lines();
    if lines.next().map(str::trim) != Some("---") {
        return Vec::new();
    }

    let mut fields = Vec::new();
    for line in lines {
        let line = line.trim();
        if line == "---" {
            return fields;
        }
        if let Some((key, value)) = line.split_once(':') {
            let key = key.trim();
            if !key.is_empty() {
                fields.push((key.to_string(), value.trim().to_string()));
            }
        }
    }

    // Never closed, so not a frontmatter block after all
    Vec::new()
}

impl IndexOperator for FrontmatterIndex {
    fn name(&self) -> &'static str {
        "frontmatter"
    }

    fn add_page(&self, page_id: &str) -> Result<(), IndexError> {
        let content = self.store.read(page_id)?;
        let text = String::from_utf8_lossy(&content);
        let fields = parse_frontmatter(&text);

        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction()?;
        tx.execute(
            "DELETE FROM page_frontmatter WHERE page_id = ?",
            params![page_id],
        )?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO page_frontmatter (page_id, key, value) VALUES (?, ?, ?)",
            )?;
            for (key, value) in &fields {
                stmt.execute(params![page_id, key, value])?;
            }
        }
        tx.commit()?;

        debug!(
            "Frontmatter index updated for {} ({} fields)",
            page_id,
            fields.len()
        );
        Ok(())
    }

    fn remove_page(&self, page_id: &str) -> Result<(), IndexError> {
        let conn = self.conn.lock().unwrap();
        conn.execute(
            "DELETE FROM page_frontmatter WHERE page_id = ?",
            params![page_id],
        )?;
        Ok(())
    }
}
