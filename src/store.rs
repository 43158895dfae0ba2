use anyhow::{Context, Result};
use rusqlite::{params, Connection};
use std::path::Path;
use std::sync::Mutex;

/// One persisted extraction result. Records are append-only; re-running a
/// batch inserts fresh rows rather than updating old ones.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PriceRecord {
    pub title: String,
    pub url: String,
    pub price: Option<String>,
}

/// Handle to the SQLite store. The connection is serialized behind a mutex
/// so one handle can be shared across handler invocations.
pub struct Store {
    conn: Mutex<Connection>,
}

impl Store {
    /// Open (or create) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("opening database {}", path.display()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// In-memory store, used by tests.
    pub fn in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory().context("opening in-memory database")?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Append the whole batch inside one transaction, creating the table on
    /// first use. Either every record lands or none do.
    pub fn append_batch(&self, records: &[PriceRecord]) -> Result<()> {
        let mut conn = self.conn.lock().unwrap();
        let tx = conn.transaction().context("starting batch transaction")?;
        tx.execute(
            "CREATE TABLE IF NOT EXISTS sites (
                title TEXT,
                url TEXT,
                price TEXT
            )",
            [],
        )
        .context("creating sites table")?;
        {
            let mut stmt = tx
                .prepare("INSERT INTO sites (title, url, price) VALUES (?1, ?2, ?3)")
                .context("preparing insert")?;
            for record in records {
                stmt.execute(params![record.title, record.url, record.price])
                    .with_context(|| format!("inserting record for {}", record.url))?;
            }
        }
        tx.commit().context("committing batch")
    }

    /// All records in insertion order.
    pub fn records(&self) -> Result<Vec<PriceRecord>> {
        let conn = self.conn.lock().unwrap();
        let mut stmt = conn
            .prepare("SELECT title, url, price FROM sites ORDER BY rowid")
            .context("preparing select")?;
        let rows = stmt
            .query_map([], |row| {
                Ok(PriceRecord {
                    title: row.get(0)?,
                    url: row.get(1)?,
                    price: row.get(2)?,
                })
            })
            .context("querying records")?;
        rows.collect::<Result<Vec<_>, _>>().context("reading records")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(title: &str, url: &str, price: Option<&str>) -> PriceRecord {
        PriceRecord {
            title: title.to_string(),
            url: url.to_string(),
            price: price.map(str::to_string),
        }
    }

    #[test]
    fn appends_whole_batch_in_order() {
        let store = Store::in_memory().unwrap();
        let batch = vec![
            record("Widget", "http://example.test/a", Some("12.99 USD")),
            record("Gadget", "http://example.test/b", None),
        ];
        store.append_batch(&batch).unwrap();
        assert_eq!(store.records().unwrap(), batch);
    }

    #[test]
    fn reupload_appends_duplicates() {
        let store = Store::in_memory().unwrap();
        let batch = vec![record("Widget", "http://example.test/a", Some("12.99 USD"))];
        store.append_batch(&batch).unwrap();
        store.append_batch(&batch).unwrap();
        let records = store.records().unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0], records[1]);
    }

    #[test]
    fn empty_batch_still_creates_table() {
        let store = Store::in_memory().unwrap();
        store.append_batch(&[]).unwrap();
        assert!(store.records().unwrap().is_empty());
    }

    #[test]
    fn survives_reopen_on_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sites.db");
        {
            let store = Store::open(&path).unwrap();
            store
                .append_batch(&[record("Widget", "http://example.test/a", None)])
                .unwrap();
        }
        let store = Store::open(&path).unwrap();
        assert_eq!(store.records().unwrap().len(), 1);
    }
}
