pub mod drills;
pub mod organizations;
pub mod tables;
pub mod users;

use redb::{Database, Error as RedbError, ReadableTable, Table};
use serde::{de::DeserializeOwned, Serialize};
use std::path::Path;
use std::sync::Arc;

use crate::error::Result;

/// Database handle type (Arc-wrapped for sharing across handlers)
pub type Db = Arc<Database>;

/// Open or create the redb database at the given path
///
/// Creates all required tables on first run.
#[allow(clippy::result_large_err)]
pub fn open_database(path: impl AsRef<Path>) -> std::result::Result<Db, RedbError> {
    tracing::info!("Opening database at: {:?}", path.as_ref());

    // Create parent directory if it doesn't exist
    if let Some(parent) = path.as_ref().parent() {
        if !parent.as_os_str().is_empty() && !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|e| {
                tracing::error!("Failed to create database directory: {}", e);
                RedbError::Io(e)
            })?;
        }
    }

    let db = Database::create(path)?;
    init_tables(&db)?;

    tracing::info!("Database initialized successfully");

    Ok(Arc::new(db))
}

/// Create every collection table if it does not exist yet
#[allow(clippy::result_large_err)]
pub fn init_tables(db: &Database) -> std::result::Result<(), RedbError> {
    let write_txn = db.begin_write()?;
    {
        let _ = write_txn.open_table(tables::USERS)?;
        let _ = write_txn.open_table(tables::USER_EMAILS)?;
        let _ = write_txn.open_table(tables::DRILLS)?;
        let _ = write_txn.open_table(tables::ORGANIZATIONS)?;
        let _ = write_txn.open_table(tables::ORG_COMPANY_IDS)?;
    }
    write_txn.commit()?;
    Ok(())
}

/// Run blocking store work off the async runtime
pub async fn run<T, F>(db: &Db, work: F) -> Result<T>
where
    F: FnOnce(&Database) -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    let db = db.clone();
    tokio::task::spawn_blocking(move || work(&*db)).await?
}

/// Decode a single record by key
pub(crate) fn read_record<T, R>(table: &R, key: &str) -> Result<Option<T>>
where
    T: DeserializeOwned,
    R: ReadableTable<&'static str, &'static [u8]>,
{
    match table.get(key)? {
        Some(bytes) => Ok(Some(bincode::deserialize(bytes.value())?)),
        None => Ok(None),
    }
}

/// Decode every record in a collection
pub(crate) fn scan_records<T, R>(table: &R) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    R: ReadableTable<&'static str, &'static [u8]>,
{
    let mut records = Vec::new();
    for entry in table.iter()? {
        let (_, bytes) = entry?;
        records.push(bincode::deserialize(bytes.value())?);
    }
    Ok(records)
}

/// Encode and upsert a record
pub(crate) fn write_record<T: Serialize>(
    table: &mut Table<'_, &'static str, &'static [u8]>,
    key: &str,
    record: &T,
) -> Result<()> {
    let bytes = bincode::serialize(record)?;
    table.insert(key, bytes.as_slice())?;
    Ok(())
}
