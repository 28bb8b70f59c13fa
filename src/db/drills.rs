use redb::Database;

use crate::db::{read_record, scan_records, tables, write_record};
use crate::error::Result;
use crate::models::DrillRecord;

/// Insert or overwrite a drill document
pub fn save_drill(db: &Database, drill: &DrillRecord) -> Result<()> {
    let write_txn = db.begin_write()?;
    {
        let mut drills = write_txn.open_table(tables::DRILLS)?;
        write_record(&mut drills, &drill.id, drill)?;
    }
    write_txn.commit()?;
    Ok(())
}

pub fn get_drill(db: &Database, id: &str) -> Result<Option<DrillRecord>> {
    let read_txn = db.begin_read()?;
    let drills = read_txn.open_table(tables::DRILLS)?;
    read_record(&drills, id)
}

/// Remove a drill, returning the removed document if it existed
pub fn remove_drill(db: &Database, id: &str) -> Result<Option<DrillRecord>> {
    let write_txn = db.begin_write()?;
    let removed = {
        let mut drills = write_txn.open_table(tables::DRILLS)?;
        let existing: Option<DrillRecord> = read_record(&drills, id)?;
        if existing.is_some() {
            drills.remove(id)?;
        }
        existing
    };
    write_txn.commit()?;
    Ok(removed)
}

/// Every drill in the store, unordered
pub fn list_drills(db: &Database) -> Result<Vec<DrillRecord>> {
    let read_txn = db.begin_read()?;
    let drills = read_txn.open_table(tables::DRILLS)?;
    scan_records(&drills)
}

/// Drills matching `keep`, sorted by scheduled date ascending
pub fn select_drills<F>(db: &Database, keep: F) -> Result<Vec<DrillRecord>>
where
    F: Fn(&DrillRecord) -> bool,
{
    let mut drills: Vec<DrillRecord> = list_drills(db)?.into_iter().filter(|d| keep(d)).collect();
    drills.sort_by_key(|d| d.scheduled_date);
    Ok(drills)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_tables;
    use chrono::{Duration, Utc};
    use tempfile::TempDir;

    fn test_db(dir: &TempDir) -> Database {
        let db = Database::create(dir.path().join("test.redb")).unwrap();
        init_tables(&db).unwrap();
        db
    }

    #[test]
    fn test_select_sorts_by_scheduled_date() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);
        let now = Utc::now();

        let later = DrillRecord::new("u1", "Later".into(), now + Duration::days(5));
        let sooner = DrillRecord::new("u1", "Sooner".into(), now + Duration::days(1));
        let other = DrillRecord::new("u2", "Other".into(), now);
        for d in [&later, &sooner, &other] {
            save_drill(&db, d).unwrap();
        }

        let mine = select_drills(&db, |d| d.user_id == "u1").unwrap();
        let names: Vec<_> = mine.iter().map(|d| d.drill_name.as_str()).collect();
        assert_eq!(names, vec!["Sooner", "Later"]);
    }

    #[test]
    fn test_remove_returns_previous_document() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);
        let drill = DrillRecord::new("u1", "Fire".into(), Utc::now());
        save_drill(&db, &drill).unwrap();

        let removed = remove_drill(&db, &drill.id).unwrap();
        assert_eq!(removed.map(|d| d.id), Some(drill.id.clone()));
        assert!(get_drill(&db, &drill.id).unwrap().is_none());
        assert!(remove_drill(&db, &drill.id).unwrap().is_none());
    }
}
