use redb::{Database, ReadableTable};

use crate::db::{read_record, scan_records, tables, write_record};
use crate::error::{AppError, Result};
use crate::models::OrganizationRecord;

/// Insert a new organization, enforcing company id uniqueness
pub fn insert_organization(db: &Database, org: &OrganizationRecord) -> Result<()> {
    let write_txn = db.begin_write()?;
    {
        let mut company_ids = write_txn.open_table(tables::ORG_COMPANY_IDS)?;
        if company_ids.get(org.company_id.as_str())?.is_some() {
            return Err(AppError::invalid(
                "Organization with this Company ID already exists",
            ));
        }
        company_ids.insert(org.company_id.as_str(), org.id.as_str())?;

        let mut orgs = write_txn.open_table(tables::ORGANIZATIONS)?;
        write_record(&mut orgs, &org.id, org)?;
    }
    write_txn.commit()?;
    Ok(())
}

pub fn get_organization(db: &Database, id: &str) -> Result<Option<OrganizationRecord>> {
    let read_txn = db.begin_read()?;
    let orgs = read_txn.open_table(tables::ORGANIZATIONS)?;
    read_record(&orgs, id)
}

pub fn list_organizations(db: &Database) -> Result<Vec<OrganizationRecord>> {
    let read_txn = db.begin_read()?;
    let orgs = read_txn.open_table(tables::ORGANIZATIONS)?;
    scan_records(&orgs)
}

/// Read-modify-write a single organization; `None` when it does not exist
pub fn update_organization<F>(
    db: &Database,
    id: &str,
    apply: F,
) -> Result<Option<OrganizationRecord>>
where
    F: FnOnce(&mut OrganizationRecord),
{
    let write_txn = db.begin_write()?;
    let updated = {
        let mut orgs = write_txn.open_table(tables::ORGANIZATIONS)?;
        let mut org: OrganizationRecord = match read_record(&orgs, id)? {
            Some(org) => org,
            None => return Ok(None),
        };
        apply(&mut org);
        org.updated_at = chrono::Utc::now();
        write_record(&mut orgs, id, &org)?;
        org
    };
    write_txn.commit()?;
    Ok(Some(updated))
}

/// Delete an organization and release its company id
pub fn remove_organization(db: &Database, id: &str) -> Result<Option<OrganizationRecord>> {
    let write_txn = db.begin_write()?;
    let removed = {
        let mut orgs = write_txn.open_table(tables::ORGANIZATIONS)?;
        let existing: Option<OrganizationRecord> = read_record(&orgs, id)?;
        if let Some(org) = &existing {
            orgs.remove(id)?;
            let mut company_ids = write_txn.open_table(tables::ORG_COMPANY_IDS)?;
            company_ids.remove(org.company_id.as_str())?;
        }
        existing
    };
    write_txn.commit()?;
    Ok(removed)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_tables;
    use tempfile::TempDir;

    fn test_db(dir: &TempDir) -> Database {
        let db = Database::create(dir.path().join("test.redb")).unwrap();
        init_tables(&db).unwrap();
        db
    }

    #[test]
    fn test_company_id_is_unique_until_deleted() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);

        let first = OrganizationRecord::new("ACME".into(), "Acme".into(), "u1");
        insert_organization(&db, &first).unwrap();

        let dup = OrganizationRecord::new("ACME".into(), "Acme Two".into(), "u2");
        assert!(matches!(
            insert_organization(&db, &dup),
            Err(AppError::InvalidInput(_))
        ));

        remove_organization(&db, &first.id).unwrap();
        insert_organization(&db, &dup).unwrap();
        assert_eq!(list_organizations(&db).unwrap().len(), 1);
    }

    #[test]
    fn test_update_counter() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);
        let org = OrganizationRecord::new("ACME".into(), "Acme".into(), "u1");
        insert_organization(&db, &org).unwrap();

        let updated = update_organization(&db, &org.id, |o| o.total_drills += 4)
            .unwrap()
            .unwrap();
        assert_eq!(updated.total_drills, 4);
        assert_eq!(
            get_organization(&db, &org.id).unwrap().unwrap().total_drills,
            4
        );
    }
}
