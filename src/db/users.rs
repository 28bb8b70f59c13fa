use std::collections::HashMap;

use redb::{Database, ReadableTable};

use crate::db::{read_record, scan_records, tables, write_record};
use crate::error::{AppError, Result};
use crate::models::{user::normalize_email, UserRecord};

/// Insert a new user, enforcing email uniqueness
pub fn insert_user(db: &Database, user: &UserRecord) -> Result<()> {
    let write_txn = db.begin_write()?;
    {
        let mut emails = write_txn.open_table(tables::USER_EMAILS)?;
        if emails.get(user.email.as_str())?.is_some() {
            tracing::info!("Registration rejected, email already in use");
            return Err(AppError::invalid("User already exists"));
        }
        emails.insert(user.email.as_str(), user.id.as_str())?;

        let mut users = write_txn.open_table(tables::USERS)?;
        write_record(&mut users, &user.id, user)?;
    }
    write_txn.commit()?;
    Ok(())
}

pub fn get_user(db: &Database, id: &str) -> Result<Option<UserRecord>> {
    let read_txn = db.begin_read()?;
    let users = read_txn.open_table(tables::USERS)?;
    read_record(&users, id)
}

pub fn find_user_by_email(db: &Database, email: &str) -> Result<Option<UserRecord>> {
    let read_txn = db.begin_read()?;
    let emails = read_txn.open_table(tables::USER_EMAILS)?;
    let user_id = match emails.get(normalize_email(email).as_str())? {
        Some(id) => id.value().to_string(),
        None => return Ok(None),
    };
    let users = read_txn.open_table(tables::USERS)?;
    read_record(&users, &user_id)
}

pub fn list_users(db: &Database) -> Result<Vec<UserRecord>> {
    let read_txn = db.begin_read()?;
    let users = read_txn.open_table(tables::USERS)?;
    scan_records(&users)
}

/// All users keyed by id
pub fn user_directory(db: &Database) -> Result<HashMap<String, UserRecord>> {
    Ok(list_users(db)?
        .into_iter()
        .map(|u| (u.id.clone(), u))
        .collect())
}

/// Read-modify-write a single user in one transaction.
///
/// Returns `None` when the user does not exist.
pub fn update_user<F>(db: &Database, id: &str, apply: F) -> Result<Option<UserRecord>>
where
    F: FnOnce(&mut UserRecord),
{
    let write_txn = db.begin_write()?;
    let updated = {
        let mut users = write_txn.open_table(tables::USERS)?;
        let mut user: UserRecord = match read_record(&users, id)? {
            Some(user) => user,
            None => return Ok(None),
        };
        apply(&mut user);
        user.updated_at = chrono::Utc::now();
        write_record(&mut users, id, &user)?;
        user
    };
    write_txn.commit()?;
    Ok(Some(updated))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::init_tables;
    use crate::models::UserRole;
    use tempfile::TempDir;

    fn test_db(dir: &TempDir) -> Database {
        let db = Database::create(dir.path().join("test.redb")).unwrap();
        init_tables(&db).unwrap();
        db
    }

    fn user(email: &str) -> UserRecord {
        UserRecord::new(
            "Test".into(),
            email,
            "hash".into(),
            "Acme".into(),
            "default-team".into(),
            UserRole::Member,
        )
    }

    #[test]
    fn test_duplicate_email_rejected() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);

        insert_user(&db, &user("a@example.com")).unwrap();
        let err = insert_user(&db, &user("A@Example.com")).unwrap_err();
        assert!(matches!(err, AppError::InvalidInput(_)));
        assert_eq!(list_users(&db).unwrap().len(), 1);
    }

    #[test]
    fn test_find_by_email_is_case_insensitive() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);
        let u = user("mixed@example.com");
        insert_user(&db, &u).unwrap();

        let found = find_user_by_email(&db, "MIXED@example.com").unwrap().unwrap();
        assert_eq!(found.id, u.id);
        assert!(find_user_by_email(&db, "nobody@example.com").unwrap().is_none());
    }

    #[test]
    fn test_update_missing_user_returns_none() {
        let dir = TempDir::new().unwrap();
        let db = test_db(&dir);
        let result = update_user(&db, "missing", |u| u.total_drills += 1).unwrap();
        assert!(result.is_none());
    }
}
