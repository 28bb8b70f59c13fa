use redb::TableDefinition;

/// Users table: user_id -> UserRecord (serialized)
pub const USERS: TableDefinition<&str, &[u8]> = TableDefinition::new("users");

/// Unique email index: lower-cased email -> user_id
pub const USER_EMAILS: TableDefinition<&str, &str> = TableDefinition::new("user_emails");

/// Drills table: drill id -> DrillRecord (serialized)
pub const DRILLS: TableDefinition<&str, &[u8]> = TableDefinition::new("drills");

/// Organizations table: organization id -> OrganizationRecord (serialized)
pub const ORGANIZATIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("organizations");

/// Unique company id index: company_id -> organization id
pub const ORG_COMPANY_IDS: TableDefinition<&str, &str> = TableDefinition::new("org_company_ids");
