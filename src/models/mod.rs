pub mod drill;
pub mod organization;
pub mod user;

pub use drill::{CompletionDelta, DrillRecord, DrillStatus, DrillView, Visibility};
pub use organization::{OrgStatus, OrganizationRecord, OrganizationView, TeamEntry};
pub use user::{HistoryEntry, UserProfile, UserRecord, UserRef, UserRole, UserSummary};
