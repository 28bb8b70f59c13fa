/// Drill catalog seeded for every newly registered user
pub const DEFAULT_USER_DRILLS: [&str; 12] = [
    "Fire Evacuation Drill",
    "Earthquake Drill",
    "Lockdown Drill",
    "Medical Emergency Drill",
    "Severe Weather Drill",
    "Chemical Spill Drill",
    "Power Outage Drill",
    "Bomb Threat Drill",
    "Active Shooter Drill",
    "Cyber Security Drill",
    "Communication Drill",
    "Equipment Check Drill",
];

/// Drill types an organization starts with, also used by ad-hoc schedule generation
pub const DEFAULT_ORG_DRILL_TYPES: [&str; 5] = [
    "Fire Evacuation Drill",
    "Earthquake Drill",
    "Lockdown Drill",
    "Medical Emergency Drill",
    "Severe Weather Drill",
];

/// Days between seeded drills at registration
pub const REGISTRATION_DRILL_SPACING_DAYS: i64 = 30;

/// Number of drills created by `/api/drills/generate-schedule` when none is given
pub const DEFAULT_GENERATED_DRILLS: usize = 5;

/// Default planned drills per year for new organizations
pub const DEFAULT_PLANNED_DRILLS_PER_YEAR: u32 = 12;

/// Team assigned when none is supplied
pub const DEFAULT_TEAM_ID: &str = "default-team";

/// Minimum password length accepted at registration
pub const MIN_PASSWORD_LEN: usize = 6;

/// Bearer token lifetime (7 days)
pub const DEFAULT_TOKEN_EXPIRY_SECS: u64 = 7 * 24 * 60 * 60;

/// Fallback signing secret outside production
pub const DEV_JWT_SECRET: &str = "drill-tracker-dev-secret-not-for-production";

// =============================================================================
// Error Messages
// =============================================================================

pub const ERR_INVALID_DRILL_ID: &str = "Invalid drill ID format";

pub const ERR_INVALID_ORG_ID: &str = "Invalid organization ID format";

pub const ERR_INVALID_DATE: &str = "Invalid date format provided";

pub const ERR_DATE_RANGE: &str = "End date must be after start date";

pub const ERR_DATES_REQUIRED: &str = "Start date and end date are required";

pub const ERR_INVALID_CREDENTIALS: &str = "Invalid credentials";

pub const ERR_DRILL_NOT_FOUND: &str = "Drill not found";

pub const ERR_USER_NOT_FOUND: &str = "User not found";

pub const ERR_ORG_NOT_FOUND: &str = "Organization not found";
