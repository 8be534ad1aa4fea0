//! Domain-level constants.
//!
//! These constants mirror the column limits of the `users` table and the
//! business rules applied to incoming user data.

// =============================================================================
// Identifiers
// =============================================================================

/// Length of a generated user identifier
pub const USER_ID_LENGTH: usize = 12;

// =============================================================================
// Field limits
// =============================================================================

/// Maximum length of name, surname and patronymic
pub const MAX_NAME_LENGTH: u64 = 50;

/// Maximum length of the country name
pub const MAX_COUNTRY_LENGTH: u64 = 50;

/// Maximum length of a phone number (digits only)
pub const MAX_PHONE_NUMBER_LENGTH: usize = 11;

/// Maximum length of an email address
pub const MAX_EMAIL_LENGTH: u64 = 255;

/// Every accepted phone number starts with this country prefix
pub const PHONE_NUMBER_PREFIX: &str = "7";
