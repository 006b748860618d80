//! Input validation for API requests.
//!
//! For collecting multiple validation errors and returning them as an
//! ApiError, use the `ValidationErrorBuilder` from the `error` module.

use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    /// Regex for validating usernames (word characters plus dot/dash, 1-32 chars)
    static ref USERNAME_REGEX: Regex = Regex::new(
        r"^[A-Za-z0-9_][A-Za-z0-9_.-]{0,31}$"
    ).unwrap();

    /// Regex for validating UUIDs
    static ref UUID_REGEX: Regex = Regex::new(
        r"^[0-9a-fA-F]{8}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{4}-[0-9a-fA-F]{12}$"
    ).unwrap();
}

/// Validate a username
pub fn validate_username(name: &str) -> Result<(), String> {
    if name.is_empty() {
        return Err("Name is required".to_string());
    }
    if !USERNAME_REGEX.is_match(name) {
        return Err(
            "Name must be 1-32 characters: letters, digits, underscore, dot or dash".to_string(),
        );
    }
    Ok(())
}

/// Validate a password (length bounds only; strength is the user's business)
pub fn validate_password(password: &str) -> Result<(), String> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters".to_string());
    }
    if password.len() > 128 {
        return Err("Password is too long (max 128 characters)".to_string());
    }
    Ok(())
}

/// Validate a device name
pub fn validate_device_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Device name is required".to_string());
    }
    if name.len() > 64 {
        return Err("Device name is too long (max 64 characters)".to_string());
    }
    Ok(())
}

/// Validate a device platform string (e.g. "Android", "iOS", "Linux")
pub fn validate_platform(platform: &str) -> Result<(), String> {
    if platform.trim().is_empty() {
        return Err("Platform is required".to_string());
    }
    if platform.len() > 32 {
        return Err("Platform is too long (max 32 characters)".to_string());
    }
    Ok(())
}

/// Validate a device description
pub fn validate_description(description: &str) -> Result<(), String> {
    if description.len() > 256 {
        return Err("Description is too long (max 256 characters)".to_string());
    }
    Ok(())
}

/// Validate that an ID is a valid UUID
pub fn validate_uuid(id: &str, field: &str) -> Result<(), String> {
    if !UUID_REGEX.is_match(id) {
        return Err(format!("{} must be a valid UUID", field));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usernames() {
        assert!(validate_username("alice").is_ok());
        assert!(validate_username("bob_42.dev").is_ok());
        assert!(validate_username("").is_err());
        assert!(validate_username("-leading-dash").is_err());
        assert!(validate_username("x".repeat(33).as_str()).is_err());
        assert!(validate_username("spaces not ok").is_err());
    }

    #[test]
    fn passwords() {
        assert!(validate_password("longenough").is_ok());
        assert!(validate_password("short").is_err());
        assert!(validate_password(&"p".repeat(129)).is_err());
    }

    #[test]
    fn device_fields() {
        assert!(validate_device_name("Pixel 8").is_ok());
        assert!(validate_device_name("   ").is_err());
        assert!(validate_platform("Android").is_ok());
        assert!(validate_platform("").is_err());
        assert!(validate_description("").is_ok());
        assert!(validate_description(&"d".repeat(257)).is_err());
    }

    #[test]
    fn uuids() {
        assert!(validate_uuid("0d4cb722-4f6f-4f8c-9d8a-000000000000", "device_id").is_ok());
        assert!(validate_uuid("not-a-uuid", "device_id").is_err());
    }
}
