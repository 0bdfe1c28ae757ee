//! Field validators shared by school and class DTOs.

use validator::ValidationError;

/// Usernames are lowercase handles used in URLs: `[a-z0-9._-]`, starting
/// with a letter or digit.
pub fn validate_username(username: &str) -> Result<(), ValidationError> {
    let valid_chars = username
        .chars()
        .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || matches!(c, '.' | '_' | '-'));
    let valid_start = username
        .chars()
        .next()
        .is_some_and(|c| c.is_ascii_lowercase() || c.is_ascii_digit());

    if valid_chars && valid_start {
        Ok(())
    } else {
        let mut err = ValidationError::new("username");
        err.message = Some(
            "username may only contain lowercase letters, digits, '.', '_' and '-'".into(),
        );
        Err(err)
    }
}

pub fn validate_phone(phone: &str) -> Result<(), ValidationError> {
    let digits = phone.chars().filter(|c| c.is_ascii_digit()).count();
    let allowed = phone
        .chars()
        .enumerate()
        .all(|(i, c)| c.is_ascii_digit() || matches!(c, ' ' | '-') || (i == 0 && c == '+'));

    if allowed && (7..=15).contains(&digits) {
        Ok(())
    } else {
        let mut err = ValidationError::new("phone");
        err.message = Some("phone must contain 7 to 15 digits".into());
        Err(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_username() {
        assert!(validate_username("hill-academy").is_ok());
        assert!(validate_username("g.s_kigali-2").is_ok());
        assert!(validate_username("9lives").is_ok());
        assert!(validate_username("Hill").is_err());
        assert!(validate_username("-hill").is_err());
        assert!(validate_username("hill academy").is_err());
        assert!(validate_username("").is_err());
    }

    #[test]
    fn test_validate_phone() {
        assert!(validate_phone("+250 788 123 456").is_ok());
        assert!(validate_phone("0788-123-456").is_ok());
        assert!(validate_phone("12345").is_err());
        assert!(validate_phone("07881234x6").is_err());
        assert!(validate_phone("250+788123456").is_err());
    }
}
