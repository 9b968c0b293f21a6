//! Username validator
//!
//! Runs the policy checks of the handshake in their fixed order: length
//! first, then illegal characters. Uniqueness is decided afterwards by the
//! registry's atomic `register`.

use crate::error::UsernameRejection;
use crate::server::ServerConfig;

/// Validates `username` against the length and character rules in `config`.
pub fn validate_username(username: &str, config: &ServerConfig) -> Result<(), UsernameRejection> {
    if username.chars().count() > config.max_username_length {
        return Err(UsernameRejection::TooLong);
    }

    if username.is_empty()
        || username.contains(|c: char| config.illegal_characters.contains(c))
    {
        return Err(UsernameRejection::IllegalCharacter);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ServerConfig {
        ServerConfig {
            max_username_length: 5,
            illegal_characters: "/\\".to_string(),
            ..ServerConfig::default()
        }
    }

    #[test]
    fn accepts_plain_names() {
        assert_eq!(validate_username("alice", &config()), Ok(()));
        assert_eq!(validate_username("Zoë", &config()), Ok(()));
    }

    #[test]
    fn rejects_names_over_the_limit() {
        assert_eq!(
            validate_username("alice2", &config()),
            Err(UsernameRejection::TooLong)
        );
    }

    #[test]
    fn length_is_counted_in_characters() {
        assert_eq!(validate_username("ééééé", &config()), Ok(()));
    }

    #[test]
    fn rejects_illegal_characters() {
        assert_eq!(
            validate_username("a/b", &config()),
            Err(UsernameRejection::IllegalCharacter)
        );
        assert_eq!(
            validate_username("a\\b", &config()),
            Err(UsernameRejection::IllegalCharacter)
        );
    }

    #[test]
    fn length_is_checked_before_characters() {
        assert_eq!(
            validate_username("way/too/long", &config()),
            Err(UsernameRejection::TooLong)
        );
    }

    #[test]
    fn empty_name_is_illegal() {
        assert_eq!(
            validate_username("", &config()),
            Err(UsernameRejection::IllegalCharacter)
        );
    }
}
