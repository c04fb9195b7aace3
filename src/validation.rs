//! Player identity validation.
//!
//! Player ids come from front ends (`--player`, environment, chat adapters)
//! and become store keys and seed-key parts, so they are checked before a
//! session opens. Display names are only shown, so they are sanitised
//! instead of rejected.

/// Longest accepted player id, in characters.
pub const MAX_PLAYER_ID_CHARS: usize = 64;

/// Longest display name kept, in characters.
pub const MAX_DISPLAY_NAME_CHARS: usize = 32;

/// Player id validation errors with helpful messages
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PlayerIdError {
    #[error("Player id is empty")]
    Empty,

    #[error("Player id is too long (maximum {max} characters)")]
    TooLong { max: usize },

    #[error("Player id contains whitespace")]
    Whitespace,

    #[error("Player id contains control characters: {chars}")]
    ControlCharacters { chars: String },
}

/// Validate a player id. Surrounding whitespace is trimmed; the trimmed id
/// is returned.
pub fn validate_player_id(id: &str) -> Result<String, PlayerIdError> {
    let trimmed = id.trim();
    if trimmed.is_empty() {
        return Err(PlayerIdError::Empty);
    }
    if trimmed.chars().count() > MAX_PLAYER_ID_CHARS {
        return Err(PlayerIdError::TooLong {
            max: MAX_PLAYER_ID_CHARS,
        });
    }
    if trimmed.chars().any(|c| c.is_control()) {
        let chars = trimmed
            .chars()
            .filter(|c| c.is_control())
            .map(|c| format!("\\u{{{:04x}}}", c as u32))
            .collect::<Vec<_>>()
            .join(", ");
        return Err(PlayerIdError::ControlCharacters { chars });
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err(PlayerIdError::Whitespace);
    }
    Ok(trimmed.to_string())
}

/// Strip control characters, trim, and cap at [`MAX_DISPLAY_NAME_CHARS`].
/// An empty result becomes `fallback`.
pub fn sanitize_display_name(name: &str, fallback: &str) -> String {
    let cleaned: String = name.chars().filter(|c| !c.is_control()).collect();
    let capped: String = cleaned
        .trim()
        .chars()
        .take(MAX_DISPLAY_NAME_CHARS)
        .collect();
    let capped = capped.trim_end();
    if capped.is_empty() {
        fallback.to_string()
    } else {
        capped.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_ids() {
        assert_eq!(validate_player_id("local").unwrap(), "local");
        assert_eq!(validate_player_id("  discord:1234 ").unwrap(), "discord:1234");
        assert_eq!(validate_player_id("wanderer_über").unwrap(), "wanderer_über");
    }

    #[test]
    fn test_invalid_ids() {
        assert_eq!(validate_player_id("   "), Err(PlayerIdError::Empty));
        assert_eq!(validate_player_id("two words"), Err(PlayerIdError::Whitespace));
        assert!(matches!(
            validate_player_id("bad\u{1}id"),
            Err(PlayerIdError::ControlCharacters { .. })
        ));
        let long = "x".repeat(MAX_PLAYER_ID_CHARS + 1);
        assert_eq!(
            validate_player_id(&long),
            Err(PlayerIdError::TooLong {
                max: MAX_PLAYER_ID_CHARS
            })
        );
        assert!(validate_player_id(&"x".repeat(MAX_PLAYER_ID_CHARS)).is_ok());
    }

    #[test]
    fn test_display_names() {
        assert_eq!(sanitize_display_name("  Morrow ", "W"), "Morrow");
        assert_eq!(sanitize_display_name("Mor\nrow", "W"), "Morrow");
        assert_eq!(sanitize_display_name("\t\n", "Wanderer"), "Wanderer");
        let long = "n".repeat(40);
        assert_eq!(
            sanitize_display_name(&long, "W").chars().count(),
            MAX_DISPLAY_NAME_CHARS
        );
    }
}
