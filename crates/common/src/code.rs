//! Certificate code generation

use uuid::Uuid;

/// Number of characters in a certificate code
pub const CODE_LENGTH: usize = 16;

/// Generate a fresh certificate code.
///
/// The code is the first [`CODE_LENGTH`] lowercase hex digits of a v4 UUID, so
/// it is safe as a URL query value and as a store key. Collisions are not
/// checked; at the expected volume they are treated as impossible.
pub fn generate_code() -> String {
    let mut code = Uuid::new_v4().simple().to_string();
    code.truncate(CODE_LENGTH);
    code
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_code_has_fixed_length() {
        assert_eq!(generate_code().len(), CODE_LENGTH);
    }

    #[test]
    fn test_code_is_url_safe_hex() {
        let code = generate_code();
        assert!(code
            .chars()
            .all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c)));
    }

    #[test]
    fn test_codes_do_not_repeat() {
        let codes: HashSet<String> = (0..1000).map(|_| generate_code()).collect();
        assert_eq!(codes.len(), 1000);
    }
}
