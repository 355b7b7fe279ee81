pub mod ip;
pub mod ua;

/// Alphabet for agent codes and client session ids.
///
/// Alphanumerics minus the lookalikes (I, l, 1, O, o, 0, i) so codes
/// survive being read over the phone and retyped from print material.
pub const TRACKING_ALPHABET: &[u8] = b"ABCDEFGHJKMNPQRSTUVWXYZabcdefghjkmnpqrstuvwxyz23456789";

/// Length of every generated code.
pub const CODE_LENGTH: usize = 6;

/// Generates one tracking code. Uniqueness is the caller's problem;
/// agent creation retries on collision up to its configured bound.
pub fn generate_tracking_code() -> String {
    use std::iter;

    iter::repeat_with(|| TRACKING_ALPHABET[rand::random_range(0..TRACKING_ALPHABET.len())] as char)
        .take(CODE_LENGTH)
        .collect()
}

/// Checks that a code has the generated shape: exactly six characters,
/// all from the tracking alphabet.
pub fn is_valid_code(code: &str) -> bool {
    code.len() == CODE_LENGTH && code.bytes().all(|b| TRACKING_ALPHABET.contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_are_well_formed() {
        for _ in 0..10_000 {
            let code = generate_tracking_code();
            assert_eq!(code.len(), CODE_LENGTH);
            assert!(
                code.bytes().all(|b| TRACKING_ALPHABET.contains(&b)),
                "code {} contains a character outside the alphabet",
                code
            );
        }
    }

    #[test]
    fn test_alphabet_excludes_lookalikes() {
        for forbidden in [b'I', b'l', b'1', b'O', b'o', b'0', b'i'] {
            assert!(!TRACKING_ALPHABET.contains(&forbidden));
        }
        assert_eq!(TRACKING_ALPHABET.len(), 54);
    }

    #[test]
    fn test_is_valid_code() {
        assert!(is_valid_code("Ab3kM9"));
        assert!(is_valid_code("Xy7nP2"));
        assert!(!is_valid_code("Ab3kM"));
        assert!(!is_valid_code("Ab3kM90"));
        assert!(!is_valid_code("Ab3kM0"));
        assert!(!is_valid_code("abc de"));
        assert!(!is_valid_code(""));
    }
}
