//! Deterministic masking of identifiers that leave the process in results.
//!
//! Masked values are derived from an MD5 digest of a per-process salt and the
//! original value, so the same input always masks to the same output while
//! the process lives. A restart picks a new salt.

use std::sync::OnceLock;

const MASK_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

fn process_salt() -> &'static str {
    static SALT: OnceLock<String> = OnceLock::new();
    SALT.get_or_init(|| uuid::Uuid::new_v4().to_string())
}

/// Mask a sensitive string. The result has the same character count as the input.
pub fn mask(value: &str) -> String {
    mask_with_salt(process_salt(), value)
}

fn mask_with_salt(salt: &str, value: &str) -> String {
    let len = value.chars().count();
    let mut masked = String::with_capacity(len);
    let mut block: u64 = 0;

    // Each digest yields 16 characters; chain blocks for longer identifiers.
    while masked.len() < len {
        let digest = md5::compute(format!("{}:{}:{}", salt, block, value));
        for byte in digest.0.iter() {
            if masked.len() == len {
                break;
            }
            let index = *byte as usize % MASK_ALPHABET.len();
            masked.push(MASK_ALPHABET[index] as char);
        }
        block += 1;
    }

    masked
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_is_deterministic() {
        assert_eq!(mask("backup"), mask("backup"));
        assert_eq!(mask("ops"), mask("ops"));
    }

    #[test]
    fn test_mask_preserves_length() {
        assert_eq!(mask("ops").len(), 3);
        assert_eq!(mask("a-very-long-namespace-name-for-testing").len(), 38);
        assert_eq!(mask("").len(), 0);
    }

    #[test]
    fn test_mask_hides_value() {
        let masked = mask("production-database");
        assert_ne!(masked, "production-database");
        assert!(masked.chars().all(|c| c.is_ascii_alphanumeric()));
    }

    #[test]
    fn test_mask_distinguishes_inputs() {
        assert_ne!(mask("nightly-backup"), mask("nightly-backuq"));
        assert_ne!(mask("kube-system"), mask("kube-public"));
    }

    #[test]
    fn test_mask_depends_on_salt() {
        let first = mask_with_salt("salt-one", "payments-api");
        let second = mask_with_salt("salt-two", "payments-api");
        assert_ne!(first, second);
        assert_eq!(first, mask_with_salt("salt-one", "payments-api"));
    }
}
