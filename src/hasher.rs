/// Identity hashing for text fragments and catalog paths.
use crate::types::Fingerprint;

/// Classic multiply-and-add fold over UTF-16 code units, truncated to the
/// 32-bit signed range at every step (two's-complement wraparound).
/// Deterministic and pure; the code-unit walk keeps fingerprints stable
/// for non-ASCII text across platforms.
pub fn fold_hash(input: &str) -> i32 {
    let mut acc: i32 = 0;
    for unit in input.encode_utf16() {
        acc = acc.wrapping_mul(31).wrapping_add(i32::from(unit));
    }
    return acc;
}

/// Content-addressed fingerprint of a fragment's canonical text.
///
/// The folded hash is displayed and keyed as a non-negative value, so the
/// absolute value is taken here once and the sign never leaks into catalog
/// keys. Collisions between distinct texts are an accepted limitation;
/// fingerprints are only unique within one source file's catalog.
pub fn fingerprint(text: &str) -> Fingerprint {
    return Fingerprint(fold_hash(text).wrapping_abs());
}

/// CRC-32 checksum of a catalog-relative source path.
///
/// Deliberately a different algorithm from the fragment fold: the same
/// path string maps to the same checksum on every machine and run, which
/// gives globally distinguishable reference numbers without any central
/// registry.
pub fn path_checksum(path: &str) -> u32 {
    return crc32fast::hash(path.as_bytes());
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_folds_to_zero() {
        assert_eq!(fold_hash(""), 0);
    }

    #[test]
    fn fold_matches_known_values() {
        // Hand-computed: acc = acc * 31 + code, per character.
        assert_eq!(fold_hash("a"), 97);
        assert_eq!(fold_hash("ab"), 3105);
        assert_eq!(fold_hash("Hello"), 69_609_650);
    }

    #[test]
    fn fold_wraps_instead_of_overflowing() {
        // Long inputs must wrap in two's complement, not panic or saturate.
        let long = "x".repeat(10_000);
        let first = fold_hash(&long);
        let second = fold_hash(&long);
        assert_eq!(first, second);
    }

    #[test]
    fn fingerprint_is_never_negative() {
        // Each of these folds negative at 32 bits before the abs.
        for text in ["this string folds negative eventually", "zzzzzzzz", "Hello, world! 你好"] {
            assert!(fingerprint(text).0 >= 0, "negative fingerprint for {text:?}");
        }
    }

    #[test]
    fn identical_text_shares_a_fingerprint() {
        assert_eq!(fingerprint("Hello"), fingerprint("Hello"));
        assert_ne!(fingerprint("Hello"), fingerprint("Bye"));
    }

    #[test]
    fn path_checksum_is_stable_and_path_sensitive() {
        assert_eq!(path_checksum("app/greet.js"), path_checksum("app/greet.js"));
        assert_ne!(path_checksum("app/greet.js"), path_checksum("app/other.js"));
    }
}
