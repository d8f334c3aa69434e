//! Cache keys and generator seeds

use std::fmt;

/// Composite cache key: logical asset id plus requested size
///
/// Two sizes of the same asset are separate entries.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct AssetKey(String);

impl AssetKey {
    pub fn new(id: &str, size: u32) -> Self {
        Self(format!("{}_{}", id, size))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Deterministic generator seed for an asset id
///
/// Polynomial rolling hash (`h * 31 + unit`) over the UTF-16 code units of
/// `id`, wrapping at 32 bits, then the absolute value. `i32::MIN` maps to
/// 2147483648, so the result is a `u32`.
pub fn seed(id: &str) -> u32 {
    let hash = id.encode_utf16().fold(0i32, |h, unit| {
        h.wrapping_mul(31).wrapping_add(i32::from(unit))
    });
    hash.unsigned_abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_format() {
        assert_eq!(AssetKey::new("amulet_Aries", 512).as_str(), "amulet_Aries_512");
        assert_eq!(AssetKey::new("brace_Rat", 150).to_string(), "brace_Rat_150");
    }

    #[test]
    fn test_sizes_are_distinct_keys() {
        assert_ne!(AssetKey::new("amulet_Leo", 150), AssetKey::new("amulet_Leo", 512));
    }

    #[test]
    fn test_seed_empty_string() {
        assert_eq!(seed(""), 0);
    }

    #[test]
    fn test_seed_known_values() {
        // "a" = 97, "ab" = 97 * 31 + 98
        assert_eq!(seed("a"), 97);
        assert_eq!(seed("ab"), 3105);
        assert_eq!(seed("hello"), 99_162_322);
    }

    #[test]
    fn test_seed_takes_absolute_value_after_wrap() {
        // "polygenelubricants" hashes to i32::MIN under this scheme
        assert_eq!(seed("polygenelubricants"), 2_147_483_648);
        // "brace_Rat" wraps to -1100978183
        assert_eq!(seed("brace_Rat"), 1_100_978_183);
        assert_eq!(seed("amulet_Aries"), 472_817_177);
    }

    #[test]
    fn test_seed_is_deterministic() {
        assert_eq!(seed("brace_Rat"), seed("brace_Rat"));
        assert_ne!(seed("brace_Rat"), seed("brace_Ox"));
    }

    #[test]
    fn test_seed_uses_utf16_units() {
        // U+1F52E is a surrogate pair: 0xD83D, 0xDD2E
        let expected = (0xD83Di32 * 31 + 0xDD2E) as u32;
        assert_eq!(seed("\u{1F52E}"), expected);
    }
}
