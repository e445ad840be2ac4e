//! Base62 encoding of integers and big-endian byte prefixes.
//!
//! The alphabet is `0-9a-zA-Z`, so `'0'` is the zero digit and encoded
//! values never carry leading zeros.

use crate::error::DecodeError;

/// The 62 symbols, in digit order.
pub const ALPHABET: &[u8; 62] = b"0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Widest prefix [`encode_bytes`] accepts.
pub const MAX_PREFIX_BYTES: usize = 16;

/// Encodes `n` as base62.
///
/// `encode(0)` is `"0"`, never an empty string.
pub fn encode(n: u64) -> String {
    ::base62::encode_alternative(n)
}

/// Decodes a base62 string produced by [`encode`].
pub fn decode(encoded: &str) -> Result<u64, DecodeError> {
    if encoded.is_empty() {
        return Err(DecodeError::Empty);
    }
    if let Some((position, byte)) = encoded.bytes().enumerate().find(|(_, b)| !is_digit(*b)) {
        return Err(DecodeError::InvalidCharacter {
            character: char::from(byte),
            position,
        });
    }

    // Only overflow is left once the characters are known to be valid.
    let wide = ::base62::decode_alternative(encoded)
        .map_err(|_| DecodeError::Overflow(encoded.to_string()))?;
    u64::try_from(wide).map_err(|_| DecodeError::Overflow(encoded.to_string()))
}

/// Encodes `bytes` read as one big-endian unsigned integer.
///
/// Leading zero bytes do not change the value; an all-zero prefix encodes to
/// `"0"`. Prefixes wider than [`MAX_PREFIX_BYTES`] do not compile.
pub fn encode_bytes<const N: usize>(bytes: [u8; N]) -> String {
    const { assert!(N <= MAX_PREFIX_BYTES, "prefix wider than 128 bits") };

    let mut wide = [0u8; MAX_PREFIX_BYTES];
    wide[MAX_PREFIX_BYTES - N..].copy_from_slice(&bytes);
    ::base62::encode_alternative(u128::from_be_bytes(wide))
}

/// Encodes a digest prefix with [`encode_bytes`] and fits the result to
/// exactly `length` characters.
///
/// Longer encodings keep their leading `length` characters; shorter ones are
/// left-padded with the zero digit. The cut happens on the encoded string,
/// not on the input bytes.
pub fn encode_hash_prefix<const N: usize>(prefix: [u8; N], length: usize) -> String {
    fit_to_length(&encode_bytes(prefix), length)
}

/// Truncates or left-pads an already encoded value to `length` characters.
pub fn fit_to_length(encoded: &str, length: usize) -> String {
    if encoded.len() >= length {
        return encoded[..length].to_string();
    }

    let mut padded = String::with_capacity(length);
    padded.extend(std::iter::repeat(char::from(ALPHABET[0])).take(length - encoded.len()));
    padded.push_str(encoded);
    padded
}

/// Returns `true` if every character of `s` belongs to the alphabet.
pub fn is_base62(s: &str) -> bool {
    s.bytes().all(is_digit)
}

fn is_digit(byte: u8) -> bool {
    byte.is_ascii_alphanumeric()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_encodes_to_first_symbol() {
        assert_eq!(encode(0), "0");
        assert_eq!(encode_bytes([]), "0");
        assert_eq!(encode_bytes([0, 0, 0]), "0");
    }

    #[test]
    fn lowercase_letters_come_before_uppercase() {
        assert_eq!(encode(9), "9");
        assert_eq!(encode(10), "a");
        assert_eq!(encode(36), "A");
        assert_eq!(encode(61), "Z");
        assert_eq!(encode(62), "10");
        assert_eq!(encode(62 * 62 - 1), "ZZ");
        assert_eq!(encode(62 * 62), "100");
        assert_eq!(encode(u64::MAX), "lYGhA16ahyf");
    }

    #[test]
    fn decode_inverts_encode() {
        let samples = [0, 1, 61, 62, 3843, 1_000_000, 56_800_235_583, u64::MAX - 1, u64::MAX];
        for n in samples {
            assert_eq!(decode(&encode(n)).unwrap(), n, "round trip of {n}");
        }
    }

    #[test]
    fn encode_is_injective_over_a_range() {
        let mut seen = std::collections::HashSet::new();
        for n in 0..20_000u64 {
            assert!(seen.insert(encode(n)), "duplicate encoding for {n}");
        }
    }

    #[test]
    fn decode_rejects_bad_input() {
        assert!(matches!(decode(""), Err(DecodeError::Empty)));
        assert!(matches!(
            decode("ab-c"),
            Err(DecodeError::InvalidCharacter {
                character: '-',
                position: 2
            })
        ));
        // 62^11 - 1 does not fit in a u64.
        assert!(matches!(decode("ZZZZZZZZZZZ"), Err(DecodeError::Overflow(_))));
    }

    #[test]
    fn bytes_and_integers_agree() {
        for n in [1u64, 62, 12_345_678, u64::MAX] {
            assert_eq!(encode_bytes(n.to_be_bytes()), encode(n));
        }
    }

    #[test]
    fn prefixes_wider_than_u64() {
        // 2^64 is u64::MAX + 1; u64::MAX ends in digit 15 ('f'), so no carry.
        let mut bytes = [0u8; 9];
        bytes[0] = 1;
        assert_eq!(encode_bytes(bytes), "lYGhA16ahyg");
    }

    #[test]
    fn hash_prefix_truncates_after_encoding() {
        let bytes = u64::MAX.to_be_bytes();
        assert_eq!(encode_hash_prefix(bytes, 7), "lYGhA16");

        // Truncating the raw bytes first yields a different code.
        assert_ne!(encode_hash_prefix([0xff; 4], 7), "lYGhA16");
    }

    #[test]
    fn hash_prefix_left_pads_short_encodings() {
        assert_eq!(encode_hash_prefix([1], 7), "0000001");
        assert_eq!(encode_hash_prefix([0u8; 8], 3), "000");
    }

    #[test]
    fn alphabet_membership() {
        assert!(is_base62("abcXYZ019"));
        assert!(!is_base62("abc_"));
        assert!(!is_base62("ü"));
    }
}
