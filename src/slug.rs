//! Random slug generation for anonymously created pages.
//!
//! Slugs are 6 characters drawn from `[0-9a-z]`, sourced from the
//! operating system CSPRNG. With a 36^6 identifier space (~2.2 billion)
//! collisions are possible but improbable, and no uniqueness check is
//! made against the page store.

use anyhow::{Result, anyhow};
use ring::rand::{SecureRandom, SystemRandom};

/// Length of every generated slug.
pub const SLUG_LEN: usize = 6;

/// Symbols a slug is drawn from: digits then lowercase letters.
const ALPHABET: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Largest multiple of the alphabet size that fits in a byte.
///
/// Bytes at or above this bound are rejected so that `byte % 36` is an
/// exactly uniform draw over the alphabet (252 = 7 * 36).
const REJECT_BOUND: u8 = 252;

/// Generate a fresh 6-character slug.
///
/// Each position is chosen independently and uniformly via rejection
/// sampling over CSPRNG bytes. Fails only if the system random source
/// does, which is not recoverable at this layer.
pub fn generate() -> Result<String> {
    let rng = SystemRandom::new();
    let mut slug = String::with_capacity(SLUG_LEN);

    while slug.len() < SLUG_LEN {
        let mut buf = [0u8; SLUG_LEN];
        rng.fill(&mut buf)
            .map_err(|_| anyhow!("system random source unavailable"))?;

        for byte in buf {
            if byte < REJECT_BOUND && slug.len() < SLUG_LEN {
                slug.push(ALPHABET[(byte % 36) as usize] as char);
            }
        }
    }

    Ok(slug)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slug_length() {
        for _ in 0..100 {
            assert_eq!(generate().unwrap().len(), SLUG_LEN);
        }
    }

    #[test]
    fn test_slug_alphabet() {
        for _ in 0..200 {
            let slug = generate().unwrap();
            assert!(
                slug.bytes().all(|b| ALPHABET.contains(&b)),
                "slug `{slug}` contains a symbol outside [0-9a-z]"
            );
        }
    }

    #[test]
    fn test_slugs_are_not_constant() {
        let a = generate().unwrap();
        let b = generate().unwrap();
        let c = generate().unwrap();
        // Three identical 6-char draws would be a broken RNG
        assert!(!(a == b && b == c));
    }

    #[test]
    fn test_symbol_distribution_roughly_uniform() {
        // 10_000 slugs = 60_000 symbol draws, ~1666 expected per symbol.
        // Rejection sampling is exactly uniform, so +/-40% bounds leave
        // enormous headroom (sigma is ~40 draws).
        let mut counts = [0usize; 36];
        for _ in 0..10_000 {
            for b in generate().unwrap().bytes() {
                let idx = ALPHABET.iter().position(|&a| a == b).unwrap();
                counts[idx] += 1;
            }
        }

        let expected = 60_000 / 36;
        for (idx, &count) in counts.iter().enumerate() {
            assert!(
                count > expected * 6 / 10 && count < expected * 14 / 10,
                "symbol `{}` drawn {count} times, expected ~{expected}",
                ALPHABET[idx] as char
            );
        }
    }
}
