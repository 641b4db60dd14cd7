//! Reversible share-code scheme for campaign seeds.
//! Code format: GL-<WORD><NN>, e.g., GL-PIXEL42, GL-CRUNCH07

use twox_hash::XxHash64;

const SEED_HASH_SALT: u64 = 0x4752_4e4c_4754_5347; // "GRNLGTSG"

fn xxhash64(bytes: &[u8]) -> u64 {
    XxHash64::oneshot(SEED_HASH_SALT, bytes)
}

fn sanitize_word(word: &str) -> String {
    word.chars()
        .filter(char::is_ascii_alphabetic)
        .map(|c| c.to_ascii_uppercase())
        .collect()
}

// Word list for share codes
pub const WORD_LIST: [&str; 64] = [
    "PIXEL", "SPRITE", "CRUNCH", "VERTEX", "SHADER", "ENGINE", "PATCH", "HOTFIX", "ALPHA", "BETA",
    "GOLD", "DEMO", "VOXEL", "POLY", "RETRO", "ARCADE", "INDIE", "PUBLSH", "LAUNCH", "WISHLST",
    "REVIEW", "CRITIC", "STREAM", "MODDER", "GLITCH", "BUGFIX", "MERGE", "COMMIT", "BRANCH",
    "BUILD", "SHIP", "DELAY", "SCOPE", "DESIGN", "LEVELS", "QUESTS", "LOOT", "COMBO", "SCORE",
    "BONUS", "SECRET", "UNLOCK", "SAVE", "SLOT", "PIVOT", "FUNDED", "BUDGET", "SALARY", "OFFICE",
    "STUDIO", "TESTER", "ARTIST", "WRITER", "CODER", "MILEST", "ROADMP", "BACKER", "PLAYER",
    "GENRE", "MARKET", "TRENDS", "BOOM", "DECLIN", "RECOVR",
];

#[inline]
fn pack(word_index: u16, nn: u8) -> u16 {
    word_index & 0x01FF | ((u16::from(nn) & 0x7F) << 9)
}

#[inline]
fn unpack(packed: u16) -> (u16, u8) {
    (packed & 0x01FF, ((packed >> 9) & 0x7F) as u8)
}

fn compose_seed(word_index: u16, nn: u8) -> u64 {
    let packed = pack(word_index, nn);
    // Domain-separated hash input
    let mut buf = [0u8; 9];
    buf[..6].copy_from_slice(b"GRNLT-");
    buf[6] = (packed & 0xFF) as u8;
    buf[7] = (packed >> 8) as u8;
    buf[8] = 0xA5;
    let h = xxhash64(&buf);
    (h & 0xFFFF_FFFF_FFFF_0000) | u64::from(packed)
}

/// Derive a campaign seed from a studio name, stable across sessions.
#[must_use]
pub fn seed_from_studio_name(name: &str) -> u64 {
    let normalized: String = name
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .map(|c| c.to_ascii_lowercase())
        .collect();
    xxhash64(normalized.as_bytes())
}

#[must_use]
pub fn encode_friendly(seed: u64) -> String {
    let packed = (seed & 0xFFFF) as u16;
    let (wi, mut nn) = unpack(packed);
    let word = WORD_LIST.get(wi as usize).copied().unwrap_or("PIXEL");
    if nn > 99 {
        nn %= 100;
    }
    format!("GL-{word}{nn:02}")
}

#[must_use]
pub fn decode_to_seed(code: &str) -> Option<u64> {
    let s = code.trim();
    let (m, rest) = s.split_once('-')?;
    if !m.eq_ignore_ascii_case("GL") {
        return None;
    }
    if rest.len() < 3 {
        return None;
    }
    let (word_part, nn_part) = rest.split_at(rest.len() - 2);
    let nn: u8 = nn_part.parse().ok()?;
    let word = sanitize_word(word_part);
    let idx = WORD_LIST.iter().position(|w| sanitize_word(w) == word)?;
    let wi = u16::try_from(idx).ok()?;
    Some(compose_seed(wi, nn))
}

#[must_use]
pub fn generate_code_from_entropy(entropy: u64) -> String {
    let wi = u16::try_from(entropy % WORD_LIST.len() as u64).unwrap_or(0);
    let nn = ((entropy >> 17) % 100) as u8;
    let seed = compose_seed(wi, nn);
    encode_friendly(seed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_decode_roundtrips_code() {
        let seed = 0xDEAD_BEEF_CAFE_BABE;
        let code = encode_friendly(seed);
        let new_seed = decode_to_seed(&code).unwrap();
        assert_eq!(encode_friendly(new_seed), code);
    }

    #[test]
    fn gl_pixel_42_stable() {
        let seed = decode_to_seed("GL-PIXEL42").unwrap();
        assert_eq!(encode_friendly(seed), "GL-PIXEL42");
    }

    #[test]
    fn studio_name_seed_ignores_case_and_spacing() {
        let a = seed_from_studio_name("Moon Frog Games");
        let b = seed_from_studio_name("moonfrog games");
        assert_eq!(a, b);
        assert_ne!(a, seed_from_studio_name("Sun Toad Games"));
    }

    #[test]
    fn rejects_foreign_codes() {
        assert!(decode_to_seed("XX-PIXEL42").is_none());
        assert!(decode_to_seed("GL-NOPE").is_none());
    }
}
