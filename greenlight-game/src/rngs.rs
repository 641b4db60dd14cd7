//! Named RNG stream derivation.
//!
//! Subsystems that must stay reproducible regardless of play order (market
//! initialization, the competitor calendar, resumed saves) derive their own
//! ChaCha streams from the campaign seed instead of sharing the main state
//! RNG.

use hmac::{Hmac, Mac};
use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use sha2::Sha256;

/// Domain tag for market trend initialization.
pub const STREAM_MARKET: &[u8] = b"greenlight.market";
/// Domain tag for the competitor release calendar.
pub const STREAM_COMPETITORS: &[u8] = b"greenlight.competitors";
/// Domain tag for re-seeding after loading a save.
pub const STREAM_RESUME: &[u8] = b"greenlight.resume";

fn derive_stream_seed(campaign_seed: u64, domain_tag: &[u8], counter: u64) -> u64 {
    let mut mac = Hmac::<Sha256>::new_from_slice(&campaign_seed.to_le_bytes())
        .expect("64-bit seed is valid key");
    mac.update(domain_tag);
    mac.update(&counter.to_le_bytes());
    let digest = mac.finalize().into_bytes();
    let seed_bytes: [u8; 8] = digest[..8].try_into().expect("digest slice length");
    u64::from_le_bytes(seed_bytes)
}

/// Build a ChaCha stream for a named domain, optionally distinguished by a
/// counter (e.g. the week a save was resumed on).
#[must_use]
pub fn stream_rng(campaign_seed: u64, domain_tag: &[u8], counter: u64) -> ChaCha20Rng {
    ChaCha20Rng::seed_from_u64(derive_stream_seed(campaign_seed, domain_tag, counter))
}
