//! Randomness for group allocation and set shuffling.

use rand::rngs::StdRng;
use rand::{RngCore, SeedableRng};
use siphasher::sip::SipHasher13;
use std::hash::Hasher;

/// Source of every random draw a session makes.
///
/// Live deployments call [`RngHandle::from_entropy`] once per participant.
/// A pilot with a master seed instead gives participant `n` the stream
/// [`RngHandle::for_session`]`(seed, n)`, so a whole study replays exactly.
#[derive(Debug, Clone)]
pub struct RngHandle {
    rng: StdRng,
}

impl RngHandle {
    /// Fixed stream; the same `seed` always yields the same groups and orders.
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Unpredictable stream for live participants.
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }

    /// Stream of participant `session_index` within a seeded study.
    pub fn for_session(master_seed: u64, session_index: u64) -> Self {
        Self::from_seed(derive_substream_seed(master_seed, session_index))
    }
}

impl RngCore for RngHandle {
    fn next_u32(&mut self) -> u32 {
        self.rng.next_u32()
    }

    fn next_u64(&mut self) -> u64 {
        self.rng.next_u64()
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        self.rng.fill_bytes(dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.rng.try_fill_bytes(dest)
    }
}

/// Mixes a study seed and a participant index into that participant's seed.
///
/// SipHash-1-3 with zero keys, so the result does not depend on the platform.
pub fn derive_substream_seed(master_seed: u64, substream: u64) -> u64 {
    let mut hasher = SipHasher13::new_with_keys(0, 0);
    hasher.write_u64(master_seed);
    hasher.write_u64(substream);
    hasher.finish()
}
