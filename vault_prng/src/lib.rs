// Deterministic, portable pseudo-random number generator for agents.
//
// Implements xoshiro256++ (Blackman & Vigna, 2019) with SplitMix64 seeding.
// The generator is hand-rolled so that the same seed yields the same wander
// targets on every platform and after every save/load.
//
// Each navigating agent owns one `GameRng`. The path finder never touches a
// process-wide RNG: the wander fallback in `vault_core::pathfinder` draws from
// the generator it is handed, which keeps per-agent evaluation reproducible
// and lets agents be stepped in parallel without sharing state.
//
// **Critical constraint: determinism.** Every method on `GameRng` must produce
// identical output given the same prior state, regardless of platform, compiler
// version, or optimization level. No floating point in anything that feeds
// gameplay decisions.

use serde::{Deserialize, Serialize};

/// Xoshiro256++ PRNG owned by a single agent.
///
/// The state is plain data and derives serde, so it is persisted alongside
/// the agent's path finder and resumes the exact same stream after a load.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRng {
    s: [u64; 4],
}

impl GameRng {
    /// Create a new PRNG seeded from a `u64`.
    ///
    /// Uses SplitMix64 to expand the seed into the 256-bit internal state.
    pub fn new(seed: u64) -> Self {
        let mut sm = seed;
        Self {
            s: [
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
                splitmix64(&mut sm),
            ],
        }
    }

    /// Derive an independent generator for agent number `index`.
    ///
    /// Agents spawned from the same level seed get distinct but reproducible
    /// streams.
    pub fn for_agent(level_seed: u64, index: u32) -> Self {
        let mut sm = level_seed ^ (u64::from(index)).wrapping_mul(0xd134_2543_de82_ef95);
        Self::new(splitmix64(&mut sm))
    }

    /// Generate the next `u64` in the sequence.
    pub fn next_u64(&mut self) -> u64 {
        let result = (self.s[0].wrapping_add(self.s[3]))
            .rotate_left(23)
            .wrapping_add(self.s[0]);

        let t = self.s[1] << 17;

        self.s[2] ^= self.s[0];
        self.s[3] ^= self.s[1];
        self.s[1] ^= self.s[2];
        self.s[0] ^= self.s[3];

        self.s[2] ^= t;
        self.s[3] = self.s[3].rotate_left(45);

        result
    }

    /// Generate a `u32` by taking the upper 32 bits of a `u64`.
    pub fn next_u32(&mut self) -> u32 {
        (self.next_u64() >> 32) as u32
    }

    /// Draw 15 random bits (`0..=0x7fff`).
    pub fn next_u15(&mut self) -> i32 {
        (self.next_u32() >> 17) as i32
    }

    /// Scale `n` by a random 15-bit fraction: `n * r / 0x8000`.
    ///
    /// For positive `n` the result lies in `[0, n)`. Negative and zero `n`
    /// are accepted and scale the same way (truncating toward zero), so a
    /// degenerate corridor width simply yields its own offset.
    pub fn rand15(&mut self, n: i32) -> i32 {
        let r = i64::from(self.next_u15());
        (i64::from(n) * r / 0x8000) as i32
    }
}

/// SplitMix64, used only for seeding.
fn splitmix64(state: &mut u64) -> u64 {
    *state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = *state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}
