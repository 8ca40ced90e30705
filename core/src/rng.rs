//! Deterministic random number generation.
//!
//! RULE: Nothing in the simulation may call a platform RNG.
//! All randomness flows through `RandomSource` instances handed out
//! by the `RngBank`, which derives them from a single master seed.
//!
//! Each subsystem gets its own stream, seeded from
//! (master_seed XOR subsystem_index). This means:
//!   - Adding a new subsystem never changes existing subsystems' streams.
//!   - Each subsystem's stream is fully reproducible in isolation.
//!   - Tests can swap any single stream for a scripted source.

use rand::SeedableRng;
use rand_pcg::Pcg64Mcg;
use std::collections::BTreeMap;

/// The only interface the simulation needs from a random source:
/// a uniform float in [0.0, 1.0). Everything else is derived from it.
pub trait RandomSource: Send {
    /// Roll a float in [0.0, 1.0).
    fn next_f64(&mut self) -> f64;

    /// Draw a raw u64. Sources with a native integer stream override this.
    fn next_u64(&mut self) -> u64 {
        let hi = (self.next_f64() * 4_294_967_296.0) as u64;
        let lo = (self.next_f64() * 4_294_967_296.0) as u64;
        (hi << 32) | lo
    }

    /// Roll an index in [0, n). Returns 0 when n is 0.
    fn next_below(&mut self, n: usize) -> usize {
        if n == 0 {
            return 0;
        }
        ((self.next_f64() * n as f64) as usize).min(n - 1)
    }

    /// Bernoulli trial: returns true with probability p.
    fn chance(&mut self, p: f64) -> bool {
        self.next_f64() < p
    }

    /// Uniform float in [lo, hi).
    fn range(&mut self, lo: f64, hi: f64) -> f64 {
        lo + (hi - lo) * self.next_f64()
    }
}

/// A named, deterministic PCG stream for a single subsystem.
pub struct SubsystemRng {
    pub name: &'static str,
    inner: Pcg64Mcg,
}

impl SubsystemRng {
    /// Create a subsystem RNG from the master seed and a stable
    /// subsystem index. The index must never change once assigned.
    pub fn new(master_seed: u64, subsystem_index: u64) -> Self {
        let derived_seed = master_seed ^ (subsystem_index.wrapping_mul(0x9e37_79b9_7f4a_7c15));
        Self {
            name: "unnamed",
            inner: Pcg64Mcg::seed_from_u64(derived_seed),
        }
    }

    pub fn with_name(mut self, name: &'static str) -> Self {
        self.name = name;
        self
    }
}

impl RandomSource for SubsystemRng {
    fn next_f64(&mut self) -> f64 {
        use rand::RngCore;
        let bits = self.inner.next_u64();
        (bits >> 11) as f64 * (1.0 / (1u64 << 53) as f64)
    }

    fn next_u64(&mut self) -> u64 {
        use rand::RngCore;
        self.inner.next_u64()
    }
}

/// A scripted source that replays a fixed sequence of draws, cycling
/// when exhausted. Used to force specific branches in tests.
#[derive(Debug, Clone)]
pub struct FixedRng {
    values: Vec<f64>,
    cursor: usize,
}

impl FixedRng {
    pub fn new(values: Vec<f64>) -> Self {
        Self { values, cursor: 0 }
    }

    /// A source that always returns the same value.
    pub fn constant(value: f64) -> Self {
        Self::new(vec![value])
    }
}

impl RandomSource for FixedRng {
    fn next_f64(&mut self) -> f64 {
        if self.values.is_empty() {
            return 0.0;
        }
        let v = self.values[self.cursor % self.values.len()];
        self.cursor += 1;
        v.clamp(0.0, 1.0 - f64::EPSILON)
    }
}

/// All subsystem streams for a single run, indexed by stable slot.
/// Streams are created lazily and persist for the life of the run.
pub struct RngBank {
    master_seed: u64,
    streams: BTreeMap<SubsystemSlot, Box<dyn RandomSource>>,
}

impl RngBank {
    pub fn new(master_seed: u64) -> Self {
        Self {
            master_seed,
            streams: BTreeMap::new(),
        }
    }

    pub fn master_seed(&self) -> u64 {
        self.master_seed
    }

    /// Replace one slot's stream, e.g. with a `FixedRng` in tests.
    pub fn with_source(mut self, slot: SubsystemSlot, source: Box<dyn RandomSource>) -> Self {
        self.streams.insert(slot, source);
        self
    }

    pub fn for_subsystem(&mut self, slot: SubsystemSlot) -> &mut dyn RandomSource {
        let seed = self.master_seed;
        let stream = self.streams.entry(slot).or_insert_with(|| {
            Box::new(SubsystemRng::new(seed, slot as u64).with_name(slot.name()))
                as Box<dyn RandomSource>
        });
        &mut **stream
    }
}

/// Stable subsystem slot assignments.
/// NEVER reorder or remove entries — only append.
/// Reordering changes every subsystem's seed.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[repr(u64)]
pub enum SubsystemSlot {
    Team = 0,
    Product = 1,
    Finance = 2,
    Funding = 3,
    Narrative = 4,
}

impl SubsystemSlot {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Team => "team",
            Self::Product => "product",
            Self::Finance => "finance",
            Self::Funding => "funding",
            Self::Narrative => "narrative",
        }
    }
}
