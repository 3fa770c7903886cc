//! Deterministic, explicitly seeded random source.
//!
//! Every raw draw is a pure function of the stream key (derived from the seed)
//! and the draw position, so re-seeding always replays the same stream no
//! matter how the draws are batched by the caller. Variates are produced by
//! `rand_distr` samplers reading that stream through [`RngCore`].

use num_traits::AsPrimitive;
use rand::RngCore;
use rand_distr::{Distribution as _, Open01, StandardNormal};
use serde::{Deserialize, Serialize};

type BaseType = u64;
type SeedType = BaseType;

const SEED: SeedType = (0xD0B3AC93 as BaseType) << 32 | 0x9ACFC8C5;
const BITS: [SeedType; 8] = [
    (0x68E31DA4 as BaseType) << 32 | 0xB5297A4D as BaseType,
    (0x1B56C4E9 as BaseType) << 32 | 0xA37B4539 as BaseType,
    (0x72BE5D74 as BaseType) << 32 | 0xC3E1F763 as BaseType,
    (0xD0B3AC93 as BaseType) << 32 | 0x9ACFC8C5 as BaseType,
    0xFFFFFFFFFFFFFFC5,
    0xFFFFFFFFFFFFFF43,
    0xFFFFFFFFFFFFFC2F,
    0xFFFFFFFFFFFFF837,
];
const SHIFTS: [u32; 8] = [41, 37, 29, 23, 19, 17, 11, 7];

/// What a single replication draws.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Distribution {
    /// Standard normal variates.
    #[default]
    Normal,
    /// Uniform variates on (0, 1).
    Uniform,
}

impl std::str::FromStr for Distribution {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "normal" => Ok(Distribution::Normal),
            "uniform" => Ok(Distribution::Uniform),
            other => Err(format!("unknown distribution '{other}', expected normal or uniform")),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RandomSource {
    seed: SeedType,
    key: SeedType,
    position: u64,
}

impl RandomSource {
    pub fn from_seed(seed: impl AsPrimitive<SeedType>) -> Self {
        let seed = seed.as_();
        Self {
            seed,
            key: get_fast_1d_noise(seed, SEED),
            position: 0,
        }
    }

    pub fn seed(&self) -> SeedType {
        self.seed
    }

    /// Number of raw 64-bit draws consumed since the last reseed.
    pub fn position(&self) -> u64 {
        self.position
    }

    /// Resets the stream to the state fully determined by `seed`.
    pub fn reseed(&mut self, seed: impl AsPrimitive<SeedType>) -> &mut Self {
        *self = Self::from_seed(seed);
        self
    }

    pub fn restart(&mut self) -> &mut Self {
        let seed = self.seed;
        self.reseed(seed)
    }

    /// Uniform draw on the open interval (0, 1).
    #[inline]
    pub fn uniform(&mut self) -> f64 {
        Open01.sample(self)
    }

    /// Standard normal draw (Ziggurat).
    #[inline]
    pub fn normal(&mut self) -> f64 {
        StandardNormal.sample(self)
    }

    #[inline]
    pub fn draw(&mut self, distribution: Distribution) -> f64 {
        match distribution {
            Distribution::Normal => self.normal(),
            Distribution::Uniform => self.uniform(),
        }
    }

    pub fn fill(&mut self, distribution: Distribution, buffer: &mut [f64]) {
        match distribution {
            Distribution::Normal => buffer.iter_mut().for_each(|value| *value = self.normal()),
            Distribution::Uniform => buffer.iter_mut().for_each(|value| *value = self.uniform()),
        }
    }

    pub fn sample(&mut self, distribution: Distribution, count: impl AsPrimitive<usize>) -> Vec<f64> {
        let count: usize = count.as_();
        match distribution {
            Distribution::Normal => (0..count).map(|_| self.normal()).collect(),
            Distribution::Uniform => (0..count).map(|_| self.uniform()).collect(),
        }
    }
}

impl RngCore for RandomSource {
    #[inline]
    fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    #[inline]
    fn next_u64(&mut self) -> u64 {
        let noise = get_1d_noise(self.position, self.key, BITS, SHIFTS);
        self.position = self.position.wrapping_add(1);
        noise
    }

    fn fill_bytes(&mut self, dest: &mut [u8]) {
        rand_core::impls::fill_bytes_via_next(self, dest)
    }

    fn try_fill_bytes(&mut self, dest: &mut [u8]) -> Result<(), rand::Error> {
        self.fill_bytes(dest);
        Ok(())
    }
}

pub fn get_1d_noise<X, S, O>(value: X, seed: S, bits: impl IntoIterator<Item=impl AsPrimitive<BaseType>>, shifts: impl IntoIterator<Item=impl AsPrimitive<u32>>) -> O
where
    X: AsPrimitive<BaseType>,
    S: AsPrimitive<BaseType>,
    O: Copy + 'static,
    BaseType: AsPrimitive<O>,
{
    let mut mangled_bits: BaseType = value.as_();
    for (index, (bit, shift)) in bits.into_iter().zip(shifts).enumerate() {
        mangled_bits = if index % 2 == 0 {
            let mut bits = mangled_bits.wrapping_mul(bit.as_());
            if index == 0 {
                bits = bits.wrapping_add(seed.as_());
            }
            bits ^ bits.wrapping_shr(shift.as_())
        } else {
            let bits = mangled_bits.wrapping_add(bit.as_());
            bits ^ bits.wrapping_shl(shift.as_())
        };
    }
    mangled_bits.as_()
}

/// Three-round variant of [`get_1d_noise`], used to derive stream keys.
#[inline]
pub fn get_fast_1d_noise<O>(value: impl AsPrimitive<BaseType>, seed: impl AsPrimitive<BaseType>) -> O
where
    O: AsPrimitive<BaseType>,
    BaseType: AsPrimitive<O>,
{
    get_1d_noise(value, seed, BITS.into_iter().take(3), SHIFTS.into_iter().take(3))
}
