use crate::errors::{DamageOutOfRange, InvalidDamageRange};
use crate::types::Health;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Inclusive bounds for attack damage. Always non-empty: `min <= max`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct DamageRange {
    min: Health,
    max: Health,
}

impl DamageRange {
    pub fn new(min: Health, max: Health) -> Result<Self, InvalidDamageRange> {
        if min > max {
            return Err(InvalidDamageRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> Health {
        self.min
    }

    pub fn max(&self) -> Health {
        self.max
    }

    /// Accept `rolled` only if it lies within `[min, max]`.
    pub fn check(&self, rolled: Health) -> Result<Health, DamageOutOfRange> {
        if (self.min..=self.max).contains(&rolled) {
            Ok(rolled)
        } else {
            Err(DamageOutOfRange {
                rolled,
                min: self.min,
                max: self.max,
            })
        }
    }
}

impl Default for DamageRange {
    fn default() -> Self {
        Self { min: 10, max: 29 }
    }
}

/// Source of attack damage rolls.
///
/// The resolver validates every roll against the range it passed in, so an
/// implementation that returns out-of-range values is caught rather than
/// trusted.
pub trait DamageSource: Send {
    fn roll(&mut self, range: DamageRange) -> Health;
}

/// Uniform rolls from a seedable `StdRng`.
pub struct RandomDamage {
    rng: StdRng,
}

impl RandomDamage {
    pub fn from_seed(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
        }
    }
}

impl DamageSource for RandomDamage {
    fn roll(&mut self, range: DamageRange) -> Health {
        self.rng.gen_range(range.min..=range.max)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn check_accepts_boundaries() {
        let range = DamageRange::default();
        assert_eq!(range.check(10), Ok(10));
        assert_eq!(range.check(29), Ok(29));
    }

    #[test]
    fn check_rejects_just_outside() {
        let range = DamageRange::default();
        assert_eq!(
            range.check(9),
            Err(DamageOutOfRange {
                rolled: 9,
                min: 10,
                max: 29
            })
        );
        assert!(range.check(30).is_err());
    }

    #[test]
    fn inverted_range_rejected() {
        assert_eq!(
            DamageRange::new(30, 10),
            Err(InvalidDamageRange { min: 30, max: 10 })
        );
    }

    #[test]
    fn single_value_range_always_rolls_it() {
        let range = DamageRange::new(12, 12).unwrap();
        let mut dice = RandomDamage::from_seed(3);
        for _ in 0..50 {
            assert_eq!(dice.roll(range), 12);
        }
    }

    #[test]
    fn random_rolls_stay_in_range() {
        let range = DamageRange::default();
        let mut dice = RandomDamage::from_seed(7);
        let mut seen_min = false;
        let mut seen_max = false;
        for _ in 0..5000 {
            let rolled = dice.roll(range);
            assert!(range.check(rolled).is_ok(), "rolled {}", rolled);
            seen_min |= rolled == range.min();
            seen_max |= rolled == range.max();
        }
        assert!(seen_min && seen_max);
    }

    #[test]
    fn same_seed_same_rolls() {
        let range = DamageRange::default();
        let mut a = RandomDamage::from_seed(42);
        let mut b = RandomDamage::from_seed(42);
        let rolls_a: Vec<_> = (0..20).map(|_| a.roll(range)).collect();
        let rolls_b: Vec<_> = (0..20).map(|_| b.roll(range)).collect();
        assert_eq!(rolls_a, rolls_b);
    }
}
