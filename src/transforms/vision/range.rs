use anyhow::{ensure, Result};
use rand::Rng;

/// A closed factor interval `[lo, hi]`, immutable once constructed.
///
/// Both constructors normalize user configuration into an interval and return
/// `None` when the interval collapses onto the no-op center value, so a
/// disabled adjustment and a vacuous one look the same to the sampler.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FactorRange {
    lo: f64,
    hi: f64,
}

impl FactorRange {
    /// Builds a symmetric interval `(center - amount, center + amount)` from a
    /// single non-negative amount. With `clip_low`, the lower end is clamped
    /// to 0 for effects undefined on negative factors.
    pub fn symmetric(name: &str, amount: f64, center: f64, clip_low: bool) -> Result<Option<Self>> {
        ensure!(
            amount >= 0.0,
            "{} amount must be non-negative (got {})",
            name,
            amount
        );
        let mut lo = center - amount;
        let hi = center + amount;
        if clip_low {
            lo = lo.max(0.0);
        }
        Ok(Self::collapse(lo, hi, center))
    }

    /// Accepts an explicit `(lo, hi)` pair, requiring
    /// `bound.0 <= lo <= hi <= bound.1`. The pair is kept unchanged.
    pub fn explicit(
        name: &str,
        lo: f64,
        hi: f64,
        center: f64,
        bound: (f64, f64),
    ) -> Result<Option<Self>> {
        ensure!(
            bound.0 <= lo && lo <= hi && hi <= bound.1,
            "{} range ({}, {}) must satisfy {} <= lo <= hi <= {}",
            name,
            lo,
            hi,
            bound.0,
            bound.1
        );
        Ok(Self::collapse(lo, hi, center))
    }

    fn collapse(lo: f64, hi: f64, center: f64) -> Option<Self> {
        if lo == hi && hi == center {
            None
        } else {
            Some(Self { lo, hi })
        }
    }

    pub fn low(&self) -> f64 {
        self.lo
    }

    pub fn high(&self) -> f64 {
        self.hi
    }

    /// Draws a uniform factor from `[lo, hi]`. Inclusive so degenerate
    /// off-center pairs like `(0.5, 0.5)` still sample.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        rng.random_range(self.lo..=self.hi)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_symmetric_clips_low_end_at_zero() -> Result<()> {
        let range = FactorRange::symmetric("brightness", 1.5, 1.0, true)?.unwrap();
        assert_eq!(range.low(), 0.0);
        assert_eq!(range.high(), 2.5);
        Ok(())
    }

    #[test]
    fn test_symmetric_without_clipping() -> Result<()> {
        let range = FactorRange::symmetric("hue", 0.3, 0.0, false)?.unwrap();
        assert_eq!(range.low(), -0.3);
        assert_eq!(range.high(), 0.3);
        Ok(())
    }

    #[test]
    fn test_symmetric_zero_amount_is_noop() -> Result<()> {
        assert!(FactorRange::symmetric("contrast", 0.0, 1.0, true)?.is_none());
        Ok(())
    }

    #[test]
    fn test_symmetric_rejects_negative_amount() {
        assert!(FactorRange::symmetric("brightness", -0.1, 1.0, true).is_err());
    }

    #[test]
    fn test_explicit_keeps_valid_pair_unchanged() -> Result<()> {
        let range =
            FactorRange::explicit("saturation", 0.4, 0.6, 1.0, (0.0, f64::INFINITY))?.unwrap();
        assert_eq!((range.low(), range.high()), (0.4, 0.6));
        Ok(())
    }

    #[test]
    fn test_explicit_collapses_onto_center() -> Result<()> {
        assert!(FactorRange::explicit("contrast", 1.0, 1.0, 1.0, (0.0, f64::INFINITY))?.is_none());
        // Degenerate but off-center pairs stay enabled
        assert!(FactorRange::explicit("contrast", 0.5, 0.5, 1.0, (0.0, f64::INFINITY))?.is_some());
        Ok(())
    }

    #[test]
    fn test_explicit_rejects_misordered_pair() {
        assert!(FactorRange::explicit("contrast", 0.6, 0.4, 1.0, (0.0, f64::INFINITY)).is_err());
    }

    #[test]
    fn test_explicit_rejects_out_of_bound_pair() {
        assert!(FactorRange::explicit("hue", -0.7, 0.1, 0.0, (-0.5, 0.5)).is_err());
        assert!(FactorRange::explicit("hue", -0.1, 0.7, 0.0, (-0.5, 0.5)).is_err());
    }

    #[test]
    fn test_sample_stays_within_interval() -> Result<()> {
        let range = FactorRange::explicit("brightness", 0.8, 1.2, 1.0, (0.0, f64::INFINITY))?
            .expect("range is enabled");
        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..100 {
            let factor = range.sample(&mut rng);
            assert!((0.8..=1.2).contains(&factor));
        }
        Ok(())
    }

    #[test]
    fn test_sample_degenerate_interval() -> Result<()> {
        let range = FactorRange::explicit("contrast", 0.5, 0.5, 1.0, (0.0, f64::INFINITY))?
            .expect("range is enabled");
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(range.sample(&mut rng), 0.5);
        Ok(())
    }
}
