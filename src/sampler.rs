use anyhow::Result;
use rand::Rng;
use rand_distr::{Distribution, Normal};

/// Truncation window applied to every bunch axis, in units of sigma.
pub const TRUNCATION_SIGMAS: f64 = 4.0;

/// Zero-mean Gaussian truncated to +-cut*sigma.
///
/// Samples are drawn from the untruncated normal and redrawn whenever they
/// fall outside the window. Implements `Distribution<f64>` so callers can
/// swap in any other distribution (e.g. a deterministic one in tests).
#[derive(Debug, Clone, Copy)]
pub struct TruncatedGaussian {
    normal: Normal<f64>,
    window: f64,
}

impl TruncatedGaussian {
    /// Fails on a degenerate width rather than letting the rejection loop
    /// run forever.
    pub fn new(sigma: f64, cut: f64) -> Result<Self> {
        if !sigma.is_finite() || sigma <= 0.0 {
            anyhow::bail!("sigma must be finite and positive (got {})", sigma);
        }
        if !cut.is_finite() || cut <= 0.0 {
            anyhow::bail!("truncation cut must be finite and positive (got {})", cut);
        }
        let normal = Normal::new(0.0, sigma)
            .map_err(|e| anyhow::anyhow!("invalid gaussian width {}: {}", sigma, e))?;
        Ok(Self { normal, window: cut * sigma })
    }

    #[inline(always)]
    pub fn sigma(&self) -> f64 {
        self.normal.std_dev()
    }

    #[inline(always)]
    pub fn window(&self) -> f64 {
        self.window
    }
}

impl Distribution<f64> for TruncatedGaussian {
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        loop {
            let v = self.normal.sample(rng);
            if v.abs() <= self.window {
                return v;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::prelude::*;

    #[test]
    fn rejects_degenerate_width() {
        assert!(TruncatedGaussian::new(0.0, TRUNCATION_SIGMAS).is_err());
        assert!(TruncatedGaussian::new(-1.0, TRUNCATION_SIGMAS).is_err());
        assert!(TruncatedGaussian::new(f64::NAN, TRUNCATION_SIGMAS).is_err());
        assert!(TruncatedGaussian::new(1.0, 0.0).is_err());
    }

    #[test]
    fn samples_stay_inside_window() {
        let dist = TruncatedGaussian::new(2.0, 1.5).unwrap();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let v: f64 = dist.sample(&mut rng);
            assert!(v.abs() <= 3.0, "sample {} escaped the window", v);
        }
    }
}
