use crate::vecmath::Vec3;
use anyhow::Result;
use serde::{Deserialize, Serialize};

/// One axis of a binned partition: `bins` equal-width bins covering [min, max).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BinAxis {
    bins: usize,
    min: f64,
    max: f64,
}

impl BinAxis {
    /// Creates a validated axis. Zero bins or an empty/inverted range is a
    /// configuration error, never an empty partition.
    pub fn new(bins: usize, min: f64, max: f64) -> Result<Self> {
        if bins == 0 {
            anyhow::bail!("bin count must be at least 1 (got 0)");
        }
        if !min.is_finite() || !max.is_finite() {
            anyhow::bail!("axis range must be finite (got {}..{})", min, max);
        }
        if min >= max {
            anyhow::bail!("axis range must satisfy min < max (got {}..{})", min, max);
        }
        Ok(Self { bins, min, max })
    }

    #[inline(always)]
    pub fn bins(&self) -> usize { self.bins }
    #[inline(always)]
    pub fn min(&self) -> f64 { self.min }
    #[inline(always)]
    pub fn max(&self) -> f64 { self.max }
    #[inline(always)]
    pub fn width(&self) -> f64 { (self.max - self.min) / self.bins as f64 }

    /// Bin index for a coordinate, or `None` when it falls outside [min, max).
    #[inline(always)]
    pub fn index(&self, coord: f64) -> Option<usize> {
        if coord < self.min || coord >= self.max {
            return None;
        }
        let idx = ((coord - self.min) / self.width()).floor() as usize;
        // Coordinates just below max can land on `bins` through rounding
        Some(idx.min(self.bins - 1))
    }

    /// Center coordinate of bin `idx`.
    #[inline(always)]
    pub fn center(&self, idx: usize) -> f64 {
        self.min + (idx as f64 + 0.5) * self.width()
    }
}

/// Shared (x, y, z) partition used by the bunch density grids and the
/// overlap grids. Pair computation requires both bunches to carry an
/// identical `Binning`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Binning {
    pub x: BinAxis,
    pub y: BinAxis,
    pub z: BinAxis,
}

impl Binning {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        nx: usize, xmin: f64, xmax: f64,
        ny: usize, ymin: f64, ymax: f64,
        nz: usize, zmin: f64, zmax: f64,
    ) -> Result<Self> {
        Ok(Self {
            x: BinAxis::new(nx, xmin, xmax)?,
            y: BinAxis::new(ny, ymin, ymax)?,
            z: BinAxis::new(nz, zmin, zmax)?,
        })
    }
}

/// Dense 3D histogram of particle positions over a `Binning`.
/// Flat storage with x fastest: idx = ix + nx * (iy + ny * iz).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid3 {
    binning: Binning,
    counts: Vec<f64>,
}

impl Grid3 {
    pub fn new(binning: Binning) -> Self {
        let len = binning.x.bins() * binning.y.bins() * binning.z.bins();
        Self { binning, counts: vec![0.0; len] }
    }

    #[inline(always)]
    fn linear(&self, ix: usize, iy: usize, iz: usize) -> usize {
        ix + self.binning.x.bins() * (iy + self.binning.y.bins() * iz)
    }

    pub fn reset(&mut self) {
        self.counts.iter_mut().for_each(|c| *c = 0.0);
    }

    /// Counts a position into its bin. Out-of-range positions are dropped;
    /// the particle list stays authoritative.
    pub fn fill(&mut self, pos: Vec3) {
        let (Some(ix), Some(iy), Some(iz)) = (
            self.binning.x.index(pos.x),
            self.binning.y.index(pos.y),
            self.binning.z.index(pos.z),
        ) else {
            return;
        };
        let idx = self.linear(ix, iy, iz);
        self.counts[idx] += 1.0;
    }

    #[inline(always)]
    pub fn value(&self, ix: usize, iy: usize, iz: usize) -> f64 {
        self.counts[self.linear(ix, iy, iz)]
    }

    /// Sum over all in-range bins.
    pub fn total(&self) -> f64 {
        self.counts.iter().sum()
    }

    #[inline(always)]
    pub fn binning(&self) -> &Binning {
        &self.binning
    }
}

/// Dense 2D accumulation grid over an (x, y) partition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid2 {
    x: BinAxis,
    y: BinAxis,
    values: Vec<f64>,
}

impl Grid2 {
    pub fn new(x: BinAxis, y: BinAxis) -> Self {
        let len = x.bins() * y.bins();
        Self { x, y, values: vec![0.0; len] }
    }

    pub fn reset(&mut self) {
        self.values.iter_mut().for_each(|v| *v = 0.0);
    }

    #[inline(always)]
    pub fn add(&mut self, ix: usize, iy: usize, value: f64) {
        self.values[ix + self.x.bins() * iy] += value;
    }

    #[inline(always)]
    pub fn value(&self, ix: usize, iy: usize) -> f64 {
        self.values[ix + self.x.bins() * iy]
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    #[inline(always)]
    pub fn x_axis(&self) -> &BinAxis { &self.x }
    #[inline(always)]
    pub fn y_axis(&self) -> &BinAxis { &self.y }
    #[inline(always)]
    pub fn values(&self) -> &[f64] { &self.values }
}

/// Dense 1D accumulation profile over a single axis.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Grid1 {
    axis: BinAxis,
    values: Vec<f64>,
}

impl Grid1 {
    pub fn new(axis: BinAxis) -> Self {
        Self { axis, values: vec![0.0; axis.bins()] }
    }

    pub fn reset(&mut self) {
        self.values.iter_mut().for_each(|v| *v = 0.0);
    }

    #[inline(always)]
    pub fn add(&mut self, idx: usize, value: f64) {
        self.values[idx] += value;
    }

    #[inline(always)]
    pub fn value(&self, idx: usize) -> f64 {
        self.values[idx]
    }

    pub fn max(&self) -> f64 {
        self.values.iter().copied().fold(0.0, f64::max)
    }

    #[inline(always)]
    pub fn axis(&self) -> &BinAxis { &self.axis }
    #[inline(always)]
    pub fn values(&self) -> &[f64] { &self.values }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn axis_indexing_covers_range() {
        let axis = BinAxis::new(4, -2.0, 2.0).unwrap();
        assert_eq!(axis.index(-2.0), Some(0));
        assert_eq!(axis.index(-0.5), Some(1));
        assert_eq!(axis.index(1.999), Some(3));
        assert_eq!(axis.index(2.0), None);
        assert_eq!(axis.index(-2.001), None);
    }

    #[test]
    fn axis_rejects_degenerate_partitions() {
        assert!(BinAxis::new(0, 0.0, 1.0).is_err());
        assert!(BinAxis::new(10, 1.0, 1.0).is_err());
        assert!(BinAxis::new(10, 2.0, -2.0).is_err());
        assert!(BinAxis::new(10, f64::NAN, 1.0).is_err());
    }

    #[test]
    fn grid3_drops_out_of_range_fills() {
        let binning = Binning::new(2, -1.0, 1.0, 2, -1.0, 1.0, 2, -1.0, 1.0).unwrap();
        let mut grid = Grid3::new(binning);
        grid.fill(Vec3::new(0.5, 0.5, 0.5));
        grid.fill(Vec3::new(5.0, 0.0, 0.0));
        assert_eq!(grid.total(), 1.0);
        assert_eq!(grid.value(1, 1, 1), 1.0);
    }
}
