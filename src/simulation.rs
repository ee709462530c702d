use crate::bunch::Bunch;
use crate::grid::{Binning, Grid1, Grid2};
use crate::output::{ProfileSink, TimeProfiles};
use anyhow::Result;
use log::{debug, info};

/// Overlap grids and time-integrated profiles, allocated together whenever
/// binning is (re)configured.
struct PairGrids {
    /// Pair density summed over z, per (x, y) bin.
    overlap_xy: Grid2,
    /// Pair density summed over (x, y), per z bin.
    overlap_z: Grid1,
    /// Time-integrated marginals accumulated across an evolution run.
    profile_x: Grid1,
    profile_y: Grid1,
    profile_z: Grid1,
    /// Maximum of `overlap_xy` right after binning was configured. Kept as a
    /// normalization reference for external rendering only.
    initial_peak: f64,
}

impl PairGrids {
    fn new(binning: Binning) -> Self {
        Self {
            overlap_xy: Grid2::new(binning.x, binning.y),
            overlap_z: Grid1::new(binning.z),
            profile_x: Grid1::new(binning.x),
            profile_y: Grid1::new(binning.y),
            profile_z: Grid1::new(binning.z),
            initial_peak: 0.0,
        }
    }

    /// Folds the current overlap grids into the time-integrated profiles.
    fn accumulate_profiles(&mut self) {
        for iy in 0..self.overlap_xy.y_axis().bins() {
            for ix in 0..self.overlap_xy.x_axis().bins() {
                let v = self.overlap_xy.value(ix, iy);
                self.profile_x.add(ix, v);
                self.profile_y.add(iy, v);
            }
        }
        for iz in 0..self.overlap_z.axis().bins() {
            self.profile_z.add(iz, self.overlap_z.value(iz));
        }
    }
}

/// Aggregates two caller-owned bunches and computes their spatial overlap
/// after every move.
///
/// The simulation borrows its bunches mutably for its whole lifetime: the
/// caller keeps them alive and gets them back once the simulation is
/// dropped. Pair computation uses the first two bunches only; the behavior
/// with additional bunches is undefined by design.
pub struct Simulation<'a> {
    bunches: Vec<&'a mut Bunch>,
    pairs: Option<PairGrids>,
}

impl<'a> Simulation<'a> {
    pub fn new() -> Self {
        Self { bunches: Vec::new(), pairs: None }
    }

    /// Appends a bunch. The count is not validated here; pair-dependent
    /// operations fail if fewer than two bunches are present.
    pub fn add_bunch(&mut self, bunch: &'a mut Bunch) {
        self.bunches.push(bunch);
    }

    /// Forwards identical binning to every bunch, zeroes the overlap grids
    /// and time profiles, recomputes pairs once and records the initial
    /// overlap peak.
    pub fn set_bins(&mut self, binning: Binning) -> Result<()> {
        for bunch in &mut self.bunches {
            bunch.set_bins(binning);
        }
        self.pairs = Some(PairGrids::new(binning));
        self.update_pairs()?;
        if let Some(pairs) = self.pairs.as_mut() {
            pairs.initial_peak = pairs.overlap_xy.max();
        }
        Ok(())
    }

    /// Advances every bunch by `dt` ns, then recomputes the pair overlap
    /// once. All bunches reach their new positions before any overlap is
    /// read; no interleaving.
    pub fn advance(&mut self, dt: f64) -> Result<()> {
        for bunch in &mut self.bunches {
            bunch.advance(dt);
        }
        self.update_pairs()
    }

    /// Per-bin pair overlap: for every shared (x, y, z) bin, the minimum of
    /// the two bunch densities, accumulated into the (x, y) grid and the z
    /// profile. Approximates coincident pairs as the smaller of the two
    /// densities, not a literal pair count.
    fn update_pairs(&mut self) -> Result<()> {
        let Self { bunches, pairs } = self;
        let Some(pairs) = pairs.as_mut() else {
            anyhow::bail!("pair computation requires configured binning");
        };
        if bunches.len() < 2 {
            anyhow::bail!(
                "pair computation requires two bunches (have {})",
                bunches.len()
            );
        }
        let grid0 = bunches[0]
            .grid()
            .ok_or_else(|| anyhow::anyhow!("bunch 0 has no binning configured"))?;
        let grid1 = bunches[1]
            .grid()
            .ok_or_else(|| anyhow::anyhow!("bunch 1 has no binning configured"))?;
        if grid0.binning() != grid1.binning() {
            anyhow::bail!("bunches 0 and 1 do not share identical binning");
        }

        pairs.overlap_xy.reset();
        pairs.overlap_z.reset();

        let binning = *grid0.binning();
        for iz in 0..binning.z.bins() {
            for iy in 0..binning.y.bins() {
                for ix in 0..binning.x.bins() {
                    let npair = grid0.value(ix, iy, iz).min(grid1.value(ix, iy, iz));
                    pairs.overlap_xy.add(ix, iy, npair);
                    pairs.overlap_z.add(iz, npair);
                }
            }
        }
        Ok(())
    }

    /// Evolves the bunches over `t_min..t_max` ns in `n_steps` steps and
    /// accumulates the time-integrated overlap profiles, handing the
    /// finished arrays to `sink`.
    ///
    /// The bunches are first placed one frame before the first sampled step
    /// (a single move by `t_min - dt`), so the first loop iteration lands
    /// exactly on `t_min`. Re-invoking does not reset bunch positions;
    /// callers wanting a fresh run must reconfigure first.
    pub fn run_evolution(
        &mut self,
        t_min: f64,
        t_max: f64,
        n_steps: usize,
        sink: &mut dyn ProfileSink,
    ) -> Result<()> {
        if n_steps == 0 {
            anyhow::bail!("evolution requires at least one step");
        }
        let dt = (t_max - t_min) / n_steps as f64;

        info!(
            "evolving {} bunches over {}..{} ns in {} steps (dt = {:.4} ns)",
            self.bunches.len(),
            t_min,
            t_max,
            n_steps,
            dt
        );

        self.advance(t_min - dt)?;

        for step in 0..n_steps {
            self.advance(dt)?;
            if let Some(pairs) = self.pairs.as_mut() {
                pairs.accumulate_profiles();
            }
            debug!("evolution step {}/{}", step + 1, n_steps);
        }

        let Some(pairs) = self.pairs.as_ref() else {
            anyhow::bail!("pair grids vanished during evolution");
        };
        let profiles = TimeProfiles {
            hxt: pairs.profile_x.values().to_vec(),
            hyt: pairs.profile_y.values().to_vec(),
            hzt: pairs.profile_z.values().to_vec(),
        };
        sink.store(&profiles)
    }

    #[inline(always)]
    pub fn bunch(&self, idx: usize) -> Option<&Bunch> {
        self.bunches.get(idx).map(|b| &**b)
    }

    /// Pair overlap in (x, y), or `None` until binning is configured.
    #[inline(always)]
    pub fn overlap_xy(&self) -> Option<&Grid2> {
        self.pairs.as_ref().map(|p| &p.overlap_xy)
    }

    /// Pair overlap along z, or `None` until binning is configured.
    #[inline(always)]
    pub fn overlap_z(&self) -> Option<&Grid1> {
        self.pairs.as_ref().map(|p| &p.overlap_z)
    }

    #[inline(always)]
    pub fn profile_x(&self) -> Option<&Grid1> {
        self.pairs.as_ref().map(|p| &p.profile_x)
    }

    #[inline(always)]
    pub fn profile_y(&self) -> Option<&Grid1> {
        self.pairs.as_ref().map(|p| &p.profile_y)
    }

    #[inline(always)]
    pub fn profile_z(&self) -> Option<&Grid1> {
        self.pairs.as_ref().map(|p| &p.profile_z)
    }

    /// Maximum of the (x, y) overlap recorded right after binning was
    /// configured; a normalization reference for rendering layers.
    #[inline(always)]
    pub fn initial_overlap_peak(&self) -> f64 {
        self.pairs.as_ref().map_or(0.0, |p| p.initial_peak)
    }

    /// Current maximum of the z overlap profile, for plot scaling.
    #[inline(always)]
    pub fn overlap_z_peak(&self) -> f64 {
        self.pairs.as_ref().map_or(0.0, |p| p.overlap_z.max())
    }
}

impl<'a> Default for Simulation<'a> {
    fn default() -> Self {
        Self::new()
    }
}
