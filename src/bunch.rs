use crate::constants::SPEED_OF_LIGHT_MM_NS;
use crate::grid::{Binning, Grid3};
use crate::sampler::{TruncatedGaussian, TRUNCATION_SIGMAS};
use crate::vecmath::Vec3;
use anyhow::Result;
use log::debug;
use rand::Rng;
use rand_distr::Distribution;

/// Shape parameters of a bunch in accelerator units:
/// RMS emittances in nm, beta* functions in cm, RMS bunch length in cm.
#[derive(Debug, Clone, Copy)]
pub struct BunchShape {
    pub npart: usize,
    pub emittance_x_nm: f64,
    pub beta_x_cm: f64,
    pub emittance_y_nm: f64,
    pub beta_y_cm: f64,
    pub length_cm: f64,
}

impl BunchShape {
    /// Horizontal RMS width in mm: sqrt(emittance[nm]*1e-6 * beta*[cm]*10).
    #[inline(always)]
    pub fn sigma_x_mm(&self) -> f64 {
        (self.emittance_x_nm * 1e-6 * self.beta_x_cm * 10.0).sqrt()
    }

    /// Vertical RMS width in mm.
    #[inline(always)]
    pub fn sigma_y_mm(&self) -> f64 {
        (self.emittance_y_nm * 1e-6 * self.beta_y_cm * 10.0).sqrt()
    }

    /// Longitudinal RMS width in mm (cm -> mm).
    #[inline(always)]
    pub fn sigma_z_mm(&self) -> f64 {
        self.length_cm * 10.0
    }
}

/// An ensemble of sampled particle positions moving as a rigid group with a
/// shared velocity and direction, plus a density grid rebuilt from the
/// current positions.
///
/// The particle count is fixed at construction; rotation and translation
/// move particles but never add or remove any. Whenever binning is
/// configured, the density grid always reflects the current positions.
pub struct Bunch {
    particles: Vec<Vec3>,
    /// Velocity magnitude in mm/ns.
    velocity: f64,
    /// Translation direction, stored exactly as the caller provided it.
    direction: Vec3,
    grid: Option<Grid3>,
}

impl Bunch {
    /// Draws `shape.npart` independent positions, each axis from a zero-mean
    /// Gaussian truncated to +-4 sigma. Fails before any draw if a width is
    /// degenerate.
    pub fn sample<R: Rng>(shape: &BunchShape, rng: &mut R) -> Result<Self> {
        let dist_x = TruncatedGaussian::new(shape.sigma_x_mm(), TRUNCATION_SIGMAS)?;
        let dist_y = TruncatedGaussian::new(shape.sigma_y_mm(), TRUNCATION_SIGMAS)?;
        let dist_z = TruncatedGaussian::new(shape.sigma_z_mm(), TRUNCATION_SIGMAS)?;
        debug!(
            "sampling bunch: npart={} sigma=({:.4}, {:.4}, {:.2}) mm",
            shape.npart,
            dist_x.sigma(),
            dist_y.sigma(),
            dist_z.sigma()
        );
        Ok(Self::sample_with(shape.npart, &dist_x, &dist_y, &dist_z, rng))
    }

    /// Draws `npart` positions from caller-supplied per-axis distributions.
    /// This is the seam for substituting deterministic distributions in
    /// tests.
    pub fn sample_with<R, Dx, Dy, Dz>(
        npart: usize,
        dist_x: &Dx,
        dist_y: &Dy,
        dist_z: &Dz,
        rng: &mut R,
    ) -> Self
    where
        R: Rng,
        Dx: Distribution<f64>,
        Dy: Distribution<f64>,
        Dz: Distribution<f64>,
    {
        let particles = (0..npart)
            .map(|_| Vec3::new(dist_x.sample(rng), dist_y.sample(rng), dist_z.sample(rng)))
            .collect();
        Self {
            particles,
            velocity: 0.0,
            direction: Vec3::zero(),
            grid: None,
        }
    }

    /// Rotates every particle about the y-axis by `angle_mrad`/1000 radians,
    /// in place, and rebuilds the density grid at the configured binning.
    pub fn rotate_y(&mut self, angle_mrad: f64) {
        let theta = angle_mrad * 1e-3;
        for p in &mut self.particles {
            *p = p.rotated_y(theta);
        }
        self.rebuild_grid();
    }

    /// Sets the relativistic kinematics: beta = momentum / total_energy
    /// (momentum taken as purely longitudinal), velocity = beta * c.
    ///
    /// `direction` is stored verbatim and is expected to be a unit vector.
    /// A non-normalized direction silently scales the effective speed along
    /// the path; the caller is responsible for normalization.
    pub fn set_kinematics(&mut self, total_energy: f64, momentum: f64, direction: Vec3) {
        let beta = momentum / total_energy;
        self.velocity = beta * SPEED_OF_LIGHT_MM_NS;
        self.direction = direction;
    }

    /// Replaces the grid partition and re-counts the current positions.
    /// Out-of-range particles are dropped from the grid but kept in the
    /// ensemble.
    pub fn set_bins(&mut self, binning: Binning) {
        self.grid = Some(Grid3::new(binning));
        self.rebuild_grid();
    }

    /// Moves every particle by velocity * dt along the direction vector,
    /// then rebuilds the density grid. `dt` in ns; a negative dt moves the
    /// bunch backwards along its path.
    pub fn advance(&mut self, dt: f64) {
        let delta = self.direction.scale(self.velocity * dt);
        for p in &mut self.particles {
            *p = p.add(delta);
        }
        self.rebuild_grid();
    }

    fn rebuild_grid(&mut self) {
        if let Some(grid) = &mut self.grid {
            grid.reset();
            for p in &self.particles {
                grid.fill(*p);
            }
        }
    }

    #[inline(always)]
    pub fn particles(&self) -> &[Vec3] {
        &self.particles
    }

    /// The density grid, or `None` until binning has been configured.
    #[inline(always)]
    pub fn grid(&self) -> Option<&Grid3> {
        self.grid.as_ref()
    }

    #[inline(always)]
    pub fn velocity(&self) -> f64 {
        self.velocity
    }

    #[inline(always)]
    pub fn direction(&self) -> Vec3 {
        self.direction
    }
}
