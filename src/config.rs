use crate::bunch::BunchShape;
use crate::constants::{ELECTRON_MASS_GEV, PROTON_MASS_GEV};
use crate::grid::Binning;
use crate::vecmath::Vec3;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

// Population and optics of one bunch, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct BunchConfig {
    pub npart: usize,
    pub emittance_x_nm: f64,
    pub beta_x_cm: f64,
    pub emittance_y_nm: f64,
    pub beta_y_cm: f64,
    pub length_cm: f64,
    pub energy_gev: f64,
    /// Mass number A for nucleus beams.
    #[serde(default = "default_one")]
    pub nucleons: u32,
    /// Charge number Z for nucleus beams.
    #[serde(default = "default_one")]
    pub charge: u32,
}

fn default_one() -> u32 {
    1
}

/// Total energy and longitudinal momentum of a beam, both in GeV.
#[derive(Debug, Clone, Copy)]
pub struct BeamKinematics {
    pub total_energy_gev: f64,
    pub momentum_gev: f64,
}

impl BunchConfig {
    pub fn shape(&self) -> BunchShape {
        BunchShape {
            npart: self.npart,
            emittance_x_nm: self.emittance_x_nm,
            beta_x_cm: self.beta_x_cm,
            emittance_y_nm: self.emittance_y_nm,
            beta_y_cm: self.beta_y_cm,
            length_cm: self.length_cm,
        }
    }

    /// Electron-beam kinematics: p = sqrt(E^2 - me^2).
    pub fn electron_kinematics(&self) -> BeamKinematics {
        let momentum = (self.energy_gev.powi(2) - ELECTRON_MASS_GEV.powi(2)).sqrt();
        BeamKinematics {
            total_energy_gev: self.energy_gev,
            momentum_gev: momentum,
        }
    }

    /// Hadron-beam kinematics for a nucleus with `nucleons` (A) and `charge`
    /// (Z): the configured energy is the proton-equivalent beam energy, so
    /// p = sqrt(E^2 - mp^2) * Z, m = mp * A, E_total = sqrt(p^2 + m^2).
    pub fn hadron_kinematics(&self) -> BeamKinematics {
        let momentum_per_charge = (self.energy_gev.powi(2) - PROTON_MASS_GEV.powi(2)).sqrt();
        let momentum = momentum_per_charge * self.charge as f64;
        let mass = PROTON_MASS_GEV * self.nucleons as f64;
        BeamKinematics {
            total_energy_gev: (momentum * momentum + mass * mass).sqrt(),
            momentum_gev: momentum,
        }
    }
}

// Crossing geometry of the two beams at the interaction region
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct CrossingConfig {
    /// Full horizontal crossing angle in mrad.
    pub cross_angle_mrad: f64,
    /// Vertical crossing component in urad.
    #[serde(default)]
    pub y_angle_urad: f64,
}

impl CrossingConfig {
    /// Rotation applied to each bunch cloud: half the crossing angle.
    pub fn half_rotation_mrad(&self) -> f64 {
        -self.cross_angle_mrad / 2.0
    }

    /// Electron beam travels along -z, unrotated.
    pub fn electron_direction(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, -1.0)
    }

    /// Hadron beam travels along +z tilted by the full crossing angle about
    /// y and the vertical component about x.
    pub fn hadron_direction(&self) -> Vec3 {
        Vec3::new(0.0, 0.0, 1.0)
            .rotated_y(-self.cross_angle_mrad * 1e-3)
            .rotated_x(self.y_angle_urad * 1e-6)
    }
}

// Shared grid partition for the density and overlap histograms
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct BinningConfig {
    pub nx: usize,
    pub xmin: f64,
    pub xmax: f64,
    pub ny: usize,
    pub ymin: f64,
    pub ymax: f64,
    pub nz: usize,
    pub zmin: f64,
    pub zmax: f64,
}

impl BinningConfig {
    pub fn binning(&self) -> Result<Binning> {
        Binning::new(
            self.nx, self.xmin, self.xmax,
            self.ny, self.ymin, self.ymax,
            self.nz, self.zmin, self.zmax,
        )
    }
}

// Time window of the evolution run
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct EvolutionConfig {
    pub t_min_ns: f64,
    pub t_max_ns: f64,
    pub n_steps: usize,
}

#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SamplingConfig {
    pub seed: u64,
}

// Output settings, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub base_filename: String,
    /// Profile format: "json", "bincode", "messagepack".
    pub format: Option<String>,
    #[serde(default = "default_save_profiles")]
    pub save_profiles: bool,
    #[serde(default)]
    pub save_positions: bool,
}

fn default_save_profiles() -> bool {
    true
}

// Main simulation configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SimulationConfig {
    pub electron: BunchConfig,
    pub hadron: BunchConfig,
    pub crossing: CrossingConfig,
    pub binning: BinningConfig,
    pub evolution: EvolutionConfig,
    pub sampling: SamplingConfig,
    pub output: OutputConfig,
}

impl SimulationConfig {
    /// Loads the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref)
            .map_err(|e| anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e))?;
        let config: SimulationConfig = toml::from_str(&config_str)
            .map_err(|e| anyhow::anyhow!("Failed to parse TOML from '{}': {}", path_ref.display(), e))?;

        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (name, bunch) in [("electron", &self.electron), ("hadron", &self.hadron)] {
            if bunch.emittance_x_nm <= 0.0 || bunch.emittance_y_nm <= 0.0 {
                anyhow::bail!("[{}] emittances must be positive.", name);
            }
            if bunch.beta_x_cm <= 0.0 || bunch.beta_y_cm <= 0.0 {
                anyhow::bail!("[{}] beta* functions must be positive.", name);
            }
            if bunch.length_cm <= 0.0 {
                anyhow::bail!("[{}] bunch length must be positive.", name);
            }
            if bunch.nucleons == 0 || bunch.charge == 0 {
                anyhow::bail!("[{}] nucleons and charge must be at least 1.", name);
            }
        }
        if self.electron.energy_gev <= ELECTRON_MASS_GEV {
            anyhow::bail!("[electron] energy must exceed the electron mass.");
        }
        if self.hadron.energy_gev <= PROTON_MASS_GEV {
            anyhow::bail!("[hadron] energy must exceed the proton mass.");
        }
        if self.evolution.n_steps == 0 {
            anyhow::bail!("[evolution] n_steps must be greater than 0.");
        }
        // Bin counts and ranges are validated when the Binning is built.
        self.binning.binning()?;
        Ok(())
    }
}
