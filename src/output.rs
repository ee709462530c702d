use crate::vecmath::Vec3;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// The three time-integrated overlap profiles produced by an evolution run,
/// keyed by the names the persistence layer stores them under.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimeProfiles {
    pub hxt: Vec<f64>,
    pub hyt: Vec<f64>,
    pub hzt: Vec<f64>,
}

/// Persistence collaborator for finished time profiles. The simulation only
/// hands over the arrays; where and how they end up is the sink's business.
pub trait ProfileSink {
    fn store(&mut self, profiles: &TimeProfiles) -> Result<()>;
}

/// Serialization format for the profile file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProfileFormat {
    Json,
    Bincode,
    MessagePack,
}

impl ProfileFormat {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "json" => Some(Self::Json),
            "bincode" => Some(Self::Bincode),
            "messagepack" => Some(Self::MessagePack),
            _ => None,
        }
    }

    pub fn extension(&self) -> &'static str {
        match self {
            Self::Json => "json",
            Self::Bincode => "bin",
            Self::MessagePack => "msgpack",
        }
    }
}

/// Writes the profiles to `<base>_profiles.<ext>` in the chosen format.
pub struct FileSink {
    path: PathBuf,
    format: ProfileFormat,
}

impl FileSink {
    pub fn new(base_filename: &str, format: ProfileFormat) -> Self {
        let path = PathBuf::from(format!(
            "{}_profiles.{}",
            base_filename,
            format.extension()
        ));
        Self { path, format }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ProfileSink for FileSink {
    fn store(&mut self, profiles: &TimeProfiles) -> Result<()> {
        let mut file = File::create(&self.path)
            .with_context(|| format!("failed to create profile file '{}'", self.path.display()))?;
        match self.format {
            ProfileFormat::Json => {
                let json = serde_json::to_string(profiles)
                    .context("failed to serialize profiles to JSON")?;
                file.write_all(json.as_bytes())
                    .with_context(|| format!("failed to write '{}'", self.path.display()))?;
            }
            ProfileFormat::Bincode => {
                bincode::serialize_into(file, profiles)
                    .context("failed to serialize profiles to bincode")?;
            }
            ProfileFormat::MessagePack => {
                rmp_serde::encode::write(&mut file, profiles)
                    .context("failed to serialize profiles to MessagePack")?;
            }
        }
        Ok(())
    }
}

/// Sink for runs that only consume the in-memory accessors afterwards.
pub struct DiscardSink;

impl ProfileSink for DiscardSink {
    fn store(&mut self, _profiles: &TimeProfiles) -> Result<()> {
        Ok(())
    }
}

/// Dumps particle positions as CSV, one row per particle, coordinates in mm.
pub fn write_positions_csv<P: AsRef<Path>>(path: P, particles: &[Vec3]) -> Result<()> {
    let path = path.as_ref();
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create CSV file '{}'", path.display()))?;
    writer.write_record(["x_mm", "y_mm", "z_mm"])?;
    for p in particles {
        writer.write_record([
            format!("{:.6}", p.x),
            format!("{:.6}", p.y),
            format!("{:.6}", p.z),
        ])?;
    }
    writer.flush()?;
    Ok(())
}
