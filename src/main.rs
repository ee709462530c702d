use anyhow::Result;
use log::{debug, info, warn};
use rand::prelude::*;
use std::time::Instant;

use beam_overlap_engine::bunch::Bunch;
use beam_overlap_engine::config::SimulationConfig;
use beam_overlap_engine::output::{write_positions_csv, DiscardSink, FileSink, ProfileFormat};
use beam_overlap_engine::simulation::Simulation;

fn main() -> Result<()> {
    // Initialize the logger
    env_logger::init();

    info!("Starting Beam Overlap Engine...");

    // --- Load Configuration ---
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config.toml".to_string());
    let config = SimulationConfig::load(&config_path)?;
    debug!("Configuration: {:#?}", config);

    let mut rng = StdRng::seed_from_u64(config.sampling.seed);

    // --- Electron bunch ---
    let mut electron = Bunch::sample(&config.electron.shape(), &mut rng)?;
    electron.rotate_y(config.crossing.half_rotation_mrad());
    let kin_e = config.electron.electron_kinematics();
    electron.set_kinematics(
        kin_e.total_energy_gev,
        kin_e.momentum_gev,
        config.crossing.electron_direction(),
    );

    // --- Hadron bunch ---
    let mut hadron = Bunch::sample(&config.hadron.shape(), &mut rng)?;
    hadron.rotate_y(config.crossing.half_rotation_mrad());
    let kin_h = config.hadron.hadron_kinematics();
    hadron.set_kinematics(
        kin_h.total_energy_gev,
        kin_h.momentum_gev,
        config.crossing.hadron_direction(),
    );

    info!(
        "Bunches sampled: {} hadrons at {:.1} GeV, {} electrons at {:.3} GeV, crossing angle {} mrad",
        hadron.particles().len(),
        kin_h.total_energy_gev,
        electron.particles().len(),
        kin_e.total_energy_gev,
        config.crossing.cross_angle_mrad
    );

    // --- Simulation ---
    let mut sim = Simulation::new();
    sim.add_bunch(&mut hadron);
    sim.add_bunch(&mut electron);
    sim.set_bins(config.binning.binning()?)?;
    info!("Initial overlap peak: {:.1}", sim.initial_overlap_peak());

    // --- Evolution ---
    let format = match config.output.format.as_deref() {
        None => ProfileFormat::Json,
        Some(name) => ProfileFormat::from_name(name).unwrap_or_else(|| {
            warn!("Unknown output format: {}. Using JSON instead.", name);
            ProfileFormat::Json
        }),
    };

    let start_time = Instant::now();
    let evo = &config.evolution;
    if config.output.save_profiles {
        let mut sink = FileSink::new(&config.output.base_filename, format);
        sim.run_evolution(evo.t_min_ns, evo.t_max_ns, evo.n_steps, &mut sink)?;
        info!("Time profiles saved to {}", sink.path().display());
    } else {
        info!("Skipping profile persistence as per config (save_profiles is false).");
        sim.run_evolution(evo.t_min_ns, evo.t_max_ns, evo.n_steps, &mut DiscardSink)?;
    }
    info!(
        "Evolution finished in {:.3} seconds.",
        start_time.elapsed().as_secs_f64()
    );

    // Release the bunch borrows before dumping positions
    drop(sim);

    // --- Save final positions if requested ---
    if config.output.save_positions {
        for (name, bunch) in [("hadron", &hadron), ("electron", &electron)] {
            let filename = format!("{}_{}_positions.csv", config.output.base_filename, name);
            write_positions_csv(&filename, bunch.particles())?;
            info!("Final positions saved to {}", filename);
        }
    } else {
        info!("Skipping saving final positions as per config.");
    }

    info!("Simulation Complete.");
    Ok(())
}
