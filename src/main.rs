// Copyright (c) 2026 Amunchain
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//     http://www.apache.org/licenses/LICENSE-2.0
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

//! Command-line entrypoint for the BFT consensus simulator.

use std::io::BufWriter;
use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use tracing::{info, warn};

use bft_sim::config::SimConfig;
use bft_sim::determinism::check_determinism;
use bft_sim::network::JsonLinesLogger;
use bft_sim::simulator::Simulator;

/// Which of the three run modes to execute.
#[derive(Copy, Clone, Debug, ValueEnum)]
enum Mode {
    /// Run a single simulation and write its event log.
    Simulator,
    /// Run a small simulation and check cross-validator agreement.
    Test,
    /// Run the simulation twice and diff the resulting event logs.
    Determinism,
}

/// Deterministic discrete-event BFT consensus simulator.
#[derive(Parser, Debug)]
#[command(name = "bft-sim", version, about)]
struct Cli {
    /// Which mode to run.
    #[arg(long, value_enum, default_value_t = Mode::Simulator)]
    mode: Mode,

    /// Path to a YAML config file. Missing file falls back to defaults.
    #[arg(long)]
    config: Option<PathBuf>,

    /// PRNG seed for the network and validator key derivation.
    #[arg(long, default_value_t = 42)]
    seed: u64,

    /// Maximum event-loop iterations to run.
    #[arg(long, default_value_t = 200_000)]
    steps: u64,

    /// Output path (simulator mode: event log file; determinism mode:
    /// directory for `run_1.log`/`run_2.log`).
    #[arg(long, default_value = "bft-sim-output")]
    output: PathBuf,
}

fn load_config(path: Option<&PathBuf>) -> SimConfig {
    let Some(path) = path else {
        return SimConfig::default();
    };
    match SimConfig::load(path) {
        Ok(config) => config,
        Err(err) => {
            warn!(?err, path = %path.display(), "config file missing or invalid, using defaults");
            SimConfig::default()
        }
    }
}

fn run_simulator_mode(cli: &Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_ref());
    let file = std::fs::File::create(&cli.output)?;
    let logger = JsonLinesLogger::new(BufWriter::new(file));
    let mut sim = Simulator::new(&config, cli.seed, logger);
    sim.run(cli.steps)?;
    info!(output = %cli.output.display(), "simulation complete");
    Ok(())
}

fn run_test_mode(cli: &Cli) -> anyhow::Result<bool> {
    let mut config = load_config(cli.config.as_ref());
    if config.simulation.max_blocks == 0 {
        config.simulation.max_blocks = 5;
    }
    let logger = JsonLinesLogger::new(Vec::new());
    let mut sim = Simulator::new(&config, cli.seed, logger);
    sim.run(cli.steps)?;

    let target = config.simulation.max_blocks;
    let ledgers: Vec<_> = sim.nodes().values().map(|n| n.ledger()).collect();
    let all_progressed = ledgers.iter().all(|l| l.len() as u64 >= target);

    let mut agreement = true;
    if let Some(shortest) = ledgers.iter().map(|l| l.len()).min() {
        for height in 0..shortest as u64 {
            let hashes: Vec<_> = ledgers
                .iter()
                .filter_map(|l| l.get_block(height))
                .map(|b| b.block_hash())
                .collect();
            if hashes.windows(2).any(|w| w[0] != w[1]) {
                agreement = false;
                break;
            }
        }
    }

    info!(all_progressed, agreement, "test mode result");
    Ok(all_progressed && agreement)
}

fn run_determinism_mode(cli: &Cli) -> anyhow::Result<bool> {
    let config = load_config(cli.config.as_ref());
    let report = check_determinism(&config, cli.seed, cli.steps, &cli.output)?;
    println!("{}", report.summary());
    Ok(report.identical)
}

fn main() {
    let _ = tracing_subscriber::fmt().with_target(false).with_level(true).compact().try_init();

    let cli = Cli::parse();

    let result = match cli.mode {
        Mode::Simulator => run_simulator_mode(&cli).map(|()| true),
        Mode::Test => run_test_mode(&cli),
        Mode::Determinism => run_determinism_mode(&cli),
    };

    match result {
        Ok(true) => std::process::exit(0),
        Ok(false) => {
            warn!("run did not satisfy expectations");
            std::process::exit(1);
        }
        Err(err) => {
            eprintln!("bft-sim: {err}");
            std::process::exit(1);
        }
    }
}
