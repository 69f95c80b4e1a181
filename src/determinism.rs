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

//! Runs the simulator twice with identical inputs and checks that the
//! event log it produces is byte-identical both times.
//!
//! This is an in-process equivalent of re-invoking the same binary twice
//! and diffing its output files: there is no subprocess here, just two
//! fresh [`Simulator`] instances built from the same seed and config.

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use ring::digest;

use crate::config::SimConfig;
use crate::network::JsonLinesLogger;
use crate::simulator::Simulator;

/// The outcome of a two-run determinism check.
#[derive(Debug)]
pub struct DeterminismReport {
    /// Path to the first run's event log.
    pub run_1_path: PathBuf,
    /// Path to the second run's event log.
    pub run_2_path: PathBuf,
    /// Lowercase hex SHA-256 of the first run's log bytes.
    pub sha256_1: String,
    /// Lowercase hex SHA-256 of the second run's log bytes.
    pub sha256_2: String,
    /// Whether the two logs are byte-identical.
    pub identical: bool,
    /// 1-indexed line number of the first divergence, if any.
    pub first_mismatch_line: Option<usize>,
}

impl DeterminismReport {
    /// A short human-readable summary, suitable for stdout.
    pub fn summary(&self) -> String {
        if self.identical {
            format!(
                "determinism OK: {} == {} (sha256 {})",
                self.run_1_path.display(),
                self.run_2_path.display(),
                self.sha256_1
            )
        } else {
            format!(
                "determinism FAILED: {} (sha256 {}) != {} (sha256 {}), first mismatch at line {}",
                self.run_1_path.display(),
                self.sha256_1,
                self.run_2_path.display(),
                self.sha256_2,
                self.first_mismatch_line.unwrap_or(0)
            )
        }
    }
}

fn sha256_hex(bytes: &[u8]) -> String {
    hex::encode(digest::digest(&digest::SHA256, bytes).as_ref())
}

fn first_mismatching_line(a: &[u8], b: &[u8]) -> Option<usize> {
    let mut lines_a = a.split(|&byte| byte == b'\n');
    let mut lines_b = b.split(|&byte| byte == b'\n');
    let mut line_no = 0;
    loop {
        line_no += 1;
        match (lines_a.next(), lines_b.next()) {
            (None, None) => return None,
            (Some(la), Some(lb)) if la == lb => continue,
            _ => return Some(line_no),
        }
    }
}

/// Run the simulator once, writing its event log to `path`.
pub fn run_to_log(config: &SimConfig, seed: u64, steps: u64, path: &Path) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let logger = JsonLinesLogger::new(BufWriter::new(file));
    let mut sim = Simulator::new(config, seed, logger);
    sim.run(steps)?;
    Ok(())
}

/// Run the simulator twice with identical `config`/`seed`/`steps` into
/// `run_1.log`/`run_2.log` under `output_dir`, then compare them
/// byte-for-byte and by SHA-256.
pub fn check_determinism(
    config: &SimConfig,
    seed: u64,
    steps: u64,
    output_dir: &Path,
) -> anyhow::Result<DeterminismReport> {
    fs::create_dir_all(output_dir)?;
    let run_1_path = output_dir.join("run_1.log");
    let run_2_path = output_dir.join("run_2.log");

    run_to_log(config, seed, steps, &run_1_path)?;
    run_to_log(config, seed, steps, &run_2_path)?;

    let bytes_1 = fs::read(&run_1_path)?;
    let bytes_2 = fs::read(&run_2_path)?;

    let sha256_1 = sha256_hex(&bytes_1);
    let sha256_2 = sha256_hex(&bytes_2);
    let identical = bytes_1 == bytes_2;
    let first_mismatch_line = if identical {
        None
    } else {
        first_mismatching_line(&bytes_1, &bytes_2)
    };

    Ok(DeterminismReport {
        run_1_path,
        run_2_path,
        sha256_1,
        sha256_2,
        identical,
        first_mismatch_line,
    })
}
