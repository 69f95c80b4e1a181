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

//! I-8: two runs of the simulator with identical seed and configuration
//! must produce byte-identical event logs, end to end through the CLI's
//! own `determinism` entry point rather than just the unit-level checks.

use bft_sim::config::{NetworkSection, SimConfig, SimulationSection};
use bft_sim::determinism::check_determinism;

#[test]
fn same_seed_and_config_yields_byte_identical_logs_across_two_runs() {
    let config = SimConfig {
        simulation: SimulationSection {
            num_nodes: 6,
            max_blocks: 3,
            drop_prob: 0.0,
            dup_prob: 0.0,
            ..Default::default()
        },
        network: NetworkSection {
            drop_prob: 0.15,
            dup_prob: 0.3,
            ..Default::default()
        },
    };

    let dir = tempfile::tempdir().unwrap();
    let report = check_determinism(&config, 2024, 20_000, dir.path()).unwrap();

    assert!(report.identical, "{}", report.summary());
    assert_eq!(report.sha256_1, report.sha256_2);
    assert!(report.first_mismatch_line.is_none());
    assert!(report.run_1_path.exists());
    assert!(report.run_2_path.exists());
}

#[test]
fn different_seeds_are_not_asserted_equal_but_both_runs_still_succeed() {
    let config = SimConfig::default();
    let dir_a = tempfile::tempdir().unwrap();
    let dir_b = tempfile::tempdir().unwrap();

    let report_a = check_determinism(&config, 1, 5_000, dir_a.path()).unwrap();
    let report_b = check_determinism(&config, 2, 5_000, dir_b.path()).unwrap();

    assert!(report_a.identical);
    assert!(report_b.identical);
}
