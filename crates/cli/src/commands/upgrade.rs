use std::path::Path;
use std::process;

use slotguard_core::calculate_slots;
use slotguard_upgrade::{analyze_with_config, AnalyzerConfig};

use super::load_contract;
use crate::{print_json, report_error, OutputFormat};

/// Run the full upgrade analysis; exits 1 on a critical compatibility level.
pub(crate) fn cmd_upgrade(
    v1_path: &Path,
    v2_path: &Path,
    contract: Option<&str>,
    config_path: Option<&Path>,
    output: OutputFormat,
    quiet: bool,
) {
    let config = match config_path {
        Some(path) => match AnalyzerConfig::load(path) {
            Ok(c) => c,
            Err(e) => {
                report_error(&e.to_string(), output, quiet);
                process::exit(1);
            }
        },
        None => AnalyzerConfig::default(),
    };

    let v1 = calculate_slots(&load_contract(v1_path, contract, output, quiet));
    let v2 = calculate_slots(&load_contract(v2_path, contract, output, quiet));

    let analysis = analyze_with_config(&v1, &v2, &config);

    if !quiet {
        match output {
            OutputFormat::Json => print_json(&analysis),
            OutputFormat::Text => println!("{}", analysis.to_text()),
        }
    }

    if !analysis.is_deployable() {
        process::exit(1);
    }
}
