use std::path::Path;
use std::process;

use slotguard_core::calculate_slots;
use slotguard_upgrade::compare;

use super::load_contract;
use crate::{print_json, OutputFormat};

/// Compare two versions; exits 1 when the layouts are not compatible.
pub(crate) fn cmd_diff(
    v1_path: &Path,
    v2_path: &Path,
    contract: Option<&str>,
    output: OutputFormat,
    quiet: bool,
) {
    let v1 = calculate_slots(&load_contract(v1_path, contract, output, quiet));
    let v2 = calculate_slots(&load_contract(v2_path, contract, output, quiet));

    let report = compare(&v1, &v2);

    if !quiet {
        match output {
            OutputFormat::Json => print_json(&report),
            OutputFormat::Text => {
                if report.is_empty() {
                    println!("no differences");
                } else {
                    println!("{}", report.to_text());
                }
            }
        }
    }

    if !report.safe {
        process::exit(1);
    }
}
