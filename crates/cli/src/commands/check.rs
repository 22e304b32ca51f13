use std::path::Path;
use std::process;

use slotguard_core::find_overfilled_slots;
use slotguard_interchange::load_slot_mapping_file;

use crate::{print_json, report_error, OutputFormat};

/// Sanity-check a serialized mapping; exits 1 if any slot is overfilled.
pub(crate) fn cmd_check(mapping_path: &Path, output: OutputFormat, quiet: bool) {
    let mapping = match load_slot_mapping_file(mapping_path) {
        Ok(m) => m,
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    };

    let findings = find_overfilled_slots(&mapping);

    if !quiet {
        match output {
            OutputFormat::Json => print_json(&serde_json::json!({
                "contract": mapping.contract_name,
                "overfilledSlots": findings,
            })),
            OutputFormat::Text => {
                if findings.is_empty() {
                    println!("{}: no overfilled slots", mapping.contract_name);
                } else {
                    println!(
                        "{}: {} overfilled slot(s)",
                        mapping.contract_name,
                        findings.len()
                    );
                    for f in &findings {
                        let names: Vec<&str> =
                            f.occupants.iter().map(|v| v.name.as_str()).collect();
                        println!(
                            "  slot {}: {} bytes in {}",
                            f.slot,
                            f.total_bytes,
                            names.join(", ")
                        );
                        for overrun in &f.overruns {
                            println!("    {} runs past the end of the slot", overrun);
                        }
                    }
                }
            }
        }
    }

    if !findings.is_empty() {
        process::exit(1);
    }
}
