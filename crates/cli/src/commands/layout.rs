use std::path::Path;

use slotguard_core::calculate_slots;

use super::load_contract;
use crate::{print_json, OutputFormat};

pub(crate) fn cmd_layout(file: &Path, contract: Option<&str>, output: OutputFormat, quiet: bool) {
    let model = load_contract(file, contract, output, quiet);
    let mapping = calculate_slots(&model);

    if quiet {
        return;
    }
    match output {
        OutputFormat::Json => print_json(&mapping),
        OutputFormat::Text => {
            println!(
                "{}: {} slot(s), {} variable(s), packed slots {:?}",
                mapping.contract_name,
                mapping.total_slots,
                mapping.variables.len(),
                mapping.packed_slots
            );
            for v in &mapping.variables {
                println!(
                    "  slot {:>3}  offset {:>2}  size {:>2}  {} {}",
                    v.slot, v.offset, v.size, v.type_name, v.name
                );
            }
        }
    }
}
