//! Subcommand implementations.
//!
//! Each command loads its inputs, runs the library pipeline, prints the
//! result in the requested format and exits non-zero when the result
//! should fail a CI gate.

mod check;
mod diff;
mod layout;
mod upgrade;

use std::path::Path;
use std::process;

use slotguard_core::ContractModel;

use crate::{report_error, OutputFormat};

pub(crate) use check::cmd_check;
pub(crate) use diff::cmd_diff;
pub(crate) use layout::cmd_layout;
pub(crate) use upgrade::cmd_upgrade;

/// Load and select one contract from an interchange file, exiting on error.
pub(crate) fn load_contract(
    path: &Path,
    contract: Option<&str>,
    output: OutputFormat,
    quiet: bool,
) -> ContractModel {
    let doc = match slotguard_interchange::load_document(path) {
        Ok(doc) => doc,
        Err(e) => {
            report_error(&e.to_string(), output, quiet);
            process::exit(1);
        }
    };
    match doc.select(contract) {
        Ok(model) => {
            tracing::debug!(
                path = %path.display(),
                contract = %model.name,
                variables = model.variables.len(),
                "loaded contract"
            );
            model.clone()
        }
        Err(e) => {
            report_error(&format!("{}: {}", path.display(), e), output, quiet);
            process::exit(1);
        }
    }
}
