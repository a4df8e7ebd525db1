//! prefs - inspect and edit typed preference stores

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(e) = typed_prefs::cli::run() {
        eprintln!("Error: {:#}", e);
        ExitCode::FAILURE
    } else {
        ExitCode::SUCCESS
    }
}
