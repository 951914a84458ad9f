//! `lrk` - automated literature review from the command line

use colored::*;

#[tokio::main]
async fn main() {
    if let Err(err) = lrk::cli::run_cli().await {
        // Pipeline failures were already reported in detail.
        if !matches!(err, lrk::cli::CliError::PipelineError(_)) {
            lrk::cli::display_error_with_suggestions(&err, "lrk failed", Some("lrk"));
        } else {
            eprintln!("{}", err.to_string().red());
        }
        std::process::exit(1);
    }
}
