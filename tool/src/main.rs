use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "recheck",
    version,
    about = "Regenerates FileCheck assertions in llc-based codegen regression tests"
)]
struct Cli {
    /// Test files to update in place
    #[arg(required = true)]
    tests: Vec<PathBuf>,

    /// The llc binary used to generate the test case output
    #[arg(long, default_value = "llc")]
    llc_binary: String,

    /// Restrict updates to a single function in each test file
    #[arg(long)]
    function: Option<String>,

    /// Show verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let opts = recheck::update::UpdateOptions {
        llc_binary: cli.llc_binary,
        function: cli.function,
        verbose: cli.verbose,
    };

    let mut updated = 0usize;
    let mut failed = 0usize;
    for test in &cli.tests {
        match recheck::update::update_file(test, &opts) {
            Ok(()) => {
                updated += 1;
                if cli.verbose {
                    eprintln!("recheck: updated {}", test.display());
                }
            }
            Err(e) => {
                failed += 1;
                eprintln!("recheck: error: {}: {}", test.display(), e);
            }
        }
    }

    eprintln!("recheck: {} updated, {} failed", updated, failed);

    // Non-zero only when nothing could be written at all.
    if updated == 0 && failed > 0 {
        std::process::exit(1);
    }
}
