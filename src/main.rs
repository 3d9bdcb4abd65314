//! Entry point for the `degree-roi` command-line tool.

use degree_roi::{cli, logging};

fn main() {
    if let Err(err) = logging::init() {
        eprintln!("Logging disabled: {err}");
    }

    let mut stdout = std::io::stdout().lock();
    if let Err(err) = cli::run(std::env::args().skip(1).collect(), &mut stdout) {
        tracing::debug!("Command failed: {err:?}");
        eprintln!("{err}");
        std::process::exit(err.exit_code());
    }
}
