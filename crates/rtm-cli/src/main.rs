use std::io;

use tracing_subscriber::EnvFilter;

fn init_tracing() {
    let filter = EnvFilter::try_from_env("RTM_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .init();
}

fn main() {
    init_tracing();
    let matches = rtm_cli::command().get_matches();

    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Err(err) = rtm_cli::run(&matches, &mut out) {
        eprintln!("ERROR: {err:#}");
        std::process::exit(1);
    }
}
