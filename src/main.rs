use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use snowgraph::cli;

fn main() -> Result<()> {
    // JSON goes to stdout, so logs go to stderr
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive("snowgraph=info".parse()?))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args: Vec<String> = std::env::args().skip(1).collect();
    if args.is_empty() || args.iter().any(|a| a == "-h" || a == "--help") {
        cli::print_help();
        return Ok(());
    }

    let parsed = cli::parse_args(&args)?;
    cli::run(parsed)
}
