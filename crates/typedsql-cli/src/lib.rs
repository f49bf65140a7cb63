mod cli;
mod config;
mod fmt;
mod input;
mod tokenize;

/// Environment variable holding a `tracing` filter, e.g. `typedsql=trace`.
const LOG_ENV: &str = "TYPEDSQL_LOG";

pub fn run(args: Vec<String>) -> anyhow::Result<()> {
    init_logging();

    let cmd = cli::parse_args(&args)?;
    match cmd {
        cli::Command::Help(topic) => {
            cli::print_help(topic);
            Ok(())
        }
        cli::Command::Tokenize(args) => tokenize::run(args),
        cli::Command::Fmt(args) => fmt::run(args),
    }
}

fn init_logging() {
    if std::env::var_os(LOG_ENV).is_none() {
        return;
    }
    let filter = tracing_subscriber::EnvFilter::from_env(LOG_ENV);
    // A second call (tests, embedding) keeps the first subscriber.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
