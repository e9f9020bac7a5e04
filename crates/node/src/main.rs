use anyhow::Context;
use clap::Parser;
use iptag_node::cli::CLI;
use iptag_node::config::Config;
use iptag_node::{exit_code, Service};
use std::process::ExitCode;
use tracing::error;


#[global_allocator]
static GLOBAL: tikv_jemallocator::Jemalloc = tikv_jemallocator::Jemalloc;


fn main() -> ExitCode {
    let args = CLI::parse();

    init_tracing();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = ?err, "command failed");
            eprintln!("error: {:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}


fn run(args: CLI) -> anyhow::Result<()> {
    let config = match args.config.as_ref() {
        Some(file) => Config::read(file).with_context(|| {
            format!("failed to read config from '{}'", file.display())
        })?,
        None => Config::default()
    };

    let database_dir = config.database_dir(args.database_dir.as_deref());

    let db = config.database_settings()
        .with_rocksdb_stats(args.rocksdb_stats)
        .open(&database_dir)
        .context("failed to open database")?;

    let service = Service::new(db, config)?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    service.execute(&args.command, &mut out)?;

    if args.rocksdb_stats {
        if let Some(stats) = service.index().store().get_statistics() {
            eprintln!("{}", stats);
        }
    }

    Ok(())
}


fn init_tracing() {
    use std::io::IsTerminal;

    let env_filter = tracing_subscriber::EnvFilter::builder().parse_lossy(
        std::env::var(tracing_subscriber::EnvFilter::DEFAULT_ENV)
            .unwrap_or("info".to_string()),
    );

    if std::io::stderr().is_terminal() {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .compact()
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(env_filter)
            .with_writer(std::io::stderr)
            .json()
            .with_current_span(false)
            .init();
    }
}
