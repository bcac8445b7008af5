use std::{process, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use env_logger::Env;
use log::LevelFilter;
use transmission_settings::{
    cli,
    config::{build_config, Cli},
    rpc::TransmissionClient,
};

fn main() {
    if let Err(err) = try_main() {
        eprintln!("error: {err:#}");
        process::exit(1);
    }
}

fn try_main() -> Result<()> {
    let args = Cli::parse();
    let config = build_config(&args)?;
    init_logging(config.log_level);
    // the blocking client must be built and dropped outside the runtime
    let client = Arc::new(
        TransmissionClient::new(config.rpc.clone())
            .context("failed to construct Transmission RPC client")?,
    );
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let result = runtime.block_on(cli::run(args.command, &config, client.clone()));
    drop(runtime);
    result
}

fn init_logging(level: LevelFilter) {
    let env = Env::default().default_filter_or(level.to_string());
    let _ = env_logger::Builder::from_env(env)
        .format_timestamp(None)
        .format_target(false)
        .try_init();
}
