mod cluster;
mod command;
mod config;
mod context;
mod errors;
mod logging;
mod state;
mod utils;
mod volumes;

use std::env;
use std::process::exit;

use tracing::{error, info};

use crate::command::SystemRunner;
use crate::config::Config;
use crate::context::Context;
use crate::errors::Error;
use crate::utils::get_version_string;

async fn provision(args: &[String]) -> Result<(), Error> {
    let config = Config::from_env()?;
    let runner = SystemRunner;
    let ctx = Context::new(&config, &runner);

    if args.contains(&String::from("--volumes")) {
        info!("Starting persistent volume provisioning");
        volumes::run(&ctx).await
    } else {
        info!("Starting cluster bootstrap");
        cluster::run(&ctx).await
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args: Vec<String> = env::args().collect();

    if args.contains(&String::from("--version")) {
        println!("{}", get_version_string());
        return;
    }

    if let Err(e) = logging::setup_tracing() {
        eprintln!("{e}");
        exit(1);
    }

    if let Err(e) = provision(&args).await {
        error!("{e}");
        exit(1);
    }
}
