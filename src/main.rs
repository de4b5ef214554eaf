// SPDX-License-Identifier: MPL-2.0

use anyhow::Error;
use clap::Parser;
use std::process::ExitCode;
use tracing::error;
use tracing_subscriber::prelude::*;

use gstsrtrtprecv::{App, Args};

/// -1, as reported to the shell.
const EXIT_FAILURE: u8 = 255;

fn initialize_logging(envvar_name: &str) -> Result<(), Error> {
    tracing_log::LogTracer::init()?;
    let env_filter = tracing_subscriber::EnvFilter::try_from_env(envvar_name)
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_thread_ids(true)
        .with_target(true)
        .with_writer(std::io::stderr);
    let subscriber = tracing_subscriber::Registry::default()
        .with(env_filter)
        .with(fmt_layer);
    tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(err) => {
            // Usage and help both go to stderr and fail
            eprintln!("{err}");
            return ExitCode::from(EXIT_FAILURE);
        }
    };

    if let Err(err) = initialize_logging("GST_SRT_RTP_RECV_LOG") {
        eprintln!("Failed to initialize logging: {err:#}");
        return ExitCode::from(EXIT_FAILURE);
    }

    if let Err(err) = gst::init() {
        error!(%err, "Failed to initialize GStreamer");
        return ExitCode::from(EXIT_FAILURE);
    }

    let mut app = App::new(args.settings());

    if let Err(err) = app.prepare() {
        eprintln!("{err:#}");
        app.teardown();
        return ExitCode::from(EXIT_FAILURE);
    }

    let res = app.run().await;
    app.teardown();

    match res {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("{err:#}");
            ExitCode::from(EXIT_FAILURE)
        }
    }
}
