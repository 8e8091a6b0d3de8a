//! mailpost - send an email with an optional attachment from the terminal.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;
mod report;

use std::io::Write;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use mailpost_core::{SendError, SmtpTransport, compose, send_email, validate_request};
use tracing::{debug, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Commands, SendArgs};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    match cli.command {
        Commands::Send(args) => run_send(args).await,
    }
}

fn init_logging(verbose: u8) {
    let default = match verbose {
        0 => "mailpost=info,mailpost_core=info",
        1 => "mailpost=debug,mailpost_core=debug,mailpost_smtp=debug",
        _ => "mailpost=trace,mailpost_core=trace,mailpost_smtp=trace",
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run_send(args: SendArgs) -> anyhow::Result<ExitCode> {
    let body = match (&args.body, &args.body_file) {
        (Some(body), _) => body.clone(),
        (None, Some(path)) => match std::fs::read_to_string(path) {
            Ok(body) => body,
            Err(e) => {
                eprintln!("Could not read {}: {e}", path.display());
                return Ok(ExitCode::from(2));
            }
        },
        (None, None) => String::new(),
    };

    let request = args.request(body);
    if let Err(errors) = validate_request(&request) {
        eprint!("{}", report::render_validation(&errors));
        return Ok(ExitCode::from(2));
    }

    if args.dry_run {
        let message = match compose(
            &request.sender,
            &request.recipient,
            &request.subject,
            &request.body,
            request.attachment.as_deref(),
        ) {
            Ok(message) => message,
            Err(e) => {
                eprintln!("{}", SendError::from(e).guidance());
                return Ok(ExitCode::FAILURE);
            }
        };
        let bytes = message.to_bytes().context("failed to serialize message")?;
        debug!(size = bytes.len(), "Composed message");

        let mut stdout = std::io::stdout().lock();
        stdout.write_all(&bytes)?;
        stdout.flush()?;
        return Ok(ExitCode::SUCCESS);
    }

    info!(
        server = %request.server.host,
        port = request.server.port,
        "Sending email"
    );
    let outcome = send_email(&request, &SmtpTransport::new()).await;

    if args.json {
        println!("{}", outcome.to_json()?);
    } else if outcome.ok {
        print!("{}", report::render_outcome(&outcome));
    } else {
        eprint!("{}", report::render_outcome(&outcome));
    }

    Ok(if outcome.ok {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}
