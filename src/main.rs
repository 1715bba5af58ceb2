use std::io;

use clap::Parser;
use tokio::signal::unix::{Signal, SignalKind, signal};
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use ts_cli::annotate::Annotator;
use ts_cli::config::{Cli, Config};
use ts_cli::input::LineReader;
use ts_cli::output::LineWriter;
use ts_cli::templates::TemplateSet;

#[cfg(not(unix))]
compile_error!("ts currently supports unix platforms only.");

#[tokio::main(flavor = "current_thread")]
async fn main() {
    if let Err(error) = run().await {
        eprintln!("{error}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = Config::load(&cli)?;
    init_logging(&config.log_filter);

    let templates = TemplateSet::builtin()?;
    let clock = config.clock.source();
    let mut annotator = Annotator::from_config(&config, templates, clock.now());
    let mut shutdown = Shutdown::new()?;

    let mut input = LineReader::spawn(io::BufReader::new(io::stdin()))?;
    let mut output = LineWriter::new(tokio::io::stdout());

    loop {
        let line = tokio::select! {
            line = input.next_line() => match line {
                Some(line) => line?,
                None => break,
            },
            name = shutdown.recv() => {
                debug!(signal = name, "stopping");
                break;
            }
        };

        let annotated = annotator.annotate(clock.now(), &line);
        output.write_line(&annotated).await?;
    }

    output.finish().await?;
    Ok(())
}

fn init_logging(filter: &str) {
    let filter = EnvFilter::try_new(filter).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr).with_target(false))
        .init();
}

/// SIGINT and SIGTERM end the read loop between lines.
struct Shutdown {
    interrupt: Signal,
    terminate: Signal,
}

impl Shutdown {
    fn new() -> std::io::Result<Self> {
        Ok(Self {
            interrupt: signal(SignalKind::interrupt())?,
            terminate: signal(SignalKind::terminate())?,
        })
    }

    async fn recv(&mut self) -> &'static str {
        tokio::select! {
            _ = self.interrupt.recv() => "SIGINT",
            _ = self.terminate.recv() => "SIGTERM",
        }
    }
}
