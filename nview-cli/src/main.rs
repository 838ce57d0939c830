//! Nview - nmap result viewer CLI
//!
//! Flattens one or more nmap XML files into a delimited table on standard
//! output. Diagnostics go to standard error.

mod logging;

use anyhow::Context;
use nview_core::{
    args::{help_text, NviewArgs, USAGE},
    pipeline, Error,
};
use std::env;
use std::io::{self, Write};
use std::process;
use tracing::debug;

fn main() {
    let args = match NviewArgs::from_iter_safe(env::args()) {
        Ok(args) => args,
        Err(e) => {
            report(&e.into(), false);
            process::exit(1);
        }
    };

    if args.help {
        print!("{}", help_text());
        return;
    }

    if args.version {
        println!("nview {}", env!("CARGO_PKG_VERSION"));
        return;
    }

    logging::init(args.debug);

    let debug = args.debug;
    if let Err(e) = run(args) {
        report(&e, debug);
        process::exit(1);
    }
}

/// Main application logic
fn run(args: NviewArgs) -> anyhow::Result<()> {
    let config = args.into_config()?;
    debug!("configuration: {:?}", config);

    let output = pipeline::run(&config)?;

    let mut stdout = io::stdout().lock();
    stdout
        .write_all(output.as_bytes())
        .and_then(|_| stdout.flush())
        .context("Failed to write output")?;

    Ok(())
}

/// Print an error to standard error
fn report(err: &anyhow::Error, debug: bool) {
    eprint!("{}", render(err, debug));
}

/// Format an error the way its kind asks for
///
/// Usage errors get the usage line; everything else is a single `ERROR:`
/// line, followed by the cause chain in debug mode.
fn render(err: &anyhow::Error, debug: bool) -> String {
    if let Some(Error::Usage(message)) = err.downcast_ref::<Error>() {
        return format!("{}\nnview: error: {}\n", USAGE, message);
    }

    let mut text = format!("ERROR: {}\n", err);
    if debug {
        text.push_str(&format!("{:?}\n", err));
    }
    text
}
