//! Glint command-line driver.
//!
//! Reads a file, treats every word as a labelable token, and runs one
//! reconcile pass per `--cursor` through the same coalesced controller an
//! editor integration would use.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use glint_primitives::Offset;
use glint_space::{GlintConfig, LabelController, TokenSpace, ViewCoalescer, ViewId, Viewport};
use tracing::info;

mod screen;
mod words;

use screen::Screen;
use words::WordSource;

/// Glint command line arguments.
#[derive(Parser, Debug)]
#[command(name = "glint")]
#[command(about = "Assign color/shape labels to the words of a file")]
struct Args {
	/// File to label
	file: PathBuf,

	/// Cursor offset in chars; repeat to simulate cursor movement
	#[arg(short, long = "cursor", value_name = "OFFSET")]
	cursors: Vec<Offset>,

	/// Configuration file (TOML)
	#[arg(long, value_name = "PATH")]
	config: Option<PathBuf>,

	/// Seed for the identity shuffle, overriding the configuration
	#[arg(long)]
	seed: Option<u64>,

	/// First visible char offset
	#[arg(long, default_value_t = 0)]
	start: Offset,

	/// End of the visible range; defaults to the end of the file
	#[arg(long)]
	end: Option<Offset>,

	/// Verbose logging
	#[arg(short, long)]
	verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
	let args = Args::parse();

	setup_tracing(args.verbose);

	let mut config = match &args.config {
		Some(path) => GlintConfig::load(path).with_context(|| format!("loading {}", path.display()))?,
		None => GlintConfig::default(),
	};
	if let Some(seed) = args.seed {
		config.space.seed = Some(seed);
	}

	let text = std::fs::read_to_string(&args.file).with_context(|| format!("reading {}", args.file.display()))?;
	let source = WordSource::new(&text);
	let viewport = Viewport::new(args.start, args.end.unwrap_or_else(|| text.chars().count()));
	info!(file = %args.file.display(), words = source.len(), ?viewport, "glint.start");

	let coalescer = Arc::new(ViewCoalescer::new(config.scheduler.coalescer()));
	let controller = LabelController::new(
		ViewId(0),
		TokenSpace::new(&config.space),
		source,
		Screen::default(),
		Arc::clone(&coalescer),
	);

	let cursors = if args.cursors.is_empty() { vec![viewport.start] } else { args.cursors.clone() };
	for cursor in cursors {
		controller.request_apply(cursor, viewport)?;
		controller.flush().await;
		if let Some(report) = controller.last_report() {
			println!("cursor {cursor}: {report}");
		}
	}
	coalescer.shutdown().await;

	controller.with_renderer(|screen| {
		for (offset, identity, text) in screen.labels() {
			println!("{offset:>8}  {:<18} {text}", identity.to_string());
		}
	});

	Ok(())
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("glint=debug,glint_space=debug,glint_worker=debug,info")
		} else {
			EnvFilter::new("info")
		}
	});

	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();
}
