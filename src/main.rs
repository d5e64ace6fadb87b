#![deny(
	absolute_paths_not_starting_with_crate,
	future_incompatible,
	keyword_idents,
	macro_use_extern_crate,
	meta_variable_misuse,
	missing_abi,
	missing_copy_implementations,
	non_ascii_idents,
	nonstandard_style,
	noop_method_call,
	rust_2018_idioms,
	unused_qualifications
)]
#![warn(clippy::pedantic)]
#![allow(clippy::let_underscore_drop, clippy::module_name_repetitions)]

use std::fs;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use clap::Parser as _;
use tokio::sync::watch;
use tracing_subscriber::filter::FilterFn;
use tracing_subscriber::layer::SubscriberExt as _;
use tracing_subscriber::util::SubscriberInitExt as _;

use crate::batch::BatchProcessor;
use crate::catalog::{CatalogIterator, Criteria, JsonCatalog};
use crate::cli::{Args, Command};
use crate::paths::DefaultPathScheme;
use crate::progress::{LogProgress, ProgressSink as _};
use crate::store::{AssetStore, LocalFilesystem};
use crate::thumbnail::Generator;
use crate::trigger::{ChangeTrigger, EntityWrittenContainerEvent};

mod batch;
mod catalog;
mod cli;
mod config;
mod error;
mod paths;
mod progress;
mod store;
mod thumbnail;
mod trigger;

fn main() -> Result<()> {
	let args = Args::parse();
	let mut builder = tokio::runtime::Builder::new_multi_thread();
	builder.enable_all();
	#[cfg(debug_assertions)]
	builder.worker_threads(1);
	builder.build().context("building runtime")?.block_on(main_(args))
}

async fn main_(args: Args) -> Result<()> {
	let config = config::load(&args.config).context("loading config")?;
	init_logging(config.log_level.into());

	let catalog = JsonCatalog::load(&config.catalog).context("loading catalog")?;
	let store = AssetStore::new(
		Arc::new(LocalFilesystem::new(&config.public_root)),
		Arc::new(LocalFilesystem::new(&config.private_root)),
	);
	let generator = Generator {
		store,
		quality: config.quality.get(),
		force: args.force || config.force_recreate,
	};
	let processor = BatchProcessor::new(generator, Arc::new(DefaultPathScheme));

	match args.command {
		Command::Convert => {
			let (cancel, cancelled) = watch::channel(false);
			tokio::spawn(async move {
				if tokio::signal::ctrl_c().await.is_ok() {
					tracing::info!("interrupted, stopping after the current page");
					let _ = cancel.send(true);
				}
			});
			let mut progress = LogProgress::new(args.verbose);
			let items = CatalogIterator::new(&catalog, Criteria::all(config.batch_size));
			processor
				.with_cancellation(cancelled)
				.run(items, &mut progress)
				.await
				.context("converting thumbnails")?;
		}
		Command::OnWrite { event } => {
			let event = fs::read_to_string(&event)
				.with_context(|| format!("reading write notification {}", event.display()))?;
			let event: EntityWrittenContainerEvent =
				serde_json::from_str(&event).context("parsing write notification")?;
			let trigger = ChangeTrigger::new(&catalog, processor, config.batch_size);
			match trigger.on_written(&event).await {
				Some(outcome) => LogProgress::new(args.verbose).on_summary(&outcome),
				None => tracing::info!("no thumbnails converted"),
			}
		}
	}

	Ok(())
}

fn init_logging(level: tracing::level_filters::LevelFilter) {
	tracing_subscriber::fmt()
		.with_max_level(level)
		.finish()
		.with(FilterFn::new(|meta| {
			meta
				.module_path()
				.map_or(false, |path| path.starts_with(env!("CARGO_PKG_NAME")))
		}))
		.init();
}
