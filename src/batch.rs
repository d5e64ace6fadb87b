use std::sync::Arc;

use futures::future;
use tokio::sync::watch;

use crate::catalog::{self, CatalogIterator, ThumbnailRecord};
use crate::paths::{self, PathScheme};
use crate::progress::ProgressSink;
use crate::store::Visibility;
use crate::thumbnail::codec::{self, WEBP_EXTENSION};
use crate::thumbnail::geometry::{AspectPolicy, Dimensions};
use crate::thumbnail::{Generator, Status};

pub const DEFAULT_BATCH_SIZE: usize = 50;

/// One (original, requested size) pair to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WorkItem {
	pub thumbnail_id: String,
	pub file_name: String,
	pub visibility: Visibility,
	pub source_path: String,
	pub derived_path: String,
	pub requested: Dimensions,
	pub policy: AspectPolicy,
}

/// Why a record cannot become a work item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
	NoMedia,
	NoFolder,
	NoFolderConfiguration,
}

impl WorkItem {
	pub fn from_record(record: &ThumbnailRecord, scheme: &dyn PathScheme) -> Result<Self, SkipReason> {
		let media = record.media.as_ref().ok_or(SkipReason::NoMedia)?;
		let folder = media.folder.as_ref().ok_or(SkipReason::NoFolder)?;
		let configuration = folder
			.configuration
			.ok_or(SkipReason::NoFolderConfiguration)?;
		let requested = Dimensions::new(record.width, record.height);

		Ok(Self {
			thumbnail_id: record.id.clone(),
			file_name: media.file_name.clone(),
			visibility: Visibility::from_private(media.private),
			source_path: scheme.media_path(media),
			derived_path: paths::derived_path(scheme, media, requested, WEBP_EXTENSION),
			requested,
			policy: AspectPolicy {
				keep_aspect_ratio: configuration.keep_aspect_ratio,
			},
		})
	}
}

/// Report of one run. Lives only as long as the run that produced it.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProcessingOutcome {
	pub generated: u64,
	pub skipped: u64,
	pub errored: u64,
	pub errors: Vec<String>,
	/// The run stopped at a page boundary before the catalog was exhausted.
	pub cancelled: bool,
}

enum ItemOutcome {
	Generated,
	Skipped,
	Failed(String),
}

impl ProcessingOutcome {
	fn record(&mut self, item: ItemOutcome) {
		match item {
			ItemOutcome::Generated => self.generated += 1,
			ItemOutcome::Skipped => self.skipped += 1,
			ItemOutcome::Failed(message) => {
				self.errored += 1;
				self.errors.push(message);
			}
		}
	}
}

#[derive(Debug, thiserror::Error)]
pub enum RunError {
	#[error("could not enumerate thumbnails: {0}")]
	Catalog(#[from] catalog::Error),
	#[error("thumbnail encoder is unusable: {0}")]
	EncoderUnavailable(#[source] codec::Error),
}

/// Checks the encoder before any item is touched.
pub type EncoderProbe = fn(quality: u8) -> Result<(), codec::Error>;

pub struct BatchProcessor {
	generator: Arc<Generator>,
	scheme: Arc<dyn PathScheme>,
	cancel: Option<watch::Receiver<bool>>,
	probe: EncoderProbe,
}

impl BatchProcessor {
	pub fn new(generator: Generator, scheme: Arc<dyn PathScheme>) -> Self {
		Self {
			generator: Arc::new(generator),
			scheme,
			cancel: None,
			probe: codec::probe,
		}
	}

	/// Regenerate derived files even when they already exist.
	pub fn regenerating(mut self) -> Self {
		if !self.generator.force {
			let generator = Generator {
				force: true,
				..Generator::clone(&self.generator)
			};
			self.generator = Arc::new(generator);
		}
		self
	}

	#[cfg(test)]
	pub fn with_probe(mut self, probe: EncoderProbe) -> Self {
		self.probe = probe;
		self
	}

	/// Stop before the next page once `cancel` holds `true`.
	pub fn with_cancellation(mut self, cancel: watch::Receiver<bool>) -> Self {
		self.cancel = Some(cancel);
		self
	}

	fn is_cancelled(&self) -> bool {
		self.cancel.as_ref().map_or(false, |cancel| *cancel.borrow())
	}

	/// Generates thumbnails for every record `items` yields.
	///
	/// Item failures are collected in the outcome; only an unusable encoder or a catalog that
	/// cannot produce its next page fails the run.
	pub async fn run(
		&self,
		mut items: CatalogIterator<'_>,
		progress: &mut dyn ProgressSink,
	) -> Result<ProcessingOutcome, RunError> {
		(self.probe)(self.generator.quality).map_err(RunError::EncoderUnavailable)?;

		let total = items.total()?;
		tracing::debug!(total, "starting run");
		progress.on_start(total);

		let mut outcome = ProcessingOutcome::default();
		loop {
			if self.is_cancelled() {
				tracing::info!("run cancelled");
				outcome.cancelled = true;
				break;
			}
			let Some(page) = items.fetch()? else {
				break;
			};
			let count = page.len() as u64;
			let results = future::join_all(page.into_iter().map(|record| self.process(record))).await;
			for result in results {
				outcome.record(result);
			}
			progress.on_advance(count);
		}

		progress.on_finish();
		progress.on_summary(&outcome);
		Ok(outcome)
	}

	async fn process(&self, record: ThumbnailRecord) -> ItemOutcome {
		let item = match WorkItem::from_record(&record, &*self.scheme) {
			Ok(item) => item,
			Err(reason) => {
				tracing::debug!(thumbnail = %record.id, ?reason, "skipping thumbnail");
				return ItemOutcome::Skipped;
			}
		};

		let generator = Arc::clone(&self.generator);
		let (item, result) = tokio_rayon::spawn(move || {
			let result = generator.generate_isolated(&item);
			(item, result)
		})
		.await;

		match result {
			Ok(Status::Generated) => ItemOutcome::Generated,
			Ok(Status::Fresh) => ItemOutcome::Skipped,
			Err(error) => {
				tracing::debug!(
					thumbnail = %item.thumbnail_id,
					file = %item.file_name,
					%error,
					"thumbnail generation failed"
				);
				ItemOutcome::Failed(format!(
					"thumbnail {} ({}): {error}",
					item.thumbnail_id, item.file_name
				))
			}
		}
	}
}
