use serde::Deserialize;
use serde_json::{Map, Value};

use crate::batch::{BatchProcessor, ProcessingOutcome};
use crate::catalog::{CatalogIterator, CatalogQuery, Criteria};
use crate::progress::Silent;

const THUMBNAIL_ENTITY: &str = "media_thumbnail";
const MEDIA_ID_FIELD: &str = "media_id";

/// Notification that a set of entities of one kind has been persisted.
#[derive(Debug, Clone, Deserialize)]
pub struct EntityWrittenEvent {
	pub entity_name: String,
	#[serde(default)]
	pub write_results: Vec<WriteResult>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct WriteResult {
	#[serde(default)]
	pub payload: Map<String, Value>,
}

/// Everything one write transaction persisted, grouped by entity.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EntityWrittenContainerEvent {
	#[serde(default)]
	pub events: Vec<EntityWrittenEvent>,
}

impl EntityWrittenContainerEvent {
	pub fn event_by_entity_name(&self, entity_name: &str) -> Option<&EntityWrittenEvent> {
		self
			.events
			.iter()
			.find(|event| event.entity_name == entity_name)
	}
}

/// Media ids referenced by the written records, first occurrence order, without duplicates.
fn affected_media(event: &EntityWrittenEvent) -> Vec<String> {
	let mut ids: Vec<String> = Vec::new();
	for result in &event.write_results {
		let Some(id) = result.payload.get(MEDIA_ID_FIELD).and_then(Value::as_str) else {
			continue;
		};
		if !ids.iter().any(|seen| seen == id) {
			ids.push(id.to_owned());
		}
	}
	ids
}

/// Regenerates the thumbnails of media whose thumbnail records were just written.
///
/// Existing derived files are always replaced, since the write may carry a new original.
pub struct ChangeTrigger<'a> {
	catalog: &'a dyn CatalogQuery,
	processor: BatchProcessor,
	batch_size: usize,
}

impl<'a> ChangeTrigger<'a> {
	pub fn new(catalog: &'a dyn CatalogQuery, processor: BatchProcessor, batch_size: usize) -> Self {
		Self {
			catalog,
			processor: processor.regenerating(),
			batch_size,
		}
	}

	/// Best effort: failures are logged and never reach the writer.
	///
	/// Returns the outcome of the narrow run, if one happened.
	pub async fn on_written(&self, event: &EntityWrittenContainerEvent) -> Option<ProcessingOutcome> {
		let written = event.event_by_entity_name(THUMBNAIL_ENTITY)?;
		let media_ids = affected_media(written);
		if media_ids.is_empty() {
			tracing::trace!("no media referenced by written thumbnails");
			return None;
		}

		tracing::debug!(media = media_ids.len(), "converting thumbnails of written media");
		let items = CatalogIterator::new(self.catalog, Criteria::for_media(media_ids, self.batch_size));
		match self.processor.run(items, &mut Silent).await {
			Ok(outcome) => {
				for error in &outcome.errors {
					tracing::debug!(%error, "thumbnail conversion after write failed");
				}
				Some(outcome)
			}
			Err(error) => {
				tracing::warn!(%error, "thumbnail conversion after write failed");
				None
			}
		}
	}
}
