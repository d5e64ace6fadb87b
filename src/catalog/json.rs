use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::{CatalogQuery, Criteria, Error, FolderConfiguration, Media, MediaFolder, ThumbnailRecord};
use crate::error::io_ctx;

#[derive(Deserialize)]
struct CatalogFile {
	#[serde(default)]
	folders: Vec<FolderRow>,
	#[serde(default)]
	media: Vec<MediaRow>,
	#[serde(default)]
	thumbnails: Vec<ThumbnailRow>,
}

#[derive(Deserialize)]
struct FolderRow {
	id: String,
	#[serde(default)]
	configuration: Option<FolderConfiguration>,
}

#[derive(Deserialize)]
struct MediaRow {
	id: String,
	path: String,
	#[serde(default)]
	file_name: Option<String>,
	#[serde(default)]
	private: bool,
	#[serde(default)]
	folder_id: Option<String>,
}

#[derive(Deserialize)]
struct ThumbnailRow {
	id: String,
	media_id: String,
	width: u32,
	height: u32,
}

/// Catalog snapshot read from a JSON document of `folders`, `media` and `thumbnails` tables.
///
/// Dangling references resolve to missing associations rather than load errors.
#[derive(Debug, Default)]
pub struct JsonCatalog {
	records: Vec<ThumbnailRecord>,
}

impl JsonCatalog {
	pub fn load(path: &Path) -> Result<Self, Error> {
		let contents = fs::read_to_string(path).map_err(io_ctx("reading catalog"))?;
		Self::parse(&contents)
	}

	pub fn parse(json: &str) -> Result<Self, Error> {
		let file: CatalogFile = serde_json::from_str(json)?;
		Ok(Self::join(file))
	}

	fn join(file: CatalogFile) -> Self {
		let folders: HashMap<_, _> = file
			.folders
			.into_iter()
			.map(|row| {
				let folder = MediaFolder {
					configuration: row.configuration,
				};
				(row.id, folder)
			})
			.collect();

		let media: HashMap<_, _> = file
			.media
			.into_iter()
			.map(|row| {
				let file_name = row.file_name.unwrap_or_else(|| {
					Path::new(&row.path)
						.file_name()
						.map_or_else(|| row.path.clone(), |name| name.to_string_lossy().into_owned())
				});
				let media = Media {
					id: row.id.clone(),
					folder: row.folder_id.and_then(|id| folders.get(&id).cloned()),
					path: row.path,
					file_name,
					private: row.private,
				};
				(row.id, media)
			})
			.collect();

		let records = file
			.thumbnails
			.into_iter()
			.map(|row| ThumbnailRecord {
				media: media.get(&row.media_id).cloned(),
				id: row.id,
				width: row.width,
				height: row.height,
			})
			.collect();

		Self { records }
	}

	fn selected<'a>(&'a self, criteria: &'a Criteria) -> impl Iterator<Item = &'a ThumbnailRecord> + 'a {
		self.records.iter().filter(move |record| {
			record
				.media
				.as_ref()
				.map_or(false, |media| criteria.matches(&media.id))
		})
	}
}

impl CatalogQuery for JsonCatalog {
	fn total(&self, criteria: &Criteria) -> Result<u64, Error> {
		let total = match criteria.media_ids {
			None => self.records.len(),
			Some(..) => self.selected(criteria).count(),
		};
		Ok(total as u64)
	}

	fn search(&self, criteria: &Criteria, offset: usize) -> Result<Vec<ThumbnailRecord>, Error> {
		if criteria.media_ids.is_none() {
			let rest = self.records.get(offset..).unwrap_or_default();
			return Ok(rest.iter().take(criteria.limit).cloned().collect());
		}
		Ok(self
			.selected(criteria)
			.skip(offset)
			.take(criteria.limit)
			.cloned()
			.collect())
	}
}
