use serde::Deserialize;

mod json;

pub use json::JsonCatalog;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error(transparent)]
	Io(#[from] crate::error::Io),
	#[error("malformed catalog: {0}")]
	Parse(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
pub struct FolderConfiguration {
	pub keep_aspect_ratio: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaFolder {
	pub configuration: Option<FolderConfiguration>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Media {
	pub id: String,
	/// Location of the original, relative to its namespace root.
	pub path: String,
	pub file_name: String,
	pub private: bool,
	pub folder: Option<MediaFolder>,
}

/// A thumbnail size declared for one media entry, with its associations resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThumbnailRecord {
	pub id: String,
	pub width: u32,
	pub height: u32,
	pub media: Option<Media>,
}

/// Selection and page size for an enumeration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Criteria {
	/// Restricts the enumeration to thumbnails of these media entries.
	pub media_ids: Option<Vec<String>>,
	pub limit: usize,
}

impl Criteria {
	pub fn all(limit: usize) -> Self {
		Self {
			media_ids: None,
			limit: limit.max(1),
		}
	}

	pub fn for_media(media_ids: Vec<String>, limit: usize) -> Self {
		Self {
			media_ids: Some(media_ids),
			limit: limit.max(1),
		}
	}

	pub fn matches(&self, media_id: &str) -> bool {
		self
			.media_ids
			.as_ref()
			.map_or(true, |ids| ids.iter().any(|id| id == media_id))
	}
}

pub trait CatalogQuery: Send + Sync {
	/// Number of records `criteria` selects.
	fn total(&self, criteria: &Criteria) -> Result<u64, Error>;

	/// At most `criteria.limit` records starting at `offset`, in a stable order.
	fn search(&self, criteria: &Criteria, offset: usize) -> Result<Vec<ThumbnailRecord>, Error>;
}

/// Walks a catalog one page at a time.
pub struct CatalogIterator<'a> {
	catalog: &'a dyn CatalogQuery,
	criteria: Criteria,
	offset: usize,
}

impl<'a> CatalogIterator<'a> {
	pub fn new(catalog: &'a dyn CatalogQuery, criteria: Criteria) -> Self {
		Self {
			catalog,
			criteria,
			offset: 0,
		}
	}

	pub fn total(&self) -> Result<u64, Error> {
		self.catalog.total(&self.criteria)
	}

	/// The next page, or `None` once the catalog is exhausted.
	pub fn fetch(&mut self) -> Result<Option<Vec<ThumbnailRecord>>, Error> {
		let page = self.catalog.search(&self.criteria, self.offset)?;
		if page.is_empty() {
			return Ok(None);
		}
		self.offset += page.len();
		Ok(Some(page))
	}
}
