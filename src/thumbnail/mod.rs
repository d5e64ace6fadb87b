use std::panic::{self, AssertUnwindSafe};

use crate::batch::WorkItem;
use crate::error::ItemError;
use crate::store::{AssetStore, Filesystem};

pub mod codec;
pub mod geometry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
	Generated,
	/// An up to date thumbnail already exists.
	Fresh,
}

/// Turns work items into encoded thumbnails in the store.
#[derive(Debug, Clone)]
pub struct Generator {
	pub store: AssetStore,
	pub quality: u8,
	/// Regenerate even if the derived file already exists.
	pub force: bool,
}

impl Generator {
	#[tracing::instrument(
		level = "debug",
		skip_all,
		fields(thumbnail = %item.thumbnail_id, file = %item.file_name)
	)]
	pub fn generate(&self, item: &WorkItem) -> Result<Status, ItemError> {
		let fs = self.store.namespace(item.visibility);
		if !self.force && is_fresh(fs, item) {
			tracing::trace!("thumbnail is fresh, not regenerating");
			return Ok(Status::Fresh);
		}

		let bytes = fs.read(&item.source_path)?;
		let source = codec::decode(&item.file_name, &bytes)?;
		let target = geometry::thumbnail_size(source.dimensions(), item.requested, item.policy)?;
		tracing::trace!(format = ?source.format.format, original = %source.dimensions(), %target, "resizing");
		let canvas = codec::render(&source, target, source.format.transparent);
		let encoded = codec::encode(&canvas, self.quality)?;
		fs.write(&item.derived_path, &encoded)?;
		Ok(Status::Generated)
	}

	/// Like [`Self::generate`], but a panic anywhere in the pipeline becomes an error.
	pub fn generate_isolated(&self, item: &WorkItem) -> Result<Status, ItemError> {
		panic::catch_unwind(AssertUnwindSafe(|| self.generate(item))).unwrap_or_else(|payload| {
			let message = payload
				.downcast_ref::<&str>()
				.map(|message| (*message).to_owned())
				.or_else(|| payload.downcast_ref::<String>().cloned())
				.unwrap_or_else(|| "unknown panic".to_owned());
			Err(ItemError::Panicked(message))
		})
	}
}

fn is_fresh(fs: &dyn Filesystem, item: &WorkItem) -> bool {
	match fs.exists(&item.derived_path) {
		Ok(exists) => exists,
		Err(error) => {
			tracing::error!(%error, "failed to check if thumbnail exists, generating it anyway");
			false
		}
	}
}

#[cfg(test)]
mod tests {
	use std::sync::Arc;

	use image::Rgba;

	use super::geometry::{AspectPolicy, Dimensions};
	use super::*;
	use crate::store::memory::MemoryFilesystem;
	use crate::store::{self, Visibility};

	fn item(visibility: Visibility) -> WorkItem {
		WorkItem {
			thumbnail_id: "t1".to_owned(),
			file_name: "pic.jpg".to_owned(),
			visibility,
			source_path: "media/pic.jpg".to_owned(),
			derived_path: "thumbnail/pic_300x300.jpg.webp".to_owned(),
			requested: Dimensions::new(300, 300),
			policy: AspectPolicy {
				keep_aspect_ratio: true,
			},
		}
	}

	fn generator(public: &Arc<MemoryFilesystem>, private: &Arc<MemoryFilesystem>, force: bool) -> Generator {
		Generator {
			store: AssetStore::new(public.clone(), private.clone()),
			quality: 80,
			force,
		}
	}

	fn decoded_size(bytes: &[u8]) -> Dimensions {
		codec::decode("out.webp", bytes).unwrap().dimensions()
	}

	#[test]
	fn generates_into_the_source_namespace() {
		let public = Arc::new(MemoryFilesystem::default());
		let private = Arc::new(MemoryFilesystem::default());
		private.insert("media/pic.jpg", codec::tests::jpeg(1920, 1080));

		let status = generator(&public, &private, false)
			.generate(&item(Visibility::Private))
			.unwrap();
		assert_eq!(status, Status::Generated);

		let written = private.get("thumbnail/pic_300x300.jpg.webp").unwrap();
		assert_eq!(decoded_size(&written), Dimensions::new(300, 169));
		assert_eq!(public.paths(), Vec::<String>::new());
	}

	#[test]
	fn existing_thumbnail_is_left_alone_unless_forced() {
		let public = Arc::new(MemoryFilesystem::default());
		let private = Arc::new(MemoryFilesystem::default());
		public.insert("media/pic.jpg", codec::tests::png(100, 50, Rgba([1, 2, 3, 255])));
		public.insert("thumbnail/pic_300x300.jpg.webp", b"stale".to_vec());

		let status = generator(&public, &private, false)
			.generate(&item(Visibility::Public))
			.unwrap();
		assert_eq!(status, Status::Fresh);
		assert_eq!(public.get("thumbnail/pic_300x300.jpg.webp").unwrap(), b"stale");

		let status = generator(&public, &private, true)
			.generate(&item(Visibility::Public))
			.unwrap();
		assert_eq!(status, Status::Generated);
		let written = public.get("thumbnail/pic_300x300.jpg.webp").unwrap();
		assert_eq!(decoded_size(&written), Dimensions::new(100, 50));
	}

	#[test]
	fn missing_source_is_a_store_error() {
		let public = Arc::new(MemoryFilesystem::default());
		let private = Arc::new(MemoryFilesystem::default());
		let error = generator(&public, &private, false)
			.generate_isolated(&item(Visibility::Public))
			.unwrap_err();
		assert!(matches!(error, ItemError::Store(store::Error::NotFound(..))));
	}

	#[test]
	fn zero_requested_size_is_a_geometry_error() {
		let public = Arc::new(MemoryFilesystem::default());
		let private = Arc::new(MemoryFilesystem::default());
		public.insert("media/pic.jpg", codec::tests::jpeg(10, 10));
		let mut item = item(Visibility::Public);
		item.requested = Dimensions::new(0, 0);
		let error = generator(&public, &private, false).generate(&item).unwrap_err();
		assert!(matches!(error, ItemError::Geometry(..)));
	}
}
