use std::path::Path;

use crate::catalog::Media;
use crate::thumbnail::geometry::Dimensions;

const MEDIA_DIR: &str = "media";
const THUMBNAIL_DIR: &str = "thumbnail";

/// Naming of originals and their thumbnails inside a namespace.
pub trait PathScheme: Send + Sync {
	fn media_path(&self, media: &Media) -> String;

	/// Path of the thumbnail of `media` at `size`, without the derived format's extension.
	fn thumbnail_path(&self, media: &Media, size: Dimensions) -> String;
}

/// `<thumbnail path>.<extension>`; stable for a given media entry, size and format.
pub fn derived_path(scheme: &dyn PathScheme, media: &Media, size: Dimensions, extension: &str) -> String {
	format!("{}.{extension}", scheme.thumbnail_path(media, size))
}

/// Mirrors `media/<dirs>/<name>.<ext>` into `thumbnail/<dirs>/<name>_<w>x<h>.<ext>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct DefaultPathScheme;

impl PathScheme for DefaultPathScheme {
	fn media_path(&self, media: &Media) -> String {
		join_paths([media.path.as_str()])
	}

	fn thumbnail_path(&self, media: &Media, size: Dimensions) -> String {
		let original = Path::new(media.path.trim_start_matches('/'));
		let dir = original
			.parent()
			.map(|dir| dir.strip_prefix(MEDIA_DIR).unwrap_or(dir).to_string_lossy().into_owned())
			.unwrap_or_default();
		let stem = original
			.file_stem()
			.map_or_else(|| media.id.clone(), |stem| stem.to_string_lossy().into_owned());
		let name = match original.extension() {
			Some(extension) => format!("{stem}_{size}.{}", extension.to_string_lossy()),
			None => format!("{stem}_{size}"),
		};
		join_paths([THUMBNAIL_DIR, &dir, &name])
	}
}

/// Joins segments with single slashes, dropping empty ones. The result is relative.
fn join_paths<'a>(items: impl IntoIterator<Item = &'a str>) -> String {
	let mut ret = String::new();
	for item in items {
		let item = item.trim_matches('/');
		if item.is_empty() {
			continue;
		}
		if !ret.is_empty() {
			ret.push('/');
		}
		ret.push_str(item);
	}
	ret
}

#[cfg(test)]
mod tests {
	use super::*;

	fn media(path: &str) -> Media {
		Media {
			id: "0190c3d5".to_owned(),
			path: path.to_owned(),
			file_name: String::new(),
			private: false,
			folder: None,
		}
	}

	#[test]
	fn join() {
		assert_eq!(join_paths(["/a/", "", "b//", "c"]), "a/b/c");
		assert_eq!(join_paths([""]), "");
	}

	#[test]
	fn thumbnail_mirrors_media_layout() {
		let scheme = DefaultPathScheme;
		let media = media("media/8f/21/photo.jpg");
		assert_eq!(scheme.media_path(&media), "media/8f/21/photo.jpg");
		assert_eq!(
			scheme.thumbnail_path(&media, Dimensions::new(300, 300)),
			"thumbnail/8f/21/photo_300x300.jpg"
		);
		assert_eq!(
			derived_path(&scheme, &media, Dimensions::new(300, 300), "webp"),
			"thumbnail/8f/21/photo_300x300.jpg.webp"
		);
	}

	#[test]
	fn odd_media_paths() {
		let scheme = DefaultPathScheme;
		assert_eq!(
			scheme.thumbnail_path(&media("/flat.png"), Dimensions::new(10, 20)),
			"thumbnail/flat_10x20.png"
		);
		assert_eq!(
			scheme.thumbnail_path(&media("uploads/noext"), Dimensions::new(1, 1)),
			"thumbnail/uploads/noext_1x1"
		);
	}

	#[test]
	fn derived_path_depends_only_on_inputs() {
		let scheme = DefaultPathScheme;
		let media = media("media/a/b.gif");
		let first = derived_path(&scheme, &media, Dimensions::new(64, 64), "webp");
		let second = derived_path(&scheme, &media, Dimensions::new(64, 64), "webp");
		assert_eq!(first, second);
		assert_ne!(first, derived_path(&scheme, &media, Dimensions::new(64, 32), "webp"));
	}
}
