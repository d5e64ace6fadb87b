use std::fmt::{self, Debug, Formatter};
use std::fs;
use std::io::{self, Write as _};
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use tempfile::NamedTempFile;

use crate::error::{io_ctx, Io};

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("asset not found: {0}")]
	NotFound(String),
	#[error("could not write {path}: {error}")]
	WriteFailed { path: String, error: Io },
	#[error("refusing to access {0:?}")]
	InvalidPath(String),
	#[error(transparent)]
	Io(#[from] Io),
}

/// Storage namespace of an asset and everything derived from it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
	Public,
	Private,
}

impl Visibility {
	pub const fn from_private(private: bool) -> Self {
		if private {
			Self::Private
		} else {
			Self::Public
		}
	}
}

/// One namespace of blobs addressed by relative path.
pub trait Filesystem: Send + Sync {
	fn read(&self, path: &str) -> Result<Vec<u8>, Error>;

	/// Replaces the blob at `path`. Readers never observe a partially written blob.
	fn write(&self, path: &str, bytes: &[u8]) -> Result<(), Error>;

	fn exists(&self, path: &str) -> Result<bool, Error>;
}

#[derive(Clone)]
pub struct AssetStore {
	public: Arc<dyn Filesystem>,
	private: Arc<dyn Filesystem>,
}

impl AssetStore {
	pub fn new(public: Arc<dyn Filesystem>, private: Arc<dyn Filesystem>) -> Self {
		Self { public, private }
	}

	pub fn namespace(&self, visibility: Visibility) -> &dyn Filesystem {
		match visibility {
			Visibility::Public => &*self.public,
			Visibility::Private => &*self.private,
		}
	}
}

impl Debug for AssetStore {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		f.debug_struct("AssetStore").finish_non_exhaustive()
	}
}

#[derive(Debug)]
pub struct LocalFilesystem {
	root: PathBuf,
}

impl LocalFilesystem {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self { root: root.into() }
	}

	fn resolve(&self, path: &str) -> Result<PathBuf, Error> {
		let relative = Path::new(path);
		let mut components = relative.components().peekable();
		if components.peek().is_none()
			|| !components.all(|component| matches!(component, Component::Normal(..) | Component::CurDir))
		{
			return Err(Error::InvalidPath(path.to_owned()));
		}
		Ok(self.root.join(relative))
	}
}

fn write_failed<'a>(path: &'a str, context: &'static str) -> impl FnOnce(io::Error) -> Error + 'a {
	move |error| Error::WriteFailed {
		path: path.to_owned(),
		error: Io { context, error },
	}
}

impl Filesystem for LocalFilesystem {
	fn read(&self, path: &str) -> Result<Vec<u8>, Error> {
		let full = self.resolve(path)?;
		fs::read(full).map_err(|error| match error.kind() {
			io::ErrorKind::NotFound => Error::NotFound(path.to_owned()),
			_ => io_ctx("reading asset")(error).into(),
		})
	}

	#[tracing::instrument(level = "trace", skip(bytes), fields(len = bytes.len()))]
	fn write(&self, path: &str, bytes: &[u8]) -> Result<(), Error> {
		let full = self.resolve(path)?;
		let dir = full.parent().unwrap_or(&self.root);
		fs::create_dir_all(dir).map_err(write_failed(path, "creating asset directory"))?;

		let mut staged = NamedTempFile::new_in(dir).map_err(write_failed(path, "creating staging file"))?;
		staged
			.write_all(bytes)
			.map_err(write_failed(path, "writing staging file"))?;
		staged
			.as_file()
			.sync_all()
			.map_err(write_failed(path, "flushing staging file"))?;
		staged
			.persist(&full)
			.map_err(|persist| write_failed(path, "moving staging file into place")(persist.error))?;
		Ok(())
	}

	fn exists(&self, path: &str) -> Result<bool, Error> {
		let full = self.resolve(path)?;
		full
			.try_exists()
			.map_err(|error| io_ctx("checking asset existence")(error).into())
	}
}
