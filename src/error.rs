use std::io;

use crate::store;
use crate::thumbnail::{codec, geometry};

#[derive(Debug, thiserror::Error)]
#[error("while {context}: {error}")]
pub struct Io<E = io::Error> {
	pub context: &'static str,
	pub error: E,
}

pub fn io_ctx<E>(context: &'static str) -> impl FnOnce(E) -> Io<E> {
	move |error| Io { context, error }
}

/// Everything that can go wrong while generating a single thumbnail.
#[derive(Debug, thiserror::Error)]
pub enum ItemError {
	#[error(transparent)]
	Geometry(#[from] geometry::InvalidDimensions),
	#[error(transparent)]
	Codec(#[from] codec::Error),
	#[error(transparent)]
	Store(#[from] store::Error),
	#[error("generation panicked: {0}")]
	Panicked(String),
}
