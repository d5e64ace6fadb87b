use std::io::Cursor;
use std::panic::{self, AssertUnwindSafe};

use image::imageops::{self, FilterType};
use image::{DynamicImage, GenericImageView as _, ImageFormat, ImageReader, Rgba, RgbaImage};
use webp::Encoder;

use super::geometry::Dimensions;

pub const WEBP_EXTENSION: &str = "webp";

#[derive(Debug, thiserror::Error)]
pub enum Error {
	#[error("unsupported image {source_name}: {reason}")]
	UnsupportedImage { source_name: String, reason: String },
	#[error("webp encoding failed: {0}")]
	EncodingFailed(String),
	#[error("webp encoder unavailable: {0}")]
	EncoderUnavailable(String),
}

/// Sniffed container format of a decoded source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceFormat {
	pub format: ImageFormat,
	pub transparent: bool,
}

impl SourceFormat {
	fn new(format: ImageFormat) -> Self {
		let transparent = matches!(
			format,
			ImageFormat::Png
				| ImageFormat::Gif
				| ImageFormat::WebP
				| ImageFormat::Tiff
				| ImageFormat::Ico
				| ImageFormat::Bmp
				| ImageFormat::Avif
		);
		Self {
			format,
			transparent,
		}
	}
}

#[derive(Debug)]
pub struct DecodedImage {
	image: DynamicImage,
	pub format: SourceFormat,
}

impl DecodedImage {
	pub fn dimensions(&self) -> Dimensions {
		let (width, height) = self.image.dimensions();
		Dimensions::new(width, height)
	}
}

/// A rendered thumbnail, ready for encoding.
#[derive(Debug)]
pub struct Canvas(DynamicImage);

impl Canvas {
	#[cfg(test)]
	pub fn dimensions(&self) -> Dimensions {
		let (width, height) = self.0.dimensions();
		Dimensions::new(width, height)
	}

	#[cfg(test)]
	pub fn pixel(&self, x: u32, y: u32) -> Rgba<u8> {
		self.0.get_pixel(x, y)
	}

	#[cfg(test)]
	pub fn has_alpha(&self) -> bool {
		self.0.color().has_alpha()
	}
}

/// Decodes `bytes`, sniffing the container format from its content.
///
/// Decoder panics on malformed input are caught and reported like any other rejection.
#[tracing::instrument(level = "trace", skip(bytes), fields(len = bytes.len()))]
pub fn decode(source_name: &str, bytes: &[u8]) -> Result<DecodedImage, Error> {
	let unsupported = |reason: String| Error::UnsupportedImage {
		source_name: source_name.to_owned(),
		reason,
	};

	let reader = ImageReader::new(Cursor::new(bytes))
		.with_guessed_format()
		.map_err(|error| unsupported(error.to_string()))?;
	let format = reader
		.format()
		.ok_or_else(|| unsupported("unrecognized format".to_owned()))?;

	let image = panic::catch_unwind(AssertUnwindSafe(|| reader.decode()))
		.map_err(|_| unsupported("decoder panicked".to_owned()))?
		.map_err(|error| unsupported(error.to_string()))?;

	tracing::trace!(?format, width = image.width(), height = image.height(), "decoded");
	Ok(DecodedImage {
		image,
		format: SourceFormat::new(format),
	})
}

/// Resamples the whole source onto a canvas of `target` size.
///
/// Opaque sources are composited over white; transparent ones keep their alpha channel as is.
pub fn render(source: &DecodedImage, target: Dimensions, transparent: bool) -> Canvas {
	let resized = imageops::resize(
		&source.image,
		target.width,
		target.height,
		FilterType::Triangle,
	);

	if transparent {
		return Canvas(DynamicImage::ImageRgba8(resized));
	}

	let mut canvas = RgbaImage::from_pixel(target.width, target.height, Rgba([255, 255, 255, 255]));
	imageops::overlay(&mut canvas, &resized, 0, 0);
	Canvas(DynamicImage::ImageRgb8(
		DynamicImage::ImageRgba8(canvas).into_rgb8(),
	))
}

/// Encodes the canvas as lossy WebP. `quality` is passed through to the encoder.
pub fn encode(canvas: &Canvas, quality: u8) -> Result<Vec<u8>, Error> {
	let encoder =
		Encoder::from_image(&canvas.0).map_err(|reason| Error::EncodingFailed(reason.to_owned()))?;
	let memory = encoder
		.encode_simple(false, f32::from(quality))
		.map_err(|error| Error::EncodingFailed(format!("{error:?}")))?;
	Ok(memory.to_vec())
}

/// Checks that the encoder works at all by encoding a single pixel.
pub fn probe(quality: u8) -> Result<(), Error> {
	let canvas = Canvas(DynamicImage::ImageRgb8(image::RgbImage::new(1, 1)));
	let bytes = encode(&canvas, quality).map_err(|error| match error {
		Error::EncodingFailed(reason) => Error::EncoderUnavailable(reason),
		other => other,
	})?;
	if bytes.is_empty() {
		return Err(Error::EncoderUnavailable("encoder produced no output".to_owned()));
	}
	Ok(())
}
