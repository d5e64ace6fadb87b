use std::fmt::{self, Display, Formatter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
	pub width: u32,
	pub height: u32,
}

impl Dimensions {
	pub const fn new(width: u32, height: u32) -> Self {
		Self { width, height }
	}

	const fn is_empty(self) -> bool {
		self.width == 0 || self.height == 0
	}

	const fn is_square(self) -> bool {
		self.width == self.height
	}

	/// Whether `self` is smaller than `other` along either axis.
	const fn undershoots(self, other: Self) -> bool {
		self.width < other.width || self.height < other.height
	}
}

impl Display for Dimensions {
	fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
		write!(f, "{}x{}", self.width, self.height)
	}
}

/// Folder-level thumbnail policy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AspectPolicy {
	pub keep_aspect_ratio: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid dimensions (original {original}, requested {requested})")]
pub struct InvalidDimensions {
	pub original: Dimensions,
	pub requested: Dimensions,
}

/// Computes the size a thumbnail of `requested` size should have for an image of `original` size.
///
/// A square request under an aspect-preserving policy is fitted to the original's ratio along
/// its longer side. The result never exceeds the original in either axis: if it would, the
/// original dimensions are returned unchanged.
pub fn thumbnail_size(
	original: Dimensions,
	requested: Dimensions,
	policy: AspectPolicy,
) -> Result<Dimensions, InvalidDimensions> {
	if original.is_empty() || requested.is_empty() {
		return Err(InvalidDimensions {
			original,
			requested,
		});
	}

	let calculated = if !policy.keep_aspect_ratio || !requested.is_square() {
		requested
	} else if original.width >= original.height {
		let ratio = f64::from(original.height) / f64::from(original.width);
		Dimensions::new(requested.width, scale_up(requested.height, ratio))
	} else {
		let ratio = f64::from(original.width) / f64::from(original.height);
		Dimensions::new(scale_up(requested.width, ratio), requested.height)
	};

	if original.undershoots(calculated) {
		Ok(original)
	} else {
		Ok(calculated)
	}
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn scale_up(side: u32, ratio: f64) -> u32 {
	// ratio <= 1, so the product always fits back into the side's range
	(f64::from(side) * ratio).ceil() as u32
}

#[cfg(test)]
mod tests {
	use super::*;

	const KEEP: AspectPolicy = AspectPolicy {
		keep_aspect_ratio: true,
	};
	const STRETCH: AspectPolicy = AspectPolicy {
		keep_aspect_ratio: false,
	};

	fn size(original: (u32, u32), requested: (u32, u32), policy: AspectPolicy) -> (u32, u32) {
		let result = thumbnail_size(
			Dimensions::new(original.0, original.1),
			Dimensions::new(requested.0, requested.1),
			policy,
		)
		.unwrap();
		(result.width, result.height)
	}

	#[test]
	fn landscape_square_request_keeps_ratio() {
		assert_eq!(size((1920, 1080), (300, 300), KEEP), (300, 169));
	}

	#[test]
	fn portrait_square_request_keeps_ratio() {
		assert_eq!(size((1080, 1920), (300, 300), KEEP), (169, 300));
	}

	#[test]
	fn square_original_stays_square() {
		assert_eq!(size((1000, 1000), (400, 400), KEEP), (400, 400));
	}

	#[test]
	fn small_original_is_never_upscaled() {
		assert_eq!(size((100, 50), (300, 300), KEEP), (100, 50));
		assert_eq!(size((100, 50), (300, 300), STRETCH), (100, 50));
		assert_eq!(size((800, 90), (200, 100), STRETCH), (800, 90));
	}

	#[test]
	fn non_square_request_is_taken_verbatim() {
		assert_eq!(size((800, 600), (200, 100), KEEP), (200, 100));
		assert_eq!(size((800, 600), (200, 100), STRETCH), (200, 100));
	}

	#[test]
	fn stretch_policy_ignores_ratio() {
		assert_eq!(size((1920, 1080), (300, 300), STRETCH), (300, 300));
	}

	#[test]
	fn zero_sizes_are_rejected() {
		let policy = KEEP;
		assert!(thumbnail_size(Dimensions::new(0, 10), Dimensions::new(5, 5), policy).is_err());
		assert!(thumbnail_size(Dimensions::new(10, 10), Dimensions::new(5, 0), policy).is_err());
	}

	#[test]
	fn aspect_fit_never_exceeds_original_and_tracks_ratio() {
		for width in (1..=2000).step_by(37) {
			for height in (1..=2000).step_by(41) {
				for side in [1, 16, 150, 300, 800, 1920] {
					let (w, h) = size((width, height), (side, side), KEEP);
					assert!(w <= width && h <= height, "{width}x{height} @ {side} -> {w}x{h}");
					if (w, h) == (width, height) {
						continue;
					}
					let expected = f64::from(width) / f64::from(height);
					if width >= height {
						assert_eq!(w, side);
						let ideal = f64::from(side) / expected;
						assert!((f64::from(h) - ideal).abs() <= 1.0);
					} else {
						assert_eq!(h, side);
						let ideal = f64::from(side) * expected;
						assert!((f64::from(w) - ideal).abs() <= 1.0);
					}
				}
			}
		}
	}

	#[test]
	fn fixed_sizes_are_exact_or_original() {
		for width in (1..=1200).step_by(53) {
			for height in (1..=1200).step_by(47) {
				for requested in [(200, 100), (64, 64), (500, 700)] {
					let expected = if width < requested.0 || height < requested.1 {
						(width, height)
					} else {
						requested
					};
					assert_eq!(size((width, height), requested, STRETCH), expected);
					if requested.0 != requested.1 {
						assert_eq!(size((width, height), requested, KEEP), expected);
					}
				}
			}
		}
	}
}
