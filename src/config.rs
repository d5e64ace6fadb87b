use std::path::{Path, PathBuf};

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::Deserialize;

use crate::batch::DEFAULT_BATCH_SIZE;

#[derive(Deserialize, Debug)]
pub struct Config {
	pub catalog: PathBuf,
	pub public_root: PathBuf,
	pub private_root: PathBuf,
	#[serde(default = "default_batch_size")]
	pub batch_size: usize,
	#[serde(default)]
	pub quality: Quality,
	#[serde(default)]
	pub force_recreate: bool,
	#[serde(default)]
	pub log_level: LevelFilter,
}

const fn default_batch_size() -> usize {
	DEFAULT_BATCH_SIZE
}

/// Encoder quality on a 0 to 100 scale.
#[derive(Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(try_from = "u8")]
pub struct Quality(u8);

impl Quality {
	pub const fn get(self) -> u8 {
		self.0
	}
}

impl Default for Quality {
	fn default() -> Self {
		Self(80)
	}
}

impl TryFrom<u8> for Quality {
	type Error = String;

	fn try_from(value: u8) -> Result<Self, Self::Error> {
		if value <= 100 {
			Ok(Self(value))
		} else {
			Err(format!("quality must be between 0 and 100, got {value}"))
		}
	}
}

#[derive(Deserialize, Debug, Default, Clone, Copy)]
#[serde(rename_all = "snake_case")]
pub enum LevelFilter {
	Off,
	Error,
	Warn,
	#[default]
	Info,
	Debug,
	Trace,
}

impl From<LevelFilter> for tracing::level_filters::LevelFilter {
	fn from(level: LevelFilter) -> Self {
		match level {
			LevelFilter::Off => Self::OFF,
			LevelFilter::Error => Self::ERROR,
			LevelFilter::Warn => Self::WARN,
			LevelFilter::Info => Self::INFO,
			LevelFilter::Debug => Self::DEBUG,
			LevelFilter::Trace => Self::TRACE,
		}
	}
}

pub fn load(file: &Path) -> figment::error::Result<Config> {
	Figment::new()
		.merge(Toml::file(file))
		.merge(Env::prefixed("THUMBCONV_"))
		.extract()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn defaults_and_env_override() {
		figment::Jail::expect_with(|jail| {
			jail.create_file(
				"thumbconv.toml",
				r#"
					catalog = "catalog.json"
					public_root = "public"
					private_root = "private"
				"#,
			)?;
			let config = load(Path::new("thumbconv.toml"))?;
			assert_eq!(config.batch_size, 50);
			assert_eq!(config.quality.get(), 80);
			assert!(!config.force_recreate);

			jail.set_env("THUMBCONV_QUALITY", "65");
			jail.set_env("THUMBCONV_FORCE_RECREATE", "true");
			let config = load(Path::new("thumbconv.toml"))?;
			assert_eq!(config.quality.get(), 65);
			assert!(config.force_recreate);
			Ok(())
		});
	}

	#[test]
	fn out_of_range_quality_is_rejected() {
		figment::Jail::expect_with(|jail| {
			jail.create_file(
				"thumbconv.toml",
				r#"
					catalog = "catalog.json"
					public_root = "public"
					private_root = "private"
					quality = 101
				"#,
			)?;
			assert!(load(Path::new("thumbconv.toml")).is_err());
			Ok(())
		});
	}
}
