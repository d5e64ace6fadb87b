use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about)]
pub struct Args {
	/// Configuration file, merged with `THUMBCONV_*` environment variables.
	#[arg(long, global = true, default_value = "thumbconv.toml")]
	pub config: PathBuf,
	/// List every failed thumbnail instead of only counting them.
	#[arg(short, long, global = true)]
	pub verbose: bool,
	/// Regenerate thumbnails that already exist.
	#[arg(long, global = true)]
	pub force: bool,
	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Convert the thumbnails of the whole catalog.
	Convert,
	/// Convert the thumbnails touched by a recorded write notification (JSON).
	OnWrite { event: PathBuf },
}

#[cfg(test)]
mod tests {
	use clap::CommandFactory as _;

	use super::*;

	#[test]
	fn definition_is_consistent() {
		Args::command().debug_assert();
	}

	#[test]
	fn parses_subcommands_and_globals() {
		let args = Args::try_parse_from(["thumbconv", "convert", "--force", "-v"]).unwrap();
		assert!(matches!(args.command, Command::Convert));
		assert!(args.force && args.verbose);
		assert_eq!(args.config, PathBuf::from("thumbconv.toml"));

		let args = Args::try_parse_from(["thumbconv", "--config", "x.toml", "on-write", "event.json"]).unwrap();
		assert!(matches!(args.command, Command::OnWrite { ref event } if event == &PathBuf::from("event.json")));
		assert_eq!(args.config, PathBuf::from("x.toml"));
	}
}
