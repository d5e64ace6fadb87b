use crate::batch::ProcessingOutcome;

/// Observer of a batch run. Calls never block or fail the run.
pub trait ProgressSink {
	fn on_start(&mut self, total: u64);
	fn on_advance(&mut self, items: u64);
	fn on_finish(&mut self);
	fn on_summary(&mut self, outcome: &ProcessingOutcome);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct Silent;

impl ProgressSink for Silent {
	fn on_start(&mut self, _total: u64) {}
	fn on_advance(&mut self, _items: u64) {}
	fn on_finish(&mut self) {}
	fn on_summary(&mut self, _outcome: &ProcessingOutcome) {}
}

/// Reports progress through the log. Individual errors are only listed when `verbose` is set.
#[derive(Debug, Default)]
pub struct LogProgress {
	verbose: bool,
	total: u64,
	done: u64,
}

impl LogProgress {
	pub fn new(verbose: bool) -> Self {
		Self {
			verbose,
			..Self::default()
		}
	}

	/// Every error when verbose, otherwise a single count.
	fn error_report(&self, outcome: &ProcessingOutcome) -> Vec<String> {
		if outcome.errors.is_empty() {
			Vec::new()
		} else if self.verbose {
			outcome.errors.clone()
		} else {
			vec![format!(
				"{} thumbnails could not be generated, rerun with --verbose for details",
				outcome.errors.len()
			)]
		}
	}
}

impl ProgressSink for LogProgress {
	fn on_start(&mut self, total: u64) {
		self.total = total;
		self.done = 0;
		tracing::info!("generating webp images for {total} thumbnails, this may take some time");
	}

	fn on_advance(&mut self, items: u64) {
		self.done += items;
		tracing::info!(done = self.done, total = self.total, "progress");
	}

	fn on_finish(&mut self) {
		tracing::info!(done = self.done, "finished");
	}

	fn on_summary(&mut self, outcome: &ProcessingOutcome) {
		tracing::info!(
			generated = outcome.generated,
			skipped = outcome.skipped,
			errored = outcome.errored,
			cancelled = outcome.cancelled,
			"summary"
		);
		for line in self.error_report(outcome) {
			tracing::warn!("{line}");
		}
	}
}

/// Records every callback, for asserting on the progress contract.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct Recorder {
	pub events: Vec<String>,
}

#[cfg(test)]
impl ProgressSink for Recorder {
	fn on_start(&mut self, total: u64) {
		self.events.push(format!("start {total}"));
	}

	fn on_advance(&mut self, items: u64) {
		self.events.push(format!("advance {items}"));
	}

	fn on_finish(&mut self) {
		self.events.push("finish".to_owned());
	}

	fn on_summary(&mut self, outcome: &ProcessingOutcome) {
		self.events.push(format!(
			"summary {}/{}/{}",
			outcome.generated, outcome.skipped, outcome.errored
		));
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn failed(count: usize) -> ProcessingOutcome {
		ProcessingOutcome {
			errored: count as u64,
			errors: (0..count).map(|i| format!("thumbnail t{i} (p{i}.jpg): broken")).collect(),
			..ProcessingOutcome::default()
		}
	}

	#[test]
	fn errors_collapse_to_a_count_unless_verbose() {
		let quiet = LogProgress::new(false).error_report(&failed(3));
		assert_eq!(
			quiet,
			["3 thumbnails could not be generated, rerun with --verbose for details"]
		);
		assert!(quiet.iter().all(|line| !line.contains("broken")));

		let verbose = LogProgress::new(true).error_report(&failed(2));
		assert_eq!(
			verbose,
			["thumbnail t0 (p0.jpg): broken", "thumbnail t1 (p1.jpg): broken"]
		);
	}

	#[test]
	fn clean_runs_report_no_errors() {
		assert!(LogProgress::new(true).error_report(&failed(0)).is_empty());
		assert!(LogProgress::new(false).error_report(&failed(0)).is_empty());
	}
}
