//! Abelian sandpile on an unbounded i16 × i16 lattice.
//!
//! A cell holding at least the critical number of grains topples: it loses
//! that many grains and each of its four neighbours gains a quarter of them.
//! [`Sandpile::run`] keeps toppling until every cell is below the threshold
//! or the iteration budget runs out, optionally saving bitmap snapshots on
//! the way.

mod error;
mod optimized;

pub mod bmp;
pub mod grid;
pub mod input;
pub mod snapshot;

use std::path::PathBuf;

pub use error::{Error, Result};
pub use grid::Grid;
pub use snapshot::{
	BmpSink,
	GridView,
	SnapshotLabel,
	SnapshotSink,
	SANDPILE_PALETTE,
};

pub const DEFAULT_CRITICAL_SAND_NUMBER: u64 = 4;
pub const DEFAULT_EXTENSION: &str = ".bmp";

const NEIGHBOURS: [(i16, i16); 4] = [(1, 0), (0, 1), (-1, 0), (0, -1)];

/// Where snapshot files go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
	pub directory: PathBuf,
	pub prefix: String,
	pub extension: String,
}

impl OutputConfig {
	pub fn new<P: Into<PathBuf>>(directory: P) -> OutputConfig {
		OutputConfig {
			directory: directory.into(),
			prefix: String::new(),
			extension: DEFAULT_EXTENSION.to_owned(),
		}
	}

	pub fn with_prefix<S: Into<String>>(mut self, prefix: S) -> OutputConfig {
		self.prefix = prefix.into();
		self
	}

	pub fn with_extension<S: Into<String>>(mut self, extension: S) -> OutputConfig {
		self.extension = extension.into();
		self
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SandpileConfig {
	/// A cell topples once it holds this many grains.
	pub critical_sand_number: u64,
	/// Zero means no limit.
	pub max_iterations: u64,
	/// Save a snapshot every this many iterations; zero saves only the final state.
	pub snapshot_frequency: u64,
	pub output: Option<OutputConfig>,
}

impl Default for SandpileConfig {
	fn default() -> SandpileConfig {
		SandpileConfig {
			critical_sand_number: DEFAULT_CRITICAL_SAND_NUMBER,
			max_iterations: 0,
			snapshot_frequency: 0,
			output: None,
		}
	}
}

impl SandpileConfig {
	pub fn with_critical_sand_number(mut self, critical_sand_number: u64) -> SandpileConfig {
		self.critical_sand_number = critical_sand_number;
		self
	}

	pub fn with_max_iterations(mut self, max_iterations: u64) -> SandpileConfig {
		self.max_iterations = max_iterations;
		self
	}

	pub fn with_snapshot_frequency(mut self, snapshot_frequency: u64) -> SandpileConfig {
		self.snapshot_frequency = snapshot_frequency;
		self
	}

	pub fn with_output(mut self, output: OutputConfig) -> SandpileConfig {
		self.output = Some(output);
		self
	}

	pub fn validate(&self) -> Result<()> {
		if self.critical_sand_number == 0 {
			return Err(Error::InvalidConfig("critical sand number must be positive".to_owned()));
		}
		if self.critical_sand_number % 4 != 0 {
			log::warn!(
				"critical sand number {} is not a multiple of 4, toppling will lose sand",
				self.critical_sand_number
			);
		}
		Ok(())
	}

	/// Whole excess of a cell goes at once when nobody watches intermediate states.
	fn fully_topples(&self) -> bool {
		self.max_iterations == 0 && self.snapshot_frequency == 0
	}
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunState {
	Running,
	Stable,
	Exhausted,
	Failed,
}

pub struct Sandpile {
	grid: Grid,
	config: SandpileConfig,
	sink: Option<Box<dyn SnapshotSink>>,
	state: RunState,
	spilled: u64,
}

impl Sandpile {
	/// Snapshots go to bitmap files when `config.output` is set.
	pub fn new(grid: Grid, config: SandpileConfig) -> Result<Sandpile> {
		config.validate()?;
		let sink = config.output.as_ref()
			.map(|output| Box::new(BmpSink::new(output)) as Box<dyn SnapshotSink>);
		Ok(Sandpile {
			grid,
			config,
			sink,
			state: RunState::Running,
			spilled: 0,
		})
	}

	/// Snapshots go to `sink`, whatever `config.output` says.
	pub fn with_sink<S>(grid: Grid, config: SandpileConfig, sink: S) -> Result<Sandpile>
	where
		S: SnapshotSink + 'static,
	{
		config.validate()?;
		Ok(Sandpile {
			grid,
			config,
			sink: Some(Box::new(sink)),
			state: RunState::Running,
			spilled: 0,
		})
	}

	pub fn grid(&self) -> &Grid {
		&self.grid
	}

	pub fn into_grid(self) -> Grid {
		self.grid
	}

	pub fn config(&self) -> &SandpileConfig {
		&self.config
	}

	pub fn state(&self) -> RunState {
		self.state
	}

	/// Grains pushed past the edge of the i16 plane so far.
	pub fn spilled(&self) -> u64 {
		self.spilled
	}

	pub fn is_stable(&self) -> bool {
		let critical = self.config.critical_sand_number;
		self.grid.cells().all(|(_, _, sand)| sand < critical)
	}

	/// One pass over the window: every cell at or above the threshold
	/// topples exactly once, bottom row first, left to right.
	pub fn topple_grid(&mut self) {
		if self.grid.is_empty() {
			return;
		}
		let critical = self.config.critical_sand_number;
		let (min_x, max_x) = (self.grid.min_x(), self.grid.max_x());
		let (min_y, max_y) = (self.grid.min_y(), self.grid.max_y());
		for y in min_y..=max_y {
			for x in min_x..=max_x {
				if self.grid.get_sand(x, y) >= critical {
					self.topple_cell(x, y, critical);
				}
			}
		}
	}

	/// Topples until stable or out of iterations; returns the number of passes.
	pub fn run(&mut self) -> Result<u64> {
		if self.state == RunState::Failed {
			return Err(Error::Aborted);
		}
		self.state = RunState::Running;
		let max_iterations = self.config.max_iterations;
		let snapshot_frequency = self.config.snapshot_frequency;
		let fully = self.config.fully_topples();
		log::info!(
			"running sandpile on a {}x{} window ({} toppling)",
			self.grid.width(),
			self.grid.height(),
			if fully { "full" } else { "single-step" }
		);

		let spilled_before = self.spilled;
		let mut iterations = 0;
		loop {
			if self.is_stable() {
				self.state = RunState::Stable;
				break;
			}
			if max_iterations != 0 && iterations == max_iterations {
				self.state = RunState::Exhausted;
				break;
			}
			if fully {
				self.fully_topple_grid();
			} else {
				if snapshot_frequency != 0 && iterations % snapshot_frequency == 0 {
					self.save(SnapshotLabel::Iteration(iterations))?;
				}
				self.topple_grid();
			}
			iterations += 1;
			log::trace!(
				"iteration {} done, window {}x{}",
				iterations, self.grid.width(), self.grid.height()
			);
		}

		if self.spilled > spilled_before {
			log::warn!(
				"{} grains fell off the edge of the plane",
				self.spilled - spilled_before
			);
		}
		self.save(SnapshotLabel::Final)?;
		log::info!(
			"sandpile {:?} after {} iterations, final window {}x{}",
			self.state, iterations, self.grid.width(), self.grid.height()
		);
		Ok(iterations)
	}

	fn topple_cell(&mut self, x: i16, y: i16, amount: u64) {
		let share = amount / 4;
		for &(dx, dy) in NEIGHBOURS.iter() {
			match (x.checked_add(dx), y.checked_add(dy)) {
				(Some(nx), Some(ny)) => self.grid.add_sand(nx, ny, share),
				_ => {
					self.spilled = self.spilled.saturating_add(share);
					log::trace!("{} grains fall off the plane at ({}, {})", share, x, y);
				},
			}
		}
		self.grid.remove_sand(x, y, amount);
	}

	fn save(&mut self, label: SnapshotLabel) -> Result<()> {
		let sink = match self.sink.as_mut() {
			Some(sink) => sink,
			None => return Ok(()),
		};
		if self.grid.is_empty() {
			log::debug!("grid is empty, snapshot {:?} skipped", label);
			return Ok(());
		}
		let view = GridView::new(&self.grid, self.config.critical_sand_number);
		if let Err(e) = sink.save(label, view, &SANDPILE_PALETTE) {
			log::warn!("snapshot {:?} failed: {}", label, e);
			self.state = RunState::Failed;
			return Err(e);
		}
		Ok(())
	}
}
