use std::{
	fs::File,
	io::{BufWriter, Write},
	path::{Path, PathBuf},
};

use crate::{
	bmp::{self, Color},
	error::{Error, Result},
	grid::Grid,
	OutputConfig,
};

pub const WHITE: Color = Color::new(255, 255, 255);
pub const GREEN: Color = Color::new(64, 128, 0);
pub const PURPLE: Color = Color::new(118, 8, 170);
pub const YELLOW: Color = Color::new(255, 214, 0);
pub const BLACK: Color = Color::new(0, 0, 0);

/// Colors of 0, 1, 2 and 3 grains, then the color of a cell about to topple.
pub const SANDPILE_PALETTE: [Color; 5] = [WHITE, GREEN, PURPLE, YELLOW, BLACK];

const UNSTABLE_INDEX: u8 = 4;

/// Palette index of a cell holding `sand` grains.
pub fn color_index(sand: u64, critical_sand_number: u64) -> u8 {
	if sand >= critical_sand_number {
		UNSTABLE_INDEX
	} else {
		(sand % u64::from(UNSTABLE_INDEX)) as u8
	}
}

/// Which moment of a run a snapshot captures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SnapshotLabel {
	Iteration(u64),
	Final,
}

/// Read-only look at the grid window handed to a sink.
#[derive(Debug, Clone, Copy)]
pub struct GridView<'a> {
	grid: &'a Grid,
	critical_sand_number: u64,
}

impl<'a> GridView<'a> {
	pub fn new(grid: &'a Grid, critical_sand_number: u64) -> GridView<'a> {
		GridView { grid, critical_sand_number }
	}

	pub fn min_x(&self) -> i16 {
		self.grid.min_x()
	}

	pub fn min_y(&self) -> i16 {
		self.grid.min_y()
	}

	pub fn width(&self) -> u32 {
		self.grid.width()
	}

	pub fn height(&self) -> u32 {
		self.grid.height()
	}

	pub fn critical_sand_number(&self) -> u64 {
		self.critical_sand_number
	}

	pub fn sand(&self, x: i16, y: i16) -> u64 {
		self.grid.get_sand(x, y)
	}

	/// Palette indices of the window, top row (`max_y`) first.
	pub fn color_indices(&self) -> Result<Vec<u8>> {
		let mut pixels = Vec::with_capacity(self.width() as usize * self.height() as usize);
		if self.grid.is_empty() {
			return Ok(pixels);
		}
		for y in (self.grid.min_y()..=self.grid.max_y()).rev() {
			for x in self.grid.min_x()..=self.grid.max_x() {
				let sand = self.grid.cell(x, y)?;
				pixels.push(color_index(sand, self.critical_sand_number));
			}
		}
		Ok(pixels)
	}
}

/// Destination for the pictures taken while a sandpile runs.
pub trait SnapshotSink {
	fn save(&mut self, label: SnapshotLabel, view: GridView<'_>, palette: &[Color]) -> Result<()>;
}

/// Writes every snapshot as a bitmap file named
/// `<directory>/<prefix><iteration or "final"><extension>`.
#[derive(Debug, Clone)]
pub struct BmpSink {
	directory: PathBuf,
	prefix: String,
	extension: String,
}

impl BmpSink {
	pub fn new(output: &OutputConfig) -> BmpSink {
		BmpSink {
			directory: output.directory.clone(),
			prefix: output.prefix.clone(),
			extension: output.extension.clone(),
		}
	}

	pub fn path(&self, label: SnapshotLabel) -> PathBuf {
		let name = match label {
			SnapshotLabel::Iteration(n) => format!("{}{}{}", self.prefix, n, self.extension),
			SnapshotLabel::Final => format!("{}final{}", self.prefix, self.extension),
		};
		self.directory.join(name)
	}

	fn write(path: &Path, view: GridView<'_>, palette: &[Color]) -> Result<()> {
		let pixels = view.color_indices()?;
		let bytes = bmp::encode(view.width(), view.height(), palette, &pixels)?;
		let mut file = BufWriter::new(File::create(path)?);
		file.write_all(&bytes)?;
		file.flush()?;
		Ok(())
	}
}

impl SnapshotSink for BmpSink {
	fn save(&mut self, label: SnapshotLabel, view: GridView<'_>, palette: &[Color]) -> Result<()> {
		let path = self.path(label);
		log::debug!(
			"writing {}x{} snapshot to {}",
			view.width(), view.height(), path.display()
		);
		BmpSink::write(&path, view, palette).map_err(|e| Error::Snapshot {
			path,
			source: Box::new(e),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use tempfile::TempDir;

	#[test]
	fn color_mapping() {
		assert_eq!(color_index(0, 4), 0);
		assert_eq!(color_index(1, 4), 1);
		assert_eq!(color_index(2, 4), 2);
		assert_eq!(color_index(3, 4), 3);
		assert_eq!(color_index(4, 4), 4);
		assert_eq!(color_index(1000, 4), 4);
		assert_eq!(color_index(5, 8), 1);
		assert_eq!(color_index(8, 8), 4);
	}

	#[test]
	fn view_lists_top_row_first() {
		let grid = Grid::from_cells(vec![(0, 0, 1), (1, 0, 2), (0, 1, 3), (1, 1, 9)]);
		let view = GridView::new(&grid, 4);
		assert_eq!(view.color_indices().unwrap(), vec![3, 4, 1, 2]);
		assert_eq!(view.sand(1, 1), 9);
		assert_eq!(view.sand(5, 5), 0);
	}

	#[test]
	fn empty_view_has_no_pixels() {
		let grid = Grid::new();
		assert!(GridView::new(&grid, 4).color_indices().unwrap().is_empty());
	}

	#[test]
	fn file_names() {
		let sink = BmpSink::new(&OutputConfig::new("out").with_prefix("state_"));
		assert_eq!(sink.path(SnapshotLabel::Iteration(12)), Path::new("out/state_12.bmp"));
		assert_eq!(sink.path(SnapshotLabel::Final), Path::new("out/state_final.bmp"));
	}

	#[test]
	fn writes_bitmap_file() {
		let dir = TempDir::new().unwrap();
		let mut sink = BmpSink::new(&OutputConfig::new(dir.path()));
		let grid = Grid::from_cells(vec![(0, 0, 3), (2, 1, 1)]);
		sink.save(SnapshotLabel::Final, GridView::new(&grid, 4), &SANDPILE_PALETTE).unwrap();

		let bytes = std::fs::read(dir.path().join("final.bmp")).unwrap();
		let header = bmp::BitmapHeader::parse(&bytes).unwrap();
		assert_eq!((header.bi_width, header.bi_height), (3, 2));
		assert_eq!(header.bi_bit_count, 4);
		assert_eq!(header.bf_size as usize, bytes.len());
	}

	#[test]
	fn missing_directory_is_reported() {
		let dir = TempDir::new().unwrap();
		let missing = dir.path().join("nope");
		let mut sink = BmpSink::new(&OutputConfig::new(&missing));
		let grid = Grid::from_cells(vec![(0, 0, 1)]);
		match sink.save(SnapshotLabel::Iteration(0), GridView::new(&grid, 4), &SANDPILE_PALETTE) {
			Err(Error::Snapshot { path, source }) => {
				assert_eq!(path, missing.join("0.bmp"));
				assert!(matches!(*source, Error::Io(_)));
			},
			other => panic!("unexpected {:?}", other),
		}
	}
}
