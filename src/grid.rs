use std::fmt;

use crate::error::{Error, Result};

/// Sand counts over an i16 × i16 plane.
///
/// Storage covers only the bounding box of the cells written so far
/// (`[min_x, min_x + width) × [min_y, min_y + height)`), laid out row by row
/// starting from `min_y`. Every cell outside that window holds no sand.
/// The window only ever grows.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Grid {
	sand: Vec<u64>,
	width: u32,
	height: u32,
	min_x: i16,
	min_y: i16,
}

impl Grid {
	pub fn new() -> Grid {
		Grid::default()
	}

	/// Seeds a grid from `(x, y, sand)` triples; later duplicates win.
	pub fn from_cells<I>(cells: I) -> Grid
	where
		I: IntoIterator<Item = (i16, i16, u64)>,
	{
		let mut grid = Grid::new();
		for (x, y, sand) in cells {
			grid.set_sand(x, y, sand);
		}
		grid
	}

	pub fn width(&self) -> u32 {
		self.width
	}

	pub fn height(&self) -> u32 {
		self.height
	}

	pub fn min_x(&self) -> i16 {
		self.min_x
	}

	pub fn min_y(&self) -> i16 {
		self.min_y
	}

	/// Largest x inside the window. Meaningless for an empty grid.
	pub fn max_x(&self) -> i16 {
		self.max_x_wide() as i16
	}

	pub fn max_y(&self) -> i16 {
		self.max_y_wide() as i16
	}

	pub fn is_empty(&self) -> bool {
		self.width == 0
	}

	pub fn has_cell(&self, x: i16, y: i16) -> bool {
		self.index(x, y).is_some()
	}

	pub fn get_sand(&self, x: i16, y: i16) -> u64 {
		match self.index(x, y) {
			Some(i) => self.sand[i],
			None => 0,
		}
	}

	/// Like `get_sand`, but refuses coordinates outside the window.
	pub fn cell(&self, x: i16, y: i16) -> Result<u64> {
		self.index(x, y)
			.map(|i| self.sand[i])
			.ok_or(Error::GridBounds { x, y })
	}

	pub fn set_sand(&mut self, x: i16, y: i16, sand: u64) {
		if self.is_empty() {
			self.sand = vec![sand];
			self.width = 1;
			self.height = 1;
			self.min_x = x;
			self.min_y = y;
			return;
		}
		let (x_wide, y_wide) = (i32::from(x), i32::from(y));
		let to_left = (i32::from(self.min_x) - x_wide).max(0) as u32;
		let to_bottom = (i32::from(self.min_y) - y_wide).max(0) as u32;
		let to_right = (x_wide - self.max_x_wide()).max(0) as u32;
		let to_top = (y_wide - self.max_y_wide()).max(0) as u32;
		self.expand(to_left, to_bottom, to_right, to_top);
		if let Some(i) = self.index(x, y) {
			self.sand[i] = sand;
		}
	}

	pub fn add_sand(&mut self, x: i16, y: i16, sand: u64) {
		let current = self.get_sand(x, y);
		self.set_sand(x, y, current.saturating_add(sand));
	}

	/// Removes up to `sand` grains; the count bottoms out at zero.
	pub fn remove_sand(&mut self, x: i16, y: i16, sand: u64) {
		let current = self.get_sand(x, y);
		self.set_sand(x, y, current.saturating_sub(sand));
	}

	pub fn total_sand(&self) -> u64 {
		self.sand.iter().fold(0u64, |acc, s| acc.saturating_add(*s))
	}

	/// Every cell of the window as `(x, y, sand)`, bottom row first.
	pub fn cells(&self) -> impl Iterator<Item = (i16, i16, u64)> + '_ {
		let width = self.width.max(1) as usize;
		let (min_x, min_y) = (i32::from(self.min_x), i32::from(self.min_y));
		self.sand.iter().enumerate().map(move |(i, &sand)| {
			let x = min_x + (i % width) as i32;
			let y = min_y + (i / width) as i32;
			(x as i16, y as i16, sand)
		})
	}

	fn max_x_wide(&self) -> i32 {
		i32::from(self.min_x) + self.width as i32 - 1
	}

	fn max_y_wide(&self) -> i32 {
		i32::from(self.min_y) + self.height as i32 - 1
	}

	fn index(&self, x: i16, y: i16) -> Option<usize> {
		if self.is_empty() {
			return None;
		}
		let dx = i32::from(x) - i32::from(self.min_x);
		let dy = i32::from(y) - i32::from(self.min_y);
		if dx < 0 || dy < 0 || dx >= self.width as i32 || dy >= self.height as i32 {
			return None;
		}
		Some(dy as usize * self.width as usize + dx as usize)
	}

	// old (x, y) lands on new (x + to_left, y + to_bottom)
	fn expand(&mut self, to_left: u32, to_bottom: u32, to_right: u32, to_top: u32) {
		if to_left == 0 && to_bottom == 0 && to_right == 0 && to_top == 0 {
			return;
		}
		let width = self.width + to_left + to_right;
		let height = self.height + to_bottom + to_top;
		let mut sand = vec![0; width as usize * height as usize];
		for (row, old) in self.sand.chunks_exact(self.width as usize).enumerate() {
			let start = (row + to_bottom as usize) * width as usize + to_left as usize;
			sand[start..start + old.len()].copy_from_slice(old);
		}
		log::debug!(
			"grid window grows from {}x{} to {}x{}",
			self.width, self.height, width, height
		);
		self.sand = sand;
		self.width = width;
		self.height = height;
		self.min_x = (i32::from(self.min_x) - to_left as i32) as i16;
		self.min_y = (i32::from(self.min_y) - to_bottom as i32) as i16;
	}
}

impl fmt::Display for Grid {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		let vis = [' ', '.', ':', '&'];
		if self.is_empty() {
			return Ok(());
		}
		let width = self.width as usize;
		for row in self.sand.chunks_exact(width).rev() {
			let line: String = row.iter()
				.map(|s| vis.get(*s as usize).copied().unwrap_or('#'))
				.collect();
			writeln!(f, "{}", line)?;
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_grid_reads_zero() {
		let grid = Grid::new();
		assert!(grid.is_empty());
		assert_eq!(grid.get_sand(0, 0), 0);
		assert_eq!(grid.get_sand(i16::MIN, i16::MAX), 0);
		assert!(!grid.has_cell(0, 0));
	}

	#[test]
	fn first_write_seeds_single_cell_window() {
		let mut grid = Grid::new();
		grid.set_sand(-7, 12, 3);
		assert_eq!((grid.width(), grid.height()), (1, 1));
		assert_eq!((grid.min_x(), grid.min_y()), (-7, 12));
		assert_eq!((grid.max_x(), grid.max_y()), (-7, 12));
		assert_eq!(grid.get_sand(-7, 12), 3);
		assert!(grid.has_cell(-7, 12));
		assert!(!grid.has_cell(-6, 12));
	}

	#[test]
	fn growth_keeps_old_values_in_place() {
		let mut grid = Grid::new();
		grid.set_sand(0, 0, 1);
		grid.set_sand(1, 0, 2);
		grid.set_sand(0, 1, 3);
		grid.set_sand(-2, -3, 4);
		assert_eq!((grid.min_x(), grid.min_y()), (-2, -3));
		assert_eq!((grid.width(), grid.height()), (4, 5));
		assert_eq!(grid.get_sand(0, 0), 1);
		assert_eq!(grid.get_sand(1, 0), 2);
		assert_eq!(grid.get_sand(0, 1), 3);
		assert_eq!(grid.get_sand(-2, -3), 4);
		assert_eq!(grid.get_sand(-1, -1), 0);
		assert_eq!(grid.total_sand(), 10);
	}

	#[test]
	fn grows_on_every_side() {
		let mut grid = Grid::new();
		grid.set_sand(0, 0, 9);
		grid.set_sand(3, 0, 1);
		grid.set_sand(0, 4, 1);
		grid.set_sand(-5, 0, 1);
		grid.set_sand(0, -6, 1);
		assert_eq!((grid.min_x(), grid.max_x()), (-5, 3));
		assert_eq!((grid.min_y(), grid.max_y()), (-6, 4));
		assert_eq!((grid.width(), grid.height()), (9, 11));
		assert_eq!(grid.get_sand(0, 0), 9);
	}

	#[test]
	fn reads_never_grow() {
		let mut grid = Grid::new();
		grid.set_sand(0, 0, 1);
		assert_eq!(grid.get_sand(100, -100), 0);
		assert_eq!((grid.width(), grid.height()), (1, 1));
	}

	#[test]
	fn extreme_coordinates() {
		let mut grid = Grid::new();
		grid.set_sand(i16::MAX, i16::MAX, 1);
		grid.set_sand(i16::MAX - 2, i16::MAX - 1, 2);
		assert_eq!(grid.max_x(), i16::MAX);
		assert_eq!(grid.max_y(), i16::MAX);
		assert_eq!(grid.get_sand(i16::MAX, i16::MAX), 1);
		assert_eq!(grid.get_sand(i16::MAX - 2, i16::MAX - 1), 2);
		assert!(!grid.has_cell(i16::MIN, i16::MAX));
	}

	#[test]
	fn add_and_remove() {
		let mut grid = Grid::new();
		grid.add_sand(2, 2, 5);
		grid.add_sand(2, 2, 4);
		assert_eq!(grid.get_sand(2, 2), 9);
		grid.remove_sand(2, 2, 3);
		assert_eq!(grid.get_sand(2, 2), 6);
		grid.remove_sand(2, 2, 100);
		assert_eq!(grid.get_sand(2, 2), 0);
	}

	#[test]
	fn strict_accessor() {
		let grid = Grid::from_cells(vec![(1, 1, 5), (2, 3, 0)]);
		assert_eq!(grid.cell(1, 1).unwrap(), 5);
		assert_eq!(grid.cell(2, 1).unwrap(), 0);
		match grid.cell(0, 0) {
			Err(Error::GridBounds { x: 0, y: 0 }) => {},
			other => panic!("unexpected {:?}", other),
		}
	}

	#[test]
	fn cells_cover_window_bottom_first() {
		let grid = Grid::from_cells(vec![(0, 0, 1), (1, 1, 2)]);
		let cells: Vec<_> = grid.cells().collect();
		assert_eq!(cells, vec![(0, 0, 1), (1, 0, 0), (0, 1, 0), (1, 1, 2)]);
	}

	#[test]
	fn display_puts_top_row_first() {
		let grid = Grid::from_cells(vec![(0, 0, 1), (1, 1, 3), (1, 0, 7)]);
		assert_eq!(grid.to_string(), " &\n.#\n");
	}
}
