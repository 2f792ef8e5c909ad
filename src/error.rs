use std::{
	io,
	path::PathBuf,
};

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
	/// Strict accessor used on a coordinate outside the grid window.
	#[error("cell ({x}, {y}) is outside the grid window")]
	GridBounds {
		x: i16,
		y: i16,
	},

	#[error("palette must hold between 2 and 256 colors, got {0}")]
	PaletteSize(usize),

	#[error("color index {index} is out of range for a palette of {palette_size} colors")]
	PaletteIndex {
		index: u8,
		palette_size: usize,
	},

	#[error("expected {expected} pixels, got {actual}")]
	PixelCount {
		expected: usize,
		actual: usize,
	},

	#[error("cannot encode an image with zero width or height")]
	EmptyImage,

	#[error("a {width}x{height} image does not fit in a bitmap file")]
	ImageTooLarge {
		width: u32,
		height: u32,
	},

	#[error("I/O error: {0}")]
	Io(#[from] io::Error),

	/// A snapshot sink failed; `source` is what went wrong.
	#[error("cannot save snapshot {}: {source}", .path.display())]
	Snapshot {
		path: PathBuf,
		source: Box<Error>,
	},

	#[error("the previous run failed, the sandpile cannot be resumed")]
	Aborted,

	#[error("invalid configuration: {0}")]
	InvalidConfig(String),

	#[error("line {line}: {message}")]
	Seed {
		line: usize,
		message: String,
	},
}
