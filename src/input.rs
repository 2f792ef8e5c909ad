//! Initial sandpile from tab-separated text: one `x<TAB>y<TAB>sand` per line.

use std::{
	fs::File,
	io::{BufRead, BufReader},
	path::Path,
	str::FromStr,
};

use crate::{
	error::{Error, Result},
	grid::Grid,
};

fn field<T>(raw: &str, name: &str, line: usize) -> Result<T>
where
	T: FromStr,
	T::Err: std::fmt::Display,
{
	raw.trim().parse().map_err(|e| Error::Seed {
		line,
		message: format!("cannot parse {} from '{}': {}", name, raw, e),
	})
}

/// Reads `(x, y, sand)` triples. Blank lines are skipped.
pub fn parse_seeds<R: BufRead>(reader: R) -> Result<Vec<(i16, i16, u64)>> {
	let mut seeds = Vec::new();
	for (i, line) in reader.lines().enumerate() {
		let line = line?;
		let number = i + 1;
		let line = line.trim_end_matches('\r');
		if line.trim().is_empty() {
			continue;
		}
		let fields: Vec<_> = line.split('\t').collect();
		if fields.len() != 3 {
			return Err(Error::Seed {
				line: number,
				message: format!("expected exactly 2 tabs, found {}", fields.len() - 1),
			});
		}
		let x = field(fields[0], "x", number)?;
		let y = field(fields[1], "y", number)?;
		let sand = field(fields[2], "sand", number)?;
		seeds.push((x, y, sand));
	}
	Ok(seeds)
}

pub fn read_grid<P: AsRef<Path>>(path: P) -> Result<Grid> {
	let file = File::open(path.as_ref())?;
	let seeds = parse_seeds(BufReader::new(file))?;
	log::debug!("read {} seed cells from {}", seeds.len(), path.as_ref().display());
	Ok(Grid::from_cells(seeds))
}
