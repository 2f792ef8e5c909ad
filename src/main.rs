use sandpile_bmp::{
	input,
	OutputConfig,
	Sandpile,
	SandpileConfig,
	DEFAULT_CRITICAL_SAND_NUMBER,
	DEFAULT_EXTENSION,
};

use std::{
	error::Error,
	path::PathBuf,
	process::ExitCode,
};

use clap::Parser;

/// Topples an abelian sandpile until it is stable and saves its states as bitmaps.
#[derive(Parser, Debug)]
#[command(name = "sandpile-bmp", version, about, long_about = None)]
struct Args {
	/// Tab-separated file with the initial state, one `x<TAB>y<TAB>sand` per line
	#[arg(short, long, value_parser = existing_file)]
	input: PathBuf,

	/// Directory where the states of the sandpile are saved
	#[arg(short, long)]
	output: PathBuf,

	/// Maximal amount of iterations (0 = until stable)
	#[arg(short, long = "max-iter", default_value_t = 0)]
	max_iter: u64,

	/// Save every N-th state; 0 saves only the final one
	#[arg(short, long, default_value_t = 0)]
	freq: u64,

	/// Grains at which a cell topples
	#[arg(short, long, default_value_t = DEFAULT_CRITICAL_SAND_NUMBER)]
	critical: u64,

	/// Prepended to every output file name
	#[arg(long, default_value = "")]
	prefix: String,

	/// Output file extension
	#[arg(long, default_value = DEFAULT_EXTENSION)]
	extension: String,

	/// Print the final state as text
	#[arg(short, long)]
	ascii: bool,
}

fn existing_file(s: &str) -> Result<PathBuf, String> {
	let path = PathBuf::from(s);
	if path.is_file() {
		Ok(path)
	} else {
		Err(format!("cannot find input file {}", s))
	}
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
	let grid = input::read_grid(&args.input)?;
	let output = OutputConfig::new(args.output)
		.with_prefix(args.prefix)
		.with_extension(args.extension);
	let config = SandpileConfig::default()
		.with_critical_sand_number(args.critical)
		.with_max_iterations(args.max_iter)
		.with_snapshot_frequency(args.freq)
		.with_output(output);
	let mut sandpile = Sandpile::new(grid, config)?;
	let iterations = sandpile.run()?;
	let grid = sandpile.into_grid();
	if args.ascii {
		print!("{}", grid);
	}
	println!("Final grid size: {}x{}", grid.width(), grid.height());
	println!("Calculation took {} iterations", iterations);
	Ok(())
}

fn main() -> ExitCode {
	env_logger::init();
	let args = Args::parse();
	match run(args) {
		Ok(()) => ExitCode::SUCCESS,
		Err(e) => {
			eprintln!("{}", e);
			ExitCode::FAILURE
		},
	}
}
