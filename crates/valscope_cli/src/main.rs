#![allow(missing_docs)]

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod cmd;

#[derive(Parser)]
#[command(name = "valscope", about = "Inspect typed values in captured process memory")]
struct Cli {
	#[command(subcommand)]
	command: Commands,
}

#[derive(Subcommand)]
enum Commands {
	/// List symbols captured in a snapshot.
	Symbols(cmd::symbols::Args),
	/// Report the category and layout recipe of a symbol's type.
	Classify(cmd::classify::Args),
	/// Follow pointer-like indirection.
	Deref(cmd::deref::Args),
	/// Reduce a value to a native primitive.
	Coerce(cmd::coerce::Args),
	/// Look up one element by index or key.
	Getitem(cmd::getitem::Args),
	/// List the elements of a container.
	Iter(cmd::iter::Args),
	/// Report element count (or character count for strings).
	Len(cmd::len::Args),
	/// Compare a value against another operand.
	Compare(cmd::compare::Args),
	/// Test container or text membership.
	Contains(cmd::contains::Args),
	/// Test membership among the mapped values of an associative container.
	ValuesContain(cmd::contains::ValuesArgs),
}

fn main() {
	init_tracing();

	if let Err(err) = run() {
		eprintln!("error: {err}");
		std::process::exit(1);
	}
}

fn init_tracing() {
	let filter = EnvFilter::try_from_env("VALSCOPE_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
	tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).with_target(false).init();
}

fn run() -> valscope::inspect::Result<()> {
	let cli = Cli::parse();

	match cli.command {
		Commands::Symbols(args) => cmd::symbols::run(args),
		Commands::Classify(args) => cmd::classify::run(args),
		Commands::Deref(args) => cmd::deref::run(args),
		Commands::Coerce(args) => cmd::coerce::run(args),
		Commands::Getitem(args) => cmd::getitem::run(args),
		Commands::Iter(args) => cmd::iter::run(args),
		Commands::Len(args) => cmd::len::run(args),
		Commands::Compare(args) => cmd::compare::run(args),
		Commands::Contains(args) => cmd::contains::run(args),
		Commands::ValuesContain(args) => cmd::contains::run_values(args),
	}
}
