use valscope::inspect::Result;

use crate::cmd::util::{Selection, ValueJson, emit_json};

#[derive(clap::Args)]
pub struct Args {
	#[command(flatten)]
	pub selection: Selection,
	/// Repeat until the value stops being pointer-like.
	#[arg(short = 'r', long)]
	pub recursive: bool,
	#[arg(long)]
	pub json: bool,
}

/// Dereference a value once, or until it stops being pointer-like.
pub fn run(args: Args) -> Result<()> {
	let Args { selection, recursive, json } = args;

	let snapshot = selection.open()?;
	let ins = snapshot.inspector();
	let start = selection.value(&snapshot, &ins)?;
	let target = ins.deref(&start, recursive)?;

	let from = ValueJson::describe(&ins, &start)?;
	let to = ValueJson::describe(&ins, &target)?;

	if json {
		let payload = DerefJson {
			symbol: selection.label(),
			recursive,
			from,
			to,
		};
		return emit_json(&payload);
	}

	println!("symbol: {}", selection.label());
	println!("recursive: {recursive}");
	println!("from: {}", from.line());
	println!("to: {}", to.line());

	Ok(())
}

#[derive(serde::Serialize)]
struct DerefJson {
	symbol: String,
	recursive: bool,
	from: ValueJson,
	to: ValueJson,
}
