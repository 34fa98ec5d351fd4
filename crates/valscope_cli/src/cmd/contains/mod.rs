use valscope::inspect::{Operand, Result};

use crate::cmd::util::{Selection, emit_json, operand_label, parse_operand};

#[derive(clap::Args)]
pub struct Args {
	#[command(flatten)]
	pub selection: Selection,
	/// Element, key, substring, or symbol name to look for.
	pub item: String,
	#[arg(long)]
	pub json: bool,
}

#[derive(clap::Args)]
pub struct ValuesArgs {
	#[command(flatten)]
	pub selection: Selection,
	/// Mapped value literal or symbol name to look for.
	pub item: String,
	#[arg(long)]
	pub json: bool,
}

/// Test whether a container holds an element (or key), or text holds a substring.
pub fn run(args: Args) -> Result<()> {
	let Args { selection, item, json } = args;
	membership(&selection, &item, json, Mode::Contains)
}

/// Test whether an associative container maps some key to the given value.
pub fn run_values(args: ValuesArgs) -> Result<()> {
	let ValuesArgs { selection, item, json } = args;
	membership(&selection, &item, json, Mode::Values)
}

#[derive(Clone, Copy)]
enum Mode {
	Contains,
	Values,
}

impl Mode {
	fn as_str(self) -> &'static str {
		match self {
			Self::Contains => "contains",
			Self::Values => "values_contain",
		}
	}
}

fn membership(selection: &Selection, item: &str, json: bool, mode: Mode) -> Result<()> {
	let snapshot = selection.open()?;
	let ins = snapshot.inspector();
	let container = Operand::from(selection.value(&snapshot, &ins)?);
	let item = parse_operand(&snapshot, item);
	let result = match mode {
		Mode::Contains => ins.contains(&container, &item)?,
		Mode::Values => ins.values_contain(&container, &item)?,
	};

	if json {
		let payload = ContainsJson {
			symbol: selection.label(),
			test: mode.as_str(),
			item: operand_label(&ins, &item),
			result,
		};
		return emit_json(&payload);
	}

	println!("{} {} {}: {result}", selection.label(), mode.as_str(), operand_label(&ins, &item));

	Ok(())
}

#[derive(serde::Serialize)]
struct ContainsJson {
	symbol: String,
	test: &'static str,
	item: String,
	result: bool,
}
