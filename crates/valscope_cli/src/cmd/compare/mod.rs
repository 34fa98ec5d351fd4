use valscope::inspect::{CompareOp, Operand, Result};

use crate::cmd::util::{Selection, emit_json, operand_label, parse_operand};

#[derive(clap::Args)]
pub struct Args {
	#[command(flatten)]
	pub selection: Selection,
	/// Operator: `==`, `!=`, `<`, `<=`, `>`, `>=` (or `eq`, `ne`, `lt`, `le`, `gt`, `ge`).
	pub op: String,
	/// Right-hand literal or symbol name.
	pub rhs: String,
	#[arg(long)]
	pub json: bool,
}

/// Compare the selected value against a literal or another symbol.
pub fn run(args: Args) -> Result<()> {
	let Args { selection, op, rhs, json } = args;

	let op: CompareOp = op.parse()?;
	let snapshot = selection.open()?;
	let ins = snapshot.inspector();
	let lhs = Operand::from(selection.value(&snapshot, &ins)?);
	let rhs = parse_operand(&snapshot, &rhs);
	let result = ins.compare(&lhs, &rhs, op)?;

	if json {
		let payload = CompareJson {
			symbol: selection.label(),
			op: op.to_string(),
			rhs: operand_label(&ins, &rhs),
			result,
		};
		return emit_json(&payload);
	}

	println!("{} {op} {}: {result}", selection.label(), operand_label(&ins, &rhs));

	Ok(())
}

#[derive(serde::Serialize)]
struct CompareJson {
	symbol: String,
	op: String,
	rhs: String,
	result: bool,
}
