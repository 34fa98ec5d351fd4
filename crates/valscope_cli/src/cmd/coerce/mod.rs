use valscope::inspect::{Primitive, Result};

use crate::cmd::util::{Selection, emit_json};

#[derive(clap::Args)]
pub struct Args {
	#[command(flatten)]
	pub selection: Selection,
	#[arg(long)]
	pub json: bool,
}

/// Dereference a value fully and print its native primitive.
pub fn run(args: Args) -> Result<()> {
	let Args { selection, json } = args;

	let snapshot = selection.open()?;
	let ins = snapshot.inspector();
	let value = selection.value(&snapshot, &ins)?;
	let target = ins.deref(&value, true)?;
	let prim = ins.coerce_value(&target)?;

	if json {
		let payload = CoerceJson {
			symbol: selection.label(),
			kind: prim.kind_name(),
			value: prim,
		};
		return emit_json(&payload);
	}

	println!("symbol: {}", selection.label());
	println!("kind: {}", prim.kind_name());
	println!("value: {prim}");

	Ok(())
}

#[derive(serde::Serialize)]
struct CoerceJson {
	symbol: String,
	kind: &'static str,
	value: Primitive,
}
