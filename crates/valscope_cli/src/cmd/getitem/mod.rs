use valscope::inspect::Result;

use crate::cmd::util::{Selection, ValueJson, emit_json, operand_label, parse_operand};

#[derive(clap::Args)]
pub struct Args {
	#[command(flatten)]
	pub selection: Selection,
	/// Index, key literal, or symbol name.
	pub key: String,
	#[arg(long)]
	pub json: bool,
}

/// Look up one element of a container by index or key.
pub fn run(args: Args) -> Result<()> {
	let Args { selection, key, json } = args;

	let snapshot = selection.open()?;
	let ins = snapshot.inspector();
	let container = ins.deref(&selection.value(&snapshot, &ins)?, true)?;
	let key = parse_operand(&snapshot, &key);
	let item = ins.get_item(&container, &key)?;
	let item_json = ValueJson::describe(&ins, &item)?;

	if json {
		let payload = GetItemJson {
			symbol: selection.label(),
			key: operand_label(&ins, &key),
			item: item_json,
		};
		return emit_json(&payload);
	}

	println!("symbol: {}", selection.label());
	println!("key: {}", operand_label(&ins, &key));
	println!("item: {}", item_json.line());

	Ok(())
}

#[derive(serde::Serialize)]
struct GetItemJson {
	symbol: String,
	key: String,
	item: ValueJson,
}
