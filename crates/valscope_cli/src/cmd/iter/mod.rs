use valscope::inspect::{Item, Result};

use crate::cmd::util::{Selection, ValueJson, emit_json, operand_label};

#[derive(clap::Args)]
pub struct Args {
	#[command(flatten)]
	pub selection: Selection,
	/// Stop after this many elements.
	#[arg(long)]
	pub limit: Option<usize>,
	#[arg(long)]
	pub json: bool,
}

/// List the elements (or key/value entries) of a container in storage order.
pub fn run(args: Args) -> Result<()> {
	let Args { selection, limit, json } = args;

	let snapshot = selection.open()?;
	let ins = snapshot.inspector();
	let container = ins.deref(&selection.value(&snapshot, &ins)?, true)?;
	let items = ins.iterate(&container)?;
	let reported_len = items.reported_len();

	let mut rows = Vec::new();
	let mut truncated = false;
	for item in items {
		if limit.is_some_and(|limit| rows.len() >= limit) {
			truncated = true;
			break;
		}
		let row = match item? {
			Item::Indexed { index, value } => ItemJson {
				index: Some(index),
				key: None,
				value: ValueJson::describe(&ins, &value)?,
			},
			Item::Keyed { key, value } => ItemJson {
				index: None,
				key: Some(match ins.coerce(&key) {
					Ok(prim) => prim.to_string(),
					Err(_) => operand_label(&ins, &key),
				}),
				value: ValueJson::describe(&ins, &value)?,
			},
		};
		rows.push(row);
	}

	if json {
		let payload = IterJson {
			symbol: selection.label(),
			reported_len,
			truncated,
			items: rows,
		};
		return emit_json(&payload);
	}

	println!("symbol: {}", selection.label());
	println!("reported_len: {}", reported_len.map_or_else(|| "-".to_owned(), |len| len.to_string()));
	for row in &rows {
		match (&row.index, &row.key) {
			(Some(index), _) => println!("  [{index}] {}", row.value.line()),
			(None, Some(key)) => println!("  [{key}] {}", row.value.line()),
			(None, None) => println!("  {}", row.value.line()),
		}
	}
	if truncated {
		println!("  ...");
	}

	Ok(())
}

#[derive(serde::Serialize)]
struct IterJson {
	symbol: String,
	reported_len: Option<usize>,
	truncated: bool,
	items: Vec<ItemJson>,
}

#[derive(serde::Serialize)]
struct ItemJson {
	#[serde(skip_serializing_if = "Option::is_none")]
	index: Option<usize>,
	#[serde(skip_serializing_if = "Option::is_none")]
	key: Option<String>,
	value: ValueJson,
}
