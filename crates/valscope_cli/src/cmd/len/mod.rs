use valscope::inspect::Result;

use crate::cmd::util::{Selection, emit_json};

#[derive(clap::Args)]
pub struct Args {
	#[command(flatten)]
	pub selection: Selection,
	#[arg(long)]
	pub json: bool,
}

/// Print the element count of a container or the character count of a string.
pub fn run(args: Args) -> Result<()> {
	let Args { selection, json } = args;

	let snapshot = selection.open()?;
	let ins = snapshot.inspector();
	let value = ins.deref(&selection.value(&snapshot, &ins)?, true)?;
	let len = ins.len(&value)?;
	let storage = ins.storage(&value)?.map(|storage| storage.as_str());

	if json {
		let payload = LenJson {
			symbol: selection.label(),
			len,
			storage,
		};
		return emit_json(&payload);
	}

	println!("symbol: {}", selection.label());
	println!("len: {len}");
	if let Some(storage) = storage {
		println!("storage: {storage}");
	}

	Ok(())
}

#[derive(serde::Serialize)]
struct LenJson {
	symbol: String,
	len: usize,
	#[serde(skip_serializing_if = "Option::is_none")]
	storage: Option<&'static str>,
}
