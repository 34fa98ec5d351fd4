use std::path::PathBuf;

use valscope::inspect::{Result, Snapshot};

use crate::cmd::util::{emit_json, ptr_hex};

#[derive(clap::Args)]
pub struct Args {
	pub snapshot: PathBuf,
	#[arg(long)]
	pub json: bool,
}

/// List captured symbols with their type, address, and category.
pub fn run(args: Args) -> Result<()> {
	let Args { snapshot: path, json } = args;

	let snapshot = Snapshot::open(&path)?;
	let ins = snapshot.inspector();
	let target = snapshot.target();

	let mut rows = Vec::with_capacity(snapshot.symbols().len());
	for symbol in snapshot.symbols() {
		let class = ins.classify_value(&symbol.value)?;
		rows.push(SymbolJson {
			name: symbol.name.clone(),
			type_name: ins.types().name(symbol.value.ty).to_owned(),
			address: symbol.value.address().map(ptr_hex),
			category: class.category.as_str(),
			family: class.family,
		});
	}

	if json {
		let payload = SymbolsJson {
			path: path.display().to_string(),
			compression: snapshot.compression.as_str(),
			pointer_size: target.pointer_size,
			endianness: target.endianness.as_str(),
			types: snapshot.types().len(),
			regions: snapshot.memory().len(),
			symbols: rows,
		};
		return emit_json(&payload);
	}

	println!("path: {}", path.display());
	println!("compression: {}", snapshot.compression.as_str());
	println!("pointer_size: {}", target.pointer_size);
	println!("endianness: {}", target.endianness.as_str());
	println!("types: {}", snapshot.types().len());
	println!("regions: {}", snapshot.memory().len());
	println!("symbols:");
	for row in rows {
		println!(
			"  {} {} {} [{}]",
			row.name,
			row.address.as_deref().unwrap_or("-"),
			row.type_name,
			row.category
		);
	}

	Ok(())
}

#[derive(serde::Serialize)]
struct SymbolsJson {
	path: String,
	compression: &'static str,
	pointer_size: usize,
	endianness: &'static str,
	types: usize,
	regions: usize,
	symbols: Vec<SymbolJson>,
}

#[derive(serde::Serialize)]
struct SymbolJson {
	name: String,
	#[serde(rename = "type")]
	type_name: String,
	address: Option<String>,
	category: &'static str,
	family: &'static str,
}
