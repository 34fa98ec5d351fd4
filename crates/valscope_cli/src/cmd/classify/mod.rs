use valscope::inspect::Result;

use crate::cmd::util::{Selection, emit_json, ptr_hex};

#[derive(clap::Args)]
pub struct Args {
	#[command(flatten)]
	pub selection: Selection,
	#[arg(long)]
	pub json: bool,
}

/// Print the category, family, and layout recipe chosen for a value's type.
pub fn run(args: Args) -> Result<()> {
	let Args { selection, json } = args;

	let snapshot = selection.open()?;
	let ins = snapshot.inspector();
	let value = selection.value(&snapshot, &ins)?;
	let class = ins.classify_value(&value)?;
	let desc = ins.types().descriptor(value.ty)?;

	if json {
		let payload = ClassifyJson {
			symbol: selection.label(),
			type_name: desc.name.to_string(),
			size: desc.size,
			align: desc.align,
			address: value.address().map(ptr_hex),
			category: class.category.as_str(),
			family: class.family,
			recipe: class.recipe.map(|recipe| recipe.tag()),
		};
		return emit_json(&payload);
	}

	println!("symbol: {}", selection.label());
	println!("type: {}", desc.name);
	println!("size: {}", desc.size);
	println!("align: {}", desc.align);
	println!("address: {}", value.address().map(ptr_hex).unwrap_or_else(|| "-".to_owned()));
	println!("category: {}", class.category);
	println!("family: {}", class.family);
	println!("recipe: {}", class.recipe.map_or("-", |recipe| recipe.tag()));

	Ok(())
}

#[derive(serde::Serialize)]
struct ClassifyJson {
	symbol: String,
	#[serde(rename = "type")]
	type_name: String,
	size: usize,
	align: usize,
	address: Option<String>,
	category: &'static str,
	family: &'static str,
	recipe: Option<&'static str>,
}
