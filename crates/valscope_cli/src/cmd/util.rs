use std::path::PathBuf;

use serde::Serialize;
use tracing::debug;
use valscope::inspect::{InspectError, InspectOptions, InspectedValue, Inspector, Location, Operand, Primitive, Result, Snapshot};

/// Snapshot file, root symbol, and traversal overrides shared by value commands.
#[derive(clap::Args)]
pub struct Selection {
	/// Snapshot file (JSON, optionally zstd-compressed).
	pub snapshot: PathBuf,
	/// Symbol naming the root value.
	pub symbol: String,
	/// Dotted member path projected from the symbol before the command runs.
	#[arg(long = "path")]
	pub member: Option<String>,
	/// Override the recursive dereference depth budget.
	#[arg(long = "max-depth")]
	pub max_depth: Option<usize>,
	/// Override the string read cap in bytes.
	#[arg(long = "max-string")]
	pub max_string: Option<usize>,
	/// Reject single-step dereference of non-pointer values.
	#[arg(long)]
	pub strict: bool,
}

impl Selection {
	/// Open the snapshot and apply command-line overrides to its embedded options.
	pub(crate) fn open(&self) -> Result<Snapshot> {
		let mut snapshot = Snapshot::open(&self.snapshot)?;
		let options = self.apply(snapshot.options());
		snapshot.set_options(options);
		Ok(snapshot)
	}

	/// Resolve the selected value: the symbol, then the optional member path.
	pub(crate) fn value(&self, snapshot: &Snapshot, ins: &Inspector<'_>) -> Result<InspectedValue> {
		let root = snapshot.symbol(&self.symbol)?;
		let value = match &self.member {
			Some(path) => ins.member(root, path)?,
			None => root.clone(),
		};
		debug!(selection = %self.label(), value = %ins.describe(&value), "selected value");
		Ok(value)
	}

	/// Label of the selected value (`symbol` or `symbol.path`).
	pub(crate) fn label(&self) -> String {
		match &self.member {
			Some(path) => format!("{}.{path}", self.symbol),
			None => self.symbol.clone(),
		}
	}

	fn apply(&self, mut options: InspectOptions) -> InspectOptions {
		if let Some(depth) = self.max_depth {
			options.max_deref_depth = depth;
		}
		if let Some(max) = self.max_string {
			options.max_string_len = max;
		}
		if self.strict {
			options.strict_deref = true;
		}
		options
	}
}

/// Parse a command-line operand: a snapshot symbol first, then integer, float, bool, or text.
pub(crate) fn parse_operand(snapshot: &Snapshot, text: &str) -> Operand {
	if let Some(value) = snapshot.find_symbol(text) {
		return Operand::from(value.clone());
	}
	if let Ok(value) = text.parse::<i64>() {
		return Operand::from(value);
	}
	if let Ok(value) = text.parse::<u64>() {
		return Operand::from(value);
	}
	if let Ok(value) = text.parse::<f64>() {
		return Operand::from(value);
	}
	match text {
		"true" => Operand::from(true),
		"false" => Operand::from(false),
		_ => Operand::from(unquote(text)),
	}
}

fn unquote(text: &str) -> &str {
	text.strip_prefix('"').and_then(|inner| inner.strip_suffix('"')).unwrap_or(text)
}

/// Summary of one inspected value for output.
#[derive(Debug, Serialize)]
pub(crate) struct ValueJson {
	#[serde(rename = "type")]
	pub type_name: String,
	pub address: Option<String>,
	pub category: &'static str,
	pub value: Option<Primitive>,
}

impl ValueJson {
	/// Describe `value`, attaching its primitive form when it has one.
	pub(crate) fn describe(ins: &Inspector<'_>, value: &InspectedValue) -> Result<Self> {
		let class = ins.classify_value(value)?;
		Ok(Self {
			type_name: ins.types().name(value.ty).to_owned(),
			address: value.address().map(ptr_hex),
			category: class.category.as_str(),
			value: ins.coerce_value(value).ok(),
		})
	}

	/// One-line `type @ address = value` rendering.
	pub(crate) fn line(&self) -> String {
		let mut out = self.type_name.clone();
		if let Some(address) = &self.address {
			out.push_str(" @ ");
			out.push_str(address);
		}
		if let Some(value) = &self.value {
			out.push_str(" = ");
			out.push_str(&value.to_string());
		}
		out
	}
}

/// Render a native operand or process value label.
pub(crate) fn operand_label(ins: &Inspector<'_>, operand: &Operand) -> String {
	match operand {
		Operand::Native(prim) => prim.to_string(),
		Operand::Value(value) => match value.location {
			Location::Address(_) => ins.describe(value),
			Location::Inline(_) => ins.types().name(value.ty).to_owned(),
		},
	}
}

/// Print `payload` as pretty JSON on stdout.
pub(crate) fn emit_json<T: Serialize>(payload: &T) -> Result<()> {
	let text = serde_json::to_string_pretty(payload).map_err(InspectError::Json)?;
	println!("{text}");
	Ok(())
}

/// Render an address as fixed-width hex.
pub(crate) fn ptr_hex(value: u64) -> String {
	format!("0x{value:016x}")
}
