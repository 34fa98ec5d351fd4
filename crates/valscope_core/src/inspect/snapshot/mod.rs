use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use crate::inspect::{
	Field, InspectError, InspectOptions, InspectedValue, Inspector, Region, RegionMap, Result, TargetInfo, TemplateArg, TypeDescriptor, TypeId,
	TypeKind, TypeTable,
};

mod compression;

pub use compression::{Compression, ZSTD_MAGIC, decode_bytes};

/// Named value captured in a snapshot.
#[derive(Debug, Clone)]
pub struct Symbol {
	/// Symbol name.
	pub name: String,
	/// Typed value at the symbol address.
	pub value: InspectedValue,
}

/// Offline process image: types, memory regions, and named values.
pub struct Snapshot {
	/// Compression mode of the source bytes.
	pub compression: Compression,
	target: TargetInfo,
	options: InspectOptions,
	types: TypeTable,
	memory: RegionMap,
	symbols: Vec<Symbol>,
	by_name: HashMap<String, usize>,
}

impl Snapshot {
	/// Read, decompress, and load a snapshot file.
	pub fn open(path: impl AsRef<Path>) -> Result<Self> {
		let path = path.as_ref();
		let snapshot = Self::from_bytes(fs::read(path)?)?;
		debug!(path = %path.display(), compression = snapshot.compression.as_str(), "opened snapshot");
		Ok(snapshot)
	}

	/// Load a snapshot from raw (optionally zstd-compressed) bytes.
	pub fn from_bytes(raw: Vec<u8>) -> Result<Self> {
		let (compression, bytes) = decode_bytes(raw)?;
		let file: SnapshotFile = serde_json::from_slice(&bytes)?;
		let mut snapshot = Self::build(file)?;
		snapshot.compression = compression;
		Ok(snapshot)
	}

	/// Load a snapshot from JSON text.
	pub fn from_json_str(json: &str) -> Result<Self> {
		Self::build(serde_json::from_str(json)?)
	}

	/// Target pointer width and byte order.
	pub fn target(&self) -> TargetInfo {
		self.target
	}

	/// Traversal limits embedded in the snapshot.
	pub fn options(&self) -> InspectOptions {
		self.options
	}

	/// Replace the embedded traversal limits.
	pub fn set_options(&mut self, options: InspectOptions) {
		self.options = options;
	}

	/// Loaded type table.
	pub fn types(&self) -> &TypeTable {
		&self.types
	}

	/// Captured memory.
	pub fn memory(&self) -> &RegionMap {
		&self.memory
	}

	/// Symbols in file order.
	pub fn symbols(&self) -> &[Symbol] {
		&self.symbols
	}

	/// Look up a symbol value by name.
	pub fn symbol(&self, name: &str) -> Result<&InspectedValue> {
		self.find_symbol(name).ok_or_else(|| InspectError::UnknownSymbol { name: name.to_owned() })
	}

	/// Look up a symbol value by name, returning `None` when absent.
	pub fn find_symbol(&self, name: &str) -> Option<&InspectedValue> {
		self.by_name.get(name).map(|idx| &self.symbols[*idx].value)
	}

	/// Build an inspector over this snapshot using its embedded options.
	pub fn inspector(&self) -> Inspector<'_> {
		Inspector::new(&self.types, &self.memory, self.target).with_options(self.options)
	}

	fn build(file: SnapshotFile) -> Result<Self> {
		file.target.validate()?;
		let ptr = file.target.pointer_size;

		let mut types = TypeTable::new();
		for spec in &file.types {
			types.declare(&spec.name);
		}
		for spec in &file.types {
			let id = types.declare(&spec.name);
			let desc = spec.to_descriptor(&mut types, ptr)?;
			types.define(id, desc)?;
		}

		let regions = file
			.regions
			.iter()
			.map(|region| -> Result<Region> {
				Ok(Region {
					start: region.address.parse()?,
					bytes: parse_hex(&region.bytes)?,
				})
			})
			.collect::<Result<Vec<_>>>()?;
		let memory = RegionMap::new(regions)?;

		let mut symbols = Vec::with_capacity(file.symbols.len());
		let mut by_name = HashMap::new();
		for spec in &file.symbols {
			let ty = resolve_type_ref(&mut types, &spec.ty, ptr)?;
			by_name.insert(spec.name.clone(), symbols.len());
			symbols.push(Symbol {
				name: spec.name.clone(),
				value: InspectedValue::at(ty, spec.address.parse()?),
			});
		}

		debug!(
			types = types.len(),
			regions = memory.len(),
			symbols = symbols.len(),
			pointer_size = ptr,
			"loaded snapshot"
		);

		Ok(Self {
			compression: Compression::None,
			target: file.target,
			options: file.options,
			types,
			memory,
			symbols,
			by_name,
		})
	}
}

#[derive(Debug, Deserialize)]
struct SnapshotFile {
	#[serde(default)]
	target: TargetInfo,
	#[serde(default)]
	options: InspectOptions,
	#[serde(default)]
	types: Vec<TypeSpec>,
	#[serde(default)]
	regions: Vec<RegionSpec>,
	#[serde(default)]
	symbols: Vec<SymbolSpec>,
}

#[derive(Debug, Deserialize)]
struct TypeSpec {
	name: String,
	#[serde(default)]
	size: usize,
	#[serde(default)]
	align: Option<usize>,
	#[serde(flatten)]
	kind: KindSpec,
	#[serde(default)]
	template_args: Vec<ArgSpec>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum KindSpec {
	Opaque,
	Void,
	Bool,
	Int {
		#[serde(default = "signed_by_default")]
		signed: bool,
	},
	Char {
		#[serde(default = "signed_by_default")]
		signed: bool,
	},
	Float,
	Enum {
		#[serde(default = "signed_by_default")]
		signed: bool,
	},
	Pointer {
		target: String,
	},
	Array {
		elem: String,
		len: usize,
	},
	Struct {
		#[serde(default)]
		fields: Vec<FieldSpec>,
	},
}

fn signed_by_default() -> bool {
	true
}

#[derive(Debug, Deserialize)]
struct FieldSpec {
	name: String,
	offset: usize,
	#[serde(rename = "type")]
	ty: String,
	#[serde(default)]
	base: bool,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ArgSpec {
	Const(i64),
	Type(String),
}

#[derive(Debug, Deserialize)]
struct RegionSpec {
	address: AddrSpec,
	bytes: String,
}

#[derive(Debug, Deserialize)]
struct SymbolSpec {
	name: String,
	#[serde(rename = "type")]
	ty: String,
	address: AddrSpec,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum AddrSpec {
	Number(u64),
	Text(String),
}

impl AddrSpec {
	fn parse(&self) -> Result<u64> {
		match self {
			Self::Number(value) => Ok(*value),
			Self::Text(text) => parse_address(text),
		}
	}
}

impl TypeSpec {
	fn to_descriptor(&self, types: &mut TypeTable, ptr: usize) -> Result<TypeDescriptor> {
		let kind = match &self.kind {
			KindSpec::Opaque => TypeKind::Opaque,
			KindSpec::Void => TypeKind::Void,
			KindSpec::Bool => TypeKind::Bool,
			KindSpec::Int { signed } => TypeKind::Int { signed: *signed },
			KindSpec::Char { signed } => TypeKind::Char { signed: *signed },
			KindSpec::Float => TypeKind::Float,
			KindSpec::Enum { signed } => TypeKind::Enum { signed: *signed },
			KindSpec::Pointer { target } => TypeKind::Pointer {
				target: resolve_type_ref(types, target, ptr)?,
			},
			KindSpec::Array { elem, len } => TypeKind::Array {
				elem: resolve_type_ref(types, elem, ptr)?,
				len: *len,
			},
			KindSpec::Struct { fields } => TypeKind::Struct {
				fields: fields
					.iter()
					.map(|field| -> Result<Field> {
						Ok(Field {
							name: field.name.as_str().into(),
							offset: field.offset,
							ty: resolve_type_ref(types, &field.ty, ptr)?,
							is_base: field.base,
						})
					})
					.collect::<Result<Vec<_>>>()?,
			},
		};

		let size = match kind {
			TypeKind::Pointer { .. } if self.size == 0 => ptr,
			TypeKind::Array { elem, len } if self.size == 0 => types.size_of(elem).saturating_mul(len),
			_ => self.size,
		};
		let align = match (self.align, &kind) {
			(Some(align), _) => align,
			(None, TypeKind::Pointer { .. }) => ptr,
			(None, TypeKind::Array { elem, .. }) => types.align_of(*elem),
			(None, _) => natural_align(size),
		};

		let template_args = self
			.template_args
			.iter()
			.map(|arg| match arg {
				ArgSpec::Const(value) => Ok(TemplateArg::Const(*value)),
				ArgSpec::Type(name) => resolve_type_ref(types, name, ptr).map(TemplateArg::Type),
			})
			.collect::<Result<Vec<_>>>()?;

		Ok(TypeDescriptor::new(&self.name, size, align, kind).with_template_args(template_args))
	}
}

/// Resolve a type reference, synthesizing `T *` and `T [N]` from known element types.
fn resolve_type_ref(types: &mut TypeTable, name: &str, ptr: usize) -> Result<TypeId> {
	if let Some(id) = types.lookup(name) {
		return Ok(id);
	}

	let trimmed = name.trim();
	if let Some(inner) = trimmed.strip_suffix('*') {
		let target = resolve_type_ref(types, inner, ptr)?;
		return Ok(types.pointer_to(target, ptr));
	}
	if let Some(head) = trimmed.strip_suffix(']')
		&& let Some(open) = head.rfind('[')
		&& let Ok(len) = head[open + 1..].trim().parse::<usize>()
	{
		let elem = resolve_type_ref(types, &head[..open], ptr)?;
		return Ok(types.array_of(elem, len));
	}

	Err(InspectError::UnknownType { name: name.to_owned() })
}

/// Largest power of two dividing `size`, capped at 8.
fn natural_align(size: usize) -> usize {
	if size == 0 { 1 } else { (1_usize << size.trailing_zeros()).min(8) }
}

fn parse_address(text: &str) -> Result<u64> {
	let text = text.trim();
	let parsed = match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
		Some(hex) => u64::from_str_radix(hex, 16),
		None => text.parse::<u64>(),
	};
	parsed.map_err(|_| InspectError::InvalidLiteral {
		what: "address",
		value: text.to_owned(),
	})
}

fn parse_hex(text: &str) -> Result<Vec<u8>> {
	let digits: Vec<u8> = text.bytes().filter(|byte| !byte.is_ascii_whitespace()).collect();
	let invalid = || InspectError::InvalidLiteral {
		what: "hex",
		value: text.chars().take(32).collect(),
	};
	if digits.len() % 2 != 0 {
		return Err(invalid());
	}

	digits
		.chunks_exact(2)
		.map(|pair| {
			let pair = std::str::from_utf8(pair).map_err(|_| invalid())?;
			u8::from_str_radix(pair, 16).map_err(|_| invalid())
		})
		.collect()
}
