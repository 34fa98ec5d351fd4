//! Shared test helpers for workspace crates.

use std::path::{Path, PathBuf};

use serde_json::{Value, json};

/// Resolve the workspace root path.
pub fn workspace_root() -> PathBuf {
	let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
	manifest_dir
		.join("..")
		.join("..")
		.canonicalize()
		.unwrap_or_else(|_| manifest_dir.join("..").join(".."))
}

/// Resolve a fixture path under `<workspace>/fixtures`.
pub fn fixture_path(name: &str) -> PathBuf {
	workspace_root().join("fixtures").join(name)
}

/// Resolve the workspace target directory.
pub fn target_dir() -> PathBuf {
	std::env::var_os("CARGO_TARGET_DIR")
		.map(PathBuf::from)
		.unwrap_or_else(|| workspace_root().join("target"))
}

/// Little-endian process image assembled allocation by allocation.
///
/// Addresses start at `base` and grow upward; every allocation is zero-filled.
#[derive(Debug, Clone)]
pub struct HeapImage {
	base: u64,
	pointer_size: usize,
	bytes: Vec<u8>,
}

impl HeapImage {
	/// Empty 64-bit image starting at `base`.
	pub fn new(base: u64) -> Self {
		Self {
			base,
			pointer_size: 8,
			bytes: Vec::new(),
		}
	}

	/// Empty image with a custom pointer width.
	pub fn with_pointer_size(base: u64, pointer_size: usize) -> Self {
		Self {
			base,
			pointer_size,
			bytes: Vec::new(),
		}
	}

	/// Reserve `size` zeroed bytes aligned to `align` and return the address.
	pub fn alloc(&mut self, size: usize, align: usize) -> u64 {
		let align = align.max(1) as u64;
		let end = self.base + self.bytes.len() as u64;
		let addr = end.div_ceil(align) * align;
		let new_len = (addr - self.base) as usize + size;
		self.bytes.resize(new_len, 0);
		addr
	}

	/// Allocate and fill a byte run.
	pub fn alloc_bytes(&mut self, data: &[u8], align: usize) -> u64 {
		let addr = self.alloc(data.len(), align);
		self.write_bytes(addr, data);
		addr
	}

	/// Allocate a NUL-terminated string.
	pub fn alloc_cstr(&mut self, text: &str) -> u64 {
		let mut data = text.as_bytes().to_vec();
		data.push(0);
		self.alloc_bytes(&data, 1)
	}

	/// Allocate an array of 32-bit integers.
	pub fn alloc_i32s(&mut self, values: &[i32]) -> u64 {
		let addr = self.alloc(values.len() * 4, 4);
		for (idx, value) in values.iter().enumerate() {
			self.write_i32(addr + idx as u64 * 4, *value);
		}
		addr
	}

	/// Overwrite bytes at `addr`.
	pub fn write_bytes(&mut self, addr: u64, data: &[u8]) {
		let start = (addr - self.base) as usize;
		self.bytes[start..start + data.len()].copy_from_slice(data);
	}

	/// Write one byte.
	pub fn write_u8(&mut self, addr: u64, value: u8) {
		self.write_bytes(addr, &[value]);
	}

	/// Write a little-endian `u32`.
	pub fn write_u32(&mut self, addr: u64, value: u32) {
		self.write_bytes(addr, &value.to_le_bytes());
	}

	/// Write a little-endian `i32`.
	pub fn write_i32(&mut self, addr: u64, value: i32) {
		self.write_bytes(addr, &value.to_le_bytes());
	}

	/// Write a little-endian `u64`.
	pub fn write_u64(&mut self, addr: u64, value: u64) {
		self.write_bytes(addr, &value.to_le_bytes());
	}

	/// Write a little-endian `f64`.
	pub fn write_f64(&mut self, addr: u64, value: f64) {
		self.write_bytes(addr, &value.to_le_bytes());
	}

	/// Write a pointer-width word.
	pub fn write_ptr(&mut self, addr: u64, value: u64) {
		match self.pointer_size {
			4 => self.write_u32(addr, value as u32),
			_ => self.write_u64(addr, value),
		}
	}

	/// One past the highest allocated address.
	pub fn end(&self) -> u64 {
		self.base + self.bytes.len() as u64
	}

	/// Captured regions as `(address, bytes)` pairs.
	pub fn pairs(&self) -> Vec<(u64, Vec<u8>)> {
		vec![(self.base, self.bytes.clone())]
	}

	/// Captured regions in snapshot JSON form.
	pub fn regions_json(&self) -> Value {
		let hex: String = self.bytes.iter().map(|byte| format!("{byte:02x}")).collect();
		json!([{ "address": format!("0x{:x}", self.base), "bytes": hex }])
	}
}
