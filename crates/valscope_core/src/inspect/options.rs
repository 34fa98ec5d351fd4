use serde::{Deserialize, Serialize};

use crate::inspect::{Endianness, InspectError, Result};

/// Traversal limits shared by every engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct InspectOptions {
	/// Maximum indirection steps of a recursive dereference.
	pub max_deref_depth: usize,
	/// Maximum bytes read when coercing a string.
	pub max_string_len: usize,
	/// Maximum links walked when a node container stores no size.
	pub max_list_walk: usize,
	/// Fail single-step dereference of values that are not pointer-like.
	pub strict_deref: bool,
}

impl Default for InspectOptions {
	fn default() -> Self {
		Self {
			max_deref_depth: 64,
			max_string_len: 65536,
			max_list_walk: 1_000_000,
			strict_deref: false,
		}
	}
}

impl InspectOptions {
	/// Preset tuned for interactive sessions over slow remote targets.
	pub fn for_interactive() -> Self {
		Self {
			max_deref_depth: 16,
			max_string_len: 4096,
			max_list_walk: 100_000,
			strict_deref: false,
		}
	}
}

/// Pointer width and byte order of the inspected process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TargetInfo {
	/// Pointer width in bytes (4 or 8).
	pub pointer_size: usize,
	/// Byte order.
	pub endianness: Endianness,
}

impl Default for TargetInfo {
	fn default() -> Self {
		Self {
			pointer_size: 8,
			endianness: Endianness::Little,
		}
	}
}

impl TargetInfo {
	/// 32-bit little-endian target.
	pub fn ilp32() -> Self {
		Self {
			pointer_size: 4,
			endianness: Endianness::Little,
		}
	}

	/// Reject pointer widths other than 4 and 8.
	pub fn validate(&self) -> Result<()> {
		match self.pointer_size {
			4 | 8 => Ok(()),
			size => Err(InspectError::UnsupportedPointerSize { size }),
		}
	}

	/// Mask truncating a 64-bit word to the pointer width.
	pub fn pointer_mask(&self) -> u64 {
		if self.pointer_size >= 8 { u64::MAX } else { (1_u64 << (self.pointer_size * 8)) - 1 }
	}
}
