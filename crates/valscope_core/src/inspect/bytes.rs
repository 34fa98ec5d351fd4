use serde::{Deserialize, Serialize};

use crate::inspect::{InspectError, Result};

/// Byte order of the inspected process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
	/// Least significant byte first.
	#[default]
	Little,
	/// Most significant byte first.
	Big,
}

impl Endianness {
	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Little => "little",
			Self::Big => "big",
		}
	}
}

/// Bounded cursor over bytes copied out of the inspected process.
pub(crate) struct Cursor<'a> {
	bytes: &'a [u8],
	pos: usize,
	endianness: Endianness,
}

impl<'a> Cursor<'a> {
	/// Create a cursor at position 0.
	pub(crate) fn new(bytes: &'a [u8], endianness: Endianness) -> Self {
		Self { bytes, pos: 0, endianness }
	}

	/// Return remaining unread bytes.
	pub(crate) fn remaining(&self) -> usize {
		self.bytes.len().saturating_sub(self.pos)
	}

	/// Read exactly `n` bytes and advance.
	pub(crate) fn read_exact(&mut self, n: usize) -> Result<&'a [u8]> {
		if n > self.remaining() {
			return Err(InspectError::AddressUnreadable {
				addr: self.pos as u64,
				len: n,
			});
		}

		let start = self.pos;
		self.pos += n;
		Ok(&self.bytes[start..self.pos])
	}

	/// Read an unsigned integer of `width` bytes, zero-extended.
	pub(crate) fn read_uint(&mut self, width: usize) -> Result<u64> {
		if !matches!(width, 1 | 2 | 4 | 8) {
			return Err(InspectError::LayoutUnsupported {
				type_name: format!("{width}-byte integer"),
				reason: "integer width must be 1, 2, 4, or 8 bytes",
			});
		}

		let raw = self.read_exact(width)?;
		let mut buf = [0_u8; 8];
		Ok(match self.endianness {
			Endianness::Little => {
				buf[..width].copy_from_slice(raw);
				u64::from_le_bytes(buf)
			}
			Endianness::Big => {
				buf[8 - width..].copy_from_slice(raw);
				u64::from_be_bytes(buf)
			}
		})
	}

	/// Read a signed integer of `width` bytes, sign-extended.
	pub(crate) fn read_int(&mut self, width: usize) -> Result<i64> {
		let raw = self.read_uint(width)?;
		Ok(match width {
			1 => i64::from(raw as u8 as i8),
			2 => i64::from(raw as u16 as i16),
			4 => i64::from(raw as u32 as i32),
			_ => raw as i64,
		})
	}

	/// Read an IEEE float of 4 or 8 bytes.
	pub(crate) fn read_float(&mut self, width: usize) -> Result<Option<f64>> {
		match width {
			4 => Ok(Some(f64::from(f32::from_bits(self.read_uint(4)? as u32)))),
			8 => Ok(Some(f64::from_bits(self.read_uint(8)?))),
			_ => Ok(None),
		}
	}

	/// Read a pointer-sized word and widen to `u64`.
	pub(crate) fn read_ptr(&mut self, pointer_size: usize) -> Result<u64> {
		match pointer_size {
			4 | 8 => self.read_uint(pointer_size),
			_ => Err(InspectError::UnsupportedPointerSize { size: pointer_size }),
		}
	}
}

/// `base + delta`, unreadable when the sum leaves the address space.
pub(crate) fn offset_addr(base: u64, delta: u64) -> Result<u64> {
	base.checked_add(delta).ok_or(InspectError::AddressUnreadable {
		addr: base,
		len: usize::try_from(delta).unwrap_or(usize::MAX),
	})
}

/// Address of slot `index` in a run of `stride`-byte slots starting at `base`.
pub(crate) fn slot_addr(base: u64, index: u64, stride: u64) -> Result<u64> {
	let delta = index.checked_mul(stride).ok_or(InspectError::AddressUnreadable {
		addr: base,
		len: usize::MAX,
	})?;
	offset_addr(base, delta)
}

/// Round `value` up to a multiple of `align` (treating 0 as 1).
pub(crate) fn align_up(value: usize, align: usize) -> usize {
	let align = align.max(1);
	value.div_ceil(align) * align
}
