use crate::inspect::bytes::Cursor;
use crate::inspect::{Category, Endianness, InspectError, InspectedValue, Inspector, LayoutRecipe, Operand, Primitive, Result, TypeId, TypeKind};

/// Code units fetched per read while scanning for a terminator.
const SCAN_CHUNK: usize = 64;

impl Inspector<'_> {
	/// Reduce an operand to a native primitive.
	pub fn coerce(&self, operand: &Operand) -> Result<Primitive> {
		match operand {
			Operand::Native(prim) => Ok(prim.clone()),
			Operand::Value(value) => self.coerce_value(value),
		}
	}

	/// Reduce a process value to a native primitive.
	pub fn coerce_value(&self, value: &InspectedValue) -> Result<Primitive> {
		let class = self.classify(value.ty)?;
		match (class.category, class.recipe) {
			(Category::Scalar, _) => self.read_scalar(value),
			(Category::StringLike, Some(recipe)) => self.read_text(value, recipe).map(Primitive::Text),
			_ => Err(InspectError::CoercionFailed {
				type_name: self.types().name(value.ty).to_owned(),
			}),
		}
	}

	fn read_scalar(&self, value: &InspectedValue) -> Result<Primitive> {
		let desc = self.types().descriptor(value.ty)?;
		let bytes = self.value_bytes(value, 0, desc.size)?;
		let mut cursor = Cursor::new(&bytes, self.target().endianness);

		match desc.kind {
			TypeKind::Bool => Ok(Primitive::Bool(bytes.iter().any(|byte| *byte != 0))),
			TypeKind::Int { signed } | TypeKind::Char { signed } | TypeKind::Enum { signed } => {
				if signed {
					cursor.read_int(desc.size).map(Primitive::Int)
				} else {
					cursor.read_uint(desc.size).map(Primitive::UInt)
				}
			}
			TypeKind::Float => cursor.read_float(desc.size)?.map(Primitive::Float).ok_or_else(|| InspectError::CoercionFailed {
				type_name: desc.name.to_string(),
			}),
			_ => Err(InspectError::CoercionFailed {
				type_name: desc.name.to_string(),
			}),
		}
	}

	pub(crate) fn read_text(&self, value: &InspectedValue, recipe: LayoutRecipe) -> Result<String> {
		let max = self.options().max_string_len;
		let endianness = self.target().endianness;

		match recipe {
			LayoutRecipe::CString { elem } => {
				let addr = self.read_ptr_in(value, 0)?;
				self.scan_terminated(addr, self.unit_size(elem))
			}
			LayoutRecipe::CharArray { len, elem } => {
				let width = self.unit_size(elem);
				if len > max {
					return Err(InspectError::StringTooLong { len, max });
				}
				let bytes = self.value_bytes(value, 0, len * width)?;
				let units = bytes.chunks_exact(width).take_while(|unit| unit.iter().any(|byte| *byte != 0)).count();
				Ok(decode_units(&bytes[..units * width], width, endianness))
			}
			LayoutRecipe::PointerLengthText { data, len, char_size } => {
				let count = usize::try_from(self.read_member_uint(value, len)?).unwrap_or(usize::MAX);
				if count > max {
					return Err(InspectError::StringTooLong { len: count, max });
				}
				if count == 0 {
					return Ok(String::new());
				}
				let addr = self.read_ptr_in(value, data.offset)?;
				let bytes = self.read_at(addr, count * char_size.max(1))?;
				Ok(decode_units(&bytes, char_size.max(1), endianness))
			}
			_ => Err(InspectError::CoercionFailed {
				type_name: self.types().name(value.ty).to_owned(),
			}),
		}
	}

	fn unit_size(&self, elem: TypeId) -> usize {
		self.types().size_of(elem).max(1)
	}

	/// Read NUL-terminated code units starting at `addr`.
	fn scan_terminated(&self, addr: u64, width: usize) -> Result<String> {
		if addr == 0 {
			return Err(InspectError::AddressUnreadable { addr, len: width });
		}

		let max = self.options().max_string_len;
		let mut out = Vec::new();
		let mut cursor = addr;

		loop {
			let units_left = (max + 1).saturating_sub(out.len() / width);
			if units_left == 0 {
				return Err(InspectError::StringTooLong { len: max + 1, max });
			}

			// Chunked reads may run off the end of a mapping; retry one unit at a time.
			let want = SCAN_CHUNK.min(units_left) * width;
			let chunk = match self.try_read_at(cursor, want) {
				Some(bytes) => bytes,
				None => self.read_at(cursor, width)?,
			};

			for unit in chunk.chunks_exact(width) {
				if unit.iter().all(|byte| *byte == 0) {
					return Ok(decode_units(&out, width, self.target().endianness));
				}
				out.extend_from_slice(unit);
			}
			cursor = cursor.checked_add(chunk.len() as u64).ok_or(InspectError::AddressUnreadable { addr: cursor, len: width })?;
		}
	}
}

/// Decode code units of `width` bytes, replacing invalid sequences.
fn decode_units(bytes: &[u8], width: usize, endianness: Endianness) -> String {
	match width {
		2 => {
			let units: Vec<u16> = bytes
				.chunks_exact(2)
				.map(|unit| match endianness {
					Endianness::Little => u16::from_le_bytes([unit[0], unit[1]]),
					Endianness::Big => u16::from_be_bytes([unit[0], unit[1]]),
				})
				.collect();
			String::from_utf16_lossy(&units)
		}
		4 => bytes
			.chunks_exact(4)
			.map(|unit| {
				let raw = [unit[0], unit[1], unit[2], unit[3]];
				let code = match endianness {
					Endianness::Little => u32::from_le_bytes(raw),
					Endianness::Big => u32::from_be_bytes(raw),
				};
				char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER)
			})
			.collect(),
		_ => String::from_utf8_lossy(bytes).into_owned(),
	}
}
