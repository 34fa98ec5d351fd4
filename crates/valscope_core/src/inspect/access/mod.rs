use crate::inspect::bytes::offset_addr;
use crate::inspect::iter::{Items, Walk};
use crate::inspect::{Category, InspectError, InspectedValue, Inspector, Item, LayoutRecipe, Operand, Primitive, Result};

/// Where a small-buffer vector currently keeps its elements.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Storage {
	/// Elements live in the in-object buffer.
	Inline,
	/// Elements spilled to a heap allocation.
	Heap,
}

impl Storage {
	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Inline => "inline",
			Self::Heap => "heap",
		}
	}
}

impl Inspector<'_> {
	/// Index a sequential container or look up a key in an associative one.
	pub fn get_item(&self, container: &InspectedValue, key: &Operand) -> Result<InspectedValue> {
		let class = self.classify(container.ty)?;
		match class.category {
			Category::SequentialContainer | Category::FixedArray => self.get_indexed(container, key),
			Category::AssociativeContainer => self.get_keyed(container, key),
			_ => Err(InspectError::NotAContainer {
				type_name: self.types().name(container.ty).to_owned(),
			}),
		}
	}

	/// Element count of a container (characters for strings).
	pub fn len(&self, value: &InspectedValue) -> Result<usize> {
		let class = self.classify(value.ty)?;
		if class.category == Category::StringLike
			&& let Some(recipe) = class.recipe
		{
			return Ok(self.read_text(value, recipe)?.chars().count());
		}

		let plan = self.plan(value)?;
		match plan.len {
			Some(len) => Ok(len),
			None => Items::new(self, plan).try_fold(0_usize, |count, item| item.map(|_| count + 1)),
		}
	}

	/// Storage mode of a small-buffer vector; `None` for other types.
	pub fn storage(&self, value: &InspectedValue) -> Result<Option<Storage>> {
		let Some(LayoutRecipe::InlineHybrid { data, inline_offset, .. }) = self.classify(value.ty)?.recipe else {
			return Ok(None);
		};
		let Some(addr) = value.address() else {
			return Ok(Some(Storage::Heap));
		};

		let begin = self.read_ptr_in(value, data.offset)?;
		let inline = offset_addr(addr, inline_offset as u64)?;
		Ok(Some(if begin == inline { Storage::Inline } else { Storage::Heap }))
	}

	fn get_indexed(&self, container: &InspectedValue, key: &Operand) -> Result<InspectedValue> {
		let plan = self.plan(container)?;
		let len = match plan.len {
			Some(len) => len,
			None => self.len(container)?,
		};

		let index = self.index_key(key)?;
		let Some(position) = usize::try_from(index).ok().filter(|position| *position < len) else {
			return Err(InspectError::IndexOutOfRange {
				index: i64::try_from(index).unwrap_or(i64::MAX),
				len,
			});
		};

		if let Walk::Strided { base, offset, elem } = &plan.walk {
			return self.element(base, *offset, *elem, position);
		}

		match Items::new(self, plan).nth(position) {
			Some(item) => item.map(Item::into_value),
			None => Err(InspectError::IndexOutOfRange {
				index: position as i64,
				len,
			}),
		}
	}

	fn get_keyed(&self, container: &InspectedValue, key: &Operand) -> Result<InspectedValue> {
		let wanted = self.resolve_operand(key)?;
		for item in self.iterate(container)? {
			let Item::Keyed { key, value } = item? else {
				continue;
			};
			let candidate = self.resolve_operand(&key)?;
			if self.resolved_eq(&candidate, &wanted)? {
				return Ok(value);
			}
		}

		Err(InspectError::KeyNotFound {
			key: self.render_resolved(&wanted),
			type_name: self.types().name(container.ty).to_owned(),
		})
	}

	/// Integer index from a key operand.
	fn index_key(&self, key: &Operand) -> Result<i128> {
		match self.coerce(&self.deref_operand(key)?)? {
			Primitive::Int(value) => Ok(i128::from(value)),
			Primitive::UInt(value) => Ok(i128::from(value)),
			other => Err(InspectError::InvalidIndexKey { got: other.kind_name() }),
		}
	}
}
