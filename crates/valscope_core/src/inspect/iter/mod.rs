use std::iter::FusedIterator;

use crate::inspect::bytes::{align_up, offset_addr, slot_addr};
use crate::inspect::{Category, InspectError, InspectedValue, Inspector, LayoutRecipe, Operand, Primitive, Result, TypeId};

/// Deque buffers hold 512 bytes worth of elements (at least one).
const DEQUE_BUFFER_BYTES: usize = 512;

/// One element produced by iteration.
#[derive(Debug, Clone, PartialEq)]
pub enum Item {
	/// Element of a sequential container or fixed array.
	Indexed {
		/// Zero-based position in storage order.
		index: usize,
		/// Element value.
		value: InspectedValue,
	},
	/// Entry of an associative container.
	Keyed {
		/// Entry key (a process value, or decoded text for string maps).
		key: Operand,
		/// Mapped value.
		value: InspectedValue,
	},
}

impl Item {
	/// Element or mapped value.
	pub fn value(&self) -> &InspectedValue {
		match self {
			Self::Indexed { value, .. } | Self::Keyed { value, .. } => value,
		}
	}

	/// Entry key for associative items.
	pub fn key(&self) -> Option<&Operand> {
		match self {
			Self::Indexed { .. } => None,
			Self::Keyed { key, .. } => Some(key),
		}
	}

	/// Take the element or mapped value.
	pub fn into_value(self) -> InspectedValue {
		match self {
			Self::Indexed { value, .. } | Self::Keyed { value, .. } => value,
		}
	}
}

/// Traversal state per storage shape.
#[derive(Debug, Clone)]
pub(crate) enum Walk {
	Strided {
		base: InspectedValue,
		offset: usize,
		elem: TypeId,
	},
	Linked {
		sentinel: u64,
		node: u64,
		payload: u64,
		elem: TypeId,
		started: bool,
	},
	Deque {
		start_cur: u64,
		start_first: u64,
		start_node: u64,
		per_buffer: usize,
		stride: usize,
		elem: TypeId,
	},
	Tree {
		header: u64,
		node: u64,
		payload: u64,
		key: TypeId,
		mapped: Option<(u64, TypeId)>,
		started: bool,
	},
	Buckets {
		table: u64,
		bucket: u64,
		buckets: u64,
		key_offset: u64,
		value: TypeId,
	},
}

/// Walk state plus the element count the container reports, when it stores one.
#[derive(Debug, Clone)]
pub(crate) struct Plan {
	pub(crate) walk: Walk,
	pub(crate) len: Option<usize>,
}

/// Lazy iterator over the elements of one container.
///
/// Fused after the first error.
pub struct Items<'i, 'a> {
	inspector: &'i Inspector<'a>,
	walk: Walk,
	len: Option<usize>,
	index: usize,
	done: bool,
}

impl<'i, 'a> Items<'i, 'a> {
	pub(crate) fn new(inspector: &'i Inspector<'a>, plan: Plan) -> Self {
		Self {
			inspector,
			walk: plan.walk,
			len: plan.len,
			index: 0,
			done: false,
		}
	}

	/// Element count reported by the container, when it stores one.
	pub fn reported_len(&self) -> Option<usize> {
		self.len
	}

	fn step(&mut self) -> Result<Option<Item>> {
		let ins = self.inspector;
		let index = self.index;
		let ptr = ins.target().pointer_size as u64;

		match &mut self.walk {
			Walk::Strided { base, offset, elem } => Ok(Some(Item::Indexed {
				index,
				value: ins.element(base, *offset, *elem, index)?,
			})),
			Walk::Linked {
				sentinel,
				node,
				payload,
				elem,
				started,
			} => {
				if *started {
					*node = ins.read_ptr_at(*node)?;
				}
				*started = true;

				if *node == *sentinel {
					return Ok(None);
				}
				if self.len.is_none() && index >= ins.options().max_list_walk {
					return Err(InspectError::NodeWalkExceeded {
						max: ins.options().max_list_walk,
					});
				}
				if *node == 0 {
					return Err(InspectError::AddressUnreadable { addr: 0, len: ptr as usize });
				}
				Ok(Some(Item::Indexed {
					index,
					value: InspectedValue::at(*elem, offset_addr(*node, *payload)?),
				}))
			}
			Walk::Deque {
				start_cur,
				start_first,
				start_node,
				per_buffer,
				stride,
				elem,
			} => {
				let offset = (index as u64).saturating_add((*start_cur - *start_first) / *stride as u64);
				let node_idx = offset / *per_buffer as u64;
				let within = offset % *per_buffer as u64;
				let buffer = if node_idx == 0 {
					*start_first
				} else {
					ins.read_ptr_at(slot_addr(*start_node, node_idx, ptr)?)?
				};
				Ok(Some(Item::Indexed {
					index,
					value: InspectedValue::at(*elem, slot_addr(buffer, within, *stride as u64)?),
				}))
			}
			Walk::Tree {
				header,
				node,
				payload,
				key,
				mapped,
				started,
			} => {
				if *started {
					*node = ins.tree_successor(*node, *header)?;
				}
				*started = true;

				if *node == *header {
					return Ok(None);
				}
				if *node == 0 {
					return Err(InspectError::AddressUnreadable { addr: 0, len: ptr as usize });
				}
				let key_addr = offset_addr(*node, *payload)?;
				let key_value = InspectedValue::at(*key, key_addr);
				Ok(Some(match mapped {
					Some((offset, ty)) => Item::Keyed {
						key: Operand::Value(key_value),
						value: InspectedValue::at(*ty, offset_addr(key_addr, *offset)?),
					},
					None => Item::Indexed { index, value: key_value },
				}))
			}
			Walk::Buckets {
				table,
				bucket,
				buckets,
				key_offset,
				value,
			} => {
				let tombstone = ((-1_i64 << 3) as u64) & ins.target().pointer_mask();
				while *bucket < *buckets {
					let entry = ins.read_ptr_at(slot_addr(*table, *bucket, ptr)?)?;
					*bucket += 1;
					if entry == 0 || entry == tombstone {
						continue;
					}

					let key_len = usize::try_from(ins.read_ptr_at(entry)?).unwrap_or(usize::MAX);
					let max = ins.options().max_string_len;
					if key_len > max {
						return Err(InspectError::StringTooLong { len: key_len, max });
					}
					let key = if key_len == 0 {
						String::new()
					} else {
						String::from_utf8_lossy(&ins.read_at(offset_addr(entry, *key_offset)?, key_len)?).into_owned()
					};
					return Ok(Some(Item::Keyed {
						key: Operand::Native(Primitive::Text(key)),
						value: InspectedValue::at(*value, offset_addr(entry, ptr)?),
					}));
				}
				Ok(None)
			}
		}
	}
}

impl Iterator for Items<'_, '_> {
	type Item = Result<Item>;

	fn next(&mut self) -> Option<Self::Item> {
		if self.done || self.len.is_some_and(|len| self.index >= len) {
			return None;
		}

		match self.step() {
			Ok(Some(item)) => {
				self.index += 1;
				Some(Ok(item))
			}
			Ok(None) => {
				self.done = true;
				None
			}
			Err(err) => {
				self.done = true;
				Some(Err(err))
			}
		}
	}

	fn size_hint(&self) -> (usize, Option<usize>) {
		match self.len {
			Some(len) if !self.done => (0, Some(len.saturating_sub(self.index))),
			Some(_) => (0, Some(0)),
			None => (0, None),
		}
	}
}

impl FusedIterator for Items<'_, '_> {}

impl<'a> Inspector<'a> {
	/// Lazily iterate a container in storage order.
	///
	/// Each call starts a fresh traversal.
	pub fn iterate(&self, container: &InspectedValue) -> Result<Items<'_, 'a>> {
		Ok(Items::new(self, self.plan(container)?))
	}

	/// Resolve the walk state for a container value.
	pub(crate) fn plan(&self, container: &InspectedValue) -> Result<Plan> {
		let class = self.classify(container.ty)?;
		let not_container = || InspectError::NotAContainer {
			type_name: self.types().name(container.ty).to_owned(),
		};
		if !matches!(
			class.category,
			Category::SequentialContainer | Category::FixedArray | Category::AssociativeContainer
		) {
			return Err(not_container());
		}

		let ptr = self.target().pointer_size;
		match class.recipe.ok_or_else(not_container)? {
			LayoutRecipe::Inline { base, elem, len } => Ok(Plan {
				walk: Walk::Strided {
					base: container.clone(),
					offset: base,
					elem,
				},
				len: Some(len),
			}),
			LayoutRecipe::BeginEnd { begin, end, elem } => {
				let stride = self.stride(elem)?;
				let begin = self.read_ptr_in(container, begin.offset)?;
				let end = self.read_ptr_in(container, end.offset)?;
				let span = end.checked_sub(begin).ok_or_else(|| InspectError::LayoutUnsupported {
					type_name: self.types().name(container.ty).to_owned(),
					reason: "end pointer precedes begin pointer",
				})?;
				Ok(Plan {
					walk: Walk::Strided {
						base: InspectedValue::at(elem, begin),
						offset: 0,
						elem,
					},
					len: Some((span / stride as u64) as usize),
				})
			}
			LayoutRecipe::DataLength { data, len, elem } | LayoutRecipe::InlineHybrid { data, len, elem, .. } => {
				self.stride(elem)?;
				let count = self.read_member_uint(container, len)?;
				let data = self.read_ptr_in(container, data.offset)?;
				Ok(Plan {
					walk: Walk::Strided {
						base: InspectedValue::at(elem, data),
						offset: 0,
						elem,
					},
					len: Some(usize::try_from(count).unwrap_or(usize::MAX)),
				})
			}
			LayoutRecipe::LinkedNodes { head, size, elem } => {
				let sentinel = self.node_base(container, head)?;
				let len = match size {
					Some(member) => Some(usize::try_from(self.read_member_uint(container, member)?).unwrap_or(usize::MAX)),
					None => None,
				};
				Ok(Plan {
					walk: Walk::Linked {
						sentinel,
						node: self.read_ptr_at(sentinel)?,
						payload: align_up(2 * ptr, self.types().align_of(elem)) as u64,
						elem,
						started: false,
					},
					len,
				})
			}
			LayoutRecipe::Deque { start, finish, elem } => {
				let stride = self.stride(elem)?;
				let per_buffer = if stride < DEQUE_BUFFER_BYTES { DEQUE_BUFFER_BYTES / stride } else { 1 };
				let word = |offset: usize| self.read_ptr_in(container, offset).map(i128::from);
				let (s_cur, s_first, s_last, s_node) = (word(start.cur)?, word(start.first)?, word(start.last)?, word(start.node)?);
				let (f_cur, f_first, f_node) = (word(finish.cur)?, word(finish.first)?, word(finish.node)?);

				let stride_i = stride as i128;
				let nodes = (f_node - s_node) / ptr as i128 - 1;
				let total = nodes * per_buffer as i128 + (f_cur - f_first) / stride_i + (s_last - s_cur) / stride_i;
				let len = usize::try_from(total).map_err(|_| InspectError::LayoutUnsupported {
					type_name: self.types().name(container.ty).to_owned(),
					reason: "deque iterators are inconsistent",
				})?;
				if s_cur < s_first {
					return Err(InspectError::LayoutUnsupported {
						type_name: self.types().name(container.ty).to_owned(),
						reason: "deque iterators are inconsistent",
					});
				}

				Ok(Plan {
					walk: Walk::Deque {
						start_cur: s_cur as u64,
						start_first: s_first as u64,
						start_node: s_node as u64,
						per_buffer,
						stride,
						elem,
					},
					len: Some(len),
				})
			}
			LayoutRecipe::RbTree { header, count, key, mapped } => {
				let header = self.node_base(container, header)?;
				let count = usize::try_from(self.read_member_uint(container, count)?).unwrap_or(usize::MAX);
				let types = self.types();
				let (align, mapped) = match mapped {
					Some(ty) => {
						let offset = align_up(types.size_of(key), types.align_of(ty));
						(types.align_of(key).max(types.align_of(ty)), Some((offset as u64, ty)))
					}
					None => (types.align_of(key), None),
				};
				Ok(Plan {
					walk: Walk::Tree {
						header,
						node: self.read_ptr_at(offset_addr(header, 2 * ptr as u64)?)?,
						payload: align_up(4 * ptr, align) as u64,
						key,
						mapped,
						started: false,
					},
					len: Some(count),
				})
			}
			LayoutRecipe::StringMapTable {
				table,
				buckets,
				items,
				value,
			} => {
				let items = usize::try_from(self.read_member_uint(container, items)?).unwrap_or(usize::MAX);
				let buckets = self.read_member_uint(container, buckets)?;
				let table = self.read_ptr_in(container, table.offset)?;
				Ok(Plan {
					walk: Walk::Buckets {
						table,
						bucket: 0,
						buckets: if table == 0 { 0 } else { buckets },
						key_offset: (ptr + self.types().size_of(value).max(ptr)) as u64,
						value,
					},
					len: Some(items),
				})
			}
			LayoutRecipe::Adapter { inner } => self.plan(&self.project(container, inner.offset, inner.ty)?),
			LayoutRecipe::SmallSet { vector, set } => {
				let set = self.project(container, set.offset, set.ty)?;
				if self.len(&set)? > 0 {
					self.plan(&set)
				} else {
					self.plan(&self.project(container, vector.offset, vector.ty)?)
				}
			}
			LayoutRecipe::CString { .. }
			| LayoutRecipe::CharArray { .. }
			| LayoutRecipe::PointerLengthText { .. }
			| LayoutRecipe::OwnedPointer { .. }
			| LayoutRecipe::RefCounted { .. }
			| LayoutRecipe::Optional { .. }
			| LayoutRecipe::Expected { .. } => Err(not_container()),
		}
	}

	/// Address of an in-object sentinel/header node.
	fn node_base(&self, container: &InspectedValue, offset: usize) -> Result<u64> {
		let addr = container.address().ok_or_else(|| InspectError::LayoutUnsupported {
			type_name: self.types().name(container.ty).to_owned(),
			reason: "node-based container must live in process memory",
		})?;
		offset_addr(addr, offset as u64)
	}

	/// In-order successor of a red-black tree node.
	pub(crate) fn tree_successor(&self, node: u64, header: u64) -> Result<u64> {
		let ptr = self.target().pointer_size as u64;
		let link = |x: u64, slot: u64| slot_addr(x, slot, ptr).and_then(|addr| self.read_ptr_at(addr));
		let parent = |x: u64| link(x, 1);
		let left = |x: u64| link(x, 2);
		let right = |x: u64| link(x, 3);
		let max = self.options().max_list_walk;

		let mut x = node;
		let r = right(x)?;
		if r != 0 {
			x = r;
			for _ in 0..max {
				let l = left(x)?;
				if l == 0 {
					return Ok(x);
				}
				x = l;
			}
			return Err(InspectError::NodeWalkExceeded { max });
		}

		let mut y = parent(x)?;
		let mut climbed = 0;
		while y != 0 && x == right(y)? {
			if climbed == max {
				return Err(InspectError::NodeWalkExceeded { max });
			}
			climbed += 1;
			x = y;
			y = parent(y)?;
		}
		if y == 0 {
			return Ok(header);
		}
		// A lone root is the header's right child; stop on the header.
		if right(x)? != y { Ok(y) } else { Ok(x) }
	}
}

#[cfg(test)]
mod tests;
