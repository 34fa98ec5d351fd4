use std::borrow::Cow;
use std::cell::RefCell;
use std::collections::HashMap;

use crate::inspect::bytes::Cursor;
use crate::inspect::{
	Classification, InspectError, InspectOptions, InspectedValue, Location, Member, Memory, Registry, Result, TargetInfo, TypeId, TypeTable,
};

/// Entry point for every engine operation over one inspected process.
///
/// Holds the classification cache, so it is deliberately not `Sync`.
pub struct Inspector<'a> {
	types: &'a TypeTable,
	memory: &'a dyn Memory,
	target: TargetInfo,
	options: InspectOptions,
	pub(crate) registry: Registry,
	pub(crate) cache: RefCell<HashMap<TypeId, Classification>>,
}

impl<'a> Inspector<'a> {
	/// Build an inspector with default options and the standard family registry.
	pub fn new(types: &'a TypeTable, memory: &'a dyn Memory, target: TargetInfo) -> Self {
		Self {
			types,
			memory,
			target,
			options: InspectOptions::default(),
			registry: Registry::standard(),
			cache: RefCell::new(HashMap::new()),
		}
	}

	/// Replace traversal limits.
	pub fn with_options(mut self, options: InspectOptions) -> Self {
		self.options = options;
		self
	}

	/// Replace the family registry, dropping cached classifications.
	pub fn with_registry(mut self, registry: Registry) -> Self {
		self.registry = registry;
		self.cache.get_mut().clear();
		self
	}

	/// Rebind to a new type table after debug info changed.
	pub fn invalidate_types(&mut self, types: &'a TypeTable) {
		self.types = types;
		self.cache.get_mut().clear();
	}

	/// Return the bound type table.
	pub fn types(&self) -> &'a TypeTable {
		self.types
	}

	/// Return target pointer width and byte order.
	pub fn target(&self) -> TargetInfo {
		self.target
	}

	/// Return traversal limits.
	pub fn options(&self) -> &InspectOptions {
		&self.options
	}

	/// Return number of cached classifications.
	pub fn cached_types(&self) -> usize {
		self.cache.borrow().len()
	}

	/// Derive the value at `offset` bytes into `value` with type `ty`.
	pub fn project(&self, value: &InspectedValue, offset: usize, ty: TypeId) -> Result<InspectedValue> {
		match &value.location {
			Location::Address(addr) => {
				let addr = addr.checked_add(offset as u64).ok_or(InspectError::AddressUnreadable {
					addr: *addr,
					len: offset,
				})?;
				Ok(InspectedValue::at(ty, addr))
			}
			Location::Inline(bytes) => {
				let size = self.types.size_of(ty);
				let slice = offset
					.checked_add(size)
					.and_then(|end| bytes.get(offset..end))
					.ok_or(InspectError::AddressUnreadable {
						addr: offset as u64,
						len: size,
					})?;
				Ok(InspectedValue::inline(ty, slice))
			}
		}
	}

	/// Project a member by dotted path (base subobjects are searched).
	pub fn member(&self, value: &InspectedValue, path: &str) -> Result<InspectedValue> {
		let (offset, ty) = self.types.resolve_member(value.ty, path)?;
		self.project(value, offset, ty)
	}

	/// Project the `index`-th `elem` of a strided run starting `offset` bytes into `base`.
	pub fn element(&self, base: &InspectedValue, offset: usize, elem: TypeId, index: usize) -> Result<InspectedValue> {
		let stride = self.types.size_of(elem);
		let offset = index
			.checked_mul(stride)
			.and_then(|delta| delta.checked_add(offset))
			.ok_or(InspectError::IndexOutOfRange {
				index: index as i64,
				len: usize::MAX / stride.max(1),
			})?;
		self.project(base, offset, elem)
	}

	/// Human-readable `type @ address` label.
	pub fn describe(&self, value: &InspectedValue) -> String {
		match value.location {
			Location::Address(addr) => format!("{} @ 0x{addr:x}", self.types.name(value.ty)),
			Location::Inline(_) => format!("{} (inline)", self.types.name(value.ty)),
		}
	}

	pub(crate) fn read_at(&self, addr: u64, len: usize) -> Result<Cow<'a, [u8]>> {
		self.memory.read_memory(addr, len).ok_or(InspectError::AddressUnreadable { addr, len })
	}

	pub(crate) fn try_read_at(&self, addr: u64, len: usize) -> Option<Cow<'a, [u8]>> {
		self.memory.read_memory(addr, len)
	}

	pub(crate) fn value_bytes<'v>(&'v self, value: &'v InspectedValue, offset: usize, len: usize) -> Result<Cow<'v, [u8]>> {
		match &value.location {
			Location::Address(addr) => {
				let addr = addr.checked_add(offset as u64).ok_or(InspectError::AddressUnreadable { addr: *addr, len })?;
				self.read_at(addr, len)
			}
			Location::Inline(bytes) => offset
				.checked_add(len)
				.and_then(|end| bytes.get(offset..end))
				.map(Cow::Borrowed)
				.ok_or(InspectError::AddressUnreadable { addr: offset as u64, len }),
		}
	}

	pub(crate) fn read_uint_in(&self, value: &InspectedValue, offset: usize, width: usize) -> Result<u64> {
		let bytes = self.value_bytes(value, offset, width)?;
		Cursor::new(&bytes, self.target.endianness).read_uint(width)
	}

	pub(crate) fn read_member_uint(&self, value: &InspectedValue, member: Member) -> Result<u64> {
		self.read_uint_in(value, member.offset, self.types.size_of(member.ty))
	}

	pub(crate) fn read_ptr_in(&self, value: &InspectedValue, offset: usize) -> Result<u64> {
		let bytes = self.value_bytes(value, offset, self.target.pointer_size)?;
		Cursor::new(&bytes, self.target.endianness).read_ptr(self.target.pointer_size)
	}

	pub(crate) fn read_ptr_at(&self, addr: u64) -> Result<u64> {
		let bytes = self.read_at(addr, self.target.pointer_size)?;
		Cursor::new(&bytes, self.target.endianness).read_ptr(self.target.pointer_size)
	}

	pub(crate) fn pointee(&self, ptr_ty: TypeId) -> Result<TypeId> {
		self.types.descriptor(ptr_ty)?.pointee().ok_or_else(|| InspectError::LayoutUnsupported {
			type_name: self.types.name(ptr_ty).to_owned(),
			reason: "member is not a raw pointer",
		})
	}

	/// Value of type `ty` at `addr`, verified readable.
	pub(crate) fn checked_target(&self, addr: u64, ty: TypeId) -> Result<InspectedValue> {
		let size = self.types.size_of(ty);
		if addr == 0 {
			return Err(InspectError::AddressUnreadable { addr, len: size });
		}
		self.read_at(addr, size)?;
		Ok(InspectedValue::at(ty, addr))
	}

	pub(crate) fn stride(&self, elem: TypeId) -> Result<usize> {
		match self.types.size_of(elem) {
			0 => Err(InspectError::LayoutUnsupported {
				type_name: self.types.name(elem).to_owned(),
				reason: "element type has zero size",
			}),
			size => Ok(size),
		}
	}
}
