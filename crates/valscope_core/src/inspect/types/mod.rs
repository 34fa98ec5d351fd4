use std::collections::HashMap;

use crate::inspect::typename::normalize_type_name;
use crate::inspect::{InspectError, MemberPath, PathStep, Result};

/// Maximum base-class nesting searched during member lookup.
const MAX_BASE_DEPTH: usize = 32;

/// Index of a descriptor inside a [`TypeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
	/// Return the arena slot for this id.
	pub fn index(self) -> usize {
		self.0 as usize
	}
}

/// Structural shape of a type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
	/// Declared but not (yet) defined.
	Opaque,
	/// `void`.
	Void,
	/// Boolean scalar.
	Bool,
	/// Integer scalar.
	Int {
		/// Two's complement when set.
		signed: bool,
	},
	/// Character scalar (`char`, `signed char`, `unsigned char`).
	Char {
		/// Two's complement when set.
		signed: bool,
	},
	/// IEEE floating point scalar.
	Float,
	/// Enumeration stored as an integer.
	Enum {
		/// Two's complement when set.
		signed: bool,
	},
	/// Raw pointer.
	Pointer {
		/// Pointee type.
		target: TypeId,
	},
	/// Fixed-size inline array.
	Array {
		/// Element type.
		elem: TypeId,
		/// Element count.
		len: usize,
	},
	/// Struct/class layout.
	Struct {
		/// Members and base subobjects in declaration order.
		fields: Vec<Field>,
	},
}

/// One member or base subobject of a struct layout.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
	/// Member name (the base class name for base subobjects).
	pub name: Box<str>,
	/// Byte offset from the start of the enclosing struct.
	pub offset: usize,
	/// Member type.
	pub ty: TypeId,
	/// Whether this entry is a base-class subobject.
	pub is_base: bool,
}

impl Field {
	/// Build a named member.
	pub fn member(name: &str, offset: usize, ty: TypeId) -> Self {
		Self {
			name: name.into(),
			offset,
			ty,
			is_base: false,
		}
	}

	/// Build a base-class subobject.
	pub fn base(name: &str, offset: usize, ty: TypeId) -> Self {
		Self {
			name: name.into(),
			offset,
			ty,
			is_base: true,
		}
	}
}

/// One template argument of a specialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TemplateArg {
	/// Type parameter.
	Type(TypeId),
	/// Non-type (integral) parameter.
	Const(i64),
}

/// Immutable structural summary of one static type.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
	/// Display name as reported by debug info.
	pub name: Box<str>,
	/// Size in bytes.
	pub size: usize,
	/// Alignment in bytes.
	pub align: usize,
	/// Structural shape.
	pub kind: TypeKind,
	/// Template arguments when the type is a specialization.
	pub template_args: Vec<TemplateArg>,
}

impl TypeDescriptor {
	/// Build a descriptor without template arguments.
	pub fn new(name: &str, size: usize, align: usize, kind: TypeKind) -> Self {
		Self {
			name: name.into(),
			size,
			align: align.max(1),
			kind,
			template_args: Vec::new(),
		}
	}

	/// Attach template arguments.
	pub fn with_template_args(mut self, args: Vec<TemplateArg>) -> Self {
		self.template_args = args;
		self
	}

	/// Return struct members, or an empty slice for non-structs.
	pub fn fields(&self) -> &[Field] {
		match &self.kind {
			TypeKind::Struct { fields } => fields,
			_ => &[],
		}
	}

	/// Return pointee type for raw pointers.
	pub fn pointee(&self) -> Option<TypeId> {
		match self.kind {
			TypeKind::Pointer { target } => Some(target),
			_ => None,
		}
	}

	/// Return the `idx`-th template argument when it is a type.
	pub fn template_type(&self, idx: usize) -> Option<TypeId> {
		match self.template_args.get(idx)? {
			TemplateArg::Type(ty) => Some(*ty),
			TemplateArg::Const(_) => None,
		}
	}

	/// Return the `idx`-th template argument when it is a constant.
	pub fn template_const(&self, idx: usize) -> Option<i64> {
		match self.template_args.get(idx)? {
			TemplateArg::Const(value) => Some(*value),
			TemplateArg::Type(_) => None,
		}
	}
}

/// Arena of type descriptors, addressable by id and by name.
#[derive(Debug, Default, Clone)]
pub struct TypeTable {
	types: Vec<TypeDescriptor>,
	by_name: HashMap<Box<str>, TypeId>,
	by_normalized: HashMap<String, TypeId>,
}

impl TypeTable {
	/// Create an empty table.
	pub fn new() -> Self {
		Self::default()
	}

	/// Reserve an id for `name`, returning the existing id when already known.
	///
	/// Declared types stay [`TypeKind::Opaque`] until [`TypeTable::define`] runs,
	/// which lets self-referential node types point at themselves.
	pub fn declare(&mut self, name: &str) -> TypeId {
		if let Some(id) = self.by_name.get(name) {
			return *id;
		}

		let id = TypeId(self.types.len() as u32);
		self.types.push(TypeDescriptor::new(name, 0, 1, TypeKind::Opaque));
		self.by_name.insert(name.into(), id);
		self.by_normalized.entry(normalize_type_name(name)).or_insert(id);
		id
	}

	/// Fill in a declared slot.
	pub fn define(&mut self, id: TypeId, desc: TypeDescriptor) -> Result<()> {
		let slot = self.types.get_mut(id.index()).ok_or(InspectError::UnknownTypeId { id: id.0 })?;
		if slot.kind != TypeKind::Opaque || slot.name != desc.name {
			return Err(InspectError::DuplicateType { name: desc.name.to_string() });
		}
		*slot = desc;
		Ok(())
	}

	/// Declare and define a type in one step.
	pub fn insert(&mut self, desc: TypeDescriptor) -> Result<TypeId> {
		let id = self.declare(&desc.name);
		self.define(id, desc)?;
		Ok(id)
	}

	/// Return the pointer type to `target`, creating it when missing.
	pub fn pointer_to(&mut self, target: TypeId, pointer_size: usize) -> TypeId {
		let name = format!("{} *", self.name(target));
		if let Some(id) = self.by_name.get(name.as_str()) {
			return *id;
		}
		let id = self.declare(&name);
		self.types[id.index()] = TypeDescriptor::new(&name, pointer_size, pointer_size, TypeKind::Pointer { target });
		id
	}

	/// Return the `len`-element array type of `elem`, creating it when missing.
	pub fn array_of(&mut self, elem: TypeId, len: usize) -> TypeId {
		let name = format!("{} [{len}]", self.name(elem));
		if let Some(id) = self.by_name.get(name.as_str()) {
			return *id;
		}
		let size = self.size_of(elem).saturating_mul(len);
		let align = self.align_of(elem);
		let id = self.declare(&name);
		self.types[id.index()] = TypeDescriptor::new(&name, size, align, TypeKind::Array { elem, len });
		id
	}

	/// Look up a descriptor by id.
	pub fn get(&self, id: TypeId) -> Option<&TypeDescriptor> {
		self.types.get(id.index())
	}

	/// Look up a descriptor by id, failing on unknown ids.
	pub fn descriptor(&self, id: TypeId) -> Result<&TypeDescriptor> {
		self.get(id).ok_or(InspectError::UnknownTypeId { id: id.0 })
	}

	/// Find a type by exact name, then by normalized name.
	pub fn lookup(&self, name: &str) -> Option<TypeId> {
		self.by_name.get(name).copied().or_else(|| self.by_normalized.get(&normalize_type_name(name)).copied())
	}

	/// Return the type name, or `<unknown>` for missing ids.
	pub fn name(&self, id: TypeId) -> &str {
		self.get(id).map(|item| item.name.as_ref()).unwrap_or("<unknown>")
	}

	/// Return the type size in bytes (0 when unknown).
	pub fn size_of(&self, id: TypeId) -> usize {
		self.get(id).map(|item| item.size).unwrap_or(0)
	}

	/// Return the type alignment in bytes (1 when unknown).
	pub fn align_of(&self, id: TypeId) -> usize {
		self.get(id).map(|item| item.align).unwrap_or(1)
	}

	/// Return number of descriptors.
	pub fn len(&self) -> usize {
		self.types.len()
	}

	/// Return whether the table is empty.
	pub fn is_empty(&self) -> bool {
		self.types.is_empty()
	}

	/// Iterate descriptors in id order.
	pub fn iter(&self) -> impl Iterator<Item = (TypeId, &TypeDescriptor)> {
		self.types.iter().enumerate().map(|(idx, item)| (TypeId(idx as u32), item))
	}

	/// Find a member by name, searching base subobjects transitively.
	///
	/// Returns the byte offset relative to `ty` and the member type.
	pub fn find_member(&self, ty: TypeId, name: &str) -> Option<(usize, TypeId)> {
		self.find_member_at(ty, name, 0)
	}

	fn find_member_at(&self, ty: TypeId, name: &str, depth: usize) -> Option<(usize, TypeId)> {
		if depth > MAX_BASE_DEPTH {
			return None;
		}
		let fields = self.get(ty)?.fields();

		if let Some(field) = fields.iter().find(|field| !field.is_base && field.name.as_ref() == name) {
			return Some((field.offset, field.ty));
		}

		fields.iter().filter(|field| field.is_base).find_map(|base| {
			self.find_member_at(base.ty, name, depth + 1)
				.map(|(offset, member_ty)| (base.offset + offset, member_ty))
		})
	}

	/// Resolve a member path to `(offset, type)` relative to `ty`.
	pub fn resolve_path(&self, ty: TypeId, path: &MemberPath) -> Result<(usize, TypeId)> {
		let mut offset = 0_usize;
		let mut current = ty;

		for step in &path.steps {
			match step {
				PathStep::Member(name) => {
					let (member_offset, member_ty) = self.find_member(current, name).ok_or_else(|| InspectError::MissingMember {
						type_name: self.name(current).to_owned(),
						member: path.to_string(),
					})?;
					offset += member_offset;
					current = member_ty;
				}
				PathStep::Index(index) => {
					let TypeKind::Array { elem, len } = self.descriptor(current)?.kind else {
						return Err(InspectError::NotAContainer {
							type_name: self.name(current).to_owned(),
						});
					};
					if *index >= len {
						return Err(InspectError::IndexOutOfRange {
							index: *index as i64,
							len,
						});
					}
					offset += index * self.size_of(elem);
					current = elem;
				}
			}
		}

		Ok((offset, current))
	}

	/// Resolve a dotted member path given as text.
	pub fn resolve_member(&self, ty: TypeId, path: &str) -> Result<(usize, TypeId)> {
		self.resolve_path(ty, &MemberPath::parse(path)?)
	}
}
