use tracing::{debug, trace};

use crate::inspect::typename::{normalize_type_name, split_template};
use crate::inspect::{
	Category, Classification, Field, InspectedValue, Inspector, LayoutRecipe, Member, RecipeContext, Registry, Result, TargetInfo, TypeDescriptor,
	TypeId, TypeKind, TypeTable,
};

const REFCOUNT_NAMES: &[&str] = &["refcount", "ref_count", "refs", "use_count", "_M_refcount", "strong"];
const BEGIN_END_PAIRS: &[(&str, &str)] = &[("begin", "end"), ("first", "last"), ("start", "finish")];
const DATA_NAMES: &[&str] = &["data", "head", "first", "begin", "ptr", "items", "elems"];
const SIZE_NAMES: &[&str] = &["size", "count", "len", "length", "num"];

impl Inspector<'_> {
	/// Classify a type, consulting the per-inspector cache.
	pub fn classify(&self, ty: TypeId) -> Result<Classification> {
		let cached = self.cache.borrow().get(&ty).copied();
		if let Some(hit) = cached {
			return Ok(hit);
		}

		let result = classify_type(self.types(), &self.registry, self.target(), ty)?;
		self.cache.borrow_mut().insert(ty, result);
		Ok(result)
	}

	/// Classify the static type of a value.
	pub fn classify_value(&self, value: &InspectedValue) -> Result<Classification> {
		self.classify(value.ty)
	}
}

/// Classify a type without caching.
pub fn classify_type(types: &TypeTable, registry: &Registry, target: TargetInfo, ty: TypeId) -> Result<Classification> {
	let desc = types.descriptor(ty)?;
	let result = match &desc.kind {
		TypeKind::Bool | TypeKind::Int { .. } | TypeKind::Char { .. } | TypeKind::Float | TypeKind::Enum { .. } => {
			Classification::plain(Category::Scalar, "scalar")
		}
		TypeKind::Pointer { target } if is_char(types, *target) => {
			Classification::with_recipe(Category::StringLike, "c_string", LayoutRecipe::CString { elem: *target })
		}
		TypeKind::Pointer { .. } => Classification::plain(Category::PointerLike, "pointer"),
		TypeKind::Array { elem, len } if is_char(types, *elem) => Classification::with_recipe(
			Category::StringLike,
			"char_array",
			LayoutRecipe::CharArray { len: *len, elem: *elem },
		),
		TypeKind::Array { elem, len } => Classification::with_recipe(
			Category::FixedArray,
			"array",
			LayoutRecipe::Inline {
				base: 0,
				elem: *elem,
				len: *len,
			},
		),
		TypeKind::Struct { .. } => match classify_family(types, registry, target, ty, desc) {
			Some(found) => found,
			None => classify_structural(types, desc),
		},
		TypeKind::Opaque | TypeKind::Void => Classification::unknown(),
	};

	trace!(type_name = %desc.name, category = %result.category, family = result.family, "classified type");
	Ok(result)
}

fn is_char(types: &TypeTable, ty: TypeId) -> bool {
	types.get(ty).is_some_and(|desc| matches!(desc.kind, TypeKind::Char { .. }))
}

fn classify_family(types: &TypeTable, registry: &Registry, target: TargetInfo, ty: TypeId, desc: &TypeDescriptor) -> Option<Classification> {
	let normalized = normalize_type_name(&desc.name);
	let split = split_template(&normalized);
	let arity = if desc.template_args.is_empty() {
		split.args.len()
	} else {
		desc.template_args.len()
	};

	let cx = RecipeContext {
		types,
		target,
		ty,
		desc,
		args: split.args.iter().map(|arg| (*arg).to_owned()).collect(),
	};

	for family in registry.iter().filter(|family| family.matches(split.base, arity)) {
		match (family.build)(&cx) {
			Ok(recipe) => {
				debug!(type_name = %desc.name, family = family.family, recipe = recipe.tag(), "matched container family");
				return Some(Classification::with_recipe(family.category, family.family, recipe));
			}
			Err(err) => {
				debug!(type_name = %desc.name, family = family.family, error = %err, "family layout mismatch; trying next family");
			}
		}
	}

	None
}

fn classify_structural(types: &TypeTable, desc: &TypeDescriptor) -> Classification {
	let fields: Vec<&Field> = desc.fields().iter().filter(|field| !field.is_base).collect();
	let is_pointer = |field: &Field| types.get(field.ty).is_some_and(|item| matches!(item.kind, TypeKind::Pointer { .. }));
	let is_integer = |field: &Field| types.get(field.ty).is_some_and(|item| matches!(item.kind, TypeKind::Int { .. }));
	let sized_pointee = |field: &Field| {
		let target = types.get(field.ty)?.pointee()?;
		(types.size_of(target) > 0).then_some(target)
	};

	let first_pointer = fields.iter().copied().find(|field| is_pointer(*field));
	if let (Some(ptr), Some(count)) = (first_pointer, find_named(&fields, REFCOUNT_NAMES, |_| true)) {
		return structural(
			Category::SmartPointerLike,
			LayoutRecipe::RefCounted {
				ptr: member_of(ptr),
				count: member_of(count),
			},
		);
	}

	for &(begin, end) in BEGIN_END_PAIRS {
		let (Some(begin), Some(end)) = (find_named(&fields, &[begin], is_pointer), find_named(&fields, &[end], is_pointer)) else {
			continue;
		};
		if let Some(elem) = sized_pointee(begin) {
			return structural(
				Category::SequentialContainer,
				LayoutRecipe::BeginEnd {
					begin: member_of(begin),
					end: member_of(end),
					elem,
				},
			);
		}
	}

	if let (Some(data), Some(len)) = (find_named(&fields, DATA_NAMES, is_pointer), find_named(&fields, SIZE_NAMES, is_integer))
		&& let Some(elem) = sized_pointee(data)
	{
		return structural(
			Category::SequentialContainer,
			LayoutRecipe::DataLength {
				data: member_of(data),
				len: member_of(len),
				elem,
			},
		);
	}

	if desc.fields().len() == 1 && fields.len() == 1 && is_pointer(fields[0]) {
		return structural(Category::PointerLike, LayoutRecipe::OwnedPointer { ptr: member_of(fields[0]) });
	}

	debug!(type_name = %desc.name, "no family or structural pattern matched");
	Classification::unknown()
}

fn find_named<'f>(fields: &[&'f Field], names: &[&str], pred: impl Fn(&Field) -> bool) -> Option<&'f Field> {
	fields
		.iter()
		.copied()
		.find(|field| names.iter().any(|name| *name == &*field.name) && pred(*field))
}

fn member_of(field: &Field) -> Member {
	Member {
		offset: field.offset,
		ty: field.ty,
	}
}

fn structural(category: Category, recipe: LayoutRecipe) -> Classification {
	Classification::with_recipe(category, "structural", recipe)
}
