use std::ops::RangeInclusive;

use crate::inspect::{Category, InspectError, LayoutRecipe, Member, Result, TargetInfo, TypeDescriptor, TypeId, TypeKind, TypeTable};

mod families;

/// Recipe builder signature.
pub type BuildFn = fn(&RecipeContext<'_>) -> Result<LayoutRecipe>;

/// One registered container/wrapper family.
#[derive(Debug, Clone)]
pub struct FamilyPattern {
	/// Family label reported in classifications.
	pub family: &'static str,
	/// Accepted normalized template base names.
	pub names: &'static [&'static str],
	/// Accepted template argument counts.
	pub arity: RangeInclusive<usize>,
	/// Category assigned on match.
	pub category: Category,
	/// Resolves the members the recipe needs; failure moves on to the next family.
	pub build: BuildFn,
}

impl FamilyPattern {
	/// Whether this family accepts a base name with `arity` template arguments.
	pub fn matches(&self, base: &str, arity: usize) -> bool {
		self.arity.contains(&arity) && self.names.contains(&base)
	}
}

/// Ordered family table; the first family whose builder succeeds wins.
#[derive(Debug, Clone)]
pub struct Registry {
	families: Vec<FamilyPattern>,
}

impl Default for Registry {
	fn default() -> Self {
		Self::standard()
	}
}

impl Registry {
	/// Registry with no families (structural fallback only).
	pub fn empty() -> Self {
		Self { families: Vec::new() }
	}

	/// libstdc++ and LLVM ADT families in priority order.
	pub fn standard() -> Self {
		Self {
			families: families::standard(),
		}
	}

	/// Append a family at lowest priority.
	pub fn push(&mut self, pattern: FamilyPattern) {
		self.families.push(pattern);
	}

	/// Iterate families in priority order.
	pub fn iter(&self) -> impl Iterator<Item = &FamilyPattern> {
		self.families.iter()
	}

	/// Return number of families.
	pub fn len(&self) -> usize {
		self.families.len()
	}

	/// Return whether no family is registered.
	pub fn is_empty(&self) -> bool {
		self.families.is_empty()
	}
}

/// Inputs available to a recipe builder.
pub struct RecipeContext<'t> {
	/// Type table the descriptor belongs to.
	pub types: &'t TypeTable,
	/// Target pointer width and byte order.
	pub target: TargetInfo,
	/// Type being classified.
	pub ty: TypeId,
	/// Descriptor of `ty`.
	pub desc: &'t TypeDescriptor,
	/// Template argument texts parsed from the normalized name.
	pub args: Vec<String>,
}

impl RecipeContext<'_> {
	/// Resolve a dotted member path.
	pub fn member(&self, path: &str) -> Result<Member> {
		let (offset, ty) = self.types.resolve_member(self.ty, path)?;
		Ok(Member { offset, ty })
	}

	/// Resolve the first member path that exists.
	pub fn member_any(&self, paths: &[&str]) -> Result<Member> {
		let mut last = None;
		for path in paths {
			match self.member(path) {
				Ok(member) => return Ok(member),
				Err(err) => last = Some(err),
			}
		}
		Err(last.unwrap_or_else(|| self.unsupported("no member paths given")))
	}

	/// Resolve a member that some layouts omit.
	pub fn optional_member(&self, path: &str) -> Option<Member> {
		self.member(path).ok()
	}

	/// Resolve a member that must be a raw pointer.
	pub fn pointer_member(&self, paths: &[&str]) -> Result<Member> {
		let member = self.member_any(paths)?;
		match self.types.descriptor(member.ty)?.kind {
			TypeKind::Pointer { .. } => Ok(member),
			_ => Err(self.unsupported("expected a raw pointer member")),
		}
	}

	/// Pointee of a pointer member, when it is a sized type.
	pub fn sized_pointee(&self, member: Member) -> Option<TypeId> {
		let target = self.types.get(member.ty)?.pointee()?;
		(self.types.size_of(target) > 0).then_some(target)
	}

	/// Type template argument `idx`, from the descriptor or the parsed name.
	pub fn type_arg(&self, idx: usize) -> Result<TypeId> {
		if let Some(ty) = self.desc.template_type(idx) {
			return Ok(ty);
		}
		self.args
			.get(idx)
			.and_then(|name| self.types.lookup(name))
			.ok_or_else(|| self.unsupported("template type argument is unavailable"))
	}

	/// Integral template argument `idx`, from the descriptor or the parsed name.
	pub fn const_arg(&self, idx: usize) -> Result<i64> {
		if let Some(value) = self.desc.template_const(idx) {
			return Ok(value);
		}
		self.args
			.get(idx)
			.and_then(|text| text.trim_end_matches(['u', 'U', 'l', 'L']).parse::<i64>().ok())
			.ok_or_else(|| self.unsupported("template constant argument is unavailable"))
	}

	/// Layout error for the type being classified.
	pub fn unsupported(&self, reason: &'static str) -> InspectError {
		InspectError::LayoutUnsupported {
			type_name: self.desc.name.to_string(),
			reason,
		}
	}
}
