use std::collections::HashSet;

use tracing::trace;

use crate::inspect::{InspectError, InspectedValue, Inspector, LayoutRecipe, Operand, Result, TypeId};

impl Inspector<'_> {
	/// Follow pointer-like indirection once, or until the value stops being pointer-like.
	///
	/// Non-pointer values come back unchanged unless `strict_deref` is set
	/// and a single step was requested.
	pub fn deref(&self, value: &InspectedValue, recursive: bool) -> Result<InspectedValue> {
		if !recursive {
			return match self.deref_step(value)? {
				Some(next) => Ok(next),
				None if self.options().strict_deref => Err(InspectError::NotAPointer {
					type_name: self.types().name(value.ty).to_owned(),
				}),
				None => Ok(value.clone()),
			};
		}

		let max_depth = self.options().max_deref_depth;
		let mut seen: HashSet<(u64, TypeId)> = HashSet::new();
		if let Some(addr) = value.address() {
			seen.insert((addr, value.ty));
		}

		let mut current = value.clone();
		let mut depth = 0_usize;
		while let Some(next) = self.deref_step(&current)? {
			depth += 1;
			if depth > max_depth {
				return Err(InspectError::DerefDepthExceeded { max_depth });
			}
			if let Some(addr) = next.address()
				&& !seen.insert((addr, next.ty))
			{
				return Err(InspectError::DerefCycle { addr });
			}
			current = next;
		}

		Ok(current)
	}

	/// Recursively dereference a process value; native operands pass through.
	pub fn deref_operand(&self, operand: &Operand) -> Result<Operand> {
		match operand {
			Operand::Value(value) => self.deref(value, true).map(Operand::Value),
			Operand::Native(_) => Ok(operand.clone()),
		}
	}

	/// One indirection step, or `None` when the value is not pointer-like.
	fn deref_step(&self, value: &InspectedValue) -> Result<Option<InspectedValue>> {
		let class = self.classify(value.ty)?;
		if !class.category.is_pointer_like() {
			return Ok(None);
		}

		let next = match class.recipe {
			None => {
				let target = self.pointee(value.ty)?;
				let addr = self.read_ptr_in(value, 0)?;
				self.checked_target(addr, target)?
			}
			Some(LayoutRecipe::OwnedPointer { ptr } | LayoutRecipe::RefCounted { ptr, .. }) => {
				let target = self.pointee(ptr.ty)?;
				let addr = self.read_ptr_in(value, ptr.offset)?;
				self.checked_target(addr, target)?
			}
			Some(LayoutRecipe::Optional { engaged, payload }) => {
				if self.read_member_uint(value, engaged)? == 0 {
					return Err(InspectError::EmptyOptional {
						type_name: self.types().name(value.ty).to_owned(),
					});
				}
				self.project(value, payload.offset, payload.ty)?
			}
			Some(LayoutRecipe::Expected {
				has_error,
				value: held,
				error,
				error_ty,
			}) => {
				if self.read_member_uint(value, has_error)? & 1 != 0 {
					let addr = self.read_ptr_in(value, error)?;
					self.checked_target(addr, error_ty)?
				} else {
					self.project(value, held.offset, held.ty)?
				}
			}
			Some(_) => {
				return Err(InspectError::LayoutUnsupported {
					type_name: self.types().name(value.ty).to_owned(),
					reason: "recipe has no pointer member",
				});
			}
		};

		trace!(from = %self.describe(value), to = %self.describe(&next), "deref step");
		Ok(Some(next))
	}
}
