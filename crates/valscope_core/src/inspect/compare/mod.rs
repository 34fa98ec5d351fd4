use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use tracing::debug;

use crate::inspect::{Category, ErrorKind, InspectError, Inspector, Item, Operand, Primitive, Result};

/// Comparison operator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CompareOp {
	/// `==`
	Eq,
	/// `!=`
	Ne,
	/// `<`
	Lt,
	/// `<=`
	Le,
	/// `>`
	Gt,
	/// `>=`
	Ge,
}

impl CompareOp {
	/// Whether the operator needs an ordering rather than equality.
	pub fn is_ordering(self) -> bool {
		!matches!(self, Self::Eq | Self::Ne)
	}

	fn holds(self, ordering: Option<Ordering>) -> bool {
		match self {
			Self::Eq => ordering == Some(Ordering::Equal),
			Self::Ne => ordering != Some(Ordering::Equal),
			Self::Lt => ordering == Some(Ordering::Less),
			Self::Le => matches!(ordering, Some(Ordering::Less | Ordering::Equal)),
			Self::Gt => ordering == Some(Ordering::Greater),
			Self::Ge => matches!(ordering, Some(Ordering::Greater | Ordering::Equal)),
		}
	}
}

impl fmt::Display for CompareOp {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(match self {
			Self::Eq => "==",
			Self::Ne => "!=",
			Self::Lt => "<",
			Self::Le => "<=",
			Self::Gt => ">",
			Self::Ge => ">=",
		})
	}
}

impl FromStr for CompareOp {
	type Err = InspectError;

	fn from_str(s: &str) -> Result<Self> {
		Ok(match s {
			"eq" | "==" => Self::Eq,
			"ne" | "!=" => Self::Ne,
			"lt" | "<" => Self::Lt,
			"le" | "<=" => Self::Le,
			"gt" | ">" => Self::Gt,
			"ge" | ">=" => Self::Ge,
			_ => {
				return Err(InspectError::InvalidLiteral {
					what: "operator",
					value: s.to_owned(),
				});
			}
		})
	}
}

/// Operand after recursive dereference, with its primitive form when it has one.
#[derive(Debug, Clone)]
pub(crate) struct Resolved {
	operand: Operand,
	prim: Option<Primitive>,
}

impl Inspector<'_> {
	/// Compare two operands after recursive dereference and coercion.
	///
	/// Operands without a primitive form compare by address identity for
	/// `==`/`!=`; ordering them fails.
	pub fn compare(&self, lhs: &Operand, rhs: &Operand, op: CompareOp) -> Result<bool> {
		let lhs = self.resolve_operand(lhs)?;
		let rhs = self.resolve_operand(rhs)?;
		self.resolved_cmp(&lhs, &rhs, op)
	}

	/// Whether a container holds an element (or key, or substring) equal to `item`.
	pub fn contains(&self, container: &Operand, item: &Operand) -> Result<bool> {
		let item = self.resolve_operand(item)?;
		let container = match container {
			Operand::Native(Primitive::Text(text)) => return text_contains(text, &item),
			Operand::Native(other) => {
				return Err(InspectError::NotAContainer {
					type_name: other.kind_name().to_owned(),
				});
			}
			Operand::Value(value) => self.deref(value, true)?,
		};

		let class = self.classify(container.ty)?;
		match class.category {
			Category::SequentialContainer | Category::FixedArray | Category::AssociativeContainer => {
				for entry in self.iterate(&container)? {
					let candidate = match entry? {
						Item::Indexed { value, .. } => Operand::Value(value),
						Item::Keyed { key, .. } => key,
					};
					if self.resolved_eq(&self.resolve_operand(&candidate)?, &item)? {
						return Ok(true);
					}
				}
				Ok(false)
			}
			Category::StringLike => match self.coerce_value(&container)? {
				Primitive::Text(text) => text_contains(&text, &item),
				_ => Err(InspectError::CoercionFailed {
					type_name: self.types().name(container.ty).to_owned(),
				}),
			},
			_ => Err(InspectError::NotAContainer {
				type_name: self.types().name(container.ty).to_owned(),
			}),
		}
	}

	/// Whether an associative container maps some key to a value equal to `item`.
	pub fn values_contain(&self, container: &Operand, item: &Operand) -> Result<bool> {
		let container = match container {
			Operand::Value(value) => self.deref(value, true)?,
			Operand::Native(other) => {
				return Err(InspectError::NotAContainer {
					type_name: other.kind_name().to_owned(),
				});
			}
		};
		if self.classify(container.ty)?.category != Category::AssociativeContainer {
			return Err(InspectError::NotAContainer {
				type_name: self.types().name(container.ty).to_owned(),
			});
		}

		let item = self.resolve_operand(item)?;
		for entry in self.iterate(&container)? {
			let value = entry?.into_value();
			if self.resolved_eq(&self.resolve_operand(&Operand::Value(value))?, &item)? {
				return Ok(true);
			}
		}
		Ok(false)
	}

	pub(crate) fn resolve_operand(&self, operand: &Operand) -> Result<Resolved> {
		let operand = self.deref_operand(operand)?;
		// Over-cap or unreadable payloads leave the operand without a primitive form.
		let prim = match self.coerce(&operand) {
			Ok(prim) => Some(prim),
			Err(err) if matches!(err.kind(), ErrorKind::CoercionFailed | ErrorKind::AddressUnreadable) => {
				debug!(error = %err, "operand has no primitive form; comparing by identity");
				None
			}
			Err(err) => return Err(err),
		};
		Ok(Resolved { operand, prim })
	}

	pub(crate) fn resolved_eq(&self, lhs: &Resolved, rhs: &Resolved) -> Result<bool> {
		self.resolved_cmp(lhs, rhs, CompareOp::Eq)
	}

	fn resolved_cmp(&self, lhs: &Resolved, rhs: &Resolved, op: CompareOp) -> Result<bool> {
		match (&lhs.prim, &rhs.prim) {
			(Some(a), Some(b)) => compare_primitives(a, b, op),
			_ if op.is_ordering() => Err(InspectError::OrderingUnsupported { op }),
			_ => {
				let same = identity(&lhs.operand, &rhs.operand);
				Ok(if op == CompareOp::Eq { same } else { !same })
			}
		}
	}

	pub(crate) fn render_resolved(&self, resolved: &Resolved) -> String {
		match (&resolved.prim, &resolved.operand) {
			(Some(prim), _) => prim.to_string(),
			(None, Operand::Value(value)) => self.describe(value),
			(None, Operand::Native(prim)) => prim.to_string(),
		}
	}
}

/// Address identity; inline values are never identical.
fn identity(lhs: &Operand, rhs: &Operand) -> bool {
	match (lhs, rhs) {
		(Operand::Value(a), Operand::Value(b)) => a.address().is_some() && a.address() == b.address(),
		_ => false,
	}
}

/// Compare two primitives under `op`.
pub fn compare_primitives(lhs: &Primitive, rhs: &Primitive, op: CompareOp) -> Result<bool> {
	let ordering = match (lhs, rhs) {
		(Primitive::Text(a), Primitive::Text(b)) => Some(a.cmp(b)),
		(Primitive::Text(_), _) | (_, Primitive::Text(_)) => {
			return match op {
				CompareOp::Eq => Ok(false),
				CompareOp::Ne => Ok(true),
				_ => Err(InspectError::CoercionMismatch {
					lhs: lhs.kind_name(),
					rhs: rhs.kind_name(),
					op,
				}),
			};
		}
		(Primitive::Float(_), _) | (_, Primitive::Float(_)) => as_f64(lhs).partial_cmp(&as_f64(rhs)),
		_ => match (lhs.as_i128(), rhs.as_i128()) {
			(Some(a), Some(b)) => Some(a.cmp(&b)),
			_ => None,
		},
	};
	Ok(op.holds(ordering))
}

fn as_f64(prim: &Primitive) -> f64 {
	match prim {
		Primitive::Bool(value) => f64::from(u8::from(*value)),
		Primitive::Int(value) => *value as f64,
		Primitive::UInt(value) => *value as f64,
		Primitive::Float(value) => *value,
		Primitive::Text(_) => f64::NAN,
	}
}

fn text_contains(text: &str, item: &Resolved) -> Result<bool> {
	let code = |value: u32| char::from_u32(value).is_some_and(|ch| text.contains(ch));
	match &item.prim {
		Some(Primitive::Text(needle)) => Ok(text.contains(needle.as_str())),
		Some(Primitive::Int(value)) => Ok(u32::try_from(*value).is_ok_and(code)),
		Some(Primitive::UInt(value)) => Ok(u32::try_from(*value).is_ok_and(code)),
		Some(other) => Err(InspectError::CoercionMismatch {
			lhs: "text",
			rhs: other.kind_name(),
			op: CompareOp::Eq,
		}),
		None => Err(InspectError::CoercionFailed {
			type_name: match &item.operand {
				Operand::Value(_) => "non-primitive value".to_owned(),
				Operand::Native(prim) => prim.kind_name().to_owned(),
			},
		}),
	}
}
