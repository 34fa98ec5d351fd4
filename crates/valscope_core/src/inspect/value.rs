use std::fmt;
use std::sync::Arc;

use serde::Serialize;

use crate::inspect::TypeId;

/// Where the bytes of an inspected value live.
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
	/// Value lives in process memory at this address.
	Address(u64),
	/// Value bytes were already copied out of the process (registers, temporaries).
	Inline(Arc<[u8]>),
}

/// A typed value inside the inspected process.
///
/// Read-only and cheap to clone; projections derive new values.
#[derive(Debug, Clone, PartialEq)]
pub struct InspectedValue {
	/// Static type of the value.
	pub ty: TypeId,
	/// Storage of the value bytes.
	pub location: Location,
}

impl InspectedValue {
	/// Value located at a process address.
	pub fn at(ty: TypeId, addr: u64) -> Self {
		Self {
			ty,
			location: Location::Address(addr),
		}
	}

	/// Value carried by its own bytes.
	pub fn inline(ty: TypeId, bytes: impl Into<Arc<[u8]>>) -> Self {
		Self {
			ty,
			location: Location::Inline(bytes.into()),
		}
	}

	/// Process address for address-located values.
	pub fn address(&self) -> Option<u64> {
		match self.location {
			Location::Address(addr) => Some(addr),
			Location::Inline(_) => None,
		}
	}
}

/// Native scalar extracted from an inspected value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Primitive {
	/// Boolean.
	Bool(bool),
	/// Signed integer (also chars and signed enums).
	Int(i64),
	/// Unsigned integer.
	UInt(u64),
	/// Floating point.
	Float(f64),
	/// Decoded text.
	Text(String),
}

impl Primitive {
	/// Short lowercase kind label used in error messages.
	pub fn kind_name(&self) -> &'static str {
		match self {
			Self::Bool(_) => "bool",
			Self::Int(_) => "int",
			Self::UInt(_) => "uint",
			Self::Float(_) => "float",
			Self::Text(_) => "text",
		}
	}

	/// Whether this is a number (bools count as 0/1).
	pub fn is_numeric(&self) -> bool {
		!matches!(self, Self::Text(_))
	}

	/// Integer view of integral kinds; `None` for floats and text.
	pub fn as_i128(&self) -> Option<i128> {
		match self {
			Self::Bool(value) => Some(i128::from(*value)),
			Self::Int(value) => Some(i128::from(*value)),
			Self::UInt(value) => Some(i128::from(*value)),
			Self::Float(_) | Self::Text(_) => None,
		}
	}
}

impl fmt::Display for Primitive {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Bool(value) => write!(f, "{value}"),
			Self::Int(value) => write!(f, "{value}"),
			Self::UInt(value) => write!(f, "{value}"),
			Self::Float(value) => write!(f, "{value}"),
			Self::Text(value) => write!(f, "{value:?}"),
		}
	}
}

/// Operand of a lookup, comparison, or membership test.
#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
	/// Value inside the inspected process.
	Value(InspectedValue),
	/// Native scalar supplied by the caller.
	Native(Primitive),
}

impl From<InspectedValue> for Operand {
	fn from(value: InspectedValue) -> Self {
		Self::Value(value)
	}
}

impl From<Primitive> for Operand {
	fn from(value: Primitive) -> Self {
		Self::Native(value)
	}
}

impl From<bool> for Operand {
	fn from(value: bool) -> Self {
		Self::Native(Primitive::Bool(value))
	}
}

impl From<i64> for Operand {
	fn from(value: i64) -> Self {
		Self::Native(Primitive::Int(value))
	}
}

impl From<u64> for Operand {
	fn from(value: u64) -> Self {
		Self::Native(Primitive::UInt(value))
	}
}

impl From<f64> for Operand {
	fn from(value: f64) -> Self {
		Self::Native(Primitive::Float(value))
	}
}

impl From<&str> for Operand {
	fn from(value: &str) -> Self {
		Self::Native(Primitive::Text(value.to_owned()))
	}
}

impl From<String> for Operand {
	fn from(value: String) -> Self {
		Self::Native(Primitive::Text(value))
	}
}
