use thiserror::Error;

use crate::inspect::CompareOp;

/// Crate-local result type.
pub type Result<T> = std::result::Result<T, InspectError>;

/// Coarse failure class reported to the command layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
	/// Memory at an address could not be read (null, unmapped, process gone).
	AddressUnreadable,
	/// Sequential index outside `0..len`.
	IndexOutOfRange,
	/// Associative lookup found no structurally equal key.
	KeyNotFound,
	/// Element access or membership on a value that is not a container.
	NotAContainer,
	/// Strict dereference of a value that is not pointer-like.
	NotAPointer,
	/// Value cannot be reduced to a native primitive.
	CoercionFailed,
	/// Primitives of incompatible kinds were combined.
	CoercionMismatch,
	/// Ordering requested on values without a native ordering.
	OrderingUnsupported,
	/// Indirection revisited an address or exceeded the depth budget.
	CycleOrDepthExceeded,
	/// Type layout lacks a member or parameter the recipe needs.
	LayoutUnsupported,
	/// Optional-like wrapper holds no value.
	EmptyOptional,
	/// Snapshot loading or decoding failed.
	Snapshot,
}

/// Errors produced while classifying, traversing, and comparing inspected values.
#[derive(Debug, Error)]
pub enum InspectError {
	/// Memory read failed for the requested range.
	#[error("cannot read {len} bytes at 0x{addr:016x}")]
	AddressUnreadable {
		/// Start address of the failed read.
		addr: u64,
		/// Requested byte count.
		len: usize,
	},
	/// Sequential index out of range.
	#[error("index {index} out of range (size={len})")]
	IndexOutOfRange {
		/// Requested index.
		index: i64,
		/// Reported element count.
		len: usize,
	},
	/// Sequential key did not coerce to an integer.
	#[error("index must be an integer, got {got}")]
	InvalidIndexKey {
		/// Primitive kind of the supplied key.
		got: &'static str,
	},
	/// No associative key matched.
	#[error("key {key} not found in {type_name}")]
	KeyNotFound {
		/// Rendered lookup key.
		key: String,
		/// Container type name.
		type_name: String,
	},
	/// Value does not classify as a supported container.
	#[error("{type_name} is not a supported container")]
	NotAContainer {
		/// Offending type name.
		type_name: String,
	},
	/// Value is not pointer-like and strict dereference was requested.
	#[error("{type_name} is not pointer-like")]
	NotAPointer {
		/// Offending type name.
		type_name: String,
	},
	/// Value has no native primitive representation.
	#[error("cannot coerce {type_name} to a primitive")]
	CoercionFailed {
		/// Offending type name.
		type_name: String,
	},
	/// String payload exceeds the configured read cap.
	#[error("string length {len} exceeds limit {max}")]
	StringTooLong {
		/// Reported (or scanned) length.
		len: usize,
		/// Configured maximum.
		max: usize,
	},
	/// Primitive kinds cannot be ordered against each other.
	#[error("cannot apply {op} to {lhs} and {rhs}")]
	CoercionMismatch {
		/// Left primitive kind.
		lhs: &'static str,
		/// Right primitive kind.
		rhs: &'static str,
		/// Requested operator.
		op: CompareOp,
	},
	/// Ordering requested on non-coercible operands.
	#[error("{op} is not supported on values without a primitive representation")]
	OrderingUnsupported {
		/// Requested operator.
		op: CompareOp,
	},
	/// Recursive dereference revisited an address.
	#[error("dereference cycle detected at 0x{addr:016x}")]
	DerefCycle {
		/// Address seen twice.
		addr: u64,
	},
	/// Recursive dereference exceeded its budget.
	#[error("dereference depth exceeded (max={max_depth})")]
	DerefDepthExceeded {
		/// Configured depth ceiling.
		max_depth: usize,
	},
	/// Node walk without a stored size exceeded its budget.
	#[error("node walk exceeded {max} links without returning to the head")]
	NodeWalkExceeded {
		/// Configured link ceiling.
		max: usize,
	},
	/// Optional-like wrapper is disengaged.
	#[error("{type_name} holds no value")]
	EmptyOptional {
		/// Wrapper type name.
		type_name: String,
	},
	/// Member path missing from a type layout.
	#[error("{type_name} has no member {member}")]
	MissingMember {
		/// Type searched.
		type_name: String,
		/// Requested member path.
		member: String,
	},
	/// Layout recipe cannot be built for a type.
	#[error("unsupported layout for {type_name}: {reason}")]
	LayoutUnsupported {
		/// Type being classified.
		type_name: String,
		/// Human-readable cause.
		reason: &'static str,
	},
	/// Type id does not exist in the table.
	#[error("unknown type id {id}")]
	UnknownTypeId {
		/// Offending id.
		id: u32,
	},
	/// Type name does not exist in the table.
	#[error("unknown type {name}")]
	UnknownType {
		/// Requested name.
		name: String,
	},
	/// Type name was declared twice with a definition.
	#[error("duplicate type definition {name}")]
	DuplicateType {
		/// Duplicated name.
		name: String,
	},
	/// Member path expression syntax is invalid.
	#[error("invalid member path: {path}")]
	InvalidMemberPath {
		/// Original path text.
		path: String,
	},
	/// Filesystem or stream failure.
	#[error("io: {0}")]
	Io(#[from] std::io::Error),
	/// Snapshot JSON could not be parsed.
	#[error("snapshot json: {0}")]
	Json(#[from] serde_json::Error),
	/// Decompressed snapshot exceeded the safety limit.
	#[error("decompressed snapshot exceeded limit {limit} bytes")]
	DecompressedTooLarge {
		/// Maximum allowed output bytes.
		limit: usize,
	},
	/// Snapshot literal could not be parsed.
	#[error("invalid {what} literal: {value}")]
	InvalidLiteral {
		/// Literal category (`address`, `hex`, ...).
		what: &'static str,
		/// Offending text.
		value: String,
	},
	/// Snapshot symbol does not exist.
	#[error("unknown symbol {name}")]
	UnknownSymbol {
		/// Requested symbol name.
		name: String,
	},
	/// Target pointer width is not 4 or 8 bytes.
	#[error("unsupported pointer size {size}")]
	UnsupportedPointerSize {
		/// Declared pointer width.
		size: usize,
	},
	/// Captured regions overlap.
	#[error("memory regions overlap at 0x{addr:016x}")]
	OverlappingRegions {
		/// Start of the second region.
		addr: u64,
	},
}

impl InspectError {
	/// Map this error onto its coarse failure class.
	pub fn kind(&self) -> ErrorKind {
		match self {
			Self::AddressUnreadable { .. } => ErrorKind::AddressUnreadable,
			Self::IndexOutOfRange { .. } => ErrorKind::IndexOutOfRange,
			Self::KeyNotFound { .. } => ErrorKind::KeyNotFound,
			Self::NotAContainer { .. } => ErrorKind::NotAContainer,
			Self::NotAPointer { .. } => ErrorKind::NotAPointer,
			Self::CoercionFailed { .. } | Self::StringTooLong { .. } => ErrorKind::CoercionFailed,
			Self::InvalidIndexKey { .. } | Self::CoercionMismatch { .. } => ErrorKind::CoercionMismatch,
			Self::OrderingUnsupported { .. } => ErrorKind::OrderingUnsupported,
			Self::DerefCycle { .. } | Self::DerefDepthExceeded { .. } | Self::NodeWalkExceeded { .. } => ErrorKind::CycleOrDepthExceeded,
			Self::EmptyOptional { .. } => ErrorKind::EmptyOptional,
			Self::MissingMember { .. } | Self::LayoutUnsupported { .. } | Self::UnknownTypeId { .. } | Self::UnknownType { .. } => {
				ErrorKind::LayoutUnsupported
			}
			Self::DuplicateType { .. }
			| Self::InvalidMemberPath { .. }
			| Self::Io(_)
			| Self::Json(_)
			| Self::DecompressedTooLarge { .. }
			| Self::InvalidLiteral { .. }
			| Self::UnknownSymbol { .. }
			| Self::UnsupportedPointerSize { .. }
			| Self::OverlappingRegions { .. } => ErrorKind::Snapshot,
		}
	}
}
