use std::fmt;

use crate::inspect::TypeId;

/// Semantic category of a static type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Category {
	/// Bool, integer, char, float, or enum.
	Scalar,
	/// Raw pointer or single-owner wrapper.
	PointerLike,
	/// Reference-counted pointer or optional wrapper.
	SmartPointerLike,
	/// Character data with a recoverable length.
	StringLike,
	/// Compile-time sized inline array.
	FixedArray,
	/// Indexable container.
	SequentialContainer,
	/// Key/value container.
	AssociativeContainer,
	/// Unrecognized; terminal for every engine.
	Unknown,
}

impl Category {
	/// Whether dereference performs an indirection on this category.
	pub fn is_pointer_like(self) -> bool {
		matches!(self, Self::PointerLike | Self::SmartPointerLike)
	}

	/// Stable lowercase label.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Scalar => "scalar",
			Self::PointerLike => "pointer",
			Self::SmartPointerLike => "smart_pointer",
			Self::StringLike => "string",
			Self::FixedArray => "fixed_array",
			Self::SequentialContainer => "sequential",
			Self::AssociativeContainer => "associative",
			Self::Unknown => "unknown",
		}
	}
}

impl fmt::Display for Category {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Resolved member: byte offset from the start of the enclosing value, plus its type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Member {
	/// Byte offset from the start of the container value.
	pub offset: usize,
	/// Member type.
	pub ty: TypeId,
}

/// Offsets of the four words of a deque iterator, relative to the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DequeIter {
	/// Current element pointer.
	pub cur: usize,
	/// First element of the current buffer.
	pub first: usize,
	/// One past the last element of the current buffer.
	pub last: usize,
	/// Slot in the buffer map.
	pub node: usize,
}

/// Layout knowledge for one family, resolved once per type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LayoutRecipe {
	/// Pointer to NUL-terminated characters.
	CString {
		/// Character type.
		elem: TypeId,
	},
	/// Inline character buffer, text ends at the first NUL.
	CharArray {
		/// Buffer length in characters.
		len: usize,
		/// Character type.
		elem: TypeId,
	},
	/// Pointer plus stored length.
	PointerLengthText {
		/// Character data pointer.
		data: Member,
		/// Stored length in characters.
		len: Member,
		/// Code unit width in bytes.
		char_size: usize,
	},
	/// Elements stored inline at a fixed offset.
	Inline {
		/// Offset of element 0.
		base: usize,
		/// Element type.
		elem: TypeId,
		/// Element count.
		len: usize,
	},
	/// Single owning pointer member.
	OwnedPointer {
		/// Raw pointer member.
		ptr: Member,
	},
	/// Pointer plus reference-count bookkeeping.
	RefCounted {
		/// Raw pointer member.
		ptr: Member,
		/// Reference-count member (never exposed by dereference).
		count: Member,
	},
	/// Engaged flag plus in-place payload.
	Optional {
		/// Engaged flag.
		engaged: Member,
		/// Payload storage.
		payload: Member,
	},
	/// Value storage or owned error pointer, selected by an error flag.
	Expected {
		/// Error flag (bit 0 of its byte).
		has_error: Member,
		/// Value storage, typed as the held value.
		value: Member,
		/// Offset of the owned error pointer.
		error: usize,
		/// Type the error pointer refers to.
		error_ty: TypeId,
	},
	/// Begin/end pointer pair.
	BeginEnd {
		/// Pointer to element 0.
		begin: Member,
		/// Pointer one past the last element.
		end: Member,
		/// Element type.
		elem: TypeId,
	},
	/// Data pointer plus stored count.
	DataLength {
		/// Pointer to element 0.
		data: Member,
		/// Stored element count.
		len: Member,
		/// Element type.
		elem: TypeId,
	},
	/// Small-buffer vector that spills to the heap.
	InlineHybrid {
		/// Pointer to element 0 (inline buffer or heap).
		data: Member,
		/// Stored element count.
		len: Member,
		/// Element type.
		elem: TypeId,
		/// Offset of the inline buffer.
		inline_offset: usize,
	},
	/// Circular doubly linked list with an in-object sentinel.
	LinkedNodes {
		/// Offset of the sentinel node.
		head: usize,
		/// Stored size, when the layout has one.
		size: Option<Member>,
		/// Element type.
		elem: TypeId,
	},
	/// Segmented buffer array.
	Deque {
		/// Start iterator.
		start: DequeIter,
		/// Finish iterator.
		finish: DequeIter,
		/// Element type.
		elem: TypeId,
	},
	/// Container adapter over an inner container member.
	Adapter {
		/// Wrapped container.
		inner: Member,
	},
	/// Small vector until the first spill, then a tree set.
	SmallSet {
		/// Inline vector member.
		vector: Member,
		/// Spill set member.
		set: Member,
	},
	/// Red-black tree with an in-object header node.
	RbTree {
		/// Offset of the header node.
		header: usize,
		/// Stored node count.
		count: Member,
		/// Key type.
		key: TypeId,
		/// Mapped type for maps; `None` for sets.
		mapped: Option<TypeId>,
	},
	/// Open-addressed bucket table keyed by strings.
	StringMapTable {
		/// Bucket array pointer.
		table: Member,
		/// Bucket count.
		buckets: Member,
		/// Live item count.
		items: Member,
		/// Value type.
		value: TypeId,
	},
}

impl LayoutRecipe {
	/// Stable lowercase tag.
	pub fn tag(&self) -> &'static str {
		match self {
			Self::CString { .. } => "cstring",
			Self::CharArray { .. } => "char_array",
			Self::PointerLengthText { .. } => "pointer_length_text",
			Self::Inline { .. } => "inline",
			Self::OwnedPointer { .. } => "owned_pointer",
			Self::RefCounted { .. } => "ref_counted",
			Self::Optional { .. } => "optional",
			Self::Expected { .. } => "expected",
			Self::BeginEnd { .. } => "begin_end",
			Self::DataLength { .. } => "data_length",
			Self::InlineHybrid { .. } => "inline_hybrid",
			Self::LinkedNodes { .. } => "linked_nodes",
			Self::Deque { .. } => "deque",
			Self::Adapter { .. } => "adapter",
			Self::SmallSet { .. } => "small_set",
			Self::RbTree { .. } => "rb_tree",
			Self::StringMapTable { .. } => "string_map",
		}
	}
}

/// Classifier output for one type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Classification {
	/// Semantic category.
	pub category: Category,
	/// Layout recipe; `None` for scalars, raw pointers, and unknown types.
	pub recipe: Option<LayoutRecipe>,
	/// Matched family name (`"scalar"`, `"pointer"`, `"std::vector"`, `"structural"`, ...).
	pub family: &'static str,
}

impl Classification {
	pub(crate) fn plain(category: Category, family: &'static str) -> Self {
		Self {
			category,
			recipe: None,
			family,
		}
	}

	pub(crate) fn with_recipe(category: Category, family: &'static str, recipe: LayoutRecipe) -> Self {
		Self {
			category,
			recipe: Some(recipe),
			family,
		}
	}

	/// Unknown classification.
	pub fn unknown() -> Self {
		Self::plain(Category::Unknown, "unknown")
	}
}
