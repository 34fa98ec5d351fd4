use crate::inspect::bytes::align_up;
use crate::inspect::{Category, DequeIter, FamilyPattern, LayoutRecipe, Member, RecipeContext, Result, TypeId, TypeKind, normalize_type_name, split_template};

pub(super) fn standard() -> Vec<FamilyPattern> {
	vec![
		FamilyPattern {
			family: "llvm::SmallString",
			names: &["llvm::SmallString"],
			arity: 1..=1,
			category: Category::StringLike,
			build: small_string,
		},
		FamilyPattern {
			family: "std::string",
			names: &["std::basic_string", "std::string"],
			arity: 0..=3,
			category: Category::StringLike,
			build: std_string,
		},
		FamilyPattern {
			family: "std::string_view",
			names: &["std::basic_string_view", "std::string_view"],
			arity: 0..=2,
			category: Category::StringLike,
			build: string_view,
		},
		FamilyPattern {
			family: "llvm::StringRef",
			names: &["llvm::StringRef"],
			arity: 0..=0,
			category: Category::StringLike,
			build: string_ref,
		},
		FamilyPattern {
			family: "std::unique_ptr",
			names: &["std::unique_ptr"],
			arity: 1..=2,
			category: Category::SmartPointerLike,
			build: unique_ptr,
		},
		FamilyPattern {
			family: "std::shared_ptr",
			names: &["std::shared_ptr", "std::weak_ptr"],
			arity: 1..=1,
			category: Category::SmartPointerLike,
			build: shared_ptr,
		},
		FamilyPattern {
			family: "std::optional",
			names: &["std::optional"],
			arity: 1..=1,
			category: Category::SmartPointerLike,
			build: std_optional,
		},
		FamilyPattern {
			family: "llvm::Optional",
			names: &["llvm::Optional"],
			arity: 1..=1,
			category: Category::SmartPointerLike,
			build: llvm_optional,
		},
		FamilyPattern {
			family: "llvm::Expected",
			names: &["llvm::Expected"],
			arity: 1..=1,
			category: Category::SmartPointerLike,
			build: llvm_expected,
		},
		FamilyPattern {
			family: "llvm::Error",
			names: &["llvm::Error"],
			arity: 0..=0,
			category: Category::SmartPointerLike,
			build: llvm_error,
		},
		FamilyPattern {
			family: "llvm::SmallVector",
			names: &["llvm::SmallVector", "llvm::SmallVectorImpl"],
			arity: 1..=2,
			category: Category::SequentialContainer,
			build: small_vector,
		},
		FamilyPattern {
			family: "llvm::SmallSet",
			names: &["llvm::SmallSet"],
			arity: 2..=3,
			category: Category::SequentialContainer,
			build: small_set,
		},
		FamilyPattern {
			family: "std::vector",
			names: &["std::vector"],
			arity: 1..=2,
			category: Category::SequentialContainer,
			build: std_vector,
		},
		FamilyPattern {
			family: "llvm::ArrayRef",
			names: &["llvm::ArrayRef", "llvm::MutableArrayRef"],
			arity: 1..=1,
			category: Category::SequentialContainer,
			build: array_ref,
		},
		FamilyPattern {
			family: "std::array",
			names: &["std::array"],
			arity: 2..=2,
			category: Category::FixedArray,
			build: std_array,
		},
		FamilyPattern {
			family: "std::list",
			names: &["std::list"],
			arity: 1..=2,
			category: Category::SequentialContainer,
			build: std_list,
		},
		FamilyPattern {
			family: "std::deque",
			names: &["std::deque", "std::_Deque_base"],
			arity: 1..=2,
			category: Category::SequentialContainer,
			build: std_deque,
		},
		FamilyPattern {
			family: "std::queue",
			names: &["std::queue", "std::stack"],
			arity: 1..=2,
			category: Category::SequentialContainer,
			build: adapter,
		},
		FamilyPattern {
			family: "std::set",
			names: &["std::set", "std::multiset"],
			arity: 1..=3,
			category: Category::SequentialContainer,
			build: std_set,
		},
		FamilyPattern {
			family: "std::map",
			names: &["std::map", "std::multimap"],
			arity: 2..=4,
			category: Category::AssociativeContainer,
			build: std_map,
		},
		FamilyPattern {
			family: "llvm::StringMap",
			names: &["llvm::StringMap"],
			arity: 1..=2,
			category: Category::AssociativeContainer,
			build: string_map,
		},
	]
}

fn text(cx: &RecipeContext<'_>, data: &str, len: &str) -> Result<LayoutRecipe> {
	let data = cx.pointer_member(&[data])?;
	let len = cx.member(len)?;
	let char_size = cx.sized_pointee(data).map(|ty| cx.types.size_of(ty)).unwrap_or(1);
	Ok(LayoutRecipe::PointerLengthText { data, len, char_size })
}

fn small_string(cx: &RecipeContext<'_>) -> Result<LayoutRecipe> {
	text(cx, "BeginX", "Size")
}

fn std_string(cx: &RecipeContext<'_>) -> Result<LayoutRecipe> {
	text(cx, "_M_dataplus._M_p", "_M_string_length")
}

fn string_view(cx: &RecipeContext<'_>) -> Result<LayoutRecipe> {
	text(cx, "_M_str", "_M_len")
}

fn string_ref(cx: &RecipeContext<'_>) -> Result<LayoutRecipe> {
	text(cx, "Data", "Length")
}

fn unique_ptr(cx: &RecipeContext<'_>) -> Result<LayoutRecipe> {
	let ptr = cx.pointer_member(&["_M_t._M_t._M_head_impl", "_M_t._M_head_impl"])?;
	Ok(LayoutRecipe::OwnedPointer { ptr })
}

fn shared_ptr(cx: &RecipeContext<'_>) -> Result<LayoutRecipe> {
	let ptr = cx.pointer_member(&["_M_ptr"])?;
	let count = cx.member("_M_refcount")?;
	Ok(LayoutRecipe::RefCounted { ptr, count })
}

fn std_optional(cx: &RecipeContext<'_>) -> Result<LayoutRecipe> {
	let engaged = cx.member("_M_payload._M_engaged")?;
	let payload = cx.member("_M_payload._M_payload._M_value")?;
	Ok(LayoutRecipe::Optional { engaged, payload })
}

fn llvm_optional(cx: &RecipeContext<'_>) -> Result<LayoutRecipe> {
	let engaged = cx.member("Storage.hasVal")?;
	let payload = cx.member_any(&["Storage.val", "Storage.value"])?;
	Ok(LayoutRecipe::Optional { engaged, payload })
}

fn llvm_expected(cx: &RecipeContext<'_>) -> Result<LayoutRecipe> {
	let has_error = cx.member("HasError")?;
	let storage = cx.member("TStorage")?;
	let value = Member {
		offset: storage.offset,
		ty: cx.type_arg(0)?,
	};
	// ErrorStorage is a char-array union over std::unique_ptr<ErrorInfoBase>.
	let error = cx.member("ErrorStorage")?;
	let error_ty = first_type_arg(cx, error.ty)
		.and_then(|owner| first_type_arg(cx, owner))
		.ok_or_else(|| cx.unsupported("error storage does not name its payload type"))?;
	Ok(LayoutRecipe::Expected {
		has_error,
		value,
		error: error.offset,
		error_ty,
	})
}

/// First type argument of `ty`, from its descriptor or its parsed name.
fn first_type_arg(cx: &RecipeContext<'_>, ty: TypeId) -> Option<TypeId> {
	let desc = cx.types.get(ty)?;
	desc.template_type(0).or_else(|| {
		let name = normalize_type_name(&desc.name);
		split_template(&name).args.first().and_then(|arg| cx.types.lookup(arg))
	})
}

fn llvm_error(cx: &RecipeContext<'_>) -> Result<LayoutRecipe> {
	let ptr = cx.pointer_member(&["Payload"])?;
	Ok(LayoutRecipe::OwnedPointer { ptr })
}

fn small_vector(cx: &RecipeContext<'_>) -> Result<LayoutRecipe> {
	let data = cx.pointer_member(&["BeginX"])?;
	let len = cx.member("Size")?;
	let elem = cx.type_arg(0)?;
	let header = cx.optional_member("Capacity").unwrap_or(len);
	let header_end = header.offset + cx.types.size_of(header.ty);
	Ok(LayoutRecipe::InlineHybrid {
		data,
		len,
		elem,
		inline_offset: align_up(header_end, cx.types.align_of(elem)),
	})
}

fn small_set(cx: &RecipeContext<'_>) -> Result<LayoutRecipe> {
	Ok(LayoutRecipe::SmallSet {
		vector: cx.member("Vector")?,
		set: cx.member("Set")?,
	})
}

fn std_vector(cx: &RecipeContext<'_>) -> Result<LayoutRecipe> {
	let begin = cx.pointer_member(&["_M_impl._M_start"])?;
	let end = cx.pointer_member(&["_M_impl._M_finish"])?;
	let elem = match cx.sized_pointee(begin) {
		Some(elem) => elem,
		None => cx.type_arg(0)?,
	};
	Ok(LayoutRecipe::BeginEnd { begin, end, elem })
}

fn array_ref(cx: &RecipeContext<'_>) -> Result<LayoutRecipe> {
	let data = cx.pointer_member(&["Data"])?;
	let len = cx.member("Length")?;
	let elem = match cx.sized_pointee(data) {
		Some(elem) => elem,
		None => cx.type_arg(0)?,
	};
	Ok(LayoutRecipe::DataLength { data, len, elem })
}

fn std_array(cx: &RecipeContext<'_>) -> Result<LayoutRecipe> {
	let elems = cx.member("_M_elems")?;
	if let TypeKind::Array { elem, len } = cx.types.descriptor(elems.ty)?.kind {
		return Ok(LayoutRecipe::Inline {
			base: elems.offset,
			elem,
			len,
		});
	}

	let elem = cx.type_arg(0)?;
	let len = usize::try_from(cx.const_arg(1)?).map_err(|_| cx.unsupported("negative array extent"))?;
	Ok(LayoutRecipe::Inline {
		base: elems.offset,
		elem,
		len,
	})
}

fn std_list(cx: &RecipeContext<'_>) -> Result<LayoutRecipe> {
	let head = cx.member("_M_impl._M_node")?;
	Ok(LayoutRecipe::LinkedNodes {
		head: head.offset,
		size: cx.optional_member("_M_impl._M_node._M_size"),
		elem: cx.type_arg(0)?,
	})
}

fn deque_iter(cx: &RecipeContext<'_>, prefix: &str) -> Result<DequeIter> {
	let word = |name: &str| cx.pointer_member(&[&format!("{prefix}.{name}")]).map(|member| member.offset);
	Ok(DequeIter {
		cur: word("_M_cur")?,
		first: word("_M_first")?,
		last: word("_M_last")?,
		node: word("_M_node")?,
	})
}

fn std_deque(cx: &RecipeContext<'_>) -> Result<LayoutRecipe> {
	let start = deque_iter(cx, "_M_impl._M_start")?;
	let finish = deque_iter(cx, "_M_impl._M_finish")?;
	let cur = cx.pointer_member(&["_M_impl._M_start._M_cur"])?;
	let elem = match cx.sized_pointee(cur) {
		Some(elem) => elem,
		None => cx.type_arg(0)?,
	};
	Ok(LayoutRecipe::Deque { start, finish, elem })
}

fn adapter(cx: &RecipeContext<'_>) -> Result<LayoutRecipe> {
	Ok(LayoutRecipe::Adapter { inner: cx.member("c")? })
}

fn std_set(cx: &RecipeContext<'_>) -> Result<LayoutRecipe> {
	Ok(LayoutRecipe::RbTree {
		header: cx.member("_M_t._M_impl._M_header")?.offset,
		count: cx.member("_M_t._M_impl._M_node_count")?,
		key: cx.type_arg(0)?,
		mapped: None,
	})
}

fn std_map(cx: &RecipeContext<'_>) -> Result<LayoutRecipe> {
	Ok(LayoutRecipe::RbTree {
		header: cx.member("_M_t._M_impl._M_header")?.offset,
		count: cx.member("_M_t._M_impl._M_node_count")?,
		key: cx.type_arg(0)?,
		mapped: Some(cx.type_arg(1)?),
	})
}

fn string_map(cx: &RecipeContext<'_>) -> Result<LayoutRecipe> {
	Ok(LayoutRecipe::StringMapTable {
		table: cx.pointer_member(&["TheTable"])?,
		buckets: cx.member("NumBuckets")?,
		items: cx.member("NumItems")?,
		value: cx.type_arg(0)?,
	})
}
