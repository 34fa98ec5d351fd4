//! libstdc++ / LLVM ADT layouts (LP64) and image writers shared by unit tests.

use valscope_testkit::HeapImage;

use crate::inspect::{Field, Inspector, RegionMap, TargetInfo, TypeDescriptor, TypeId, TypeKind, TypeTable};

pub(crate) const BASE: u64 = 0x10_000;

pub(crate) struct Std {
	pub(crate) types: TypeTable,
	pub(crate) int: TypeId,
	pub(crate) uint: TypeId,
	pub(crate) ulong: TypeId,
	pub(crate) char_: TypeId,
	pub(crate) bool_: TypeId,
	pub(crate) double: TypeId,
	pub(crate) void: TypeId,
	pub(crate) string: TypeId,
}

impl Std {
	pub(crate) fn new() -> Self {
		let mut types = TypeTable::new();
		let mut scalar = |name: &str, size: usize, kind: TypeKind| types.insert(TypeDescriptor::new(name, size, size, kind)).expect("scalar inserts");
		let int = scalar("int", 4, TypeKind::Int { signed: true });
		let uint = scalar("unsigned int", 4, TypeKind::Int { signed: false });
		let ulong = scalar("unsigned long", 8, TypeKind::Int { signed: false });
		let char_ = scalar("char", 1, TypeKind::Char { signed: true });
		let bool_ = scalar("bool", 1, TypeKind::Bool);
		let double = scalar("double", 8, TypeKind::Float);
		let void = types.insert(TypeDescriptor::new("void", 0, 1, TypeKind::Void)).expect("void inserts");

		let mut this = Self {
			types,
			int,
			uint,
			ulong,
			char_,
			bool_,
			double,
			void,
			string: TypeId(0),
		};
		this.string = this.std_string();
		this
	}

	pub(crate) fn ptr(&mut self, target: TypeId) -> TypeId {
		self.types.pointer_to(target, 8)
	}

	pub(crate) fn record(&mut self, name: &str, size: usize, align: usize, fields: Vec<Field>) -> TypeId {
		if let Some(id) = self.types.lookup(name)
			&& self.types.get(id).is_some_and(|desc| desc.kind != TypeKind::Opaque)
		{
			return id;
		}
		let id = self.types.declare(name);
		self.types
			.define(id, TypeDescriptor::new(name, size, align, TypeKind::Struct { fields }))
			.expect("record defines");
		id
	}

	pub(crate) fn name(&self, ty: TypeId) -> String {
		self.types.name(ty).to_owned()
	}

	fn std_string(&mut self) -> TypeId {
		let name = "std::__cxx11::basic_string<char, std::char_traits<char>, std::allocator<char> >";
		let char_ptr = self.ptr(self.char_);
		let hider = self.record(&format!("{name}::_Alloc_hider"), 8, 8, vec![Field::member("_M_p", 0, char_ptr)]);
		let local = self.types.array_of(self.char_, 16);
		let ulong = self.ulong;
		self.record(
			name,
			32,
			8,
			vec![
				Field::member("_M_dataplus", 0, hider),
				Field::member("_M_string_length", 8, ulong),
				Field::member("_M_local_buf", 16, local),
			],
		)
	}

	pub(crate) fn vector_of(&mut self, elem: TypeId) -> TypeId {
		let e = self.name(elem);
		let elem_ptr = self.ptr(elem);
		let imp = self.record(
			&format!("std::_Vector_base<{e}, std::allocator<{e}> >::_Vector_impl"),
			24,
			8,
			vec![
				Field::member("_M_start", 0, elem_ptr),
				Field::member("_M_finish", 8, elem_ptr),
				Field::member("_M_end_of_storage", 16, elem_ptr),
			],
		);
		self.record(&format!("std::vector<{e}, std::allocator<{e}> >"), 24, 8, vec![Field::member("_M_impl", 0, imp)])
	}

	pub(crate) fn list_of(&mut self, elem: TypeId) -> TypeId {
		let e = self.name(elem);
		let node_base = self.types.declare("std::__detail::_List_node_base");
		let node_ptr = self.ptr(node_base);
		let node_base = self.record(
			"std::__detail::_List_node_base",
			16,
			8,
			vec![Field::member("_M_next", 0, node_ptr), Field::member("_M_prev", 8, node_ptr)],
		);
		let ulong = self.ulong;
		let header = self.record(
			"std::__detail::_List_node_header",
			24,
			8,
			vec![Field::base("std::__detail::_List_node_base", 0, node_base), Field::member("_M_size", 16, ulong)],
		);
		let imp = self.record(
			&format!("std::__cxx11::_List_base<{e}, std::allocator<{e}> >::_List_impl"),
			24,
			8,
			vec![Field::member("_M_node", 0, header)],
		);
		self.record(&format!("std::__cxx11::list<{e}, std::allocator<{e}> >"), 24, 8, vec![Field::member("_M_impl", 0, imp)])
	}

	fn rb_tree_impl(&mut self, tree_name: &str) -> TypeId {
		let node_base = self.types.declare("std::_Rb_tree_node_base");
		let node_ptr = self.ptr(node_base);
		let int = self.int;
		let node_base = self.record(
			"std::_Rb_tree_node_base",
			32,
			8,
			vec![
				Field::member("_M_color", 0, int),
				Field::member("_M_parent", 8, node_ptr),
				Field::member("_M_left", 16, node_ptr),
				Field::member("_M_right", 24, node_ptr),
			],
		);
		let ulong = self.ulong;
		let header = self.record(
			"std::_Rb_tree_header",
			40,
			8,
			vec![Field::member("_M_header", 0, node_base), Field::member("_M_node_count", 32, ulong)],
		);
		let imp = self.record(
			&format!("{tree_name}::_Rb_tree_impl"),
			48,
			8,
			vec![Field::base("std::_Rb_tree_header", 8, header)],
		);
		self.record(tree_name, 48, 8, vec![Field::member("_M_impl", 0, imp)])
	}

	pub(crate) fn map_of(&mut self, key: TypeId, value: TypeId) -> TypeId {
		let (k, v) = (self.name(key), self.name(value));
		let pair = format!("std::pair<{k} const, {v}>");
		let tree = self.rb_tree_impl(&format!("std::_Rb_tree<{k}, {pair}, std::_Select1st<{pair}>, std::less<{k}>, std::allocator<{pair}> >"));
		self.record(
			&format!("std::map<{k}, {v}, std::less<{k}>, std::allocator<{pair}> >"),
			48,
			8,
			vec![Field::member("_M_t", 0, tree)],
		)
	}

	pub(crate) fn set_of(&mut self, key: TypeId) -> TypeId {
		let k = self.name(key);
		let tree = self.rb_tree_impl(&format!("std::_Rb_tree<{k}, {k}, std::_Identity<{k}>, std::less<{k}>, std::allocator<{k}> >"));
		self.record(
			&format!("std::set<{k}, std::less<{k}>, std::allocator<{k}> >"),
			48,
			8,
			vec![Field::member("_M_t", 0, tree)],
		)
	}

	pub(crate) fn unique_ptr_of(&mut self, elem: TypeId) -> TypeId {
		let e = self.name(elem);
		let elem_ptr = self.ptr(elem);
		let head = self.record(
			&format!("std::_Head_base<0, {e}*, false>"),
			8,
			8,
			vec![Field::member("_M_head_impl", 0, elem_ptr)],
		);
		let tuple = self.record(
			&format!("std::tuple<{e}*, std::default_delete<{e}> >"),
			8,
			8,
			vec![Field::base(&format!("std::_Head_base<0, {e}*, false>"), 0, head)],
		);
		let uniq = self.record(&format!("std::__uniq_ptr_impl<{e}, std::default_delete<{e}> >"), 8, 8, vec![Field::member("_M_t", 0, tuple)]);
		let data = self.record(
			&format!("std::__uniq_ptr_data<{e}, std::default_delete<{e}>, true, true>"),
			8,
			8,
			vec![Field::base("__uniq_ptr_impl", 0, uniq)],
		);
		self.record(&format!("std::unique_ptr<{e}, std::default_delete<{e}> >"), 8, 8, vec![Field::member("_M_t", 0, data)])
	}

	pub(crate) fn shared_ptr_of(&mut self, elem: TypeId) -> TypeId {
		let e = self.name(elem);
		let elem_ptr = self.ptr(elem);
		let counted = self.types.declare("std::_Sp_counted_base<__gnu_cxx::_S_atomic>");
		let counted_ptr = self.ptr(counted);
		let count = self.record(
			"std::__shared_count<__gnu_cxx::_S_atomic>",
			8,
			8,
			vec![Field::member("_M_pi", 0, counted_ptr)],
		);
		self.record(
			&format!("std::shared_ptr<{e}>"),
			16,
			8,
			vec![Field::member("_M_ptr", 0, elem_ptr), Field::member("_M_refcount", 8, count)],
		)
	}

	pub(crate) fn optional_int(&mut self) -> TypeId {
		let (int, bool_) = (self.int, self.bool_);
		let storage = self.record("std::_Optional_payload_base<int>::_Storage<int, true>", 4, 4, vec![Field::member("_M_value", 0, int)]);
		let base = self.record(
			"std::_Optional_payload_base<int>",
			8,
			4,
			vec![Field::member("_M_payload", 0, storage), Field::member("_M_engaged", 4, bool_)],
		);
		let payload = self.record(
			"std::_Optional_payload<int, true, true, true>",
			8,
			4,
			vec![Field::base("std::_Optional_payload_base<int>", 0, base)],
		);
		self.record("std::optional<int>", 8, 4, vec![Field::member("_M_payload", 0, payload)])
	}

	/// `llvm::Error` and the error base class its payload points at.
	pub(crate) fn llvm_error(&mut self) -> (TypeId, TypeId) {
		let info = self.record("llvm::ErrorInfoBase", 8, 8, Vec::new());
		let info_ptr = self.ptr(info);
		let error = self.record("llvm::Error", 8, 8, vec![Field::member("Payload", 0, info_ptr)]);
		(error, info)
	}

	/// `llvm::Expected<int>`: value and error storage overlap at 0, `HasError` at 8.
	pub(crate) fn llvm_expected_int(&mut self) -> TypeId {
		let (_, info) = self.llvm_error();
		let owner = self.unique_ptr_of(info);
		let owner_name = self.name(owner);
		let value = self.record("llvm::AlignedCharArrayUnion<int>", 4, 4, Vec::new());
		let error = self.record(&format!("llvm::AlignedCharArrayUnion<{owner_name}>"), 8, 8, Vec::new());
		let bool_ = self.bool_;
		self.record(
			"llvm::Expected<int>",
			16,
			8,
			vec![
				Field::member("TStorage", 0, value),
				Field::member("ErrorStorage", 0, error),
				Field::member("HasError", 8, bool_),
			],
		)
	}

	pub(crate) fn small_vector_of(&mut self, elem: TypeId, inline: usize) -> TypeId {
		let e = self.name(elem);
		let (void, uint) = (self.void, self.uint);
		let void_ptr = self.ptr(void);
		let header = self.record(
			"llvm::SmallVectorBase<unsigned int>",
			16,
			8,
			vec![
				Field::member("BeginX", 0, void_ptr),
				Field::member("Size", 8, uint),
				Field::member("Capacity", 12, uint),
			],
		);
		let imp = self.record(
			&format!("llvm::SmallVectorImpl<{e}>"),
			16,
			8,
			vec![Field::base("llvm::SmallVectorBase<unsigned int>", 0, header)],
		);
		let size = 16 + inline * self.types.size_of(elem);
		self.record(
			&format!("llvm::SmallVector<{e}, {inline}>"),
			size,
			8,
			vec![Field::base(&format!("llvm::SmallVectorImpl<{e}>"), 0, imp)],
		)
	}

	pub(crate) fn string_map_of(&mut self, value: TypeId) -> TypeId {
		let v = self.name(value);
		let entry = self.types.declare("llvm::StringMapEntryBase");
		let entry_ptr = self.ptr(entry);
		let table = self.ptr(entry_ptr);
		let uint = self.uint;
		let imp = self.record(
			"llvm::StringMapImpl",
			24,
			8,
			vec![
				Field::member("TheTable", 0, table),
				Field::member("NumBuckets", 8, uint),
				Field::member("NumItems", 12, uint),
				Field::member("NumTombstones", 16, uint),
				Field::member("ItemSize", 20, uint),
			],
		);
		self.record(
			&format!("llvm::StringMap<{v}, llvm::MallocAllocator>"),
			24,
			8,
			vec![Field::base("llvm::StringMapImpl", 0, imp)],
		)
	}

	pub(crate) fn deque_of(&mut self, elem: TypeId) -> TypeId {
		let e = self.name(elem);
		let elem_ptr = self.ptr(elem);
		let map_ptr = self.ptr(elem_ptr);
		let iter = self.record(
			&format!("std::_Deque_iterator<{e}, {e}&, {e}*>"),
			32,
			8,
			vec![
				Field::member("_M_cur", 0, elem_ptr),
				Field::member("_M_first", 8, elem_ptr),
				Field::member("_M_last", 16, elem_ptr),
				Field::member("_M_node", 24, map_ptr),
			],
		);
		let ulong = self.ulong;
		let imp = self.record(
			&format!("std::_Deque_base<{e}, std::allocator<{e}> >::_Deque_impl"),
			80,
			8,
			vec![
				Field::member("_M_map", 0, map_ptr),
				Field::member("_M_map_size", 8, ulong),
				Field::member("_M_start", 16, iter),
				Field::member("_M_finish", 48, iter),
			],
		);
		self.record(&format!("std::deque<{e}, std::allocator<{e}> >"), 80, 8, vec![Field::member("_M_impl", 0, imp)])
	}

	pub(crate) fn std_array_of(&mut self, elem: TypeId, len: usize) -> TypeId {
		let e = self.name(elem);
		let arr = self.types.array_of(elem, len);
		let size = self.types.size_of(arr);
		let align = self.types.align_of(elem);
		self.record(&format!("std::array<{e}, {len}>"), size, align, vec![Field::member("_M_elems", 0, arr)])
	}

	pub(crate) fn queue_of(&mut self, inner: TypeId) -> TypeId {
		let (i, size) = (self.name(inner), self.types.size_of(inner));
		self.record(&format!("std::queue<int, {i}>"), size, 8, vec![Field::member("c", 0, inner)])
	}

	pub(crate) fn inspector<'a>(&'a self, memory: &'a RegionMap) -> Inspector<'a> {
		Inspector::new(&self.types, memory, TargetInfo::default())
	}
}

/// Write a `std::string` object in place at `addr` (short strings use the local buffer).
pub(crate) fn write_string_at(image: &mut HeapImage, addr: u64, text: &str) {
	let data = if text.len() < 16 {
		image.write_bytes(addr + 16, text.as_bytes());
		image.write_u8(addr + 16 + text.len() as u64, 0);
		addr + 16
	} else {
		image.alloc_cstr(text)
	};
	image.write_u64(addr, data);
	image.write_u64(addr + 8, text.len() as u64);
}

pub(crate) fn write_string(image: &mut HeapImage, text: &str) -> u64 {
	let addr = image.alloc(32, 8);
	write_string_at(image, addr, text);
	addr
}

pub(crate) fn write_vector_i32(image: &mut HeapImage, values: &[i32]) -> u64 {
	let data = image.alloc_i32s(values);
	let addr = image.alloc(24, 8);
	image.write_u64(addr, data);
	image.write_u64(addr + 8, data + values.len() as u64 * 4);
	image.write_u64(addr + 16, data + values.len() as u64 * 4);
	addr
}

pub(crate) fn write_list_i32(image: &mut HeapImage, values: &[i32]) -> u64 {
	let head = image.alloc(24, 8);
	let mut prev = head;
	for value in values {
		let node = image.alloc(24, 8);
		image.write_i32(node + 16, *value);
		image.write_u64(prev, node);
		image.write_u64(node + 8, prev);
		prev = node;
	}
	image.write_u64(prev, head);
	image.write_u64(head + 8, prev);
	image.write_u64(head + 16, values.len() as u64);
	head
}

/// Write a red-black tree container; `write_payload` fills each node (payload at node + 32).
///
/// Nodes must be given in key order; the tree is built balanced.
pub(crate) fn write_tree(image: &mut HeapImage, count: usize, node_size: usize, mut write_payload: impl FnMut(&mut HeapImage, usize, u64)) -> u64 {
	let tree = image.alloc(48, 8);
	let header = tree + 8;
	let nodes: Vec<u64> = (0..count)
		.map(|idx| {
			let node = image.alloc(node_size, 8);
			write_payload(image, idx, node + 32);
			node
		})
		.collect();

	fn link(image: &mut HeapImage, nodes: &[u64], parent: u64) -> u64 {
		if nodes.is_empty() {
			return 0;
		}
		let mid = nodes.len() / 2;
		let root = nodes[mid];
		image.write_u64(root + 8, parent);
		let left = link(image, &nodes[..mid], root);
		let right = link(image, &nodes[mid + 1..], root);
		image.write_u64(root + 16, left);
		image.write_u64(root + 24, right);
		root
	}

	let root = link(image, &nodes, header);
	image.write_u64(header + 8, root);
	image.write_u64(header + 16, nodes.first().copied().unwrap_or(header));
	image.write_u64(header + 24, nodes.last().copied().unwrap_or(header));
	image.write_u64(header + 32, count as u64);
	tree
}

pub(crate) fn write_map_str_i32(image: &mut HeapImage, entries: &[(&str, i32)]) -> u64 {
	write_tree(image, entries.len(), 72, |image, idx, payload| {
		write_string_at(image, payload, entries[idx].0);
		image.write_i32(payload + 32, entries[idx].1);
	})
}

pub(crate) fn write_set_i32(image: &mut HeapImage, values: &[i32]) -> u64 {
	write_tree(image, values.len(), 40, |image, idx, payload| image.write_i32(payload, values[idx]))
}

pub(crate) fn write_string_map_i32(image: &mut HeapImage, buckets: usize, entries: &[(usize, &str, i32)], tombstones: &[usize]) -> u64 {
	let table = image.alloc(buckets * 8, 8);
	for (bucket, key, value) in entries {
		let entry = image.alloc(16 + key.len() + 1, 8);
		image.write_u64(entry, key.len() as u64);
		image.write_i32(entry + 8, *value);
		image.write_bytes(entry + 16, key.as_bytes());
		image.write_u64(table + *bucket as u64 * 8, entry);
	}
	for bucket in tombstones {
		image.write_u64(table + *bucket as u64 * 8, (-1_i64 << 3) as u64);
	}

	let map = image.alloc(24, 8);
	image.write_u64(map, table);
	image.write_u32(map + 8, buckets as u32);
	image.write_u32(map + 12, entries.len() as u32);
	image.write_u32(map + 16, tombstones.len() as u32);
	map
}
