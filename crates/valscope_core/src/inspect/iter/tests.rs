use valscope_testkit::HeapImage;

use crate::inspect::test_support::{BASE, Std, write_list_i32, write_map_str_i32, write_set_i32, write_string_map_i32, write_vector_i32};
use crate::inspect::{
	ErrorKind, Field, InspectError, InspectOptions, InspectedValue, Inspector, Item, Operand, Primitive, RegionMap, Result,
};

fn memory(image: &HeapImage) -> RegionMap {
	RegionMap::from_pairs(image.pairs()).expect("image indexes")
}

fn ints(ins: &Inspector<'_>, container: &InspectedValue) -> Vec<i64> {
	ins.iterate(container)
		.expect("container iterates")
		.map(|item| match ins.coerce_value(item.expect("item reads").value()) {
			Ok(Primitive::Int(value)) => value,
			other => panic!("expected int, got {other:?}"),
		})
		.collect()
}

#[test]
fn vectors_walk_begin_to_end() {
	let mut fx = Std::new();
	let vector = fx.vector_of(fx.int);
	let mut image = HeapImage::new(BASE);
	let full = write_vector_i32(&mut image, &[1, 2, 3]);
	let empty = write_vector_i32(&mut image, &[]);
	let memory = memory(&image);
	let ins = fx.inspector(&memory);

	let value = InspectedValue::at(vector, full);
	assert_eq!(ints(&ins, &value), vec![1, 2, 3]);
	let items = ins.iterate(&value).expect("iterates");
	assert_eq!(items.reported_len(), Some(3));
	assert_eq!(items.size_hint(), (0, Some(3)));

	let indices: Vec<usize> = ins
		.iterate(&value)
		.expect("iterates")
		.map(|item| match item.expect("item reads") {
			Item::Indexed { index, .. } => index,
			other => panic!("unexpected keyed item {other:?}"),
		})
		.collect();
	assert_eq!(indices, vec![0, 1, 2]);
	assert!(ints(&ins, &InspectedValue::at(vector, empty)).is_empty());
}

#[test]
fn lists_follow_next_links_to_the_sentinel() {
	let mut fx = Std::new();
	let list = fx.list_of(fx.int);
	let mut image = HeapImage::new(BASE);
	let addr = write_list_i32(&mut image, &[10, 20, 30]);
	let memory = memory(&image);
	let ins = fx.inspector(&memory);

	let value = InspectedValue::at(list, addr);
	assert_eq!(ints(&ins, &value), vec![10, 20, 30]);
	assert_eq!(ins.iterate(&value).expect("iterates").reported_len(), Some(3));
}

fn sizeless_list(fx: &mut Std) -> crate::inspect::TypeId {
	let node = fx.types.declare("std::__detail::_List_node_base");
	let node_ptr = fx.ptr(node);
	let node = fx.record(
		"std::__detail::_List_node_base",
		16,
		8,
		vec![Field::member("_M_next", 0, node_ptr), Field::member("_M_prev", 8, node_ptr)],
	);
	let imp = fx.record("std::_List_base<int>::_List_impl", 16, 8, vec![Field::member("_M_node", 0, node)]);
	fx.record("std::list<int>", 16, 8, vec![Field::member("_M_impl", 0, imp)])
}

#[test]
fn sizeless_lists_are_bounded_by_the_walk_budget() {
	let mut fx = Std::new();
	let list = sizeless_list(&mut fx);
	let mut image = HeapImage::new(BASE);
	let addr = write_list_i32(&mut image, &[4, 5, 6]);
	let memory = memory(&image);
	let value = InspectedValue::at(list, addr);

	let ins = fx.inspector(&memory);
	assert_eq!(ins.iterate(&value).expect("iterates").reported_len(), None);
	assert_eq!(ints(&ins, &value), vec![4, 5, 6]);
	assert_eq!(ins.len(&value).expect("counted by walking"), 3);

	let tight = fx.inspector(&memory).with_options(InspectOptions {
		max_list_walk: 2,
		..InspectOptions::default()
	});
	let results: Vec<Result<Item>> = tight.iterate(&value).expect("iterates").collect();
	assert_eq!(results.len(), 3, "two items then the error");
	assert!(matches!(results[2], Err(InspectError::NodeWalkExceeded { max: 2 })));
}

#[test]
fn iteration_fuses_after_a_broken_link() {
	let mut fx = Std::new();
	let list = fx.list_of(fx.int);
	let mut image = HeapImage::new(BASE);
	let addr = write_list_i32(&mut image, &[1, 2]);
	let first = image.pairs()[0].1[..8].to_vec();
	let first = u64::from_le_bytes(first.try_into().expect("eight bytes"));
	image.write_u64(first, 0);
	let memory = memory(&image);
	let ins = fx.inspector(&memory);

	let mut items = ins.iterate(&InspectedValue::at(list, addr)).expect("iterates");
	assert!(items.next().expect("first item").is_ok());
	let err = items.next().expect("second step").expect_err("null link");
	assert_eq!(err.kind(), ErrorKind::AddressUnreadable);
	assert!(items.next().is_none());
	assert!(items.next().is_none());
}

#[test]
fn garbage_list_links_fail_without_overflowing() {
	let mut fx = Std::new();
	let list = fx.list_of(fx.int);
	let mut image = HeapImage::new(BASE);
	let addr = write_list_i32(&mut image, &[1, 2]);
	let first = image.pairs()[0].1[..8].to_vec();
	let first = u64::from_le_bytes(first.try_into().expect("eight bytes"));
	image.write_u64(first, u64::MAX - 4);
	let memory = memory(&image);
	let ins = fx.inspector(&memory);

	let results: Vec<Result<Item>> = ins.iterate(&InspectedValue::at(list, addr)).expect("iterates").collect();
	assert_eq!(results.len(), 2);
	assert!(results[0].is_ok());
	assert!(matches!(results[1], Err(InspectError::AddressUnreadable { .. })));
}

#[test]
fn garbage_tree_children_fail_without_overflowing() {
	let mut fx = Std::new();
	let set = fx.set_of(fx.int);
	let mut image = HeapImage::new(BASE);
	let tree = write_set_i32(&mut image, &[1, 2]);
	// Nodes follow the 48-byte tree object; the first one is the leftmost.
	let leftmost = tree + 48;
	image.write_u64(leftmost + 24, u64::MAX - 4);
	let memory = memory(&image);
	let ins = fx.inspector(&memory);

	let results: Vec<Result<Item>> = ins.iterate(&InspectedValue::at(set, tree)).expect("iterates").collect();
	assert_eq!(results.len(), 2);
	assert!(results[0].is_ok());
	assert!(matches!(results[1], Err(InspectError::AddressUnreadable { .. })));
}

#[test]
fn successor_climbs_are_bounded_by_the_walk_budget() {
	let fx = Std::new();
	let mut image = HeapImage::new(BASE);
	let header = image.alloc(40, 8);
	let [root, mid, leaf] = [0; 3].map(|_| image.alloc(40, 8));
	// header -> root -> mid -> leaf, each hanging off the right.
	image.write_u64(header + 8, root);
	image.write_u64(header + 24, leaf);
	image.write_u64(root + 8, header);
	image.write_u64(root + 24, mid);
	image.write_u64(mid + 8, root);
	image.write_u64(mid + 24, leaf);
	image.write_u64(leaf + 8, mid);
	let memory = memory(&image);

	let ins = fx.inspector(&memory);
	assert_eq!(ins.tree_successor(leaf, header).expect("rightmost wraps to the header"), header);

	let tight = fx.inspector(&memory).with_options(InspectOptions {
		max_list_walk: 1,
		..InspectOptions::default()
	});
	let err = tight.tree_successor(leaf, header).expect_err("two climbs exceed a budget of one");
	assert!(matches!(err, InspectError::NodeWalkExceeded { max: 1 }));
}

#[test]
fn maps_iterate_in_key_order_with_string_keys() {
	let mut fx = Std::new();
	let map = fx.map_of(fx.string, fx.int);
	let mut image = HeapImage::new(BASE);
	let addr = write_map_str_i32(&mut image, &[("One", 1), ("Three", 3), ("Two", 2)]);
	let memory = memory(&image);
	let ins = fx.inspector(&memory);

	let entries: Vec<(String, i64)> = ins
		.iterate(&InspectedValue::at(map, addr))
		.expect("map iterates")
		.map(|item| {
			let Item::Keyed { key, value } = item.expect("entry reads") else {
				panic!("map items are keyed");
			};
			let Primitive::Text(key) = ins.coerce(&key).expect("key coerces") else {
				panic!("string keys coerce to text");
			};
			let Primitive::Int(value) = ins.coerce_value(&value).expect("value coerces") else {
				panic!("int values");
			};
			(key, value)
		})
		.collect();
	assert_eq!(entries, vec![("One".to_owned(), 1), ("Three".to_owned(), 3), ("Two".to_owned(), 2)]);
}

#[test]
fn sets_of_any_size_walk_in_order() {
	let mut fx = Std::new();
	let set = fx.set_of(fx.int);
	let mut image = HeapImage::new(BASE);
	let values: Vec<i32> = (0..11).map(|idx| idx * 3).collect();
	let big = write_set_i32(&mut image, &values);
	let single = write_set_i32(&mut image, &[8]);
	let empty = write_set_i32(&mut image, &[]);
	let memory = memory(&image);
	let ins = fx.inspector(&memory);

	let expected: Vec<i64> = values.iter().map(|value| i64::from(*value)).collect();
	assert_eq!(ints(&ins, &InspectedValue::at(set, big)), expected);
	assert_eq!(ints(&ins, &InspectedValue::at(set, single)), vec![8]);
	assert!(ints(&ins, &InspectedValue::at(set, empty)).is_empty());
}

#[test]
fn deques_cross_buffer_boundaries() {
	let mut fx = Std::new();
	let deque = fx.deque_of(fx.int);
	let mut image = HeapImage::new(BASE);
	let first = image.alloc(512, 8);
	let second = image.alloc(512, 8);
	for (idx, value) in [(126_u64, 1), (127, 2)] {
		image.write_i32(first + idx * 4, value);
	}
	for (idx, value) in [(0_u64, 3), (1, 4), (2, 5)] {
		image.write_i32(second + idx * 4, value);
	}
	let map = image.alloc(16, 8);
	image.write_u64(map, first);
	image.write_u64(map + 8, second);

	let addr = image.alloc(80, 8);
	image.write_u64(addr, map);
	image.write_u64(addr + 8, 2);
	for (offset, word) in [(16, first + 126 * 4), (24, first), (32, first + 512), (40, map)] {
		image.write_u64(addr + offset, word);
	}
	for (offset, word) in [(48, second + 3 * 4), (56, second), (64, second + 512), (72, map + 8)] {
		image.write_u64(addr + offset, word);
	}
	let memory = memory(&image);
	let ins = fx.inspector(&memory);

	let value = InspectedValue::at(deque, addr);
	assert_eq!(ins.len(&value).expect("deque length"), 5);
	assert_eq!(ints(&ins, &value), vec![1, 2, 3, 4, 5]);
}

#[test]
fn inline_arrays_and_adapters() {
	let mut fx = Std::new();
	let array = fx.std_array_of(fx.int, 3);
	let raw = fx.types.array_of(fx.int, 2);
	let inner = fx.deque_of(fx.int);
	let queue = fx.queue_of(inner);
	let mut image = HeapImage::new(BASE);
	let arr = image.alloc_i32s(&[7, 8, 9]);
	let buffer = image.alloc(512, 8);
	image.write_i32(buffer, 42);
	let map = image.alloc(8, 8);
	image.write_u64(map, buffer);
	let q = image.alloc(80, 8);
	for (offset, word) in [(16, buffer), (24, buffer), (32, buffer + 512), (40, map)] {
		image.write_u64(q + offset, word);
	}
	for (offset, word) in [(48, buffer + 4), (56, buffer), (64, buffer + 512), (72, map)] {
		image.write_u64(q + offset, word);
	}
	let memory = memory(&image);
	let ins = fx.inspector(&memory);

	assert_eq!(ints(&ins, &InspectedValue::at(array, arr)), vec![7, 8, 9]);
	assert_eq!(ints(&ins, &InspectedValue::at(raw, arr)), vec![7, 8]);
	assert_eq!(ints(&ins, &InspectedValue::at(queue, q)), vec![42]);

	let inline = InspectedValue::inline(raw, [5_i32.to_le_bytes(), 6_i32.to_le_bytes()].concat());
	assert_eq!(ints(&ins, &inline), vec![5, 6]);
}

#[test]
fn string_maps_skip_empty_and_tombstone_buckets() {
	let mut fx = Std::new();
	let map = fx.string_map_of(fx.int);
	let mut image = HeapImage::new(BASE);
	let addr = write_string_map_i32(&mut image, 8, &[(1, "alpha", 10), (5, "beta", 20)], &[3]);
	let memory = memory(&image);
	let ins = fx.inspector(&memory);

	let entries: Vec<(Operand, InspectedValue)> = ins
		.iterate(&InspectedValue::at(map, addr))
		.expect("string map iterates")
		.map(|item| match item.expect("entry reads") {
			Item::Keyed { key, value } => (key, value),
			other => panic!("unexpected item {other:?}"),
		})
		.collect();
	assert_eq!(entries.len(), 2);
	assert_eq!(entries[0].0, Operand::from("alpha"));
	assert_eq!(entries[1].0, Operand::from("beta"));
	assert_eq!(ins.coerce_value(&entries[1].1).expect("value coerces"), Primitive::Int(20));
}

#[test]
fn small_vectors_iterate_inline_and_spilled_storage() {
	let mut fx = Std::new();
	let small = fx.small_vector_of(fx.int, 4);
	let mut image = HeapImage::new(BASE);
	let inline = image.alloc(32, 8);
	image.write_u64(inline, inline + 16);
	image.write_u32(inline + 8, 2);
	image.write_u32(inline + 12, 4);
	image.write_i32(inline + 16, 11);
	image.write_i32(inline + 20, 12);
	let heap = image.alloc_i32s(&[1, 2, 3, 4, 5]);
	let spilled = image.alloc(32, 8);
	image.write_u64(spilled, heap);
	image.write_u32(spilled + 8, 5);
	image.write_u32(spilled + 12, 8);
	let memory = memory(&image);
	let ins = fx.inspector(&memory);

	assert_eq!(ints(&ins, &InspectedValue::at(small, inline)), vec![11, 12]);
	assert_eq!(ints(&ins, &InspectedValue::at(small, spilled)), vec![1, 2, 3, 4, 5]);
}

#[test]
fn scalars_and_strings_are_not_iterable() {
	let fx = Std::new();
	let mut image = HeapImage::new(BASE);
	let addr = image.alloc(32, 8);
	let memory = memory(&image);
	let ins = fx.inspector(&memory);

	for ty in [fx.int, fx.string] {
		let err = ins.iterate(&InspectedValue::at(ty, addr)).err().expect("not a container");
		assert_eq!(err.kind(), ErrorKind::NotAContainer);
	}
}
