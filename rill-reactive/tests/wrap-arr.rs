//! Array wrapper tests

// Imports
use {
	core::cell::Cell,
	rill_reactive::{Arr, Effect, Obj, Value, Wrapped, wrap},
	std::rc::Rc,
};

/// Wraps an array of ints
fn int_arr(items: impl IntoIterator<Item = i64>) -> Wrapped {
	let value = wrap(items.into_iter().map(Value::Int).collect::<Arr>());
	value.as_wrapped().expect("Should be wrapped").clone()
}

/// Collects the ints of a wrapped array
fn ints(arr: &Wrapped) -> Vec<i64> {
	arr.to_vec()
		.into_iter()
		.map(|value| value.as_int().expect("Should be an int"))
		.collect()
}

#[test]
fn length_readers_see_push_once() {
	let runs = Rc::new(Cell::new(0));
	let arr = int_arr([1, 2, 3]);

	let _effect = Effect::new({
		let runs = Rc::clone(&runs);
		let arr = arr.clone();
		move || {
			let _ = arr.len();
			runs.set(runs.get() + 1);
		}
	});
	assert_eq!(runs.get(), 1);

	let len = arr.push(4);
	assert_eq!(len, 4);
	assert_eq!(runs.get(), 2, "Push must notify length readers exactly once");
}

#[test]
fn iteration_tracks_element_changes() {
	let runs = Rc::new(Cell::new(0));
	let arr = int_arr([1, 2, 3]);

	let _effect = Effect::new({
		let runs = Rc::clone(&runs);
		let arr = arr.clone();
		move || {
			arr.for_each(|_, _| ());
			runs.set(runs.get() + 1);
		}
	});
	assert_eq!(runs.get(), 1);

	// Unchanged in-bounds write: no notification
	arr.set_at(1, 2);
	assert_eq!(runs.get(), 1, "Unchanged element write re-ran the iterator");

	// Changed in-bounds write: one notification
	arr.set_at(1, 20);
	assert_eq!(runs.get(), 2);
	assert_eq!(ints(&arr), [1, 20, 3]);
}

#[test]
fn out_of_bounds_write_grows_and_notifies_length() {
	let runs = Rc::new(Cell::new(0));
	let arr = int_arr([1]);

	let _effect = Effect::new({
		let runs = Rc::clone(&runs);
		let arr = arr.clone();
		move || {
			let _ = arr.len();
			runs.set(runs.get() + 1);
		}
	});

	arr.set_at(3, 4);
	assert_eq!(runs.get(), 2);
	assert_eq!(arr.len(), 4);
	assert!(arr.at(2).is_unit(), "Gap wasn't filled with unit");
	assert_eq!(arr.at(3).as_int(), Some(4));
}

#[test]
fn truncation_notifies_dropped_indices() {
	let runs = Rc::new(Cell::new(0));
	let arr = int_arr([1, 2, 3]);

	let _effect = Effect::new({
		let runs = Rc::clone(&runs);
		let arr = arr.clone();
		move || {
			let _ = arr.at(2);
			runs.set(runs.get() + 1);
		}
	});
	assert_eq!(runs.get(), 1);

	// Index 2 falls off
	arr.set_len(2);
	assert_eq!(runs.get(), 2);
	assert!(arr.at(2).is_unit());

	// Indices below the new length are untouched
	let below = Rc::new(Cell::new(0));
	let _below_effect = Effect::new({
		let below = Rc::clone(&below);
		let arr = arr.clone();
		move || {
			let _ = arr.at(0);
			below.set(below.get() + 1);
		}
	});
	arr.set_len(1);
	assert_eq!(below.get(), 1, "Truncation notified a surviving index");
}

#[test]
fn queue_operations() {
	let arr = int_arr([1, 2, 3]);

	assert_eq!(arr.pop().as_int(), Some(3));
	assert_eq!(arr.shift().as_int(), Some(1));
	assert_eq!(arr.unshift(0), 2);
	assert_eq!(ints(&arr), [0, 2]);

	// Draining past empty reads as unit
	let empty = int_arr([]);
	assert!(empty.pop().is_unit());
	assert!(empty.shift().is_unit());
}

#[test]
fn splice_notifies_once() {
	let runs = Rc::new(Cell::new(0));
	let arr = int_arr([1, 2, 3, 4]);

	let _effect = Effect::new({
		let runs = Rc::clone(&runs);
		let arr = arr.clone();
		move || {
			arr.for_each(|_, _| ());
			runs.set(runs.get() + 1);
		}
	});

	// Delete two, insert one: several internal writes, one notification
	let removed = arr.splice(1, 2, vec![Value::from(9)]);
	assert_eq!(runs.get(), 2, "Splice must coalesce to one notification pass");
	assert_eq!(
		removed.iter().map(|value| value.as_int()).collect::<Vec<_>>(),
		[Some(2), Some(3)]
	);
	assert_eq!(ints(&arr), [1, 9, 4]);
}

#[test]
fn splice_past_the_end_appends_and_notifies() {
	let runs = Rc::new(Cell::new(0));
	let arr = int_arr([1, 2, 3]);

	let _effect = Effect::new({
		let runs = Rc::clone(&runs);
		let arr = arr.clone();
		move || {
			let _ = arr.at(3);
			runs.set(runs.get() + 1);
		}
	});
	assert_eq!(runs.get(), 1);

	// A start past the end clamps to the old length; the reader of the
	// index the insert lands on must be notified
	let removed = arr.splice(10, 0, vec![Value::from(9)]);
	assert!(removed.is_empty());
	assert_eq!(runs.get(), 2, "Reader of the appended index wasn't notified");
	assert_eq!(ints(&arr), [1, 2, 3, 9]);
}

#[test]
fn iteration_method_family() {
	let arr = int_arr([1, 2, 3, 4]);

	let doubled = arr.map_items(|value, _| Value::from(value.as_int().expect("Should be an int") * 2));
	assert_eq!(
		doubled.iter().map(|value| value.as_int()).collect::<Vec<_>>(),
		[Some(2), Some(4), Some(6), Some(8)]
	);

	let evens = arr.filter(|value| value.as_int().is_some_and(|value| value % 2 == 0));
	assert_eq!(evens.len(), 2);

	assert_eq!(
		arr.find(|value| value.as_int().is_some_and(|value| value > 2))
			.and_then(|value| value.as_int()),
		Some(3)
	);
	assert!(arr.every(|value| value.as_int().is_some()));
	assert!(arr.some(|value| value.as_int() == Some(4)));
	assert!(!arr.some(|value| value.as_int() == Some(5)));

	let sum = arr.reduce(Value::from(0), |acc, value, _| {
		Value::from(acc.as_int().expect("Should be an int") + value.as_int().expect("Should be an int"))
	});
	assert_eq!(sum.as_int(), Some(10));
}

#[test]
fn search_retries_with_raw_values() {
	let element = Obj::new();
	let arr = wrap(Arr::from_vec(vec![Value::from(1), Value::Obj(element.clone())]));
	let arr = arr.as_wrapped().expect("Should be wrapped").clone();

	// Searching with a wrapped handle to a raw stored element must hit
	let wrapped_element = wrap(Value::Obj(element));
	assert!(arr.includes(&wrapped_element));
	assert_eq!(arr.index_of(&wrapped_element), Some(1));
	assert_eq!(arr.last_index_of(&wrapped_element), Some(1));

	assert!(!arr.includes(&Value::Obj(Obj::new())));
	assert_eq!(arr.index_of(&Value::from(2)), None);
}

#[test]
fn elements_come_back_wrapped() {
	let inner = Obj::from_iter([("x", 1)]);
	let arr = wrap(Arr::from_vec(vec![Value::Obj(inner)]));
	let arr = arr.as_wrapped().expect("Should be wrapped").clone();

	let element = arr.at(0);
	assert!(element.as_wrapped().is_some(), "Deep read returned a raw element");

	let mut saw_wrapped = false;
	arr.for_each(|value, _| saw_wrapped |= value.as_wrapped().is_some());
	assert!(saw_wrapped);
}
