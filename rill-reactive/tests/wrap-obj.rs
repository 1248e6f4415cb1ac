//! Object wrapper tests

// Imports
use {
	core::cell::Cell,
	rill_reactive::{
		Atom, Effect, Obj, Value, is_wrapped, mark_raw, to_raw, wrap, wrap_readonly, wrap_shallow,
	},
	std::rc::Rc,
};

/// Wraps `obj` and returns both the value and the handle
fn wrapped_obj(obj: Obj) -> (Value, rill_reactive::Wrapped) {
	let value = wrap(obj);
	let handle = value.as_wrapped().expect("Should be wrapped").clone();
	(value, handle)
}

#[test]
fn property_round_trip() {
	let runs = Rc::new(Cell::new(0));
	let (_, obj) = wrapped_obj(Obj::from_iter([("name", "before")]));

	let _effect = Effect::new({
		let runs = Rc::clone(&runs);
		let obj = obj.clone();
		move || {
			let _ = obj.prop("name");
			runs.set(runs.get() + 1);
		}
	});
	assert_eq!(runs.get(), 1);

	obj.set_prop("name", "after");
	assert_eq!(runs.get(), 2);
	assert_eq!(obj.prop("name").as_str().map(str::to_owned), Some("after".to_owned()));

	// Unchanged write: no trigger
	obj.set_prop("name", "after");
	assert_eq!(runs.get(), 2, "Unchanged write re-ran the effect");

	// Unrelated property: no trigger
	obj.set_prop("other", 1);
	assert_eq!(runs.get(), 2, "Unrelated property re-ran the effect");
}

#[test]
fn missing_property_reads_unit_and_appears_later() {
	let runs = Rc::new(Cell::new(0));
	let (_, obj) = wrapped_obj(Obj::new());

	let _effect = Effect::new({
		let runs = Rc::clone(&runs);
		let obj = obj.clone();
		move || {
			let _ = obj.prop("late");
			runs.set(runs.get() + 1);
		}
	});
	assert!(obj.prop("late").is_unit());

	// Adding the property must wake the reader of its absence
	obj.set_prop("late", 1);
	assert_eq!(runs.get(), 2);
}

#[test]
fn enumeration_tracks_the_key_set() {
	let runs = Rc::new(Cell::new(0));
	let (_, obj) = wrapped_obj(Obj::from_iter([("a", 1)]));

	let _effect = Effect::new({
		let runs = Rc::clone(&runs);
		let obj = obj.clone();
		move || {
			let _ = obj.keys();
			runs.set(runs.get() + 1);
		}
	});
	assert_eq!(runs.get(), 1);

	// Overwriting an existing key doesn't change the key set
	obj.set_prop("a", 2);
	assert_eq!(runs.get(), 1, "Existing-key write re-ran the enumerator");

	// Adding and removing keys does
	obj.set_prop("b", 1);
	assert_eq!(runs.get(), 2);
	assert!(obj.remove_prop("a"));
	assert_eq!(runs.get(), 3);
	assert_eq!(obj.keys(), [Rc::<str>::from("b")]);
}

#[test]
fn has_prop_tracks() {
	let runs = Rc::new(Cell::new(0));
	let (_, obj) = wrapped_obj(Obj::new());

	let _effect = Effect::new({
		let runs = Rc::clone(&runs);
		let obj = obj.clone();
		move || {
			let _ = obj.has_prop("x");
			runs.set(runs.get() + 1);
		}
	});
	assert!(!obj.has_prop("x"));

	obj.set_prop("x", 1);
	assert_eq!(runs.get(), 2);
	assert!(obj.has_prop("x"));
}

#[test]
fn nested_containers_come_back_wrapped() {
	let inner = Obj::from_iter([("x", 1)]);
	let (_, obj) = wrapped_obj(Obj::from_iter([("inner", Value::Obj(inner.clone()))]));

	let nested = obj.prop("inner");
	assert!(is_wrapped(&nested), "Deep read returned a raw container");
	assert!(to_raw(&nested).same(&Value::Obj(inner)));

	// And writes through the nested wrapper trigger readers of it
	let runs = Rc::new(Cell::new(0));
	let _effect = Effect::new({
		let runs = Rc::clone(&runs);
		let obj = obj.clone();
		move || {
			let _ = obj.prop("inner").as_wrapped().expect("Should be wrapped").prop("x");
			runs.set(runs.get() + 1);
		}
	});
	nested.as_wrapped().expect("Should be wrapped").set_prop("x", 2);
	assert_eq!(runs.get(), 2);
}

#[test]
fn shallow_passes_nested_values_through() {
	let inner = Obj::new();
	let value = wrap_shallow(Obj::from_iter([("inner", Value::Obj(inner.clone()))]));
	let obj = value.as_wrapped().expect("Should be wrapped").clone();

	let nested = obj.prop("inner");
	assert!(!is_wrapped(&nested), "Shallow read wrapped a nested container");
	assert!(nested.same(&Value::Obj(inner)));
}

#[test]
fn readonly_tracks_but_rejects_writes() {
	let runs = Rc::new(Cell::new(0));
	let raw = Obj::from_iter([("x", 1)]);
	let (_, writable) = wrapped_obj(raw.clone());
	let readonly = wrap_readonly(raw);
	let readonly = readonly.as_wrapped().expect("Should be wrapped").clone();

	let _effect = Effect::new({
		let runs = Rc::clone(&runs);
		let readonly = readonly.clone();
		move || {
			let _ = readonly.prop("x");
			runs.set(runs.get() + 1);
		}
	});

	// Rejected write: no change, no trigger
	readonly.set_prop("x", 2);
	assert_eq!(readonly.prop("x").as_int(), Some(1), "Readonly write went through");
	assert_eq!(runs.get(), 1);

	// A readonly view over data mutated elsewhere stays live
	writable.set_prop("x", 2);
	assert_eq!(runs.get(), 2);
	assert_eq!(readonly.prop("x").as_int(), Some(2));
}

#[test]
fn readonly_reads_unwrap_cells_readonly() {
	let inner = Obj::from_iter([("x", 1)]);
	let atom = Atom::new(Value::Obj(inner.clone()));
	let readonly = wrap_readonly(Obj::from_iter([("cell", Value::Atom(atom))]));
	let readonly = readonly.as_wrapped().expect("Should be wrapped").clone();

	// The unwrapped container must come back readonly, not mutable
	let nested = readonly.prop("cell");
	assert!(
		rill_reactive::is_readonly(&nested),
		"Readonly read handed back a non-readonly wrapper"
	);

	// And writes through it are rejected
	let nested = nested.as_wrapped().expect("Should be wrapped").clone();
	nested.set_prop("x", 2);
	assert_eq!(nested.prop("x").as_int(), Some(1), "Write through a readonly view went through");

	let raw = wrap(Value::Obj(inner));
	let raw = raw.as_wrapped().expect("Should be wrapped").clone();
	assert_eq!(raw.prop("x").as_int(), Some(1));
}

#[test]
fn atoms_unwrap_and_write_through() {
	let runs = Rc::new(Cell::new(0));
	let atom = Atom::new(1);
	let (_, obj) = wrapped_obj(Obj::from_iter([("count", Value::Atom(atom.clone()))]));

	// Reads auto-unwrap the atom
	assert_eq!(obj.prop("count").as_int(), Some(1));

	let _effect = Effect::new({
		let runs = Rc::clone(&runs);
		let obj = obj.clone();
		move || {
			let _ = obj.prop("count");
			runs.set(runs.get() + 1);
		}
	});

	// Plain writes go through to the atom instead of replacing it
	obj.set_prop("count", 2);
	assert_eq!(atom.get().as_int(), Some(2), "Write replaced the atom");
	assert_eq!(runs.get(), 2);

	// Writing the atom directly also reaches readers of the property
	atom.set(3);
	assert_eq!(runs.get(), 3);
	assert_eq!(obj.prop("count").as_int(), Some(3));
}

#[test]
fn mark_raw_opts_out() {
	let obj = Obj::new();
	let value = Value::Obj(obj);
	mark_raw(&value);

	let wrapped = wrap(value.clone());
	assert!(!is_wrapped(&wrapped), "Opted-out container was wrapped");
	assert!(wrapped.same(&value));
}

#[test]
fn wrapping_is_identity_stable() {
	let obj = Obj::new();
	let first = wrap(Value::Obj(obj.clone()));
	let second = wrap(Value::Obj(obj.clone()));
	assert!(first.same(&second), "Same raw and mode produced distinct wrapper values");

	// Different modes are distinct values over the same raw container
	let readonly = wrap_readonly(Value::Obj(obj));
	assert!(!first.same(&readonly));
	assert!(to_raw(&first).same(&to_raw(&readonly)));
}
