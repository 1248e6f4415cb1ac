//! Computed tests

// Imports
use {
	core::cell::Cell,
	rill_reactive::{Atom, Computed, Effect, Value},
	std::rc::Rc,
};

#[test]
fn lazy_and_cached() {
	let evals = Rc::new(Cell::new(0));

	let atom = Atom::new(1);
	let computed = Computed::new({
		let evals = Rc::clone(&evals);
		let atom = atom.clone();
		move || {
			evals.set(evals.get() + 1);
			atom.get()
		}
	});
	assert_eq!(evals.get(), 0, "Getter ran before the first read");

	assert_eq!(computed.get().as_int(), Some(1));
	assert_eq!(evals.get(), 1);

	// Nothing changed: cached
	assert_eq!(computed.get().as_int(), Some(1));
	assert_eq!(evals.get(), 1, "Getter re-ran without a change");

	atom.set(2);
	assert_eq!(computed.get().as_int(), Some(2));
	assert_eq!(evals.get(), 2);
}

#[test]
fn unrelated_changes_skip_reevaluation() {
	let evals = Rc::new(Cell::new(0));

	let atom = Atom::new(1);
	let unrelated = Atom::new(0);
	let computed = Computed::new({
		let evals = Rc::clone(&evals);
		let atom = atom.clone();
		move || {
			evals.set(evals.get() + 1);
			atom.get()
		}
	});

	let _ = computed.get();
	assert_eq!(evals.get(), 1);

	// Bumps the global version, but not this computed's inputs
	unrelated.set(1);
	let _ = computed.get();
	assert_eq!(evals.get(), 1, "Unrelated change re-ran the getter");
}

#[test]
fn chained_invalidation_runs_effect_once() {
	let first_evals = Rc::new(Cell::new(0));
	let second_evals = Rc::new(Cell::new(0));
	let runs = Rc::new(Cell::new(0));

	let atom = Atom::new(1);
	let doubled = Computed::new({
		let first_evals = Rc::clone(&first_evals);
		let atom = atom.clone();
		move || {
			first_evals.set(first_evals.get() + 1);
			Value::from(atom.get().as_int().expect("Should be an int") * 2)
		}
	});
	let quadrupled = Computed::new({
		let second_evals = Rc::clone(&second_evals);
		let doubled = doubled.clone();
		move || {
			second_evals.set(second_evals.get() + 1);
			Value::from(doubled.get().as_int().expect("Should be an int") * 2)
		}
	});

	let _effect = Effect::new({
		let runs = Rc::clone(&runs);
		let quadrupled = quadrupled.clone();
		move || {
			let _ = quadrupled.get();
			runs.set(runs.get() + 1);
		}
	});
	assert_eq!((first_evals.get(), second_evals.get(), runs.get()), (1, 1, 1));
	assert_eq!(quadrupled.get().as_int(), Some(4));

	atom.set(2);
	assert_eq!(
		(first_evals.get(), second_evals.get(), runs.get()),
		(2, 2, 2),
		"Each layer must refresh exactly once"
	);
	assert_eq!(quadrupled.get().as_int(), Some(8));
}

#[test]
fn equal_value_cuts_invalidation_short() {
	let runs = Rc::new(Cell::new(0));

	let atom = Atom::new(1);
	let parity = Computed::new({
		let atom = atom.clone();
		move || Value::from(atom.get().as_int().expect("Should be an int") % 2)
	});
	let _effect = Effect::new({
		let runs = Rc::clone(&runs);
		let parity = parity.clone();
		move || {
			let _ = parity.get();
			runs.set(runs.get() + 1);
		}
	});
	assert_eq!(runs.get(), 1);

	// Parity unchanged: the computed re-evaluates but the effect must not
	atom.set(3);
	assert_eq!(runs.get(), 1, "Effect re-ran despite an unchanged computed value");

	atom.set(4);
	assert_eq!(runs.get(), 2);
}

#[test]
fn setter_delegates() {
	let atom = Atom::new(10);
	let celsius = atom.clone();
	let fahrenheit = Computed::with_setter(
		{
			let celsius = celsius.clone();
			move || Value::from(celsius.get().as_int().expect("Should be an int") * 9 / 5 + 32)
		},
		{
			let celsius = celsius.clone();
			move |value| {
				let value = value.as_int().expect("Should be an int");
				celsius.set((value - 32) * 5 / 9);
			}
		},
	);
	assert_eq!(fahrenheit.get().as_int(), Some(50));

	fahrenheit.set(212);
	assert_eq!(atom.get().as_int(), Some(100));
	assert_eq!(fahrenheit.get().as_int(), Some(212));
}

#[test]
fn recovers_after_losing_all_subscribers() {
	let atom = Atom::new(1);
	let computed = Computed::new({
		let atom = atom.clone();
		move || atom.get()
	});

	let effect = Effect::new({
		let computed = computed.clone();
		move || {
			let _ = computed.get();
		}
	});
	assert_eq!(computed.get().as_int(), Some(1));

	// Dropping the only subscriber parks the computed; it must still
	// serve fresh values afterwards
	drop(effect);
	atom.set(2);
	assert_eq!(computed.get().as_int(), Some(2), "Dormant computed served a stale value");

	// And re-subscribing works
	let runs = Rc::new(Cell::new(0));
	let _effect = Effect::new({
		let runs = Rc::clone(&runs);
		let computed = computed.clone();
		move || {
			let _ = computed.get();
			runs.set(runs.get() + 1);
		}
	});
	atom.set(3);
	assert_eq!(runs.get(), 2);
	assert_eq!(computed.get().as_int(), Some(3));
}

#[test]
fn panicking_getter_retries() {
	let should_panic = Rc::new(Cell::new(true));

	let atom = Atom::new(1);
	let computed = Computed::new({
		let should_panic = Rc::clone(&should_panic);
		let atom = atom.clone();
		move || {
			let value = atom.get();
			assert!(!should_panic.get(), "getter failure");
			value
		}
	});

	let caught = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| computed.get()));
	assert!(caught.is_err(), "Getter panic didn't propagate");

	// The failure must not be cached
	should_panic.set(false);
	assert_eq!(computed.get().as_int(), Some(1));
}
