//! Effect-trigger tests

// Imports
use {
	core::{cell::Cell, mem},
	rill_reactive::{Atom, DepKey, Effect, EffectOptions, Obj, Value, effect, subscriber_count, untracked, wrap},
	std::rc::Rc,
};

#[test]
fn basic() {
	let runs = Rc::new(Cell::new(0));

	let atom = Atom::new(0);
	let effect = Effect::new({
		let runs = Rc::clone(&runs);
		let atom = atom.clone();
		move || {
			let _ = atom.get();
			runs.set(runs.get() + 1);
		}
	});
	assert_eq!(runs.get(), 1, "Effect wasn't run on creation");

	atom.set(1);
	assert_eq!(runs.get(), 2, "Effect wasn't re-run on a change");

	// Same value: no change, no re-run
	atom.set(1);
	assert_eq!(runs.get(), 2, "Effect was re-run without a change");

	mem::drop(effect);
	atom.set(2);
	assert_eq!(runs.get(), 2, "Effect was re-run after being dropped");
}

#[test]
fn nan_writes_do_not_loop() {
	let runs = Rc::new(Cell::new(0));

	let atom = Atom::new(f64::NAN);
	let _effect = Effect::new({
		let runs = Rc::clone(&runs);
		let atom = atom.clone();
		move || {
			let _ = atom.get();
			runs.set(runs.get() + 1);
		}
	});
	assert_eq!(runs.get(), 1);

	atom.set(f64::NAN);
	assert_eq!(runs.get(), 1, "`NaN` over `NaN` counted as a change");
}

#[test]
fn negative_zero_writes_count_as_changes() {
	let runs = Rc::new(Cell::new(0));

	let atom = Atom::new(0.0);
	let _effect = Effect::new({
		let runs = Rc::clone(&runs);
		let atom = atom.clone();
		move || {
			let _ = atom.get();
			runs.set(runs.get() + 1);
		}
	});
	assert_eq!(runs.get(), 1);

	// The zeros are distinct values to change detection
	atom.set(-0.0);
	assert_eq!(runs.get(), 2, "`-0.0` over `0.0` didn't count as a change");
	atom.set(-0.0);
	assert_eq!(runs.get(), 2, "`-0.0` over `-0.0` counted as a change");
}

#[test]
fn tracking_is_idempotent() {
	let obj = wrap(Obj::from_iter([("x", 1)]));
	let wrapped = obj.as_wrapped().expect("Should be wrapped").clone();

	let _effect = Effect::new({
		let wrapped = wrapped.clone();
		move || {
			// Read the same slot several times within one run
			let _ = wrapped.prop("x");
			let _ = wrapped.prop("x");
			let _ = wrapped.prop("x");
		}
	});

	assert_eq!(
		subscriber_count(&obj, &DepKey::prop("x")),
		1,
		"Repeated reads created more than one link"
	);
}

#[test]
fn stale_dependencies_are_pruned() {
	let runs = Rc::new(Cell::new(0));

	let obj = wrap(Obj::from_iter([
		("flag", Value::Bool(true)),
		("a", Value::from(1)),
		("b", Value::from(2)),
	]));
	let wrapped = obj.as_wrapped().expect("Should be wrapped").clone();

	let _effect = Effect::new({
		let runs = Rc::clone(&runs);
		let wrapped = wrapped.clone();
		move || {
			let read = match wrapped.prop("flag").as_bool() {
				Some(true) => wrapped.prop("a"),
				_ => wrapped.prop("b"),
			};
			let _ = read;
			runs.set(runs.get() + 1);
		}
	});
	assert_eq!(runs.get(), 1);
	assert_eq!(subscriber_count(&obj, &DepKey::prop("a")), 1);
	assert_eq!(subscriber_count(&obj, &DepKey::prop("b")), 0);

	// Flip the branch: `a` must be pruned, `b` picked up
	wrapped.set_prop("flag", false);
	assert_eq!(runs.get(), 2);
	assert_eq!(subscriber_count(&obj, &DepKey::prop("a")), 0, "Stale dependency kept");
	assert_eq!(subscriber_count(&obj, &DepKey::prop("b")), 1);

	wrapped.set_prop("a", 10);
	assert_eq!(runs.get(), 2, "Pruned dependency still re-ran the effect");

	wrapped.set_prop("b", 20);
	assert_eq!(runs.get(), 3);
}

#[test]
fn untracked_reads_do_not_subscribe() {
	let runs = Rc::new(Cell::new(0));

	let tracked = Atom::new(0);
	let ignored = Atom::new(0);
	let _effect = Effect::new({
		let runs = Rc::clone(&runs);
		let tracked = tracked.clone();
		let ignored = ignored.clone();
		move || {
			let _ = tracked.get();
			let _ = untracked(|| ignored.get());
			runs.set(runs.get() + 1);
		}
	});
	assert_eq!(runs.get(), 1);

	ignored.set(1);
	assert_eq!(runs.get(), 1, "Untracked read still subscribed");

	tracked.set(1);
	assert_eq!(runs.get(), 2);
}

#[test]
fn recursion_is_guarded() {
	let runs = Rc::new(Cell::new(0));

	// The effect writes the atom it reads
	let atom = Atom::new(0);
	let _effect = Effect::new({
		let runs = Rc::clone(&runs);
		let atom = atom.clone();
		move || {
			let value = atom.get().as_int().expect("Should be an int");
			atom.set(value + 1);
			runs.set(runs.get() + 1);
		}
	});
	assert_eq!(runs.get(), 1, "Effect re-ran from its own write");
	assert_eq!(atom.get().as_int(), Some(1));

	atom.set(10);
	assert_eq!(runs.get(), 2);
	assert_eq!(atom.get().as_int(), Some(11));
}

#[test]
fn pause_defers_and_resume_runs_once() {
	let runs = Rc::new(Cell::new(0));

	let atom = Atom::new(0);
	let effect = Effect::new({
		let runs = Rc::clone(&runs);
		let atom = atom.clone();
		move || {
			let _ = atom.get();
			runs.set(runs.get() + 1);
		}
	});
	assert_eq!(runs.get(), 1);

	effect.pause();
	atom.set(1);
	atom.set(2);
	assert_eq!(runs.get(), 1, "Paused effect still ran");

	effect.resume();
	assert_eq!(runs.get(), 2, "Resumed effect didn't coalesce to one run");

	// Resuming without pending notifications runs nothing
	effect.pause();
	effect.resume();
	assert_eq!(runs.get(), 2);
}

#[test]
fn cleanup_runs_before_next_run() {
	let cleanups = Rc::new(Cell::new(0));

	let atom = Atom::new(0);
	let effect = Effect::new({
		let cleanups = Rc::clone(&cleanups);
		let atom = atom.clone();
		move || {
			let _ = atom.get();
			let cleanups = Rc::clone(&cleanups);
			effect::on_cleanup(move || cleanups.set(cleanups.get() + 1));
		}
	});
	assert_eq!(cleanups.get(), 0);

	atom.set(1);
	assert_eq!(cleanups.get(), 1, "Cleanup didn't run before the re-run");

	effect.stop();
	assert_eq!(cleanups.get(), 2, "Cleanup didn't run on stop");
}

#[test]
fn stop_is_terminal() {
	let runs = Rc::new(Cell::new(0));
	let stops = Rc::new(Cell::new(0));

	let atom = Atom::new(0);
	let effect = Effect::with_options(
		{
			let runs = Rc::clone(&runs);
			let atom = atom.clone();
			move || {
				let _ = atom.get();
				runs.set(runs.get() + 1);
			}
		},
		EffectOptions {
			on_stop: Some(Box::new({
				let stops = Rc::clone(&stops);
				move || stops.set(stops.get() + 1)
			})),
			..EffectOptions::default()
		},
	);
	assert_eq!(runs.get(), 1);
	assert!(effect.is_active());

	effect.stop();
	assert!(!effect.is_active());
	assert_eq!(stops.get(), 1);

	atom.set(1);
	assert_eq!(runs.get(), 1, "Stopped effect re-ran");

	// Idempotent
	effect.stop();
	assert_eq!(stops.get(), 1, "`on_stop` ran twice");
}

#[test]
fn custom_scheduler_replaces_rerun() {
	let runs = Rc::new(Cell::new(0));
	let scheduled = Rc::new(Cell::new(0));

	let atom = Atom::new(0);
	let _effect = Effect::with_options(
		{
			let runs = Rc::clone(&runs);
			let atom = atom.clone();
			move || {
				let _ = atom.get();
				runs.set(runs.get() + 1);
			}
		},
		EffectOptions {
			scheduler: Some(Box::new({
				let scheduled = Rc::clone(&scheduled);
				move || scheduled.set(scheduled.get() + 1)
			})),
			..EffectOptions::default()
		},
	);
	assert_eq!((runs.get(), scheduled.get()), (1, 0));

	atom.set(1);
	assert_eq!((runs.get(), scheduled.get()), (1, 1), "Scheduler wasn't used");
}
