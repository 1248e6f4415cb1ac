//! Object adapter
//!
//! Property access over a wrapped [`Obj`]. Reads track the property's
//! slot (enumeration tracks the iterate sentinel), writes trigger it,
//! and adding or removing a property additionally triggers iteration.
//!
//! Deep wrappers auto-unwrap an [`Atom`] or [`Computed`] stored in a
//! property, and writing a plain value over an [`Atom`] writes through
//! to the atom instead of replacing it.
//!
//! [`Obj`]: crate::Obj
//! [`Atom`]: crate::Atom
//! [`Computed`]: crate::Computed

// Imports
use {
	super::{Raw, Wrapped},
	crate::{
		Value,
		graph::{self, DepKey},
	},
	std::rc::Rc,
};

impl Wrapped {
	/// Gets a property, tracking the read.
	///
	/// Missing properties read as [`Value::Unit`].
	#[must_use]
	#[track_caller]
	pub fn prop(&self, key: impl Into<Rc<str>>) -> Value {
		let Raw::Obj(obj) = self.raw() else {
			self.warn_kind_mismatch("prop");
			return Value::Unit;
		};
		let key = key.into();
		graph::track_slot(obj.id(), DepKey::Prop(Rc::clone(&key)));

		// Cells unwrap to their raw value first, so what comes back still
		// carries this wrapper's mode.
		let value = obj.fields().borrow().get(&key).cloned().unwrap_or(Value::Unit);
		match (self.mode().is_shallow(), value) {
			(false, Value::Atom(atom)) => self.emit(crate::wrap::to_raw(&atom.get())),
			(false, Value::Computed(computed)) => self.emit(crate::wrap::to_raw(&computed.get())),
			(_, value) => self.emit(value),
		}
	}

	/// Sets a property, triggering if it changed.
	///
	/// A new property also triggers iteration.
	#[track_caller]
	pub fn set_prop(&self, key: impl Into<Rc<str>>, value: impl Into<Value>) {
		let Raw::Obj(obj) = self.raw() else {
			self.warn_kind_mismatch("set_prop");
			return;
		};
		if !self.guard_write() {
			return;
		}

		let key = key.into();
		let value = value.into();
		let value = match self.mode().is_shallow() {
			true => value,
			false => crate::wrap::to_raw(&value),
		};

		// Deep writes over an atom-valued property write through to the
		// atom, which triggers itself.
		if !self.mode().is_shallow() && !matches!(value, Value::Atom(_)) {
			let existing = match obj.fields().borrow().get(&key) {
				Some(Value::Atom(atom)) => Some(atom.clone()),
				_ => None,
			};
			if let Some(atom) = existing {
				atom.set(value);
				return;
			}
		}

		enum Outcome {
			Added,
			Changed,
			Unchanged,
		}
		let outcome = {
			let mut fields = obj.fields().borrow_mut();
			match fields.get_mut(&key) {
				Some(slot) => match slot.same(&value) {
					true => Outcome::Unchanged,
					false => {
						*slot = value;
						Outcome::Changed
					},
				},
				None => {
					fields.insert(Rc::clone(&key), value);
					Outcome::Added
				},
			}
		};

		match outcome {
			Outcome::Added => graph::trigger_keys(obj.id(), [DepKey::Prop(key), DepKey::Iterate]),
			Outcome::Changed => graph::trigger_keys(obj.id(), [DepKey::Prop(key)]),
			Outcome::Unchanged => (),
		}
	}

	/// Removes a property, triggering if it existed
	#[track_caller]
	pub fn remove_prop(&self, key: impl Into<Rc<str>>) -> bool {
		let Raw::Obj(obj) = self.raw() else {
			self.warn_kind_mismatch("remove_prop");
			return false;
		};
		if !self.guard_write() {
			return false;
		}

		let key = key.into();
		let removed = obj.fields().borrow_mut().shift_remove(&key).is_some();
		if removed {
			graph::trigger_keys(obj.id(), [DepKey::Prop(key), DepKey::Iterate]);
		}
		removed
	}

	/// Returns whether a property exists, tracking the read
	#[must_use]
	#[track_caller]
	pub fn has_prop(&self, key: impl Into<Rc<str>>) -> bool {
		let Raw::Obj(obj) = self.raw() else {
			self.warn_kind_mismatch("has_prop");
			return false;
		};
		let key = key.into();
		graph::track_slot(obj.id(), DepKey::Prop(Rc::clone(&key)));
		obj.fields().borrow().contains_key(&key)
	}

	/// Returns all property names, tracking iteration
	#[must_use]
	#[track_caller]
	pub fn keys(&self) -> Vec<Rc<str>> {
		let Raw::Obj(obj) = self.raw() else {
			self.warn_kind_mismatch("keys");
			return Vec::new();
		};
		graph::track_slot(obj.id(), DepKey::Iterate);
		obj.fields().borrow().keys().cloned().collect()
	}

	/// Returns all properties, tracking iteration.
	///
	/// Values come back per this wrapper's mode.
	#[must_use]
	#[track_caller]
	pub fn entries(&self) -> Vec<(Rc<str>, Value)> {
		let Raw::Obj(obj) = self.raw() else {
			self.warn_kind_mismatch("entries");
			return Vec::new();
		};
		graph::track_slot(obj.id(), DepKey::Iterate);

		let fields: Vec<_> = obj
			.fields()
			.borrow()
			.iter()
			.map(|(key, value)| (Rc::clone(key), value.clone()))
			.collect();
		fields
			.into_iter()
			.map(|(key, value)| (key, self.emit(value)))
			.collect()
	}
}
