//! Keyed-collection adapter
//!
//! Entry access over a wrapped [`Map`] or [`Set`]. Entry reads track
//! per-key slots; size and value iteration track the iterate sentinel,
//! and map key iteration tracks its own sentinel so inserting a value
//! under an existing key doesn't re-run key-only iterators.
//!
//! Keys are normalized to raw before lookup and storage, so a wrapped
//! and a raw handle to the same container address the same entry.
//!
//! [`Map`]: crate::Map
//! [`Set`]: crate::Set

// Imports
use {
	super::{Raw, Wrapped},
	crate::{
		Value,
		graph::{self, DepKey},
	},
};

impl Wrapped {
	/// Gets a map entry, tracking the read.
	///
	/// Missing entries read as [`Value::Unit`].
	#[must_use]
	#[track_caller]
	pub fn entry(&self, key: &Value) -> Value {
		let Raw::Map(map) = self.raw() else {
			self.warn_kind_mismatch("entry");
			return Value::Unit;
		};
		let key = crate::wrap::to_raw(key);
		graph::track_slot(map.id(), DepKey::entry(&key));

		let value = map.entries().borrow().get(&key).cloned().unwrap_or(Value::Unit);
		self.emit(value)
	}

	/// Inserts a map entry, triggering if it changed.
	///
	/// A new key also triggers value and key iteration.
	#[track_caller]
	pub fn insert(&self, key: impl Into<Value>, value: impl Into<Value>) {
		let Raw::Map(map) = self.raw() else {
			self.warn_kind_mismatch("insert");
			return;
		};
		if !self.guard_write() {
			return;
		}

		let key = crate::wrap::to_raw(&key.into());
		let value = value.into();
		let value = match self.mode().is_shallow() {
			true => value,
			false => crate::wrap::to_raw(&value),
		};

		enum Outcome {
			Added,
			Changed,
			Unchanged,
		}
		let outcome = {
			let mut entries = map.entries().borrow_mut();
			match entries.get_mut(&key) {
				Some(slot) => match slot.same(&value) {
					true => Outcome::Unchanged,
					false => {
						*slot = value;
						Outcome::Changed
					},
				},
				None => {
					entries.insert(key.clone(), value);
					Outcome::Added
				},
			}
		};

		match outcome {
			Outcome::Added => graph::trigger_keys(
				map.id(),
				[DepKey::entry(&key), DepKey::Iterate, DepKey::KeyIterate],
			),
			Outcome::Changed => graph::trigger_keys(map.id(), [DepKey::entry(&key)]),
			Outcome::Unchanged => (),
		}
	}

	/// Adds a set item, triggering if it wasn't present
	#[track_caller]
	pub fn add(&self, value: impl Into<Value>) {
		let Raw::Set(set) = self.raw() else {
			self.warn_kind_mismatch("add");
			return;
		};
		if !self.guard_write() {
			return;
		}

		let value = crate::wrap::to_raw(&value.into());
		let added = set.items().borrow_mut().insert(value.clone());
		if added {
			graph::trigger_keys(set.id(), [DepKey::entry(&value), DepKey::Iterate]);
		}
	}

	/// Returns whether an entry exists, tracking the read
	#[must_use]
	#[track_caller]
	pub fn has_entry(&self, key: &Value) -> bool {
		let key = crate::wrap::to_raw(key);
		match self.raw() {
			Raw::Map(map) => {
				graph::track_slot(map.id(), DepKey::entry(&key));
				map.entries().borrow().contains_key(&key)
			},
			Raw::Set(set) => {
				graph::track_slot(set.id(), DepKey::entry(&key));
				set.items().borrow().contains(&key)
			},
			_ => {
				self.warn_kind_mismatch("has_entry");
				false
			},
		}
	}

	/// Removes an entry, triggering if it existed
	#[track_caller]
	pub fn remove_entry(&self, key: &Value) -> bool {
		if !self.guard_write() {
			return false;
		}

		let key = crate::wrap::to_raw(key);
		match self.raw() {
			Raw::Map(map) => {
				let removed = map.entries().borrow_mut().shift_remove(&key).is_some();
				if removed {
					graph::trigger_keys(
						map.id(),
						[DepKey::entry(&key), DepKey::Iterate, DepKey::KeyIterate],
					);
				}
				removed
			},
			Raw::Set(set) => {
				let removed = set.items().borrow_mut().shift_remove(&key);
				if removed {
					graph::trigger_keys(set.id(), [DepKey::entry(&key), DepKey::Iterate]);
				}
				removed
			},
			_ => {
				self.warn_kind_mismatch("remove_entry");
				false
			},
		}
	}

	/// Returns the entry count, tracking iteration
	#[must_use]
	#[track_caller]
	pub fn size(&self) -> usize {
		match self.raw() {
			Raw::Map(map) => {
				graph::track_slot(map.id(), DepKey::Iterate);
				map.entries().borrow().len()
			},
			Raw::Set(set) => {
				graph::track_slot(set.id(), DepKey::Iterate);
				set.items().borrow().len()
			},
			_ => {
				self.warn_kind_mismatch("size");
				0
			},
		}
	}

	/// Removes every entry, triggering every slot of the collection
	#[track_caller]
	pub fn clear(&self) {
		if !self.guard_write() {
			return;
		}

		match self.raw() {
			Raw::Map(map) => {
				let emptied = {
					let mut entries = map.entries().borrow_mut();
					let emptied = !entries.is_empty();
					entries.clear();
					emptied
				};
				if emptied {
					graph::trigger_all(map.id());
				}
			},
			Raw::Set(set) => {
				let emptied = {
					let mut items = set.items().borrow_mut();
					let emptied = !items.is_empty();
					items.clear();
					emptied
				};
				if emptied {
					graph::trigger_all(set.id());
				}
			},
			_ => self.warn_kind_mismatch("clear"),
		}
	}

	/// Returns every map key, tracking key iteration only
	#[must_use]
	#[track_caller]
	pub fn entry_keys(&self) -> Vec<Value> {
		let Raw::Map(map) = self.raw() else {
			self.warn_kind_mismatch("entry_keys");
			return Vec::new();
		};
		graph::track_slot(map.id(), DepKey::KeyIterate);

		let keys: Vec<_> = map.entries().borrow().keys().cloned().collect();
		keys.into_iter().map(|key| self.emit(key)).collect()
	}

	/// Returns every value, tracking iteration
	#[must_use]
	#[track_caller]
	pub fn entry_values(&self) -> Vec<Value> {
		let values = match self.raw() {
			Raw::Map(map) => {
				graph::track_slot(map.id(), DepKey::Iterate);
				map.entries().borrow().values().cloned().collect()
			},
			Raw::Set(set) => {
				graph::track_slot(set.id(), DepKey::Iterate);
				set.items().borrow().iter().cloned().collect()
			},
			_ => {
				self.warn_kind_mismatch("entry_values");
				Vec::new()
			},
		};
		values.into_iter().map(|value| self.emit(value)).collect()
	}

	/// Returns every map entry, tracking iteration
	#[must_use]
	#[track_caller]
	pub fn entries_list(&self) -> Vec<(Value, Value)> {
		let Raw::Map(map) = self.raw() else {
			self.warn_kind_mismatch("entries_list");
			return Vec::new();
		};
		graph::track_slot(map.id(), DepKey::Iterate);

		let entries: Vec<_> = map
			.entries()
			.borrow()
			.iter()
			.map(|(key, value)| (key.clone(), value.clone()))
			.collect();
		entries
			.into_iter()
			.map(|(key, value)| (self.emit(key), self.emit(value)))
			.collect()
	}

	/// Calls `f` with every `(value, key)` pair, tracking iteration.
	///
	/// For sets, the key is the value itself.
	#[track_caller]
	pub fn for_each_entry(&self, mut f: impl FnMut(Value, Value)) {
		match self.raw() {
			Raw::Map(map) => {
				graph::track_slot(map.id(), DepKey::Iterate);
				let entries: Vec<_> = map
					.entries()
					.borrow()
					.iter()
					.map(|(key, value)| (key.clone(), value.clone()))
					.collect();
				for (key, value) in entries {
					f(self.emit(value), self.emit(key));
				}
			},
			Raw::Set(set) => {
				graph::track_slot(set.id(), DepKey::Iterate);
				let items: Vec<_> = set.items().borrow().iter().cloned().collect();
				for value in items {
					f(self.emit(value.clone()), self.emit(value));
				}
			},
			_ => self.warn_kind_mismatch("for_each_entry"),
		}
	}
}
