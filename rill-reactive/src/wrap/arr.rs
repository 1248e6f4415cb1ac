//! Array adapter
//!
//! Index and length access over a wrapped [`Arr`], plus the iteration,
//! mutation and search method families. Bulk reads track the array-wide
//! iterate sentinel once rather than every index; length-mutating
//! methods run with tracking paused and writes batched so each one
//! lands as a single coalesced notification.
//!
//! Arrays never auto-unwrap an [`Atom`] stored at an index.
//!
//! [`Arr`]: crate::Arr
//! [`Atom`]: crate::Atom

// Imports
use {
	super::{Raw, Wrapped},
	crate::{
		Arr, Value,
		graph::{self, DepKey},
	},
};

impl Wrapped {
	/// Accesses the raw array, warning on other shapes
	#[track_caller]
	fn as_arr(&self, operation: &str) -> Option<&Arr> {
		match self.raw() {
			Raw::Arr(arr) => Some(arr),
			_ => {
				self.warn_kind_mismatch(operation);
				None
			},
		}
	}

	/// Gets the item at `index`, tracking the read.
	///
	/// Out-of-bounds reads as [`Value::Unit`].
	#[must_use]
	#[track_caller]
	pub fn at(&self, index: usize) -> Value {
		let Some(arr) = self.as_arr("at") else {
			return Value::Unit;
		};
		graph::track_slot(arr.id(), DepKey::Index(index));

		let value = arr.items().borrow().get(index).cloned().unwrap_or(Value::Unit);
		self.emit(value)
	}

	/// Returns the length, tracking the read
	#[must_use]
	#[track_caller]
	pub fn len(&self) -> usize {
		let Some(arr) = self.as_arr("len") else { return 0 };
		graph::track_slot(arr.id(), DepKey::Length);
		arr.items().borrow().len()
	}

	/// Returns whether the array is empty, tracking the length
	#[must_use]
	#[track_caller]
	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Sets the item at `index`, triggering if it changed.
	///
	/// Writing past the end fills the gap with [`Value::Unit`] and also
	/// triggers the length.
	#[track_caller]
	pub fn set_at(&self, index: usize, value: impl Into<Value>) {
		let Some(arr) = self.as_arr("set_at") else { return };
		if !self.guard_write() {
			return;
		}

		let value = value.into();
		let value = match self.mode().is_shallow() {
			true => value,
			false => crate::wrap::to_raw(&value),
		};

		enum Outcome {
			Grew,
			Changed,
			Unchanged,
		}
		let outcome = {
			let mut items = arr.items().borrow_mut();
			match items.get_mut(index) {
				Some(slot) => match slot.same(&value) {
					true => Outcome::Unchanged,
					false => {
						*slot = value;
						Outcome::Changed
					},
				},
				None => {
					items.resize(index, Value::Unit);
					items.push(value);
					Outcome::Grew
				},
			}
		};

		match outcome {
			Outcome::Grew => graph::trigger_keys(
				arr.id(),
				[DepKey::Index(index), DepKey::Length, DepKey::ArrayIterate],
			),
			Outcome::Changed => graph::trigger_keys(arr.id(), [DepKey::Index(index), DepKey::ArrayIterate]),
			Outcome::Unchanged => (),
		}
	}

	/// Resizes the array to `len`, filling with [`Value::Unit`].
	///
	/// Triggers every index slot at or past the new length, plus length
	/// and iteration.
	#[track_caller]
	pub fn set_len(&self, len: usize) {
		let Some(arr) = self.as_arr("set_len") else { return };
		if !self.guard_write() {
			return;
		}

		let old_len = arr.items().borrow().len();
		if len == old_len {
			return;
		}
		arr.items().borrow_mut().resize(len, Value::Unit);
		graph::trigger_indices_from(arr.id(), len, vec![DepKey::Length, DepKey::ArrayIterate]);
	}

	/// Appends an item, returning the new length
	#[track_caller]
	pub fn push(&self, value: impl Into<Value>) -> usize {
		let Some(arr) = self.as_arr("push") else { return 0 };
		if !self.guard_write() {
			return arr.items().borrow().len();
		}

		let value = self.prep_write(value.into());
		graph::untracked(|| {
			graph::batch(|| {
				let index = {
					let mut items = arr.items().borrow_mut();
					items.push(value);
					items.len() - 1
				};
				graph::trigger_keys(arr.id(), [DepKey::Index(index), DepKey::Length, DepKey::ArrayIterate]);
				index + 1
			})
		})
	}

	/// Removes and returns the last item, or [`Value::Unit`] when empty
	#[track_caller]
	pub fn pop(&self) -> Value {
		let Some(arr) = self.as_arr("pop") else {
			return Value::Unit;
		};
		if !self.guard_write() {
			return Value::Unit;
		}

		graph::untracked(|| {
			graph::batch(|| {
				let (value, index) = {
					let mut items = arr.items().borrow_mut();
					match items.pop() {
						Some(value) => {
							let index = items.len();
							(value, Some(index))
						},
						None => (Value::Unit, None),
					}
				};
				if let Some(index) = index {
					graph::trigger_keys(arr.id(), [DepKey::Index(index), DepKey::Length, DepKey::ArrayIterate]);
				}
				value
			})
		})
	}

	/// Removes and returns the first item, or [`Value::Unit`] when empty
	#[track_caller]
	pub fn shift(&self) -> Value {
		let Some(arr) = self.as_arr("shift") else {
			return Value::Unit;
		};
		if !self.guard_write() {
			return Value::Unit;
		}

		graph::untracked(|| {
			graph::batch(|| {
				let value = {
					let mut items = arr.items().borrow_mut();
					match items.is_empty() {
						true => None,
						false => Some(items.remove(0)),
					}
				};
				match value {
					Some(value) => {
						// Every index shifted
						graph::trigger_indices_from(arr.id(), 0, vec![DepKey::Length, DepKey::ArrayIterate]);
						value
					},
					None => Value::Unit,
				}
			})
		})
	}

	/// Prepends an item, returning the new length
	#[track_caller]
	pub fn unshift(&self, value: impl Into<Value>) -> usize {
		let Some(arr) = self.as_arr("unshift") else { return 0 };
		if !self.guard_write() {
			return arr.items().borrow().len();
		}

		let value = self.prep_write(value.into());
		graph::untracked(|| {
			graph::batch(|| {
				let len = {
					let mut items = arr.items().borrow_mut();
					items.insert(0, value);
					items.len()
				};
				graph::trigger_indices_from(arr.id(), 0, vec![DepKey::Length, DepKey::ArrayIterate]);
				len
			})
		})
	}

	/// Removes `delete_count` items at `start`, inserting `insert` in
	/// their place; returns the removed items.
	///
	/// One coalesced notification pass covers all the internal writes.
	#[track_caller]
	pub fn splice(&self, start: usize, delete_count: usize, insert: Vec<Value>) -> Vec<Value> {
		let Some(arr) = self.as_arr("splice") else {
			return Vec::new();
		};
		if !self.guard_write() {
			return Vec::new();
		}

		let insert: Vec<_> = insert.into_iter().map(|value| self.prep_write(value)).collect();
		graph::untracked(|| {
			graph::batch(|| {
				// A past-the-end start clamps to the old length, where the
				// inserted items actually land; the trigger must start there
				// too.
				let (removed, changed, start) = {
					let mut items = arr.items().borrow_mut();
					let start = start.min(items.len());
					let end = start.saturating_add(delete_count).min(items.len());
					let changed = end > start || !insert.is_empty();
					let removed: Vec<_> = items.splice(start..end, insert).collect();
					(removed, changed, start)
				};
				if changed {
					graph::trigger_indices_from(arr.id(), start, vec![DepKey::Length, DepKey::ArrayIterate]);
				}
				removed
			})
		})
	}

	/// Calls `f` for every item, tracking iteration once
	#[track_caller]
	pub fn for_each(&self, mut f: impl FnMut(Value, usize)) {
		for (index, value) in self.iter_snapshot("for_each").into_iter().enumerate() {
			f(self.emit(value), index);
		}
	}

	/// Maps every item through `f`, tracking iteration once
	#[must_use]
	#[track_caller]
	pub fn map_items(&self, mut f: impl FnMut(Value, usize) -> Value) -> Vec<Value> {
		self.iter_snapshot("map_items")
			.into_iter()
			.enumerate()
			.map(|(index, value)| f(self.emit(value), index))
			.collect()
	}

	/// Keeps the items `f` accepts, tracking iteration once
	#[must_use]
	#[track_caller]
	pub fn filter(&self, mut f: impl FnMut(&Value) -> bool) -> Vec<Value> {
		self.iter_snapshot("filter")
			.into_iter()
			.map(|value| self.emit(value))
			.filter(|value| f(value))
			.collect()
	}

	/// Returns the first item `f` accepts, tracking iteration once
	#[must_use]
	#[track_caller]
	pub fn find(&self, mut f: impl FnMut(&Value) -> bool) -> Option<Value> {
		self.iter_snapshot("find")
			.into_iter()
			.map(|value| self.emit(value))
			.find(|value| f(value))
	}

	/// Returns whether `f` accepts every item, tracking iteration once
	#[must_use]
	#[track_caller]
	pub fn every(&self, mut f: impl FnMut(&Value) -> bool) -> bool {
		self.iter_snapshot("every")
			.into_iter()
			.all(|value| f(&self.emit(value)))
	}

	/// Returns whether `f` accepts any item, tracking iteration once
	#[must_use]
	#[track_caller]
	pub fn some(&self, mut f: impl FnMut(&Value) -> bool) -> bool {
		self.iter_snapshot("some")
			.into_iter()
			.any(|value| f(&self.emit(value)))
	}

	/// Folds every item into `init` through `f`, tracking iteration once
	#[must_use]
	#[track_caller]
	pub fn reduce(&self, init: Value, mut f: impl FnMut(Value, Value, usize) -> Value) -> Value {
		self.iter_snapshot("reduce")
			.into_iter()
			.enumerate()
			.fold(init, |acc, (index, value)| f(acc, self.emit(value), index))
	}

	/// Returns every item, tracking iteration once
	#[must_use]
	#[track_caller]
	pub fn to_vec(&self) -> Vec<Value> {
		self.iter_snapshot("to_vec")
			.into_iter()
			.map(|value| self.emit(value))
			.collect()
	}

	/// Returns whether the array contains `value`, tracking iteration
	/// once.
	///
	/// Wrapped arguments not found as-is retry as their raw form, since
	/// the backing array stores raw values.
	#[must_use]
	#[track_caller]
	pub fn includes(&self, value: &Value) -> bool {
		self.search(value, "includes").is_some()
	}

	/// Returns the first index holding `value`, with the same raw retry
	/// as [`includes`](Self::includes)
	#[must_use]
	#[track_caller]
	pub fn index_of(&self, value: &Value) -> Option<usize> {
		self.search(value, "index_of")
	}

	/// Returns the last index holding `value`, with the same raw retry
	/// as [`includes`](Self::includes)
	#[must_use]
	#[track_caller]
	pub fn last_index_of(&self, value: &Value) -> Option<usize> {
		let items = self.iter_snapshot("last_index_of");
		let found = items.iter().rposition(|item| item.same(value));
		match (found, value) {
			(None, Value::Wrapped(_)) => {
				let raw = crate::wrap::to_raw(value);
				items.iter().rposition(|item| item.same(&raw))
			},
			(found, _) => found,
		}
	}

	/// Snapshots the items after tracking the iterate sentinel
	#[track_caller]
	fn iter_snapshot(&self, operation: &str) -> Vec<Value> {
		let Some(arr) = self.as_arr(operation) else {
			return Vec::new();
		};
		graph::track_slot(arr.id(), DepKey::ArrayIterate);
		arr.items().borrow().clone()
	}

	/// Forward search with a raw retry for wrapped arguments
	#[track_caller]
	fn search(&self, value: &Value, operation: &str) -> Option<usize> {
		let items = self.iter_snapshot(operation);
		let found = items.iter().position(|item| item.same(value));
		match (found, value) {
			(None, Value::Wrapped(_)) => {
				let raw = crate::wrap::to_raw(value);
				items.iter().position(|item| item.same(&raw))
			},
			(found, _) => found,
		}
	}

	/// Normalizes a value for writing per this wrapper's mode
	fn prep_write(&self, value: Value) -> Value {
		match self.mode().is_shallow() {
			true => value,
			false => crate::wrap::to_raw(&value),
		}
	}
}
