//! Atoms
//!
//! An atom is a boxed single-value cell: reads track it as one dep,
//! writes that actually change the value trigger it. Deep atoms store
//! containers raw and hand them out wrapped; shallow atoms store and
//! return values untouched.

// Imports
use {
	crate::{Value, graph, loc::Loc},
	core::fmt,
	std::{cell::RefCell, rc::Rc},
};

/// A single-value reactive cell
pub struct Atom {
	/// Inner
	inner: Rc<Inner>,
}

/// Atom inner
struct Inner {
	/// Graph dep node
	dep: graph::DepId,

	/// Current value
	value: RefCell<Value>,

	/// Whether reads skip wrapping
	shallow: bool,

	/// Where the atom was defined
	defined_loc: Loc,
}

impl Atom {
	/// Creates a deep atom.
	///
	/// Container values are normalized to raw on write and wrapped on
	/// read.
	#[track_caller]
	pub fn new(value: impl Into<Value>) -> Self {
		Self::create(crate::wrap::to_raw(&value.into()), false)
	}

	/// Creates a shallow atom.
	///
	/// Values pass through untouched; only the cell itself is reactive.
	#[track_caller]
	pub fn new_shallow(value: impl Into<Value>) -> Self {
		Self::create(value.into(), true)
	}

	#[track_caller]
	fn create(value: Value, shallow: bool) -> Self {
		let dep = graph::with(|graph| graph.deps.insert(graph::DepNode::standalone()));
		let atom = Self {
			inner: Rc::new(Inner {
				dep,
				value: RefCell::new(value),
				shallow,
				defined_loc: Loc::caller(),
			}),
		};
		tracing::trace!(?atom, "Created atom");
		atom
	}

	/// Gets the current value, tracking the read
	#[must_use]
	pub fn get(&self) -> Value {
		graph::with(|graph| {
			graph.track_dep(self.inner.dep);
		});
		let value = self.inner.value.borrow().clone();
		match self.inner.shallow {
			true => value,
			false => crate::wrap::wrap(value),
		}
	}

	/// Sets the value, triggering subscribers if it changed
	pub fn set(&self, value: impl Into<Value>) {
		let value = value.into();
		let value = match self.inner.shallow {
			true => value,
			false => crate::wrap::to_raw(&value),
		};

		let changed = !self.inner.value.borrow().same(&value);
		if changed {
			*self.inner.value.borrow_mut() = value;
			graph::trigger_dep(self.inner.dep);
		}
	}

	/// Returns a unique identifier for this atom.
	///
	/// Cloned handles retain the same id.
	#[must_use]
	pub fn id(&self) -> usize {
		Rc::as_ptr(&self.inner).addr()
	}

	/// Returns whether this atom is shallow
	#[must_use]
	pub fn is_shallow(&self) -> bool {
		self.inner.shallow
	}

	/// Returns where this atom was defined
	#[must_use]
	pub fn defined_loc(&self) -> Loc {
		self.inner.defined_loc
	}
}

impl Clone for Atom {
	fn clone(&self) -> Self {
		Self {
			inner: Rc::clone(&self.inner),
		}
	}
}

impl PartialEq for Atom {
	fn eq(&self, other: &Self) -> bool {
		self.id() == other.id()
	}
}

impl Eq for Atom {}

impl fmt::Debug for Atom {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut debug = f.debug_struct("Atom");
		debug.field("id", &self.id());
		debug.field("defined_loc", &self.inner.defined_loc);
		match self.inner.value.try_borrow() {
			Ok(value) => debug.field("value", &*value).finish_non_exhaustive(),
			Err(_) => debug.finish_non_exhaustive(),
		}
	}
}

impl Drop for Inner {
	fn drop(&mut self) {
		let _ = graph::try_with(|graph| graph.free_dep(self.dep));
	}
}
