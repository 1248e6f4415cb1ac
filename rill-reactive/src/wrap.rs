//! Wrapped containers
//!
//! A [`Wrapped`] value is an interception handle over a raw container:
//! every read through it tracks the slot it touched, every write
//! triggers it. Wrapping is a cheap handle (container + mode), not a
//! copy; two wrappers over the same container with the same mode are
//! the same value.
//!
//! Four modes: deep or shallow, each mutable or readonly. Deep wrappers
//! hand nested containers back wrapped and store written values raw;
//! shallow ones pass values through untouched. Readonly wrappers still
//! track reads, so a readonly view over data mutated elsewhere stays
//! live, but reject writes with a warning.

// Modules
mod arr;
mod keyed;
mod obj;

// Imports
use {
	crate::{Arr, Map, Obj, Set, Value, loc::Loc},
	core::fmt,
};

/// Wrapping mode
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Mode {
	/// Mutable, nested containers wrapped on read
	Deep,

	/// Mutable, nested values untouched
	Shallow,

	/// Readonly, nested containers wrapped readonly on read
	ReadonlyDeep,

	/// Readonly, nested values untouched
	ReadonlyShallow,
}

impl Mode {
	/// Returns whether writes are rejected
	#[must_use]
	pub const fn is_readonly(self) -> bool {
		matches!(self, Self::ReadonlyDeep | Self::ReadonlyShallow)
	}

	/// Returns whether nested values pass through untouched
	#[must_use]
	pub const fn is_shallow(self) -> bool {
		matches!(self, Self::Shallow | Self::ReadonlyShallow)
	}
}

/// The raw container behind a wrapper
#[derive(Clone)]
pub(crate) enum Raw {
	/// Object
	Obj(Obj),

	/// Array
	Arr(Arr),

	/// Map
	Map(Map),

	/// Set
	Set(Set),
}

/// An interception handle over a raw container
#[derive(Clone)]
pub struct Wrapped {
	/// Raw container
	raw: Raw,

	/// Mode
	mode: Mode,
}

impl Wrapped {
	/// Returns the identity of the wrapped raw container
	#[must_use]
	pub fn id(&self) -> usize {
		match &self.raw {
			Raw::Obj(obj) => obj.id(),
			Raw::Arr(arr) => arr.id(),
			Raw::Map(map) => map.id(),
			Raw::Set(set) => set.id(),
		}
	}

	/// Returns this wrapper's mode
	#[must_use]
	pub const fn mode(&self) -> Mode {
		self.mode
	}

	/// Returns the raw container as a value
	#[must_use]
	pub fn raw_value(&self) -> Value {
		match &self.raw {
			Raw::Obj(obj) => Value::Obj(obj.clone()),
			Raw::Arr(arr) => Value::Arr(arr.clone()),
			Raw::Map(map) => Value::Map(map.clone()),
			Raw::Set(set) => Value::Set(set.clone()),
		}
	}

	/// Accesses the raw container
	pub(crate) const fn raw(&self) -> &Raw {
		&self.raw
	}

	/// Wraps a value read out of this container, per this wrapper's mode
	pub(crate) fn emit(&self, value: Value) -> Value {
		match self.mode.is_shallow() {
			true => value,
			false => match self.mode.is_readonly() {
				true => self::wrap_with(value, Mode::ReadonlyDeep),
				false => self::wrap_with(value, Mode::Deep),
			},
		}
	}

	/// Checks that a write is allowed, warning if the wrapper is
	/// readonly
	#[track_caller]
	pub(crate) fn guard_write(&self) -> bool {
		match self.mode.is_readonly() {
			true => {
				tracing::warn!(
					location=%Loc::caller(),
					container=self.id(),
					"Write through a readonly wrapper was ignored"
				);
				false
			},
			false => true,
		}
	}

	/// Warns about an operation that doesn't apply to this container's
	/// shape
	#[track_caller]
	pub(crate) fn warn_kind_mismatch(&self, operation: &str) {
		let kind = match &self.raw {
			Raw::Obj(_) => "an object",
			Raw::Arr(_) => "an array",
			Raw::Map(_) => "a map",
			Raw::Set(_) => "a set",
		};
		tracing::warn!(
			location=%Loc::caller(),
			container=self.id(),
			"`{operation}` doesn't apply to {kind}"
		);
	}
}

impl PartialEq for Wrapped {
	fn eq(&self, other: &Self) -> bool {
		self.id() == other.id() && self.mode == other.mode
	}
}

impl Eq for Wrapped {}

impl fmt::Debug for Wrapped {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut debug = f.debug_struct("Wrapped");
		debug.field("mode", &self.mode);
		match &self.raw {
			Raw::Obj(obj) => debug.field("raw", obj),
			Raw::Arr(arr) => debug.field("raw", arr),
			Raw::Map(map) => debug.field("raw", map),
			Raw::Set(set) => debug.field("raw", set),
		};
		debug.finish()
	}
}

/// Wraps a value mutable-deep
#[must_use]
pub fn wrap(value: impl Into<Value>) -> Value {
	self::wrap_with(value.into(), Mode::Deep)
}

/// Wraps a value mutable-shallow
#[must_use]
pub fn wrap_shallow(value: impl Into<Value>) -> Value {
	self::wrap_with(value.into(), Mode::Shallow)
}

/// Wraps a value readonly-deep
#[must_use]
pub fn wrap_readonly(value: impl Into<Value>) -> Value {
	self::wrap_with(value.into(), Mode::ReadonlyDeep)
}

/// Wraps a value readonly-shallow
#[must_use]
pub fn wrap_readonly_shallow(value: impl Into<Value>) -> Value {
	self::wrap_with(value.into(), Mode::ReadonlyShallow)
}

/// Wraps a value in the given mode.
///
/// Non-containers, opted-out containers and compatible existing
/// wrappers come back unchanged; a readonly request over a mutable
/// wrapper re-wraps the same raw container readonly.
#[must_use]
pub fn wrap_with(value: Value, mode: Mode) -> Value {
	match value {
		Value::Obj(obj) if !obj.is_skipped() => Value::Wrapped(Wrapped { raw: Raw::Obj(obj), mode }),
		Value::Arr(arr) if !arr.is_skipped() => Value::Wrapped(Wrapped { raw: Raw::Arr(arr), mode }),
		Value::Map(map) if !map.is_skipped() => Value::Wrapped(Wrapped { raw: Raw::Map(map), mode }),
		Value::Set(set) if !set.is_skipped() => Value::Wrapped(Wrapped { raw: Raw::Set(set), mode }),
		Value::Wrapped(wrapped) if mode.is_readonly() && !wrapped.mode.is_readonly() => Value::Wrapped(Wrapped {
			raw: wrapped.raw,
			mode,
		}),
		value => value,
	}
}

/// Returns the raw value behind a wrapper.
///
/// Identity for anything that isn't wrapped; never tracks.
#[must_use]
pub fn to_raw(value: &Value) -> Value {
	match value {
		Value::Wrapped(wrapped) => wrapped.raw_value(),
		value => value.clone(),
	}
}

/// Returns whether a value is a wrapper
#[must_use]
pub fn is_wrapped(value: &Value) -> bool {
	matches!(value, Value::Wrapped(_))
}

/// Returns whether a value is a readonly wrapper
#[must_use]
pub fn is_readonly(value: &Value) -> bool {
	value.as_wrapped().is_some_and(|wrapped| wrapped.mode.is_readonly())
}

/// Returns whether a value is a shallow wrapper
#[must_use]
pub fn is_shallow(value: &Value) -> bool {
	value.as_wrapped().is_some_and(|wrapped| wrapped.mode.is_shallow())
}

/// Opts a raw container out of wrapping.
///
/// Subsequent [`wrap`] calls return it unchanged. Warns for anything
/// that isn't a raw container.
#[track_caller]
pub fn mark_raw(value: &Value) {
	match value {
		Value::Obj(obj) => obj.mark_skipped(),
		Value::Arr(arr) => arr.mark_skipped(),
		Value::Map(map) => map.mark_skipped(),
		Value::Set(set) => set.mark_skipped(),
		value => tracing::warn!(
			location=%Loc::caller(),
			?value,
			"`mark_raw` only applies to raw containers"
		),
	}
}
