//! Values
//!
//! The dynamic value model shared by all reactive containers. A [`Value`]
//! is either a scalar, a handle to a raw container ([`Obj`], [`Arr`],
//! [`Map`], [`Set`]), a boxed cell ([`Atom`] / [`Computed`]), or a
//! [`Wrapped`] interception handle standing in for a raw container.
//!
//! Container handles are cheap to clone and compare by identity. Scalars
//! compare by value, with `NaN` considered equal to itself so that change
//! detection doesn't loop on `NaN` writes; zero and negative zero are
//! distinct to change detection but address the same keyed entry.

// Imports
use {
	crate::{Atom, Computed, Wrapped},
	core::{
		cell::{Cell, RefCell},
		fmt,
		hash::{Hash, Hasher},
	},
	indexmap::{IndexMap, IndexSet},
	std::rc::Rc,
};

/// A dynamic value
#[derive(Clone)]
#[derive(derive_more::From)]
pub enum Value {
	/// Unit (absent / no value)
	Unit,

	/// Boolean
	Bool(bool),

	/// Integer
	Int(i64),

	/// Float
	Float(f64),

	/// String
	Str(Rc<str>),

	/// Raw plain object
	Obj(Obj),

	/// Raw array
	Arr(Arr),

	/// Raw keyed map
	Map(Map),

	/// Raw set
	Set(Set),

	/// Boxed single-value cell
	Atom(Atom),

	/// Lazy derived cell
	Computed(Computed),

	/// Interception handle over a raw container
	Wrapped(Wrapped),
}

impl Value {
	/// Returns whether `self` and `other` hold the same value.
	///
	/// This is the change-detection relation used by every trigger path:
	/// scalars by value (`NaN` equals itself, zero and negative zero are
	/// distinct), containers and cells by identity, wrapped handles by raw
	/// identity and mode.
	///
	/// Key equality ([`PartialEq`]) differs on one point: it collapses the
	/// two zeros, so both address the same map or set entry.
	#[must_use]
	pub fn same(&self, other: &Self) -> bool {
		match (self, other) {
			(Self::Unit, Self::Unit) => true,
			(Self::Bool(lhs), Self::Bool(rhs)) => lhs == rhs,
			(Self::Int(lhs), Self::Int(rhs)) => lhs == rhs,
			(Self::Float(lhs), Self::Float(rhs)) => (lhs.is_nan() && rhs.is_nan()) || lhs.to_bits() == rhs.to_bits(),
			(Self::Str(lhs), Self::Str(rhs)) => lhs == rhs,
			(Self::Obj(lhs), Self::Obj(rhs)) => lhs.id() == rhs.id(),
			(Self::Arr(lhs), Self::Arr(rhs)) => lhs.id() == rhs.id(),
			(Self::Map(lhs), Self::Map(rhs)) => lhs.id() == rhs.id(),
			(Self::Set(lhs), Self::Set(rhs)) => lhs.id() == rhs.id(),
			(Self::Atom(lhs), Self::Atom(rhs)) => lhs.id() == rhs.id(),
			(Self::Computed(lhs), Self::Computed(rhs)) => lhs.id() == rhs.id(),
			(Self::Wrapped(lhs), Self::Wrapped(rhs)) => lhs.id() == rhs.id() && lhs.mode() == rhs.mode(),
			_ => false,
		}
	}

	/// Returns the identity of the underlying raw container, if any.
	///
	/// Wrapped handles report the identity of the container they wrap.
	#[must_use]
	pub(crate) fn container_id(&self) -> Option<usize> {
		match self {
			Self::Obj(obj) => Some(obj.id()),
			Self::Arr(arr) => Some(arr.id()),
			Self::Map(map) => Some(map.id()),
			Self::Set(set) => Some(set.id()),
			Self::Wrapped(wrapped) => Some(wrapped.id()),
			_ => None,
		}
	}

	/// Returns whether this value is [`Value::Unit`]
	#[must_use]
	pub const fn is_unit(&self) -> bool {
		matches!(self, Self::Unit)
	}

	/// Returns the inner integer, if this is an integer
	#[must_use]
	pub const fn as_int(&self) -> Option<i64> {
		match self {
			Self::Int(value) => Some(*value),
			_ => None,
		}
	}

	/// Returns the inner float, if this is a float
	#[must_use]
	pub const fn as_float(&self) -> Option<f64> {
		match self {
			Self::Float(value) => Some(*value),
			_ => None,
		}
	}

	/// Returns the inner boolean, if this is a boolean
	#[must_use]
	pub const fn as_bool(&self) -> Option<bool> {
		match self {
			Self::Bool(value) => Some(*value),
			_ => None,
		}
	}

	/// Returns the inner string, if this is a string
	#[must_use]
	pub fn as_str(&self) -> Option<&str> {
		match self {
			Self::Str(value) => Some(value),
			_ => None,
		}
	}

	/// Returns the wrapped handle, if this is a wrapped container
	#[must_use]
	pub const fn as_wrapped(&self) -> Option<&Wrapped> {
		match self {
			Self::Wrapped(wrapped) => Some(wrapped),
			_ => None,
		}
	}
}

impl PartialEq for Value {
	fn eq(&self, other: &Self) -> bool {
		match (self, other) {
			// Both zeros address the same keyed slot, unlike in `same`
			(Self::Float(lhs), Self::Float(rhs)) => (lhs.is_nan() && rhs.is_nan()) || lhs == rhs,
			_ => self.same(other),
		}
	}
}

impl Eq for Value {}

impl Hash for Value {
	fn hash<H: Hasher>(&self, state: &mut H) {
		core::mem::discriminant(self).hash(state);
		match self {
			Self::Unit => (),
			Self::Bool(value) => value.hash(state),
			Self::Int(value) => value.hash(state),
			// Normalized so that all `NaN`s hash alike and both zeros hash
			// alike, matching key equality.
			Self::Float(value) => match *value {
				value if value.is_nan() => f64::NAN.to_bits().hash(state),
				value if value == 0.0 => 0.0_f64.to_bits().hash(state),
				value => value.to_bits().hash(state),
			},
			Self::Str(value) => value.hash(state),
			Self::Obj(obj) => obj.id().hash(state),
			Self::Arr(arr) => arr.id().hash(state),
			Self::Map(map) => map.id().hash(state),
			Self::Set(set) => set.id().hash(state),
			Self::Atom(atom) => atom.id().hash(state),
			Self::Computed(computed) => computed.id().hash(state),
			Self::Wrapped(wrapped) => {
				wrapped.id().hash(state);
				wrapped.mode().hash(state);
			},
		}
	}
}

impl From<&str> for Value {
	fn from(value: &str) -> Self {
		Self::Str(Rc::from(value))
	}
}

impl From<String> for Value {
	fn from(value: String) -> Self {
		Self::Str(Rc::from(value))
	}
}

impl From<i32> for Value {
	fn from(value: i32) -> Self {
		Self::Int(i64::from(value))
	}
}

impl From<u32> for Value {
	fn from(value: u32) -> Self {
		Self::Int(i64::from(value))
	}
}

impl fmt::Debug for Value {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Unit => f.pad("Unit"),
			Self::Bool(value) => value.fmt(f),
			Self::Int(value) => value.fmt(f),
			Self::Float(value) => value.fmt(f),
			Self::Str(value) => value.fmt(f),
			Self::Obj(obj) => obj.fmt(f),
			Self::Arr(arr) => arr.fmt(f),
			Self::Map(map) => map.fmt(f),
			Self::Set(set) => set.fmt(f),
			Self::Atom(atom) => atom.fmt(f),
			Self::Computed(computed) => computed.fmt(f),
			Self::Wrapped(wrapped) => wrapped.fmt(f),
		}
	}
}

/// Raw plain object: ordered string-keyed fields
pub struct Obj {
	/// Inner
	inner: Rc<ObjInner>,
}

/// Obj inner
struct ObjInner {
	/// Fields
	fields: RefCell<IndexMap<Rc<str>, Value>>,

	/// Opted out of wrapping
	skip: Cell<bool>,
}

impl Obj {
	/// Creates a new, empty object
	#[must_use]
	pub fn new() -> Self {
		Self {
			inner: Rc::new(ObjInner {
				fields: RefCell::new(IndexMap::new()),
				skip:   Cell::new(false),
			}),
		}
	}

	/// Inserts a field without tracking or triggering.
	///
	/// Intended for seeding data before it's wrapped.
	pub fn insert_raw(&self, key: impl Into<Rc<str>>, value: impl Into<Value>) {
		self.inner.fields.borrow_mut().insert(key.into(), value.into());
	}

	/// Accesses the raw field storage
	pub(crate) fn fields(&self) -> &RefCell<IndexMap<Rc<str>, Value>> {
		&self.inner.fields
	}
}

impl<K: Into<Rc<str>>, V: Into<Value>> FromIterator<(K, V)> for Obj {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let obj = Self::new();
		for (key, value) in iter {
			obj.insert_raw(key, value);
		}
		obj
	}
}

impl fmt::Debug for Obj {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut debug = f.debug_struct("Obj");
		match self.inner.fields.try_borrow() {
			Ok(fields) => debug.field("fields", &*fields).finish(),
			Err(_) => debug.finish_non_exhaustive(),
		}
	}
}

/// Raw array
pub struct Arr {
	/// Inner
	inner: Rc<ArrInner>,
}

/// Arr inner
struct ArrInner {
	/// Items
	items: RefCell<Vec<Value>>,

	/// Opted out of wrapping
	skip: Cell<bool>,
}

impl Arr {
	/// Creates a new, empty array
	#[must_use]
	pub fn new() -> Self {
		Self::from_vec(vec![])
	}

	/// Creates an array from existing items
	#[must_use]
	pub fn from_vec(items: Vec<Value>) -> Self {
		Self {
			inner: Rc::new(ArrInner {
				items: RefCell::new(items),
				skip:  Cell::new(false),
			}),
		}
	}

	/// Appends an item without tracking or triggering
	pub fn push_raw(&self, value: impl Into<Value>) {
		self.inner.items.borrow_mut().push(value.into());
	}

	/// Accesses the raw item storage
	pub(crate) fn items(&self) -> &RefCell<Vec<Value>> {
		&self.inner.items
	}
}

impl<V: Into<Value>> FromIterator<V> for Arr {
	fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
		Self::from_vec(iter.into_iter().map(Into::into).collect())
	}
}

impl fmt::Debug for Arr {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut debug = f.debug_struct("Arr");
		match self.inner.items.try_borrow() {
			Ok(items) => debug.field("items", &*items).finish(),
			Err(_) => debug.finish_non_exhaustive(),
		}
	}
}

/// Raw keyed map
pub struct Map {
	/// Inner
	inner: Rc<MapInner>,
}

/// Map inner
struct MapInner {
	/// Entries
	entries: RefCell<IndexMap<Value, Value>>,

	/// Opted out of wrapping
	skip: Cell<bool>,
}

impl Map {
	/// Creates a new, empty map
	#[must_use]
	pub fn new() -> Self {
		Self {
			inner: Rc::new(MapInner {
				entries: RefCell::new(IndexMap::new()),
				skip:    Cell::new(false),
			}),
		}
	}

	/// Inserts an entry without tracking or triggering
	pub fn insert_raw(&self, key: impl Into<Value>, value: impl Into<Value>) {
		self.inner.entries.borrow_mut().insert(key.into(), value.into());
	}

	/// Accesses the raw entry storage
	pub(crate) fn entries(&self) -> &RefCell<IndexMap<Value, Value>> {
		&self.inner.entries
	}
}

impl<K: Into<Value>, V: Into<Value>> FromIterator<(K, V)> for Map {
	fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
		let map = Self::new();
		for (key, value) in iter {
			map.insert_raw(key, value);
		}
		map
	}
}

impl fmt::Debug for Map {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut debug = f.debug_struct("Map");
		match self.inner.entries.try_borrow() {
			Ok(entries) => debug.field("entries", &*entries).finish(),
			Err(_) => debug.finish_non_exhaustive(),
		}
	}
}

/// Raw set
pub struct Set {
	/// Inner
	inner: Rc<SetInner>,
}

/// Set inner
struct SetInner {
	/// Items
	items: RefCell<IndexSet<Value>>,

	/// Opted out of wrapping
	skip: Cell<bool>,
}

impl Set {
	/// Creates a new, empty set
	#[must_use]
	pub fn new() -> Self {
		Self {
			inner: Rc::new(SetInner {
				items: RefCell::new(IndexSet::new()),
				skip:  Cell::new(false),
			}),
		}
	}

	/// Inserts an item without tracking or triggering
	pub fn insert_raw(&self, value: impl Into<Value>) {
		self.inner.items.borrow_mut().insert(value.into());
	}

	/// Accesses the raw item storage
	pub(crate) fn items(&self) -> &RefCell<IndexSet<Value>> {
		&self.inner.items
	}
}

impl<V: Into<Value>> FromIterator<V> for Set {
	fn from_iter<I: IntoIterator<Item = V>>(iter: I) -> Self {
		let set = Self::new();
		for value in iter {
			set.insert_raw(value);
		}
		set
	}
}

impl fmt::Debug for Set {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut debug = f.debug_struct("Set");
		match self.inner.items.try_borrow() {
			Ok(items) => debug.field("items", &*items).finish(),
			Err(_) => debug.finish_non_exhaustive(),
		}
	}
}

// Impls shared by every raw container kind
#[duplicate::duplicate_item(
	module        Container  ContainerInner;
	[ obj_impls ] [ Obj ]    [ ObjInner ];
	[ arr_impls ] [ Arr ]    [ ArrInner ];
	[ map_impls ] [ Map ]    [ MapInner ];
	[ set_impls ] [ Set ]    [ SetInner ];
)]
mod module {
	use super::*;

	impl Container {
		/// Returns a unique identifier for this container.
		///
		/// Cloned handles retain the same id.
		#[must_use]
		pub fn id(&self) -> usize {
			Rc::as_ptr(&self.inner).addr()
		}

		/// Returns whether this container opted out of wrapping
		pub(crate) fn is_skipped(&self) -> bool {
			self.inner.skip.get()
		}

		/// Opts this container out of wrapping
		pub(crate) fn mark_skipped(&self) {
			self.inner.skip.set(true);
		}
	}

	impl Default for Container {
		fn default() -> Self {
			Self::new()
		}
	}

	impl Clone for Container {
		fn clone(&self) -> Self {
			Self {
				inner: Rc::clone(&self.inner),
			}
		}
	}

	impl PartialEq for Container {
		fn eq(&self, other: &Self) -> bool {
			self.id() == other.id()
		}
	}

	impl Eq for Container {}

	impl Hash for Container {
		fn hash<H: Hasher>(&self, state: &mut H) {
			self.id().hash(state);
		}
	}

	impl Drop for ContainerInner {
		fn drop(&mut self) {
			// Detach any deps still registered for this container.
			crate::graph::drop_container(core::ptr::from_ref(&*self).addr());
		}
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn same_scalars() {
		assert!(Value::from(1_i64).same(&Value::from(1_i64)));
		assert!(!Value::from(1_i64).same(&Value::from(2_i64)));
		assert!(!Value::from(1_i64).same(&Value::from(1.0)));
		assert!(Value::from(f64::NAN).same(&Value::from(f64::NAN)));
		assert!(!Value::from(f64::NAN).same(&Value::from(0.0)));
		assert!(Value::from("a").same(&Value::from("a")));
		assert!(Value::Unit.same(&Value::Unit));
	}

	#[test]
	fn zero_signs_are_distinct_changes_but_one_key() {
		// Change detection tells the zeros apart
		assert!(!Value::from(0.0).same(&Value::from(-0.0)));
		assert!(Value::from(-0.0).same(&Value::from(-0.0)));

		// Key equality collapses them
		assert_eq!(Value::from(0.0), Value::from(-0.0));
	}

	#[test]
	fn same_containers_by_identity() {
		let obj = Obj::new();
		let lhs = Value::Obj(obj.clone());
		let rhs = Value::Obj(obj);
		assert!(lhs.same(&rhs));
		assert!(!lhs.same(&Value::Obj(Obj::new())));
	}

	#[test]
	fn hash_agrees_with_eq() {
		use std::collections::hash_map::DefaultHasher;

		let hash = |value: &Value| {
			let mut hasher = DefaultHasher::new();
			value.hash(&mut hasher);
			hasher.finish()
		};

		assert_eq!(hash(&Value::from(f64::NAN)), hash(&Value::from(f64::NAN)));
		let arr = Arr::new();
		assert_eq!(hash(&Value::Arr(arr.clone())), hash(&Value::Arr(arr)));
	}
}
