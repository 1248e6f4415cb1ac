//! Slot registry
//!
//! Maps each raw container to the deps created for its individual
//! slots: one per property, index or entry that has actually been read,
//! plus virtual slots for iteration and length. Deps are created lazily
//! on tracked reads and evicted once their last subscriber unlinks.

// Imports
use {
	super::{DepId, DepNode, Graph},
	crate::{Value, loc::Loc},
	std::rc::Rc,
};

/// A non-owning snapshot of a collection key.
///
/// Entry deps are keyed by this instead of [`Value`] so graph nodes
/// never own containers, keeping teardown from re-entering the graph.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum EntryKey {
	/// Unit key
	Unit,

	/// Boolean key
	Bool(bool),

	/// Integer key
	Int(i64),

	/// Float key, by normalized bits
	Float(u64),

	/// String key
	Str(Rc<str>),

	/// Container, atom or computed key, by identity
	Id(usize),
}

impl EntryKey {
	/// Snapshots a key value.
	///
	/// Agrees with [`Value`]'s equality: all NaNs collapse to one key,
	/// zero and negative zero to another, identities stand in for
	/// anything heap-allocated.
	pub(crate) fn of(value: &Value) -> Self {
		match *value {
			Value::Unit => Self::Unit,
			Value::Bool(value) => Self::Bool(value),
			Value::Int(value) => Self::Int(value),
			Value::Float(value) => match value {
				value if value.is_nan() => Self::Float(f64::NAN.to_bits()),
				value if value == 0.0 => Self::Float(0.0_f64.to_bits()),
				value => Self::Float(value.to_bits()),
			},
			Value::Str(ref value) => Self::Str(Rc::clone(value)),
			Value::Obj(ref obj) => Self::Id(obj.id()),
			Value::Arr(ref arr) => Self::Id(arr.id()),
			Value::Map(ref map) => Self::Id(map.id()),
			Value::Set(ref set) => Self::Id(set.id()),
			Value::Atom(ref atom) => Self::Id(atom.id()),
			Value::Computed(ref computed) => Self::Id(computed.id()),
			Value::Wrapped(ref wrapped) => Self::Id(wrapped.id()),
		}
	}
}

/// Key of a trackable slot within a container
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub enum DepKey {
	/// Object property
	Prop(Rc<str>),

	/// Array index
	Index(usize),

	/// Array length
	Length,

	/// Map or set entry
	Entry(EntryKey),

	/// Whole-container iteration
	Iterate,

	/// Array iteration
	ArrayIterate,

	/// Map key iteration
	KeyIterate,
}

impl DepKey {
	/// Creates a property key
	#[must_use]
	pub fn prop<S: Into<Rc<str>>>(name: S) -> Self {
		Self::Prop(name.into())
	}

	/// Creates an entry key from a key value
	#[must_use]
	pub fn entry(key: &Value) -> Self {
		Self::Entry(EntryKey::of(key))
	}
}

/// How a mutation changed its slot
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum TriggerKind {
	/// An existing slot changed value
	Set,

	/// A new slot appeared
	Add,

	/// A slot disappeared
	Delete,

	/// Everything was removed at once
	Clear,
}

impl Graph {
	/// Evicts a registry slot dep that lost its last subscriber
	pub(crate) fn evict_slot_dep(&mut self, dep_id: DepId) {
		let Some(dep) = self.deps.get(dep_id) else { return };
		let Some((container, key)) = dep.slot.clone() else { return };

		if let Some(slots) = self.registry.get_mut(&container) {
			slots.swap_remove(&key);
			if slots.is_empty() {
				self.registry.remove(&container);
			}
		}
		self.deps.remove(dep_id);
	}
}

/// Records a read of one slot of `container` by the active subscriber.
///
/// The slot's dep is created on first tracked read; untracked reads
/// create nothing.
pub(crate) fn track_slot(container: usize, key: DepKey) {
	super::with(|graph| {
		if !graph.should_track || graph.active_sub.is_none() {
			return;
		}

		let dep_id = match graph.registry.get(&container).and_then(|slots| slots.get(&key)) {
			Some(&dep_id) => dep_id,
			None => {
				let dep_id = graph.deps.insert(DepNode::for_slot(container, key.clone()));
				graph.registry.entry(container).or_default().insert(key, dep_id);
				dep_id
			},
		};
		graph.track_dep(dep_id);
	});
}

/// Marks the given slots of `container` changed and flushes, unless a
/// batch is open.
///
/// Bumps the global version exactly once even when no slot has a dep.
pub(crate) fn trigger_keys<I: IntoIterator<Item = DepKey>>(container: usize, keys: I) {
	super::with(|graph| {
		graph.global_version += 1;
		graph.batch_depth += 1;

		let deps: Vec<DepId> = match graph.registry.get(&container) {
			Some(slots) => keys.into_iter().filter_map(|key| slots.get(&key).copied()).collect(),
			None => Vec::new(),
		};
		for dep_id in deps {
			if let Some(dep) = graph.deps.get_mut(dep_id) {
				dep.version += 1;
			}
			graph.notify_dep(dep_id);
		}
	});
	super::end_batch();
}

/// Marks every index slot at or past `start` changed, along with
/// `extra` slots.
///
/// Used by length-truncating array operations.
pub(crate) fn trigger_indices_from(container: usize, start: usize, extra: Vec<DepKey>) {
	super::with(|graph| {
		graph.global_version += 1;
		graph.batch_depth += 1;

		let deps: Vec<DepId> = match graph.registry.get(&container) {
			Some(slots) => slots
				.iter()
				.filter(|&(key, _)| match *key {
					DepKey::Index(index) => index >= start,
					ref key => extra.contains(key),
				})
				.map(|(_, &dep_id)| dep_id)
				.collect(),
			None => Vec::new(),
		};
		for dep_id in deps {
			if let Some(dep) = graph.deps.get_mut(dep_id) {
				dep.version += 1;
			}
			graph.notify_dep(dep_id);
		}
	});
	super::end_batch();
}

/// Marks every slot of `container` changed
pub(crate) fn trigger_all(container: usize) {
	super::with(|graph| {
		graph.global_version += 1;
		graph.batch_depth += 1;

		let deps: Vec<DepId> = match graph.registry.get(&container) {
			Some(slots) => slots.values().copied().collect(),
			None => Vec::new(),
		};
		for dep_id in deps {
			if let Some(dep) = graph.deps.get_mut(dep_id) {
				dep.version += 1;
			}
			graph.notify_dep(dep_id);
		}
	});
	super::end_batch();
}

/// Tears down every slot dep of a dropped container
pub(crate) fn drop_container(container: usize) {
	// Skipped if the graph is gone or busy; stale registry entries are
	// harmless since container ids are never compared across lifetimes
	// while live.
	let _ = super::try_with(|graph| {
		if let Some(slots) = graph.registry.remove(&container) {
			for (_, dep_id) in slots {
				graph.free_dep(dep_id);
			}
		}
	});
}

/// Manually records a read of one slot of `target` by the active
/// subscriber.
///
/// `target` may be wrapped or raw; non-container targets warn and
/// track nothing.
#[track_caller]
pub fn track(target: &Value, key: DepKey) {
	match crate::wrap::to_raw(target).container_id() {
		Some(container) => self::track_slot(container, key),
		None => tracing::warn!(
			location=%Loc::caller(),
			"`track` target is not a container"
		),
	}
}

/// Manually marks one slot of `target` changed.
///
/// `kind` widens the trigger to the virtual slots a real mutation of
/// that kind would touch.
#[track_caller]
pub fn trigger(target: &Value, key: DepKey, kind: TriggerKind) {
	let raw = crate::wrap::to_raw(target);
	let Some(container) = raw.container_id() else {
		tracing::warn!(
			location=%Loc::caller(),
			"`trigger` target is not a container"
		);
		return;
	};

	match kind {
		TriggerKind::Set => match raw {
			Value::Arr(_) => self::trigger_keys(container, [key, DepKey::ArrayIterate]),
			_ => self::trigger_keys(container, [key]),
		},
		TriggerKind::Add | TriggerKind::Delete => {
			let mut keys = vec![key];
			match raw {
				Value::Arr(_) => keys.extend([DepKey::Length, DepKey::ArrayIterate]),
				Value::Map(_) => keys.extend([DepKey::Iterate, DepKey::KeyIterate]),
				_ => keys.push(DepKey::Iterate),
			}
			self::trigger_keys(container, keys);
		},
		TriggerKind::Clear => self::trigger_all(container),
	}
}

/// Returns how many live links the given slot's dep currently has.
///
/// Zero when the slot has no dep at all.
#[must_use]
pub fn subscriber_count(target: &Value, key: &DepKey) -> usize {
	let Some(container) = crate::wrap::to_raw(target).container_id() else {
		return 0;
	};
	super::with(|graph| {
		graph
			.registry
			.get(&container)
			.and_then(|slots| slots.get(key))
			.and_then(|&dep_id| graph.deps.get(dep_id))
			.map_or(0, |dep| dep.sub_count)
	})
}
