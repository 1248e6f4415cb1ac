//! Computed values
//!
//! A computed is a lazy derived cell: its getter only runs when the
//! value is read while possibly stale. It's both a subscriber (of
//! whatever the getter reads) and a dep (for whoever reads it), and it
//! only bumps its own version when re-evaluation yields a different
//! value, cutting invalidation chains short.

// Imports
use {
	crate::{
		Value,
		graph::{self, DepNode, SubFlags, SubKind, SubNode},
		loc::Loc,
	},
	core::{cell::Cell, fmt},
	std::{cell::RefCell, rc::Rc},
};

/// A computed value
pub struct Computed {
	/// Inner
	inner: Rc<Inner>,
}

/// Computed inner
pub(crate) struct Inner {
	/// Graph subscriber node
	sub: graph::SubId,

	/// Graph dep node for this computed's output
	dep: graph::DepId,

	/// Getter
	getter: Box<dyn Fn() -> Value>,

	/// Setter, for writable computeds
	setter: Option<Box<dyn Fn(Value)>>,

	/// Last evaluated value
	value: RefCell<Value>,

	/// Global version at last refresh.
	///
	/// Starts at `u64::MAX` so the first read always evaluates.
	global_snapshot: Cell<u64>,

	/// Where the computed was defined
	defined_loc: Loc,
}

impl Computed {
	/// Creates a computed from its getter.
	///
	/// The getter doesn't run until the first read.
	#[track_caller]
	pub fn new(getter: impl Fn() -> Value + 'static) -> Self {
		Self::create(Box::new(getter), None, Loc::caller())
	}

	/// Creates a writable computed.
	///
	/// Writes delegate to `setter`, which typically writes back to
	/// whatever the getter derives from.
	#[track_caller]
	pub fn with_setter(getter: impl Fn() -> Value + 'static, setter: impl Fn(Value) + 'static) -> Self {
		Self::create(Box::new(getter), Some(Box::new(setter)), Loc::caller())
	}

	fn create(getter: Box<dyn Fn() -> Value>, setter: Option<Box<dyn Fn(Value)>>, defined_loc: Loc) -> Self {
		let inner = Rc::new_cyclic(|weak| {
			let (sub, dep) = graph::with(|graph| {
				let sub = graph.subs.insert(SubNode::new(
					SubKind::Computed(weak.clone()),
					SubFlags::ACTIVE | SubFlags::DIRTY,
				));
				let dep = graph.deps.insert(DepNode::for_computed(sub));
				graph.subs[sub].owned_dep = Some(dep);
				(sub, dep)
			});
			Inner {
				sub,
				dep,
				getter,
				setter,
				value: RefCell::new(Value::Unit),
				global_snapshot: Cell::new(u64::MAX),
				defined_loc,
			}
		});

		let computed = Self { inner };
		tracing::trace!(?computed, "Created computed");
		computed
	}

	/// Gets the current value, evaluating the getter if it may be stale.
	///
	/// Tracks the read when a subscriber is running.
	#[must_use]
	pub fn get(&self) -> Value {
		let link = graph::with(|graph| graph.track_dep(self.inner.dep));
		self::refresh(&self.inner);

		// Sync the reader's link to the version the refresh produced
		if let Some(link_id) = link {
			graph::with(|graph| {
				let version = graph.deps.get(self.inner.dep).map(|dep| dep.version);
				if let (Some(version), Some(link)) = (version, graph.links.get_mut(link_id)) {
					link.version = Some(version);
				}
			});
		}

		self.inner.value.borrow().clone()
	}

	/// Sets the value through the setter.
	///
	/// Warns and does nothing for setter-less computeds.
	#[track_caller]
	pub fn set(&self, value: impl Into<Value>) {
		match &self.inner.setter {
			Some(setter) => setter(value.into()),
			None => tracing::warn!(
				location=%Loc::caller(),
				defined_loc=%self.inner.defined_loc,
				"Cannot set a computed without a setter"
			),
		}
	}

	/// Returns a unique identifier for this computed.
	///
	/// Cloned handles retain the same id.
	#[must_use]
	pub fn id(&self) -> usize {
		Rc::as_ptr(&self.inner).addr()
	}

	/// Returns where this computed was defined
	#[must_use]
	pub fn defined_loc(&self) -> Loc {
		self.inner.defined_loc
	}
}

impl Clone for Computed {
	fn clone(&self) -> Self {
		Self {
			inner: Rc::clone(&self.inner),
		}
	}
}

impl PartialEq for Computed {
	fn eq(&self, other: &Self) -> bool {
		self.id() == other.id()
	}
}

impl Eq for Computed {}

impl fmt::Debug for Computed {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut debug = f.debug_struct("Computed");
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
		let _ = graph::try_with(|graph| {
			graph.free_sub(self.sub);
			graph.free_dep(self.dep);
		});
	}
}

/// Brings a computed up to date, evaluating its getter if needed.
///
/// Runs user code, so the graph must not be borrowed by the caller.
pub(crate) fn refresh(inner: &Inner) {
	let sub_id = inner.sub;

	let skip = graph::with(|graph| {
		let Some(sub) = graph.subs.get_mut(sub_id) else { return true };
		let flags = sub.flags;

		// Subscribed and not invalidated: nothing can have changed
		if flags.contains(SubFlags::TRACKING) && !flags.contains(SubFlags::DIRTY) {
			return true;
		}
		sub.flags.remove(SubFlags::DIRTY);

		// Nothing anywhere changed since the last refresh
		if inner.global_snapshot.get() == graph.global_version {
			return true;
		}
		inner.global_snapshot.set(graph.global_version);
		false
	});
	if skip {
		return;
	}

	// Once evaluated, only re-run the getter when a dependency's version
	// actually moved (a dirty flag alone may be a false positive after an
	// upstream computed re-evaluated to the same value).
	let evaluated = graph::with(|graph| {
		graph
			.subs
			.get(sub_id)
			.is_some_and(|sub| sub.flags.contains(SubFlags::EVALUATED))
	});
	if evaluated && !graph::is_dirty(sub_id) {
		return;
	}

	let (prev_sub, prev_track) = graph::with(|graph| {
		graph.prepare_deps(sub_id);
		if let Some(sub) = graph.subs.get_mut(sub_id) {
			sub.flags.insert(SubFlags::RUNNING);
		}
		let prev_sub = graph.active_sub.replace(sub_id);
		let prev_track = core::mem::replace(&mut graph.should_track, true);
		(prev_sub, prev_track)
	});

	// On panic: restore graph state, re-mark dirty so the next read
	// retries the getter, and bump the version so dependents re-check
	// instead of caching a failure.
	let panic_guard = scopeguard::guard((), |()| {
		graph::with(|graph| {
			graph.active_sub = prev_sub;
			graph.should_track = prev_track;
			if let Some(sub) = graph.subs.get_mut(sub_id) {
				sub.flags.remove(SubFlags::RUNNING);
				sub.flags.insert(SubFlags::DIRTY);
			}
			graph.cleanup_deps(sub_id);
			if let Some(dep) = graph.deps.get_mut(inner.dep) {
				dep.version += 1;
			}
		});
		inner.global_snapshot.set(u64::MAX);
	});
	let value = (inner.getter)();
	scopeguard::ScopeGuard::into_inner(panic_guard);

	graph::with(|graph| {
		graph.active_sub = prev_sub;
		graph.should_track = prev_track;
		if let Some(sub) = graph.subs.get_mut(sub_id) {
			sub.flags.remove(SubFlags::RUNNING);
			sub.flags.insert(SubFlags::EVALUATED);
		}
		graph.cleanup_deps(sub_id);
	});

	// Only a changed value bumps the version (first evaluation always
	// does)
	let changed = !inner.value.borrow().same(&value);
	if changed || !evaluated {
		*inner.value.borrow_mut() = value;
		graph::with(|graph| {
			if let Some(dep) = graph.deps.get_mut(inner.dep) {
				dep.version += 1;
			}
		});
	}
}
