//! Dependency graph
//!
//! The heart of the engine: a thread-local [`Graph`] owning every dep,
//! subscriber and link node. Deps record who reads them through links
//! threaded into two intersecting doubly-linked lists (one per dep, one
//! per subscriber), so repeated reads, re-runs and pruning are all O(1)
//! amortized per access.
//!
//! All graph state is manipulated under a single `RefCell` borrow; user
//! code (effect runners, computed getters, cleanup callbacks) is never
//! invoked while the borrow is held.

// Modules
pub(crate) mod arena;
mod batch;
mod dep;
mod link;
mod registry;
mod sub;

// Exports
pub use self::{
	batch::{batch, end_batch, start_batch},
	registry::{DepKey, EntryKey, TriggerKind, subscriber_count, track, trigger},
};
pub(crate) use self::{
	dep::{DepId, DepNode, trigger_dep},
	link::{LinkId, LinkNode},
	registry::{drop_container, track_slot, trigger_all, trigger_indices_from, trigger_keys},
	sub::{SubFlags, SubId, SubKind, SubNode, is_dirty},
};

// Imports
use {
	self::arena::Arena,
	indexmap::IndexMap,
	std::{cell::RefCell, collections::HashMap},
};

/// Dependency graph
pub(crate) struct Graph {
	/// Dep nodes
	pub deps: Arena<DepNode>,

	/// Subscriber nodes
	pub subs: Arena<SubNode>,

	/// Link nodes
	pub links: Arena<LinkNode>,

	/// Slot registry: container id -> slot key -> dep
	pub registry: HashMap<usize, IndexMap<DepKey, DepId>>,

	/// Currently running subscriber
	pub active_sub: Option<SubId>,

	/// Whether reads are currently tracked
	pub should_track: bool,

	/// Saved `should_track` values for nested pause/resume
	pub track_stack: Vec<bool>,

	/// Process-wide version, bumped once per mutation
	pub global_version: u64,

	/// Batch nesting depth
	pub batch_depth: usize,

	/// Queued computed notifications (intrusive, head)
	pub queued_computeds: Option<SubId>,

	/// Queued effect notifications (intrusive, head)
	pub queued_effects: Option<SubId>,

	/// Effects that were notified while paused
	pub paused_effects: Vec<SubId>,
}

impl Graph {
	/// Creates a new, empty graph
	fn new() -> Self {
		Self {
			deps: Arena::new(),
			subs: Arena::new(),
			links: Arena::new(),
			registry: HashMap::new(),
			active_sub: None,
			should_track: true,
			track_stack: Vec::new(),
			global_version: 0,
			batch_depth: 0,
			queued_computeds: None,
			queued_effects: None,
			paused_effects: Vec::new(),
		}
	}
}

thread_local! {
	/// The graph
	static GRAPH: RefCell<Graph> = RefCell::new(Graph::new());
}

/// Accesses the graph.
///
/// `f` must not call back into user code: the graph borrow is held for
/// its whole duration.
pub(crate) fn with<O>(f: impl FnOnce(&mut Graph) -> O) -> O {
	GRAPH.with_borrow_mut(f)
}

/// Accesses the graph, if it's accessible.
///
/// Used by teardown paths (`Drop` impls), which may run during thread
/// exit or while the graph is already borrowed; in either case the
/// cleanup is skipped rather than panicking.
pub(crate) fn try_with<O>(f: impl FnOnce(&mut Graph) -> O) -> Option<O> {
	GRAPH
		.try_with(|graph| {
			let mut graph = graph.try_borrow_mut().ok()?;
			Some(f(&mut graph))
		})
		.ok()
		.flatten()
}

/// Returns the process-wide version counter.
///
/// Bumped exactly once per user-visible mutation; mostly useful for
/// asserting trigger coalescing in tests.
#[must_use]
pub fn global_version() -> u64 {
	self::with(|graph| graph.global_version)
}

/// Pauses dependency tracking until the matching [`reset_tracking`].
///
/// Pauses nest: each call pushes the previous state.
pub fn pause_tracking() {
	self::with(|graph| {
		let prev = graph.should_track;
		graph.track_stack.push(prev);
		graph.should_track = false;
	});
}

/// Restores dependency tracking to its state before the matching
/// [`pause_tracking`].
#[track_caller]
pub fn reset_tracking() {
	let caller_loc = crate::loc::Loc::caller();
	self::with(|graph| match graph.track_stack.pop() {
		Some(prev) => graph.should_track = prev,
		None => {
			tracing::warn!(
				location=%caller_loc,
				"`reset_tracking` called without a matching `pause_tracking`"
			);
			graph.should_track = true;
		},
	});
}

/// Runs `f` with dependency tracking paused
pub fn untracked<O>(f: impl FnOnce() -> O) -> O {
	self::pause_tracking();
	scopeguard::defer! {
		self::reset_tracking();
	}
	f()
}
