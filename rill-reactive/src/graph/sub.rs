//! Subscribers
//!
//! A subscriber is anything that re-runs when its dependencies change:
//! an effect's runner or a computed's getter. Each owns a dependency
//! list of links, rebuilt incrementally on every run by marking all
//! links unconfirmed up front and pruning whatever stayed unconfirmed
//! afterwards.

// Imports
use {
	super::{DepId, Graph, LinkId},
	std::rc::Weak,
};

bitflags::bitflags! {
	/// Subscriber state flags
	#[derive(Clone, Copy, PartialEq, Eq, Debug)]
	pub(crate) struct SubFlags: u8 {
		/// Not yet stopped
		const ACTIVE = 1 << 0;

		/// Currently running
		const RUNNING = 1 << 1;

		/// Propagating notifications to this subscriber
		const TRACKING = 1 << 2;

		/// Sitting in a batch queue
		const NOTIFIED = 1 << 3;

		/// May have a stale value (computeds only)
		const DIRTY = 1 << 4;

		/// May re-queue itself from its own run
		const ALLOW_RECURSE = 1 << 5;

		/// Notifications deferred until resumed (effects only)
		const PAUSED = 1 << 6;

		/// Has produced a value at least once (computeds only)
		const EVALUATED = 1 << 7;
	}
}

/// Typed subscriber id
pub(crate) type SubId = super::arena::Id<SubNode>;

/// What a subscriber runs.
///
/// Holds weak handles so a dropped effect or computed never keeps its
/// graph node alive through the queue.
pub(crate) enum SubKind {
	/// Effect runner
	Effect(Weak<crate::effect::Inner>),

	/// Computed getter
	Computed(Weak<crate::computed::Inner>),
}

/// Subscriber node
pub(crate) struct SubNode {
	/// State flags
	pub flags: SubFlags,

	/// Dependency list head, in read order
	pub deps: Option<LinkId>,

	/// Dependency list tail
	pub deps_tail: Option<LinkId>,

	/// Next subscriber in the batch queue this one is sitting in
	pub next: Option<SubId>,

	/// The dep this subscriber produces, for computeds
	pub owned_dep: Option<DepId>,

	/// What to run on notification
	pub kind: SubKind,
}

impl SubNode {
	/// Creates a subscriber node
	pub fn new(kind: SubKind, flags: SubFlags) -> Self {
		Self {
			flags,
			deps: None,
			deps_tail: None,
			next: None,
			owned_dep: None,
			kind,
		}
	}
}

impl Graph {
	/// Marks every link of `sub_id` unconfirmed ahead of a run.
	///
	/// Each dep's `active_link` cache is pointed at this subscriber's
	/// link for the duration of the run, saving whatever it held before
	/// so nested runs restore it.
	pub(crate) fn prepare_deps(&mut self, sub_id: SubId) {
		let Some(sub) = self.subs.get(sub_id) else { return };
		let mut link = sub.deps;
		while let Some(link_id) = link {
			let (dep_id, next) = match self.links.get(link_id) {
				Some(link) => (link.dep, link.next_dep),
				None => break,
			};
			self.links[link_id].version = None;
			let prev_active = self
				.deps
				.get_mut(dep_id)
				.and_then(|dep| dep.active_link.replace(link_id));
			self.links[link_id].prev_active = prev_active;
			link = next;
		}
	}

	/// Prunes links left unconfirmed by a finished run.
	///
	/// Walks tail to head, restoring each dep's saved `active_link` and
	/// hard-unlinking any link whose version is still `None`.
	pub(crate) fn cleanup_deps(&mut self, sub_id: SubId) {
		let Some(sub) = self.subs.get(sub_id) else { return };
		let mut head = None;
		let mut tail = sub.deps_tail;
		let mut link = tail;
		while let Some(link_id) = link {
			let (dep_id, prev, version, prev_active) = match self.links.get_mut(link_id) {
				Some(link) => (link.dep, link.prev_dep, link.version, link.prev_active.take()),
				None => break,
			};
			if let Some(dep) = self.deps.get_mut(dep_id) {
				dep.active_link = prev_active;
			}

			match version {
				// Not read this run: drop from both lists
				None => {
					if tail == Some(link_id) {
						tail = prev;
					}
					self.unlink_sub(link_id, false);
					let next = self.links[link_id].next_dep;
					if let Some(prev) = prev {
						self.links[prev].next_dep = next;
					}
					if let Some(next) = next {
						self.links[next].prev_dep = prev;
					}
					self.links.remove(link_id);
				},
				Some(_) => head = Some(link_id),
			}
			link = prev;
		}

		let sub = &mut self.subs[sub_id];
		sub.deps = head;
		sub.deps_tail = tail;
	}

	/// Tears a subscriber down: hard-unlinks every dependency, dequeues
	/// it and frees its node
	pub(crate) fn free_sub(&mut self, sub_id: SubId) {
		let mut link = self.subs.get(sub_id).and_then(|sub| sub.deps);
		while let Some(link_id) = link {
			link = self.links.get(link_id).and_then(|node| node.next_dep);
			self.unlink_sub(link_id, false);
			self.links.remove(link_id);
		}

		self.remove_queued(sub_id);
		self.paused_effects.retain(|&queued| queued != sub_id);
		self.subs.remove(sub_id);
	}

	/// Removes `sub_id` from whichever batch queue holds it
	fn remove_queued(&mut self, sub_id: SubId) {
		self.queued_effects = Self::remove_from_queue(&mut self.subs, self.queued_effects, sub_id);
		self.queued_computeds = Self::remove_from_queue(&mut self.subs, self.queued_computeds, sub_id);
	}

	/// Unlinks `sub_id` from an intrusive queue, returning the new head
	fn remove_from_queue(
		subs: &mut super::arena::Arena<SubNode>,
		head: Option<SubId>,
		sub_id: SubId,
	) -> Option<SubId> {
		let mut new_head = head;
		let mut prev: Option<SubId> = None;
		let mut cur = head;
		while let Some(id) = cur {
			let next = subs.get(id).and_then(|sub| sub.next);
			if id == sub_id {
				match prev {
					Some(prev) =>
						if let Some(sub) = subs.get_mut(prev) {
							sub.next = next;
						},
					None => new_head = next,
				}
				if let Some(sub) = subs.get_mut(id) {
					sub.next = None;
				}
				break;
			}
			prev = cur;
			cur = next;
		}

		new_head
	}
}

/// Checks whether any dependency of `sub_id` changed since its last run.
///
/// Dependencies produced by a computed are refreshed first, since a
/// dirty computed only bumps its version when re-evaluation yields a
/// different value. Runs user getters, so the graph must not be
/// borrowed by the caller.
pub(crate) fn is_dirty(sub_id: SubId) -> bool {
	let links: Vec<LinkId> = super::with(|graph| {
		let mut links = Vec::new();
		let mut link = graph.subs.get(sub_id).and_then(|sub| sub.deps);
		while let Some(link_id) = link {
			links.push(link_id);
			link = graph.links.get(link_id).and_then(|node| node.next_dep);
		}
		links
	});

	for link_id in links {
		let owner = super::with(|graph| {
			let link = graph.links.get(link_id)?;
			let dep = graph.deps.get(link.dep)?;
			let owner = dep.owner?;
			match &graph.subs.get(owner)?.kind {
				SubKind::Computed(computed) => Weak::upgrade(computed),
				SubKind::Effect(_) => None,
			}
		});
		if let Some(computed) = owner {
			crate::computed::refresh(&computed);
		}

		let changed = super::with(|graph| match graph.links.get(link_id) {
			Some(link) => match graph.deps.get(link.dep) {
				Some(dep) => link.version != Some(dep.version),
				// Dep was torn down: force a re-run so the link is pruned
				None => true,
			},
			None => false,
		});
		if changed {
			return true;
		}
	}

	false
}
