//! Deps
//!
//! A dep is a single trackable slot: a standalone cell, a computed's
//! output, or one key of a container registered in the graph's slot
//! registry. It carries a version counter bumped on every change and a
//! list of links to its current subscribers.

// Imports
use super::{DepKey, Graph, LinkId, LinkNode, SubFlags, SubId, SubKind};

/// Typed dep id
pub(crate) type DepId = super::arena::Id<DepNode>;

/// Dep node
pub(crate) struct DepNode {
	/// Version, bumped whenever the tracked value changes
	pub version: u64,

	/// Subscriber list tail
	pub subs: Option<LinkId>,

	/// Subscriber list head
	#[cfg(debug_assertions)]
	pub subs_head: Option<LinkId>,

	/// Cached link for the currently running subscriber
	pub active_link: Option<LinkId>,

	/// The computed that produces this dep's value, if any
	pub owner: Option<SubId>,

	/// Number of live links pointing at this dep
	pub sub_count: usize,

	/// Registry slot this dep was created for, if any
	pub slot: Option<(usize, DepKey)>,
}

impl DepNode {
	/// Creates a dep owned by a computed
	pub fn for_computed(owner: SubId) -> Self {
		Self {
			version: 0,
			subs: None,
			#[cfg(debug_assertions)]
			subs_head: None,
			active_link: None,
			owner: Some(owner),
			sub_count: 0,
			slot: None,
		}
	}

	/// Creates a standalone dep
	pub fn standalone() -> Self {
		Self {
			version: 0,
			subs: None,
			#[cfg(debug_assertions)]
			subs_head: None,
			active_link: None,
			owner: None,
			sub_count: 0,
			slot: None,
		}
	}

	/// Creates a dep for a registry slot
	pub fn for_slot(container: usize, key: DepKey) -> Self {
		Self {
			version: 0,
			subs: None,
			#[cfg(debug_assertions)]
			subs_head: None,
			active_link: None,
			owner: None,
			sub_count: 0,
			slot: Some((container, key)),
		}
	}
}

impl Graph {
	/// Records a read of `dep_id` by the active subscriber.
	///
	/// Reuses the dep's cached link when the same subscriber reads the
	/// dep again, confirming it for this run and moving it to the tail
	/// of the subscriber's dependency list. Returns the link, if any
	/// tracking happened.
	pub(crate) fn track_dep(&mut self, dep_id: DepId) -> Option<LinkId> {
		if !self.should_track {
			return None;
		}
		let sub_id = self.active_sub?;
		let dep = self.deps.get(dep_id)?;

		// A computed reading its own output doesn't track
		if dep.owner == Some(sub_id) {
			return None;
		}

		let active = dep
			.active_link
			.and_then(|link_id| self.links.get(link_id).map(|link| (link_id, link.sub, link.version)));
		if let Some((link_id, link_sub, version)) = active
			&& link_sub == sub_id
		{
			if version.is_none() {
				// First read this run: confirm and keep read order
				let dep_version = self.deps[dep_id].version;
				self.links[link_id].version = Some(dep_version);
				self.move_link_to_deps_tail(sub_id, link_id);
			}
			return Some(link_id);
		}

		let version = self.deps[dep_id].version;
		let link_id = self.links.insert(LinkNode {
			sub: sub_id,
			dep: dep_id,
			version: Some(version),
			prev_dep: None,
			next_dep: None,
			prev_sub: None,
			next_sub: None,
			prev_active: None,
		});
		self.push_link_to_deps(sub_id, link_id);
		self.deps[dep_id].sub_count += 1;
		self.link_sub(link_id);
		self.deps[dep_id].active_link = Some(link_id);

		tracing::trace!(?dep_id, ?sub_id, "Linked dependency");
		Some(link_id)
	}

	/// Queues every subscriber of `dep_id` for the current batch.
	///
	/// Walks the subscriber list from the tail so effects flush in
	/// reverse subscription order; a notified computed propagates into
	/// its own output dep.
	pub(crate) fn notify_dep(&mut self, dep_id: DepId) {
		let Some(dep) = self.deps.get(dep_id) else { return };
		let mut link = dep.subs;
		while let Some(link_id) = link {
			let Some(node) = self.links.get(link_id) else { break };
			let sub_id = node.sub;
			link = node.prev_sub;

			if self.notify_sub(sub_id)
				&& let Some(owned) = self.subs.get(sub_id).and_then(|sub| sub.owned_dep)
			{
				self.notify_dep(owned);
			}
		}
	}

	/// Queues a single subscriber.
	///
	/// Returns whether the subscriber is a computed whose own dep should
	/// be notified in turn.
	fn notify_sub(&mut self, sub_id: SubId) -> bool {
		let Some(sub) = self.subs.get(sub_id) else { return false };
		let flags = sub.flags;
		match sub.kind {
			SubKind::Effect(_) => {
				if flags.contains(SubFlags::RUNNING) && !flags.contains(SubFlags::ALLOW_RECURSE) {
					return false;
				}
				if !flags.contains(SubFlags::NOTIFIED) {
					let head = self.queued_effects;
					let sub = &mut self.subs[sub_id];
					sub.flags.insert(SubFlags::NOTIFIED);
					sub.next = head;
					self.queued_effects = Some(sub_id);
				}
				false
			},
			SubKind::Computed(_) => {
				self.subs[sub_id].flags.insert(SubFlags::DIRTY);

				// The computed currently evaluating notifies its own dep
				// without being queued, so recursive invalidation still
				// reaches its subscribers.
				if self.active_sub == Some(sub_id) {
					return true;
				}
				if !flags.contains(SubFlags::NOTIFIED) {
					let head = self.queued_computeds;
					let sub = &mut self.subs[sub_id];
					sub.flags.insert(SubFlags::NOTIFIED);
					sub.next = head;
					self.queued_computeds = Some(sub_id);
					return true;
				}
				false
			},
		}
	}

	/// Tears a dep down, severing every link to its subscribers
	pub(crate) fn free_dep(&mut self, dep_id: DepId) {
		let Some(dep) = self.deps.get(dep_id) else { return };
		let mut link = dep.subs;
		while let Some(link_id) = link {
			link = self.links.get(link_id).and_then(|node| node.prev_sub);
			self.remove_link_from_deps(link_id);
			self.links.remove(link_id);
		}

		if let Some((container, key)) = self.deps[dep_id].slot.clone()
			&& let Some(slots) = self.registry.get_mut(&container)
		{
			slots.swap_remove(&key);
			if slots.is_empty() {
				self.registry.remove(&container);
			}
		}
		self.deps.remove(dep_id);
	}
}

/// Marks `dep_id` changed and flushes the resulting notifications,
/// unless a batch is open.
pub(crate) fn trigger_dep(dep_id: DepId) {
	super::with(|graph| {
		graph.global_version += 1;
		graph.batch_depth += 1;
		if let Some(dep) = graph.deps.get_mut(dep_id) {
			dep.version += 1;
			graph.notify_dep(dep_id);
		}
	});
	super::end_batch();
}
