//! Links
//!
//! A link is the edge connecting one dep to one subscriber. It sits on
//! two doubly-linked lists at once: the subscriber's dependency list
//! (read order) and the dep's subscriber list (subscription order).
//! Links are reused across re-runs while the pair stays connected.

// Imports
use super::{DepId, Graph, SubFlags, SubId};

/// Typed link id
pub(crate) type LinkId = super::arena::Id<LinkNode>;

/// Link node
pub(crate) struct LinkNode {
	/// Owning subscriber
	pub sub: SubId,

	/// Owning dep
	pub dep: DepId,

	/// Dep version at last confirmed use.
	///
	/// `None` means "unconfirmed this run": if still `None` when the run
	/// finishes, the link is stale and gets unlinked from both lists.
	pub version: Option<u64>,

	/// Position in the subscriber's dependency list
	pub prev_dep: Option<LinkId>,
	pub next_dep: Option<LinkId>,

	/// Position in the dep's subscriber list
	pub prev_sub: Option<LinkId>,
	pub next_sub: Option<LinkId>,

	/// The dep's previous `active_link`, saved while this subscriber runs
	pub prev_active: Option<LinkId>,
}

impl Graph {
	/// Appends `link_id` to the tail of its subscriber's dependency list
	pub(crate) fn push_link_to_deps(&mut self, sub_id: SubId, link_id: LinkId) {
		let tail = self.subs[sub_id].deps_tail;
		self.links[link_id].prev_dep = tail;
		match tail {
			Some(tail) => self.links[tail].next_dep = Some(link_id),
			None => self.subs[sub_id].deps = Some(link_id),
		}
		self.subs[sub_id].deps_tail = Some(link_id);
	}

	/// Moves `link_id` to the tail of its subscriber's dependency list,
	/// preserving read order for later pruning
	pub(crate) fn move_link_to_deps_tail(&mut self, sub_id: SubId, link_id: LinkId) {
		if self.subs[sub_id].deps_tail == Some(link_id) {
			return;
		}

		// Detach
		let prev = self.links[link_id].prev_dep;
		let next = self.links[link_id].next_dep;
		if let Some(prev) = prev {
			self.links[prev].next_dep = next;
		}
		if let Some(next) = next {
			self.links[next].prev_dep = prev;
		}
		if self.subs[sub_id].deps == Some(link_id) {
			self.subs[sub_id].deps = next;
		}

		// Re-append at the tail
		let tail = self.subs[sub_id].deps_tail;
		self.links[link_id].prev_dep = tail;
		self.links[link_id].next_dep = None;
		match tail {
			Some(tail) => self.links[tail].next_dep = Some(link_id),
			None => self.subs[sub_id].deps = Some(link_id),
		}
		self.subs[sub_id].deps_tail = Some(link_id);
	}

	/// Inserts `link_id` into its dep's subscriber list.
	///
	/// Only subscribers currently tracking receive notifications; links
	/// created by a dormant computed stay off the subscriber list until
	/// the computed regains a subscriber of its own.
	pub(crate) fn link_sub(&mut self, link_id: LinkId) {
		let Some(link) = self.links.get(link_id) else { return };
		let (sub_id, dep_id) = (link.sub, link.dep);
		let Some(sub) = self.subs.get(sub_id) else { return };
		if !sub.flags.contains(SubFlags::TRACKING) {
			return;
		}
		let Some(dep) = self.deps.get(dep_id) else { return };

		// A computed regaining its first subscriber re-subscribes to its
		// own dependencies, soft-unlinked when it went dormant.
		if dep.subs.is_none() {
			if let Some(owner_id) = dep.owner {
				let mut owner_link = match self.subs.get_mut(owner_id) {
					Some(owner) => {
						owner.flags.insert(SubFlags::TRACKING | SubFlags::DIRTY);
						owner.deps
					},
					None => None,
				};
				while let Some(current) = owner_link {
					owner_link = self.links.get(current).and_then(|link| link.next_dep);
					self.link_sub(current);
				}
			}
		}

		let tail = self.deps[dep_id].subs;
		if tail == Some(link_id) {
			return;
		}
		self.links[link_id].prev_sub = tail;
		self.links[link_id].next_sub = None;
		if let Some(tail) = tail {
			self.links[tail].next_sub = Some(link_id);
		}
		#[cfg(debug_assertions)]
		if self.deps[dep_id].subs_head.is_none() {
			self.deps[dep_id].subs_head = Some(link_id);
		}
		self.deps[dep_id].subs = Some(link_id);
	}

	/// Removes `link_id` from its dep's subscriber list.
	///
	/// A `soft` unlink keeps the link alive in the subscriber's
	/// dependency list and doesn't touch the dep's subscriber count;
	/// it's used to park a dormant computed's upstream subscriptions.
	pub(crate) fn unlink_sub(&mut self, link_id: LinkId, soft: bool) {
		let Some(link) = self.links.get_mut(link_id) else { return };
		let dep_id = link.dep;
		let prev = link.prev_sub.take();
		let next = link.next_sub.take();
		if let Some(prev) = prev
			&& let Some(link) = self.links.get_mut(prev)
		{
			link.next_sub = next;
		}
		if let Some(next) = next
			&& let Some(link) = self.links.get_mut(next)
		{
			link.prev_sub = prev;
		}

		let Some(dep) = self.deps.get_mut(dep_id) else { return };
		#[cfg(debug_assertions)]
		if dep.subs_head == Some(link_id) {
			dep.subs_head = next;
		}
		if dep.active_link == Some(link_id) {
			dep.active_link = None;
		}
		let mut went_dormant = None;
		if dep.subs == Some(link_id) {
			dep.subs = prev;
			if prev.is_none() {
				went_dormant = dep.owner;
			}
		}

		// Last subscriber gone: the owning computed goes dormant, parking
		// its own upstream subscriptions so unobserved chains can be
		// collected.
		if let Some(owner_id) = went_dormant {
			let mut owner_link = match self.subs.get_mut(owner_id) {
				Some(owner) => {
					owner.flags.remove(SubFlags::TRACKING);
					owner.deps
				},
				None => None,
			};
			while let Some(current) = owner_link {
				owner_link = self.links.get(current).and_then(|link| link.next_dep);
				self.unlink_sub(current, true);
			}
		}

		if !soft && let Some(dep) = self.deps.get_mut(dep_id) {
			dep.sub_count = dep.sub_count.saturating_sub(1);
			if dep.sub_count == 0 {
				self.evict_slot_dep(dep_id);
			}
		}
	}

	/// Removes `link_id` from its subscriber's dependency list
	pub(crate) fn remove_link_from_deps(&mut self, link_id: LinkId) {
		let Some(link) = self.links.get_mut(link_id) else { return };
		let sub_id = link.sub;
		let prev = link.prev_dep.take();
		let next = link.next_dep.take();
		if let Some(prev) = prev
			&& let Some(link) = self.links.get_mut(prev)
		{
			link.next_dep = next;
		}
		if let Some(next) = next
			&& let Some(link) = self.links.get_mut(next)
		{
			link.prev_dep = prev;
		}
		if let Some(sub) = self.subs.get_mut(sub_id) {
			if sub.deps == Some(link_id) {
				sub.deps = next;
			}
			if sub.deps_tail == Some(link_id) {
				sub.deps_tail = prev;
			}
		}
	}
}
