//! Batching
//!
//! Every trigger opens an implicit batch; [`start_batch`] / [`end_batch`]
//! let callers widen it so a burst of writes flushes effects once. The
//! queues are intrusive singly-linked lists threaded through subscriber
//! nodes, drained when the outermost batch closes.

// Imports
use {
	super::{SubFlags, SubKind},
	std::{panic::AssertUnwindSafe, rc::Rc},
};

/// Opens a batch.
///
/// Notifications queue up until the matching [`end_batch`].
pub fn start_batch() {
	super::with(|graph| graph.batch_depth += 1);
}

/// Closes a batch, flushing queued notifications if it was the
/// outermost one.
#[track_caller]
pub fn end_batch() {
	let caller_loc = crate::loc::Loc::caller();
	let depth = super::with(|graph| {
		match graph.batch_depth.checked_sub(1) {
			Some(depth) => graph.batch_depth = depth,
			None => tracing::warn!(
				location=%caller_loc,
				"`end_batch` called without a matching `start_batch`"
			),
		}
		graph.batch_depth
	});

	if depth == 0 {
		self::flush();
	}
}

/// Runs `f` inside a batch
pub fn batch<O>(f: impl FnOnce() -> O) -> O {
	self::start_batch();
	scopeguard::defer! {
		self::end_batch();
	}
	f()
}

/// Outcome of popping the effect queue
enum Popped {
	/// Queue is empty
	Empty,

	/// Entry was stale, paused or stopped
	Skip,

	/// Effect to run
	Run(Rc<crate::effect::Inner>),
}

/// Drains both batch queues.
///
/// Computed entries are bookkeeping only (they were marked dirty at
/// notify time), so their queue just clears `NOTIFIED`. Effects run
/// one at a time outside the graph borrow; a panicking effect doesn't
/// stop the drain, the first payload resumes once the queues are empty.
fn flush() {
	super::with(|graph| {
		let mut next = graph.queued_computeds.take();
		while let Some(sub_id) = next {
			next = match graph.subs.get_mut(sub_id) {
				Some(sub) => {
					sub.flags.remove(SubFlags::NOTIFIED);
					sub.next.take()
				},
				None => None,
			};
		}
	});

	let mut first_panic = None;
	loop {
		let popped = super::with(|graph| {
			let Some(sub_id) = graph.queued_effects else {
				return Popped::Empty;
			};
			let next = graph.subs.get_mut(sub_id).and_then(|sub| {
				sub.flags.remove(SubFlags::NOTIFIED);
				sub.next.take()
			});
			graph.queued_effects = next;

			let Some(sub) = graph.subs.get(sub_id) else {
				return Popped::Skip;
			};
			let paused = sub.flags.contains(SubFlags::PAUSED);
			let active = sub.flags.contains(SubFlags::ACTIVE);
			let effect = match &sub.kind {
				SubKind::Effect(effect) => effect.clone(),
				SubKind::Computed(_) => return Popped::Skip,
			};

			// Paused effects re-queue when resumed
			if paused {
				if !graph.paused_effects.contains(&sub_id) {
					graph.paused_effects.push(sub_id);
				}
				return Popped::Skip;
			}
			if !active {
				return Popped::Skip;
			}
			effect.upgrade().map_or(Popped::Skip, Popped::Run)
		});

		match popped {
			Popped::Empty => break,
			Popped::Skip => continue,
			Popped::Run(inner) => {
				let effect = crate::effect::Effect::from_inner(inner);
				if let Err(payload) = std::panic::catch_unwind(AssertUnwindSafe(|| effect.trigger())) {
					tracing::warn!("Effect panicked during flush, continuing with remaining effects");
					first_panic.get_or_insert(payload);
				}
			},
		}
	}

	super::with(|graph| {
		debug_assert!(
			graph.queued_effects.is_none() && graph.queued_computeds.is_none(),
			"Batch queues must be empty after a flush"
		);
	});

	if let Some(payload) = first_panic {
		std::panic::resume_unwind(payload);
	}
}
