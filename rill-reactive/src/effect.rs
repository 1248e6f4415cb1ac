//! Effects
//!
//! An effect runs its closure once on creation, tracking every reactive
//! read, then re-runs whenever any of those dependencies change. Effects
//! re-run eagerly at the end of the triggering batch; a custom scheduler
//! can defer or coalesce the re-run instead.

// Imports
use {
	crate::{
		graph::{self, SubFlags, SubKind, SubNode},
		loc::Loc,
	},
	core::{cell::Cell, fmt},
	std::{
		cell::RefCell,
		rc::{Rc, Weak},
	},
};

/// An effect
pub struct Effect {
	/// Inner
	inner: Rc<Inner>,
}

/// Effect inner
pub(crate) struct Inner {
	/// Graph node, while not stopped
	sub: Cell<Option<graph::SubId>>,

	/// Runner
	run: Box<dyn Fn()>,

	/// Custom scheduler, replacing the default re-run
	scheduler: Option<Box<dyn Fn()>>,

	/// Cleanups registered during the last run
	cleanups: RefCell<Vec<Box<dyn FnOnce()>>>,

	/// Callback for when the effect is stopped
	on_stop: Cell<Option<Box<dyn FnOnce()>>>,

	/// Where the effect was defined
	defined_loc: Loc,
}

/// Options for creating an [`Effect`]
#[derive(Default)]
pub struct EffectOptions {
	/// Called instead of re-running when the effect is notified.
	///
	/// The scheduler is responsible for eventually calling
	/// [`Effect::run`] (usually through a kept handle).
	pub scheduler: Option<Box<dyn Fn()>>,

	/// Whether the effect may re-queue itself from its own run
	pub allow_recurse: bool,

	/// Called once when the effect is stopped
	pub on_stop: Option<Box<dyn FnOnce()>>,
}

impl Effect {
	/// Creates an effect and runs it once
	#[track_caller]
	pub fn new(run: impl Fn() + 'static) -> Self {
		Self::with_options(run, EffectOptions::default())
	}

	/// Creates an effect with options and runs it once
	#[track_caller]
	pub fn with_options(run: impl Fn() + 'static, options: EffectOptions) -> Self {
		let allow_recurse = options.allow_recurse;
		let inner = Rc::new(Inner {
			sub: Cell::new(None),
			run: Box::new(run),
			scheduler: options.scheduler,
			cleanups: RefCell::new(Vec::new()),
			on_stop: Cell::new(options.on_stop),
			defined_loc: Loc::caller(),
		});

		let sub_id = graph::with(|graph| {
			let mut flags = SubFlags::ACTIVE | SubFlags::TRACKING;
			if allow_recurse {
				flags |= SubFlags::ALLOW_RECURSE;
			}
			graph
				.subs
				.insert(SubNode::new(SubKind::Effect(Rc::downgrade(&inner)), flags))
		});
		inner.sub.set(Some(sub_id));

		let effect = Self { inner };
		tracing::trace!(?effect, "Created effect");
		effect.run();
		effect
	}

	/// Rebuilds the inner effect from its shared handle
	pub(crate) fn from_inner(inner: Rc<Inner>) -> Self {
		Self { inner }
	}

	/// Returns a unique identifier for this effect.
	///
	/// Cloned handles retain the same id.
	#[must_use]
	pub fn id(&self) -> usize {
		Rc::as_ptr(&self.inner).addr()
	}

	/// Returns where this effect was defined
	#[must_use]
	pub fn defined_loc(&self) -> Loc {
		self.inner.defined_loc
	}

	/// Downgrades this handle
	#[must_use]
	pub fn downgrade(&self) -> WeakEffect {
		WeakEffect {
			inner: Rc::downgrade(&self.inner),
		}
	}

	/// Returns whether the effect hasn't been stopped
	#[must_use]
	pub fn is_active(&self) -> bool {
		self.inner.sub.get().is_some()
	}

	/// Runs the effect, re-tracking its dependencies.
	///
	/// A stopped effect just runs its closure without tracking.
	pub fn run(&self) {
		let Some(sub_id) = self.inner.sub.get() else {
			(self.inner.run)();
			return;
		};

		self.run_cleanups();

		let (prev_sub, prev_track) = graph::with(|graph| {
			graph.prepare_deps(sub_id);
			if let Some(sub) = graph.subs.get_mut(sub_id) {
				sub.flags.insert(SubFlags::RUNNING);
			}
			let prev_sub = graph.active_sub.replace(sub_id);
			let prev_track = core::mem::replace(&mut graph.should_track, true);
			(prev_sub, prev_track)
		});

		// Restores graph state and prunes stale links even if the runner
		// panics.
		let defined_loc = self.inner.defined_loc;
		scopeguard::defer! {
			graph::with(|graph| {
				if graph.active_sub != Some(sub_id) {
					tracing::warn!(
						location=%defined_loc,
						"Active subscriber changed during an effect run"
					);
				}
				graph.active_sub = prev_sub;
				graph.should_track = prev_track;
				if let Some(sub) = graph.subs.get_mut(sub_id) {
					sub.flags.remove(SubFlags::RUNNING);
				}
				graph.cleanup_deps(sub_id);
			});
		}
		(self.inner.run)();
	}

	/// Reacts to a notification: defers to the scheduler if there is
	/// one, otherwise re-runs if any dependency actually changed
	pub fn trigger(&self) {
		let Some(sub_id) = self.inner.sub.get() else { return };

		let paused = graph::with(|graph| {
			let Some(sub) = graph.subs.get(sub_id) else {
				return false;
			};
			let paused = sub.flags.contains(SubFlags::PAUSED);
			if paused && !graph.paused_effects.contains(&sub_id) {
				graph.paused_effects.push(sub_id);
			}
			paused
		});
		if paused {
			return;
		}

		match &self.inner.scheduler {
			Some(scheduler) => scheduler(),
			None =>
				if graph::is_dirty(sub_id) {
					self.run();
				},
		}
	}

	/// Pauses the effect: notifications are deferred until [`resume`]
	///
	/// [`resume`]: Self::resume
	pub fn pause(&self) {
		let Some(sub_id) = self.inner.sub.get() else { return };
		graph::with(|graph| {
			if let Some(sub) = graph.subs.get_mut(sub_id) {
				sub.flags.insert(SubFlags::PAUSED);
			}
		});
	}

	/// Resumes the effect, re-running it once if it was notified while
	/// paused
	pub fn resume(&self) {
		let Some(sub_id) = self.inner.sub.get() else { return };
		let was_notified = graph::with(|graph| {
			if let Some(sub) = graph.subs.get_mut(sub_id) {
				sub.flags.remove(SubFlags::PAUSED);
			}
			match graph.paused_effects.iter().position(|&paused| paused == sub_id) {
				Some(idx) => {
					graph.paused_effects.remove(idx);
					true
				},
				None => false,
			}
		});
		if was_notified {
			self.trigger();
		}
	}

	/// Stops the effect.
	///
	/// Runs pending cleanups, severs every dependency and calls the
	/// `on_stop` callback. Idempotent.
	pub fn stop(&self) {
		let Some(sub_id) = self.inner.sub.take() else { return };
		self.run_cleanups();
		graph::with(|graph| graph.free_sub(sub_id));
		if let Some(on_stop) = self.inner.on_stop.take() {
			on_stop();
		}
		tracing::trace!(?self, "Stopped effect");
	}

	/// Runs and discards the cleanups registered during the last run.
	///
	/// Cleanups run untracked and outside the effect itself, so their
	/// reads never become dependencies.
	fn run_cleanups(&self) {
		let cleanups = core::mem::take(&mut *self.inner.cleanups.borrow_mut());
		if cleanups.is_empty() {
			return;
		}

		let prev_sub = graph::with(|graph| graph.active_sub.take());
		graph::pause_tracking();
		scopeguard::defer! {
			graph::reset_tracking();
			graph::with(|graph| graph.active_sub = prev_sub);
		}
		for cleanup in cleanups {
			cleanup();
		}
	}
}

impl Clone for Effect {
	fn clone(&self) -> Self {
		Self {
			inner: Rc::clone(&self.inner),
		}
	}
}

impl PartialEq for Effect {
	fn eq(&self, other: &Self) -> bool {
		self.id() == other.id()
	}
}

impl Eq for Effect {}

impl fmt::Debug for Effect {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Effect")
			.field("id", &self.id())
			.field("defined_loc", &self.inner.defined_loc)
			.finish_non_exhaustive()
	}
}

/// A weak handle to an [`Effect`]
#[derive(Clone)]
pub struct WeakEffect {
	/// Inner
	inner: Weak<Inner>,
}

impl WeakEffect {
	/// Upgrades this handle, if the effect is still alive
	#[must_use]
	pub fn upgrade(&self) -> Option<Effect> {
		self.inner.upgrade().map(|inner| Effect { inner })
	}
}

impl fmt::Debug for WeakEffect {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("WeakEffect").finish_non_exhaustive()
	}
}

impl Drop for Inner {
	fn drop(&mut self) {
		// Graph teardown only; cleanups require an explicit `stop`.
		if let Some(sub_id) = self.sub.take() {
			let _ = graph::try_with(|graph| graph.free_sub(sub_id));
		}
	}
}

/// Registers a cleanup to run before the current effect's next run (or
/// on stop).
///
/// Warns and drops the cleanup when no effect is running.
#[track_caller]
pub fn on_cleanup(cleanup: impl FnOnce() + 'static) {
	let inner = graph::with(|graph| {
		let sub_id = graph.active_sub?;
		match &graph.subs.get(sub_id)?.kind {
			SubKind::Effect(effect) => effect.upgrade(),
			SubKind::Computed(_) => None,
		}
	});

	match inner {
		Some(inner) => inner.cleanups.borrow_mut().push(Box::new(cleanup)),
		None => tracing::warn!(
			location=%Loc::caller(),
			"`on_cleanup` called outside a running effect"
		),
	}
}

/// Returns a handle to the currently running effect, if any
#[must_use]
pub fn running() -> Option<Effect> {
	graph::with(|graph| {
		let sub_id = graph.active_sub?;
		match &graph.subs.get(sub_id)?.kind {
			SubKind::Effect(effect) => effect.upgrade().map(Effect::from_inner),
			SubKind::Computed(_) => None,
		}
	})
}
