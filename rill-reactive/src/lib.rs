//! Fine-grained reactivity for `rill`
//!
//! Tracks which reactive values each [`Effect`] or [`Computed`] reads
//! and re-runs exactly the affected subscribers when those values
//! change. Dependency edges live in doubly-linked lists so repeated
//! reads, re-runs and pruning stay O(1) amortized; computeds are lazy
//! and cached behind a global version counter; writes coalesce through
//! a reentrant batch scheduler.
//!
//! Plain data goes through [`wrap`]: a wrapped [`Obj`], [`Arr`],
//! [`Map`] or [`Set`] tracks per-slot reads and triggers per-slot
//! writes, including virtual slots for length and iteration.

// Modules
pub mod atom;
pub mod computed;
pub mod effect;
pub mod graph;
pub mod loc;
pub mod value;
pub mod wrap;

// Exports
pub use self::{
	atom::Atom,
	computed::Computed,
	effect::{Effect, EffectOptions, WeakEffect, on_cleanup},
	graph::{
		DepKey, EntryKey, TriggerKind, batch, end_batch, global_version, pause_tracking, reset_tracking,
		start_batch, subscriber_count, track, trigger, untracked,
	},
	loc::Loc,
	value::{Arr, Map, Obj, Set, Value},
	wrap::{
		Mode, Wrapped, is_readonly, is_shallow, is_wrapped, mark_raw, to_raw, wrap, wrap_readonly,
		wrap_readonly_shallow, wrap_shallow, wrap_with,
	},
};
