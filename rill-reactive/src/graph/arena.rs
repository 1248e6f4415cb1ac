//! Node arenas
//!
//! Deps, subscribers and links live in generational arenas owned by the
//! graph and refer to each other through typed [`Id`]s rather than
//! pointers. A freed slot bumps its generation, so a stale id can never
//! alias a recycled node: lookups return `None` and indexing panics.

// Imports
use core::{
	fmt,
	hash::{Hash, Hasher},
	marker::PhantomData,
	ops::{Index, IndexMut},
};

/// Typed generational index into an [`Arena<T>`]
pub(crate) struct Id<T> {
	/// Slot index
	index: u32,

	/// Slot generation at creation
	generation: u32,

	/// Marker
	_marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Id<T> {
	fn clone(&self) -> Self {
		*self
	}
}

impl<T> Copy for Id<T> {}

impl<T> PartialEq for Id<T> {
	fn eq(&self, other: &Self) -> bool {
		self.index == other.index && self.generation == other.generation
	}
}

impl<T> Eq for Id<T> {}

impl<T> Hash for Id<T> {
	fn hash<H: Hasher>(&self, state: &mut H) {
		self.index.hash(state);
		self.generation.hash(state);
	}
}

impl<T> fmt::Debug for Id<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "Id({}v{})", self.index, self.generation)
	}
}

/// Arena slot
struct Slot<T> {
	/// Current generation
	generation: u32,

	/// Value, if the slot is live
	value: Option<T>,
}

/// Generational arena
pub(crate) struct Arena<T> {
	/// Slots
	slots: Vec<Slot<T>>,

	/// Free slot indices
	free: Vec<u32>,
}

impl<T> Arena<T> {
	/// Creates a new, empty arena
	pub fn new() -> Self {
		Self {
			slots: Vec::new(),
			free:  Vec::new(),
		}
	}

	/// Inserts a value, returning its id
	pub fn insert(&mut self, value: T) -> Id<T> {
		match self.free.pop() {
			Some(index) => {
				let slot = &mut self.slots[index as usize];
				slot.value = Some(value);
				Id {
					index,
					generation: slot.generation,
					_marker: PhantomData,
				}
			},
			None => {
				let index = u32::try_from(self.slots.len()).expect("Arena exceeded `u32::MAX` slots");
				self.slots.push(Slot {
					generation: 0,
					value:      Some(value),
				});
				Id {
					index,
					generation: 0,
					_marker: PhantomData,
				}
			},
		}
	}

	/// Removes a value by id.
	///
	/// Returns `None` if the id is stale.
	pub fn remove(&mut self, id: Id<T>) -> Option<T> {
		let slot = self.slots.get_mut(id.index as usize)?;
		if slot.generation != id.generation || slot.value.is_none() {
			return None;
		}

		let value = slot.value.take();
		slot.generation = slot.generation.wrapping_add(1);
		self.free.push(id.index);
		value
	}

	/// Gets a value by id, if it's still live
	pub fn get(&self, id: Id<T>) -> Option<&T> {
		let slot = self.slots.get(id.index as usize)?;
		if slot.generation != id.generation {
			return None;
		}
		slot.value.as_ref()
	}

	/// Gets a value mutably by id, if it's still live
	pub fn get_mut(&mut self, id: Id<T>) -> Option<&mut T> {
		let slot = self.slots.get_mut(id.index as usize)?;
		if slot.generation != id.generation {
			return None;
		}
		slot.value.as_mut()
	}

	/// Returns the number of live values
	#[cfg(test)]
	pub fn len(&self) -> usize {
		self.slots.len() - self.free.len()
	}
}

impl<T> Index<Id<T>> for Arena<T> {
	type Output = T;

	fn index(&self, id: Id<T>) -> &Self::Output {
		self.get(id).expect("Stale arena id")
	}
}

impl<T> IndexMut<Id<T>> for Arena<T> {
	fn index_mut(&mut self, id: Id<T>) -> &mut Self::Output {
		self.get_mut(id).expect("Stale arena id")
	}
}

#[cfg(test)]
mod test {
	use super::*;

	#[test]
	fn insert_get_remove() {
		let mut arena = Arena::new();
		let a = arena.insert("a");
		let b = arena.insert("b");

		assert_eq!(arena.get(a), Some(&"a"));
		assert_eq!(arena.get(b), Some(&"b"));
		assert_eq!(arena.len(), 2);

		assert_eq!(arena.remove(a), Some("a"));
		assert_eq!(arena.get(a), None);
		assert_eq!(arena.len(), 1);
	}

	#[test]
	fn stale_id_does_not_alias_recycled_slot() {
		let mut arena = Arena::new();
		let a = arena.insert("a");
		arena.remove(a).expect("Value should be live");

		// Recycles the same slot with a new generation
		let b = arena.insert("b");
		assert_eq!(arena.get(a), None);
		assert_eq!(arena.remove(a), None);
		assert_eq!(arena.get(b), Some(&"b"));
	}
}
