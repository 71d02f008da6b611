//! # Generation-Checked Slot Arena
//!
//! Inodes and directory entries live in arenas and refer to each other by
//! index. Every slot carries a generation that is bumped when its value is
//! removed, so an id kept past the removal of its value resolves to nothing
//! instead of silently naming whatever reuses the slot.

use alloc::vec::Vec;
use core::fmt;
use core::marker::PhantomData;

/// Index plus generation.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct RawId {
    index: u32,
    generation: u32,
}

impl fmt::Debug for RawId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}v{}", self.index, self.generation)
    }
}

/// A typed id stored in an [`Arena`].
pub trait ArenaId: Copy {
    fn from_raw(raw: RawId) -> Self;
    fn raw(self) -> RawId;
}

macro_rules! arena_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Copy, Clone, PartialEq, Eq, Hash)]
        pub struct $name($crate::arena::RawId);

        impl $crate::arena::ArenaId for $name {
            #[inline]
            fn from_raw(raw: $crate::arena::RawId) -> Self {
                Self(raw)
            }

            #[inline]
            fn raw(self) -> $crate::arena::RawId {
                self.0
            }
        }

        impl core::fmt::Debug for $name {
            fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
                write!(f, concat!(stringify!($name), "({:?})"), self.0)
            }
        }
    };
}
pub(crate) use arena_id;

struct Slot<T> {
    generation: u32,
    value: Option<T>,
}

pub struct Arena<I, T> {
    slots: Vec<Slot<T>>,
    vacant: Vec<u32>,
    len: usize,
    _id: PhantomData<fn() -> I>,
}

impl<I: ArenaId, T> Default for Arena<I, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<I: ArenaId, T> Arena<I, T> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            slots: Vec::new(),
            vacant: Vec::new(),
            len: 0,
            _id: PhantomData,
        }
    }

    /// Stores `value`, reusing a vacant slot when one exists.
    ///
    /// # Errors
    /// Hands `value` back when the heap cannot grow or the index space is exhausted.
    pub fn insert(&mut self, value: T) -> Result<I, T> {
        let index = if let Some(index) = self.vacant.pop() {
            let slot = &mut self.slots[index as usize];
            debug_assert!(slot.value.is_none());
            slot.value = Some(value);
            index
        } else {
            let Ok(index) = u32::try_from(self.slots.len()) else {
                return Err(value);
            };
            // Room to record the slot as vacant later, so `remove` never allocates.
            if self.slots.try_reserve(1).is_err()
                || self.vacant.try_reserve(self.slots.len() + 1 - self.vacant.len()).is_err()
            {
                return Err(value);
            }
            self.slots.push(Slot {
                generation: 0,
                value: Some(value),
            });
            index
        };
        self.len += 1;
        Ok(I::from_raw(RawId {
            index,
            generation: self.slots[index as usize].generation,
        }))
    }

    fn slot(&self, id: I) -> Option<&Slot<T>> {
        let raw = id.raw();
        self.slots
            .get(raw.index as usize)
            .filter(|s| s.generation == raw.generation)
    }

    #[must_use]
    pub fn get(&self, id: I) -> Option<&T> {
        self.slot(id).and_then(|s| s.value.as_ref())
    }

    pub fn get_mut(&mut self, id: I) -> Option<&mut T> {
        let raw = id.raw();
        self.slots
            .get_mut(raw.index as usize)
            .filter(|s| s.generation == raw.generation)
            .and_then(|s| s.value.as_mut())
    }

    /// Takes the value out and retires `id`.
    pub fn remove(&mut self, id: I) -> Option<T> {
        let raw = id.raw();
        let slot = self
            .slots
            .get_mut(raw.index as usize)
            .filter(|s| s.generation == raw.generation)?;
        let value = slot.value.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        self.vacant.push(raw.index);
        self.len -= 1;
        Some(value)
    }

    #[must_use]
    pub const fn len(&self) -> usize {
        self.len
    }
}
