//! Index-addressed sequence with holes.
//!
//! Streams may declare an explicit index, in which case they are placed at
//! that position and any skipped positions stay empty. Streams without an
//! index are appended. [`Slots`] keeps both cases in one sequence and
//! serializes holes as `null`.

use serde::{Deserialize, Serialize};

/// A sequence of optionally occupied positions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Slots<T> {
    slots: Vec<Option<T>>,
}

impl<T> Default for Slots<T> {
    fn default() -> Self {
        Self { slots: Vec::new() }
    }
}

impl<T> Slots<T> {
    /// Create an empty sequence.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of positions, holes included.
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// `true` when there are no positions at all.
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Number of occupied positions.
    pub fn count(&self) -> usize {
        self.slots.iter().filter(|s| s.is_some()).count()
    }

    /// `true` when every position is occupied.
    pub fn is_dense(&self) -> bool {
        self.slots.iter().all(Option::is_some)
    }

    /// The value at `index`, or `None` for a hole or out-of-range index.
    pub fn get(&self, index: usize) -> Option<&T> {
        self.slots.get(index).and_then(Option::as_ref)
    }

    /// `true` when `index` is within range and occupied.
    pub fn is_occupied(&self, index: usize) -> bool {
        self.get(index).is_some()
    }

    /// Iterate over occupied positions in order.
    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.slots.iter().flatten()
    }

    /// Iterate over `(position, value)` pairs for occupied positions.
    pub fn enumerate(&self) -> impl Iterator<Item = (usize, &T)> {
        self.slots
            .iter()
            .enumerate()
            .filter_map(|(i, s)| s.as_ref().map(|v| (i, v)))
    }

    /// Raw view including holes.
    pub fn as_slice(&self) -> &[Option<T>] {
        &self.slots
    }

    /// Append at the end; returns the position used.
    pub fn push(&mut self, value: T) -> usize {
        self.slots.push(Some(value));
        self.slots.len() - 1
    }

    /// Put `value` at `index`, growing the sequence with holes as needed.
    ///
    /// Returns the value back if the position is already occupied.
    pub fn place(&mut self, index: usize, value: T) -> Result<usize, T> {
        if self.is_occupied(index) {
            return Err(value);
        }
        if index >= self.slots.len() {
            self.slots.resize_with(index + 1, || None);
        }
        self.slots[index] = Some(value);
        Ok(index)
    }

    /// Apply `f` to every occupied value, keeping holes where they are.
    pub fn map<U>(self, mut f: impl FnMut(T) -> U) -> Slots<U> {
        Slots {
            slots: self.slots.into_iter().map(|s| s.map(&mut f)).collect(),
        }
    }

    /// Consume into the raw positions.
    pub fn into_inner(self) -> Vec<Option<T>> {
        self.slots
    }
}

impl<A, B> Slots<(A, B)> {
    /// Split a sequence of pairs into two sequences with identical holes.
    pub fn unzip(self) -> (Slots<A>, Slots<B>) {
        let (a, b): (Vec<Option<A>>, Vec<Option<B>>) = self
            .slots
            .into_iter()
            .map(|s| match s {
                Some((a, b)) => (Some(a), Some(b)),
                None => (None, None),
            })
            .unzip();
        (Slots { slots: a }, Slots { slots: b })
    }
}

impl<T> FromIterator<T> for Slots<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            slots: iter.into_iter().map(Some).collect(),
        }
    }
}
