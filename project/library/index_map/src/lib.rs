//! Vectors indexed by strongly typed indices.
//!
//! Used as arenas throughout the front end: syntax tree nodes and source files are
//! stored in an [`IndexMap`] and referenced by small `Copy` handles.

use std::{
    fmt,
    hash::{Hash, Hasher},
    iter::{Enumerate, Map},
    marker::PhantomData,
};

#[cfg(test)]
mod test;

pub struct IndexMap<I, T> {
    values: Vec<T>,
    _marker: PhantomData<fn(&I)>,
}

impl<I, T> IndexMap<I, T> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self::bare(Vec::with_capacity(capacity))
    }

    pub fn bare(values: Vec<T>) -> Self {
        Self { values, _marker: PhantomData }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.values.last()
    }

    pub fn values(&self) -> std::slice::Iter<'_, T> {
        self.values.iter()
    }

    pub fn values_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.values.iter_mut()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<T> {
        self.values
    }
}

impl<I: Index, T> IndexMap<I, T> {
    #[must_use]
    pub fn next_index(&self) -> I {
        I::new(self.values.len())
    }

    #[must_use]
    pub fn last_index(&self) -> Option<I> {
        Some(I::new(self.values.len().checked_sub(1)?))
    }

    pub fn insert(&mut self, value: T) -> I {
        let index = self.next_index();
        self.values.push(value);
        index
    }

    /// Insert a value that needs to know its own index.
    pub fn insert_with(&mut self, constructor: impl FnOnce(I) -> T) -> I {
        let index = self.next_index();
        self.values.push(constructor(index));
        index
    }

    /// Drop every value inserted after the first `length` ones.
    pub fn truncate(&mut self, length: usize) {
        self.values.truncate(length);
    }

    pub fn get(&self, index: I) -> Option<&T> {
        self.values.get(index.value())
    }

    pub fn get_mut(&mut self, index: I) -> Option<&mut T> {
        self.values.get_mut(index.value())
    }

    pub fn iter(&self) -> Iter<'_, I, T> {
        self.values.iter().enumerate().map(map_entry as fn(_) -> _)
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, I, T> {
        self.values.iter_mut().enumerate().map(map_entry as fn(_) -> _)
    }

    pub fn indices(&self) -> Map<std::ops::Range<usize>, fn(usize) -> I> {
        (0..self.len()).map(I::new as fn(usize) -> I)
    }
}

impl<I, T> Default for IndexMap<I, T> {
    fn default() -> Self {
        Self::bare(Vec::new())
    }
}

impl<I, T: Clone> Clone for IndexMap<I, T> {
    fn clone(&self) -> Self {
        Self::bare(self.values.clone())
    }
}

impl<I, T: PartialEq> PartialEq for IndexMap<I, T> {
    fn eq(&self, other: &Self) -> bool {
        self.values == other.values
    }
}

impl<I, T: Eq> Eq for IndexMap<I, T> {}

impl<I, T: Hash> Hash for IndexMap<I, T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.values.hash(state);
    }
}

impl<I: Index, T> std::ops::Index<I> for IndexMap<I, T> {
    type Output = T;

    fn index(&self, index: I) -> &Self::Output {
        &self.values[index.value()]
    }
}

impl<I: Index, T> std::ops::IndexMut<I> for IndexMap<I, T> {
    fn index_mut(&mut self, index: I) -> &mut Self::Output {
        &mut self.values[index.value()]
    }
}

impl<I: Index + fmt::Debug, T: fmt::Debug> fmt::Debug for IndexMap<I, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self).finish()
    }
}

impl<I: Index, T> IntoIterator for IndexMap<I, T> {
    type Item = (I, T);
    type IntoIter = IntoIter<I, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter().enumerate().map(map_entry as fn(_) -> _)
    }
}

impl<'a, I: Index, T> IntoIterator for &'a IndexMap<I, T> {
    type Item = (I, &'a T);
    type IntoIter = Iter<'a, I, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<I: Index, T> FromIterator<T> for IndexMap<I, T> {
    fn from_iter<Iterable: IntoIterator<Item = T>>(values: Iterable) -> Self {
        Self::bare(values.into_iter().collect())
    }
}

fn map_entry<I: Index, T>((index, value): (usize, T)) -> (I, T) {
    (I::new(index), value)
}

pub type IntoIter<I, T> = Map<Enumerate<std::vec::IntoIter<T>>, fn((usize, T)) -> (I, T)>;
pub type Iter<'a, I, T> = Map<Enumerate<std::slice::Iter<'a, T>>, fn((usize, &'a T)) -> (I, &'a T)>;
pub type IterMut<'a, I, T> =
    Map<Enumerate<std::slice::IterMut<'a, T>>, fn((usize, &'a mut T)) -> (I, &'a mut T)>;

pub trait Index: Copy {
    fn new(index: usize) -> Self;

    fn value(self) -> usize;
}

/// Define a newtype index over `u32` implementing [`Index`].
///
/// # Examples
///
/// ```
/// index_map::index!(pub struct ItemIndex);
///
/// let mut map = index_map::IndexMap::<ItemIndex, &str>::new();
/// let index = map.insert("item");
/// assert_eq!(map[index], "item");
/// ```
#[macro_export]
macro_rules! index {
    ($( #[$attribute:meta] )* $visibility:vis struct $name:ident) => {
        $( #[$attribute] )*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        $visibility struct $name(u32);

        impl $crate::Index for $name {
            fn new(index: usize) -> Self {
                Self(u32::try_from(index).unwrap_or(u32::MAX))
            }

            fn value(self) -> usize {
                self.0 as usize
            }
        }

        impl ::std::fmt::Debug for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                write!(f, "{}#{}", stringify!($name), self.0)
            }
        }
    };
}
