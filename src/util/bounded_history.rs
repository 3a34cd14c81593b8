use std::collections::{VecDeque, vec_deque};

/// A fixed-capacity, insertion-ordered history.
/// This structure uses a `VecDeque` internally and maintains a maximum size.
/// When the maximum size is exceeded, the oldest element (at the front) is evicted.
#[derive(Debug, Clone)]
pub struct BoundedHistory<T> {
    /// `VecDeque` holding the entries, oldest first
    list: VecDeque<T>,
    /// `size` represents the maximum length of the queue
    size: usize,
}

impl<T> BoundedHistory<T> {
    /// Creates a new `BoundedHistory` with the specified maximum size.
    ///
    /// # Arguments
    /// * `size` - The maximum number of elements the history can hold.
    ///
    /// # Returns
    /// A new, empty `BoundedHistory` instance.
    pub fn new(size: usize) -> Self { Self { list: VecDeque::with_capacity(size), size } }

    /// Appends an element as the newest entry.
    ///
    /// If the size limit is exceeded, the oldest entry is evicted and returned.
    ///
    /// # Arguments
    /// * `item` - The element to be appended.
    ///
    /// # Returns
    /// The evicted element, if any.
    pub fn push(&mut self, item: T) -> Option<T> {
        self.list.push_back(item);
        if self.len() > self.size { self.list.pop_front() } else { None }
    }

    /// Returns a reference to the newest element, if present.
    pub fn latest(&self) -> Option<&T> { self.list.back() }

    /// Iterates over the entries from oldest to newest.
    pub fn iter(&self) -> vec_deque::Iter<'_, T> { self.list.iter() }

    /// Returns the current number of elements.
    pub fn len(&self) -> usize { self.list.len() }

    /// Returns the maximum number of elements.
    pub fn size(&self) -> usize { self.size }

    /// Checks whether the history holds no elements.
    pub fn is_empty(&self) -> bool { self.list.is_empty() }

    /// Checks whether the history reached its capacity.
    pub fn is_full(&self) -> bool { self.list.len() >= self.size }
}

impl<T: Clone> BoundedHistory<T> {
    /// Copies the entries into a `Vec`, oldest first.
    pub fn to_vec(&self) -> Vec<T> { self.list.iter().cloned().collect() }
}
