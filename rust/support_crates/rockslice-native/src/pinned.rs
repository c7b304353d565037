//! A cheaply cloneable, sliceable, immutable view into a native buffer.

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::ops::{Deref, RangeBounds};
use std::sync::Arc;

use rockslice_common::{Result, error::Error};

use crate::buffer::NativeBuffer;

/// A shared view of (a range of) a [`NativeBuffer`].
///
/// The view keeps the underlying storage alive, so it stays readable even after the
/// engine released the handle it was pinned from. Slicing and cloning do not copy.
#[derive(Clone)]
pub struct PinnedBuffer {
    inner: Arc<NativeBuffer>,
    offset: usize,
    len: usize,
}

impl PinnedBuffer {
    /// Pins the whole buffer.
    pub fn new(buffer: Arc<NativeBuffer>) -> PinnedBuffer {
        let len = buffer.len();
        PinnedBuffer {
            inner: buffer,
            offset: 0,
            len,
        }
    }

    /// Returns an empty view.
    pub fn empty() -> PinnedBuffer {
        PinnedBuffer::new(Arc::new(NativeBuffer::empty()))
    }

    /// Returns the length of the view.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Returns true if the view is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Returns the view as a `&[u8]`.
    #[inline]
    pub fn as_slice(&self) -> &[u8] {
        &self.inner[self.offset..self.offset + self.len]
    }

    /// Returns a sub-view, using a range relative to this view.
    ///
    /// # Panics
    ///
    /// Panics if the range is out of bounds.
    pub fn slice<R>(&self, range: R) -> PinnedBuffer
    where
        R: RangeBounds<usize>,
    {
        use std::ops::Bound::*;
        let start = match range.start_bound() {
            Included(&n) => n,
            Excluded(&n) => n + 1,
            Unbounded => 0,
        };
        let end = match range.end_bound() {
            Included(&n) => n + 1,
            Excluded(&n) => n,
            Unbounded => self.len,
        };
        assert!(start <= end && end <= self.len, "slice out of bounds");
        PinnedBuffer {
            inner: self.inner.clone(),
            offset: self.offset + start,
            len: end - start,
        }
    }

    /// Returns the view with its first `offset` bytes removed.
    ///
    /// Fails with `OffsetOutOfRange` if `offset` exceeds the length of the view.
    pub fn skip(&self, offset: usize) -> Result<PinnedBuffer> {
        if offset > self.len {
            return Err(Error::offset_out_of_range(offset, self.len));
        }
        Ok(self.slice(offset..))
    }

    /// Copies the view into a `Vec<u8>`.
    pub fn to_vec(&self) -> Vec<u8> {
        self.as_slice().to_vec()
    }

    /// Returns `true` if both views pin the same allocation.
    pub fn shares_storage(&self, other: &PinnedBuffer) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Deref for PinnedBuffer {
    type Target = [u8];

    #[inline]
    fn deref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl AsRef<[u8]> for PinnedBuffer {
    fn as_ref(&self) -> &[u8] {
        self.as_slice()
    }
}

impl Borrow<[u8]> for PinnedBuffer {
    fn borrow(&self) -> &[u8] {
        self.as_slice()
    }
}

impl fmt::Debug for PinnedBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PinnedBuffer").field(&self.as_slice()).finish()
    }
}

impl PartialEq for PinnedBuffer {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}
impl Eq for PinnedBuffer {}

impl PartialEq<[u8]> for PinnedBuffer {
    fn eq(&self, other: &[u8]) -> bool {
        self.as_slice() == other
    }
}

impl PartialOrd for PinnedBuffer {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for PinnedBuffer {
    fn cmp(&self, other: &Self) -> Ordering {
        self.as_slice().cmp(other.as_slice())
    }
}

impl Hash for PinnedBuffer {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.as_slice().hash(state)
    }
}

impl Default for PinnedBuffer {
    fn default() -> Self {
        PinnedBuffer::empty()
    }
}

impl From<NativeBuffer> for PinnedBuffer {
    fn from(buffer: NativeBuffer) -> Self {
        PinnedBuffer::new(Arc::new(buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pinned(data: &[u8]) -> PinnedBuffer {
        NativeBuffer::copy_from_slice(data, 64).unwrap().into()
    }

    #[test]
    fn basic_usage() {
        let p = pinned(b"hello world");
        assert_eq!(p.len(), 11);
        let sub = p.slice(6..);
        assert_eq!(&*sub, b"world");
        assert!(sub.shares_storage(&p));
        assert_eq!(sub.slice(1..3).as_slice(), b"or");
    }

    #[test]
    fn skip_bounds() {
        let p = pinned(b"abcd");
        assert_eq!(p.skip(0).unwrap().as_slice(), b"abcd");
        assert_eq!(p.skip(4).unwrap().len(), 0);
        assert!(p.skip(5).is_err());
    }

    #[test]
    #[should_panic]
    fn slice_out_of_bounds() {
        pinned(b"abc").slice(2..5);
    }

    #[test]
    fn ordering_is_bytewise() {
        assert!(pinned(b"ab") < pinned(b"abc"));
        assert!(pinned(b"b") > pinned(b"abc"));
        assert_eq!(pinned(b"xy"), pinned(b"xy"));
        assert!(pinned(b"xy") == *b"xy".as_slice());
    }

    #[test]
    fn empty_and_default() {
        let empty = PinnedBuffer::empty();
        assert!(empty.is_empty());
        assert_eq!(empty, PinnedBuffer::default());
    }
}
