//! Bounded, request-lifetime output region.
//!
//! A [`Workspace`] owns a fixed byte buffer and is reused across requests. For
//! one request it lends an [`OutputArena`], which hands out front-of-buffer
//! space through [`OutputArena::try_reserve`]. A reservation only touches the
//! arena's bookkeeping when it is committed, so a failed or abandoned write
//! leaves the arena exactly as it was. Text committed to the arena borrows the
//! workspace and stays valid until the arena is dropped.

use crate::engine::value::UuidText;
use crate::error::EngineError;

/// Owned backing buffer for request arenas.
#[derive(Debug, Default)]
pub struct Workspace {
    buf: Box<[u8]>,
}

impl Workspace {
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity].into_boxed_slice(),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    /// Start a fresh arena over the whole buffer. Whatever a previous arena
    /// wrote is reclaimed here.
    pub fn arena(&mut self) -> OutputArena<'_> {
        OutputArena::new(&mut self.buf)
    }
}

#[derive(Debug)]
pub struct OutputArena<'a> {
    free: &'a mut [u8],
    capacity: usize,
}

impl<'a> OutputArena<'a> {
    #[must_use]
    pub fn new(buf: &'a mut [u8]) -> Self {
        let capacity = buf.len();
        Self {
            free: buf,
            capacity,
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[must_use]
    pub fn remaining(&self) -> usize {
        self.free.len()
    }

    #[must_use]
    pub fn used(&self) -> usize {
        self.capacity - self.free.len()
    }

    /// Reserve `len` bytes at the front of the free region, or `None` when
    /// the arena cannot hold them.
    pub fn try_reserve(&mut self, len: usize) -> Option<WriteHandle<'_, 'a>> {
        if len == 0 || len > self.free.len() {
            return None;
        }
        Some(WriteHandle { arena: self, len })
    }
}

/// Pending reservation. Dropping it without [`WriteHandle::commit`] gives the
/// space back untouched.
#[derive(Debug)]
pub struct WriteHandle<'r, 'a> {
    arena: &'r mut OutputArena<'a>,
    len: usize,
}

impl<'a> WriteHandle<'_, 'a> {
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Copy `text` and a NUL terminator into the reservation and commit all of
    /// it. Returns `None` (nothing committed) if the text plus terminator does
    /// not fit.
    pub fn commit(self, text: &str) -> Option<&'a str> {
        let WriteHandle { arena, len } = self;
        if text.len() >= len {
            return None;
        }
        let free = std::mem::take(&mut arena.free);
        let (reserved, rest) = free.split_at_mut(len);
        arena.free = rest;

        let (body, tail) = reserved.split_at_mut(text.len());
        body.copy_from_slice(text.as_bytes());
        tail.fill(0);
        std::str::from_utf8(body).ok()
    }
}

/// Place one UUID text in the arena, reserving exactly its length plus the
/// terminator.
///
/// # Errors
///
/// Returns [`EngineError::InsufficientCapacity`] without touching the arena
/// when fewer than `text.len() + 1` bytes are free.
pub fn write_text<'a>(
    arena: &mut OutputArena<'a>,
    text: &UuidText,
) -> Result<&'a str, EngineError> {
    let text = text.as_str();
    let required = text.len() + 1;
    let available = arena.remaining();
    arena
        .try_reserve(required)
        .and_then(|handle| handle.commit(text))
        .ok_or(EngineError::InsufficientCapacity {
            required,
            available,
        })
}

#[cfg(test)]
mod tests {
    use uuid::Uuid;

    use super::*;
    use crate::engine::value::{UUID_RESULT_BYTES, UUID_TEXT_LEN};

    fn sample_text(n: u128) -> UuidText {
        UuidText::format(&Uuid::from_u128(n))
    }

    #[test]
    fn write_reserves_text_plus_terminator() {
        let mut workspace = Workspace::with_capacity(100);
        let mut arena = workspace.arena();
        let first = write_text(&mut arena, &sample_text(1)).unwrap();
        assert_eq!(first.len(), UUID_TEXT_LEN);
        assert_eq!(arena.used(), UUID_RESULT_BYTES);

        let second = write_text(&mut arena, &sample_text(2)).unwrap();
        assert_eq!(arena.used(), 2 * UUID_RESULT_BYTES);
        assert_ne!(first, second);
        assert_eq!(first, sample_text(1).as_str());
    }

    #[test]
    fn terminator_follows_text() {
        let mut workspace = Workspace::with_capacity(UUID_RESULT_BYTES);
        {
            let mut arena = workspace.arena();
            write_text(&mut arena, &sample_text(u128::MAX)).unwrap();
            assert_eq!(arena.remaining(), 0);
        }
        assert_eq!(workspace.buf[UUID_TEXT_LEN], 0);
        assert_eq!(&workspace.buf[..8], b"ffffffff");
    }

    #[test]
    fn short_arena_fails_without_changing_free_count() {
        let mut workspace = Workspace::with_capacity(UUID_RESULT_BYTES + 10);
        let mut arena = workspace.arena();
        write_text(&mut arena, &sample_text(1)).unwrap();
        let before = arena.remaining();
        let err = write_text(&mut arena, &sample_text(2)).unwrap_err();
        assert_eq!(
            err,
            EngineError::InsufficientCapacity {
                required: UUID_RESULT_BYTES,
                available: 10
            }
        );
        assert_eq!(arena.remaining(), before);
    }

    #[test]
    fn exactly_text_length_is_not_enough() {
        let mut buf = [0u8; UUID_TEXT_LEN];
        let mut arena = OutputArena::new(&mut buf);
        assert!(write_text(&mut arena, &sample_text(3)).is_err());
        assert_eq!(arena.remaining(), UUID_TEXT_LEN);
    }

    #[test]
    fn abandoned_reservation_is_returned() {
        let mut buf = [0u8; 64];
        let mut arena = OutputArena::new(&mut buf);
        let handle = arena.try_reserve(40).unwrap();
        assert_eq!(handle.len(), 40);
        drop(handle);
        assert_eq!(arena.remaining(), 64);
        assert!(arena.try_reserve(65).is_none());
        assert!(arena.try_reserve(0).is_none());
    }

    #[test]
    fn oversized_commit_is_refused() {
        let mut buf = [0u8; 64];
        let mut arena = OutputArena::new(&mut buf);
        let handle = arena.try_reserve(4).unwrap();
        assert!(handle.commit("abcd").is_none());
        assert_eq!(arena.remaining(), 64);
    }

    #[test]
    fn new_arena_reclaims_workspace() {
        let mut workspace = Workspace::with_capacity(UUID_RESULT_BYTES);
        {
            let mut arena = workspace.arena();
            write_text(&mut arena, &sample_text(1)).unwrap();
        }
        let mut arena = workspace.arena();
        assert_eq!(arena.remaining(), UUID_RESULT_BYTES);
        assert!(write_text(&mut arena, &sample_text(2)).is_ok());
    }
}
