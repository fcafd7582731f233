//! Request-lifetime cache of generator state.
//!
//! A [`Scope`] is owned by the task handling one request. It starts empty and
//! lazily fills two independent slots: the v1 [`ClockState`] and the resolved
//! v3/v5 namespaces keyed by their argument text. Dropping the scope releases
//! both. Generator calls take `&mut Scope`, so no call can overlap another on
//! the same scope or run after it ended.

use smallvec::SmallVec;

use crate::engine::clock::ClockState;
use crate::engine::namespace::{NamespaceRef, NamespaceResolver};
use crate::error::EngineError;

const INLINE_NAMESPACES: usize = 2;

#[derive(Debug, Default)]
pub struct Scope {
    clock: Option<ClockState>,
    namespaces: SmallVec<[(Box<str>, NamespaceRef); INLINE_NAMESPACES]>,
}

impl Scope {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the scope's clock state, creating it with `init` on first use.
    ///
    /// # Errors
    ///
    /// Propagates `init`'s error; the slot stays empty so a later call can retry.
    pub fn get_or_create_clock_state<F>(&mut self, init: F) -> Result<&mut ClockState, EngineError>
    where
        F: FnOnce() -> Result<ClockState, EngineError>,
    {
        let state = match self.clock.take() {
            Some(state) => state,
            None => init()?,
        };
        Ok(self.clock.insert(state))
    }

    /// Return the namespace cached for `arg`, resolving it on first use.
    ///
    /// # Errors
    ///
    /// Propagates the resolver's error; nothing is cached on failure.
    pub fn get_or_create_namespace(
        &mut self,
        arg: &str,
        resolver: &dyn NamespaceResolver,
    ) -> Result<NamespaceRef, EngineError> {
        if let Some((_, namespace)) = self.namespaces.iter().find(|(key, _)| key.as_ref() == arg) {
            return Ok(*namespace);
        }
        let namespace = resolver.resolve(arg)?;
        tracing::trace!(namespace_arg = arg, %namespace, "namespace cached in scope");
        self.namespaces.push((Box::from(arg), namespace));
        Ok(namespace)
    }

    #[must_use]
    pub fn has_clock_state(&self) -> bool {
        self.clock.is_some()
    }

    #[must_use]
    pub fn cached_namespace_count(&self) -> usize {
        self.namespaces.len()
    }

    /// End the scope explicitly. Equivalent to dropping it.
    pub fn end(self) {}
}

impl Drop for Scope {
    fn drop(&mut self) {
        tracing::trace!(
            clock_state = self.clock.is_some(),
            namespaces = self.namespaces.len(),
            "scope released"
        );
    }
}
