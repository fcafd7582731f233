//! UUID generation engine.
//!
//! Callers hold one [`Scope`] and one [`OutputArena`] per request and pass a
//! [`UuidRequest`] to the shared [`Generator`]. The result is a 36-character
//! lowercase hyphenated string living in the arena.

pub mod arena;
pub mod clock;
pub mod generator;
pub mod namespace;
pub mod primitives;
pub mod scope;
pub mod value;

pub use arena::{write_text, OutputArena, Workspace, WriteHandle};
pub use clock::{Clock, ClockState, NodeId, NodePolicy, SystemClock};
pub use generator::{Generator, GeneratorBuilder, UuidRequest};
pub use namespace::{resolve_namespace, NamespaceRef, NamespaceResolver, StandardResolver};
pub use primitives::{FastRandom, OsRandom, PrimitiveError, RandomSource};
pub use scope::Scope;
pub use value::{UuidText, UuidVersion, UUID_RESULT_BYTES, UUID_TEXT_LEN};
