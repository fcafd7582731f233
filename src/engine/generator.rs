use std::fmt;

use crate::engine::arena::{write_text, OutputArena};
use crate::engine::clock::{Clock, ClockState, NodeId, NodePolicy, SystemClock};
use crate::engine::namespace::{NamespaceResolver, StandardResolver};
use crate::engine::primitives::{NameHash, OsRandom, RandomSource};
use crate::engine::scope::Scope;
use crate::engine::value::{stitch, UuidText, UuidVersion, UUID_RESULT_BYTES};
use crate::error::EngineError;

/// One UUID request, tagged by version. `Default` is the v1 alias.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UuidRequest<'a> {
    #[default]
    V1,
    V3 {
        namespace: &'a str,
        name: &'a str,
    },
    V4,
    V5 {
        namespace: &'a str,
        name: &'a str,
    },
}

impl UuidRequest<'_> {
    #[must_use]
    pub fn version(&self) -> UuidVersion {
        match self {
            UuidRequest::V1 => UuidVersion::TimeBased,
            UuidRequest::V3 { .. } => UuidVersion::Md5,
            UuidRequest::V4 => UuidVersion::Random,
            UuidRequest::V5 { .. } => UuidVersion::Sha1,
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum NodeSource {
    Shared(NodeId),
    PerScope,
}

/// Builds a [`Generator`] from its primitives.
pub struct GeneratorBuilder {
    node_policy: NodePolicy,
    random: Box<dyn RandomSource>,
    clock: Box<dyn Clock>,
    resolver: Box<dyn NamespaceResolver>,
}

impl Default for GeneratorBuilder {
    fn default() -> Self {
        Self {
            node_policy: NodePolicy::Process,
            random: Box::new(OsRandom),
            clock: Box::new(SystemClock),
            resolver: Box::new(StandardResolver),
        }
    }
}

impl GeneratorBuilder {
    #[must_use]
    pub fn node_policy(mut self, node_policy: NodePolicy) -> Self {
        self.node_policy = node_policy;
        self
    }

    #[must_use]
    pub fn random_source(mut self, random: impl RandomSource + 'static) -> Self {
        self.random = Box::new(random);
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: impl Clock + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    #[must_use]
    pub fn resolver(mut self, resolver: impl NamespaceResolver + 'static) -> Self {
        self.resolver = Box::new(resolver);
        self
    }

    /// # Errors
    ///
    /// Returns [`EngineError::PrimitiveFailure`] when the process-wide node id
    /// cannot be drawn from the random source.
    pub fn build(self) -> Result<Generator, EngineError> {
        let node = match self.node_policy {
            NodePolicy::Process => NodeSource::Shared(NodeId::random(self.random.as_ref())?),
            NodePolicy::Fixed(node) => NodeSource::Shared(node),
            NodePolicy::Scope => NodeSource::PerScope,
        };
        Ok(Generator {
            node,
            random: self.random,
            clock: self.clock,
            resolver: self.resolver,
        })
    }
}

/// Produces UUID values. Shared by every request; all per-request state lives
/// in the caller's [`Scope`].
pub struct Generator {
    node: NodeSource,
    random: Box<dyn RandomSource>,
    clock: Box<dyn Clock>,
    resolver: Box<dyn NamespaceResolver>,
}

impl fmt::Debug for Generator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Generator")
            .field("node", &self.node)
            .field("random", &self.random.name())
            .finish_non_exhaustive()
    }
}

impl Generator {
    #[must_use]
    pub fn builder() -> GeneratorBuilder {
        GeneratorBuilder::default()
    }

    /// Generator with the OS random source, the system clock and a
    /// process-wide node id.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PrimitiveFailure`] when no node id can be drawn.
    pub fn new() -> Result<Self, EngineError> {
        GeneratorBuilder::default().build()
    }

    #[must_use]
    pub fn random_source_name(&self) -> &'static str {
        self.random.name()
    }

    /// The node id shared by all scopes, or `None` when each scope draws its own.
    #[must_use]
    pub fn shared_node(&self) -> Option<NodeId> {
        match self.node {
            NodeSource::Shared(node) => Some(node),
            NodeSource::PerScope => None,
        }
    }

    /// Dispatch on the request's version.
    ///
    /// # Errors
    ///
    /// See the per-version operations.
    pub fn generate(
        &self,
        scope: &mut Scope,
        request: &UuidRequest<'_>,
    ) -> Result<UuidText, EngineError> {
        match *request {
            UuidRequest::V1 => self.generate_v1(scope),
            UuidRequest::V3 { namespace, name } => self.generate_v3(scope, namespace, name),
            UuidRequest::V4 => self.generate_v4(),
            UuidRequest::V5 { namespace, name } => self.generate_v5(scope, namespace, name),
        }
    }

    /// Generate into `arena`. Capacity is checked before any scope state is
    /// touched, and the arena is unchanged on every error path.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InsufficientCapacity`] when the arena has fewer
    /// than 37 free bytes, or the generation error.
    pub fn write<'a>(
        &self,
        scope: &mut Scope,
        arena: &mut OutputArena<'a>,
        request: &UuidRequest<'_>,
    ) -> Result<&'a str, EngineError> {
        let available = arena.remaining();
        if available < UUID_RESULT_BYTES {
            return Err(EngineError::InsufficientCapacity {
                required: UUID_RESULT_BYTES,
                available,
            });
        }
        let text = self.generate(scope, request)?;
        write_text(arena, &text)
    }

    /// Time-based value. The scope's clock state is created on first use and
    /// reused afterwards.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PrimitiveFailure`] when seeding the clock state
    /// fails.
    pub fn generate_v1(&self, scope: &mut Scope) -> Result<UuidText, EngineError> {
        let now = self.clock.now_ticks();
        let state = scope.get_or_create_clock_state(|| self.new_clock_state())?;
        let fields = state.advance(now);
        Ok(finish(stitch(fields.to_bytes(), UuidVersion::TimeBased)))
    }

    /// MD5 name-based value.
    ///
    /// # Errors
    ///
    /// [`EngineError::MissingArgument`] for an empty namespace or name,
    /// [`EngineError::InvalidNamespace`] when the namespace does not resolve.
    pub fn generate_v3(
        &self,
        scope: &mut Scope,
        namespace: &str,
        name: &str,
    ) -> Result<UuidText, EngineError> {
        self.generate_name_based(scope, namespace, name, NameHash::Md5, UuidVersion::Md5)
    }

    /// Random value; needs no scope state.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::PrimitiveFailure`] when the random source fails.
    pub fn generate_v4(&self) -> Result<UuidText, EngineError> {
        let mut bytes = [0u8; 16];
        self.random.fill(&mut bytes)?;
        Ok(finish(stitch(bytes, UuidVersion::Random)))
    }

    /// SHA1 name-based value.
    ///
    /// # Errors
    ///
    /// Same as [`Generator::generate_v3`].
    pub fn generate_v5(
        &self,
        scope: &mut Scope,
        namespace: &str,
        name: &str,
    ) -> Result<UuidText, EngineError> {
        self.generate_name_based(scope, namespace, name, NameHash::Sha1, UuidVersion::Sha1)
    }

    /// Alias for [`Generator::generate_v1`].
    ///
    /// # Errors
    ///
    /// Same as [`Generator::generate_v1`].
    pub fn generate_default(&self, scope: &mut Scope) -> Result<UuidText, EngineError> {
        self.generate_v1(scope)
    }

    fn generate_name_based(
        &self,
        scope: &mut Scope,
        namespace: &str,
        name: &str,
        hash: NameHash,
        version: UuidVersion,
    ) -> Result<UuidText, EngineError> {
        if namespace.is_empty() {
            return Err(EngineError::MissingArgument("namespace"));
        }
        if name.is_empty() {
            return Err(EngineError::MissingArgument("name"));
        }
        let namespace = scope.get_or_create_namespace(namespace, self.resolver.as_ref())?;
        let digest = hash.digest(namespace.as_uuid(), name.as_bytes());
        Ok(finish(stitch(digest, version)))
    }

    fn new_clock_state(&self) -> Result<ClockState, EngineError> {
        let node = match self.node {
            NodeSource::Shared(node) => node,
            NodeSource::PerScope => NodeId::random(self.random.as_ref())?,
        };
        Ok(ClockState::seeded(self.random.as_ref(), node)?)
    }
}

fn finish(value: uuid::Uuid) -> UuidText {
    let text = UuidText::format(&value);
    tracing::debug!(version = value.get_version_num(), uuid = %text, "uuid generated");
    text
}
