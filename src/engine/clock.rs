//! Time-based (v1) state: timestamp source, clock sequence and node id.

use std::fmt;
use std::str::FromStr;
use std::time::{SystemTime, UNIX_EPOCH};

use crate::engine::primitives::{PrimitiveError, RandomSource};

/// 100ns intervals between 1582-10-15 and 1970-01-01.
pub const GREGORIAN_UNIX_OFFSET_TICKS: u64 = 0x01B2_1DD2_1381_4000;

const TIMESTAMP_MASK: u64 = 0x0FFF_FFFF_FFFF_FFFF;
const CLOCK_SEQ_MASK: u16 = 0x3FFF;
const NODE_MULTICAST_BIT: u8 = 0x01;

/// Source of v1 timestamps, in 100ns ticks since the Gregorian epoch.
pub trait Clock: Send + Sync {
    fn now_ticks(&self) -> u64;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ticks(&self) -> u64 {
        let since_unix = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default();
        let ticks = u64::try_from(since_unix.as_nanos() / 100).unwrap_or(u64::MAX);
        ticks.saturating_add(GREGORIAN_UNIX_OFFSET_TICKS) & TIMESTAMP_MASK
    }
}

/// 48-bit node identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId([u8; 6]);

impl NodeId {
    #[must_use]
    pub const fn from_bytes(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    #[must_use]
    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// Random node id with the multicast bit set, so it can never collide
    /// with a real IEEE 802 address.
    ///
    /// # Errors
    ///
    /// Propagates the random source's failure.
    pub fn random(random: &dyn RandomSource) -> Result<Self, PrimitiveError> {
        let mut bytes = [0u8; 6];
        random.fill(&mut bytes)?;
        bytes[0] |= NODE_MULTICAST_BIT;
        Ok(Self(bytes))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl fmt::Debug for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NodeId({self})")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid node id '{0}': expected 12 hex digits, optionally colon separated")]
pub struct ParseNodeIdError(String);

impl FromStr for NodeId {
    type Err = ParseNodeIdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseNodeIdError(s.to_string());
        let trimmed = s.trim();
        let digits: Vec<u8> = if trimmed.contains(':') {
            let groups: Vec<&str> = trimmed.split(':').collect();
            if groups.len() != 6 || groups.iter().any(|group| group.len() != 2) {
                return Err(invalid());
            }
            groups.concat().into_bytes()
        } else {
            trimmed.as_bytes().to_vec()
        };
        if digits.len() != 12 {
            return Err(invalid());
        }

        let mut bytes = [0u8; 6];
        for (slot, pair) in bytes.iter_mut().zip(digits.chunks_exact(2)) {
            let hi = hex_value(pair[0]).ok_or_else(invalid)?;
            let lo = hex_value(pair[1]).ok_or_else(invalid)?;
            *slot = (hi << 4) | lo;
        }
        Ok(Self(bytes))
    }
}

fn hex_value(digit: u8) -> Option<u8> {
    match digit {
        b'0'..=b'9' => Some(digit - b'0'),
        b'a'..=b'f' => Some(digit - b'a' + 10),
        b'A'..=b'F' => Some(digit - b'A' + 10),
        _ => None,
    }
}

/// Where v1 node ids come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodePolicy {
    /// One random id drawn when the generator is built.
    Process,
    /// A fresh random id for every scope's clock state.
    Scope,
    /// Operator-supplied id.
    Fixed(NodeId),
}

/// Timestamp, clock sequence and node to encode into one v1 value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct V1Fields {
    pub ticks: u64,
    pub clock_seq: u16,
    pub node: NodeId,
}

impl V1Fields {
    /// Lay the fields out in RFC4122 byte order, version and variant bits
    /// left for stitching.
    #[must_use]
    pub fn to_bytes(&self) -> [u8; 16] {
        let time_low = (self.ticks & 0xFFFF_FFFF) as u32;
        let time_mid = ((self.ticks >> 32) & 0xFFFF) as u16;
        let time_hi = ((self.ticks >> 48) & 0x0FFF) as u16;

        let mut bytes = [0u8; 16];
        bytes[0..4].copy_from_slice(&time_low.to_be_bytes());
        bytes[4..6].copy_from_slice(&time_mid.to_be_bytes());
        bytes[6..8].copy_from_slice(&time_hi.to_be_bytes());
        bytes[8..10].copy_from_slice(&(self.clock_seq & CLOCK_SEQ_MASK).to_be_bytes());
        bytes[10..16].copy_from_slice(self.node.as_bytes());
        bytes
    }
}

/// Per-scope v1 state.
#[derive(Debug, Clone)]
pub struct ClockState {
    clock_seq: u16,
    node: NodeId,
    last_ticks: Option<u64>,
}

impl ClockState {
    #[must_use]
    pub fn new(clock_seq: u16, node: NodeId) -> Self {
        Self {
            clock_seq: clock_seq & CLOCK_SEQ_MASK,
            node,
            last_ticks: None,
        }
    }

    /// Seed the clock sequence from `random`.
    ///
    /// # Errors
    ///
    /// Propagates the random source's failure.
    pub fn seeded(random: &dyn RandomSource, node: NodeId) -> Result<Self, PrimitiveError> {
        let mut seed = [0u8; 2];
        random.fill(&mut seed)?;
        Ok(Self::new(u16::from_be_bytes(seed), node))
    }

    /// Issue fields for timestamp `now`. A timestamp that does not advance past
    /// the last one issued bumps the clock sequence instead of repeating a pair.
    pub fn advance(&mut self, now: u64) -> V1Fields {
        let now = now & TIMESTAMP_MASK;
        if self.last_ticks.is_some_and(|last| now <= last) {
            self.clock_seq = self.clock_seq.wrapping_add(1) & CLOCK_SEQ_MASK;
        }
        self.last_ticks = Some(now);
        V1Fields {
            ticks: now,
            clock_seq: self.clock_seq,
            node: self.node,
        }
    }

    #[must_use]
    pub fn clock_seq(&self) -> u16 {
        self.clock_seq
    }

    #[must_use]
    pub fn node(&self) -> NodeId {
        self.node
    }
}
