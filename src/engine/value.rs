//! 128-bit values and their canonical text form.

use std::fmt;

use uuid::Uuid;

/// Length of the canonical hyphenated text.
pub const UUID_TEXT_LEN: usize = 36;
/// Bytes a result occupies in an output arena: the text plus its terminator.
pub const UUID_RESULT_BYTES: usize = UUID_TEXT_LEN + 1;

const VARIANT_RFC4122: u8 = 0b1000_0000;

/// Generation scheme, encoded in the version nibble.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UuidVersion {
    TimeBased,
    Md5,
    Random,
    Sha1,
}

impl UuidVersion {
    #[must_use]
    pub const fn number(self) -> u8 {
        match self {
            UuidVersion::TimeBased => 1,
            UuidVersion::Md5 => 3,
            UuidVersion::Random => 4,
            UuidVersion::Sha1 => 5,
        }
    }
}

impl fmt::Display for UuidVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.number())
    }
}

/// Overwrite the version nibble and the variant bits of a raw value.
#[must_use]
pub(crate) fn stitch(mut bytes: [u8; 16], version: UuidVersion) -> Uuid {
    bytes[6] = (bytes[6] & 0x0f) | (version.number() << 4);
    bytes[8] = (bytes[8] & 0x3f) | VARIANT_RFC4122;
    Uuid::from_bytes(bytes)
}

/// Canonical lowercase 8-4-4-4-12 text, held inline.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct UuidText([u8; UUID_TEXT_LEN]);

impl UuidText {
    #[must_use]
    pub fn format(value: &Uuid) -> Self {
        let mut buf = [0u8; UUID_TEXT_LEN];
        value.hyphenated().encode_lower(&mut buf);
        Self(buf)
    }

    /// The text as `&str`. [`UuidText::format`] is the only constructor and
    /// fills the buffer with ASCII hex digits and hyphens, so the conversion
    /// cannot fail.
    #[must_use]
    pub fn as_str(&self) -> &str {
        match std::str::from_utf8(&self.0) {
            Ok(text) => text,
            Err(err) => unreachable!("UuidText buffer is not ASCII: {err}"),
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8; UUID_TEXT_LEN] {
        &self.0
    }
}

impl AsRef<str> for UuidText {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl fmt::Display for UuidText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl fmt::Debug for UuidText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("UuidText").field(&self.as_str()).finish()
    }
}
