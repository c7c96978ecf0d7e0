use bitflags::bitflags;

bitflags! {
    /// Usage contexts a single interned string has been seen in.
    ///
    /// A string can carry more than one role at once (e.g. a category name
    /// that is also used as a thread name); the table ORs roles together on
    /// every `intern` call rather than keeping per-role duplicates.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    #[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
    pub struct StringRole: u8 {
        const CATEGORY  = 0b0001;
        const THREAD    = 0b0010;
        const FORMAT    = 0b0100;
        const ARG_VALUE = 0b1000;
    }
}

/// The id reserved, by convention, for the empty string.
pub const EMPTY_STRING_ID: u32 = 0;

/// A deduplicated string plus the roles it has been used in, as stored in
/// the catalog's string table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexedString {
    pub bytes: Vec<u8>,
    pub roles: StringRole,
}

impl IndexedString {
    pub fn new(bytes: Vec<u8>, roles: StringRole) -> Self {
        Self { bytes, roles }
    }

    pub fn as_str_lossy(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.bytes)
    }
}
