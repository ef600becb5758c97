use core::fmt;

/// The closed set of document node kinds.
///
/// Every concrete reader and writer node is positioned at exactly one of
/// these kinds; [`Document`](crate::Document) reifies the union at run time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    /// No payload; CBOR `undefined`.
    Undefined,
    /// No payload.
    Null,
    /// `true` or `false`.
    Boolean,
    /// 64-bit nonnegative integer.
    UnsignedInt,
    /// 64-bit signed integer; negative values only (nonnegative integers use
    /// [`Tag::UnsignedInt`]).
    SignedInt,
    /// 64-bit IEEE-754.
    FloatingPoint,
    /// Lazy finite sequence of bytes, single-pass.
    ByteString,
    /// Lazy finite sequence of UTF-8 bytes, single-pass.
    TextString,
    /// Lazy finite sequence of documents, single-pass.
    Array,
    /// Lazy finite sequence of (key document, value document) pairs.
    Map,
}

impl Tag {
    /// Stable lower-case name of the kind.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "null",
            Self::Boolean => "boolean",
            Self::UnsignedInt => "unsigned_int",
            Self::SignedInt => "signed_int",
            Self::FloatingPoint => "floating_point",
            Self::ByteString => "byte_string",
            Self::TextString => "text_string",
            Self::Array => "array",
            Self::Map => "map",
        }
    }
}

impl fmt::Display for Tag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
