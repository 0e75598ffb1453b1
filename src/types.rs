//! Core scalar types shared across the crate, per `spec.md` §3.

/// A bit offset, counted from the start of an IO space. Signed so that
/// negative biases and negative relative offsets are representable; a
/// space's maximum size is therefore 2^60 bytes.
pub type IosOff = i64;

/// Byte ordering used when assembling or disassembling a multi-bit value
/// across the bytes of a span.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Endian {
    /// Least-significant byte first.
    Lsb,
    /// Most-significant byte first.
    Msb,
}

/// Encoding used for negative values of a signed integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NegEncoding {
    /// Reserved: declared by the original format but not implemented here.
    /// Rejected at the API boundary rather than silently aliased to
    /// [`NegEncoding::Twos`], per `spec.md` §9 Design Notes.
    Ones,
    /// Two's complement. The only encoding the codec actually exercises.
    Twos,
}
