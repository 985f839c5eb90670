//! Error handling.
//!
//! This is a private module. Its public items are re-exported by the parent.

use thiserror::Error;


//------------ Error ---------------------------------------------------------

/// An error produced while operating on an ASN.1 tree.
///
/// Every entry point of the crate reports its failure through this type.
/// Malformed or oversized input never aborts the process; it always surfaces
/// here.
///
/// One variant is special: [`Error::Capacity`] is a negotiation rather than
/// a terminal failure. It is returned when a caller-provided buffer is too
/// small and carries the exact number of bytes the operation needs, so the
/// caller can retry with a buffer of that size.
#[derive(Clone, Copy, Debug, Eq, Error, PartialEq)]
pub enum Error {
    /// A path did not resolve to an element, or a CHOICE alternative is
    /// unknown, or the addressed element cannot hold a value.
    #[error("element not found")]
    ElementNotFound,

    /// The element holds no value and declares no applicable DEFAULT.
    #[error("value not found")]
    ValueNotFound,

    /// The supplied value violates the format rules of the element's type.
    #[error("value not valid")]
    ValueNotValid,

    /// The caller-provided buffer is too small.
    ///
    /// `required` is the exact size in bytes that would have sufficed.
    #[error("buffer too small, {required} bytes required")]
    Capacity {
        required: usize,
    },

    /// A value buffer could not be allocated.
    #[error("memory allocation failed")]
    Alloc,

    /// A DER length field or value encoding is malformed.
    #[error("malformed DER encoding")]
    Der,

    /// A DER length field exceeds the representable range.
    #[error("DER length overflow")]
    DerOverflow,

    /// A structural precondition was violated.
    #[error("generic error")]
    Generic,
}

impl Error {
    /// Returns the stable display name of the error code.
    ///
    /// These names never change between releases and are intended for
    /// logging and for mapping to foreign error tables.
    pub fn name(self) -> &'static str {
        match self {
            Error::ElementNotFound => "ELEMENT_NOT_FOUND",
            Error::ValueNotFound => "VALUE_NOT_FOUND",
            Error::ValueNotValid => "VALUE_NOT_VALID",
            Error::Capacity { .. } => "MEM_ERROR",
            Error::Alloc => "MEM_ALLOC_ERROR",
            Error::Der => "DER_ERROR",
            Error::DerOverflow => "DER_OVERFLOW",
            Error::Generic => "GENERIC_ERROR",
        }
    }
}


//============ Tests =========================================================
