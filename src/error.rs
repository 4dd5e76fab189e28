use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SlotAlgebraError {
    #[error("Invalid dimension: expected {expected}, got {got}")]
    InvalidDimension {
        expected: usize,
        got: usize,
    },

    #[error("Invalid modulus: {modulus}")]
    InvalidModulus { modulus: u64 },

    #[error("{value} is not a prime")]
    NotPrime { value: u64 },

    #[error("p = {p} divides m = {m}")]
    NotCoprime { m: u64, p: u64 },

    #[error("Invalid exponent r = {r}: p^r must be at least p and fit in {max_bits} bits")]
    InvalidExponent { r: u32, max_bits: u32 },

    #[error("Polynomial is not irreducible modulo p")]
    NotIrreducible,

    #[error("Unsupported extension generator: {0}")]
    UnsupportedGenerator(String),

    #[error("Element is not invertible: {0}")]
    NotInvertible(String),

    #[error("Slot rings are built over different group structures")]
    MismatchedGroups,

    #[error("Mapping data belongs to the other ring representation")]
    RepresentationMismatch,

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),
}

pub type Result<T> = std::result::Result<T, SlotAlgebraError>;
