//! Parameter sets for building group structures and slot rings
//!
//! The crate does not choose cryptographic parameters; `AlgebraParams` only
//! validates a caller-supplied (m, p, r) and builds the objects for it.

use std::sync::Arc;

use crate::arith::{checked_prime_power, is_prime, MAX_MODULUS_BITS};
use crate::error::{Result, SlotAlgebraError};
use crate::group::GroupStructure;
use crate::variant::RingVariant;

/// Validated (m, p, r)
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AlgebraParams {
    /// Cyclotomic index
    pub m: u64,
    /// Plaintext prime, coprime to m
    pub p: u64,
    /// Plaintext modulus exponent, the slots live over Z/p^r
    pub r: u32,
}

impl Default for AlgebraParams {
    /// m = 15, p = 2, r = 1: two slots of GF(16)
    fn default() -> Self {
        Self { m: 15, p: 2, r: 1 }
    }
}

impl AlgebraParams {
    pub fn new(m: u64, p: u64, r: u32) -> Result<Self> {
        if m < 2 {
            return Err(SlotAlgebraError::InvalidParameters(format!("m = {} must be at least 2", m)));
        }
        if !is_prime(p) {
            return Err(SlotAlgebraError::NotPrime { value: p });
        }
        if m % p == 0 {
            return Err(SlotAlgebraError::NotCoprime { m, p });
        }
        if checked_prime_power(p, r).is_none() {
            return Err(SlotAlgebraError::InvalidExponent {
                r,
                max_bits: MAX_MODULUS_BITS,
            });
        }
        Ok(Self { m, p, r })
    }

    /// m = 341 = 11·31, p = 2, r = 1: 30 slots of GF(2^10)
    pub fn standard() -> Self {
        Self { m: 341, p: 2, r: 1 }
    }

    /// Whether the slot ring uses the GF(2) representation
    pub fn is_binary(&self) -> bool {
        self.p == 2 && self.r == 1
    }

    pub fn build_group(&self) -> Result<Arc<GroupStructure>> {
        Ok(Arc::new(GroupStructure::new(self.m, self.p)?))
    }

    /// Builds the group structure and the slot ring over it
    pub fn build_ring(&self) -> Result<RingVariant> {
        RingVariant::new(self.build_group()?, self.r)
    }
}
