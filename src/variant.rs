//! Representation-neutral handle over the two slot ring representations
//!
//! `RingVariant` picks GF(2) coefficients for p = 2, r = 1 and Z/p^r
//! coefficients otherwise. All operations take and return coefficient vectors
//! `Vec<u64>`, constant term first, with canonical residues in [0, p^r) and
//! no trailing zeros, so surrounding code never needs to know which
//! representation is active.

use std::sync::Arc;

use feanor_math::rings::zn::zn_64::Zn;
use num_bigint::BigInt;
use tracing::debug;

use crate::error::{Result, SlotAlgebraError};
use crate::field::{Gf2, RepresentationTag};
use crate::group::GroupStructure;
use crate::mapping::SlotMapping;
use crate::slot_ring::{same_group, SlotRing};

#[derive(Clone, Debug)]
pub enum RingVariant {
    Binary(SlotRing<Gf2>),
    PrimePower(SlotRing<Zn>),
}

/// A slot mapping produced by one of the two representations
pub enum VariantMapping {
    Binary(SlotMapping<Gf2>, Vec<u64>),
    PrimePower(SlotMapping<Zn>, Vec<u64>),
}

impl VariantMapping {
    pub fn tag(&self) -> RepresentationTag {
        match self {
            VariantMapping::Binary(..) => RepresentationTag::Binary,
            VariantMapping::PrimePower(..) => RepresentationTag::PrimePower,
        }
    }

    pub fn deg_g(&self) -> usize {
        match self {
            VariantMapping::Binary(m, _) => m.deg_g(),
            VariantMapping::PrimePower(m, _) => m.deg_g(),
        }
    }

    /// The monic extension generator G with residues in [0, p^r)
    pub fn g(&self) -> &[u64] {
        match self {
            VariantMapping::Binary(_, g) | VariantMapping::PrimePower(_, g) => g,
        }
    }
}

/// Runs one expression against whichever slot ring is active
macro_rules! dispatch {
    ($self:expr, $ring:ident => $body:expr) => {
        match $self {
            RingVariant::Binary($ring) => $body,
            RingVariant::PrimePower($ring) => $body,
        }
    };
}

impl RingVariant {
    /// Builds the slot ring for exponent `r` over `group`
    pub fn new(group: Arc<GroupStructure>, r: u32) -> Result<Self> {
        let variant = if group.p() == 2 && r == 1 {
            RingVariant::Binary(SlotRing::new(group, r)?)
        } else {
            RingVariant::PrimePower(SlotRing::new(group, r)?)
        };
        debug!(tag = ?variant.tag(), "selected slot ring representation");
        Ok(variant)
    }

    pub fn tag(&self) -> RepresentationTag {
        match self {
            RingVariant::Binary(_) => RepresentationTag::Binary,
            RingVariant::PrimePower(_) => RepresentationTag::PrimePower,
        }
    }

    pub fn as_binary(&self) -> Option<&SlotRing<Gf2>> {
        match self {
            RingVariant::Binary(ring) => Some(ring),
            RingVariant::PrimePower(_) => None,
        }
    }

    pub fn as_prime_power(&self) -> Option<&SlotRing<Zn>> {
        match self {
            RingVariant::PrimePower(ring) => Some(ring),
            RingVariant::Binary(_) => None,
        }
    }

    pub fn group(&self) -> &Arc<GroupStructure> {
        dispatch!(self, ring => ring.group())
    }

    pub fn r(&self) -> u32 {
        dispatch!(self, ring => ring.r())
    }

    pub fn p_pow_r(&self) -> u64 {
        dispatch!(self, ring => ring.p_pow_r())
    }

    pub fn n_slots(&self) -> usize {
        dispatch!(self, ring => ring.n_slots())
    }

    pub fn phi_m_mod(&self) -> Vec<u64> {
        dispatch!(self, ring => ring.to_residues(ring.phi_m_mod()))
    }

    pub fn factors(&self) -> Vec<Vec<u64>> {
        dispatch!(self, ring => ring.factors().iter().map(|f| ring.to_residues(f)).collect())
    }

    pub fn factors_over_integers(&self) -> &[Vec<BigInt>] {
        dispatch!(self, ring => ring.factors_over_integers())
    }

    pub fn crt_coefficients(&self) -> Vec<Vec<u64>> {
        dispatch!(self, ring => ring.crt_coefficients().iter().map(|c| ring.to_residues(c)).collect())
    }

    pub fn crt_decompose(&self, h: &[u64]) -> Vec<Vec<u64>> {
        dispatch!(self, ring => {
            let values = ring.crt_decompose(&ring.from_residues(h));
            values.iter().map(|v| ring.to_residues(v)).collect()
        })
    }

    pub fn crt_reconstruct(&self, values: &[Vec<u64>]) -> Result<Vec<u64>> {
        dispatch!(self, ring => {
            let values: Vec<_> = values.iter().map(|v| ring.from_residues(v)).collect();
            Ok(ring.to_residues(&ring.crt_reconstruct(&values)?))
        })
    }

    pub fn map_to_slots(&self, g: &[u64]) -> Result<VariantMapping> {
        match self {
            RingVariant::Binary(ring) => {
                let mapping = ring.map_to_slots(&ring.from_residues(g))?;
                let g = ring.to_residues(mapping.g());
                Ok(VariantMapping::Binary(mapping, g))
            }
            RingVariant::PrimePower(ring) => {
                let mapping = ring.map_to_slots(&ring.from_residues(g))?;
                let g = ring.to_residues(mapping.g());
                Ok(VariantMapping::PrimePower(mapping, g))
            }
        }
    }

    pub fn embed_in_slots(&self, values: &[Vec<u64>], mapping: &VariantMapping) -> Result<Vec<u64>> {
        match (self, mapping) {
            (RingVariant::Binary(ring), VariantMapping::Binary(map, _)) => {
                let values: Vec<_> = values.iter().map(|v| ring.from_residues(v)).collect();
                Ok(ring.to_residues(&ring.embed_in_slots(&values, map)?))
            }
            (RingVariant::PrimePower(ring), VariantMapping::PrimePower(map, _)) => {
                let values: Vec<_> = values.iter().map(|v| ring.from_residues(v)).collect();
                Ok(ring.to_residues(&ring.embed_in_slots(&values, map)?))
            }
            _ => Err(SlotAlgebraError::RepresentationMismatch),
        }
    }

    pub fn embed_in_all_slots(&self, value: &[u64], mapping: &VariantMapping) -> Result<Vec<u64>> {
        self.embed_in_slots(&vec![value.to_vec(); self.n_slots()], mapping)
    }

    pub fn decode_plaintext(&self, h: &[u64], mapping: &VariantMapping) -> Result<Vec<Vec<u64>>> {
        match (self, mapping) {
            (RingVariant::Binary(ring), VariantMapping::Binary(map, _)) => {
                let values = ring.decode_plaintext(&ring.from_residues(h), map)?;
                Ok(values.iter().map(|v| ring.to_residues(v)).collect())
            }
            (RingVariant::PrimePower(ring), VariantMapping::PrimePower(map, _)) => {
                let values = ring.decode_plaintext(&ring.from_residues(h), map)?;
                Ok(values.iter().map(|v| ring.to_residues(v)).collect())
            }
            _ => Err(SlotAlgebraError::RepresentationMismatch),
        }
    }

    pub fn build_lin_poly_coeffs(&self, l: &[Vec<u64>], mapping: &VariantMapping) -> Result<Vec<Vec<u64>>> {
        match (self, mapping) {
            (RingVariant::Binary(ring), VariantMapping::Binary(map, _)) => {
                let l: Vec<_> = l.iter().map(|v| ring.from_residues(v)).collect();
                let c = ring.build_lin_poly_coeffs(&l, map)?;
                Ok(c.iter().map(|v| ring.to_residues(v)).collect())
            }
            (RingVariant::PrimePower(ring), VariantMapping::PrimePower(map, _)) => {
                let l: Vec<_> = l.iter().map(|v| ring.from_residues(v)).collect();
                let c = ring.build_lin_poly_coeffs(&l, map)?;
                Ok(c.iter().map(|v| ring.to_residues(v)).collect())
            }
            _ => Err(SlotAlgebraError::RepresentationMismatch),
        }
    }

    /// Evaluates the linearized polynomial with coefficients `coeffs` at `h`
    pub fn apply_lin_poly(&self, coeffs: &[Vec<u64>], h: &[u64], mapping: &VariantMapping) -> Result<Vec<u64>> {
        match (self, mapping) {
            (RingVariant::Binary(ring), VariantMapping::Binary(map, _)) => {
                let coeffs: Vec<_> = coeffs.iter().map(|v| ring.from_residues(v)).collect();
                Ok(ring.to_residues(&ring.apply_lin_poly(&coeffs, &ring.from_residues(h), map)?))
            }
            (RingVariant::PrimePower(ring), VariantMapping::PrimePower(map, _)) => {
                let coeffs: Vec<_> = coeffs.iter().map(|v| ring.from_residues(v)).collect();
                Ok(ring.to_residues(&ring.apply_lin_poly(&coeffs, &ring.from_residues(h), map)?))
            }
            _ => Err(SlotAlgebraError::RepresentationMismatch),
        }
    }

    pub fn gen_crt_table(&self) -> Vec<Vec<u64>> {
        dispatch!(self, ring => ring.gen_crt_table().iter().map(|e| ring.to_residues(e)).collect())
    }

    pub fn gen_mask_table(&self) -> Vec<Vec<Vec<u64>>> {
        dispatch!(self, ring => ring
            .gen_mask_table()
            .iter()
            .map(|row| row.iter().map(|e| ring.to_residues(e)).collect())
            .collect())
    }

    pub fn prepare(&self) {
        dispatch!(self, ring => ring.prepare())
    }

    /// Replaces this variant with a copy of `other`, which must share the group
    pub fn assign_from(&mut self, other: &Self) -> Result<()> {
        if !same_group(self.group(), other.group()) {
            return Err(SlotAlgebraError::MismatchedGroups);
        }
        *self = other.clone();
        Ok(())
    }
}

/// Two variants are equal when both sides use the same group structure and
/// the same exponent r. The legacy comparison checked one side's group
/// structure against itself, so it held for any two variants with equal r;
/// this impl compares the structures of both sides on purpose.
impl PartialEq for RingVariant {
    fn eq(&self, other: &Self) -> bool {
        same_group(self.group(), other.group()) && self.r() == other.r()
    }
}
