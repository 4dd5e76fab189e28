//! Scalar rings Z/p^r and GF(2), and the extensions R[X]/G built over them
//!
//! Both scalar representations are `feanor_math` residue rings: `zn_64::Zn`
//! for Z/p^r and the compile-time field `zn_static::Fp<2>` for GF(2). The slot
//! machinery is written once over `ScalarRing`. `quotient_ring` builds the
//! extension R[X]/G as a `FreeAlgebraImpl`, which is a finite field for r = 1
//! and a Galois ring for r > 1; units of either are inverted by its
//! `DivisibilityRing` implementation.

use std::fmt::Debug;

use feanor_math::homomorphism::*;
use feanor_math::primitive_int::*;
use feanor_math::ring::*;
use feanor_math::rings::extension::extension_impl::FreeAlgebraImpl;
use feanor_math::rings::extension::*;
use feanor_math::rings::poly::dense_poly::DensePolyRing;
use feanor_math::rings::poly::*;
use feanor_math::rings::zn::zn_64::Zn;
use feanor_math::rings::zn::zn_static;
use feanor_math::rings::zn::*;

use crate::arith::{checked_prime_power, is_prime, MAX_MODULUS_BITS, ZZ};
use crate::error::{Result, SlotAlgebraError};

/// Which scalar representation a slot ring uses
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RepresentationTag {
    /// GF(2) coefficients (p = 2, r = 1)
    Binary,
    /// Z/p^r coefficients
    PrimePower,
}

/// GF(2), with the modulus fixed at compile time
pub type Gf2 = zn_static::Fp<2>;

/// Univariate polynomials over a scalar ring
pub type PolyRingOf<R> = DensePolyRing<R>;

pub type PolyOf<R> = El<DensePolyRing<R>>;

/// R[X]/(G) for a monic G, elements stored by their coefficients below deg G
pub type ExtRing<R> = FreeAlgebraImpl<R, Vec<El<R>>>;

/// A residue ring Z/p^r with p prime, in one of the two scalar representations
///
/// Residues cross the crate boundary as integers in [0, p^r).
pub trait ScalarRing:
    RingStore<Type: ZnRing<IntegerRingBase = StaticRingBase<i64>, IntegerRing = StaticRing<i64>>>
    + Clone
    + Debug
    + Send
    + Sync
    + 'static
{
    const TAG: RepresentationTag;

    /// Builds the ring Z/p^r in this representation
    fn for_prime_power(p: u64, r: u32) -> Result<Self>;

    /// Canonical representative in [0, p^r)
    fn residue(&self, a: &El<Self>) -> u64 {
        self.smallest_positive_lift(self.clone_el(a)) as u64
    }

    /// The class of the integer `x`
    fn from_residue(&self, x: u64) -> El<Self> {
        let q = *self.modulus() as u64;
        self.coerce(&ZZ, (x % q) as i64)
    }
}

impl ScalarRing for Zn {
    const TAG: RepresentationTag = RepresentationTag::PrimePower;

    fn for_prime_power(p: u64, r: u32) -> Result<Self> {
        if !is_prime(p) {
            return Err(SlotAlgebraError::NotPrime { value: p });
        }
        let q = checked_prime_power(p, r).ok_or(SlotAlgebraError::InvalidExponent {
            r,
            max_bits: MAX_MODULUS_BITS,
        })?;
        Ok(Zn::new(q))
    }
}

impl ScalarRing for Gf2 {
    const TAG: RepresentationTag = RepresentationTag::Binary;

    fn for_prime_power(p: u64, r: u32) -> Result<Self> {
        if p != 2 || r != 1 {
            return Err(SlotAlgebraError::InvalidParameters(format!(
                "the binary representation needs p = 2 and r = 1, got p = {}, r = {}",
                p, r
            )));
        }
        Ok(Gf2::RING)
    }
}

/// R[X]/(f) for a monic `f` of positive degree
pub fn quotient_ring<R: ScalarRing>(poly_ring: &PolyRingOf<R>, f: &PolyOf<R>) -> Result<ExtRing<R>> {
    let base = poly_ring.base_ring();
    let d = match poly_ring.degree(f) {
        Some(d) if d > 0 => d,
        _ => {
            return Err(SlotAlgebraError::InvalidParameters(
                "extension modulus must have positive degree".to_string(),
            ))
        }
    };
    if !base.is_one(poly_ring.coefficient_at(f, d)) {
        return Err(SlotAlgebraError::InvalidParameters(
            "extension modulus must be monic".to_string(),
        ));
    }
    let x_pow_d = (0..d)
        .map(|i| base.negate(base.clone_el(poly_ring.coefficient_at(f, i))))
        .collect();
    Ok(FreeAlgebraImpl::new(base.clone(), d, x_pow_d))
}

/// The class of `a` in `ext` = R[X]/(f)
pub fn to_quotient<R: ScalarRing>(poly_ring: &PolyRingOf<R>, ext: &ExtRing<R>, a: &PolyOf<R>) -> El<ExtRing<R>> {
    poly_ring.evaluate(a, &ext.canonical_gen(), ext.inclusion())
}

/// The representative of `x` of degree below deg f
pub fn from_quotient<R: ScalarRing>(poly_ring: &PolyRingOf<R>, ext: &ExtRing<R>, x: &El<ExtRing<R>>) -> PolyOf<R> {
    ext.poly_repr(poly_ring, x, ext.base_ring().identity())
}

#[cfg(test)]
mod tests {
    use super::*;
    use feanor_math::assert_el_eq;
    use feanor_math::divisibility::*;

    fn poly<R: ScalarRing>(poly_ring: &PolyRingOf<R>, coeffs: &[u64]) -> PolyOf<R> {
        let base = poly_ring.base_ring();
        poly_ring.from_terms(coeffs.iter().enumerate().map(|(i, &c)| (base.from_residue(c), i)))
    }

    #[test]
    fn test_gf2_scalars() {
        let f = Gf2::for_prime_power(2, 1).unwrap();
        assert_eq!(f.residue(&f.from_residue(7)), 1);
        assert!(f.is_zero(&f.add(f.one(), f.one())));
        assert_eq!(Gf2::TAG, RepresentationTag::Binary);
        assert!(Gf2::for_prime_power(2, 2).is_err());
        assert!(Gf2::for_prime_power(3, 1).is_err());
    }

    #[test]
    fn test_prime_power_scalars() {
        let z81 = Zn::for_prime_power(3, 4).unwrap();
        assert_eq!(*z81.modulus(), 81);
        assert_eq!(z81.residue(&z81.from_residue(85)), 4);
        assert_eq!(z81.residue(&z81.negate(z81.one())), 80);
        assert!(z81.invert(&z81.from_residue(3)).is_none());

        assert_eq!(Zn::for_prime_power(9, 1).unwrap_err(), SlotAlgebraError::NotPrime { value: 9 });
        assert!(matches!(Zn::for_prime_power(2, 0), Err(SlotAlgebraError::InvalidExponent { .. })));
        assert!(matches!(Zn::for_prime_power(2, 59), Err(SlotAlgebraError::InvalidExponent { .. })));
        assert!(Zn::for_prime_power(2, 58).is_ok());
    }

    #[test]
    fn test_gf16_inverses() {
        // GF(16) = GF(2)[X]/(X^4 + X + 1)
        let ring = DensePolyRing::new(Gf2::RING, "X");
        let ext = quotient_ring(&ring, &poly(&ring, &[1, 1, 0, 0, 1])).unwrap();
        assert_eq!(ext.rank(), 4);
        for bits in 1u64..16 {
            let a = to_quotient(&ring, &ext, &poly(&ring, &[bits & 1, (bits >> 1) & 1, (bits >> 2) & 1, (bits >> 3) & 1]));
            let inv = ext.invert(&a).unwrap();
            assert_el_eq!(&ext, ext.one(), ext.mul_ref(&a, &inv));
        }
        assert!(ext.invert(&ext.zero()).is_none());
    }

    #[test]
    fn test_galois_ring_inverse() {
        // GR(9, 2) = Z/9[X]/(X^2 + 1)
        let ring = DensePolyRing::new(Zn::for_prime_power(3, 2).unwrap(), "X");
        let ext = quotient_ring(&ring, &poly(&ring, &[1, 0, 1])).unwrap();
        let a = to_quotient(&ring, &ext, &poly(&ring, &[4, 7]));
        let inv = ext.invert(&a).unwrap();
        assert_el_eq!(&ext, ext.one(), ext.mul_ref(&a, &inv));

        // 3X is a zero divisor
        assert!(ext.invert(&to_quotient(&ring, &ext, &poly(&ring, &[0, 3]))).is_none());
    }

    #[test]
    fn test_quotient_round_trip_reduces() {
        let ring = DensePolyRing::new(Zn::for_prime_power(5, 1).unwrap(), "X");
        let f = poly(&ring, &[2, 0, 1]); // X^2 + 2
        let ext = quotient_ring(&ring, &f).unwrap();
        // X^3 + 1 ≡ 1 - 2X
        let x = to_quotient(&ring, &ext, &poly(&ring, &[1, 0, 0, 1]));
        assert_el_eq!(&ring, poly(&ring, &[1, 3]), from_quotient(&ring, &ext, &x));

        assert!(quotient_ring(&ring, &poly(&ring, &[3])).is_err());
        assert!(quotient_ring(&ring, &poly(&ring, &[1, 2])).is_err());
    }

    #[test]
    fn test_frobenius_fixes_prime_field() {
        let ring = DensePolyRing::new(Zn::for_prime_power(5, 1).unwrap(), "X");
        let ext = quotient_ring(&ring, &poly(&ring, &[2, 0, 1])).unwrap();
        let c = ext.inclusion().map(ring.base_ring().from_residue(3));
        assert_el_eq!(&ext, &c, ext.pow(ext.clone_el(&c), 5));
        let x = ext.canonical_gen();
        assert!(!ext.eq_el(&x, &ext.pow(ext.clone_el(&x), 5)));
        assert_el_eq!(&ext, &x, ext.pow(ext.clone_el(&x), 25));
    }
}
