//! Cyclotomic polynomials and their factorization modulo p^r
//!
//! All computations run over concrete `feanor_math` rings: Z as i64 (or big
//! integers where coefficients grow), F_p as `AsField<zn_64::Zn>`, Z/p^r as
//! `zn_big::Zn` for Hensel lifting, and GF(p^d) as a `GaloisField` over a
//! chosen modulus. Polynomials cross the module boundary as integer
//! coefficient vectors, constant term first, with coefficients in [0, p^r).

use feanor_math::algorithms::cyclotomic::cyclotomic_polynomial;
use feanor_math::algorithms::poly_factor::FactorPolyField;
use feanor_math::algorithms::poly_gcd::hensel::hensel_lift_factorization;
use feanor_math::computation::DontObserve;
use feanor_math::homomorphism::*;
use feanor_math::integer::*;
use feanor_math::pid::*;
use feanor_math::primitive_int::*;
use feanor_math::reduce_lift::poly_factor_gcd::PolyGCDLocallyIntermediateReductionMap;
use feanor_math::ring::*;
use feanor_math::rings::extension::extension_impl::FreeAlgebraImpl;
use feanor_math::rings::extension::galois_field::GaloisField;
use feanor_math::rings::extension::*;
use feanor_math::rings::field::{AsField, AsFieldBase};
use feanor_math::rings::poly::dense_poly::DensePolyRing;
use feanor_math::rings::poly::*;
use feanor_math::rings::zn::zn_64::Zn;
use feanor_math::rings::zn::*;
use feanor_math::seq::*;
use tracing::{debug, instrument};

use crate::arith::{MAX_MODULUS, ZZ};
use crate::error::{Result, SlotAlgebraError};

type PrimeField = AsField<Zn>;
type PrimeFieldPolys = DensePolyRing<PrimeField>;

/// Integer coefficients of Phi_m(X), constant term first
pub fn cyclotomic_coefficients(m: u64) -> Vec<i64> {
    let zz_x = DensePolyRing::new(ZZ, "X");
    let phi = cyclotomic_polynomial(&zz_x, m as usize);
    coefficients(&zz_x, &phi, |c| *c)
}

/// max(1, max_{φ(m) <= k <= 2φ(m)-2} ||X^k mod Phi_m||_∞)
///
/// Bounds the coefficient growth of a product of two ring elements when it is
/// reduced modulo Phi_m.
pub fn ring_constant(phi: &[i64]) -> f64 {
    let n = phi.len().saturating_sub(1);
    if n < 2 {
        return 1.0;
    }
    let zz_x = DensePolyRing::new(BigIntRing::RING, "X");
    let modulus = zz_x.from_terms(
        phi.iter()
            .enumerate()
            .map(|(i, &c)| (int_cast(c, BigIntRing::RING, ZZ), i)),
    );

    // X^k mod Phi_m, starting from X^{n-1}
    let mut x_pow = zz_x.from_terms([(BigIntRing::RING.one(), n - 1)]);
    let mut best = 1.0f64;
    for _ in n..=2 * n - 2 {
        zz_x.mul_assign_monomial(&mut x_pow, 1);
        x_pow = zz_x.div_rem_monic(x_pow, &modulus).1;
        for (c, _) in zz_x.terms(&x_pow) {
            best = best.max(BigIntRing::RING.to_float_approx(c).abs());
        }
    }
    best
}

/// F_p, or an error if p is not a prime in the supported range
fn prime_field(p: u64) -> Result<PrimeField> {
    if p < 2 || p > MAX_MODULUS {
        return Err(SlotAlgebraError::InvalidModulus { modulus: p });
    }
    Zn::new(p)
        .as_field()
        .map_err(|_| SlotAlgebraError::NotPrime { value: p })
}

fn from_integers(fp_x: &PrimeFieldPolys, coeffs: &[i64]) -> El<PrimeFieldPolys> {
    let fp = fp_x.base_ring();
    fp_x.from_terms(coeffs.iter().enumerate().map(|(i, &c)| (fp.coerce(&ZZ, c), i)))
}

fn to_integers(fp_x: &PrimeFieldPolys, f: &El<PrimeFieldPolys>) -> Vec<i64> {
    let fp = fp_x.base_ring();
    coefficients(fp_x, f, |c| fp.smallest_positive_lift(fp.clone_el(c)))
}

/// Coefficients 0..=deg f, each mapped through `lift`
fn coefficients<P, F>(poly_ring: P, f: &El<P>, mut lift: F) -> Vec<i64>
where
    P: RingStore,
    P::Type: PolyRing,
    F: FnMut(&El<<P::Type as RingExtension>::BaseRing>) -> i64,
{
    match poly_ring.degree(f) {
        Some(d) => (0..=d).map(|i| lift(poly_ring.coefficient_at(f, i))).collect(),
        None => Vec::new(),
    }
}

/// The factors F_t of Phi_m modulo p^r, one per representative t
///
/// F_1 is the factor of degree `ord_p` with the lexicographically smallest
/// coefficient vector, so the slot order does not depend on the factoring
/// algorithm. F_t = gcd(F_1(X^t) mod Phi_m, Phi_m) modulo p, lifted to p^r.
///
/// # Arguments
/// * `phi` - Integer coefficients of Phi_m
/// * `representatives` - The slot representatives T, starting with 1
/// * `ord_p` - Order of p modulo m, the degree of every factor
#[instrument(skip_all, fields(m = m, p = p, r = r))]
pub fn slot_factors(
    phi: &[i64],
    m: u64,
    p: u64,
    r: u32,
    representatives: &[u64],
    ord_p: usize,
) -> Result<Vec<Vec<i64>>> {
    let fp_x = DensePolyRing::new(prime_field(p)?, "X");
    let phi_p = from_integers(&fp_x, phi);

    let (irreducible, _) = <_ as FactorPolyField>::factor_poly(&fp_x, &phi_p);
    let f1 = irreducible
        .into_iter()
        .map(|(f, _)| f)
        .filter(|f| fp_x.degree(f) == Some(ord_p))
        .min_by_key(|f| to_integers(&fp_x, f))
        .ok_or_else(|| {
            SlotAlgebraError::InvalidParameters(format!(
                "Phi_{} has no factor of degree {} modulo {}",
                m, ord_p, p
            ))
        })?;

    let mut factors = Vec::with_capacity(representatives.len());
    for &t in representatives {
        let f_t = if t == 1 {
            fp_x.clone_el(&f1)
        } else {
            conjugate_factor(&fp_x, &f1, &phi_p, t, m)
        };
        if fp_x.degree(&f_t) != Some(ord_p) {
            return Err(SlotAlgebraError::InvalidParameters(format!(
                "factor for t = {} has degree {:?}, expected {}",
                t,
                fp_x.degree(&f_t),
                ord_p
            )));
        }
        factors.push(f_t);
    }
    debug!(n_factors = factors.len(), degree = ord_p, "factored Phi_m modulo p");

    if r == 1 {
        return Ok(factors.iter().map(|f| to_integers(&fp_x, f)).collect());
    }
    Ok(hensel_lift(phi, &fp_x, &phi_p, &factors, p as i64, r as usize))
}

/// F_t = gcd(F_1(X^t) mod Phi_m, Phi_m), using X^m ≡ 1 (mod Phi_m)
fn conjugate_factor(
    fp_x: &PrimeFieldPolys,
    f1: &El<PrimeFieldPolys>,
    phi_p: &El<PrimeFieldPolys>,
    t: u64,
    m: u64,
) -> El<PrimeFieldPolys> {
    let fp = fp_x.base_ring();
    let mut coeffs: Vec<_> = (0..m).map(|_| fp.zero()).collect();
    for (c, k) in fp_x.terms(f1) {
        let e = (k as u64 * t % m) as usize;
        fp.add_assign_ref(&mut coeffs[e], c);
    }
    let composed = fp_x.from_terms(coeffs.into_iter().enumerate().map(|(i, c)| (c, i)));
    let (_, reduced) = fp_x.div_rem_monic(composed, phi_p);
    fp_x.normalize(fp_x.ideal_gen(&reduced, phi_p))
}

/// Lifts each factor F_t of Phi_m mod p to the factor of Phi_m mod p^e it reduces to
fn hensel_lift(
    phi: &[i64],
    fp_x: &PrimeFieldPolys,
    phi_p: &El<PrimeFieldPolys>,
    factors: &[El<PrimeFieldPolys>],
    p: i64,
    e: usize,
) -> Vec<Vec<i64>> {
    let zz = StaticRing::<i64>::RING;
    let zpe = zn_big::Zn::new(BigIntRing::RING, BigIntRing::RING.pow(int_cast(p, BigIntRing::RING, zz), e));
    let zp = zn_big::Zn::new(BigIntRing::RING, int_cast(p, BigIntRing::RING, zz));
    let reduction = PolyGCDLocallyIntermediateReductionMap::new(zz.get_ring(), &p, &zpe, e, &zp, 1, 0);
    let zpe_x = DensePolyRing::new(&zpe, "X");
    let phi_pe = zpe_x.from_terms(phi.iter().enumerate().map(|(i, &c)| (zpe.coerce(&zz, c), i)));

    factors
        .iter()
        .map(|f_t| {
            let cofactor = fp_x.div_rem_monic(fp_x.clone_el(phi_p), f_t).0;
            let pair = [fp_x.clone_el(f_t), cofactor];
            let lifted = hensel_lift_factorization(&reduction, &zpe_x, fp_x, &phi_pe, &pair[..], DontObserve);
            coefficients(&zpe_x, &lifted[0], |c| {
                int_cast(zpe.smallest_positive_lift(zpe.clone_el(c)), zz, BigIntRing::RING)
            })
        })
        .collect()
}

/// Whether `g` has positive degree and is irreducible modulo p
pub fn is_irreducible_mod_p(g: &[i64], p: u64) -> Result<bool> {
    let fp_x = DensePolyRing::new(prime_field(p)?, "X");
    let g = from_integers(&fp_x, g);
    Ok(fp_x.degree(&g).map_or(false, |d| d > 0) && <_ as FactorPolyField>::is_irred(&fp_x, &g))
}

/// A root of `g` in F_p[X]/(f), as the coefficients of a polynomial of degree < deg f
///
/// Both polynomials must be monic and irreducible modulo p. Of all roots, the
/// one with the lexicographically smallest coefficient vector is returned.
pub fn root_in_extension(g: &[i64], f: &[i64], p: u64) -> Result<Vec<i64>> {
    let fp = prime_field(p)?;
    let d = match f.len() {
        0 | 1 => {
            return Err(SlotAlgebraError::InvalidParameters(
                "extension modulus must have positive degree".to_string(),
            ))
        }
        len => len - 1,
    };
    let x_pow_d: Vec<_> = f[..d].iter().map(|&c| fp.negate(fp.coerce(&ZZ, c))).collect();
    let fq = GaloisField::create(AsField::from(AsFieldBase::promise_is_perfect_field(
        FreeAlgebraImpl::new(fp.clone(), d, x_pow_d),
    )));
    let fq_y = DensePolyRing::new(&fq, "Y");
    let g_y = fq_y.from_terms(
        g.iter()
            .enumerate()
            .map(|(i, &c)| (fq.inclusion().map(fp.coerce(&ZZ, c)), i)),
    );

    let (factors, _) = <_ as FactorPolyField>::factor_poly(&fq_y, &g_y);
    factors
        .iter()
        .filter(|(h, _)| fq_y.degree(h) == Some(1))
        .map(|(h, _)| {
            let root = fq.negate(fq.clone_el(fq_y.coefficient_at(h, 0)));
            let basis = fq.wrt_canonical_basis(&root);
            (0..d).map(|i| fp.smallest_positive_lift(basis.at(i))).collect::<Vec<i64>>()
        })
        .min()
        .ok_or_else(|| SlotAlgebraError::UnsupportedGenerator("G has no root modulo the first factor".to_string()))
}
