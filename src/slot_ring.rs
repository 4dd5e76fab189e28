//! The ring Z/p^r[X]/Phi_m(X) as a product of slot rings
//!
//! A `SlotRing` factors Phi_m modulo p^r into one irreducible factor F_t per
//! representative t of (Z/mZ)^*/⟨p⟩ and carries the Chinese-remainder data
//! needed to move between a ring element and its vector of slot residues.
//! On top of that it embeds an arbitrary extension R[X]/G into every slot
//! (`map_to_slots`) and builds the mask and indicator tables that slot
//! rotations are assembled from.
//!
//! The modulus p^r is not ambient state: every `SlotRing` owns its
//! `DensePolyRing` over Z/p^r and all arithmetic goes through it.

use std::fmt::{Debug, Formatter, Result as FmtResult};
use std::sync::{Arc, OnceLock};

use feanor_math::algorithms::linsolve::LinSolveRingStore;
use feanor_math::divisibility::*;
use feanor_math::homomorphism::*;
use feanor_math::matrix::OwnedMatrix;
use feanor_math::ring::*;
use feanor_math::rings::extension::*;
use feanor_math::rings::poly::dense_poly::DensePolyRing;
use feanor_math::rings::poly::*;
use feanor_math::rings::zn::*;
use feanor_math::seq::*;
use num_bigint::BigInt;
use tracing::{debug, instrument};

use crate::arith::ZZ;
use crate::error::{Result, SlotAlgebraError};
use crate::factorization::{is_irreducible_mod_p, root_in_extension, slot_factors};
use crate::field::{from_quotient, quotient_ring, to_quotient, ExtRing, PolyOf, PolyRingOf, RepresentationTag, ScalarRing};
use crate::group::GroupStructure;
use crate::mapping::SlotMapping;

/// Slot mapping data of a `SlotRing<R>`
pub type MappingOf<R> = SlotMapping<R>;

pub struct SlotRing<R: ScalarRing> {
    group: Arc<GroupStructure>,
    r: u32,
    p_pow_r: u64,
    poly_ring: PolyRingOf<R>,
    phi_m_mod: PolyOf<R>,
    factors: Vec<PolyOf<R>>,
    factors_over_integers: Vec<Vec<BigInt>>,
    crt_coefficients: Vec<PolyOf<R>>,
    cofactors: Vec<PolyOf<R>>,
    mask_table: OnceLock<Vec<Vec<PolyOf<R>>>>,
    crt_table: OnceLock<Vec<PolyOf<R>>>,
}

impl<R: ScalarRing> SlotRing<R> {
    /// Factors Phi_m modulo p^r and sets up the CRT data
    ///
    /// # Arguments
    /// * `group` - Shared structure of (Z/mZ)^*/⟨p⟩
    /// * `r` - Exponent of the plaintext modulus p^r
    ///
    /// # Returns
    /// * `Result<Self>` - The slot ring, or an error if p^r is out of range or
    ///   the representation `R` cannot hold Z/p^r
    #[instrument(skip_all, fields(m = group.m(), p = group.p(), r = r))]
    pub fn new(group: Arc<GroupStructure>, r: u32) -> Result<Self> {
        let p = group.p();
        let base = R::for_prime_power(p, r)?;
        let p_pow_r = *base.modulus() as u64;
        let poly_ring = DensePolyRing::new(base, "X");

        let phi = group
            .phi_m_x()
            .iter()
            .map(|c| {
                i64::try_from(c).map_err(|_| {
                    SlotAlgebraError::InvalidParameters(format!("coefficient {} of Phi_{} does not fit in 64 bits", c, group.m()))
                })
            })
            .collect::<Result<Vec<i64>>>()?;
        let lifted = slot_factors(&phi, group.m(), p, r, group.representatives(), group.ord_p())?;

        let phi_m_mod = from_integers(&poly_ring, &phi);
        let factors: Vec<PolyOf<R>> = lifted.iter().map(|f| from_integers(&poly_ring, f)).collect();
        let factors_over_integers = lifted
            .iter()
            .map(|f| f.iter().map(|&c| BigInt::from(c)).collect())
            .collect();
        let cofactors: Vec<PolyOf<R>> = factors
            .iter()
            .map(|f| poly_ring.div_rem_monic(poly_ring.clone_el(&phi_m_mod), f).0)
            .collect();
        let crt_coefficients = cofactors
            .iter()
            .zip(&factors)
            .map(|(c, f)| -> Result<PolyOf<R>> {
                let ext = quotient_ring(&poly_ring, f)?;
                let inverse = ext
                    .invert(&to_quotient(&poly_ring, &ext, c))
                    .ok_or_else(|| SlotAlgebraError::NotInvertible("cofactor modulo its slot factor".to_string()))?;
                Ok(from_quotient(&poly_ring, &ext, &inverse))
            })
            .collect::<Result<Vec<_>>>()?;

        debug!(n_factors = factors.len(), degree = group.ord_p(), "factored Phi_m");
        Ok(Self {
            group,
            r,
            p_pow_r,
            poly_ring,
            phi_m_mod,
            factors,
            factors_over_integers,
            crt_coefficients,
            cofactors,
            mask_table: OnceLock::new(),
            crt_table: OnceLock::new(),
        })
    }

    pub fn group(&self) -> &Arc<GroupStructure> {
        &self.group
    }

    pub fn r(&self) -> u32 {
        self.r
    }

    pub fn p_pow_r(&self) -> u64 {
        self.p_pow_r
    }

    pub fn n_slots(&self) -> usize {
        self.factors.len()
    }

    /// Phi_m(X) reduced modulo p^r
    pub fn phi_m_mod(&self) -> &PolyOf<R> {
        &self.phi_m_mod
    }

    /// Monic irreducible factors, index-aligned with the representatives T
    pub fn factors(&self) -> &[PolyOf<R>] {
        &self.factors
    }

    /// The factors with integer coefficients in [0, p^r)
    pub fn factors_over_integers(&self) -> &[Vec<BigInt>] {
        &self.factors_over_integers
    }

    /// crt_coefficients[i] = (∏_{j != i} F_j)^{-1} mod F_i
    pub fn crt_coefficients(&self) -> &[PolyOf<R>] {
        &self.crt_coefficients
    }

    /// cofactors[i] = ∏_{j != i} F_j
    pub fn cofactors(&self) -> &[PolyOf<R>] {
        &self.cofactors
    }

    pub fn tag(&self) -> RepresentationTag {
        R::TAG
    }

    /// The polynomial ring over Z/p^r all operations of this ring use
    pub fn context(&self) -> &PolyRingOf<R> {
        &self.poly_ring
    }

    /// Hands back this ring's modulus context
    ///
    /// There is no process-wide modulus to reinstate; callers that interleave
    /// rings over different p^r thread the returned context explicitly.
    pub fn restore_context(&self) -> &PolyRingOf<R> {
        &self.poly_ring
    }

    /// Coefficients of `a` as integers in [0, p^r), constant term first, without trailing zeros
    pub fn to_residues(&self, a: &PolyOf<R>) -> Vec<u64> {
        let base = self.poly_ring.base_ring();
        match self.poly_ring.degree(a) {
            Some(d) => (0..=d).map(|i| base.residue(self.poly_ring.coefficient_at(a, i))).collect(),
            None => Vec::new(),
        }
    }

    /// The polynomial with the given coefficients, each reduced modulo p^r
    pub fn from_residues(&self, coeffs: &[u64]) -> PolyOf<R> {
        let base = self.poly_ring.base_ring();
        self.poly_ring
            .from_terms(coeffs.iter().enumerate().map(|(i, &c)| (base.from_residue(c), i)))
    }

    /// Replaces this ring's data with a copy of `other`'s
    ///
    /// Both rings must be built over the same group structure.
    pub fn assign_from(&mut self, other: &Self) -> Result<()> {
        if !same_group(&self.group, &other.group) {
            return Err(SlotAlgebraError::MismatchedGroups);
        }
        *self = other.clone();
        Ok(())
    }

    /// values[i] = h mod F_i
    pub fn crt_decompose(&self, h: &PolyOf<R>) -> Vec<PolyOf<R>> {
        self.factors.iter().map(|f| self.reduce(h, f)).collect()
    }

    /// The unique element of degree < φ(m) with residue values[i] modulo every F_i
    pub fn crt_reconstruct(&self, values: &[PolyOf<R>]) -> Result<PolyOf<R>> {
        if values.len() != self.n_slots() {
            return Err(SlotAlgebraError::InvalidDimension {
                expected: self.n_slots(),
                got: values.len(),
            });
        }
        let ring = &self.poly_ring;
        Ok(ring.sum(values.iter().enumerate().map(|(i, v)| {
            let local = self.reduce(&ring.mul_ref(v, &self.crt_coefficients[i]), &self.factors[i]);
            ring.mul(local, ring.clone_el(&self.cofactors[i]))
        })))
    }

    fn reduce(&self, a: &PolyOf<R>, f: &PolyOf<R>) -> PolyOf<R> {
        self.poly_ring.div_rem_monic(self.poly_ring.clone_el(a), f).1
    }

    /// a(w) mod f
    fn compose_mod(&self, a: &PolyOf<R>, w: &PolyOf<R>, f: &PolyOf<R>) -> Result<PolyOf<R>> {
        let ext = quotient_ring(&self.poly_ring, f)?;
        let w = to_quotient(&self.poly_ring, &ext, w);
        let value = self.poly_ring.evaluate(a, &w, ext.inclusion());
        Ok(from_quotient(&self.poly_ring, &ext, &value))
    }

    fn to_integers(&self, a: &PolyOf<R>) -> Vec<i64> {
        self.to_residues(a).into_iter().map(|c| c as i64).collect()
    }

    /// Builds the tables embedding R[X]/G into every slot
    ///
    /// G must be irreducible modulo p with deg G dividing ord_p. For r > 1
    /// only deg G = 1 or G = F_1 are supported, since those have a root over
    /// Z/p^r that needs no lifting.
    #[instrument(skip_all, fields(deg_g = ?self.poly_ring.degree(g)))]
    pub fn map_to_slots(&self, g: &PolyOf<R>) -> Result<MappingOf<R>> {
        let ring = &self.poly_ring;
        let base = ring.base_ring();
        let ord_p = self.group.ord_p();

        let deg_g = match ring.degree(g) {
            Some(d) if d > 0 => d,
            _ => {
                return Err(SlotAlgebraError::UnsupportedGenerator(
                    "extension generator must have positive degree".to_string(),
                ))
            }
        };
        let lc_inverse = base
            .invert(ring.coefficient_at(g, deg_g))
            .ok_or_else(|| SlotAlgebraError::NotInvertible("leading coefficient of G".to_string()))?;
        let g = ring.from_terms(ring.terms(g).map(|(c, i)| (base.mul_ref(c, &lc_inverse), i)));

        if ord_p % deg_g != 0 {
            return Err(SlotAlgebraError::UnsupportedGenerator(format!(
                "deg G = {} does not divide ord(p) = {}",
                deg_g, ord_p
            )));
        }
        if !is_irreducible_mod_p(&self.to_integers(&g), self.group.p())? {
            return Err(SlotAlgebraError::NotIrreducible);
        }
        if self.r > 1 && deg_g != 1 && !ring.eq_el(&g, &self.factors[0]) {
            return Err(SlotAlgebraError::UnsupportedGenerator(
                "for r > 1 the generator must be linear or equal to the first factor".to_string(),
            ));
        }

        let w1 = self.map_to_f1(&g)?;
        let mut forward_maps = Vec::with_capacity(self.n_slots());
        let mut backward_maps = Vec::with_capacity(self.n_slots());
        for (i, &t) in self.group.representatives().iter().enumerate() {
            let ext = quotient_ring(ring, &self.factors[i])?;
            let x_t = ext.pow(ext.canonical_gen(), t as usize);
            let w = ring.evaluate(&w1, &x_t, ext.inclusion());

            // column j holds the coefficients of w^j mod F_t
            let powers: Vec<_> = (0..deg_g).map(|j| ext.pow(ext.clone_el(&w), j)).collect();
            let embedding = OwnedMatrix::from_fn(ord_p, deg_g, |k, j| ext.wrt_canonical_basis(&powers[j]).at(k));
            backward_maps.push(left_inverse(base, &embedding)?);
            forward_maps.push(from_quotient(ring, &ext, &w));
        }
        debug!(n_slots = forward_maps.len(), "built slot mapping");

        Ok(SlotMapping::new(g, deg_g, forward_maps, backward_maps))
    }

    /// A root of G in R[X]/F_1
    fn map_to_f1(&self, g: &PolyOf<R>) -> Result<PolyOf<R>> {
        let ring = &self.poly_ring;
        let base = ring.base_ring();
        let f1 = &self.factors[0];
        if ring.degree(g) == Some(1) {
            return Ok(ring.inclusion().map(base.negate(base.clone_el(ring.coefficient_at(g, 0)))));
        }
        if ring.eq_el(g, f1) {
            return Ok(ring.indeterminate());
        }
        let root = root_in_extension(&self.to_integers(g), &self.to_integers(f1), self.group.p())?;
        Ok(from_integers(ring, &root))
    }

    /// Places values[i] ∈ R[X]/G into slot i and reconstructs the ring element
    pub fn embed_in_slots(&self, values: &[PolyOf<R>], mapping: &MappingOf<R>) -> Result<PolyOf<R>> {
        if values.len() != self.n_slots() || mapping.forward_maps().len() != self.n_slots() {
            return Err(SlotAlgebraError::InvalidDimension {
                expected: self.n_slots(),
                got: values.len(),
            });
        }
        let local = values
            .iter()
            .zip(mapping.forward_maps())
            .zip(&self.factors)
            .map(|((v, w), f)| self.compose_mod(&self.reduce(v, mapping.g()), w, f))
            .collect::<Result<Vec<_>>>()?;
        self.crt_reconstruct(&local)
    }

    /// Places the same value in every slot
    pub fn embed_in_all_slots(&self, value: &PolyOf<R>, mapping: &MappingOf<R>) -> Result<PolyOf<R>> {
        let values: Vec<_> = (0..self.n_slots()).map(|_| self.poly_ring.clone_el(value)).collect();
        self.embed_in_slots(&values, mapping)
    }

    /// Recovers the per-slot values of R[X]/G from a ring element
    pub fn decode_plaintext(&self, h: &PolyOf<R>, mapping: &MappingOf<R>) -> Result<Vec<PolyOf<R>>> {
        let ring = &self.poly_ring;
        let base = ring.base_ring();
        let ord_p = self.group.ord_p();
        if mapping.backward_maps().len() != self.n_slots() {
            return Err(SlotAlgebraError::InvalidDimension {
                expected: self.n_slots(),
                got: mapping.backward_maps().len(),
            });
        }
        Ok(self
            .crt_decompose(h)
            .iter()
            .zip(mapping.backward_maps())
            .map(|(residue, back)| {
                ring.from_terms((0..back.row_count()).map(|j| {
                    let value = base.sum((0..ord_p).map(|k| base.mul_ref(back.at(j, k), ring.coefficient_at(residue, k))));
                    (value, j)
                }))
            })
            .collect())
    }

    /// Coefficients of a linearized polynomial over R[X]/G
    ///
    /// Given L[i] = M(x^i) mod G for a map M that is linear over the prime
    /// ring, returns C with M(h) = Σ_j C[j]·h(x^{p^j}) mod G.
    pub fn build_lin_poly_coeffs(&self, l: &[PolyOf<R>], mapping: &MappingOf<R>) -> Result<Vec<PolyOf<R>>> {
        let d = mapping.deg_g();
        if l.len() != d {
            return Err(SlotAlgebraError::InvalidDimension { expected: d, got: l.len() });
        }
        let ring = &self.poly_ring;
        let ext = quotient_ring(ring, mapping.g())?;
        let conjugates = self.frobenius_conjugates(&ext, d);

        // a[i][j] = σ^j(x)^i
        let mut a = OwnedMatrix::from_fn(d, d, |i, j| ext.pow(ext.clone_el(&conjugates[j]), i));
        let mut rhs = OwnedMatrix::from_fn(d, 1, |i, _| to_quotient(ring, &ext, &l[i]));
        let mut solution = OwnedMatrix::zero(d, 1, &ext);
        if !ext.solve_right(a.data_mut(), rhs.data_mut(), solution.data_mut()).is_solved() {
            return Err(SlotAlgebraError::NotInvertible(
                "Frobenius conjugates of x do not give an invertible system".to_string(),
            ));
        }
        Ok((0..d).map(|j| from_quotient(ring, &ext, solution.at(j, 0))).collect())
    }

    /// M(h) = Σ_j C[j]·h(x^{p^j}) mod G for coefficients from `build_lin_poly_coeffs`
    pub fn apply_lin_poly(&self, coeffs: &[PolyOf<R>], h: &PolyOf<R>, mapping: &MappingOf<R>) -> Result<PolyOf<R>> {
        let ring = &self.poly_ring;
        let ext = quotient_ring(ring, mapping.g())?;
        let conjugates = self.frobenius_conjugates(&ext, coeffs.len());
        let value = ext.sum(coeffs.iter().zip(&conjugates).map(|(c, sigma)| {
            let image = ring.evaluate(h, sigma, ext.inclusion());
            ext.mul(to_quotient(ring, &ext, c), image)
        }));
        Ok(from_quotient(ring, &ext, &value))
    }

    /// x, x^p, x^{p^2}, ... in R[X]/G
    fn frobenius_conjugates(&self, ext: &ExtRing<R>, count: usize) -> Vec<El<ExtRing<R>>> {
        let p = self.group.p() as usize;
        let mut conjugates = Vec::with_capacity(count);
        let mut x = ext.canonical_gen();
        for _ in 0..count {
            let next = ext.pow(ext.clone_el(&x), p);
            conjugates.push(std::mem::replace(&mut x, next));
        }
        conjugates
    }

    /// Per-slot indicators: crt_table[i] ≡ 1 (mod F_i) and ≡ 0 modulo every other factor
    pub fn gen_crt_table(&self) -> &[PolyOf<R>] {
        self.crt_table.get_or_init(|| {
            debug!(n_slots = self.n_slots(), "building CRT table");
            self.crt_coefficients
                .iter()
                .zip(&self.cofactors)
                .map(|(c, cof)| self.poly_ring.mul_ref(c, cof))
                .collect()
        })
    }

    /// mask[i][j] is 1 on slots whose coordinate along generator i is at least j
    /// and 0 elsewhere, for 0 <= j <= order(i)
    pub fn gen_mask_table(&self) -> &[Vec<PolyOf<R>>] {
        self.mask_table.get_or_init(|| {
            let crt = self.gen_crt_table();
            let group = &self.group;
            let ring = &self.poly_ring;
            debug!(generators = group.num_generators(), "building mask table");
            (0..group.num_generators())
                .map(|i| {
                    (0..=group.order_of(i))
                        .map(|j| {
                            ring.sum(
                                crt.iter()
                                    .enumerate()
                                    .filter(|&(s, _)| group.coordinate(i, s) >= j)
                                    .map(|(_, e)| ring.clone_el(e)),
                            )
                        })
                        .collect()
                })
                .collect()
        })
    }

    /// Builds both tables now instead of on first use
    pub fn prepare(&self) {
        self.gen_crt_table();
        self.gen_mask_table();
    }

    fn clone_all(&self, polys: &[PolyOf<R>]) -> Vec<PolyOf<R>> {
        polys.iter().map(|f| self.poly_ring.clone_el(f)).collect()
    }
}

impl<R: ScalarRing> Clone for SlotRing<R> {
    fn clone(&self) -> Self {
        let crt_table = OnceLock::new();
        if let Some(table) = self.crt_table.get() {
            let _ = crt_table.set(self.clone_all(table));
        }
        let mask_table = OnceLock::new();
        if let Some(table) = self.mask_table.get() {
            let _ = mask_table.set(table.iter().map(|row| self.clone_all(row)).collect());
        }
        Self {
            group: self.group.clone(),
            r: self.r,
            p_pow_r: self.p_pow_r,
            poly_ring: self.poly_ring.clone(),
            phi_m_mod: self.poly_ring.clone_el(&self.phi_m_mod),
            factors: self.clone_all(&self.factors),
            factors_over_integers: self.factors_over_integers.clone(),
            crt_coefficients: self.clone_all(&self.crt_coefficients),
            cofactors: self.clone_all(&self.cofactors),
            mask_table,
            crt_table,
        }
    }
}

impl<R: ScalarRing> Debug for SlotRing<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("SlotRing")
            .field("m", &self.group.m())
            .field("p", &self.group.p())
            .field("r", &self.r)
            .field("tag", &R::TAG)
            .field("factors", &self.factors_over_integers)
            .finish()
    }
}

/// The polynomial with the given integer coefficients, reduced modulo p^r
fn from_integers<R: ScalarRing>(poly_ring: &PolyRingOf<R>, coeffs: &[i64]) -> PolyOf<R> {
    let base = poly_ring.base_ring();
    poly_ring.from_terms(coeffs.iter().enumerate().map(|(i, &c)| (base.coerce(&ZZ, c), i)))
}

/// B with B·E = I, for an injective n × k matrix E over Z/p^r
fn left_inverse<R: ScalarRing>(base: &R, embedding: &OwnedMatrix<El<R>>) -> Result<OwnedMatrix<El<R>>> {
    let (n, k) = (embedding.row_count(), embedding.col_count());
    // solve E^T X = I and transpose
    let mut lhs = OwnedMatrix::from_fn(k, n, |i, j| base.clone_el(embedding.at(j, i)));
    let mut rhs = OwnedMatrix::identity(k, k, base);
    let mut solution = OwnedMatrix::zero(n, k, base);
    if !base.solve_right(lhs.data_mut(), rhs.data_mut(), solution.data_mut()).is_solved() {
        return Err(SlotAlgebraError::NotInvertible("slot embedding has no left inverse".to_string()));
    }
    Ok(OwnedMatrix::from_fn(k, n, |i, j| base.clone_el(solution.at(j, i))))
}

/// Identity, or structural equality, of two shared group structures
pub(crate) fn same_group(a: &Arc<GroupStructure>, b: &Arc<GroupStructure>) -> bool {
    Arc::ptr_eq(a, b) || **a == **b
}
