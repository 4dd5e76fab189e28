//! The structure of (Z/mZ)^* relative to the subgroup generated by p
//!
//! `GroupStructure` decomposes the quotient group (Z/mZ)^*/⟨p⟩ into a product
//! of cyclic factors and numbers its elements in mixed radix. Slot index k
//! has digits (e_1, ..., e_n), last digit fastest, and is represented by
//! T[k] = ∏ g_i^{e_i} mod m. Each T[k] labels one irreducible factor of
//! Phi_m(X) modulo p, which is how slots are indexed throughout the crate.

use std::fmt::{Display, Formatter, Result as FmtResult};

use feanor_math::divisibility::*;
use feanor_math::ring::*;
use feanor_math::rings::zn::zn_64::Zn;
use feanor_math::rings::zn::*;
use num_bigint::BigInt;
use tracing::{debug, instrument};

use crate::arith::{euler_phi, is_prime, multiplicative_order, ZZ};
use crate::error::{Result, SlotAlgebraError};
use crate::factorization::{cyclotomic_coefficients, ring_constant};

/// Multiplication in Z/mZ on representatives in [0, m)
fn mul_residues(zm: &Zn, a: u64, b: u64) -> u64 {
    let product = zm.mul(zm.coerce(&ZZ, a as i64), zm.coerce(&ZZ, b as i64));
    zm.smallest_positive_lift(product) as u64
}

/// A generator of the quotient group together with its order there
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Generator {
    /// The group element g, in [1, m)
    pub element: u64,
    /// Order of g modulo the subgroup spanned by p and the earlier generators
    pub order: usize,
    /// True when g^order ≡ 1 (mod m), i.e. the quotient order equals the order in (Z/mZ)^*
    pub same_order_as_full: bool,
}

/// Immutable description of (Z/mZ)^*/⟨p⟩ and the slot numbering it induces
#[derive(Clone, Debug, PartialEq)]
pub struct GroupStructure {
    m: u64,
    p: u64,
    phi_m: u64,
    ord_p: usize,
    n_slots: usize,
    generators: Vec<Generator>,
    /// prods[i] = ∏_{j >= i} order(j); prods[n_gens] = 1
    suffix_order_products: Vec<usize>,
    phi_m_x: Vec<BigInt>,
    ring_constant: f64,
    representatives: Vec<u64>,
    rep_index: Vec<Option<usize>>,
    unit_index: Vec<Option<usize>>,
    /// Exponent vectors of T, flattened with stride `generators.len()`
    discrete_logs: Vec<usize>,
}

impl GroupStructure {
    /// Builds the group structure for (m, p)
    ///
    /// # Arguments
    /// * `m` - Cyclotomic index, at least 2
    /// * `p` - Plaintext prime, must not divide m
    ///
    /// # Returns
    /// * `Result<Self>` - The structure, or an error for invalid (m, p)
    #[instrument(skip_all, fields(m = m, p = p))]
    pub fn new(m: u64, p: u64) -> Result<Self> {
        if m < 2 || m > u32::MAX as u64 {
            return Err(SlotAlgebraError::InvalidParameters(format!(
                "cyclotomic index m = {} is out of range",
                m
            )));
        }
        if !is_prime(p) {
            return Err(SlotAlgebraError::NotPrime { value: p });
        }
        if m % p == 0 {
            return Err(SlotAlgebraError::NotCoprime { m, p });
        }

        let phi_m = euler_phi(m);
        let ord_p = multiplicative_order(p, m).ok_or(SlotAlgebraError::NotCoprime { m, p })? as usize;
        let n_slots = phi_m as usize / ord_p;
        let size = m as usize;
        let zm = Zn::new(m);

        // the subgroup spanned so far, as a membership table and an element list
        let mut in_span = vec![false; size];
        let mut span = Vec::with_capacity(phi_m as usize);
        let mut x = 1u64;
        for _ in 0..ord_p {
            in_span[x as usize] = true;
            span.push(x);
            x = mul_residues(&zm, x, p);
        }

        let units: Vec<u64> = (1..m).filter(|&t| zm.is_unit(&zm.coerce(&ZZ, t as i64))).collect();
        let mut generators = Vec::new();
        while span.len() < phi_m as usize {
            let generator = Self::next_generator(&zm, &units, &in_span)?;
            let g = generator.element;

            let mut power = 1u64;
            let mut expanded = Vec::with_capacity(span.len() * generator.order);
            for _ in 0..generator.order {
                for &s in &span {
                    expanded.push(mul_residues(&zm, s, power));
                }
                power = mul_residues(&zm, power, g);
            }
            for &y in &expanded {
                in_span[y as usize] = true;
            }
            span = expanded;
            generators.push(generator);
        }

        let mut suffix_order_products = vec![1usize; generators.len() + 1];
        for i in (0..generators.len()).rev() {
            suffix_order_products[i] = suffix_order_products[i + 1] * generators[i].order;
        }
        debug_assert_eq!(suffix_order_products[0], n_slots);

        let mut group = Self {
            m,
            p,
            phi_m,
            ord_p,
            n_slots,
            generators,
            suffix_order_products,
            phi_m_x: Vec::new(),
            ring_constant: 1.0,
            representatives: Vec::with_capacity(n_slots),
            rep_index: vec![None; size],
            unit_index: vec![None; size],
            discrete_logs: Vec::new(),
        };

        let mut exponents = vec![0usize; group.generators.len()];
        loop {
            let t = group.exponentiate(&exponents, false);
            group.rep_index[t as usize] = Some(group.representatives.len());
            group.representatives.push(t);
            group.discrete_logs.extend_from_slice(&exponents);
            if !group.next_exp_vector(&mut exponents) {
                break;
            }
        }
        for (i, &u) in units.iter().enumerate() {
            group.unit_index[u as usize] = Some(i);
        }

        let phi_m_x = cyclotomic_coefficients(m);
        group.ring_constant = ring_constant(&phi_m_x);
        group.phi_m_x = phi_m_x.into_iter().map(BigInt::from).collect();

        debug!(
            phi_m,
            ord_p,
            n_slots,
            generators = ?group.generators.iter().map(|g| (g.element, g.order)).collect::<Vec<_>>(),
            "built group structure"
        );
        Ok(group)
    }

    /// Picks the next generator: same-order candidates first, then the largest
    /// quotient order, then the smallest element
    fn next_generator(zm: &Zn, units: &[u64], in_span: &[bool]) -> Result<Generator> {
        let mut best: Option<Generator> = None;
        for &t in units {
            if in_span[t as usize] {
                continue;
            }
            let mut order = 1usize;
            let mut power = t;
            while !in_span[power as usize] {
                power = mul_residues(zm, power, t);
                order += 1;
            }
            let candidate = Generator {
                element: t,
                order,
                same_order_as_full: power == 1,
            };
            let better = match &best {
                None => true,
                Some(b) => {
                    (candidate.same_order_as_full, candidate.order) > (b.same_order_as_full, b.order)
                }
            };
            if better {
                best = Some(candidate);
            }
        }
        best.ok_or_else(|| SlotAlgebraError::InvalidParameters("quotient group has no further generator".to_string()))
    }

    pub fn m(&self) -> u64 {
        self.m
    }

    pub fn p(&self) -> u64 {
        self.p
    }

    /// φ(m)
    pub fn phi_m(&self) -> u64 {
        self.phi_m
    }

    /// Order of p in (Z/mZ)^*, the degree of every slot
    pub fn ord_p(&self) -> usize {
        self.ord_p
    }

    pub fn n_slots(&self) -> usize {
        self.n_slots
    }

    pub fn num_generators(&self) -> usize {
        self.generators.len()
    }

    pub fn generators(&self) -> &[Generator] {
        &self.generators
    }

    /// The i-th generator element
    pub fn generator(&self, i: usize) -> Option<u64> {
        self.generators.get(i).map(|g| g.element)
    }

    /// Quotient order of the i-th generator, 0 when out of range
    pub fn order_of(&self, i: usize) -> usize {
        self.generators.get(i).map_or(0, |g| g.order)
    }

    pub fn same_order(&self, i: usize) -> bool {
        self.generators.get(i).map_or(false, |g| g.same_order_as_full)
    }

    pub fn representative(&self, i: usize) -> Option<u64> {
        self.representatives.get(i).copied()
    }

    /// T, in slot order
    pub fn representatives(&self) -> &[u64] {
        &self.representatives
    }

    /// Index of `t` in T, or `None` if `t` is not a representative
    pub fn rep_index(&self, t: u64) -> Option<usize> {
        self.rep_index.get(t as usize).copied().flatten()
    }

    pub fn is_rep(&self, t: u64) -> bool {
        self.rep_index(t).is_some()
    }

    /// Index of `t` among the units of Z/mZ in increasing order
    pub fn unit_index(&self, t: u64) -> Option<usize> {
        self.unit_index.get(t as usize).copied().flatten()
    }

    pub fn in_zm_star(&self, t: u64) -> bool {
        self.unit_index(t).is_some()
    }

    /// Exponent vector of T[rep_index(t)], of length `num_generators()`
    pub fn discrete_log(&self, t: u64) -> Option<&[usize]> {
        let k = self.generators.len();
        self.rep_index(t).map(|i| &self.discrete_logs[i * k..(i + 1) * k])
    }

    /// Digit `dim` of slot index `k` in the mixed-radix numbering
    pub fn coordinate(&self, dim: usize, k: usize) -> usize {
        (k % self.suffix_order_products[dim]) / self.suffix_order_products[dim + 1]
    }

    /// Slot index obtained from `k` by adding `offset` to digit `dim` modulo
    /// the order of generator `dim`
    pub fn add_coord(&self, dim: usize, k: usize, offset: i64) -> usize {
        let order = self.generators[dim].order as i64;
        let digit = self.coordinate(dim, k);
        let shifted = (digit as i64 + offset).rem_euclid(order) as usize;
        k - digit * self.suffix_order_products[dim + 1] + shifted * self.suffix_order_products[dim + 1]
    }

    /// ∏ g_i^{e_i} mod m; extra exponents are ignored
    pub fn exponentiate(&self, exponents: &[usize], only_same_order: bool) -> u64 {
        let zm = Zn::new(self.m);
        let value = zm.prod(
            self.generators
                .iter()
                .zip(exponents)
                .filter(|(g, _)| !only_same_order || g.same_order_as_full)
                .map(|(g, &e)| zm.pow(zm.coerce(&ZZ, g.element as i64), e)),
        );
        zm.smallest_positive_lift(value) as u64
    }

    /// Advances `exponents` to the next mixed-radix vector (last digit fastest)
    ///
    /// Returns false, leaving the vector all zero, after the last combination.
    pub fn next_exp_vector(&self, exponents: &mut [usize]) -> bool {
        let k = exponents.len().min(self.generators.len());
        for i in (0..k).rev() {
            exponents[i] += 1;
            if exponents[i] < self.generators[i].order {
                return true;
            }
            exponents[i] = 0;
        }
        false
    }

    /// Order of the quotient group, or of the part spanned by same-order generators
    pub fn quotient_group_order(&self, only_same_order: bool) -> usize {
        self.generators
            .iter()
            .filter(|g| !only_same_order || g.same_order_as_full)
            .map(|g| g.order)
            .product()
    }

    /// Integer coefficients of Phi_m(X), constant term first
    pub fn phi_m_x(&self) -> &[BigInt] {
        &self.phi_m_x
    }

    /// max ||X^k mod Phi_m||_∞ over φ(m) <= k <= 2φ(m) - 2, at least 1
    pub fn ring_constant(&self) -> f64 {
        self.ring_constant
    }
}

impl Display for GroupStructure {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        writeln!(f, "m = {}, p = {}, phi(m) = {}", self.m, self.p, self.phi_m)?;
        writeln!(f, "  ord(p) = {}, {} slots", self.ord_p, self.n_slots)?;
        for g in &self.generators {
            writeln!(
                f,
                "  generator {} has order ({}= Z_m^*) of {}",
                g.element,
                if g.same_order_as_full { "=" } else { "!" },
                g.order
            )?;
        }
        write!(f, "  T = {:?}", self.representatives)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_m15_p2() {
        let g = GroupStructure::new(15, 2).unwrap();
        assert_eq!(g.phi_m(), 8);
        assert_eq!(g.ord_p(), 4);
        assert_eq!(g.n_slots(), 2);
        assert_eq!(g.num_generators(), 1);
        assert_eq!(g.generator(0), Some(11));
        assert_eq!(g.order_of(0), 2);
        assert!(g.same_order(0));
        assert_eq!(g.representatives(), &[1, 11]);
        assert_eq!(g.discrete_log(11), Some(&[1usize][..]));
        assert_eq!(g.rep_index(7), None);
        assert_eq!(g.discrete_log(7), None);
        assert_eq!(g.unit_index(7), Some(3));
        assert!(!g.in_zm_star(5));
    }

    #[test]
    fn test_m7_p2() {
        let g = GroupStructure::new(7, 2).unwrap();
        assert_eq!((g.phi_m(), g.ord_p(), g.n_slots()), (6, 3, 2));
        assert_eq!(g.representatives(), &[1, 6]);
        assert_eq!(g.phi_m_x().len(), 7);
    }

    #[test]
    fn test_m13_p3_is_cyclic_of_order_four() {
        let g = GroupStructure::new(13, 3).unwrap();
        assert_eq!(g.ord_p(), 3);
        assert_eq!(g.n_slots(), 4);
        assert_eq!(g.generator(0), Some(5));
        assert_eq!(g.representatives(), &[1, 5, 12, 8]);
        assert_eq!(g.quotient_group_order(true), 4);
    }

    #[test]
    fn test_same_order_generator_is_preferred() {
        // 3 has order 5 mod 11; 2 and 10 both have quotient order 2, only 10 = -1 squares to 1
        let g = GroupStructure::new(11, 3).unwrap();
        assert_eq!((g.ord_p(), g.n_slots()), (5, 2));
        assert_eq!(g.generator(0), Some(10));
        assert!(g.same_order(0));
    }

    #[test]
    fn test_generator_with_smaller_quotient_order() {
        // 19 ≡ -1 (mod 5): every unit outside {1, 4} squares to 4, not to 1
        let g = GroupStructure::new(5, 19).unwrap();
        assert_eq!((g.ord_p(), g.n_slots()), (2, 2));
        assert_eq!(g.generator(0), Some(2));
        assert!(!g.same_order(0));
        assert_eq!(g.representatives(), &[1, 2]);
        assert_eq!(g.quotient_group_order(true), 1);
        assert_eq!(g.exponentiate(&[1], true), 1);
    }

    #[test]
    fn test_invalid_parameters() {
        assert!(matches!(GroupStructure::new(15, 3), Err(SlotAlgebraError::NotCoprime { m: 15, p: 3 })));
        assert!(matches!(GroupStructure::new(15, 4), Err(SlotAlgebraError::NotPrime { value: 4 })));
        assert!(GroupStructure::new(1, 2).is_err());
    }

    #[test]
    fn test_display_lists_generators() {
        let g = GroupStructure::new(15, 2).unwrap();
        let text = g.to_string();
        assert!(text.contains("m = 15, p = 2, phi(m) = 8"));
        assert!(text.contains("generator 11"));
    }

    proptest! {
        #[test]
        fn test_structure_invariants(m in 3u64..120, p in prop::sample::select(vec![2u64, 3, 5, 7, 11])) {
            prop_assume!(m % p != 0);
            let g = GroupStructure::new(m, p).unwrap();
            let zm = Zn::new(m);
            let p_mod = zm.coerce(&ZZ, p as i64);

            prop_assert!(zm.is_one(&zm.pow(p_mod, g.ord_p())));
            for k in 1..g.ord_p() {
                prop_assert!(!zm.is_one(&zm.pow(p_mod, k)));
            }
            prop_assert_eq!(g.n_slots() * g.ord_p(), g.phi_m() as usize);
            prop_assert_eq!(g.representatives().len(), g.n_slots());

            // one representative per coset of ⟨p⟩
            let mut seen = std::collections::HashSet::new();
            for &t in g.representatives() {
                let t_mod = zm.coerce(&ZZ, t as i64);
                prop_assert!(zm.is_unit(&t_mod));
                let coset_min = (0..g.ord_p())
                    .map(|j| zm.smallest_positive_lift(zm.mul(t_mod, zm.pow(p_mod, j))))
                    .min()
                    .unwrap();
                prop_assert!(seen.insert(coset_min));
            }

            for (i, &t) in g.representatives().iter().enumerate() {
                let dlog = g.discrete_log(t).unwrap();
                prop_assert_eq!(dlog.len(), g.num_generators());
                prop_assert_eq!(g.exponentiate(dlog, false), t);
                prop_assert_eq!(g.rep_index(t), Some(i));
            }
        }

        #[test]
        fn test_add_coord_laws(m in 3u64..200, a in -20i64..20, b in -20i64..20) {
            prop_assume!(m % 2 != 0);
            let g = GroupStructure::new(m, 2).unwrap();
            for dim in 0..g.num_generators() {
                let order = g.order_of(dim) as i64;
                for k in 0..g.n_slots() {
                    prop_assert_eq!(g.add_coord(dim, k, 0), k);
                    let twice = g.add_coord(dim, g.add_coord(dim, k, a), b);
                    prop_assert_eq!(twice, g.add_coord(dim, k, (a + b).rem_euclid(order)));
                    for other in 0..g.num_generators() {
                        if other != dim {
                            prop_assert_eq!(g.coordinate(other, twice), g.coordinate(other, k));
                        }
                    }
                }
            }
        }

        #[test]
        fn test_next_exp_vector_count(m in 3u64..150) {
            prop_assume!(m % 3 != 0);
            let g = GroupStructure::new(m, 3).unwrap();
            let mut e = vec![0usize; g.num_generators()];
            let mut count = 1;
            while g.next_exp_vector(&mut e) {
                count += 1;
            }
            prop_assert_eq!(count, g.quotient_group_order(false));
            prop_assert!(e.iter().all(|&d| d == 0));
        }
    }
}
