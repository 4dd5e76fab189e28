//! Integer number theory on top of `feanor_math`
//!
//! Primality, factorization and multiplicative orders are delegated to
//! `feanor_math::algorithms`; this module only fixes the integer rings the
//! crate works in and the range of supported moduli p^r.

use feanor_math::algorithms::discrete_log;
use feanor_math::algorithms::int_factor::factor;
use feanor_math::algorithms::miller_rabin;
use feanor_math::divisibility::*;
use feanor_math::primitive_int::*;
use feanor_math::ring::*;
use feanor_math::rings::zn::zn_64::Zn;
use feanor_math::rings::zn::*;

/// Integers as i64, the integer ring of every residue ring in the crate
pub const ZZ: StaticRing<i64> = StaticRing::<i64>::RING;

const ZZ128: StaticRing<i128> = StaticRing::<i128>::RING;

/// Rounds of Miller-Rabin used to accept a prime
const PRIMALITY_ROUNDS: usize = 10;

/// Largest supported modulus p^r (inclusive), the bound of `zn_64::Zn`
pub const MAX_MODULUS: u64 = (1 << 62) / 9;

/// Number of bits every p^r up to `MAX_MODULUS` fits in
pub const MAX_MODULUS_BITS: u32 = 58;

/// Whether `n` is prime
pub fn is_prime(n: u64) -> bool {
    n >= 2 && miller_rabin::is_prime(ZZ128, &(n as i128), PRIMALITY_ROUNDS)
}

/// Euler's totient φ(n) for 1 <= n < 2^63
pub fn euler_phi(n: u64) -> u64 {
    factor(ZZ, n as i64)
        .into_iter()
        .fold(n, |acc, (q, _)| acc / q as u64 * (q as u64 - 1))
}

/// Multiplicative order of `a` modulo `m`
///
/// # Returns
/// * `Option<u64>` - The least k > 0 with a^k ≡ 1 (mod m), or `None` if
///   gcd(a, m) != 1 or m is outside [1, MAX_MODULUS]
pub fn multiplicative_order(a: u64, m: u64) -> Option<u64> {
    match m {
        0 => return None,
        1 => return Some(1),
        _ if m > MAX_MODULUS => return None,
        _ => {}
    }
    let zm = Zn::new(m);
    let x = zm.coerce(&ZZ, (a % m) as i64);
    if !zm.is_unit(&x) {
        return None;
    }
    Some(discrete_log::multiplicative_order(x, zm) as u64)
}

/// p^r, or `None` if r = 0 or the result exceeds `MAX_MODULUS`
pub fn checked_prime_power(p: u64, r: u32) -> Option<u64> {
    if r == 0 {
        return None;
    }
    p.checked_pow(r).filter(|&q| q <= MAX_MODULUS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_small_primes() {
        let primes: Vec<u64> = (0..50).filter(|&n| is_prime(n)).collect();
        assert_eq!(primes, vec![2, 3, 5, 7, 11, 13, 17, 19, 23, 29, 31, 37, 41, 43, 47]);
        assert!(is_prime(2_147_483_647));
        assert!(!is_prime(3_215_031_751)); // strong pseudoprime to bases 2, 3, 5, 7
        assert!(is_prime(18_446_744_073_709_551_557));
    }

    #[test]
    fn test_totient_and_order() {
        assert_eq!(euler_phi(1), 1);
        assert_eq!(euler_phi(15), 8);
        assert_eq!(euler_phi(7), 6);
        assert_eq!(euler_phi(4369), 4096);

        assert_eq!(multiplicative_order(2, 15), Some(4));
        assert_eq!(multiplicative_order(2, 7), Some(3));
        assert_eq!(multiplicative_order(2, 4369), Some(16));
        assert_eq!(multiplicative_order(3, 15), None);
        assert_eq!(multiplicative_order(5, 1), Some(1));
    }

    #[test]
    fn test_prime_power_range() {
        assert_eq!(checked_prime_power(3, 4), Some(81));
        assert_eq!(checked_prime_power(2, 0), None);
        assert_eq!(checked_prime_power(2, 58), Some(1 << 58));
        assert_eq!(checked_prime_power(2, 59), None);
        assert_eq!(checked_prime_power(3, 41), None);
    }

    proptest! {
        #[test]
        fn test_order_is_minimal(a in 2u64..200, m in 2u64..200) {
            let zm = Zn::new(m);
            let x = zm.coerce(&ZZ, a as i64);
            prop_assume!(zm.is_unit(&x));
            let k = multiplicative_order(a, m).unwrap();
            prop_assert!(zm.is_one(&zm.pow(zm.clone_el(&x), k as usize)));
            for j in 1..k {
                prop_assert!(!zm.is_one(&zm.pow(zm.clone_el(&x), j as usize)));
            }
        }
    }
}
