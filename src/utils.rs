/// [Szudzik pairing function][szudzik-pairing], with wrapping arithmetic.
///
/// ```text
/// (a, b) -> if (a<b) then (b^2 + a) else (a^2 + a + b)
/// ```
///
/// [szudzik-pairing]: http://szudzik.com/ElegantPairing.pdf
pub fn pairing_szudzik(a: u64, b: u64) -> u64 {
    if a < b {
        b.wrapping_mul(b).wrapping_add(a)
    } else {
        a.wrapping_mul(a).wrapping_add(a).wrapping_add(b)
    }
}

/// Final avalanche step (from SplitMix64), so that the low bits used for bucket
/// selection depend on every input bit.
pub fn mix(x: u64) -> u64 {
    let x = (x ^ (x >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    let x = (x ^ (x >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    x ^ (x >> 31)
}

pub fn pairing2(a: u64, b: u64) -> u64 {
    mix(pairing_szudzik(a, b))
}

pub fn pairing3(a: u64, b: u64, c: u64) -> u64 {
    mix(pairing_szudzik(pairing_szudzik(a, b), c))
}

/// Hash used by the node table and the computed table.
pub trait MyHash {
    fn hash(&self) -> u64;
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_szudzik_small() {
        assert_eq!(pairing_szudzik(0, 0), 0);
        assert_eq!(pairing_szudzik(0, 1), 1);
        assert_eq!(pairing_szudzik(1, 0), 2);
        assert_eq!(pairing_szudzik(1, 1), 3);
        assert_eq!(pairing_szudzik(2, 3), 11);
    }

    #[test]
    fn test_pairing_no_overflow_panic() {
        let _ = pairing3(u64::MAX, u64::MAX - 1, u64::MAX);
    }

    #[test]
    fn test_pairing_spreads_low_bits() {
        let buckets: HashSet<u64> = (0..64u64)
            .flat_map(|a| (0..64u64).map(move |b| pairing2(a, b) & 0xff))
            .collect();
        assert!(buckets.len() > 200);
    }
}
