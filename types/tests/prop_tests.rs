use proptest::prelude::*;

use scloud_types::{Dec, Timestamp, TokenAmount};

proptest! {
    /// Display then parse yields the same decimal.
    #[test]
    fn dec_display_parse_roundtrip(raw in 0u128..u128::MAX) {
        let d = Dec::from_raw(raw);
        let back: Dec = d.to_string().parse().unwrap();
        prop_assert_eq!(back, d);
    }

    /// Truncating multiplication never exceeds the exact product.
    #[test]
    fn dec_mul_truncates_down(a in 0u128..1_000_000_000_000u128, b in 0u128..1_000_000u128) {
        let x = Dec::from_ratio(a, 1_000).unwrap();
        let y = Dec::from_ratio(b, 1_000).unwrap();
        let product = x.checked_mul(y).unwrap();
        // Exact product scaled by 10^6 is a * b; the truncated value can only be lower.
        let exact = Dec::from_ratio(a * b, 1_000_000).unwrap();
        prop_assert!(product <= exact);
    }

    /// from_ratio(n, d) * d truncates back to at most n.
    #[test]
    fn dec_ratio_times_den(n in 0u128..1_000_000_000, den in 1u128..1_000_000) {
        let r = Dec::from_ratio(n, den).unwrap();
        let back = r.mul_int_truncate(den).unwrap();
        prop_assert!(back <= n);
        prop_assert!(n - back <= 1);
    }

    /// Token amount checked arithmetic agrees with u128 arithmetic.
    #[test]
    fn token_amount_checked_add(a in 0u128..u128::MAX / 2, b in 0u128..u128::MAX / 2) {
        let sum = TokenAmount::new(a).checked_add(TokenAmount::new(b)).unwrap();
        prop_assert_eq!(sum.raw(), a + b);
        prop_assert_eq!(sum.checked_sub(TokenAmount::new(b)).unwrap().raw(), a);
    }

    /// Timestamp has_expired agrees with manual arithmetic.
    #[test]
    fn timestamp_has_expired(base in 0u64..1_000_000, dur in 0u64..1_000_000, now in 0u64..3_000_000) {
        let t = Timestamp::new(base);
        prop_assert_eq!(t.has_expired(dur, Timestamp::new(now)), now >= base + dur);
        prop_assert_eq!(t.plus_secs(dur).as_secs(), base + dur);
    }
}
