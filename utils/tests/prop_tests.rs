use proptest::prelude::*;

use metis_utils::format_duration;

fn parse_clock(s: &str) -> (i64, i64, i64) {
    let parts: Vec<i64> = s.split(':').map(|p| p.parse().unwrap()).collect();
    (parts[0], parts[1], parts[2])
}

proptest! {
    /// Every non-positive duration collapses to the zero clock.
    #[test]
    fn non_positive_is_zero(ms in i64::MIN..=0i64) {
        prop_assert_eq!(format_duration(ms), "00:00:00");
    }

    /// Formatting is a pure function of its input.
    #[test]
    fn deterministic(ms in any::<i64>()) {
        prop_assert_eq!(format_duration(ms), format_duration(ms));
    }

    /// The clock fields reassemble into the whole seconds of the input.
    #[test]
    fn fields_reassemble(ms in 1i64..10_000_000_000i64) {
        let (h, m, s) = parse_clock(&format_duration(ms));
        prop_assert!(m < 60);
        prop_assert!(s < 60);
        prop_assert_eq!(h * 3600 + m * 60 + s, ms / 1000);
    }

    /// Minute and second fields are always exactly two digits, hours at least two.
    #[test]
    fn padded_fields(ms in 1i64..1_000_000_000_000i64) {
        let out = format_duration(ms);
        let fields: Vec<&str> = out.split(':').collect();
        prop_assert_eq!(fields.len(), 3);
        prop_assert!(fields[0].len() >= 2);
        prop_assert_eq!(fields[1].len(), 2);
        prop_assert_eq!(fields[2].len(), 2);
    }

    /// Within one hour value, a longer duration never formats smaller.
    #[test]
    fn monotonic_within_hour(hour in 0i64..200, a in 0i64..3_600_000, b in 0i64..3_600_000) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let base = hour * 3_600_000;
        let (lo_ms, hi_ms) = (base + lo + 1, base + hi + 1);
        prop_assume!(lo_ms / 3_600_000 == hi_ms / 3_600_000);
        prop_assert!(format_duration(lo_ms) <= format_duration(hi_ms));
    }
}
