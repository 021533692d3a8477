//! Countdown formatting.

/// Rendering of any non-positive duration.
pub const ZERO_CLOCK: &str = "00:00:00";

/// Format a millisecond duration as a zero-padded `HH:MM:SS` clock.
///
/// Hours are not wrapped at 24, so 25 hours renders as `25:00:00`; past 99
/// hours the hour field simply grows wider. Zero and negative durations
/// render as [`ZERO_CLOCK`]. Sub-second remainders are truncated.
pub fn format_duration(duration_ms: i64) -> String {
    if duration_ms <= 0 {
        return ZERO_CLOCK.to_string();
    }
    let total_secs = duration_ms / 1000;
    let hours = total_secs / 3600;
    let minutes = (total_secs / 60) % 60;
    let seconds = total_secs % 60;
    format!("{hours:02}:{minutes:02}:{seconds:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn non_positive_is_zero_clock() {
        assert_eq!(format_duration(0), "00:00:00");
        assert_eq!(format_duration(-1000), "00:00:00");
        assert_eq!(format_duration(i64::MIN), "00:00:00");
    }

    #[test]
    fn formats_hh_mm_ss() {
        assert_eq!(format_duration(5000), "00:00:05");
        assert_eq!(format_duration(61000), "00:01:01");
        assert_eq!(format_duration(3661000), "01:01:01");
        assert_eq!(format_duration(3600000), "01:00:00");
    }

    #[test]
    fn hours_are_not_wrapped() {
        assert_eq!(format_duration(90_000_000), "25:00:00");
        assert_eq!(format_duration(30 * 24 * 3_600_000), "720:00:00");
    }

    #[test]
    fn sub_second_remainder_is_truncated() {
        assert_eq!(format_duration(999), "00:00:00");
        assert_eq!(format_duration(1999), "00:00:01");
    }

    #[test]
    fn extreme_input_does_not_panic() {
        assert!(format_duration(i64::MAX).ends_with(":55"));
    }
}
