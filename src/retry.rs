use std::time::Duration;

/// Delay before retry number `retry` (zero-based): `base`, `2·base`, `4·base`, …
///
/// Saturates at `u64::MAX` milliseconds instead of overflowing.
pub fn backoff_delay(base_ms: u64, retry: usize) -> Duration {
    let multiplier = u32::try_from(retry)
        .ok()
        .and_then(|exp| 2u64.checked_pow(exp))
        .unwrap_or(u64::MAX);
    Duration::from_millis(base_ms.saturating_mul(multiplier))
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::backoff_delay;

    #[test]
    fn doubles_from_base() {
        let delays: Vec<_> = (0..4).map(|retry| backoff_delay(1_000, retry)).collect();
        assert_eq!(
            delays,
            [1_000, 2_000, 4_000, 8_000].map(Duration::from_millis)
        );
    }

    #[test]
    fn keeps_doubling_for_long_retry_chains() {
        assert_eq!(backoff_delay(1_000, 17), Duration::from_millis(1_000 << 17));
        assert_eq!(backoff_delay(1, 40), Duration::from_millis(1 << 40));
        assert_eq!(backoff_delay(1, 63), Duration::from_millis(1 << 63));
    }

    #[test]
    fn saturates_instead_of_overflowing() {
        assert_eq!(backoff_delay(u64::MAX, 3), Duration::from_millis(u64::MAX));
        assert_eq!(backoff_delay(1, 64), Duration::from_millis(u64::MAX));
        assert_eq!(backoff_delay(3, 63), Duration::from_millis(u64::MAX));
        assert_eq!(backoff_delay(1, usize::MAX), Duration::from_millis(u64::MAX));
        assert_eq!(backoff_delay(0, 5), Duration::ZERO);
        assert_eq!(backoff_delay(0, 100), Duration::ZERO);
    }
}
