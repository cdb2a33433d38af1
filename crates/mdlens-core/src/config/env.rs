use std::str::FromStr;

#[must_use]
pub(super) fn read_env_u64(name: &str, default_value: u64, min_value: u64) -> u64 {
    parse_bounded(std::env::var(name).ok().as_deref(), default_value, min_value)
}

#[must_use]
pub(super) fn read_env_usize(name: &str, default_value: usize, min_value: usize) -> usize {
    parse_bounded(std::env::var(name).ok().as_deref(), default_value, min_value)
}

#[must_use]
pub(super) fn parse_bounded<T>(raw: Option<&str>, default_value: T, min_value: T) -> T
where
    T: FromStr + PartialOrd,
{
    raw.and_then(|raw| raw.trim().parse::<T>().ok())
        .filter(|value| *value >= min_value)
        .unwrap_or(default_value)
}

#[cfg(test)]
mod tests {
    use super::parse_bounded;

    #[test]
    fn parse_bounded_accepts_trimmed_values_at_or_above_minimum() {
        assert_eq!(parse_bounded(Some(" 250 "), 300_u64, 0), 250);
        assert_eq!(parse_bounded(Some("1"), 5_usize, 1), 1);
    }

    #[test]
    fn parse_bounded_falls_back_on_missing_garbage_or_too_small() {
        assert_eq!(parse_bounded(None, 300_u64, 0), 300);
        assert_eq!(parse_bounded(Some("soon"), 300_u64, 0), 300);
        assert_eq!(parse_bounded(Some("0"), 5_usize, 1), 5);
    }
}
