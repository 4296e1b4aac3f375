//! Environment lookups for `EDUDASH_`-prefixed settings.

use std::str::FromStr;

const ENV_PREFIX: &str = "EDUDASH_";

/// Read `EDUDASH_{key}`, falling back to the bare `{key}`.
///
/// # Examples
///
/// ```rust
/// use edudash::utils::get_env_with_prefix;
///
/// // EDUDASH_TRIAL_DURATION_DAYS wins over TRIAL_DURATION_DAYS
/// let days = get_env_with_prefix("TRIAL_DURATION_DAYS");
/// ```
pub fn get_env_with_prefix(key: &str) -> Option<String> {
    std::env::var(format!("{ENV_PREFIX}{key}"))
        .or_else(|_| std::env::var(key))
        .ok()
}

/// Read and parse a prefixed setting.
///
/// Returns `None` when the variable is unset or does not parse as `T`. A
/// value that fails to parse is logged so a typo in a deployment does not
/// silently change trial lengths.
pub fn parse_env_with_prefix<T: FromStr>(key: &str) -> Option<T> {
    let raw = get_env_with_prefix(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            tracing::warn!(
                target: "edudash::config",
                key,
                value = %raw,
                "Ignoring unparseable environment setting"
            );
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prefixed_value_wins() {
        unsafe {
            std::env::set_var("EDUDASH_UTILS_GRACE_DAYS", "3");
            std::env::set_var("UTILS_GRACE_DAYS", "9");
        }
        assert_eq!(get_env_with_prefix("UTILS_GRACE_DAYS").as_deref(), Some("3"));
        unsafe {
            std::env::remove_var("EDUDASH_UTILS_GRACE_DAYS");
        }
        assert_eq!(get_env_with_prefix("UTILS_GRACE_DAYS").as_deref(), Some("9"));
        unsafe {
            std::env::remove_var("UTILS_GRACE_DAYS");
        }
        assert_eq!(get_env_with_prefix("UTILS_GRACE_DAYS"), None);
    }

    #[test]
    fn test_parse_env() {
        unsafe {
            std::env::set_var("EDUDASH_UTILS_TRIAL_DAYS", " 14 ");
            std::env::set_var("EDUDASH_UTILS_JSON_FLAG", "yes please");
        }
        assert_eq!(parse_env_with_prefix::<u32>("UTILS_TRIAL_DAYS"), Some(14));
        assert_eq!(parse_env_with_prefix::<bool>("UTILS_JSON_FLAG"), None);
        assert_eq!(parse_env_with_prefix::<u32>("UTILS_UNSET_DAYS"), None);
        unsafe {
            std::env::remove_var("EDUDASH_UTILS_TRIAL_DAYS");
            std::env::remove_var("EDUDASH_UTILS_JSON_FLAG");
        }
    }
}
