//! Environment variable helpers

/// The variable's value, treating unset and whitespace-only alike.
pub fn non_empty_var(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// `1`, `true`, `yes` or `on` (any case) enable a flag.
pub fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

pub fn flag(key: &str) -> bool {
    non_empty_var(key).is_some_and(|v| is_truthy(&v))
}
