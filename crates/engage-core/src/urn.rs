//! Contact URNs: `namespace:value` addresses in the messaging platform.

/// Split a URN into `(namespace, value)` on its first `:`.
///
/// Colons after the first stay in the value, so `ext:a:b` yields `("ext", "a:b")`.
/// Returns `None` when there is no colon, or either side of it is empty.
pub fn split_urn(urn: &str) -> Option<(&str, &str)> {
    urn.split_once(':')
        .filter(|(namespace, value)| !namespace.is_empty() && !value.is_empty())
}

/// CSV column name for a URN namespace, e.g. `URN:tel`.
pub fn urn_column(namespace: &str) -> String {
    format!("URN:{namespace}")
}
