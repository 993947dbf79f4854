use std::collections::BTreeSet;

/// Return `desired` if no name in `taken` equals it, otherwise `desired` with the smallest
/// `(n)` suffix (n >= 1) that is free.
///
/// Comparison is exact after trimming surrounding whitespace from `desired`.
pub fn unique_name<'a>(desired: &str, taken: impl IntoIterator<Item = &'a str>) -> String {
    let desired = desired.trim();
    let taken: BTreeSet<&str> = taken.into_iter().collect();
    if !taken.contains(desired) {
        return desired.to_string();
    }
    (1u64..)
        .map(|n| format!("{desired}({n})"))
        .find(|candidate| !taken.contains(candidate.as_str()))
        .unwrap_or_else(|| desired.to_string())
}

#[cfg(test)]
#[path = "../../tests/unit/layers/naming.rs"]
mod tests;
