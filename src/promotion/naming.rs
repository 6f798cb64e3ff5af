//! Accessor name derivation

/// Convert `snake_case` to `ClassCase`.
///
/// Every `_` is dropped; an ASCII letter directly after it is upper-cased.
/// The first character of the result is upper-cased.
pub fn to_class_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut chars = name.chars().peekable();

    while let Some(c) = chars.next() {
        if c == '_' {
            if let Some(next) = chars.next_if(|n| n.is_ascii_alphabetic()) {
                out.push(next.to_ascii_uppercase());
            }
        } else {
            out.push(c);
        }
    }

    let mut result = out.chars();
    match result.next() {
        Some(first) => first.to_uppercase().chain(result).collect(),
        None => String::new(),
    }
}

/// Derive the accessor name for a target property, e.g. `has` + `HomeAddress`
pub fn accessor_name(prefix: &str, target_property: &str) -> String {
    format!("{}{}", prefix, to_class_case(target_property))
}
