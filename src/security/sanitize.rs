/// Make a user-supplied value safe to embed in a file name.
///
/// Path separators, shell-hostile characters and whitespace become `_`,
/// control characters are dropped. Returns `None` when nothing usable is
/// left, so the caller can omit the component entirely.
pub fn sanitize_name_component(value: &str) -> Option<String> {
    let mut sanitized = String::with_capacity(value.len());

    for ch in value.trim().chars() {
        match ch {
            '/' | '\\' => sanitized.push('_'),
            '<' | '>' | ':' | '"' | '|' | '?' | '*' | '\'' | '`' | '$' => sanitized.push('_'),
            c if c.is_whitespace() => sanitized.push('_'),
            c if c.is_control() => continue,
            c => sanitized.push(c),
        }
    }

    let sanitized = sanitized.trim_matches('.').to_string();
    if sanitized.is_empty() {
        None
    } else {
        Some(sanitized)
    }
}
