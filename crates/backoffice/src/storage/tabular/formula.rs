//! Formula and pagination helpers for the tabular backend. Pure functions.

/// Escapes a value for use inside a double-quoted formula string.
pub fn escape_string(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Builds a case-insensitive substring formula OR-ed across `fields`.
///
/// Returns `None` when there are no fields to search.
pub fn search_formula(query: &str, fields: &[String]) -> Option<String> {
    let needle = escape_string(&query.to_lowercase());
    let terms: Vec<String> = fields
        .iter()
        .map(|field| format!("FIND(\"{needle}\", LOWER({{{field}}}))>0"))
        .collect();

    match terms.len() {
        0 => None,
        1 => terms.into_iter().next(),
        _ => Some(format!("OR({})", terms.join(", "))),
    }
}

/// Reconstructs a total count from the page the service returned.
///
/// The service reports no total, only a cursor for the next page:
/// - a numeric cursor is the offset of the next page, so the total is at
///   least `cursor + page_len`
/// - an opaque cursor only says more rows exist, so one more is assumed
/// - no cursor means this was the last page
pub fn estimate_count(offset: u64, page_len: usize, next_cursor: Option<&str>) -> u64 {
    let page_len = page_len as u64;
    match next_cursor {
        Some(cursor) => match cursor.trim().parse::<u64>() {
            Ok(next) => next.saturating_add(page_len),
            Err(_) => offset.saturating_add(page_len).saturating_add(1),
        },
        None => offset.saturating_add(page_len),
    }
}
