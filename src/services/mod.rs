pub mod book;
pub mod comment;
pub mod daily;
pub mod task;
pub mod user;

/// Substring-containment pattern for `LIKE ? ESCAPE '\'` predicates.
pub(crate) fn contains_pattern(term: &str) -> String {
    let mut escaped = String::with_capacity(term.len() + 2);
    for ch in term.chars() {
        if matches!(ch, '\\' | '%' | '_') {
            escaped.push('\\');
        }
        escaped.push(ch);
    }
    format!("%{}%", escaped)
}
