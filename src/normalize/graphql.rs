//! GraphQL query normalisation: whitespace and comment folding.
//!
//! GraphQL traffic travels over the `http` package like any other
//! HTTP call, so there's no separate `graphql` shape comparator —
//! [`super::http::HttpShapeComparator`] calls [`normalize_query`]
//! itself when a body looks GraphQL-shaped (an object with a `query`
//! string).

/// Collapse a GraphQL document to a single canonical form: line
/// comments (`# ...`) stripped, then every run of whitespace folded to
/// a single ASCII space, with leading/trailing space trimmed. A
/// single pass over the characters, mirroring the same
/// collapse-as-you-scan approach the canonical text normaliser uses
/// for free text, generalised here to also drop comments first.
pub fn normalize_query(query: &str) -> String {
    let mut without_comments = String::with_capacity(query.len());
    let mut in_comment = false;
    for ch in query.chars() {
        match ch {
            '#' => in_comment = true,
            '\n' => {
                in_comment = false;
                without_comments.push('\n');
            }
            _ if in_comment => {}
            _ => without_comments.push(ch),
        }
    }

    let mut collapsed = String::with_capacity(without_comments.len());
    let mut last_was_space = true; // trims leading whitespace
    for ch in without_comments.chars() {
        if ch.is_whitespace() {
            if !last_was_space {
                collapsed.push(' ');
            }
            last_was_space = true;
        } else {
            collapsed.push(ch);
            last_was_space = false;
        }
    }
    if collapsed.ends_with(' ') {
        collapsed.pop();
    }
    collapsed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collapses_whitespace_runs() {
        let a = normalize_query("query  {\n  user {\n    id\n  }\n}");
        let b = normalize_query("query { user { id } }");
        assert_eq!(a, b);
    }

    #[test]
    fn strips_line_comments() {
        let a = normalize_query("query {\n  user { id } # fetch the user\n}");
        let b = normalize_query("query { user { id } }");
        assert_eq!(a, b);
    }

    #[test]
    fn distinguishes_different_queries() {
        let a = normalize_query("query { user { id } }");
        let b = normalize_query("query { user { name } }");
        assert_ne!(a, b);
    }
}
