//! Name helpers

/// Split a qualified name on its first `':'` into `(prefix, local)`
pub fn split_qname(qualified_name: &str) -> (Option<&str>, &str) {
    match qualified_name.split_once(':') {
        Some((prefix, local)) => (Some(prefix), local),
        None => (None, qualified_name),
    }
}

/// Build `prefix:local`, or just `local` without a prefix
pub fn join_qname(prefix: Option<&str>, local: &str) -> String {
    match prefix {
        Some(prefix) => format!("{}:{}", prefix, local),
        None => local.to_string(),
    }
}
