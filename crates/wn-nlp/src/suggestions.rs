//! Autocomplete phrases for the query box.

/// Maximum number of suggestions returned.
pub const MAX_SUGGESTIONS: usize = 10;

const BUILTIN: &[&str] = &[
    "Create a network with CIDR",
    "List all networks",
    "Find network",
    "Delete network",
    "Create host record",
    "Update A record",
    "Get next available IP",
    "Show network utilization",
    "Create DNS zone",
    "Find all host records",
];

/// Built-in phrases followed by `examples` (tool example phrases) that
/// contain `query`, case-insensitively. Deduplicated, order preserved.
pub fn suggest(query: &str, examples: &[String]) -> Vec<String> {
    let needle = query.trim().to_lowercase();
    let mut out: Vec<String> = Vec::new();

    let candidates = BUILTIN.iter().copied().chain(examples.iter().map(String::as_str));
    for phrase in candidates {
        if out.len() == MAX_SUGGESTIONS {
            break;
        }
        if phrase.is_empty() || !phrase.to_lowercase().contains(&needle) {
            continue;
        }
        if !out.iter().any(|s| s.eq_ignore_ascii_case(phrase)) {
            out.push(phrase.to_string());
        }
    }
    out
}
