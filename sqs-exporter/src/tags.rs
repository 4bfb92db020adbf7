/// Maps an arbitrary tag name to a Prometheus-safe label name.
///
/// The name is lowercased with Unicode rules first, so a character such as
/// the Kelvin sign becomes ASCII `k`. Afterwards every run of characters
/// outside `[a-z0-9]` collapses to one `_`.
pub fn normalize_tag(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut in_separator = false;
    for c in name.chars().flat_map(char::to_lowercase) {
        if c.is_ascii_lowercase() || c.is_ascii_digit() {
            out.push(c);
            in_separator = false;
        } else if !in_separator {
            out.push('_');
            in_separator = true;
        }
    }
    out
}

/// A queue tag the operator wants exported as a label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedTag {
    pub original: String,
    pub normalized: String,
}

impl ExportedTag {
    pub fn new(original: impl Into<String>) -> Self {
        let original = original.into();
        let normalized = normalize_tag(&original);
        Self { original, normalized }
    }

    pub fn parse_list(s: &str) -> Vec<ExportedTag> {
        s.split(',')
            .map(str::trim)
            .filter(|x| !x.is_empty())
            .map(ExportedTag::new)
            .collect()
    }
}
