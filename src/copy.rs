//! Copy Rewrite - Deterministic Fallback for Banned Claims
//!
//! Swaps common non-compliant phrases for neutral wording. It is a plain
//! substitution table, so the output is predictable and reviewable.

use regex::{Regex, RegexBuilder};
use std::sync::LazyLock;

/// Pattern and replacement, applied top to bottom.
const REWRITES: [(&str, &str); 6] = [
    (r"\bclinically\s+proven\b", "tested"),
    (r"\bguarantee[ds]?\b", "designed to"),
    (r"\bfree\b", "great value"),
    (r"\bwin\b", "discover"),
    (r"\bcompetition\b|\bcontest\b", "offer"),
    (r"\bsustainable\b|\beco\b|\benvironment\b", "responsible"),
];

static RULES: LazyLock<Vec<(Regex, &'static str)>> = LazyLock::new(|| {
    REWRITES
        .iter()
        .filter_map(|(pattern, replacement)| {
            RegexBuilder::new(pattern)
                .case_insensitive(true)
                .build()
                .ok()
                .map(|re| (re, *replacement))
        })
        .collect()
});

/// Rewrite banned claims in `text`, drop pound signs and collapse whitespace.
pub fn rewrite_banned_copy(text: &str) -> String {
    let mut out = text.to_string();
    for (re, replacement) in RULES.iter() {
        out = re.replace_all(&out, *replacement).into_owned();
    }
    out.replace('£', "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
