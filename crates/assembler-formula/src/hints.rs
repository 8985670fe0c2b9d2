//! Bracket-balance hints attached to failed calculations

const PAIRS: [(char, char, &str); 3] = [
    ('(', ')', "parentheses"),
    ('[', ']', "square brackets"),
    ('{', '}', "braces"),
];

/// One message per delimiter pair whose open and close counts differ
///
/// Counting is purely textual; a balanced count does not mean the nesting is
/// correct, only that nothing is obviously missing.
pub fn bracket_hints(text: &str) -> Vec<String> {
    PAIRS
        .iter()
        .filter_map(|&(open, close, label)| {
            let opened = text.chars().filter(|&c| c == open).count();
            let closed = text.chars().filter(|&c| c == close).count();
            (opened != closed).then(|| {
                format!(
                    "Unbalanced {}: {} '{}' opened, {} '{}' closed",
                    label, opened, open, closed, close
                )
            })
        })
        .collect()
}
