use crate::conf::RewriteRule;
use crate::matcher::render_destination;

/// Runs `path` through the rewrite rules until none applies.
///
/// Every rule fires at most once. Returns `None` when no rule ever matched,
/// otherwise the last rewritten path.
pub fn resolve_rewrites(path: &str, rules: &[RewriteRule]) -> Option<String> {
    let mut eligible: Vec<usize> = (0..rules.len()).collect();
    let mut current = path.to_string();
    let mut rewritten = false;

    while let Some((slot, bindings)) = eligible.iter().enumerate().find_map(|(slot, &idx)| {
        rules[idx]
            .source
            .matches(&current, true)
            .map(|m| (slot, m.bindings))
    }) {
        let rule = &rules[eligible.remove(slot)];
        let next = render_destination(&rule.destination, &bindings);

        tracing::debug!(from = %current, to = %next, source = %rule.source, "rewrite applied");

        current = next;
        rewritten = true;
    }

    rewritten.then_some(current)
}
