use url::Url;

use crate::matcher::compile::is_name_char;
use crate::path::ensure_leading_slash;

/// True when `destination` is a full URL with a scheme and an authority.
pub fn is_absolute_url(destination: &str) -> bool {
    Url::parse(destination)
        .map(|url| url.has_host())
        .unwrap_or(false)
}

/// Substitutes `:name` placeholders in `destination` with captured values.
///
/// Placeholders without a binding are dropped. Values are inserted verbatim;
/// encoding happens once, when the final `Location` is written. For a full URL
/// only the part after the authority is templated, so `:8080` survives.
pub fn render_destination(destination: &str, bindings: &[(String, String)]) -> String {
    if is_absolute_url(destination) {
        let split = authority_end(destination);
        let (origin, rest) = destination.split_at(split);
        return format!("{origin}{}", substitute(rest, bindings));
    }

    ensure_leading_slash(&substitute(destination, bindings))
}

fn authority_end(url: &str) -> usize {
    let after_scheme = url.find("://").map(|idx| idx + 3).unwrap_or(0);
    url[after_scheme..]
        .find(['/', '?', '#'])
        .map(|idx| after_scheme + idx)
        .unwrap_or(url.len())
}

fn substitute(template: &str, bindings: &[(String, String)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(idx) = rest.find(':') {
        out.push_str(&rest[..idx]);
        let after = &rest[idx + 1..];
        let name_len = after
            .char_indices()
            .find(|(_, c)| !is_name_char(*c))
            .map(|(i, _)| i)
            .unwrap_or(after.len());

        if name_len == 0 {
            out.push(':');
            rest = after;
            continue;
        }

        let name = &after[..name_len];
        if let Some((_, value)) = bindings.iter().find(|(key, _)| key == name) {
            out.push_str(value);
        }
        rest = &after[name_len..];
    }

    out.push_str(rest);
    out
}
