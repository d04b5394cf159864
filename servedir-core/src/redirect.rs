use http::StatusCode;
use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::conf::ServeConfig;
use crate::matcher::{is_absolute_url, render_destination};
use crate::path::{collapse_slashes, ensure_leading_slash, extension, last_segment};

/// Characters a browser escapes when it encodes a whole URI. Reserved
/// characters (`/?#&=:;@+$,`) and `%` sequences in config-authored
/// destinations are kept.
const URI: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'<')
    .add(b'>')
    .add(b'\\')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}');

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirect {
    pub target: String,
    pub status: StatusCode,
}

impl Redirect {
    fn new(target: String, status: StatusCode) -> Self {
        Self { target, status }
    }

    /// Value for the `Location` header.
    pub fn location(&self) -> String {
        utf8_percent_encode(&self.target, URI).to_string()
    }

    fn with_query(mut self, query: Option<&str>) -> Self {
        if let Some(query) = query.filter(|q| !q.is_empty())
            && !is_absolute_url(&self.target)
        {
            self.target.push('?');
            self.target.push_str(query);
        }
        self
    }
}

/// Decides whether the decoded request `path` must be redirected.
///
/// The first applicable step wins: clean-URL canonicalization, then the
/// trailing-slash policy, then the configured redirect rules.
pub fn decide_redirect(
    path: &str,
    query: Option<&str>,
    config: &ServeConfig,
    clean_url: bool,
) -> Option<Redirect> {
    let redirect = clean_url_redirect(path, clean_url)
        .or_else(|| trailing_slash_redirect(path, config.trailing_slash))
        .or_else(|| rule_redirect(path, config))?
        .with_query(query);

    tracing::debug!(from = path, to = %redirect.target, status = redirect.status.as_u16(), "redirect");
    Some(redirect)
}

fn clean_url_redirect(path: &str, clean_url: bool) -> Option<Redirect> {
    if !clean_url || !(path.ends_with(".html") || path.ends_with("/index")) {
        return None;
    }

    let stripped = path.strip_suffix(".html").unwrap_or(path);
    let stripped = stripped.strip_suffix("/index").unwrap_or(stripped);
    let target = ensure_leading_slash(&collapse_slashes(stripped));

    Some(Redirect::new(target, StatusCode::MOVED_PERMANENTLY))
}

fn trailing_slash_redirect(path: &str, policy: Option<bool>) -> Option<Redirect> {
    let must_trail = policy?;
    let trailed = path.ends_with('/');
    let dotfile = last_segment(path).starts_with('.');

    let mut target = if !must_trail && trailed {
        path[..path.len() - 1].to_string()
    } else if must_trail && !trailed && extension(path).is_empty() && !dotfile {
        format!("{path}/")
    } else {
        path.to_string()
    };

    if path.contains("//") {
        target = collapse_slashes(path);
    }

    let target = ensure_leading_slash(&target);
    (target != path).then(|| Redirect::new(target, StatusCode::MOVED_PERMANENTLY))
}

fn rule_redirect(path: &str, config: &ServeConfig) -> Option<Redirect> {
    config.redirects.iter().find_map(|rule| {
        let matched = rule.source.matches(path, true)?;
        let target = render_destination(&rule.destination, &matched.bindings);
        let status = StatusCode::from_u16(rule.status).unwrap_or(StatusCode::MOVED_PERMANENTLY);
        Some(Redirect::new(target, status))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conf::RedirectRule;
    use crate::matcher::SourcePattern;
    use pretty_assertions::assert_eq;

    fn config_with(trailing_slash: Option<bool>, redirects: Vec<RedirectRule>) -> ServeConfig {
        ServeConfig {
            trailing_slash,
            redirects,
            ..ServeConfig::default()
        }
    }

    fn redirect_rule(source: &str, destination: &str, status: u16) -> RedirectRule {
        RedirectRule {
            source: SourcePattern::new(source).unwrap(),
            destination: destination.to_string(),
            status,
        }
    }

    fn target(path: &str, config: &ServeConfig, clean: bool) -> Option<(String, u16)> {
        decide_redirect(path, None, config, clean).map(|r| (r.target, r.status.as_u16()))
    }

    #[test]
    fn index_html_goes_to_root_regardless_of_rules() {
        let config = config_with(
            Some(true),
            vec![redirect_rule("/index.html", "/elsewhere", 302)],
        );

        assert_eq!(
            target("/index.html", &config, true),
            Some(("/".to_string(), 301))
        );
    }

    #[test]
    fn clean_urls_strip_html_and_index() {
        let config = ServeConfig::default();

        assert_eq!(
            target("/about.html", &config, true),
            Some(("/about".to_string(), 301))
        );
        assert_eq!(
            target("/docs/index", &config, true),
            Some(("/docs".to_string(), 301))
        );
        assert_eq!(
            target("/docs/index.html", &config, true),
            Some(("/docs".to_string(), 301))
        );
        assert_eq!(target("/about.html", &config, false), None);
    }

    #[test]
    fn trailing_slash_policy_true_appends() {
        let config = config_with(Some(true), vec![]);

        assert_eq!(
            target("/docs", &config, false),
            Some(("/docs/".to_string(), 301))
        );
        assert_eq!(target("/docs/", &config, false), None);
        assert_eq!(target("/style.css", &config, false), None);
        assert_eq!(target("/.well-known", &config, false), None);
    }

    #[test]
    fn trailing_slash_policy_false_strips() {
        let config = config_with(Some(false), vec![]);

        assert_eq!(
            target("/docs/", &config, false),
            Some(("/docs".to_string(), 301))
        );
        assert_eq!(target("/", &config, false), None);
        assert_eq!(target("/docs", &config, false), None);
    }

    #[test]
    fn double_slashes_collapse_under_policy() {
        let config = config_with(Some(true), vec![]);

        assert_eq!(
            target("//docs//api", &config, false),
            Some(("/docs/api".to_string(), 301))
        );
    }

    #[test]
    fn unspecified_policy_never_touches_slashes() {
        let config = ServeConfig::default();

        assert_eq!(target("/docs/", &config, false), None);
        assert_eq!(target("/docs", &config, false), None);
    }

    #[test]
    fn explicit_rules_match_in_order_with_captures() {
        let config = config_with(
            None,
            vec![
                redirect_rule("/old/:slug", "/new/:slug", 302),
                redirect_rule("/old/**", "/fallback", 301),
            ],
        );

        assert_eq!(
            target("/old/post", &config, false),
            Some(("/new/post".to_string(), 302))
        );
        assert_eq!(
            target("/old/a/b", &config, false),
            Some(("/fallback".to_string(), 301))
        );
    }

    #[test]
    fn query_string_is_kept_for_relative_targets_only() {
        let config = config_with(
            None,
            vec![redirect_rule("/ext", "https://example.com/x", 308)],
        );

        let relative = decide_redirect("/a.html", Some("q=1"), &config, true).unwrap();
        let absolute = decide_redirect("/ext", Some("q=1"), &config, false).unwrap();

        assert_eq!(relative.target, "/a?q=1");
        assert_eq!(absolute.target, "https://example.com/x");
        assert_eq!(absolute.status, StatusCode::PERMANENT_REDIRECT);
    }

    #[test]
    fn location_is_uri_encoded() {
        let redirect = Redirect::new("/my docs/ü?x=a b".to_string(), StatusCode::FOUND);

        assert_eq!(redirect.location(), "/my%20docs/%C3%BC?x=a%20b");
    }
}
