//! robots.txt rule evaluation.
//!
//! Grounded on `market_research_agent/crawlers/robots_parser.py`
//! (`RobotsRules`, `RobotsTxtParser`).

use regex::Regex;

/// User-agent this crate identifies as when fetching robots.txt and pages.
pub const USER_AGENT: &str = "KycSiteScan/1.0";

#[derive(Debug, Clone, Default)]
pub struct RobotsRules {
    /// (user_agent_lower, path_pattern) pairs, preserved in file order.
    pub allow_rules: Vec<(String, String)>,
    pub disallow_rules: Vec<(String, String)>,
    pub sitemaps: Vec<String>,
    pub crawl_delay: Option<f64>,
}

impl RobotsRules {
    /// Matches a rule path pattern against a request path. `*` expands to
    /// `.*`, `$` anchors the match to end-of-string, exactly as the
    /// original's regex translation of robots.txt wildcard syntax.
    fn pattern_matches(pattern: &str, path: &str) -> bool {
        if pattern.is_empty() {
            return false;
        }
        let mut regex_str = String::from("^");
        regex_str.push_str(&regex::escape(pattern).replace("\\*", ".*").replace("\\$", "$"));
        match Regex::new(&regex_str) {
            Ok(re) => re.is_match(path),
            Err(_) => path.starts_with(pattern),
        }
    }

    fn rules_for_agent<'a>(
        rules: &'a [(String, String)],
        user_agent: &str,
    ) -> Vec<&'a str> {
        let ua_lower = user_agent.to_lowercase();
        let mut specific: Vec<&str> = rules
            .iter()
            .filter(|(agent, _)| agent != "*" && ua_lower.contains(agent.as_str()))
            .map(|(_, path)| path.as_str())
            .collect();
        if specific.is_empty() {
            specific = rules
                .iter()
                .filter(|(agent, _)| agent == "*")
                .map(|(_, path)| path.as_str())
                .collect();
        }
        specific
    }

    /// Allow-before-disallow precedence: a path is allowed unless it matches
    /// a disallow rule and does not match any allow rule for the same agent.
    pub fn is_allowed(&self, path: &str, user_agent: &str) -> bool {
        let allows = Self::rules_for_agent(&self.allow_rules, user_agent);
        let disallows = Self::rules_for_agent(&self.disallow_rules, user_agent);

        if allows.iter().any(|p| Self::pattern_matches(p, path)) {
            return true;
        }
        if disallows.iter().any(|p| Self::pattern_matches(p, path)) {
            return false;
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rules() -> RobotsRules {
        RobotsRules {
            allow_rules: vec![("*".into(), "/public".into())],
            disallow_rules: vec![("*".into(), "/admin".into()), ("*".into(), "/private/*".into())],
            sitemaps: vec!["https://example.com/sitemap.xml".into()],
            crawl_delay: None,
        }
    }

    #[test]
    fn disallows_blocked_path() {
        assert!(!rules().is_allowed("/admin/users", USER_AGENT));
    }

    #[test]
    fn allows_unblocked_path() {
        assert!(rules().is_allowed("/about", USER_AGENT));
    }

    #[test]
    fn allow_rule_overrides_disallow() {
        let mut r = rules();
        r.allow_rules.push(("*".into(), "/private/public-doc".into()));
        assert!(r.is_allowed("/private/public-doc", USER_AGENT));
    }

    #[test]
    fn wildcard_disallow_matches_subpaths() {
        assert!(!rules().is_allowed("/private/secret.html", USER_AGENT));
    }
}
