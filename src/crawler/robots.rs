//! Fetches and parses `robots.txt`.
//!
//! Grounded on `market_research_agent/crawlers/robots_parser.py`
//! (`RobotsTxtParser.fetch_and_parse`, `_parse_content`).

use std::time::Duration;

use anyhow::Result;
use reqwest::Client;
use tracing::{info, warn};
use url::Url;

use crate::model::RobotsRules;

const TIMEOUT: Duration = Duration::from_secs(3);

/// Fetches `robots.txt` for the site hosting `base_url` and parses it.
/// Never fails the caller: any fetch or parse problem yields the
/// permissive default (`RobotsRules::default()`, which allows everything).
pub async fn fetch_and_parse(client: &Client, base_url: &str) -> RobotsRules {
    let Ok(parsed) = Url::parse(base_url) else {
        return RobotsRules::default();
    };
    let Some(host) = parsed.host_str() else {
        return RobotsRules::default();
    };
    let robots_url = format!(
        "{}://{}{}/robots.txt",
        parsed.scheme(),
        host,
        parsed.port().map(|p| format!(":{p}")).unwrap_or_default()
    );

    match tokio::time::timeout(TIMEOUT, client.get(&robots_url).send()).await {
        Ok(Ok(response)) if response.status().is_success() => match response.text().await {
            Ok(body) => {
                info!(url = %robots_url, "robots.txt found");
                parse_content(&body)
            }
            Err(e) => {
                warn!(url = %robots_url, error = %e, "robots.txt body read failed");
                RobotsRules::default()
            }
        },
        Ok(Ok(response)) => {
            info!(url = %robots_url, status = %response.status(), "no robots.txt");
            RobotsRules::default()
        }
        Ok(Err(e)) => {
            warn!(url = %robots_url, error = %e, "robots.txt fetch failed");
            RobotsRules::default()
        }
        Err(_) => {
            warn!(url = %robots_url, "robots.txt fetch timed out");
            RobotsRules::default()
        }
    }
}

fn parse_content(content: &str) -> RobotsRules {
    let mut rules = RobotsRules::default();
    let mut current_agents: Vec<String> = Vec::new();

    for raw_line in content.lines() {
        let line = raw_line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((directive, value)) = line.split_once(':') else {
            continue;
        };
        let directive = directive.trim().to_lowercase();
        let value = value.trim();

        match directive.as_str() {
            "user-agent" => current_agents = vec![value.to_lowercase()],
            "disallow" if !current_agents.is_empty() && !value.is_empty() => {
                for agent in &current_agents {
                    rules.disallow_rules.push((agent.clone(), value.to_string()));
                }
            }
            "allow" if !current_agents.is_empty() && !value.is_empty() => {
                for agent in &current_agents {
                    rules.allow_rules.push((agent.clone(), value.to_string()));
                }
            }
            "sitemap" => rules.sitemaps.push(value.to_string()),
            "crawl-delay" if !current_agents.is_empty() => {
                if let Ok(delay) = value.parse::<f64>() {
                    rules.crawl_delay = Some(delay);
                }
            }
            _ => {}
        }
    }

    rules
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_disallow_and_sitemap_directives() {
        let content = "User-agent: *\nDisallow: /admin\nDisallow: /private/*\nSitemap: https://example.com/sitemap.xml\n";
        let rules = parse_content(content);
        assert_eq!(rules.sitemaps, vec!["https://example.com/sitemap.xml"]);
        assert!(!rules.is_allowed("/admin/users", "KycSiteScan/1.0"));
        assert!(rules.is_allowed("/about", "KycSiteScan/1.0"));
    }

    #[test]
    fn empty_disallow_value_means_allow_all() {
        let content = "User-agent: *\nDisallow:\n";
        let rules = parse_content(content);
        assert!(rules.is_allowed("/anything", "KycSiteScan/1.0"));
    }

    #[test]
    fn crawl_delay_is_parsed() {
        let content = "User-agent: *\nCrawl-delay: 2.5\n";
        let rules = parse_content(content);
        assert_eq!(rules.crawl_delay, Some(2.5));
    }
}
