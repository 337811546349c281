//! RDAP domain-age lookup, feeding the compliance engine's technical
//! sub-score (spec.md section 4.12).
//!
//! Grounded on spec.md section 4.12 prose and the teacher's `reqwest`-based
//! fetch idiom in `scrapers/dome.rs`.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

const RDAP_TIMEOUT: Duration = Duration::from_secs(5);
/// `rdap.org` forwards to the correct registry's RDAP server for any TLD,
/// avoiding a per-registry bootstrap table.
const RDAP_BASE: &str = "https://rdap.org/domain";

#[derive(Debug, Deserialize)]
struct RdapEvent {
    #[serde(rename = "eventAction")]
    event_action: String,
    #[serde(rename = "eventDate")]
    event_date: String,
}

#[derive(Debug, Deserialize)]
struct RdapResponse {
    #[serde(default)]
    events: Vec<RdapEvent>,
}

/// Looks up a domain's registration date via RDAP and returns its age in
/// days. Returns `None` on any network, parse, or missing-event failure —
/// the caller treats an unknown age as the conservative default (spec.md
/// section 4.12: "unknown → 0" technical-score points).
pub async fn domain_age_days(client: &Client, domain: &str) -> Option<i64> {
    let url = format!("{RDAP_BASE}/{domain}");
    let response = match tokio::time::timeout(RDAP_TIMEOUT, client.get(&url).send()).await {
        Ok(Ok(resp)) if resp.status().is_success() => resp,
        Ok(Ok(resp)) => {
            debug!(domain, status = %resp.status(), "rdap lookup non-success");
            return None;
        }
        Ok(Err(e)) => {
            warn!(domain, error = %e, "rdap request failed");
            return None;
        }
        Err(_) => {
            warn!(domain, "rdap lookup timed out");
            return None;
        }
    };

    let parsed: RdapResponse = match response.json().await {
        Ok(body) => body,
        Err(e) => {
            warn!(domain, error = %e, "rdap response parse failed");
            return None;
        }
    };

    let registration_date = parsed
        .events
        .iter()
        .find(|e| e.event_action == "registration")
        .map(|e| e.event_date.as_str())?;

    let registered_at: DateTime<Utc> = DateTime::parse_from_rfc3339(registration_date).ok()?.with_timezone(&Utc);
    Some((Utc::now() - registered_at).num_days())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_registration_event() {
        let body = r#"{"events":[{"eventAction":"registration","eventDate":"2015-01-01T00:00:00Z"},{"eventAction":"last changed","eventDate":"2024-01-01T00:00:00Z"}]}"#;
        let parsed: RdapResponse = serde_json::from_str(body).unwrap();
        let reg = parsed.events.iter().find(|e| e.event_action == "registration").unwrap();
        assert_eq!(reg.event_date, "2015-01-01T00:00:00Z");
    }
}
