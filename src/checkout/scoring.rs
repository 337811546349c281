//! Pure checkout-page classification scoring — no browser dependency, so
//! it is fully unit-testable.
//!
//! Grounded on spec.md section 4.9 ("Checkout classification
//! (score-based, threshold 0.25)").

use lazy_static::lazy_static;
use regex::Regex;

pub const CHECKOUT_THRESHOLD: f64 = 0.25;

const URL_PATH_SCORE_CAP: f64 = 0.4;
const ROUTE_BASED_BONUS: f64 = 0.2;
const STRONG_CONTENT_SCORE_CAP: f64 = 0.5;
const STRONG_CONTENT_WEIGHT: f64 = 0.2;
const WEAK_PATTERNS_TWO_PLUS: f64 = 0.15;
const WEAK_PATTERNS_ONE: f64 = 0.05;
const FORM_FIELD_BONUS: f64 = 0.1;
const NEGATIVE_SIGNAL_WEIGHT: f64 = 0.1;
const NEGATIVE_SIGNAL_CAP: f64 = 0.3;
const URL_CHANGED_BONUS: f64 = 0.1;

const STRONG_CONTENT_INDICATORS: &[&str] =
    &["order total", "payment method", "credit card", "billing address", "place order"];

const WEAK_CONTENT_INDICATORS: &[&str] = &["subtotal", "shipping address", "promo code", "apply coupon", "estimated tax"];

lazy_static! {
    static ref CHECKOUT_URL_RE: Regex = Regex::new(r"(?i)/(checkout|cart|basket|payment|order)(/|$|\?)").unwrap();
    static ref ROUTE_QUERY_RE: Regex = Regex::new(r"(?i)[?&]route=(checkout|cart|payment)").unwrap();
    static ref ADD_TO_CART_RE: Regex = Regex::new(r"(?i)add to cart").unwrap();
}

/// Scores how likely a (URL, page text, form-fields-present) triple is an
/// actual checkout page vs. a product listing or cart summary, returning
/// the confidence and whether it crosses [`CHECKOUT_THRESHOLD`]. `base_url`
/// is the page the probe started from; having navigated away from it is
/// itself a signal (`checkout_validator.py`'s `url != base_url` bonus).
pub fn score_checkout_page(url: &str, base_url: &str, text: &str, form_fields_present: bool) -> f64 {
    let mut score = 0.0f64;
    let lower = text.to_lowercase();

    let mut url_component = 0.0f64;
    if CHECKOUT_URL_RE.is_match(url) {
        url_component += URL_PATH_SCORE_CAP;
    }
    if ROUTE_QUERY_RE.is_match(url) {
        url_component += ROUTE_BASED_BONUS;
    }
    if url != base_url {
        url_component += URL_CHANGED_BONUS;
    }
    score += url_component.min(URL_PATH_SCORE_CAP);

    let strong_hits = STRONG_CONTENT_INDICATORS.iter().filter(|p| lower.contains(*p)).count();
    score += (strong_hits as f64 * STRONG_CONTENT_WEIGHT).min(STRONG_CONTENT_SCORE_CAP);

    let weak_hits = WEAK_CONTENT_INDICATORS.iter().filter(|p| lower.contains(*p)).count();
    if weak_hits >= 2 {
        score += WEAK_PATTERNS_TWO_PLUS;
    } else if weak_hits == 1 {
        score += WEAK_PATTERNS_ONE;
    }

    if form_fields_present {
        score += FORM_FIELD_BONUS;
    }

    let add_to_cart_count = ADD_TO_CART_RE.find_iter(&lower).count();
    if add_to_cart_count > 2 {
        score -= (NEGATIVE_SIGNAL_WEIGHT * (add_to_cart_count - 2) as f64).min(NEGATIVE_SIGNAL_CAP);
    }

    score.max(0.0).min(1.0)
}

pub fn is_checkout_reachable(confidence: f64) -> bool {
    confidence >= CHECKOUT_THRESHOLD
}

/// Visible-text/regex patterns a CTA must match to be sampled; ordered by
/// priority (buy/cart/checkout first, contact-sales last).
pub const CTA_PATTERNS: &[&str] = &[
    "buy now",
    "add to cart",
    "add to basket",
    "subscribe",
    "start free trial",
    "checkout",
    "proceed to checkout",
    "view pricing",
    "get pricing",
    "contact sales",
    "book a demo",
];

/// Form-field CSS selectors used to detect a real checkout/payment form.
pub const CHECKOUT_FORM_SELECTORS: &[&str] = &[
    "input[name*=card]",
    "input[autocomplete=cc-number]",
    "input[name*=billing]",
    "input[name*=shipping]",
    "select[name*=country]",
    "input[name*=zip]",
    "input[name*=postal]",
];

/// Common checkout paths probed directly when no CTA leads to checkout
/// (spec.md section 4.9, "Fallback").
pub const COMMON_CHECKOUT_PATHS: &[&str] =
    &["/checkout", "/cart", "/basket", "/cart/checkout", "/checkout/cart", "/order", "/payment"];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strong_url_and_content_signals_cross_threshold() {
        let score = score_checkout_page(
            "https://shop.example.com/checkout",
            "https://shop.example.com/cart",
            "Please review your order total and enter your payment method and billing address.",
            true,
        );
        assert!(is_checkout_reachable(score), "expected reachable, got {score}");
    }

    #[test]
    fn product_listing_with_many_add_to_cart_is_not_checkout() {
        let text = "Add to cart. Add to cart. Add to cart. Add to cart.";
        let score = score_checkout_page("https://shop.example.com/products", "https://shop.example.com/products", text, false);
        assert!(!is_checkout_reachable(score), "expected unreachable, got {score}");
    }

    #[test]
    fn route_query_param_contributes_bonus() {
        let base = score_checkout_page("https://shop.example.com/app", "https://shop.example.com/app", "subtotal and shipping address shown", false);
        let with_route = score_checkout_page(
            "https://shop.example.com/app?route=checkout",
            "https://shop.example.com/app",
            "subtotal and shipping address shown",
            false,
        );
        assert!(with_route > base);
    }

    #[test]
    fn navigating_away_from_base_url_contributes_bonus() {
        let same = score_checkout_page("https://shop.example.com/app", "https://shop.example.com/app", "subtotal shown", false);
        let changed = score_checkout_page("https://shop.example.com/cart", "https://shop.example.com/app", "subtotal shown", false);
        assert!(changed > same);
    }
}
