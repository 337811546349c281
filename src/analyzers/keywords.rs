//! Restricted-keyword dictionary and the low-level matching primitives used
//! by [`super::content_risk`].
//!
//! Grounded on `market_research_agent/analyzers/content_analyzer.py`
//! (`RESTRICTED_KEYWORDS`, `_match_keyword`, `_classify_intent`).

use lazy_static::lazy_static;
use regex::Regex;

/// Categories whose severity may be promoted to `critical` once
/// corroborated on ≥2 distinct URLs (spec.md section 4.6).
pub const HIGH_RISK_CATEGORIES: &[&str] = &[
    "gambling",
    "adult",
    "child_pornography",
    "weapons",
    "drugs",
    "illegal_goods",
    "hacking",
    "counterfeit",
];

pub struct KeywordCategory {
    pub category: &'static str,
    pub keywords: &'static [&'static str],
}

/// Restricted-content keyword dictionary, grouped by category. Kept flat
/// and data-driven so adding a category never touches the matching logic.
/// Ported in full from `content_analyzer.py`'s `RESTRICTED_KEYWORDS` dict.
pub static RESTRICTED_KEYWORDS: &[KeywordCategory] = &[
    KeywordCategory {
        category: "gambling",
        keywords: &[
            "casino", "betting", "poker", "lottery", "gambling", "sports-betting",
            "online-casino", "bingo", "slot-machine", "blackjack", "roulette",
            "wager", "gambling-site", "online-betting", "jackpot", "slots",
            "card-games", "live-casino", "betting-odds", "gamble",
        ],
    },
    KeywordCategory {
        category: "adult",
        keywords: &[
            "adult", "porn", "xxx", "nsfw", "adult-content", "adult-entertainment",
            "erotic", "sex", "pornography", "adult-site", "explicit", "nude",
            "adult-video", "webcam", "fetish", "adult-services", "mature-content",
            "x-rated", "adult-chat", "erotic-content",
        ],
    },
    KeywordCategory {
        category: "crypto",
        keywords: &[
            "bitcoin", "crypto", "blockchain", "ico", "token", "cryptocurrency",
            "nft", "ethereum", "altcoin", "wallet", "crypto-exchange",
            "digital-currency", "defi", "staking", "crypto-trading", "coin",
            "decentralized", "smart-contract", "crypto-wallet", "token-sale",
        ],
    },
    KeywordCategory {
        category: "forex",
        keywords: &[
            "forex", "fx", "currency-trading", "forex-trading", "currency-exchange",
            "forex-market", "trading-platform", "forex-broker", "currency-pair",
            "pip", "leverage", "forex-signals", "foreign-exchange", "fx-trading",
            "forex-investment", "currency-market", "forex-analysis",
            "trading-account", "forex-strategy", "exchange-rate",
        ],
    },
    KeywordCategory {
        category: "binary",
        keywords: &[
            "binary-options", "binary-trading", "binary-betting",
            "binary-investment", "binary-broker", "options-trading",
            "binary-signals", "binary-platform", "binary-market",
            "digital-options", "binary-trade", "binary-strategy",
            "binary-account", "options-investment", "binary-forecast",
            "binary-profit", "binary-exchange", "trading-options",
            "binary-system", "binary-payout",
        ],
    },
    KeywordCategory {
        category: "weapons",
        keywords: &[
            "gun", "weapon", "firearm", "ammunition", "explosive", "explosives",
            "bomb", "rifle", "pistol", "shotgun", "bullet", "grenade", "knife",
            "tactical-gear", "arms", "weaponry", "gun-shop", "military-equipment",
            "ammo", "assault-rifle", "brass knuckles", "gun parts", "gun powder",
        ],
    },
    KeywordCategory {
        category: "pharmacy",
        keywords: &[
            "viagra", "cialis", "prescription drugs", "online pharmacy",
            "prescription medication", "herbal drugs", "pharmacy online",
        ],
    },
    KeywordCategory {
        category: "alcohol",
        keywords: &["alcohol", "alcoholic beverages", "beer", "liquor", "wine", "champagne", "whiskey", "vodka", "rum", "alcoholic", "spirits", "alcohol sales"],
    },
    KeywordCategory {
        category: "tobacco",
        keywords: &["cigarettes", "cigars", "tobacco", "chewing tobacco", "vape", "e-cigarettes", "e-cigs", "vaping", "cigarette store", "tobacco products", "smoking"],
    },
    KeywordCategory {
        category: "drugs",
        keywords: &[
            "illegal drugs", "drug paraphernalia", "marijuana", "salvia", "magic mushrooms",
            "cocaine", "heroin", "methamphetamine", "drug accessories", "herbal drugs",
            "drug test circumvention", "drug cleansing", "urine test", "drug test aid",
        ],
    },
    KeywordCategory {
        category: "counterfeit",
        keywords: &["counterfeit", "replica", "fake", "imitation", "designer knockoff", "unauthorized goods", "fake autograph", "counterfeit stamp", "fake designer"],
    },
    KeywordCategory {
        category: "copyright",
        keywords: &[
            "copyright unlocking", "mod chip", "pirated", "unauthorized copy",
            "copyrighted media", "copyrighted software", "cable descrambler",
            "black box", "circumvent copyright", "pirated software", "pirated media",
        ],
    },
    KeywordCategory {
        category: "hacking",
        keywords: &["hacking", "cracking", "illegal access", "malware", "hacking materials", "cracking materials", "unauthorized access", "hack software", "crack software", "bypass security", "hacking tools"],
    },
    KeywordCategory {
        category: "child_pornography",
        keywords: &["child porn", "child pornography", "minor", "underage", "child abuse", "underage content", "minor pornography"],
    },
    KeywordCategory {
        category: "government_ids",
        keywords: &["fake id", "fake passport", "fake diploma", "fake document", "government id", "fake license", "noble title", "fake certificate"],
    },
    KeywordCategory {
        category: "body_parts",
        keywords: &["body parts", "organs", "organ sale", "body part sale", "organ transplant sale"],
    },
    KeywordCategory {
        category: "endangered_species",
        keywords: &["endangered species", "ivory", "rhino horn", "endangered animal", "endangered plant", "wildlife trade", "illegal wildlife"],
    },
    KeywordCategory {
        category: "pyrotechnics",
        keywords: &["fireworks", "pyrotechnic", "explosive device", "toxic materials", "flammable materials", "radioactive materials", "hazardous materials"],
    },
    KeywordCategory {
        category: "regulated_goods",
        keywords: &[
            "air bag", "mercury battery", "freon", "pesticide", "surveillance equipment",
            "lock-picking device", "police badge", "government uniform", "slot machine",
            "postage meter", "recalled items",
        ],
    },
    KeywordCategory {
        category: "securities",
        keywords: &["stocks", "bonds", "securities", "investment products", "stock trading", "bond trading", "securities trading"],
    },
    KeywordCategory {
        category: "traffic_devices",
        keywords: &["radar detector", "radar jammer", "license plate cover", "traffic signal changer", "speed detector", "traffic device"],
    },
    KeywordCategory {
        category: "wholesale_currency",
        keywords: &["discounted currency", "currency exchange", "wholesale currency", "currency discount", "bulk currency"],
    },
    KeywordCategory {
        category: "live_animals",
        keywords: &["live animals", "animal hides", "animal skins", "animal parts", "animal teeth", "animal nails", "wildlife sale"],
    },
    KeywordCategory {
        category: "mlm",
        keywords: &["multi-level marketing", "mlm", "pyramid scheme", "matrix scheme", "pyramid marketing", "get rich quick", "mlm scheme"],
    },
    KeywordCategory {
        category: "work_at_home",
        keywords: &["work at home", "work-at-home", "work from home scheme", "home based business scam"],
    },
    KeywordCategory {
        category: "drop_shipped",
        keywords: &["drop ship", "drop-shipped", "dropshipped merchandise", "drop shipping"],
    },
    KeywordCategory {
        category: "money_transfer",
        keywords: &["wire transfer", "money transfer", "quasi-cash", "western union", "money remittance", "cash disbursement", "account funding"],
    },
    KeywordCategory {
        category: "dating_escort",
        keywords: &["dating service", "escort service", "friend finder", "escort", "prostitution", "dating site", "escort agency"],
    },
    KeywordCategory {
        category: "massage_parlors",
        keywords: &["massage parlor", "massage parlour", "massage service"],
    },
    KeywordCategory {
        category: "detective_agencies",
        keywords: &["detective agency", "private investigator", "detective service", "pi service"],
    },
    KeywordCategory {
        category: "political",
        keywords: &["political organization", "political party", "political fundraising"],
    },
    KeywordCategory {
        category: "bpo_kpo",
        keywords: &["bpo", "kpo", "outsourcing service", "business process outsourcing", "knowledge process outsourcing"],
    },
    KeywordCategory {
        category: "job_services",
        keywords: &["job service", "employment service", "job placement", "recruitment service"],
    },
    KeywordCategory {
        category: "real_estate",
        keywords: &["real estate service", "construction service", "real estate construction"],
    },
    KeywordCategory {
        category: "web_telephony",
        keywords: &["calling card", "web telephony", "sms service", "text service", "facsimile service", "voice process service", "bandwidth service"],
    },
    KeywordCategory {
        category: "auction",
        keywords: &["auction house", "bidding", "auction service", "online auction"],
    },
    KeywordCategory {
        category: "money_changer",
        keywords: &["money changer", "money transfer agent", "currency exchange agent"],
    },
    KeywordCategory {
        category: "offshore",
        keywords: &["offshore corporation", "offshore company", "offshore entity"],
    },
    KeywordCategory {
        category: "crowdsourcing",
        keywords: &["crowdsourcing platform", "crowdsourcing service", "crowdfunding"],
    },
    KeywordCategory {
        category: "antiques_art",
        keywords: &["antique dealer", "art dealer", "antique shop", "art shop"],
    },
    KeywordCategory {
        category: "gems_jewellery",
        keywords: &["gems", "jewellery", "precious metals", "bullion", "gem dealer", "jewellery dealer", "precious metal dealer"],
    },
    KeywordCategory {
        category: "embassies",
        keywords: &["embassy", "consulate", "diplomatic service"],
    },
    KeywordCategory {
        category: "business_correspondent",
        keywords: &["business correspondent", "aeps", "dmt", "payout service", "bc service"],
    },
    KeywordCategory {
        category: "digital_lending",
        keywords: &["digital lending", "loan app", "lending app", "online lending", "digital loan", "instant loan"],
    },
    KeywordCategory {
        category: "gift_cards_forex",
        keywords: &["gift card forex", "foreign currency gift card", "forex gift card"],
    },
    KeywordCategory {
        category: "video_chatting",
        keywords: &["video chat app", "dubious video chat", "video chatting app", "chat app"],
    },
    KeywordCategory {
        category: "spam",
        keywords: &["spam", "email list", "bulk marketing", "unsolicited email", "telemarketing", "spam software", "bulk email"],
    },
    KeywordCategory {
        category: "miracle_cures",
        keywords: &["miracle cure", "quick fix", "unsubstantiated cure", "miracle remedy", "quick health fix", "instant cure"],
    },
    KeywordCategory {
        category: "offensive_goods",
        keywords: &["defamation", "slander", "hate speech", "violent acts", "intolerance", "discrimination", "offensive material", "hate material"],
    },
    KeywordCategory {
        category: "illegal_goods",
        keywords: &["illegal goods", "contraband", "illegal products", "prohibited goods"],
    },
];

/// Phrases surrounding a hit that mark it as an acceptable-use prohibition
/// rather than an offer ("we do not allow gambling on this platform").
const PROHIBITIVE_MARKERS: &[&str] = &[
    "we do not allow",
    "we don't allow",
    "not permitted",
    "is prohibited",
    "are prohibited",
    "strictly prohibited",
    "not allowed",
    "forbidden",
    "we prohibit",
    "no tolerance for",
    "in violation of",
];

/// Phrases marking a hit as an active offer/promotion of the restricted
/// activity.
const PROMOTIONAL_MARKERS: &[&str] = &[
    "buy now",
    "play now",
    "join today",
    "sign up now",
    "get started",
    "shop now",
    "order now",
    "bet now",
    "claim your bonus",
    "try it free",
];

lazy_static! {
    static ref DUMMY_TEXT_RE: Regex =
        Regex::new(r"(?i)lorem\s+ipsum|consectetur\s+adipiscing|sed\s+do\s+eiusmod").unwrap();
}

/// Builds a regex that matches `keyword` with "hyphen-space flexible"
/// semantics: hyphens and spaces are interchangeable, and multi-word
/// phrases match as long as every word appears (in order) within a 50
/// character window, matching `_match_keyword` in the original.
pub fn keyword_pattern(keyword: &str) -> Option<Regex> {
    let words: Vec<String> = keyword
        .split(|c: char| c == ' ' || c == '-')
        .filter(|w| !w.is_empty())
        .map(|w| regex::escape(w))
        .collect();
    if words.is_empty() {
        return None;
    }
    // Each word, followed by up to ~50 chars of filler, then the next word.
    let joined = words.join(r"[\s\-]+.{0,40}?[\s\-]?");
    Regex::new(&format!(r"(?i)\b{joined}\b")).ok()
}

/// Returns every byte-offset match of `keyword` within `text`, using the
/// flexible pattern above.
pub fn find_matches(text: &str, keyword: &str) -> Vec<(usize, usize)> {
    let Some(re) = keyword_pattern(keyword) else {
        return Vec::new();
    };
    re.find_iter(text).map(|m| (m.start(), m.end())).collect()
}

/// Extracts a ±100-character, case-preserved snippet around a match,
/// truncated to ~200 characters.
pub fn extract_snippet(text: &str, start: usize, end: usize) -> String {
    let window_start = start.saturating_sub(100);
    let window_end = (end + 100).min(text.len());
    let mut window_start = window_start;
    while window_start > 0 && !text.is_char_boundary(window_start) {
        window_start -= 1;
    }
    let mut window_end = window_end;
    while window_end < text.len() && !text.is_char_boundary(window_end) {
        window_end += 1;
    }
    let snippet = &text[window_start..window_end];
    snippet.chars().take(200).collect()
}

/// Classifies the intent of a hit by scanning a window of text around it
/// for prohibitive vs. promotional markers, defaulting to neutral.
pub fn classify_intent_window(window: &str) -> crate::model::Intent {
    use crate::model::Intent;
    let lower = window.to_lowercase();
    if PROHIBITIVE_MARKERS.iter().any(|m| lower.contains(m)) {
        return Intent::Prohibitive;
    }
    if PROMOTIONAL_MARKERS.iter().any(|m| lower.contains(m)) {
        return Intent::Promotional;
    }
    Intent::Neutral
}

/// Detects lorem-ipsum style placeholder text, returning matched snippets.
pub fn find_dummy_text(text: &str) -> Vec<String> {
    DUMMY_TEXT_RE
        .find_iter(text)
        .map(|m| extract_snippet(text, m.start(), m.end()))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hyphen_space_flexible_match() {
        assert!(!find_matches("we offer sports-betting odds", "sports betting").is_empty());
        assert!(!find_matches("we offer sports betting odds", "sports-betting").is_empty());
    }

    #[test]
    fn classifies_prohibitive_intent() {
        let intent = classify_intent_window("We do not allow gambling or wagering on this platform.");
        assert_eq!(intent, crate::model::Intent::Prohibitive);
    }

    #[test]
    fn classifies_promotional_intent() {
        let intent = classify_intent_window("Bet now and claim your bonus!");
        assert_eq!(intent, crate::model::Intent::Promotional);
    }

    #[test]
    fn defaults_to_neutral_intent() {
        let intent = classify_intent_window("Our support team can help with any questions.");
        assert_eq!(intent, crate::model::Intent::Neutral);
    }

    #[test]
    fn detects_lorem_ipsum_placeholder() {
        let hits = find_dummy_text("Lorem ipsum dolor sit amet, consectetur adipiscing elit.");
        assert_eq!(hits.len(), 1);
    }
}
