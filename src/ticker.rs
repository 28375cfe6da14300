// =============================================================================
// Ticker symbols — validation and search suggestions
// =============================================================================
//
// A ticker is 1–5 uppercase ASCII letters, optionally followed by a dot and a
// 1–3 letter share-class suffix (AAPL, BRK.B). Input is trimmed and uppercased
// before validation.

/// Tickers shown on the landing page.
const POPULAR: &[&str] = &["AAPL", "TSLA", "GOOGL", "MSFT", "AMZN", "NVDA", "META"];

/// Returned for an empty search query.
const DEFAULT_SUGGESTIONS: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "AMZN", "TSLA", "META", "NVDA", "NFLX", "JPM", "V", "UNH", "HD",
    "PG", "MA", "DIS", "BAC",
];

/// Universe scanned for substring matches.
const SEARCH_UNIVERSE: &[&str] = &[
    "AAPL", "MSFT", "GOOGL", "AMZN", "TSLA", "META", "NVDA", "NFLX", "BABA", "V", "JPM", "JNJ",
    "WMT", "PG", "UNH", "MA", "DIS", "HD", "PYPL", "BAC", "INTC", "CMCSA", "VZ", "ADBE", "CRM",
    "NKE", "PFE", "TMO", "ABBV", "COST", "ORCL", "AVGO", "XOM", "KO", "PEP", "CVX", "LLY", "ACN",
    "DHR", "QCOM", "SPY", "QQQ", "IWM", "VTI", "ARKK", "GLD", "SLV", "TLT", "IBM", "CSCO",
];

pub const DEFAULT_SEARCH_LIMIT: usize = 15;

/// Trim and uppercase.
pub fn normalize(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

/// Validate after normalisation.
pub fn is_valid_ticker(raw: &str) -> bool {
    let ticker = normalize(raw);
    let (root, suffix) = match ticker.split_once('.') {
        Some((root, suffix)) => (root, Some(suffix)),
        None => (ticker.as_str(), None),
    };

    let letters = |s: &str, max: usize| {
        (1..=max).contains(&s.len()) && s.bytes().all(|b| b.is_ascii_uppercase())
    };

    letters(root, 5) && suffix.map_or(true, |s| letters(s, 3))
}

pub fn popular_tickers() -> Vec<String> {
    POPULAR.iter().map(|s| s.to_string()).collect()
}

/// Suggestions for a partially typed ticker.
///
/// The query itself comes first when it is a valid ticker, followed by known
/// tickers containing it.
pub fn search(query: &str, limit: usize) -> Vec<String> {
    let query = normalize(query);
    if query.is_empty() {
        return DEFAULT_SUGGESTIONS
            .iter()
            .take(limit)
            .map(|s| s.to_string())
            .collect();
    }

    let mut results = Vec::new();
    if is_valid_ticker(&query) {
        results.push(query.clone());
    }
    results.extend(
        SEARCH_UNIVERSE
            .iter()
            .filter(|t| t.contains(query.as_str()) && **t != query)
            .map(|t| t.to_string()),
    );
    results.truncate(limit);
    results
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn valid_tickers() {
        for t in ["AAPL", "A", "GOOGL", "BRK.B", "ABC.XYZ", " msft ", "brk.a"] {
            assert!(is_valid_ticker(t), "{t} should be valid");
        }
    }

    #[test]
    fn invalid_tickers() {
        for t in ["", "   ", "TOOLONG", "AB1", "BRK.", ".B", "BRK.ABCD", "A.B.C", "ÄPPL", "BR K"] {
            assert!(!is_valid_ticker(t), "{t:?} should be invalid");
        }
    }

    #[test]
    fn normalize_trims_and_uppercases() {
        assert_eq!(normalize("  tsla\n"), "TSLA");
    }

    #[test]
    fn empty_query_returns_defaults() {
        let r = search("  ", DEFAULT_SEARCH_LIMIT);
        assert_eq!(r.len(), DEFAULT_SEARCH_LIMIT);
        assert_eq!(r[0], "AAPL");
    }

    #[test]
    fn query_first_then_matches() {
        let r = search("a", DEFAULT_SEARCH_LIMIT);
        assert_eq!(r[0], "A");
        assert!(r.contains(&"AAPL".to_string()));
        assert!(r.len() <= DEFAULT_SEARCH_LIMIT);
        assert!(r.iter().skip(1).all(|t| t.contains('A')));
    }

    #[test]
    fn exact_match_not_duplicated() {
        let r = search("msft", DEFAULT_SEARCH_LIMIT);
        assert_eq!(r, vec!["MSFT".to_string()]);
    }

    #[test]
    fn invalid_query_only_returns_matches() {
        assert!(search("12", 10).is_empty());
    }

    #[test]
    fn popular_list() {
        assert_eq!(popular_tickers().len(), 7);
    }
}
