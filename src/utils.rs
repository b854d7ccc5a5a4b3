use chrono::{DateTime, NaiveDate, NaiveDateTime};
use regex::Regex;
use serde_json::{Map, Value};
use std::str::FromStr;
use std::sync::OnceLock;

/// Smallest and largest print run accepted as a real ticket count.
pub const MIN_PRINTED_TICKETS: i64 = 1_000;
pub const MAX_PRINTED_TICKETS: i64 = 1_000_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractMode {
    /// "approximately N tickets", then a bare number.
    #[default]
    Strict,
    /// Strict patterns plus a few looser phrasings, tried in order.
    Lenient,
}

impl ExtractMode {
    pub fn extract(&self, text: &str) -> Option<i64> {
        match self {
            ExtractMode::Strict => extract_printed_tickets(text),
            ExtractMode::Lenient => extract_printed_tickets_lenient(text),
        }
    }
}

impl FromStr for ExtractMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(ExtractMode::Strict),
            "lenient" => Ok(ExtractMode::Lenient),
            other => Err(format!("unknown extract mode: {}", other)),
        }
    }
}

fn approximately_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)approximately\s+([\d,]+)\s+tickets").unwrap())
}

fn bare_number_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\s*([\d,]+)\s*$").unwrap())
}

fn lenient_res() -> &'static [Regex] {
    static RES: OnceLock<Vec<Regex>> = OnceLock::new();
    RES.get_or_init(|| {
        [
            r"(?i)approximately\s+([\d,]+)\s+tickets",
            r"(?i)sale\s+of\s+approximately\s+([\d,]+)\s+tickets",
            r"(?i)based\s+on\s+(?:the\s+)?sale\s+of\s+approximately\s+([\d,]+)",
            r"(?i)([\d,]+)\s+tickets",
            r"^\s*([\d,]+)\s*$",
        ]
        .iter()
        .map(|p| Regex::new(p).unwrap())
        .collect()
    })
}

/// Strips thousands separators and keeps the value only if it is a
/// plausible print run.
fn parse_ticket_count(grouped: &str) -> Option<i64> {
    let digits: String = grouped.chars().filter(|c| *c != ',').collect();
    let count = digits.parse::<i64>().ok()?;
    (MIN_PRINTED_TICKETS..=MAX_PRINTED_TICKETS)
        .contains(&count)
        .then_some(count)
}

fn first_capture(re: &Regex, text: &str) -> Option<i64> {
    let caps = re.captures(text)?;
    parse_ticket_count(caps.get(1)?.as_str())
}

/// Pulls the printed-ticket count out of prize structure copy such as
/// "Prize structure is based on the sale of approximately 18,144,000 tickets."
/// or a bare "10,340,000". Returns `None` for anything else.
pub fn extract_printed_tickets(text: &str) -> Option<i64> {
    if text.trim().is_empty() {
        return None;
    }

    first_capture(approximately_re(), text).or_else(|| first_capture(bare_number_re(), text))
}

pub fn extract_printed_tickets_lenient(text: &str) -> Option<i64> {
    if text.trim().is_empty() {
        return None;
    }

    lenient_res().iter().find_map(|re| first_capture(re, text))
}

/// Lowercases every object key so typed decoding can match upstream field
/// names regardless of case. When two keys fold to the same name the
/// lexicographically first key is kept.
pub fn fold_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut folded = Map::with_capacity(map.len());
            for (key, inner) in map {
                folded
                    .entry(key.to_lowercase())
                    .or_insert_with(|| fold_keys(inner));
            }
            Value::Object(folded)
        }
        Value::Array(items) => Value::Array(items.into_iter().map(fold_keys).collect()),
        other => other,
    }
}

pub fn parse_start_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.date_naive());
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%dT%H:%M:%S%.f") {
        return Some(dt.date());
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn extracts_approximately_phrase() {
        let text = "Prize structure is based on the sale of approximately 18,144,000 tickets. All winners...";
        assert_eq!(extract_printed_tickets(text), Some(18_144_000));
    }

    #[test]
    fn approximately_phrase_is_case_insensitive() {
        assert_eq!(
            extract_printed_tickets("APPROXIMATELY 15,120,000 TICKETS were printed"),
            Some(15_120_000)
        );
    }

    #[test]
    fn extracts_bare_grouped_number() {
        assert_eq!(extract_printed_tickets("10,340,000"), Some(10_340_000));
        assert_eq!(extract_printed_tickets("  3,000,000 \n"), Some(3_000_000));
        assert_eq!(extract_printed_tickets("2500000"), Some(2_500_000));
    }

    #[test]
    fn bare_number_must_be_whole_input() {
        assert_eq!(extract_printed_tickets("Launched 2021 with 4,000,000"), None);
    }

    #[test]
    fn rejects_out_of_range_values() {
        assert_eq!(extract_printed_tickets("999"), None);
        assert_eq!(extract_printed_tickets("approximately 500 tickets"), None);
        assert_eq!(extract_printed_tickets("1,000,000,001"), None);
        assert_eq!(extract_printed_tickets("99999999999999999999999"), None);
        assert_eq!(extract_printed_tickets("1,000"), Some(1_000));
        assert_eq!(extract_printed_tickets("1,000,000,000"), Some(1_000_000_000));
    }

    #[test]
    fn out_of_range_phrase_falls_through_to_bare_number() {
        // phrase capture is implausible and the input is not a bare number
        assert_eq!(extract_printed_tickets("approximately 12 tickets"), None);
    }

    #[test]
    fn blank_input_is_absent() {
        assert_eq!(extract_printed_tickets(""), None);
        assert_eq!(extract_printed_tickets("   \t"), None);
        assert_eq!(extract_printed_tickets(","), None);
        assert_eq!(extract_printed_tickets("All winners must claim prizes."), None);
    }

    #[test]
    fn lenient_mode_accepts_looser_phrasing() {
        let text = "A total of 6,000,000 tickets will be printed.";
        assert_eq!(extract_printed_tickets(text), None);
        assert_eq!(extract_printed_tickets_lenient(text), Some(6_000_000));
        assert_eq!(ExtractMode::Lenient.extract(text), Some(6_000_000));
        assert_eq!(
            extract_printed_tickets_lenient("based on the sale of approximately 7,200,000"),
            Some(7_200_000)
        );
    }

    #[test]
    fn extract_mode_parses() {
        assert_eq!("Strict".parse::<ExtractMode>(), Ok(ExtractMode::Strict));
        assert_eq!(" lenient ".parse::<ExtractMode>(), Ok(ExtractMode::Lenient));
        assert!("fuzzy".parse::<ExtractMode>().is_err());
    }

    #[test]
    fn fold_keys_lowercases_nested_objects() {
        let folded = fold_keys(json!({
            "MassGameId": 5,
            "PrizeTiers": [{ "TierNumber": 1 }],
            "prizeTierInfo": { "Text": { "content": [] } }
        }));
        assert_eq!(
            folded,
            json!({
                "massgameid": 5,
                "prizetiers": [{ "tiernumber": 1 }],
                "prizetierinfo": { "text": { "content": [] } }
            })
        );
    }

    #[test]
    fn fold_keys_keeps_lexicographically_first_on_collision() {
        let folded = fold_keys(json!({ "gameName": "lower", "GameName": "upper" }));
        assert_eq!(folded, json!({ "gamename": "upper" }));
    }

    #[test]
    fn parses_common_date_shapes() {
        let expected = NaiveDate::from_ymd_opt(2023, 9, 12);
        assert_eq!(parse_start_date("2023-09-12"), expected);
        assert_eq!(parse_start_date("2023-09-12T00:00:00"), expected);
        assert_eq!(parse_start_date("2023-09-12T04:00:00.000Z"), expected);
        assert_eq!(parse_start_date("12/09/2023"), None);
    }
}
