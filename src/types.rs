use chrono::NaiveDate;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use std::fmt;

use crate::utils::parse_start_date;

// Wire shapes are decoded after `utils::fold_keys`, so every rename below is
// the lowercase form of the upstream field name.

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct GameSummary {
    #[serde(rename = "massgameid")]
    pub mass_game_id: i64,
    #[serde(rename = "gamename", deserialize_with = "null_as_default")]
    pub game_name: String,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct Game {
    #[serde(rename = "massgameid")]
    pub mass_game_id: i64,
    #[serde(rename = "gamename", deserialize_with = "null_as_default")]
    pub game_name: String,
    #[serde(rename = "gameidentifier", deserialize_with = "null_as_default")]
    pub game_identifier: String,
    #[serde(rename = "startdate", deserialize_with = "deserialize_start_date")]
    pub start_date: Option<NaiveDate>,
    /// Ticket price in the minor currency unit.
    #[serde(rename = "ticketcost")]
    pub ticket_cost: i64,
    pub odds: Option<String>,
    /// Never present on the wire; filled from the rich-text blocks.
    #[serde(skip)]
    pub amount_printed: Option<i64>,
    #[serde(rename = "prizetiers")]
    pub prize_tiers: Vec<PrizeTier>,
}

#[derive(Deserialize, Debug, Default, Clone, PartialEq)]
#[serde(default)]
pub struct PrizeTier {
    #[serde(rename = "massgameid")]
    pub mass_game_id: i64,
    #[serde(rename = "tiernumber")]
    pub tier_number: i64,
    #[serde(rename = "prizeamount")]
    pub prize_amount: i64,
    #[serde(rename = "totalprizes")]
    pub total_prizes: i64,
    #[serde(rename = "paidprizes")]
    pub paid_prizes: i64,
    #[serde(rename = "prizesremaining")]
    pub prizes_remaining: i64,
    #[serde(rename = "prizedescription", deserialize_with = "null_as_default")]
    pub prize_description: String,
    #[serde(rename = "type", deserialize_with = "null_as_default")]
    pub win_type: String,
}

/// Per-game endpoint payload: the typed game plus the two loosely
/// structured rich-text blocks that may carry the print run.
#[derive(Deserialize, Debug, Default)]
#[serde(default)]
pub struct GameDetailResponse {
    #[serde(flatten)]
    pub game: Game,
    /// `Some(Value::Null)` when the field is present but `null`.
    #[serde(rename = "prizetierinfo", deserialize_with = "present_value")]
    pub prize_tier_info: Option<Value>,
    #[serde(rename = "secondchanceinfo", deserialize_with = "present_value")]
    pub second_chance_info: Option<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PrizeTextSource<'a> {
    PrizeTierInfo(&'a Value),
    SecondChanceInfo(&'a Value),
    None,
}

impl GameDetailResponse {
    /// `prizeTierInfo` wins over `secondChanceInfo` when both are present.
    pub fn prize_text_source(&self) -> PrizeTextSource<'_> {
        match (&self.prize_tier_info, &self.second_chance_info) {
            (Some(block), _) => PrizeTextSource::PrizeTierInfo(block),
            (None, Some(block)) => PrizeTextSource::SecondChanceInfo(block),
            (None, None) => PrizeTextSource::None,
        }
    }
}

impl PrizeTextSource<'_> {
    pub fn block(&self) -> Option<&Value> {
        match self {
            PrizeTextSource::PrizeTierInfo(block) | PrizeTextSource::SecondChanceInfo(block) => {
                Some(*block)
            }
            PrizeTextSource::None => None,
        }
    }

    pub fn field_name(&self) -> &'static str {
        match self {
            PrizeTextSource::PrizeTierInfo(_) => "prizeTierInfo",
            PrizeTextSource::SecondChanceInfo(_) => "secondChanceInfo",
            PrizeTextSource::None => "none",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameRow {
    pub mass_game_id: i64,
    pub game_name: String,
    pub game_identifier: String,
    pub start_date: Option<String>,
    pub ticket_cost: i64,
    pub odds: Option<String>,
    pub amount_printed: Option<i64>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PrizeTierRow {
    pub prize_tier_id: i64,
    pub mass_game_id: i64,
    pub tier_number: i64,
    pub prize_amount: i64,
    pub total_prizes: i64,
    pub paid_prizes: i64,
    pub prizes_remaining: i64,
    pub prize_description: String,
    pub type_of_win: String,
}

impl fmt::Display for Game {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let start = self
            .start_date
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "unknown".to_string());
        let printed = self
            .amount_printed
            .map(|n| n.to_string())
            .unwrap_or_else(|| "unknown".to_string());
        write!(
            f,
            "{} ({}) - Starts: {}, Cost: {}, Odds: {}, Printed: {}, Prize Tiers: {}",
            self.game_name,
            self.game_identifier,
            start,
            self.ticket_cost,
            self.odds.as_deref().unwrap_or("n/a"),
            printed,
            self.prize_tiers.len()
        )
    }
}

impl fmt::Display for PrizeTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Tier {}: {} - Amount: {}, Total: {}, Paid: {}, Remaining: {}, Type: {}",
            self.tier_number,
            self.prize_description,
            self.prize_amount,
            self.total_prizes,
            self.paid_prizes,
            self.prizes_remaining,
            self.win_type
        )
    }
}

fn null_as_default<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<String>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// Keeps an explicit `null` distinct from a missing field.
fn present_value<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

fn deserialize_start_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw {
        None => Ok(None),
        Some(s) if s.trim().is_empty() => Ok(None),
        Some(s) => parse_start_date(&s)
            .map(Some)
            .ok_or_else(|| serde::de::Error::custom(format!("invalid start date: {}", s))),
    }
}
