use anyhow::Context;
use rusqlite::Connection;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::cancel::CancelSignal;
use crate::database::{game_exists, insert_game_with_tiers};
use crate::error::FetchError;
use crate::types::{Game, GameDetailResponse, GameSummary};
use crate::utils::{ExtractMode, fold_keys};

/// Where catalog and per-game payloads come from. Implementations hand back
/// the raw body of a successful response.
#[allow(async_fn_in_trait)]
pub trait LotterySource {
    async fn get_catalog(&self) -> Result<String, FetchError>;
    async fn get_game(&self, mass_game_id: i64) -> Result<String, FetchError>;
}

pub struct HttpLotterySource {
    client: reqwest::Client,
    url: String,
}

impl HttpLotterySource {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
        }
    }
}

impl LotterySource for HttpLotterySource {
    async fn get_catalog(&self) -> Result<String, FetchError> {
        let response = self.client.get(&self.url).send().await?;
        read_body(response).await
    }

    async fn get_game(&self, mass_game_id: i64) -> Result<String, FetchError> {
        let response = self
            .client
            .get(&self.url)
            .query(&[("gameID", mass_game_id)])
            .send()
            .await?;
        read_body(response).await
    }
}

async fn read_body(response: reqwest::Response) -> Result<String, FetchError> {
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status {
            url: response.url().to_string(),
            status,
        });
    }
    Ok(response.text().await?)
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IngestSummary {
    pub fetched: usize,
    pub inserted: usize,
    pub already_stored: usize,
}

/// Decodes the list endpoint. A `null` body or an empty array means the
/// catalog is unusable; `null` entries inside the array are dropped.
pub fn parse_catalog(body: &str) -> Result<Vec<GameSummary>, FetchError> {
    let value: Value = serde_json::from_str(body)?;
    let entries: Option<Vec<Option<GameSummary>>> = serde_json::from_value(fold_keys(value))?;

    match entries {
        Some(entries) if !entries.is_empty() => Ok(entries.into_iter().flatten().collect()),
        _ => Err(FetchError::EmptyCatalog),
    }
}

/// Decodes one per-game payload into a `Game`, filling `amount_printed` from
/// the rich-text blocks and tagging every prize tier with the game id.
pub fn parse_game_detail(
    body: &str,
    requested_id: i64,
    mode: ExtractMode,
) -> Result<Game, FetchError> {
    let value: Value = serde_json::from_str(body)?;
    let detail: GameDetailResponse = serde_json::from_value(fold_keys(value))?;

    let source = detail.prize_text_source();
    let amount_printed = match source.block() {
        Some(block) => find_printed_tickets(block, source.field_name(), mode)?,
        None => {
            debug!("No prize text block for game ID {}", requested_id);
            None
        }
    };

    let mut game = detail.game;
    if game.mass_game_id == 0 {
        game.mass_game_id = requested_id;
    }
    game.amount_printed = amount_printed;
    for tier in &mut game.prize_tiers {
        tier.mass_game_id = game.mass_game_id;
    }

    if game.prize_tiers.is_empty() {
        return Err(FetchError::NoPrizeTiers(game.mass_game_id));
    }

    Ok(game)
}

/// Walks `text.content[0].content` of a rich-text block and returns the
/// first ticket count any inline run yields. Every run up to the match must
/// carry a `value`; a `null` value reads as empty text.
fn find_printed_tickets(
    block: &Value,
    field: &str,
    mode: ExtractMode,
) -> Result<Option<i64>, FetchError> {
    let runs = block
        .get("text")
        .and_then(|text| text.get("content"))
        .and_then(|content| content.get(0))
        .and_then(|first| first.get("content"))
        .and_then(Value::as_array)
        .ok_or_else(|| FetchError::MissingProperty(format!("{}.text.content[0].content", field)))?;

    for run in runs {
        let text = match run.get("value") {
            Some(Value::String(text)) => text.as_str(),
            Some(Value::Null) => "",
            _ => {
                return Err(FetchError::MissingProperty(format!(
                    "{}.text.content[0].content[].value",
                    field
                )));
            }
        };
        if let Some(count) = mode.extract(text) {
            return Ok(Some(count));
        }
    }
    Ok(None)
}

pub async fn fetch_game_detail<S: LotterySource>(
    source: &S,
    mass_game_id: i64,
    mode: ExtractMode,
    cancel: &CancelSignal,
) -> Result<Game, FetchError> {
    let body = cancel.guard(source.get_game(mass_game_id)).await?;
    parse_game_detail(&body, mass_game_id, mode)
}

/// Lists the catalog and fetches every valid entry's detail, one game at a
/// time. A failing game is logged and skipped; only a failed or empty
/// catalog listing is returned as an error. Cancellation ends the
/// traversal early with whatever has been collected.
pub async fn fetch_all_games<S: LotterySource>(
    source: &S,
    mode: ExtractMode,
    cancel: &CancelSignal,
) -> Result<Vec<Game>, FetchError> {
    info!("🔍 Fetching data from Mass Lottery API...");

    let body = match cancel.guard(source.get_catalog()).await {
        Ok(body) => body,
        Err(e) if e.is_canceled() => {
            warn!("Operation was canceled.");
            return Ok(Vec::new());
        }
        Err(e) => {
            error!("Failed to fetch game catalog: {}", e);
            return Err(e);
        }
    };

    let summaries = parse_catalog(&body).inspect_err(|e| {
        error!("Failed to read game catalog: {}", e);
    })?;

    let mut games = Vec::new();

    for summary in summaries {
        if cancel.is_cancelled() {
            warn!("Operation was canceled after {} games.", games.len());
            break;
        }

        if summary.mass_game_id == 0 {
            warn!(
                "Skipping game '{}' with missing or invalid MassGameId.",
                summary.game_name
            );
            continue;
        }

        info!("Fetching details for game ID: {}", summary.mass_game_id);

        match fetch_game_detail(source, summary.mass_game_id, mode, cancel).await {
            Ok(game) => {
                debug!("{}", game);
                games.push(game);
            }
            Err(e) if e.is_canceled() => {
                warn!("Request was canceled for game ID {}", summary.mass_game_id);
            }
            Err(e) => {
                warn!(
                    "✗ Error fetching details for game ID {}: {}",
                    summary.mass_game_id, e
                );
            }
        }
    }

    info!("Data fetching complete: {} games ready.", games.len());
    Ok(games)
}

/// Fetches the catalog and stores every game not already present. A failed
/// insert has already been rolled back when it is returned, and ends the run.
pub async fn fetch_and_save_games<S: LotterySource>(
    conn: &Connection,
    source: &S,
    mode: ExtractMode,
    cancel: &CancelSignal,
) -> anyhow::Result<IngestSummary> {
    let games = fetch_all_games(source, mode, cancel).await?;

    let mut summary = IngestSummary {
        fetched: games.len(),
        ..Default::default()
    };

    for game in &games {
        if game_exists(conn, game.mass_game_id)? {
            debug!("   ✓ {} (already exists)", game.mass_game_id);
            summary.already_stored += 1;
            continue;
        }

        info!("Inserting {} into the database...", game.game_name);
        insert_game_with_tiers(conn, game)
            .with_context(|| format!("failed to insert game {}", game.mass_game_id))?;
        summary.inserted += 1;
    }

    Ok(summary)
}
