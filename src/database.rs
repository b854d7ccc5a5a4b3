use crate::types::{Game, GameRow, PrizeTier, PrizeTierRow};
use rusqlite::{Connection, OptionalExtension, Result, params};
use tracing::{debug, error, info, warn};

const SCHEMA: &str = "
    CREATE TABLE IF NOT EXISTS games (
        massGameId INTEGER PRIMARY KEY,
        gameName TEXT NOT NULL,
        gameIdentifier TEXT NOT NULL,
        startDate TEXT,
        ticketCost INTEGER NOT NULL,
        odds TEXT,
        amountPrinted INTEGER,
        created_at DATETIME DEFAULT CURRENT_TIMESTAMP
    );

    CREATE TABLE IF NOT EXISTS prizeTiers (
        prizeTierId INTEGER PRIMARY KEY AUTOINCREMENT,
        massGameId INTEGER NOT NULL,
        tierNumber INTEGER NOT NULL,
        prizeAmount INTEGER NOT NULL,
        totalPrizes INTEGER NOT NULL,
        paidPrizes INTEGER NOT NULL,
        prizesRemaining INTEGER NOT NULL,
        prizeDescription TEXT NOT NULL,
        typeOfWin TEXT NOT NULL,
        FOREIGN KEY (massGameId) REFERENCES games (massGameId)
    );
";

pub fn create_database_with_connection(conn: &Connection) -> Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.execute_batch(SCHEMA)?;
    Ok(())
}

/// Cheap round trip used at startup to confirm the store is reachable.
pub fn test_connection(conn: &Connection) -> bool {
    match conn.query_row("SELECT 1", [], |row| row.get::<_, i64>(0)) {
        Ok(_) => true,
        Err(e) => {
            error!("Database connection error: {}", e);
            false
        }
    }
}

pub fn game_exists(conn: &Connection, mass_game_id: i64) -> Result<bool> {
    let mut stmt = conn.prepare("SELECT COUNT(*) FROM games WHERE massGameId = ?1")?;
    let count: i64 = stmt.query_row([mass_game_id], |row| row.get(0))?;
    Ok(count > 0)
}

pub fn insert_game(conn: &Connection, game: &Game) -> Result<()> {
    let start_date = game.start_date.map(|d| d.format("%Y-%m-%d").to_string());

    conn.execute(
        "INSERT INTO games (
            massGameId, gameName, gameIdentifier, startDate, ticketCost, odds, amountPrinted
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
        params![
            game.mass_game_id,
            game.game_name,
            game.game_identifier,
            start_date,
            game.ticket_cost,
            game.odds,
            game.amount_printed,
        ],
    )?;
    Ok(())
}

pub fn insert_prize_tier(conn: &Connection, mass_game_id: i64, tier: &PrizeTier) -> Result<()> {
    conn.execute(
        "INSERT INTO prizeTiers (
            massGameId, tierNumber, prizeAmount, totalPrizes, paidPrizes,
            prizesRemaining, prizeDescription, typeOfWin
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            mass_game_id,
            tier.tier_number,
            tier.prize_amount,
            tier.total_prizes,
            tier.paid_prizes,
            tier.prizes_remaining,
            tier.prize_description,
            tier.win_type,
        ],
    )?;
    Ok(())
}

/// Inserts the game row and then every prize tier, in order, inside one
/// transaction. Either all rows become visible or none do. On failure the
/// transaction is rolled back and the original error is returned.
///
/// Does not deduplicate: callers check `game_exists` first, and a duplicate
/// `massGameId` surfaces as a constraint error.
pub fn insert_game_with_tiers(conn: &Connection, game: &Game) -> Result<()> {
    let tx = conn.unchecked_transaction()?;

    let outcome = insert_game(&tx, game).and_then(|()| {
        for tier in &game.prize_tiers {
            debug!("   {}", tier);
            insert_prize_tier(&tx, game.mass_game_id, tier)?;
        }
        Ok(())
    });

    match outcome {
        Ok(()) => {
            tx.commit()?;
            info!(
                "✅ Inserted game '{}' (ID: {}) with {} prize tiers",
                game.game_name,
                game.mass_game_id,
                game.prize_tiers.len()
            );
            Ok(())
        }
        Err(e) => {
            error!("Error inserting game {}: {}", game.mass_game_id, e);
            match tx.rollback() {
                Ok(()) => warn!("Transaction rolled back for game {}", game.mass_game_id),
                Err(rollback_err) => error!(
                    "Error during rollback for game {}: {}",
                    game.mass_game_id, rollback_err
                ),
            }
            Err(e)
        }
    }
}

pub fn get_game_by_id(conn: &Connection, mass_game_id: i64) -> Result<Option<GameRow>> {
    let mut stmt = conn.prepare(
        "SELECT massGameId, gameName, gameIdentifier, startDate, ticketCost, odds, amountPrinted
         FROM games WHERE massGameId = ?1",
    )?;
    let result = stmt
        .query_row([mass_game_id], |row| {
            Ok(GameRow {
                mass_game_id: row.get(0)?,
                game_name: row.get(1)?,
                game_identifier: row.get(2)?,
                start_date: row.get(3)?,
                ticket_cost: row.get(4)?,
                odds: row.get(5)?,
                amount_printed: row.get(6)?,
            })
        })
        .optional()?;
    Ok(result)
}

pub fn get_prize_tiers_by_game_id(conn: &Connection, mass_game_id: i64) -> Result<Vec<PrizeTierRow>> {
    let mut stmt = conn.prepare(
        "SELECT prizeTierId, massGameId, tierNumber, prizeAmount, totalPrizes, paidPrizes,
                prizesRemaining, prizeDescription, typeOfWin
         FROM prizeTiers WHERE massGameId = ?1 ORDER BY prizeTierId",
    )?;
    let tier_iter = stmt.query_map([mass_game_id], |row| {
        Ok(PrizeTierRow {
            prize_tier_id: row.get(0)?,
            mass_game_id: row.get(1)?,
            tier_number: row.get(2)?,
            prize_amount: row.get(3)?,
            total_prizes: row.get(4)?,
            paid_prizes: row.get(5)?,
            prizes_remaining: row.get(6)?,
            prize_description: row.get(7)?,
            type_of_win: row.get(8)?,
        })
    })?;

    let mut results = Vec::new();
    for tier in tier_iter {
        results.push(tier?);
    }
    Ok(results)
}

pub fn count_games(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM games", [], |row| row.get(0))
}

pub fn count_prize_tiers(conn: &Connection) -> Result<i64> {
    conn.query_row("SELECT COUNT(*) FROM prizeTiers", [], |row| row.get(0))
}
