//! PostgreSQL integration for starfall.
//!
//! Low-level connectivity plus table metadata. Domain crates implement
//! [`Table`] to describe their DDL; repositories build their SQL with
//! `const_format::concatcp!` over the table-name constants so statement
//! strings are assembled at compile time.

use std::sync::Arc;
use tokio_postgres::Client;

/// Establishes a database connection.
///
/// Connects to PostgreSQL using the `DB_URL` environment variable.
/// Returns an `Arc<Client>` suitable for sharing across async tasks.
///
/// # Panics
///
/// Panics if `DB_URL` is not set or if connection fails.
pub async fn db() -> Arc<Client> {
    log::info!("connecting to database");
    let tls = tokio_postgres::tls::NoTls;
    let ref url = std::env::var("DB_URL").expect("DB_URL must be set");
    let (client, connection) = tokio_postgres::connect(url, tls)
        .await
        .expect("database connection failed");
    tokio::spawn(connection);
    client
        .execute("SET client_min_messages TO WARNING", &[])
        .await
        .expect("set client_min_messages");
    Arc::new(client)
}

/// PostgreSQL error type alias.
pub type PgErr = tokio_postgres::Error;

/// DDL metadata for one persistent entity.
pub trait Table {
    /// Table name in the database.
    fn name() -> &'static str;
    /// `CREATE TABLE IF NOT EXISTS` statement.
    fn creates() -> &'static str;
    /// `CREATE INDEX IF NOT EXISTS` statements, empty when none.
    fn indices() -> &'static str;
}

/// Table for player accounts and balances.
#[rustfmt::skip]
pub const PLAYERS:      &str = "players";
/// Table for per-player game state with optimistic versioning.
#[rustfmt::skip]
pub const GAME_STATES:  &str = "game_states";
/// Table for completed spin results and their replay payloads.
#[rustfmt::skip]
pub const SPIN_RESULTS: &str = "spin_results";
/// Table for the append-only wallet ledger.
#[rustfmt::skip]
pub const TRANSACTIONS: &str = "transactions";
