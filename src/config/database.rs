//! Database configuration module.
//!
//! This module handles `SQLite` database connection and table creation using `SeaORM`.
//! It provides functions for establishing database connections and creating all necessary tables
//! based on the entity definitions. The module uses `SeaORM`'s `Schema::create_table_from_entity`
//! method to automatically generate SQL statements from the entity models, ensuring that the
//! database schema matches the Rust struct definitions without requiring manual SQL.

use crate::entities::{
    Appointment, AvailabilityBlock, Gift, LedgerEntry, PayoutBalance, PayoutEntry, ReaderProfile,
    Session, StreamGift, Wallet,
};
use crate::errors::Result;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, Schema};

/// Establishes a connection to the database using the `DATABASE_URL` environment variable.
///
/// Falls back to a default local `SQLite` file if no environment variable is set.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = std::env::var("DATABASE_URL")
        .unwrap_or_else(|_| "sqlite://data/seance.sqlite".to_string());

    Database::connect(&database_url).await.map_err(Into::into)
}

/// Creates all necessary database tables using `SeaORM`'s schema generation from entity definitions.
///
/// This function uses the `DeriveEntityModel` macros to automatically generate proper SQL
/// statements for table creation, ensuring the database schema matches the Rust struct definitions.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    db.execute(builder.build(&schema.create_table_from_entity(Wallet)))
        .await?;
    db.execute(builder.build(&schema.create_table_from_entity(LedgerEntry)))
        .await?;
    db.execute(builder.build(&schema.create_table_from_entity(PayoutBalance)))
        .await?;
    db.execute(builder.build(&schema.create_table_from_entity(PayoutEntry)))
        .await?;
    db.execute(builder.build(&schema.create_table_from_entity(ReaderProfile)))
        .await?;
    db.execute(builder.build(&schema.create_table_from_entity(Session)))
        .await?;
    db.execute(builder.build(&schema.create_table_from_entity(Appointment)))
        .await?;
    db.execute(builder.build(&schema.create_table_from_entity(AvailabilityBlock)))
        .await?;
    db.execute(builder.build(&schema.create_table_from_entity(Gift)))
        .await?;
    db.execute(builder.build(&schema.create_table_from_entity(StreamGift)))
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::{SessionModel, WalletModel};
    use sea_orm::{EntityTrait, QuerySelect};

    #[tokio::test]
    async fn test_create_tables() -> Result<()> {
        let db = Database::connect("sqlite::memory:").await?;
        create_tables(&db).await?;

        // Test that tables exist by querying them
        let _: Vec<WalletModel> = Wallet::find().limit(1).all(&db).await?;
        let _: Vec<SessionModel> = Session::find().limit(1).all(&db).await?;

        Ok(())
    }
}
