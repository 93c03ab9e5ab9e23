//! Availability business logic - reader booking windows.
//!
//! Blocks are the precondition for booking: an appointment must fall entirely
//! inside one block. Overlap between a reader's own blocks is rejected at
//! creation so the covering-block query stays unambiguous.

use crate::{
    entities::{AvailabilityBlock, availability_block},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::{QueryOrder, Set, prelude::*};

/// Opens a new availability window for a reader.
///
/// Fails with [`Error::SchedulingConflict`] if the window overlaps any of the
/// reader's existing blocks.
pub async fn add_block(
    db: &DatabaseConnection,
    reader_id: i64,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    timezone: &str,
) -> Result<availability_block::Model> {
    if start_time >= end_time {
        return Err(Error::Config {
            message: "availability window must end after it starts".to_string(),
        });
    }

    let overlapping = AvailabilityBlock::find()
        .filter(availability_block::Column::ReaderId.eq(reader_id))
        .filter(availability_block::Column::StartTime.lt(end_time))
        .filter(availability_block::Column::EndTime.gt(start_time))
        .count(db)
        .await?;
    if overlapping > 0 {
        return Err(Error::SchedulingConflict {
            message: "window overlaps an existing availability block".to_string(),
        });
    }

    let model = availability_block::ActiveModel {
        reader_id: Set(reader_id),
        start_time: Set(start_time),
        end_time: Set(end_time),
        timezone: Set(timezone.to_string()),
        ..Default::default()
    };
    Ok(model.insert(db).await?)
}

/// Finds a block of the reader fully covering `[start, end)`, if any.
pub async fn covering_block(
    db: &DatabaseConnection,
    reader_id: i64,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
) -> Result<Option<availability_block::Model>> {
    AvailabilityBlock::find()
        .filter(availability_block::Column::ReaderId.eq(reader_id))
        .filter(availability_block::Column::StartTime.lte(start_time))
        .filter(availability_block::Column::EndTime.gte(end_time))
        .one(db)
        .await
        .map_err(Into::into)
}

/// All of a reader's windows, earliest first.
pub async fn blocks_for_reader(
    db: &DatabaseConnection,
    reader_id: i64,
) -> Result<Vec<availability_block::Model>> {
    AvailabilityBlock::find()
        .filter(availability_block::Column::ReaderId.eq(reader_id))
        .order_by_asc(availability_block::Column::StartTime)
        .all(db)
        .await
        .map_err(Into::into)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use chrono::Duration;

    #[tokio::test]
    async fn test_add_block_rejects_overlap_same_reader_only() -> Result<()> {
        let db = setup_test_db().await?;
        let start = Utc::now() + Duration::hours(1);
        let end = start + Duration::hours(2);

        add_block(&db, 9, start, end, "UTC").await?;

        // Overlapping window for the same reader is rejected
        let result = add_block(&db, 9, start + Duration::minutes(30), end, "UTC").await;
        assert!(matches!(
            result.unwrap_err(),
            Error::SchedulingConflict { .. }
        ));

        // Same window for a different reader is fine
        add_block(&db, 10, start, end, "UTC").await?;

        // Adjacent (touching) window does not overlap
        add_block(&db, 9, end, end + Duration::hours(1), "UTC").await?;

        assert_eq!(blocks_for_reader(&db, 9).await?.len(), 2);

        Ok(())
    }

    #[tokio::test]
    async fn test_add_block_rejects_inverted_window() -> Result<()> {
        let db = setup_test_db().await?;
        let start = Utc::now();

        let result = add_block(&db, 9, start, start, "UTC").await;
        assert!(matches!(result.unwrap_err(), Error::Config { .. }));

        Ok(())
    }

    #[tokio::test]
    async fn test_covering_block() -> Result<()> {
        let db = setup_test_db().await?;
        let start = Utc::now() + Duration::hours(1);
        let end = start + Duration::hours(2);
        add_block(&db, 9, start, end, "UTC").await?;

        // Fully inside
        let found = covering_block(
            &db,
            9,
            start + Duration::minutes(15),
            start + Duration::minutes(45),
        )
        .await?;
        assert!(found.is_some());

        // Sticking out past the end
        let found = covering_block(&db, 9, end - Duration::minutes(15), end + Duration::minutes(15))
            .await?;
        assert!(found.is_none());

        Ok(())
    }
}
