use serde::{Deserialize, Serialize};
use snapspot_core::interaction::{next_state, reconcile, Counts, Reaction, ReactionState};
use sqlx::Pool;
use tracing::debug;

use crate::{error::Result, Error};

/// A user's standing on one entity, `None` when there is no reaction row.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ReactionStatus {
    pub is_liked: Option<bool>,
}

impl ReactionStatus {
    fn from_state(state: ReactionState) -> Self {
        ReactionStatus {
            is_liked: state.as_flag(),
        }
    }
}

/// Reaction state together with the review counters it drives.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct ReviewReactionOutcome {
    pub is_liked: Option<bool>,
    pub like_count: i64,
    pub dislike_count: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct SpotReactionRow {
    pub spot_id: i64,
    pub is_liked: bool,
}

pub type ReviewReactionRepository = ReviewReactionRepositoryImpl<Pool<crate::ChosenDB>>;

pub struct ReviewReactionRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> ReviewReactionRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn get(&self, review_id: i64, user_id: i64) -> Result<ReactionStatus> {
        let is_liked: Option<bool> = sqlx::query_scalar(
            "SELECT is_liked FROM review_reactions WHERE review_id = ? AND user_id = ?",
        )
        .bind(review_id)
        .bind(user_id)
        .fetch_optional(&self.executor)
        .await?;
        Ok(ReactionStatus { is_liked })
    }
}

impl ReviewReactionRepositoryImpl<Pool<crate::ChosenDB>> {
    /// Applies one like/dislike click. The read of the current row, the state
    /// transition and the counter writes happen in a single transaction, so
    /// rapid repeated clicks on the same review cannot interleave and corrupt
    /// the counters.
    pub async fn set(
        &self,
        review_id: i64,
        user_id: i64,
        requested: Reaction,
    ) -> Result<ReviewReactionOutcome> {
        let mut tx = self.executor.begin().await?;

        let counts: Option<(i64, i64)> =
            sqlx::query_as("SELECT like_count, dislike_count FROM review WHERE id = ?")
                .bind(review_id)
                .fetch_optional(&mut *tx)
                .await?;
        let Some((like_count, dislike_count)) = counts else {
            return Err(Error::RecordNotFound("Review".to_string()));
        };

        let existing: Option<bool> = sqlx::query_scalar(
            "SELECT is_liked FROM review_reactions WHERE review_id = ? AND user_id = ?",
        )
        .bind(review_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let result = reconcile(
            ReactionState::from_flag(existing),
            requested,
            Counts::new(like_count, dislike_count),
        );
        debug!(
            review_id,
            user_id,
            ?existing,
            new = ?result.state,
            "review reaction transition"
        );

        match result.state.as_flag() {
            Some(flag) => {
                sqlx::query(
                    "INSERT INTO review_reactions (review_id, user_id, is_liked) VALUES (?, ?, ?) \
                     ON CONFLICT (review_id, user_id) DO UPDATE SET is_liked = excluded.is_liked",
                )
                .bind(review_id)
                .bind(user_id)
                .bind(flag)
                .execute(&mut *tx)
                .await?;
            }
            None => {
                sqlx::query("DELETE FROM review_reactions WHERE review_id = ? AND user_id = ?")
                    .bind(review_id)
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        sqlx::query("UPDATE review SET like_count = ?, dislike_count = ? WHERE id = ?")
            .bind(result.counts.likes)
            .bind(result.counts.dislikes)
            .bind(review_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;

        Ok(ReviewReactionOutcome {
            is_liked: result.state.as_flag(),
            like_count: result.counts.likes,
            dislike_count: result.counts.dislikes,
        })
    }
}

pub type SpotReactionRepository = SpotReactionRepositoryImpl<Pool<crate::ChosenDB>>;

pub struct SpotReactionRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> SpotReactionRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn get(&self, spot_id: i64, user_id: i64) -> Result<ReactionStatus> {
        let is_liked: Option<bool> = sqlx::query_scalar(
            "SELECT is_liked FROM spot_reactions WHERE spot_id = ? AND user_id = ?",
        )
        .bind(spot_id)
        .bind(user_id)
        .fetch_optional(&self.executor)
        .await?;
        Ok(ReactionStatus { is_liked })
    }

    /// All spot reactions of one user - the stored-spots listing.
    pub async fn list_for_user(&self, user_id: i64) -> Result<Vec<SpotReactionRow>> {
        let rows = sqlx::query_as::<_, SpotReactionRow>(
            "SELECT spot_id, is_liked FROM spot_reactions WHERE user_id = ? ORDER BY spot_id",
        )
        .bind(user_id)
        .fetch_all(&self.executor)
        .await?;
        Ok(rows)
    }
}

impl SpotReactionRepositoryImpl<Pool<crate::ChosenDB>> {
    /// Spots carry no visible counters, only the per-user state machine.
    pub async fn set(
        &self,
        spot_id: i64,
        user_id: i64,
        requested: Reaction,
    ) -> Result<ReactionStatus> {
        let mut tx = self.executor.begin().await?;

        let spot: Option<i64> = sqlx::query_scalar("SELECT id FROM spot WHERE id = ?")
            .bind(spot_id)
            .fetch_optional(&mut *tx)
            .await?;
        if spot.is_none() {
            return Err(Error::RecordNotFound("Spot".to_string()));
        }

        let existing: Option<bool> = sqlx::query_scalar(
            "SELECT is_liked FROM spot_reactions WHERE spot_id = ? AND user_id = ?",
        )
        .bind(spot_id)
        .bind(user_id)
        .fetch_optional(&mut *tx)
        .await?;

        let state = next_state(ReactionState::from_flag(existing), requested);

        match state.as_flag() {
            Some(flag) => {
                sqlx::query(
                    "INSERT INTO spot_reactions (spot_id, user_id, is_liked) VALUES (?, ?, ?) \
                     ON CONFLICT (spot_id, user_id) DO UPDATE SET is_liked = excluded.is_liked",
                )
                .bind(spot_id)
                .bind(user_id)
                .bind(flag)
                .execute(&mut *tx)
                .await?;
            }
            None => {
                sqlx::query("DELETE FROM spot_reactions WHERE spot_id = ? AND user_id = ?")
                    .bind(spot_id)
                    .bind(user_id)
                    .execute(&mut *tx)
                    .await?;
            }
        }

        tx.commit().await?;
        Ok(ReactionStatus::from_state(state))
    }
}
