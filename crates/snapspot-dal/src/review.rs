use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::{Pool, Row};

use crate::{error::Result, ChosenRow, Error};

const REVIEW_SQL: &str = r#"
SELECT r.id, r.spot_id, r.user_id, r.rating, r.content, r.like_count, r.dislike_count,
r.version, r.created, r.modified,
u.name AS user_name, u.profile_picture AS user_avatar,
(SELECT group_concat(image_url, '|') FROM
    (SELECT ri.image_url FROM review_images ri WHERE ri.review_id = r.id ORDER BY ri.position)
) AS image_urls
FROM review r
LEFT JOIN users u ON r.user_id = u.id
"#;

#[derive(Debug, Serialize, Clone)]
pub struct Review {
    pub id: i64,
    pub spot_id: i64,
    pub user_id: i64,
    pub rating: i64,
    pub content: String,
    pub like_count: i64,
    pub dislike_count: i64,
    pub image_urls: Vec<String>,
    pub user_name: Option<String>,
    pub user_avatar: Option<String>,
    pub version: i64,
    pub created: time::PrimitiveDateTime,
    pub modified: time::PrimitiveDateTime,
}

impl sqlx::FromRow<'_, ChosenRow> for Review {
    fn from_row(row: &ChosenRow) -> Result<Self, sqlx::Error> {
        let image_urls = row
            .try_get::<Option<String>, _>("image_urls")?
            .map(|s| {
                s.split('|')
                    .filter(|u| !u.is_empty())
                    .map(|u| u.to_string())
                    .collect()
            })
            .unwrap_or_default();
        Ok(Review {
            id: row.try_get("id")?,
            spot_id: row.try_get("spot_id")?,
            user_id: row.try_get("user_id")?,
            rating: row.try_get("rating")?,
            content: row.try_get("content")?,
            like_count: row.try_get("like_count")?,
            dislike_count: row.try_get("dislike_count")?,
            image_urls,
            user_name: row.try_get("user_name")?,
            user_avatar: row.try_get("user_avatar")?,
            version: row.try_get("version")?,
            created: row.try_get("created")?,
            modified: row.try_get("modified")?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct CreateReview {
    #[garde(range(min = 1))]
    pub spot_id: i64,
    #[garde(range(min = 1, max = 5))]
    pub rating: i64,
    #[garde(length(min = 1, max = 5000))]
    pub content: String,
    #[garde(inner(inner(length(min = 1, max = 1023))))]
    pub image_urls: Option<Vec<String>>,
}

pub type ReviewRepository = ReviewRepositoryImpl<Pool<crate::ChosenDB>>;

pub struct ReviewRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> ReviewRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn get(&self, id: i64) -> Result<Review> {
        let sql = format!("{REVIEW_SQL} WHERE r.id = ?");
        let record = sqlx::query_as::<_, Review>(&sql)
            .bind(id)
            .fetch_one(&self.executor)
            .await?;
        Ok(record)
    }

    /// Reviews of one spot, newest first.
    pub async fn list_by_spot(&self, spot_id: i64) -> Result<Vec<Review>> {
        let sql = format!("{REVIEW_SQL} WHERE r.spot_id = ? ORDER BY r.created DESC, r.id DESC");
        let records = sqlx::query_as::<_, Review>(&sql)
            .bind(spot_id)
            .fetch_all(&self.executor)
            .await?;
        Ok(records)
    }
}

impl ReviewRepositoryImpl<Pool<crate::ChosenDB>> {
    pub async fn create(&self, payload: CreateReview, author_id: i64) -> Result<Review> {
        let mut tx = self.executor.begin().await?;
        let spot: Option<i64> = sqlx::query_scalar("SELECT id FROM spot WHERE id = ?")
            .bind(payload.spot_id)
            .fetch_optional(&mut *tx)
            .await?;
        if spot.is_none() {
            return Err(Error::RecordNotFound("Spot".to_string()));
        }

        let result = sqlx::query(
            "INSERT INTO review (spot_id, user_id, rating, content, like_count, dislike_count, version, created, modified) \
             VALUES (?, ?, ?, ?, 0, 0, 1, datetime(), datetime())",
        )
        .bind(payload.spot_id)
        .bind(author_id)
        .bind(payload.rating)
        .bind(&payload.content)
        .execute(&mut *tx)
        .await?;
        let id = result.last_insert_rowid();

        if let Some(image_urls) = payload.image_urls {
            for (position, url) in image_urls.iter().enumerate() {
                sqlx::query(
                    "INSERT INTO review_images (review_id, image_url, position) VALUES (?, ?, ?)",
                )
                .bind(id)
                .bind(url)
                .bind(position as i64)
                .execute(&mut *tx)
                .await?;
            }
        }

        recompute_spot_aggregates(&mut tx, payload.spot_id).await?;
        tx.commit().await?;

        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let mut tx = self.executor.begin().await?;
        let spot_id: Option<i64> = sqlx::query_scalar("SELECT spot_id FROM review WHERE id = ?")
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(spot_id) = spot_id else {
            return Err(Error::RecordNotFound("Review".to_string()));
        };

        sqlx::query("DELETE FROM review WHERE id = ?")
            .bind(id)
            .execute(&mut *tx)
            .await?;
        recompute_spot_aggregates(&mut tx, spot_id).await?;
        tx.commit().await?;
        Ok(())
    }
}

/// Spot rating and review_count are derived aggregates - they are recomputed
/// in the same transaction as the review change that invalidates them.
async fn recompute_spot_aggregates(
    tx: &mut sqlx::Transaction<'_, crate::ChosenDB>,
    spot_id: i64,
) -> Result<()> {
    sqlx::query(
        "UPDATE spot SET \
         rating = (SELECT AVG(rating) FROM review WHERE spot_id = ?), \
         review_count = (SELECT count(*) FROM review WHERE spot_id = ?), \
         modified = datetime() \
         WHERE id = ?",
    )
    .bind(spot_id)
    .bind(spot_id)
    .bind(spot_id)
    .execute(&mut **tx)
    .await?;
    Ok(())
}
