use garde::Validate;
use serde::{Deserialize, Serialize};
use snapspot_core::geo::{Point, SpotFacts};
use sqlx::{Pool, Row};

use crate::{error::Result, Batch, ChosenRow, Error, ListingParams, MAX_LIMIT};

/// Separator for aggregated image URLs - URLs cannot contain a bare '|'.
const IMAGE_SEPARATOR: &str = "|";

const SORTABLE_FIELDS: &[&str] = &["id", "name", "rating", "review_count", "created", "modified"];

const SPOT_SQL: &str = r#"
SELECT s.id, s.name, s.description, s.address, s.latitude, s.longitude,
s.rating, s.review_count, s.version, s.created_by, s.created, s.modified,
(SELECT group_concat(sc.category_id) FROM spot_categories sc WHERE sc.spot_id = s.id) AS category_ids,
(SELECT group_concat(image_url, '|') FROM
    (SELECT si.image_url FROM spot_images si WHERE si.spot_id = s.id ORDER BY si.position)
) AS image_urls
FROM spot s
"#;

#[derive(Debug, Serialize, Clone)]
pub struct Spot {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub address: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub rating: Option<f64>,
    pub review_count: i64,
    pub category_ids: Vec<i64>,
    pub image_urls: Vec<String>,
    pub version: i64,
    pub created_by: Option<String>,
    pub created: time::PrimitiveDateTime,
    pub modified: time::PrimitiveDateTime,
}

impl sqlx::FromRow<'_, ChosenRow> for Spot {
    fn from_row(row: &ChosenRow) -> Result<Self, sqlx::Error> {
        let category_ids = row
            .try_get::<Option<String>, _>("category_ids")?
            .map(|s| {
                s.split(',')
                    .filter_map(|id| id.parse::<i64>().ok())
                    .collect()
            })
            .unwrap_or_default();
        let image_urls = row
            .try_get::<Option<String>, _>("image_urls")?
            .map(|s| {
                s.split(IMAGE_SEPARATOR)
                    .filter(|u| !u.is_empty())
                    .map(|u| u.to_string())
                    .collect()
            })
            .unwrap_or_default();
        Ok(Spot {
            id: row.try_get("id")?,
            name: row.try_get("name")?,
            description: row.try_get("description")?,
            address: row.try_get("address")?,
            latitude: row.try_get("latitude")?,
            longitude: row.try_get("longitude")?,
            rating: row.try_get("rating")?,
            review_count: row.try_get("review_count")?,
            category_ids,
            image_urls,
            version: row.try_get("version")?,
            created_by: row.try_get("created_by")?,
            created: row.try_get("created")?,
            modified: row.try_get("modified")?,
        })
    }
}

impl SpotFacts for Spot {
    fn coordinates(&self) -> Option<Point> {
        match (self.latitude, self.longitude) {
            (Some(lat), Some(lng)) => Some(Point::new(lat, lng)),
            _ => None,
        }
    }

    fn category_ids(&self) -> &[i64] {
        &self.category_ids
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    fn address(&self) -> Option<&str> {
        self.address.as_deref()
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct CreateSpot {
    #[garde(length(min = 1, max = 255))]
    pub name: String,
    #[garde(length(min = 1, max = 5000))]
    pub description: Option<String>,
    #[garde(length(min = 1, max = 1023))]
    pub address: Option<String>,
    #[garde(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[garde(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[garde(skip)]
    pub category_ids: Option<Vec<i64>>,
    #[garde(inner(inner(length(min = 1, max = 1023))))]
    pub image_urls: Option<Vec<String>>,
    #[garde(skip)]
    pub created_by: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct UpdateSpot {
    #[garde(length(min = 1, max = 255))]
    pub name: String,
    #[garde(length(min = 1, max = 5000))]
    pub description: Option<String>,
    #[garde(length(min = 1, max = 1023))]
    pub address: Option<String>,
    #[garde(range(min = -90.0, max = 90.0))]
    pub latitude: Option<f64>,
    #[garde(range(min = -180.0, max = 180.0))]
    pub longitude: Option<f64>,
    #[garde(skip)]
    pub category_ids: Option<Vec<i64>>,
    #[garde(inner(inner(length(min = 1, max = 1023))))]
    pub image_urls: Option<Vec<String>>,
    #[garde(range(min = 0))]
    pub version: Option<i64>,
}

pub type SpotRepository = SpotRepositoryImpl<Pool<crate::ChosenDB>>;

pub struct SpotRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> SpotRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn get(&self, id: i64) -> Result<Spot> {
        let sql = format!("{SPOT_SQL} WHERE s.id = ?");
        let record = sqlx::query_as::<_, Spot>(&sql)
            .bind(id)
            .fetch_one(&self.executor)
            .await?;
        Ok(record)
    }

    pub async fn list(&self, params: ListingParams) -> Result<Batch<Spot>> {
        let ordering = params.ordering(SORTABLE_FIELDS)?;
        let order_clause = if ordering.is_empty() {
            "ORDER BY id".to_string()
        } else {
            format!("ORDER BY {ordering}")
        };
        let sql = format!("{SPOT_SQL} {order_clause} LIMIT ? OFFSET ?");
        let rows = sqlx::query_as::<_, Spot>(&sql)
            .bind(params.limit)
            .bind(params.offset)
            .fetch_all(&self.executor)
            .await?;
        let total = self.count().await?;
        Ok(Batch {
            rows,
            total,
            offset: params.offset,
        })
    }

    pub async fn list_all(&self) -> Result<Vec<Spot>> {
        let sql = format!("{SPOT_SQL} ORDER BY id LIMIT ?");
        let rows = sqlx::query_as::<_, Spot>(&sql)
            .bind(MAX_LIMIT as i64)
            .fetch_all(&self.executor)
            .await?;
        Ok(rows)
    }

    pub async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM spot")
            .fetch_one(&self.executor)
            .await?;
        Ok(count as u64)
    }
}

impl SpotRepositoryImpl<Pool<crate::ChosenDB>> {
    pub async fn create(&self, payload: CreateSpot) -> Result<Spot> {
        let mut tx = self.executor.begin().await?;
        let result = sqlx::query(
            "INSERT INTO spot (name, description, address, latitude, longitude, review_count, version, created_by, created, modified) \
             VALUES (?, ?, ?, ?, ?, 0, 1, ?, datetime(), datetime())",
        )
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(&payload.address)
        .bind(payload.latitude)
        .bind(payload.longitude)
        .bind(&payload.created_by)
        .execute(&mut *tx)
        .await?;
        let id = result.last_insert_rowid();

        if let Some(category_ids) = payload.category_ids {
            link_categories(&mut tx, id, &category_ids).await?;
        }
        if let Some(image_urls) = payload.image_urls {
            store_images(&mut tx, id, &image_urls).await?;
        }
        tx.commit().await?;

        self.get(id).await
    }

    pub async fn update(&self, id: i64, payload: UpdateSpot) -> Result<Spot> {
        let version = payload.version.ok_or(Error::MissingVersion)?;
        let mut tx = self.executor.begin().await?;
        let result = sqlx::query(
            "UPDATE spot SET name = ?, description = ?, address = ?, latitude = ?, longitude = ?, \
             version = ?, modified = datetime() WHERE id = ? and version = ?",
        )
        .bind(&payload.name)
        .bind(&payload.description)
        .bind(&payload.address)
        .bind(payload.latitude)
        .bind(payload.longitude)
        .bind(version + 1)
        .bind(id)
        .bind(version)
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(Error::FailedUpdate { id, version });
        }

        if let Some(category_ids) = payload.category_ids {
            sqlx::query("DELETE FROM spot_categories WHERE spot_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            link_categories(&mut tx, id, &category_ids).await?;
        }
        if let Some(image_urls) = payload.image_urls {
            sqlx::query("DELETE FROM spot_images WHERE spot_id = ?")
                .bind(id)
                .execute(&mut *tx)
                .await?;
            store_images(&mut tx, id, &image_urls).await?;
        }
        tx.commit().await?;

        self.get(id).await
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM spot WHERE id = ?")
            .bind(id)
            .execute(&self.executor)
            .await?;

        if res.rows_affected() == 0 {
            Err(Error::RecordNotFound("Spot".to_string()))
        } else {
            Ok(())
        }
    }
}

async fn link_categories(
    tx: &mut sqlx::Transaction<'_, crate::ChosenDB>,
    spot_id: i64,
    category_ids: &[i64],
) -> Result<()> {
    for category_id in category_ids {
        sqlx::query("INSERT INTO spot_categories (spot_id, category_id) VALUES (?, ?)")
            .bind(spot_id)
            .bind(category_id)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

async fn store_images(
    tx: &mut sqlx::Transaction<'_, crate::ChosenDB>,
    spot_id: i64,
    image_urls: &[String],
) -> Result<()> {
    for (position, url) in image_urls.iter().enumerate() {
        sqlx::query("INSERT INTO spot_images (spot_id, image_url, position) VALUES (?, ?, ?)")
            .bind(spot_id)
            .bind(url)
            .bind(position as i64)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}
