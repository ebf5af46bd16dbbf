use crate::{error::Result, Error};
use futures::{StreamExt as _, TryStreamExt as _};
use garde::Validate;
use serde::{Deserialize, Serialize};
use sqlx::Pool;
use tracing::debug;

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct CreateCategory {
    #[garde(length(min = 1, max = 255))]
    name: String,
    #[garde(range(min = 0))]
    version: Option<i64>,
}

impl CreateCategory {
    pub fn new(name: impl Into<String>) -> Self {
        CreateCategory {
            name: name.into(),
            version: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct Category {
    pub id: i64,
    pub name: String,
    pub version: i64,
}

#[derive(Debug, Serialize, Deserialize, Clone, sqlx::FromRow)]
pub struct CategoryShort {
    pub id: i64,
    pub name: String,
}

pub type CategoryRepository = CategoryRepositoryImpl<Pool<crate::ChosenDB>>;

pub struct CategoryRepositoryImpl<E> {
    executor: E,
}

impl<'c, E> CategoryRepositoryImpl<E>
where
    for<'a> &'a E: sqlx::Executor<'c, Database = crate::ChosenDB>,
{
    pub fn new(executor: E) -> Self {
        Self { executor }
    }

    pub async fn create(&self, payload: CreateCategory) -> Result<Category> {
        let result = sqlx::query("INSERT INTO category (name, version) VALUES (?, 1)")
            .bind(&payload.name)
            .execute(&self.executor)
            .await?;

        let id = result.last_insert_rowid();
        self.get(id).await
    }

    pub async fn update(&self, id: i64, payload: CreateCategory) -> Result<Category> {
        let version = payload.version.ok_or_else(|| {
            debug!("No version provided");
            Error::MissingVersion
        })?;
        let result =
            sqlx::query("UPDATE category SET name = ?, version = ? WHERE id = ? and version = ?")
                .bind(&payload.name)
                .bind(version + 1)
                .bind(id)
                .bind(version)
                .execute(&self.executor)
                .await?;

        if result.rows_affected() == 0 {
            Err(Error::FailedUpdate { id, version })
        } else {
            self.get(id).await
        }
    }

    pub async fn list(&self, limit: usize) -> Result<Vec<CategoryShort>> {
        let records =
            sqlx::query_as::<_, CategoryShort>("SELECT id, name FROM category ORDER BY name")
                .fetch(&self.executor)
                .take(limit)
                .try_collect::<Vec<_>>()
                .await?;
        Ok(records)
    }

    pub async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT count(*) FROM category")
            .fetch_one(&self.executor)
            .await?;
        Ok(count as u64)
    }

    pub async fn delete(&self, id: i64) -> Result<()> {
        let res = sqlx::query("DELETE FROM category WHERE id = ?")
            .bind(id)
            .execute(&self.executor)
            .await?;

        if res.rows_affected() == 0 {
            Err(crate::error::Error::RecordNotFound("Category".to_string()))
        } else {
            Ok(())
        }
    }

    pub async fn get(&self, id: i64) -> Result<Category> {
        let record = sqlx::query_as::<_, Category>("SELECT * FROM category WHERE id = ?")
            .bind(id)
            .fetch_one(&self.executor)
            .await?;
        Ok(record)
    }

    pub async fn find_by_name(&self, name: &str) -> Result<Option<Category>> {
        let record = sqlx::query_as::<_, Category>("SELECT * FROM category WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.executor)
            .await?;
        Ok(record)
    }
}
