use futures::TryStreamExt as _;
use snapspot_core::interaction::Reaction;
use sqlx::Executor;

const TEST_DATA: &str = r#"
INSERT INTO users (id, name, email, password, roles)
VALUES (1,'Ivana','ivana@example.com',NULL,'admin,user');
INSERT INTO users (id, name, email, password, roles)
VALUES (2,'Pavel','pavel@example.com',NULL,'user');

INSERT INTO spot (id, version, created, modified, name, description, address, latitude, longitude, review_count, created_by)
VALUES (1,1,datetime(),datetime(),'Golden Gate Bridge','Iconic suspension bridge','Golden Gate Bridge, San Francisco, CA',37.8199,-122.4783,0,'ivana');

INSERT INTO review (id, spot_id, user_id, rating, content, like_count, dislike_count, version, created, modified)
VALUES (1,1,1,5,'Gorgeous at sunrise',0,0,1,datetime(),datetime());

"#;

async fn init_db() -> sqlx::Pool<sqlx::Sqlite> {
    const DB_URL: &str = "sqlite::memory:";
    let conn = sqlx::sqlite::SqlitePoolOptions::new()
        .max_connections(1)
        .min_connections(1)
        .connect(DB_URL)
        .await
        .unwrap();
    conn.execute("PRAGMA foreign_keys = ON").await.unwrap();
    sqlx::migrate!("../../migrations").run(&conn).await.unwrap();

    conn.execute_many(TEST_DATA)
        .try_collect::<Vec<_>>()
        .await
        .unwrap();

    conn
}

async fn reaction_rows(pool: &sqlx::Pool<sqlx::Sqlite>, review_id: i64) -> (i64, i64) {
    let likes: i64 = sqlx::query_scalar(
        "SELECT count(*) FROM review_reactions WHERE review_id = ? AND is_liked = 1",
    )
    .bind(review_id)
    .fetch_one(pool)
    .await
    .unwrap();
    let dislikes: i64 = sqlx::query_scalar(
        "SELECT count(*) FROM review_reactions WHERE review_id = ? AND is_liked = 0",
    )
    .bind(review_id)
    .fetch_one(pool)
    .await
    .unwrap();
    (likes, dislikes)
}

#[tokio::test]
async fn test_review_create_recomputes_spot_aggregates() {
    let conn = init_db().await;
    let reviews = snapspot_dal::review::ReviewRepositoryImpl::new(conn.clone());
    let spots = snapspot_dal::spot::SpotRepositoryImpl::new(conn);

    let review = reviews
        .create(
            snapspot_dal::review::CreateReview {
                spot_id: 1,
                rating: 3,
                content: "Too crowded at noon".to_string(),
                image_urls: Some(vec!["https://images.example.com/crowd.jpg".to_string()]),
            },
            2,
        )
        .await
        .unwrap();
    assert_eq!(review.user_name.as_deref(), Some("Pavel"));
    assert_eq!(review.image_urls.len(), 1);

    // existing 5-star review plus the new 3-star one
    let spot = spots.get(1).await.unwrap();
    assert_eq!(spot.review_count, 2);
    assert_eq!(spot.rating, Some(4.0));

    let listed = reviews.list_by_spot(1).await.unwrap();
    assert_eq!(listed.len(), 2);
    // newest first
    assert_eq!(listed[0].id, review.id);

    reviews.delete(review.id).await.unwrap();
    let spot = spots.get(1).await.unwrap();
    assert_eq!(spot.review_count, 1);
    assert_eq!(spot.rating, Some(5.0));

    let missing_spot = reviews
        .create(
            snapspot_dal::review::CreateReview {
                spot_id: 999,
                rating: 1,
                content: "Nowhere".to_string(),
                image_urls: None,
            },
            2,
        )
        .await;
    assert!(matches!(
        missing_spot,
        Err(snapspot_dal::Error::RecordNotFound(_))
    ));
}

#[tokio::test]
async fn test_review_reaction_toggle_and_switch() {
    let conn = init_db().await;
    let reactions = snapspot_dal::reaction::ReviewReactionRepositoryImpl::new(conn.clone());

    // no interaction yet
    let status = reactions.get(1, 2).await.unwrap();
    assert_eq!(status.is_liked, None);

    // like it
    let outcome = reactions.set(1, 2, Reaction::Like).await.unwrap();
    assert_eq!(outcome.is_liked, Some(true));
    assert_eq!((outcome.like_count, outcome.dislike_count), (1, 0));
    assert_eq!(reaction_rows(&conn, 1).await, (1, 0));

    // switch to dislike moves the single interaction over
    let outcome = reactions.set(1, 2, Reaction::Dislike).await.unwrap();
    assert_eq!(outcome.is_liked, Some(false));
    assert_eq!((outcome.like_count, outcome.dislike_count), (0, 1));
    assert_eq!(reaction_rows(&conn, 1).await, (0, 1));

    // repeating the dislike toggles it off again
    let outcome = reactions.set(1, 2, Reaction::Dislike).await.unwrap();
    assert_eq!(outcome.is_liked, None);
    assert_eq!((outcome.like_count, outcome.dislike_count), (0, 0));
    assert_eq!(reaction_rows(&conn, 1).await, (0, 0));

    // two users like independently
    reactions.set(1, 1, Reaction::Like).await.unwrap();
    let outcome = reactions.set(1, 2, Reaction::Like).await.unwrap();
    assert_eq!((outcome.like_count, outcome.dislike_count), (2, 0));
    assert_eq!(reaction_rows(&conn, 1).await, (2, 0));

    let missing = reactions.set(999, 2, Reaction::Like).await;
    assert!(matches!(
        missing,
        Err(snapspot_dal::Error::RecordNotFound(_))
    ));
}

#[tokio::test]
async fn test_spot_reaction_state_machine() {
    let conn = init_db().await;
    let reactions = snapspot_dal::reaction::SpotReactionRepositoryImpl::new(conn.clone());

    let status = reactions.get(1, 2).await.unwrap();
    assert_eq!(status.is_liked, None);

    let status = reactions.set(1, 2, Reaction::Like).await.unwrap();
    assert_eq!(status.is_liked, Some(true));

    let status = reactions.set(1, 2, Reaction::Dislike).await.unwrap();
    assert_eq!(status.is_liked, Some(false));

    let status = reactions.set(1, 2, Reaction::Dislike).await.unwrap();
    assert_eq!(status.is_liked, None);
    // row is gone once unset
    let stored = reactions.list_for_user(2).await.unwrap();
    assert!(stored.is_empty());

    reactions.set(1, 2, Reaction::Like).await.unwrap();
    let stored = reactions.list_for_user(2).await.unwrap();
    assert_eq!(stored.len(), 1);
    assert_eq!(stored[0].spot_id, 1);
    assert!(stored[0].is_liked);
}
