use serde_json::json;
use snapspot_e2e_tests::{extend_url, launch_env, prepare_env, TestUser};
use tracing::info;
use tracing_test::traced_test;

#[tokio::test]
#[traced_test]
async fn test_categories() {
    let (args, _config_guard) = prepare_env("test_categories").await.unwrap();

    let base_url = args.base_url.clone();

    let (client, _server) = launch_env(args, TestUser::Admin).await.unwrap();

    let api_url = base_url.join("api/category").unwrap();
    let names = ["Nature", "Beach", "Mountain", "Luxury"];
    for name in names.iter() {
        let payload = json!({ "name": name });
        let response = client
            .post(api_url.clone())
            .json(&payload)
            .send()
            .await
            .unwrap();
        info!("Response: {:#?}", response);
        assert!(response.status().is_success());
        assert!(response.status().as_u16() == 201);
    }

    let response = client.get(api_url.clone()).send().await.unwrap();
    assert!(response.status().is_success());
    let stored: Vec<serde_json::Value> = response.json().await.unwrap();
    assert_eq!(names.len(), stored.len());
    // listing is sorted by name
    assert_eq!(stored[0]["name"], "Beach");

    let count_url = extend_url(&api_url, "count");
    let response = client.get(count_url).send().await.unwrap();
    assert!(response.status().is_success());
    let count: u64 = response.json().await.unwrap();
    assert_eq!(count, names.len() as u64);

    let id = stored[0]["id"].as_i64().unwrap();
    let record_url = extend_url(&api_url, id);

    let response = client.get(record_url.clone()).send().await.unwrap();
    assert!(response.status().is_success());
    let rec: serde_json::Value = response.json().await.unwrap();
    assert_eq!(rec["name"], "Beach");
    assert_eq!(rec["version"], 1);

    let update_rec = json!({"name": "Seaside", "version": 1});
    let response = client
        .put(record_url.clone())
        .json(&update_rec)
        .send()
        .await
        .unwrap();
    info!("Response: {:#?}", response);
    assert!(response.status().is_success());
    let new_rec: serde_json::Value = response.json().await.unwrap();
    assert_eq!(new_rec["name"], "Seaside");
    assert_eq!(new_rec["version"], 2);

    // stale version conflicts
    let response = client
        .put(record_url.clone())
        .json(&update_rec)
        .send()
        .await
        .unwrap();
    assert!(!response.status().is_success());
    assert_eq!(response.status().as_u16(), 409);

    let response = client.delete(record_url.clone()).send().await.unwrap();
    assert!(response.status().is_success());

    let response = client.get(record_url.clone()).send().await.unwrap();
    assert!(!response.status().is_success());
    assert_eq!(response.status().as_u16(), 404);

    let response = client.get(api_url.clone()).send().await.unwrap();
    assert!(response.status().is_success());
    let stored: Vec<serde_json::Value> = response.json().await.unwrap();
    assert_eq!(names.len() - 1, stored.len());
}

#[tokio::test]
#[traced_test]
async fn test_category_mutation_requires_admin() {
    let (args, _config_guard) = prepare_env("test_category_roles").await.unwrap();
    let base_url = args.base_url.clone();
    let (client, _server) = launch_env(args, TestUser::User).await.unwrap();

    let api_url = base_url.join("api/category").unwrap();
    let response = client
        .post(api_url.clone())
        .json(&json!({"name": "Nature"}))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);

    // reading is open to any logged-in user
    let response = client.get(api_url).send().await.unwrap();
    assert!(response.status().is_success());
}
