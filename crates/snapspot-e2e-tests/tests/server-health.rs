use snapspot_e2e_tests::{launch_env, prepare_env, TestUser};
use tracing::info;
use tracing_test::traced_test;

#[tokio::test]
#[traced_test]
async fn test_health_and_token_guard() {
    let (args, _config_guard) = prepare_env("test_health").await.unwrap();
    let base_url = args.base_url.clone();

    let (client, _server) = launch_env(args, TestUser::User).await.unwrap();

    // health is public
    let response = client
        .get(base_url.join("health").unwrap())
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    // API requires a token
    let anonymous = reqwest::Client::new();
    let response = anonymous
        .get(base_url.join("api/spot").unwrap())
        .send()
        .await
        .unwrap();
    info!("Anonymous response: {:#?}", response);
    assert_eq!(response.status().as_u16(), 401);

    // a logged-in user can read the listing and own profile
    let response = client
        .get(base_url.join("api/spot").unwrap())
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());

    let response = client
        .get(base_url.join("users/me").unwrap())
        .send()
        .await
        .unwrap();
    assert!(response.status().is_success());
    let me: serde_json::Value = response.json().await.unwrap();
    assert_eq!(me["email"], "user@example.com");

    // but not the admin-only user listing
    let response = client
        .get(base_url.join("users").unwrap())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status().as_u16(), 403);
}
