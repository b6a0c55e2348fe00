//! Health check endpoint tests.

use dashboard_tests::create_test_client;

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_health_check() {
    let client = create_test_client().expect("Failed to create client");

    let health = client.health_check().await.expect("Health check failed");

    assert_eq!(health.status, "healthy");
    assert!(!health.version.is_empty());
}
