//! Chat command tests.

use dashboard_tests::create_test_client;

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_blank_message() {
    let client = create_test_client().expect("Failed to create client");

    let reply = client.chat("  ").await.expect("Failed to chat");
    assert_eq!(reply, "Please type something.");
}

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_list_companies_matches_listing() {
    let client = create_test_client().expect("Failed to create client");

    let companies = client
        .list_companies()
        .await
        .expect("Failed to list companies");
    let reply = client.chat("list companies").await.expect("Failed to chat");

    if companies.is_empty() {
        assert_eq!(reply, "No companies found.");
    } else {
        let first = format!("- {}", companies[0].name);
        assert!(reply.starts_with("Companies (showing first"));
        assert!(reply.lines().any(|line| line == first));
    }
}

#[tokio::test]
#[ignore = "requires a running server"]
async fn test_top_companies_follow_ranking() {
    let client = create_test_client().expect("Failed to create client");

    let ranking = client
        .get_rankings(Some(2024))
        .await
        .expect("Failed to get rankings");
    let reply = client
        .chat("top companies 2024")
        .await
        .expect("Failed to chat");

    match ranking.iter().find(|c| c.metrics_scored > 0) {
        Some(best) => {
            let mut lines = reply.lines();
            assert_eq!(lines.next(), Some("Top 10 Companies (2024):"));
            assert_eq!(
                lines.next(),
                Some(format!("- {}: {:.4}", best.name, best.score).as_str())
            );
            assert!(lines.count() < 10);
        }
        None => assert_eq!(reply, "No scores found for 2024."),
    }
}
