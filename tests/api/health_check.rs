use crate::helpers::spawn_app;

#[tokio::test]
async fn health_check_ok() {
    let app = spawn_app().await;

    let resp = app
        .api_client
        .get(format!("{}/health_check", app.addr))
        .send()
        .await
        .unwrap();

    assert!(resp.status().is_success());
    assert_eq!(resp.content_length(), Some(0));
    // mailchimp is never contacted
    assert!(app.mailchimp_server.received_requests().await.unwrap().is_empty());
}
