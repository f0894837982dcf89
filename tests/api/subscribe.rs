use serde_json::json;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::Mock;
use wiremock::ResponseTemplate;

use crate::helpers::assert_is_redirect_to;
use crate::helpers::merge_fields;
use crate::helpers::mount_lookup;
use crate::helpers::mount_merge_fields;
use crate::helpers::mount_subscribe;
use crate::helpers::spawn_app;
use crate::helpers::spawn_app_with;
use crate::helpers::LIST_ID;

#[tokio::test]
async fn form_shows_email_first_and_only_visible_fields() {
    let app = spawn_app().await;
    Mock::given(path(format!("/lists/{LIST_ID}/merge-fields")))
        .and(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(merge_fields()))
        // second render comes from the cache
        .expect(1)
        .mount(&app.mailchimp_server)
        .await;

    let resp = app.get_subscribe("").await;
    assert_eq!(resp.status().as_u16(), 200);
    let html = resp.text().await.unwrap();
    app.get_subscribe_html().await;

    assert!(html.contains("<h2>Newsletter</h2>"));
    assert!(html.contains("Email address"));
    let email = html.find(r#"name="EMAIL""#).unwrap();
    let fname = html.find(r#"name="FNAME""#).unwrap();
    assert!(email < fname);
    assert!(!html.contains(r#"name="LNAME""#));
    // the schema's own EMAIL field is not rendered twice
    assert_eq!(html.matches(r#"name="EMAIL""#).count(), 1);
}

#[tokio::test]
async fn query_string_prefills_the_form() {
    let app = spawn_app().await;
    mount_merge_fields(&app.mailchimp_server, merge_fields()).await;

    let html = app
        .get_subscribe("?FNAME=Ann")
        .await
        .text()
        .await
        .unwrap();

    assert!(html.contains(r#"value="Ann""#));
}

#[tokio::test]
async fn nothing_is_rendered_without_a_list_id() {
    let app = spawn_app_with(|cfg| cfg.widget.list_id = "".to_string()).await;

    let resp = app.get_subscribe("").await;

    assert_eq!(resp.status().as_u16(), 200);
    assert!(resp.text().await.unwrap().is_empty());
    assert!(app.mailchimp_server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn unreachable_mailchimp_still_renders_an_email_field() {
    // no mocks mounted: every call gets a 404
    let app = spawn_app().await;

    let resp = app.get_subscribe("").await;

    assert_eq!(resp.status().as_u16(), 200);
    let html = resp.text().await.unwrap();
    assert!(html.contains(r#"name="EMAIL""#));
    assert!(!html.contains(r#"name="FNAME""#));
}

#[tokio::test]
async fn unsubscribed_member_is_subscribed_once() {
    let app = spawn_app().await;
    mount_merge_fields(&app.mailchimp_server, merge_fields()).await;
    mount_lookup(&app.mailchimp_server, 231, 1).await;
    mount_subscribe(&app.mailchimp_server, 1).await;

    let body = serde_urlencoded::to_string([("EMAIL", "ann@example.com"), ("FNAME", "Ann")]).unwrap();
    let resp = app.post_subscribe(&body).await;
    assert_is_redirect_to(&resp, "/subscribe");

    let requests = app.subscribe_requests().await;
    assert_eq!(requests.len(), 1);
    assert_eq!(
        requests[0],
        json!({
            "email_address": "ann@example.com",
            "status": "subscribed",
            "merge_fields": {"FNAME": "Ann"},
        })
    );

    let html = app.get_subscribe_html().await;
    assert!(html.contains("Thanks for subscribing!"));
}

#[tokio::test]
async fn unknown_address_gets_double_opt_in() {
    let app = spawn_app().await;
    mount_merge_fields(&app.mailchimp_server, merge_fields()).await;
    mount_lookup(&app.mailchimp_server, 232, 1).await;
    mount_subscribe(&app.mailchimp_server, 1).await;

    let resp = app.post_subscribe("EMAIL=ann%40example.com").await;
    assert_is_redirect_to(&resp, "/subscribe");

    let requests = app.subscribe_requests().await;
    assert_eq!(requests[0]["status"], "pending");
    // blank optional fields are left out altogether
    assert!(requests[0].get("merge_fields").is_none());
}

#[tokio::test]
async fn existing_member_is_not_written() {
    let app = spawn_app().await;
    mount_merge_fields(&app.mailchimp_server, merge_fields()).await;
    mount_lookup(&app.mailchimp_server, 230, 1).await;
    mount_subscribe(&app.mailchimp_server, 0).await;

    let resp = app.post_subscribe("EMAIL=ann%40example.com").await;
    assert_is_redirect_to(&resp, "/subscribe");

    let html = app.get_subscribe_html().await;
    assert!(html.contains("This address is already subscribed."));
}

#[tokio::test]
async fn invalid_submissions_never_reach_mailchimp() {
    let app = spawn_app().await;
    mount_merge_fields(&app.mailchimp_server, merge_fields()).await;
    mount_lookup(&app.mailchimp_server, 231, 0).await;
    mount_subscribe(&app.mailchimp_server, 0).await;

    for (body, msg) in [
        ("", "empty body"),
        ("FNAME=Ann", "missing email"),
        ("EMAIL=&FNAME=Ann", "blank email"),
        ("EMAIL=not-an-email", "invalid email"),
    ] {
        let resp = app.post_subscribe(body).await;
        assert_eq!(resp.status().as_u16(), 400, "{msg}");
        let html = resp.text().await.unwrap();
        assert!(html.contains(r#"name="EMAIL""#), "{msg}");
    }
}

#[tokio::test]
async fn submitted_values_survive_a_failed_validation() {
    let app = spawn_app().await;
    mount_merge_fields(&app.mailchimp_server, merge_fields()).await;

    let resp = app.post_subscribe("FNAME=Ann").await;

    assert_eq!(resp.status().as_u16(), 400);
    let html = resp.text().await.unwrap();
    assert!(html.contains(r#"value="Ann""#));
    assert!(html.contains("This field is required"));
}

#[tokio::test]
async fn finish_node_replaces_the_success_notice() {
    let app = spawn_app_with(|cfg| {
        cfg.widget.finish_node = Some("thanks".to_string());
        cfg.widget
            .nodes
            .insert("thanks".to_string(), "thank-you".to_string());
    })
    .await;
    mount_merge_fields(&app.mailchimp_server, merge_fields()).await;
    mount_lookup(&app.mailchimp_server, 233, 1).await;
    mount_subscribe(&app.mailchimp_server, 1).await;

    let resp = app.post_subscribe("EMAIL=ann%40example.com").await;

    assert_is_redirect_to(&resp, "/en/thank-you");
}

#[tokio::test]
async fn rejected_subscription_shows_mailchimp_message() {
    let app = spawn_app().await;
    mount_merge_fields(&app.mailchimp_server, merge_fields()).await;
    mount_lookup(&app.mailchimp_server, 231, 1).await;
    Mock::given(path(format!("/lists/{LIST_ID}/members")))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({"title": "Invalid Resource"})))
        .expect(1)
        .mount(&app.mailchimp_server)
        .await;

    let resp = app.post_subscribe("EMAIL=ann%40example.com").await;
    assert_is_redirect_to(&resp, "/subscribe");

    let html = app.get_subscribe_html().await;
    assert!(html.contains("Could not subscribe you: Invalid Resource"));
}

#[tokio::test]
async fn unexpected_lookup_code_is_not_a_subscription() {
    let app = spawn_app().await;
    mount_merge_fields(&app.mailchimp_server, merge_fields()).await;
    mount_lookup(&app.mailchimp_server, 214, 1).await;
    mount_subscribe(&app.mailchimp_server, 0).await;

    let resp = app.post_subscribe("EMAIL=ann%40example.com").await;
    assert_is_redirect_to(&resp, "/subscribe");

    let html = app.get_subscribe_html().await;
    assert!(html.contains("Could not subscribe you: lookup"));
}
