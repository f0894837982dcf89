use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::Mock;
use wiremock::ResponseTemplate;

use crate::helpers::assert_is_redirect_to;
use crate::helpers::merge_fields;
use crate::helpers::mount_merge_fields;
use crate::helpers::spawn_app;
use crate::helpers::spawn_app_with;
use crate::helpers::LIST_ID;

#[tokio::test]
async fn visibility_changes_show_up_in_the_form() {
    let app = spawn_app().await;
    mount_merge_fields(&app.mailchimp_server, merge_fields()).await;

    let resp = app
        .post_properties("fields", "FNAME=0&LNAME=on&EMAIL=0")
        .await;
    assert_is_redirect_to(&resp, "/subscribe");

    let html = app.get_subscribe_html().await;
    assert!(html.contains("Field visibility saved."));
    assert!(html.contains(r#"name="LNAME""#));
    assert!(!html.contains(r#"name="FNAME""#));
    // EMAIL can't be hidden
    assert!(html.contains(r#"name="EMAIL""#));
}

#[tokio::test]
async fn refresh_refetches_the_schema() {
    let app = spawn_app().await;
    Mock::given(path(format!("/lists/{LIST_ID}/merge-fields")))
        .and(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(merge_fields()))
        // first render, then the refresh
        .expect(2)
        .mount(&app.mailchimp_server)
        .await;

    app.get_subscribe_html().await;
    let resp = app.post_properties("refresh", "").await;
    assert_is_redirect_to(&resp, "/subscribe");
    // served from the refreshed cache
    app.get_subscribe_html().await;
}

#[tokio::test]
async fn refresh_reports_unavailable_mailchimp() {
    let app = spawn_app().await;
    Mock::given(path(format!("/lists/{LIST_ID}/merge-fields")))
        .respond_with(ResponseTemplate::new(503))
        .mount(&app.mailchimp_server)
        .await;

    let resp = app.post_properties("refresh", "").await;

    assert_eq!(resp.status().as_u16(), 503);
}

#[tokio::test]
async fn properties_need_credentials() {
    let app = spawn_app_with(|cfg| cfg.widget.list_id = "".to_string()).await;

    let resp = app.post_properties("fields", "FNAME=on").await;

    assert_eq!(resp.status().as_u16(), 409);
}

#[tokio::test]
async fn saved_properties_replace_the_configured_ones() {
    let app = spawn_app().await;

    let body = serde_urlencoded::to_string([
        ("title", "Weekly digest"),
        ("apikey", "fedcba9876543210-us2"),
        ("listid", "list456"),
        ("finishNode", ""),
        ("errorNode", ""),
    ])
    .unwrap();
    let resp = app.post_properties_form(&body).await;
    assert_is_redirect_to(&resp, "/subscribe");

    let html = app.get_preview_html().await;
    assert!(html.contains("Weekly digest"));
    assert!(html.contains("****-us2"));
    assert!(html.contains("list456"));
    assert!(!html.contains(LIST_ID));
}

#[tokio::test]
async fn api_key_and_list_id_are_required() {
    let app = spawn_app().await;

    for (body, msg) in [
        ("title=Weekly", "both missing"),
        ("apikey=fedcba9876543210-us2&listid=", "blank list id"),
        ("apikey=&listid=list456", "blank api key"),
    ] {
        let resp = app.post_properties_form(body).await;
        assert_eq!(resp.status().as_u16(), 400, "{msg}");
    }

    // the configured properties are untouched
    let html = app.get_preview_html().await;
    assert!(html.contains("Newsletter"));
    assert!(html.contains(LIST_ID));
}

#[tokio::test]
async fn preview_masks_the_api_key() {
    let app = spawn_app().await;

    let html = app.get_preview_html().await;

    assert!(html.contains("****-us1"));
    assert!(!html.contains("0123456789abcdef"));
    assert!(html.contains(LIST_ID));
}
