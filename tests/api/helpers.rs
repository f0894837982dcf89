use mailchimp_subscribe::configuration::get_configuration;
use mailchimp_subscribe::startup::Application;
use mailchimp_subscribe::telemetry::get_subscriber;
use mailchimp_subscribe::telemetry::init_subscriber;
use once_cell::sync::Lazy;
use secrecy::Secret;
use serde_json::json;
use serde_json::Value;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::matchers::path_regex;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;

pub const LIST_ID: &str = "list123";

/// Init the subscriber once for the whole test binary. Logs are discarded
/// unless `TEST_LOG` is set:
///
/// ```sh
///      TEST_LOG=true cargo test [test_name] | bunyan
/// ```
static TRACING: Lazy<()> = Lazy::new(|| {
    // `stdout` and `sink` are different types, hence two arms
    match std::env::var("TEST_LOG") {
        Ok(_) => {
            let subscriber = get_subscriber("test", "debug", std::io::stdout);
            init_subscriber(subscriber).unwrap();
        }
        Err(_) => {
            let subscriber = get_subscriber("test", "debug", std::io::sink);
            init_subscriber(subscriber).unwrap();
        }
    };
});

pub struct TestApp {
    pub addr: String,
    /// Stands in for the Mailchimp api
    pub mailchimp_server: MockServer,
    /// Does not follow redirects, and keeps the flash message cookie
    pub api_client: reqwest::Client,
}

impl TestApp {
    pub async fn get_subscribe(
        &self,
        query: &str,
    ) -> reqwest::Response {
        self.api_client
            .get(format!("{}/subscribe{query}", self.addr))
            .send()
            .await
            .expect("execute request")
    }

    pub async fn get_subscribe_html(&self) -> String {
        self.get_subscribe("").await.text().await.unwrap()
    }

    pub async fn post_subscribe(
        &self,
        body: &str,
    ) -> reqwest::Response {
        self.api_client
            .post(format!("{}/subscribe", self.addr))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body.to_string())
            .send()
            .await
            .expect("execute request")
    }

    pub async fn post_properties(
        &self,
        endpoint: &str,
        body: &str,
    ) -> reqwest::Response {
        self.api_client
            .post(format!("{}/properties/{endpoint}", self.addr))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body.to_string())
            .send()
            .await
            .expect("execute request")
    }

    /// `POST /properties`, the widget properties editor
    pub async fn post_properties_form(
        &self,
        body: &str,
    ) -> reqwest::Response {
        self.api_client
            .post(format!("{}/properties", self.addr))
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(body.to_string())
            .send()
            .await
            .expect("execute request")
    }

    pub async fn get_preview_html(&self) -> String {
        self.api_client
            .get(format!("{}/properties/preview", self.addr))
            .send()
            .await
            .expect("execute request")
            .text()
            .await
            .unwrap()
    }

    /// Requests Mailchimp received for `POST /lists/{id}/members`, as json
    pub async fn subscribe_requests(&self) -> Vec<Value> {
        self.mailchimp_server
            .received_requests()
            .await
            .unwrap_or_default()
            .into_iter()
            .filter(|r| r.method == wiremock::http::Method::POST)
            .map(|r| serde_json::from_slice(&r.body).unwrap())
            .collect()
    }
}

/// `EMAIL` plus a visible `FNAME` and a hidden `LNAME`
pub fn merge_fields() -> Value {
    json!({
        "merge_fields": [
            {"tag": "EMAIL", "name": "Email Address", "type": "email", "required": true, "public": true},
            {"tag": "FNAME", "name": "First Name", "type": "text", "required": false, "public": true},
            {"tag": "LNAME", "name": "Last Name", "type": "text", "required": false, "public": false},
        ]
    })
}

pub async fn mount_merge_fields(
    server: &MockServer,
    body: Value,
) {
    Mock::given(path(format!("/lists/{LIST_ID}/merge-fields")))
        .and(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .named("merge fields")
        .mount(server)
        .await;
}

/// Member lookup answers with `code`, expecting `expected_lookups` calls
pub async fn mount_lookup(
    server: &MockServer,
    code: u16,
    expected_lookups: u64,
) {
    Mock::given(path_regex(format!("^/lists/{LIST_ID}/members/.+$")))
        .and(method("GET"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({"code": code, "error": "lookup"})))
        .named("member lookup")
        .expect(expected_lookups)
        .mount(server)
        .await;
}

pub async fn mount_subscribe(
    server: &MockServer,
    expected_writes: u64,
) {
    Mock::given(path(format!("/lists/{LIST_ID}/members")))
        .and(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"id": "abc"})))
        .named("subscribe")
        .expect(expected_writes)
        .mount(server)
        .await;
}

pub fn assert_is_redirect_to(
    resp: &reqwest::Response,
    location: &str,
) {
    assert_eq!(resp.status().as_u16(), 303);
    assert_eq!(resp.headers().get("Location").unwrap(), location);
}

/// App with an api key and list id configured, talking to a mock Mailchimp
pub async fn spawn_app() -> TestApp { spawn_app_with(|_| {}).await }

/// Like `spawn_app`, with a chance to tweak the config first
pub async fn spawn_app_with(tweak: impl FnOnce(&mut mailchimp_subscribe::configuration::Settings)) -> TestApp {
    Lazy::force(&TRACING);

    let mailchimp_server = MockServer::start().await;

    let cfg = {
        let mut cfg = get_configuration().unwrap();
        // random port, picked by the OS
        cfg.application.port = 0;
        cfg.mailchimp.base_url = mailchimp_server.uri();
        cfg.mailchimp.api_key = Secret::new("0123456789abcdef-us1".to_string());
        cfg.mailchimp.timeout_milliseconds = 500;
        cfg.widget.list_id = LIST_ID.to_string();
        tweak(&mut cfg);
        cfg
    };

    let app = Application::build(cfg).await.unwrap();
    let addr = format!("http://localhost:{}", app.get_port());
    tokio::spawn(app.run_until_stopped());

    let api_client = reqwest::Client::builder()
        .redirect(reqwest::redirect::Policy::none())
        .cookie_store(true)
        .build()
        .unwrap();

    TestApp {
        addr,
        mailchimp_server,
        api_client,
    }
}
