use std::time::Duration;

use fake::faker::internet::en::SafeEmail;
use fake::Fake;
use newsletter_gateway::providers::ProviderKind;
use newsletter_gateway::routes::FAILURE_MESSAGE;
use newsletter_gateway::routes::SUCCESS_MESSAGE;
use serde_json::json;
use wiremock::matchers::any;
use wiremock::matchers::body_partial_json;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::Mock;
use wiremock::ResponseTemplate;

use crate::helpers::spawn_app;
use crate::helpers::TestApp;
use crate::helpers::CONVERT_KIT_FORM;
use crate::helpers::MAILCHIMP_LIST;

const ALL_PROVIDERS: [ProviderKind; 3] = [
    ProviderKind::Mailchimp,
    ProviderKind::HubSpot,
    ProviderKind::ConvertKit,
];

/// Path each provider is expected to hit when no list is given
fn default_path(provider: ProviderKind) -> String {
    match provider {
        ProviderKind::Mailchimp => format!("/lists/{MAILCHIMP_LIST}/members"),
        ProviderKind::HubSpot => "/crm/v3/objects/contacts".to_string(),
        ProviderKind::ConvertKit => format!("/forms/{CONVERT_KIT_FORM}/subscribe"),
    }
}

async fn assert_message(
    resp: reqwest::Response,
    status: u16,
    message: &str,
) {
    assert_eq!(resp.status().as_u16(), status);
    let body: serde_json::Value = resp.json().await.unwrap();
    assert_eq!(body, json!({ "message": message }));
}

/// Any call to the provider fails the test (checked when the mock server is
/// dropped)
async fn forbid_provider_calls(app: &TestApp) {
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200))
        .named("provider must not be called")
        .expect(0)
        .mount(&app.provider_server)
        .await;
}

#[tokio::test]
async fn subscribe_ok_with_default_list() {
    for provider in ALL_PROVIDERS {
        let app = spawn_app(provider).await;
        let email: String = SafeEmail().fake();

        Mock::given(path(default_path(provider)))
            .and(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&app.provider_server)
            .await;

        let resp = app.post_subscription_json(&json!({ "email": email })).await;
        assert_message(resp, 200, SUCCESS_MESSAGE).await;
    }
}

#[tokio::test]
async fn subscribe_ok_scenario() {
    let app = spawn_app(ProviderKind::Mailchimp).await;

    Mock::given(path(format!("/lists/{MAILCHIMP_LIST}/members")))
        .and(method("POST"))
        .and(body_partial_json(json!({
            "email_address": "a@example.com",
            "status": "subscribed",
        })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.provider_server)
        .await;

    let resp = app
        .post_subscription_json(&json!({ "email": "a@example.com" }))
        .await;
    assert_message(resp, 200, SUCCESS_MESSAGE).await;
}

#[tokio::test]
async fn subscribe_ok_with_explicit_list() {
    for (provider, expected_path) in [
        (ProviderKind::Mailchimp, "/lists/abc123/members"),
        (ProviderKind::ConvertKit, "/forms/abc123/subscribe"),
        // no lists on hubspot
        (ProviderKind::HubSpot, "/crm/v3/objects/contacts"),
    ] {
        let app = spawn_app(provider).await;

        Mock::given(path(expected_path))
            .and(method("POST"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&app.provider_server)
            .await;

        let resp = app
            .post_subscription_json(&json!({ "email": "a@example.com", "list": "abc123" }))
            .await;
        assert_message(resp, 200, SUCCESS_MESSAGE).await;
    }
}

#[tokio::test]
async fn subscribe_ok_with_form_body() {
    let app = spawn_app(ProviderKind::ConvertKit).await;

    Mock::given(path("/forms/777/subscribe"))
        .and(method("POST"))
        .and(body_partial_json(json!({ "email": "john@foo.com" })))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&app.provider_server)
        .await;

    let body = serde_urlencoded::to_string([("email", "john@foo.com"), ("list", "777")]).unwrap();
    let resp = app.post_subscription_form(body).await;
    assert_message(resp, 200, SUCCESS_MESSAGE).await;
}

#[tokio::test]
async fn subscribe_invalid_json() {
    let app = spawn_app(ProviderKind::Mailchimp).await;
    forbid_provider_calls(&app).await;

    for (body, field, msg) in [
        (json!({}), "email", "missing email"),
        (json!({ "list": "abc" }), "email", "list without email"),
        (json!({ "email": "" }), "email", "empty email"),
        (json!({ "email": "not-an-email" }), "email", "invalid email"),
        (json!({ "email": 42 }), "email", "email not a string"),
        (json!({ "email": "a@example.com", "list": 3 }), "list", "list not a string"),
    ] {
        let resp = app.post_subscription_json(&body).await;
        assert_eq!(resp.status().as_u16(), 422, "{msg}");

        let body: serde_json::Value = resp.json().await.unwrap();
        assert!(body["errors"][field].is_array(), "{msg}: {body}");
        assert!(body["message"].is_string(), "{msg}");
    }
}

#[tokio::test]
async fn list_cannot_change_provider_path() {
    for provider in [ProviderKind::Mailchimp, ProviderKind::ConvertKit] {
        let app = spawn_app(provider).await;
        forbid_provider_calls(&app).await;

        for list in ["..", ".", "%2e%2e", "..\\x", "a/b", "abc?x=1", "../../lists"] {
            let resp = app
                .post_subscription_json(&json!({ "email": "a@example.com", "list": list }))
                .await;
            assert_eq!(resp.status().as_u16(), 422, "{provider}: {list:?}");

            let body: serde_json::Value = resp.json().await.unwrap();
            assert!(body["errors"]["list"].is_array(), "{list:?}: {body}");
        }
    }
}

#[tokio::test]
async fn subscribe_invalid_form() {
    let app = spawn_app(ProviderKind::ConvertKit).await;
    forbid_provider_calls(&app).await;

    for (body, msg) in [
        ("", "empty body"),
        ("list=abc", "missing email"),
        ("email=", "empty email"),
        ("email=not-an-email", "invalid email"),
    ] {
        let resp = app.post_subscription_form(body.to_string()).await;
        assert_eq!(resp.status().as_u16(), 422, "{msg}");
    }
}

#[tokio::test]
async fn subscribe_undecodable_body() {
    let app = spawn_app(ProviderKind::HubSpot).await;
    forbid_provider_calls(&app).await;

    let resp = app
        .api_client
        .post(format!("{}/newsletter_subscription", app.addr))
        .header("Content-Type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(resp.status().as_u16(), 422);

    let body: serde_json::Value = resp.json().await.unwrap();
    assert!(body["errors"]["body"].is_array(), "{body}");
}

#[tokio::test]
async fn provider_error_is_not_leaked() {
    for provider in ALL_PROVIDERS {
        let app = spawn_app(provider).await;

        Mock::given(any())
            .respond_with(
                ResponseTemplate::new(401)
                    .set_body_string("secret provider detail: API key invalid"),
            )
            .expect(1)
            .mount(&app.provider_server)
            .await;

        let resp = app
            .post_subscription_json(&json!({ "email": "a@example.com" }))
            .await;
        assert_eq!(resp.status().as_u16(), 400, "{provider}");

        let text = resp.text().await.unwrap();
        assert!(!text.contains("secret provider detail"), "{provider}: {text}");
        let body: serde_json::Value = serde_json::from_str(&text).unwrap();
        assert_eq!(body, json!({ "message": FAILURE_MESSAGE }));
    }
}

#[tokio::test]
async fn provider_timeout_is_a_failure() {
    let app = spawn_app(ProviderKind::Mailchimp).await;

    // longer than the 500ms timeout in `test_configuration`
    Mock::given(any())
        .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
        .expect(1)
        .mount(&app.provider_server)
        .await;

    let resp = app
        .post_subscription_json(&json!({ "email": "a@example.com" }))
        .await;
    assert_message(resp, 400, FAILURE_MESSAGE).await;
}

#[tokio::test]
async fn failure_does_not_affect_next_request() {
    let app = spawn_app(ProviderKind::HubSpot).await;

    // mocks are matched in mount order; the first one is used up after one call
    Mock::given(any())
        .respond_with(ResponseTemplate::new(409))
        .up_to_n_times(1)
        .expect(1)
        .mount(&app.provider_server)
        .await;
    Mock::given(any())
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&app.provider_server)
        .await;

    let body = json!({ "email": "a@example.com" });
    assert_message(app.post_subscription_json(&body).await, 400, FAILURE_MESSAGE).await;
    assert_message(app.post_subscription_json(&body).await, 200, SUCCESS_MESSAGE).await;
}

#[tokio::test]
async fn only_post_is_routed() {
    let app = spawn_app(ProviderKind::Mailchimp).await;
    forbid_provider_calls(&app).await;

    let resp = app
        .request(reqwest::Method::GET, "/newsletter_subscription")
        .await;
    assert!(resp.status().is_client_error());
}
