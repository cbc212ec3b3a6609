use anyhow::Result;
use reqwest::{Method, StatusCode};
use serde_json::{json, Value};
use wiremock::{
    matchers::{any, body_partial_json, header, method, path},
    Mock, ResponseTemplate,
};

use crate::helpers::{unreachable_url, TestApp, TEST_API_KEY, TEST_TAG_ID};

async fn mount_contacts_response(app: &TestApp, response: ResponseTemplate) {
    Mock::given(path("/api/contacts"))
        .and(method("POST"))
        .respond_with(response)
        .expect(1)
        .mount(&app.contacts_server)
        .await;
}

async fn expect_no_upstream_call(app: &TestApp) {
    Mock::given(any())
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&app.contacts_server)
        .await;
}

#[tokio::test]
async fn subscribe_creates_a_tagged_contact() -> Result<()> {
    let app = TestApp::spawn().await?;

    Mock::given(path("/api/contacts"))
        .and(method("POST"))
        .and(header("X-API-Key", TEST_API_KEY))
        .and(body_partial_json(json!({
            "email": "le_guin@example.com",
            "language": "en",
            "tagIds": [TEST_TAG_ID],
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "id": 8765,
            "email": "le_guin@example.com",
            "language": "en",
            "tagIds": [TEST_TAG_ID],
        })))
        .expect(1)
        .mount(&app.contacts_server)
        .await;

    let res = app
        .post_subscriptions(&json!({ "email": "le_guin@example.com" }))
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.json::<Value>().await?,
        json!({ "success": true, "message": "Successfully subscribed!" })
    );

    Ok(())
}

#[tokio::test]
async fn subscribe_rejects_methods_other_than_post() -> Result<()> {
    let app = TestApp::spawn().await?;
    expect_no_upstream_call(&app).await;

    for http_method in [Method::GET, Method::PUT, Method::PATCH, Method::DELETE] {
        let res = app
            .http_client
            .request(http_method.clone(), app.subscribe_url())
            .json(&json!({ "email": "le_guin@example.com" }))
            .send()
            .await?;

        assert_eq!(
            res.status(),
            StatusCode::METHOD_NOT_ALLOWED,
            "Wrong response for method: {http_method}"
        );
        assert_eq!(
            res.json::<Value>().await?,
            json!({ "error": "Method not allowed" })
        );
    }

    Ok(())
}

#[tokio::test]
async fn subscribe_returns_a_400_for_missing_or_invalid_email() -> Result<()> {
    let app = TestApp::spawn().await?;
    expect_no_upstream_call(&app).await;

    let cases = [
        (json!({}), "Empty json"),
        (json!({ "email": null }), "Null email"),
        (json!({ "email": "" }), "Empty email"),
        (json!({ "email": "ursuladomain.com" }), "Missing @"),
        (json!({ "email": 42 }), "Email is not a string"),
        (json!("le_guin@example.com"), "Not an object"),
    ];

    for (body, description) in cases {
        let res = app.post_subscriptions(&body).await?;
        assert_eq!(
            res.status(),
            StatusCode::BAD_REQUEST,
            "The API did not return a 400 BAD REQUEST when the payload was: {description}"
        );
        assert_eq!(
            res.json::<Value>().await?,
            json!({ "error": "Valid email is required" })
        );
    }

    Ok(())
}

#[tokio::test]
async fn subscribe_returns_a_400_for_a_body_that_is_not_json() -> Result<()> {
    let app = TestApp::spawn().await?;
    expect_no_upstream_call(&app).await;

    let res = app
        .http_client
        .post(app.subscribe_url())
        .header("Content-Type", "application/x-www-form-urlencoded")
        .body("email=le_guin%40example.com")
        .send()
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn subscribe_without_api_key_fails_before_calling_upstream() -> Result<()> {
    let app = TestApp::spawn_without_api_key().await?;
    expect_no_upstream_call(&app).await;

    let res = app
        .post_subscriptions(&json!({ "email": "le_guin@example.com" }))
        .await?;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        res.json::<Value>().await?,
        json!({ "error": "Server configuration error" })
    );

    Ok(())
}

#[tokio::test]
async fn subscribe_with_blank_api_key_fails_before_calling_upstream() -> Result<()> {
    for blank in ["", "  "] {
        let app = TestApp::spawn_with_api_key(blank).await?;
        expect_no_upstream_call(&app).await;

        let res = app
            .post_subscriptions(&json!({ "email": "le_guin@example.com" }))
            .await?;

        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(
            res.json::<Value>().await?,
            json!({ "error": "Server configuration error" })
        );
    }

    Ok(())
}

#[tokio::test]
async fn subscribe_still_validates_email_when_api_key_is_missing() -> Result<()> {
    let app = TestApp::spawn_without_api_key().await?;
    expect_no_upstream_call(&app).await;

    let res = app
        .post_subscriptions(&json!({ "email": "ursuladomain.com" }))
        .await?;

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    Ok(())
}

#[tokio::test]
async fn subscribe_treats_a_conflict_as_already_subscribed() -> Result<()> {
    let bodies = [
        ResponseTemplate::new(409),
        ResponseTemplate::new(409).set_body_string("Conflict"),
        ResponseTemplate::new(409).set_body_json(json!({ "message": "Contact already exists" })),
    ];

    for response in bodies {
        let app = TestApp::spawn().await?;
        mount_contacts_response(&app, response).await;

        let res = app
            .post_subscriptions(&json!({ "email": "le_guin@example.com" }))
            .await?;

        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(
            res.json::<Value>().await?,
            json!({ "success": true, "message": "You are already subscribed!" })
        );
    }

    Ok(())
}

#[tokio::test]
async fn subscribe_treats_an_already_used_email_as_already_subscribed() -> Result<()> {
    let app = TestApp::spawn().await?;
    mount_contacts_response(
        &app,
        ResponseTemplate::new(422)
            .set_body_json(json!({ "message": "email: This value is already used." })),
    )
    .await;

    let res = app
        .post_subscriptions(&json!({ "email": "le_guin@example.com" }))
        .await?;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.json::<Value>().await?,
        json!({ "success": true, "message": "You are already subscribed!" })
    );

    Ok(())
}

#[tokio::test]
async fn subscribe_returns_a_500_when_created_contact_has_no_id() -> Result<()> {
    let app = TestApp::spawn().await?;
    mount_contacts_response(
        &app,
        ResponseTemplate::new(201).set_body_json(json!({ "email": "le_guin@example.com" })),
    )
    .await;

    let res = app
        .post_subscriptions(&json!({ "email": "le_guin@example.com" }))
        .await?;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        res.json::<Value>().await?,
        json!({ "error": "Contact created but ID missing" })
    );

    Ok(())
}

#[tokio::test]
async fn subscribe_forwards_other_upstream_failures() -> Result<()> {
    let cases = [
        (
            ResponseTemplate::new(400).set_body_json(json!({ "message": "Invalid tag" })),
            StatusCode::BAD_REQUEST,
            "Invalid tag",
        ),
        (
            ResponseTemplate::new(403).set_body_json(json!({ "detail": "Access denied" })),
            StatusCode::FORBIDDEN,
            "Access denied",
        ),
        (
            ResponseTemplate::new(503),
            StatusCode::SERVICE_UNAVAILABLE,
            "Failed to subscribe. Please try again.",
        ),
    ];

    for (response, expected_status, expected_error) in cases {
        let app = TestApp::spawn().await?;
        mount_contacts_response(&app, response).await;

        let res = app
            .post_subscriptions(&json!({ "email": "le_guin@example.com" }))
            .await?;

        assert_eq!(res.status(), expected_status);
        assert_eq!(res.json::<Value>().await?, json!({ "error": expected_error }));
    }

    Ok(())
}

#[tokio::test]
async fn subscribe_returns_a_500_on_network_error() -> Result<()> {
    let app = TestApp::spawn_with_contacts_url(unreachable_url().await?).await?;

    let res = app
        .post_subscriptions(&json!({ "email": "le_guin@example.com" }))
        .await?;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        res.json::<Value>().await?,
        json!({ "error": "An unexpected error occurred. Please try again." })
    );

    Ok(())
}

#[tokio::test]
async fn subscribe_returns_a_500_when_upstream_times_out() -> Result<()> {
    let app = TestApp::spawn().await?;
    mount_contacts_response(
        &app,
        ResponseTemplate::new(201).set_delay(std::time::Duration::from_secs(180)),
    )
    .await;

    let res = app
        .post_subscriptions(&json!({ "email": "le_guin@example.com" }))
        .await?;

    assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        res.json::<Value>().await?,
        json!({ "error": "An unexpected error occurred. Please try again." })
    );

    Ok(())
}
