//! End-to-end behaviour of the HTTP API over in-memory adapters.
//!
//! Requests run through the production route table, authentication guards,
//! and trace middleware; only the stores are replaced.

// Shared harness exposes fields other suites use.
#[allow(dead_code)]
mod support;

use actix_web::cookie::Cookie;
use actix_web::body::MessageBody;
use actix_web::dev::{Service, ServiceResponse};
use actix_web::http::StatusCode;
use actix_http::Request;
use actix_web::{Error, test};
use rstest::rstest;
use serde_json::{Value, json};

use support::{ADMIN_PASSWORD, ADMIN_USERNAME, Harness, TEMPORARY_PASSWORD};
use whenworks::domain::{EmailKind, TRACE_ID_HEADER};
use whenworks::test_support::JobStatus;

async fn body_json<B: MessageBody>(res: ServiceResponse<B>) -> Value {
    let bytes = test::read_body(res).await;
    if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).expect("json body")
    }
}

async fn login<S, B>(
    app: &S,
    username: &str,
    password: &str,
) -> (StatusCode, Option<Cookie<'static>>, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/v1/auth/login")
        .set_json(json!({"username": username, "password": password}))
        .to_request();
    let res = test::call_service(app, req).await;
    let status = res.status();
    let cookie = res
        .response()
        .cookies()
        .find(|c| c.name() == "accessToken")
        .map(|c| c.into_owned());
    (status, cookie, body_json(res).await)
}

async fn admin_cookie<S, B>(app: &S) -> Cookie<'static>
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let (status, cookie, _) = login(app, ADMIN_USERNAME, ADMIN_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
    cookie.expect("session cookie")
}

async fn create_user<S, B>(app: &S, cookie: &Cookie<'static>, body: Value) -> (StatusCode, Value)
where
    S: Service<Request, Response = ServiceResponse<B>, Error = Error>,
    B: MessageBody,
{
    let req = test::TestRequest::post()
        .uri("/v1/users")
        .cookie(cookie.clone())
        .set_json(body)
        .to_request();
    let res = test::call_service(app, req).await;
    (res.status(), body_json(res).await)
}

#[actix_web::test]
async fn login_reports_the_stored_admin_flag() {
    let harness = Harness::bootstrapped().await;
    let app = test::init_service(harness.app()).await;

    let (status, cookie, body) = login(&app, ADMIN_USERNAME, ADMIN_PASSWORD).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["user"]["is_admin"], true);
    assert!(!cookie.expect("cookie").value().is_empty());
}

#[actix_web::test]
async fn wrong_password_and_unknown_user_are_indistinguishable() {
    let harness = Harness::bootstrapped().await;
    let app = test::init_service(harness.app()).await;

    let (wrong_status, _, wrong) = login(&app, ADMIN_USERNAME, "not-the-password").await;
    let (unknown_status, _, unknown) = login(&app, "nobody", "not-the-password").await;

    assert_eq!(wrong_status, StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_status, wrong_status);
    assert_eq!(wrong["code"], "INVALID_CREDENTIALS");
    assert_eq!(wrong["code"], unknown["code"]);
    assert_eq!(wrong["message"], unknown["message"]);
}

#[actix_web::test]
async fn the_session_cookie_identifies_the_caller() {
    let harness = Harness::bootstrapped().await;
    let app = test::init_service(harness.app()).await;
    let cookie = admin_cookie(&app).await;

    let req = test::TestRequest::get()
        .uri("/v1/me")
        .cookie(cookie)
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    assert_eq!(body["user"]["username"], ADMIN_USERNAME);
}

#[actix_web::test]
async fn creating_a_user_queues_exactly_one_welcome_email() {
    let harness = Harness::bootstrapped().await;
    let app = test::init_service(harness.app()).await;
    let cookie = admin_cookie(&app).await;

    let (status, body) = create_user(
        &app,
        &cookie,
        json!({"username": "a", "email": "a@x.com", "name": "A"}),
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    let user = &body["user"];
    assert!(uuid::Uuid::parse_str(user["id"].as_str().expect("id")).is_ok());
    assert_eq!(user["is_admin"], false);
    assert!(user.get("password").is_none());
    assert!(user.get("password_hash").is_none());

    let jobs = harness.queue.jobs();
    assert_eq!(jobs.len(), 1);
    assert_eq!(jobs[0].job.kind, EmailKind::NewUser);
    assert_eq!(jobs[0].job.recipient.as_str(), "a@x.com");
    assert_eq!(jobs[0].status, JobStatus::Pending);

    let (status, _, _) = login(&app, "a", TEMPORARY_PASSWORD).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn duplicate_usernames_conflict_without_a_second_row() {
    let harness = Harness::bootstrapped().await;
    let app = test::init_service(harness.app()).await;
    let cookie = admin_cookie(&app).await;
    let (first, _) = create_user(
        &app,
        &cookie,
        json!({"username": "bob", "email": "bob@example.com", "name": "Bob"}),
    )
    .await;
    assert_eq!(first, StatusCode::CREATED);
    let before = harness.users.len();

    let (status, body) = create_user(
        &app,
        &cookie,
        json!({"username": "bob", "email": "other@example.com", "name": "Bob"}),
    )
    .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "USER_USERNAME_CONFLICT");
    assert_eq!(body["message"], "username already exists");
    assert_eq!(harness.users.len(), before);
    assert_eq!(harness.queue.jobs().len(), 1);
}

#[actix_web::test]
async fn empty_profile_patch_is_rejected_and_changes_nothing() {
    let harness = Harness::bootstrapped().await;
    let app = test::init_service(harness.app()).await;
    let cookie = admin_cookie(&app).await;

    let req = test::TestRequest::patch()
        .uri("/v1/me")
        .cookie(cookie.clone())
        .set_json(json!({}))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(res).await["code"], "BAD_REQUEST");

    let req = test::TestRequest::get().uri("/v1/me").cookie(cookie).to_request();
    let body = body_json(test::call_service(&app, req).await).await;
    assert_eq!(body["user"]["email"], "admin@example.com");
    assert_eq!(body["user"]["name"], "Admin");
}

#[actix_web::test]
async fn password_changes_require_the_current_password() {
    let harness = Harness::bootstrapped().await;
    let app = test::init_service(harness.app()).await;
    let cookie = admin_cookie(&app).await;

    let change = |old: &str| {
        test::TestRequest::post()
            .uri("/v1/me/update-password")
            .cookie(cookie.clone())
            .set_json(json!({"old_password": old, "new_password": "brand-new-secret"}))
            .to_request()
    };

    let res = test::call_service(&app, change("wrong-password")).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(res).await["code"], "INVALID_PASSWORD");

    let res = test::call_service(&app, change(ADMIN_PASSWORD)).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let (status, _, _) = login(&app, ADMIN_USERNAME, "brand-new-secret").await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn admin_routes_reject_members_and_anonymous_callers() {
    let harness = Harness::bootstrapped().await;
    let app = test::init_service(harness.app()).await;
    let admin = admin_cookie(&app).await;
    create_user(
        &app,
        &admin,
        json!({"username": "member", "email": "member@example.com", "name": "Member"}),
    )
    .await;
    let (_, member, _) = login(&app, "member", TEMPORARY_PASSWORD).await;
    let member = member.expect("member cookie");

    let req = test::TestRequest::get()
        .uri("/v1/users")
        .cookie(member)
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let req = test::TestRequest::get().uri("/v1/users").to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let req = test::TestRequest::get()
        .uri("/v1/users")
        .cookie(Cookie::new("accessToken", "forged.token.value"))
        .to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(harness.queue.jobs().len(), 1);
}

#[actix_web::test]
async fn password_resets_queue_a_reset_email() {
    let harness = Harness::bootstrapped().await;
    let app = test::init_service(harness.app()).await;
    let cookie = admin_cookie(&app).await;
    let (_, body) = create_user(
        &app,
        &cookie,
        json!({"username": "carol", "email": "carol@example.com", "name": "Carol"}),
    )
    .await;
    let id = body["user"]["id"].as_str().expect("id").to_owned();

    let req = test::TestRequest::post()
        .uri(&format!("/v1/users/{id}/reset-password"))
        .cookie(cookie)
        .to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::NO_CONTENT);
    let kinds: Vec<EmailKind> = harness.queue.jobs().iter().map(|j| j.job.kind).collect();
    assert_eq!(kinds, [EmailKind::NewUser, EmailKind::PasswordReset]);
    assert_eq!(harness.passwords.issued(), 2);
}

#[actix_web::test]
async fn deleted_users_are_gone() {
    let harness = Harness::bootstrapped().await;
    let app = test::init_service(harness.app()).await;
    let cookie = admin_cookie(&app).await;
    let (_, body) = create_user(
        &app,
        &cookie,
        json!({"username": "dave", "email": "dave@example.com", "name": "Dave"}),
    )
    .await;
    let uri = format!("/v1/users/{}", body["user"]["id"].as_str().expect("id"));

    let req = test::TestRequest::delete().uri(&uri).cookie(cookie.clone()).to_request();
    assert_eq!(test::call_service(&app, req).await.status(), StatusCode::NO_CONTENT);

    let req = test::TestRequest::get().uri(&uri).cookie(cookie).to_request();
    let res = test::call_service(&app, req).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(res).await["code"], "USER_NOT_FOUND");
}

#[rstest]
#[case("/v1/nowhere", StatusCode::NOT_FOUND, "ROUTE_NOT_FOUND")]
#[case("/v1/auth/login", StatusCode::METHOD_NOT_ALLOWED, "METHOD_NOT_ALLOWED")]
#[actix_web::test]
async fn fallbacks_use_the_error_envelope(
    #[case] uri: &str,
    #[case] status: StatusCode,
    #[case] code: &str,
) {
    let harness = Harness::bootstrapped().await;
    let app = test::init_service(harness.app()).await;

    let res = test::call_service(&app, test::TestRequest::get().uri(uri).to_request()).await;

    assert_eq!(res.status(), status);
    assert!(res.headers().contains_key(TRACE_ID_HEADER));
    let body = body_json(res).await;
    assert_eq!(body["code"], code);
    assert!(body["message"].is_string());
}

#[actix_web::test]
async fn healthcheck_reports_the_environment() {
    let harness = Harness::bootstrapped().await;
    let app = test::init_service(harness.app()).await;

    let req = test::TestRequest::get().uri("/v1/healthcheck").to_request();
    let res = test::call_service(&app, req).await;

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        body_json(res).await,
        json!({"status": "available", "environment": "test"})
    );
}
