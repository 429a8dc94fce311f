use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    extract::Query,
    http::{HeaderMap, StatusCode},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use url::Url;

use rooster_api::config::ZermeloConfig;
use rooster_api::error::ErrorCode;
use rooster_api::services::ZermeloClient;

type Seen = Arc<Mutex<Option<(HashMap<String, String>, Option<String>)>>>;

async fn spawn(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn client(portal: &str, timeout_secs: u64) -> ZermeloClient {
    let config = ZermeloConfig {
        portal_url: Url::parse(portal).unwrap(),
        api_token: "upstream-token".to_string(),
        timeout_secs,
    };
    ZermeloClient::from_config(&config, true).unwrap()
}

fn recording_router(path: &str, seen: Seen, reply: Value) -> Router {
    Router::new().route(
        path,
        get(
            move |Query(query): Query<HashMap<String, String>>, headers: HeaderMap| {
                let seen = seen.clone();
                let reply = reply.clone();
                async move {
                    let auth = headers
                        .get("authorization")
                        .and_then(|v| v.to_str().ok())
                        .map(str::to_string);
                    *seen.lock().unwrap() = Some((query, auth));
                    Json(reply)
                }
            },
        ),
    )
}

#[tokio::test]
async fn sends_bearer_token_and_query() {
    let seen: Seen = Arc::default();
    let reply = json!({"response": {"status": 200, "message": "", "details": "", "data": []}});
    let base = spawn(recording_router("/api/v3/appointments", seen.clone(), reply)).await;

    let result = client(&base, 5)
        .get_schedule_appointments("1234", 100, 200, None, Some("id,start"))
        .await
        .unwrap();
    assert_eq!(result.status, 200);

    let (query, auth) = seen.lock().unwrap().clone().unwrap();
    assert_eq!(auth.as_deref(), Some("Bearer upstream-token"));
    assert_eq!(query["user"], "1234");
    assert_eq!(query["start"], "100");
    assert_eq!(query["end"], "200");
    assert_eq!(query["valid"], "true");
    assert_eq!(query["cancelled"], "false");
    assert_eq!(query["fields"], "id,start");
    assert_eq!(
        query["type"],
        "lesson,exam,oralExam,activity,talk,mixed,meeting,interlude"
    );
}

#[tokio::test]
async fn portal_path_prefix_is_kept() {
    let seen: Seen = Arc::default();
    let reply = json!({"response": {"status": 200, "data": [
        {"id": 3, "school": 1, "year": 2025, "projectName": "p", "schoolName": "s"}
    ]}});
    let base = spawn(recording_router(
        "/zermelo/api/v3/schoolsinschoolyears/3",
        seen.clone(),
        reply,
    ))
    .await;

    let result = client(&format!("{}/zermelo", base), 5)
        .get_school_in_school_year(3, 2025)
        .await
        .unwrap();
    assert_eq!(result.data.len(), 1);

    let (query, _) = seen.lock().unwrap().clone().unwrap();
    assert_eq!(query["schoolYear"], "2025");
}

#[tokio::test]
async fn error_status_is_passed_through() {
    let router = Router::new().route(
        "/api/v3/contracts",
        get(|| async {
            (
                StatusCode::UNAUTHORIZED,
                Json(json!({"response": {"status": 401, "message": "Unauthorized", "details": "token revoked"}})),
            )
        }),
    );
    let base = spawn(router).await;

    let reply = client(&base, 5)
        .get_teacher_details("GIJS", 11, None)
        .await
        .unwrap();
    assert_eq!(reply.status, 401);
    assert_eq!(reply.message, "Unauthorized");
    assert_eq!(reply.details, "token revoked");
}

#[tokio::test]
async fn slow_upstream_times_out() {
    let router = Router::new().route(
        "/api/v3/appointments",
        get(|| async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            "late"
        }),
    );
    let base = spawn(router).await;

    let err = client(&base, 1)
        .get_schedule_appointments("1234", 0, 1, None, None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::UpstreamTimeout);
    assert_eq!(err.status(), StatusCode::GATEWAY_TIMEOUT);
}

#[tokio::test]
async fn refused_connection_is_unreachable() {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let err = client(&format!("http://{}", addr), 5)
        .get_schools_in_school_year(2025)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::UpstreamUnreachable);
    assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    // Debug mode exposes the transport message.
    assert!(!err.details().is_empty());
}

#[tokio::test]
async fn html_on_success_is_malformed() {
    let router = Router::new().route(
        "/api/v3/studentsindepartments",
        get(|| async { "<html>maintenance</html>" }),
    );
    let base = spawn(router).await;

    let err = client(&base, 5)
        .get_student_details("545959", 11, None)
        .await
        .unwrap_err();
    assert_eq!(err.code(), ErrorCode::UpstreamMalformedResponse);
}
