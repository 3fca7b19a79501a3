use std::net::SocketAddr;

use axum::{routing::get, Router};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::state::AppState;
use crate::{attendance, dashboard, grades, identity, subjects};

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .nest(
            "/api/v1",
            Router::new()
                .merge(identity::router())
                .merge(attendance::router())
                .merge(subjects::router())
                .merge(grades::router())
                .merge(dashboard::router())
                .route("/health", get(|| async { "ok" })),
        )
        .with_state(state)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    tracing::info_span!(
                        "http_request",
                        %method,
                        uri = %uri,
                        status = tracing::field::Empty
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        let status = res.status();
                        span.record("status", tracing::field::display(status));
                        let latency_ms = latency.as_millis() as u64;
                        if status.is_server_error() {
                            tracing::error!(%status, latency_ms, "response");
                        } else {
                            tracing::info!(%status, latency_ms, "response");
                        }
                    },
                ),
        )
}

pub async fn serve(app: Router) -> anyhow::Result<()> {
    let addr: SocketAddr = format!(
        "{}:{}",
        std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
        std::env::var("APP_PORT").unwrap_or_else(|_| "8080".into())
    )
    .parse()?;

    tracing::info!("listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{header, Method, Request, StatusCode};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn call(app: &Router, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut req = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            req = req.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let req = match body {
            Some(v) => req
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(v.to_string())),
            None => req.body(Body::empty()),
        }
        .unwrap();

        let res = app.clone().oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
        let value = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));
        (status, value)
    }

    #[tokio::test]
    async fn health_is_ok() {
        let app = build_app(AppState::fake());
        let (status, body) = call(&app, Method::GET, "/api/v1/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!("ok"));
    }

    #[tokio::test]
    async fn unknown_tag_asks_for_registration() {
        let app = build_app(AppState::fake());
        let (status, body) = call(&app, Method::POST, "/api/v1/scan", None, Some(json!({"rfid": " NEW-1 "}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["outcome"], "register");
        assert_eq!(body["rfid"], "NEW-1");

        let (status, _) = call(&app, Method::POST, "/api/v1/scan", None, Some(json!({"rfid": "  "}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn me_requires_a_session() {
        let app = build_app(AppState::fake());
        let (status, _) = call(&app, Method::GET, "/api/v1/me", None, None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (status, _) = call(&app, Method::GET, "/api/v1/me", Some("garbage"), None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn professor_flow_over_http() {
        let app = build_app(AppState::fake());
        let (status, reg) = call(
            &app,
            Method::POST,
            "/api/v1/register/professor",
            None,
            Some(json!({
                "rfid": "PROF-1",
                "full_name": "Ada Reyes",
                "staff_id": "T-100",
                "academic_rank": "Instructor"
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(reg["role"], "professor");
        let token = reg["token"].as_str().unwrap().to_string();

        let (status, scan) = call(&app, Method::POST, "/api/v1/scan", None, Some(json!({"rfid": "PROF-1"}))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(scan["outcome"], "professor");

        let (status, me) = call(&app, Method::GET, "/api/v1/me", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(me["profile"]["full_name"], "Ada Reyes");

        let (status, subject) = call(
            &app,
            Method::POST,
            "/api/v1/subjects",
            Some(&token),
            Some(json!({
                "subject_name": "Data Structures",
                "subject_code": "CS201",
                "units": 3,
                "start_time": "08:00",
                "end_time": "09:30",
                "days": ["Monday", "Wednesday"]
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(subject["start_time"], "08:00");
        assert_eq!(subject["days"], json!(["Monday", "Wednesday"]));

        let (status, dash) = call(&app, Method::GET, "/api/v1/professor/dashboard", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(dash["subjects"][0]["subject_code"], "CS201");
        assert_eq!(dash["subjects"][0]["enrollment_count"], 0);
    }

    #[tokio::test]
    async fn students_cannot_reach_professor_routes() {
        let app = build_app(AppState::fake());
        let (_, reg) = call(
            &app,
            Method::POST,
            "/api/v1/register/student",
            None,
            Some(json!({
                "rfid": "STU-1",
                "full_name": "Ben Cruz",
                "student_number": "2024-001",
                "year_section": "3-A",
                "course": "BSCS"
            })),
        )
        .await;
        let token = reg["token"].as_str().unwrap().to_string();

        let (status, _) = call(&app, Method::GET, "/api/v1/professor/dashboard", Some(&token), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, dash) = call(&app, Method::GET, "/api/v1/student/dashboard", Some(&token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(dash["profile"]["student_number"], "2024-001");
    }
}
