//! Integration tests for bc-api endpoints
//!
//! The router runs against an in-memory SQLite store seeded from the sample
//! forms in data/forms (F12345, F54321, F67890).

use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use bc_api::{build_router, AppState};
use bc_common::db::init_memory_database;
use bc_common::seed::seed_store;
use bc_common::store::{DirectoryStore, SqliteStore};
use bc_common::TextMatcher;
use serde_json::{json, Value};
use std::path::PathBuf;
use std::sync::Arc;
use tower::util::ServiceExt; // for `oneshot` method

fn sample_forms() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../data/forms")
}

/// Test helper: app over a seeded in-memory store
async fn setup_app() -> Router {
    let store = SqliteStore::new(init_memory_database().await.unwrap());
    let report = seed_store(&store, &sample_forms()).await.unwrap();
    assert_eq!(report.saved, 3, "sample forms should all load: {:?}", report.errors);

    build_router(AppState::new(Arc::new(store), TextMatcher::default()))
}

fn test_request(method: &str, uri: &str) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap()
}

fn json_request(method: &str, uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

/// Test helper: send one request, return status and JSON body
async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Should read body");
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or_else(|_| {
            Value::String(String::from_utf8_lossy(&bytes).into_owned())
        })
    };
    (status, body)
}

// =============================================================================
// Health
// =============================================================================

#[tokio::test]
async fn test_health_endpoint() {
    let app = setup_app().await;
    let (status, body) = send(&app, test_request("GET", "/health")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["module"], "bc-api");
    assert_eq!(body["store"], "sqlite");
    assert!(body["version"].is_string());
}

// =============================================================================
// Form lookup and listing
// =============================================================================

#[tokio::test]
async fn test_list_forms_ordered() {
    let app = setup_app().await;
    let (status, body) = send(&app, test_request("GET", "/api/blind-check-form")).await;

    assert_eq!(status, StatusCode::OK);
    let ids: Vec<&str> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|f| f["contractNumber"].as_str().unwrap())
        .collect();
    assert_eq!(ids, vec!["F12345", "F54321", "F67890"]);
}

#[tokio::test]
async fn test_list_forms_search_by_decedent() {
    let app = setup_app().await;
    let (status, body) =
        send(&app, test_request("GET", "/api/blind-check-form?search=smith")).await;

    assert_eq!(status, StatusCode::OK);
    let forms = body.as_array().unwrap();
    assert_eq!(forms.len(), 1);
    assert_eq!(forms[0]["contractNumber"], "F67890");
}

#[tokio::test]
async fn test_summaries() {
    let app = setup_app().await;
    let (status, body) =
        send(&app, test_request("GET", "/api/blind-check-summaries?search=F123")).await;

    assert_eq!(status, StatusCode::OK);
    let summaries = body.as_array().unwrap();
    assert_eq!(summaries.len(), 1);
    assert_eq!(summaries[0]["contractNumber"], "F12345");
    assert_eq!(summaries[0]["decedentName"], "John Doe");
    assert_eq!(summaries[0]["isVerified"], true);
    assert_eq!(summaries[0]["totalMarkers"], 9);
    assert_eq!(summaries[0]["verifiedMarkers"], 0);
}

#[tokio::test]
async fn test_get_form() {
    let app = setup_app().await;
    let (status, body) = send(&app, test_request("GET", "/api/blind-check-form/F54321")).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["contractNumber"], "F54321");
    assert_eq!(body["locationDetails"]["section"], "F");
    assert_eq!(
        body["memorialBlindCheck"]["markerPlacements"]
            .as_array()
            .unwrap()
            .len(),
        5
    );
}

#[tokio::test]
async fn test_get_missing_form_is_not_found() {
    let app = setup_app().await;
    let (status, body) = send(&app, test_request("GET", "/api/blind-check-form/F00000")).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(
        body["message"],
        "Blind check form with case ID 'F00000' not found."
    );
}

#[tokio::test]
async fn test_get_invalid_contract_number_is_bad_request() {
    let app = setup_app().await;
    let (status, body) = send(&app, test_request("GET", "/api/blind-check-form/%20F1")).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn test_form_view_and_grid() {
    let app = setup_app().await;

    let (status, view) =
        send(&app, test_request("GET", "/api/blind-check-form/F12345/view")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(view["contractNumber"], "F12345");
    assert_eq!(view["diagram"].as_array().unwrap().len(), 9);

    let (status, grid) =
        send(&app, test_request("GET", "/api/blind-check-form/F54321/grid")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(grid["center"], json!({ "row": 1, "column": 1 }));

    let cells = grid["cells"].as_array().unwrap();
    assert_eq!(cells.len(), 9);
    assert_eq!(cells[0]["relation"], "Top Left");
    assert!(cells[0]["inscription"].is_null());
    assert_eq!(cells[4]["relation"], "Center");
    assert_eq!(cells[4]["label"], "(2, 2)");
    assert_eq!(cells[4]["inscription"], "Michael Brown - 1950-2024");
}

// =============================================================================
// Upsert
// =============================================================================

#[tokio::test]
async fn test_put_creates_then_replaces() {
    let app = setup_app().await;
    let form = json!({
        "contractNumber": "F77777",
        "memorialBlindCheck": {
            "markerPlacements": [ { "x": 1, "y": 1, "inscription": "Grace Hall - 1944-2024" } ]
        }
    });

    let (status, body) = send(&app, json_request("PUT", "/api/blind-check-form/F77777", form)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["contractNumber"], "F77777");

    let replacement = json!({
        "contractNumber": "F77777",
        "locationDetails": { "section": "K" }
    });
    let (status, _) =
        send(&app, json_request("PUT", "/api/blind-check-form/F77777", replacement)).await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = send(&app, test_request("GET", "/api/blind-check-form/F77777")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["locationDetails"]["section"], "K");
    assert!(body["memorialBlindCheck"]["markerPlacements"]
        .as_array()
        .unwrap()
        .is_empty());

    let (_, list) = send(&app, test_request("GET", "/api/blind-check-form")).await;
    assert_eq!(list.as_array().unwrap().len(), 4);
}

#[tokio::test]
async fn test_put_rejects_mismatched_contract_number() {
    let app = setup_app().await;
    let (status, body) = send(
        &app,
        json_request("PUT", "/api/blind-check-form/F1", json!({ "contractNumber": "F2" })),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("does not match"));
}

#[tokio::test]
async fn test_put_rejects_duplicate_markers() {
    let app = setup_app().await;
    let form = json!({
        "contractNumber": "F88888",
        "memorialBlindCheck": {
            "markerPlacements": [
                { "x": 0, "y": 0, "inscription": "A" },
                { "x": 0, "y": 0, "inscription": "B" }
            ]
        }
    });
    let (status, _) = send(&app, json_request("PUT", "/api/blind-check-form/F88888", form)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_put_rejects_out_of_range_coordinates() {
    let app = setup_app().await;
    let form = json!({
        "contractNumber": "F99999",
        "memorialBlindCheck": {
            "markerPlacements": [ { "x": 2147483647, "y": 2147483647, "inscription": "Edge" } ]
        }
    });

    let (status, body) =
        send(&app, json_request("PUT", "/api/blind-check-form/F99999", form)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].as_str().unwrap().contains("outside"));

    let (status, _) = send(&app, test_request("GET", "/api/blind-check-form/F99999/grid")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_grid_of_extreme_stored_form() {
    // Folder documents skip save-time validation
    let dir = tempfile::tempdir().unwrap();
    let form = json!({
        "contractNumber": "F1",
        "memorialBlindCheck": {
            "markerPlacements": [
                { "x": 2147483647, "y": 2147483647, "inscription": "Corner" },
                { "x": -2147483648, "y": -2147483648, "inscription": "Far" }
            ]
        }
    });
    std::fs::write(dir.path().join("F1.json"), form.to_string()).unwrap();
    let app = build_router(AppState::new(
        Arc::new(DirectoryStore::new(dir.path())),
        TextMatcher::default(),
    ));

    let (status, body) = send(&app, test_request("GET", "/api/blind-check-form/F1/grid")).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body.is_object());
}

#[tokio::test]
async fn test_malformed_json_body_is_json_error() {
    let app = setup_app().await;
    let request = Request::builder()
        .method("PUT")
        .uri("/api/blind-check-form/F12345")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{ not json"))
        .unwrap();

    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string(), "body was {:?}", body);
}

#[tokio::test]
async fn test_non_integer_coordinate_is_json_error() {
    let app = setup_app().await;
    let (status, body) = send(
        &app,
        json_request(
            "PUT",
            "/api/blind-check-form/F12345/markers/abc/1",
            json!({ "isVerified": true }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string(), "body was {:?}", body);
}

#[tokio::test]
async fn test_bad_report_format_is_json_error() {
    let app = setup_app().await;
    let (status, body) = send(
        &app,
        test_request("GET", "/api/blind-check-form/F12345/report?format=pdf"),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string(), "body was {:?}", body);
}

// =============================================================================
// Verification
// =============================================================================

#[tokio::test]
async fn test_update_form_verification() {
    let app = setup_app().await;
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/blind-check-form/F67890/verification",
            json!({ "isVerified": true, "verifiedBy": "m.hill" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["blindCheckVerification"]["isVerified"], true);
    assert_eq!(body["blindCheckVerification"]["verifiedBy"], "m.hill");
    assert!(body["blindCheckVerification"]["verifiedAt"].is_string());

    let (status, _) = send(
        &app,
        json_request(
            "POST",
            "/api/blind-check-form/F00000/verification",
            json!({ "isVerified": true }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_manual_marker_verification() {
    let app = setup_app().await;
    let (status, marker) = send(
        &app,
        json_request(
            "PUT",
            "/api/blind-check-form/F12345/markers/2/0",
            json!({ "isVerified": true, "notes": "Checked against pin 14" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(marker["inscription"], "Christopher Miller - 1925-1999");
    assert_eq!(marker["verification"]["isVerified"], true);
    assert_eq!(marker["verification"]["method"], "manual");
    assert_eq!(marker["verification"]["notes"], "Checked against pin 14");

    let (status, _) = send(
        &app,
        json_request(
            "PUT",
            "/api/blind-check-form/F54321/markers/0/0",
            json!({ "isVerified": true }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_scan_match_verifies_marker_and_is_recorded() {
    let app = setup_app().await;
    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/blind-check-form/F67890/markers/1/1/scan",
            json!({ "scannedText": "JANE SMITH 1951-2024" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"]["policy"], "strict");
    assert_eq!(body["outcome"]["matched"], true);
    assert_eq!(body["outcome"]["status"], "valid");
    assert_eq!(body["marker"]["verification"]["method"], "scan");
    assert_eq!(body["marker"]["verification"]["isVerified"], true);

    let (status, scans) =
        send(&app, test_request("GET", "/api/blind-check-form/F67890/scans")).await;
    assert_eq!(status, StatusCode::OK);
    let scans = scans.as_array().unwrap();
    assert_eq!(scans.len(), 1);
    assert_eq!(scans[0]["matched"], true);
    assert_eq!(scans[0]["expected"], "Jane Smith - 1951-2024");

    let (_, summaries) =
        send(&app, test_request("GET", "/api/blind-check-summaries?search=F67890")).await;
    assert_eq!(summaries[0]["verifiedMarkers"], 1);
}

#[tokio::test]
async fn test_scan_mismatch_keeps_previous_verification() {
    let app = setup_app().await;
    send(
        &app,
        json_request(
            "PUT",
            "/api/blind-check-form/F12345/markers/1/1",
            json!({ "isVerified": true }),
        ),
    )
    .await;

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/blind-check-form/F12345/markers/1/1/scan",
            json!({ "scannedText": "Completely unrelated words", "policy": "lenient" }),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["outcome"]["policy"], "lenient");
    assert_eq!(body["outcome"]["matched"], false);
    assert_eq!(body["marker"]["verification"]["isVerified"], true);
    assert_eq!(body["marker"]["verification"]["method"], "manual");

    let (_, scans) = send(&app, test_request("GET", "/api/blind-check-form/F12345/scans")).await;
    assert_eq!(scans.as_array().unwrap().len(), 1);
    assert_eq!(scans[0]["matched"], false);
}

#[tokio::test]
async fn test_scan_unknown_marker_or_form() {
    let app = setup_app().await;
    let body = json!({ "scannedText": "anything" });

    let (status, _) = send(
        &app,
        json_request("POST", "/api/blind-check-form/F54321/markers/2/2/scan", body.clone()),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(
        &app,
        json_request("POST", "/api/blind-check-form/F00000/markers/1/1/scan", body),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = send(&app, test_request("GET", "/api/blind-check-form/F00000/scans")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

// =============================================================================
// Reports and stateless matching
// =============================================================================

#[tokio::test]
async fn test_text_report() {
    let app = setup_app().await;
    send(
        &app,
        json_request(
            "PUT",
            "/api/blind-check-form/F12345/markers/0/2",
            json!({ "isVerified": true }),
        ),
    )
    .await;

    let (status, body) =
        send(&app, test_request("GET", "/api/blind-check-form/F12345/report")).await;
    assert_eq!(status, StatusCode::OK);

    let text = body.as_str().unwrap();
    assert!(text.contains("Contract: F12345"));
    assert!(text.contains("Decedent: John Doe"));
    assert!(text.contains("Verified By: r.alvarez"));
    assert!(text.contains("Validated Markers: 1 / 9"));
    assert!(text.contains("Inscription: James Wilson - 1938-2009"));
}

#[tokio::test]
async fn test_json_report() {
    let app = setup_app().await;
    let (status, body) = send(
        &app,
        test_request("GET", "/api/blind-check-form/F54321/report?format=json"),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["contractNumber"], "F54321");
    assert_eq!(body["totalMarkers"], 5);
    assert_eq!(body["validatedMarkers"], 0);
    assert_eq!(body["markers"][0]["inscription"], "Alicia Gomez - 1958-2021");
}

#[tokio::test]
async fn test_match_endpoint_policies() {
    let app = setup_app().await;

    let (status, strict) = send(
        &app,
        json_request(
            "POST",
            "/api/match",
            json!({ "expected": "John Doe", "scanned": "J0HN D0E" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(strict["policy"], "strict");
    assert_eq!(strict["matched"], false);

    let (_, lenient) = send(
        &app,
        json_request(
            "POST",
            "/api/match",
            json!({ "expected": "John Doe", "scanned": "J0HN D0E", "policy": "lenient" }),
        ),
    )
    .await;
    assert_eq!(lenient["matched"], true);
    assert_eq!(lenient["score"], 1.0);
}

// =============================================================================
// Read-only directory store
// =============================================================================

#[tokio::test]
async fn test_directory_store_is_read_only() {
    let store = DirectoryStore::new(sample_forms());
    let app = build_router(AppState::new(Arc::new(store), TextMatcher::default()));

    let (status, health) = send(&app, test_request("GET", "/health")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(health["store"], "directory");

    let (status, body) = send(&app, test_request("GET", "/api/blind-check-form/f12345")).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["contractNumber"], "F12345");

    let (status, body) = send(
        &app,
        json_request(
            "POST",
            "/api/blind-check-form/F12345/verification",
            json!({ "isVerified": false }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert!(body["message"].as_str().unwrap().contains("read-only"));
}

#[tokio::test]
async fn test_corrupt_form_file_is_internal_error() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(dir.path().join("F9.json"), "{ not json").unwrap();
    let app = build_router(AppState::new(
        Arc::new(DirectoryStore::new(dir.path())),
        TextMatcher::default(),
    ));

    let (status, body) = send(&app, test_request("GET", "/api/blind-check-form/F9")).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    let message = body["message"].as_str().unwrap();
    assert_eq!(message, "An internal error occurred.");
    assert!(!message.contains(&dir.path().display().to_string()));
}
