// src/tests/router_tests/run_tests.rs

use crate::config::AppConfig;
use crate::db::runs::{get_recent_runs, get_run, RunStatus};
use crate::errors::ServerError;
use crate::router::{handle, App};
use crate::runner::start_run;
use crate::tests::utils::{
    body_bytes, body_string, init_test_db, request, sample_listings, StaticSource,
};
use http::Method;
use serde_json::json;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

static NEXT_CONFIG: AtomicUsize = AtomicUsize::new(0);

fn test_app(listings: serde_json::Value) -> App {
    let config_path: PathBuf = std::env::temp_dir().join(format!(
        "listing_quality_config_{}_{}.json",
        std::process::id(),
        NEXT_CONFIG.fetch_add(1, Ordering::SeqCst)
    ));
    let _ = std::fs::remove_file(&config_path);

    App {
        db: init_test_db(),
        source: Arc::new(StaticSource::new(listings)),
        config_path,
    }
}

fn completed_run(app: &App, config: &AppConfig) -> i64 {
    let handle = start_run(&app.db, Arc::clone(&app.source), config).unwrap();
    let run_id = handle.run_id;
    handle.wait().unwrap();
    run_id
}

fn wait_until_finished(app: &App, run_id: i64) -> RunStatus {
    for _ in 0..100 {
        let run = app
            .db
            .with_conn(|conn| get_run(conn, run_id))
            .unwrap()
            .unwrap();
        if run.status != RunStatus::Running {
            return run.status;
        }
        thread::sleep(Duration::from_millis(50));
    }
    panic!("run {run_id} did not finish");
}

#[test]
fn home_page_shows_the_form() {
    let app = test_app(sample_listings());

    let resp = handle(request(Method::GET, "/", ""), &app).unwrap();
    assert_eq!(resp.status(), 200);

    let body = body_string(resp);
    assert!(body.contains("action=\"/runs\""));
    assert!(body.contains("name=\"good.total_months\""));
    assert!(body.contains("name=\"possibly_good.high_season_reviews\""));
}

#[test]
fn posting_the_form_saves_config_and_starts_a_run() {
    let app = test_app(sample_listings());

    let form = "good.min_reviews=3&good.total_months=3&possibly_good.min_reviews=1\
                &min_bedrooms=1&output_file_name=portland&output_file_format=csv\
                &location_query=Portland%2C+OR";
    let resp = handle(request(Method::POST, "/runs", form), &app).unwrap();

    assert_eq!(resp.status(), 302);
    let location = resp
        .headers()
        .get("Location")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();
    let run_id: i64 = location
        .strip_prefix("/runs/")
        .and_then(|id| id.parse().ok())
        .expect("redirect to the run page");

    let saved = AppConfig::load(&app.config_path).unwrap();
    assert_eq!(saved.search.location_query, "Portland, OR");
    assert_eq!(saved.logic.good_data.min_reviews, Some(3.0));
    assert_eq!(saved.general.min_bedrooms, Some(1.0));

    assert_eq!(wait_until_finished(&app, run_id), RunStatus::Completed);

    let body = body_string(handle(request(Method::GET, &location, ""), &app).unwrap());
    assert!(body.contains("Harbour Loft"));
    assert!(body.contains("Only 0 bedrooms, requires at least 1 bedrooms"));
    assert!(body.contains(&format!("/runs/{run_id}/download")));

    let _ = std::fs::remove_file(&app.config_path);
}

#[test]
fn invalid_form_is_a_bad_request() {
    let app = test_app(sample_listings());

    let err = handle(request(Method::POST, "/runs", "good.total_months=-2"), &app).unwrap_err();
    assert_eq!(err.status(), 400);

    let err = handle(request(Method::POST, "/runs", "high_season_override=Q9"), &app).unwrap_err();
    assert_eq!(err.status(), 400);
}

#[test]
fn unknown_export_format_is_rejected_before_saving() {
    let app = test_app(sample_listings());

    let err = handle(
        request(Method::POST, "/runs", "output_file_format=pdf&location_query=Bend"),
        &app,
    )
    .unwrap_err();
    assert_eq!(err.status(), 400);
    assert!(!app.config_path.exists());

    let recent = app
        .db
        .with_conn(|conn| get_recent_runs(conn))
        .unwrap();
    assert!(recent.is_empty());
}

#[test]
fn csv_download_has_the_ordered_table() {
    let app = test_app(sample_listings());
    let mut config = AppConfig::default();
    config.general.min_bedrooms = Some(1.0);
    config.general.output_file_name = "portland".to_string();
    config.logic.good_data.min_reviews = Some(3.0);
    let run_id = completed_run(&app, &config);

    let resp = handle(
        request(Method::GET, &format!("/runs/{run_id}/download"), ""),
        &app,
    )
    .unwrap();
    assert_eq!(resp.status(), 200);
    assert_eq!(
        resp.headers()
            .get("Content-Disposition")
            .and_then(|v| v.to_str().ok()),
        Some("attachment; filename=\"portland.csv\"")
    );

    let body = body_string(resp);
    let mut lines = body.lines();
    assert!(lines
        .next()
        .unwrap()
        .starts_with("Listing Name,Data Quality Category,Quality Rating Reason,bedrooms"));
    let names: Vec<&str> = lines.filter_map(|l| l.split(',').next()).collect();
    // Good first, then the rest in input order.
    assert_eq!(names, ["Harbour Loft", "Lake House", "Garden Studio"]);
}

#[test]
fn excel_download_is_a_workbook() {
    let app = test_app(sample_listings());
    let mut config = AppConfig::default();
    config.general.output_file_format = "excel".to_string();
    let run_id = completed_run(&app, &config);

    let resp = handle(
        request(Method::GET, &format!("/runs/{run_id}/download"), ""),
        &app,
    )
    .unwrap();
    assert_eq!(
        resp.headers().get("Content-Type").and_then(|v| v.to_str().ok()),
        Some("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet")
    );
    assert_eq!(&body_bytes(resp)[..2], b"PK");
}

#[test]
fn failed_run_shows_its_error() {
    let app = test_app(json!([]));
    let run = start_run(&app.db, Arc::clone(&app.source), &AppConfig::default()).unwrap();
    let run_id = run.run_id;
    assert!(run.wait().is_err());

    let body = body_string(handle(request(Method::GET, &format!("/runs/{run_id}"), ""), &app).unwrap());
    assert!(body.contains("no listings returned"));
    assert!(body.contains("status-failed"));

    // Nothing to download.
    let err = handle(
        request(Method::GET, &format!("/runs/{run_id}/download"), ""),
        &app,
    )
    .unwrap_err();
    assert!(matches!(err, ServerError::NotFound));
}

#[test]
fn unknown_routes_and_runs_are_not_found() {
    let app = test_app(sample_listings());

    for uri in ["/nope", "/runs/42", "/runs/abc", "/runs/42/download"] {
        let err = handle(request(Method::GET, uri, ""), &app).unwrap_err();
        assert_eq!(err.status(), 404, "{uri}");
    }
}
