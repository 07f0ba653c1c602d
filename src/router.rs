use crate::config::AppConfig;
use crate::db::results::{count_by_category, load_run_failures, load_run_table};
use crate::db::runs::{get_recent_runs, get_run, RunStatus};
use crate::db::Database;
use crate::errors::ServerError;
use crate::listing_source::ListingSource;
use crate::responses::{export_response, html_response, redirect, ResultResp};
use crate::runner;
use crate::spreadsheets::{export_table, ExportFormat};
use crate::templates::pages::{home_page, run_page, HomeVm, RunVm};
use astra::Request;
use std::collections::HashMap;
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;

/// Form posts larger than this are rejected.
const MAX_FORM_BYTES: u64 = 64 * 1024;

/// Shared state handed to every request.
#[derive(Clone)]
pub struct App {
    pub db: Database,
    pub source: Arc<dyn ListingSource>,
    pub config_path: PathBuf,
}

pub fn handle(mut req: Request, app: &App) -> ResultResp {
    let method = req.method().as_str().to_string();
    let path = req.uri().path().to_string();
    let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    match (method.as_str(), segments.as_slice()) {
        ("GET", []) => home(app),
        ("POST", ["runs"]) => {
            let form = read_form(&mut req)?;
            create_run(app, &form)
        }
        ("GET", ["runs", id]) => show_run(app, parse_run_id(id)?),
        ("GET", ["runs", id, "download"]) => download(app, parse_run_id(id)?),
        _ => Err(ServerError::NotFound),
    }
}

fn home(app: &App) -> ResultResp {
    let config = AppConfig::load_or_default(&app.config_path)?;
    let recent_runs = app.db.with_conn(|conn| get_recent_runs(conn))?;

    html_response(home_page(&HomeVm {
        config: &config,
        recent_runs: &recent_runs,
    }))
}

fn create_run(app: &App, form: &HashMap<String, String>) -> ResultResp {
    let mut config = AppConfig::load_or_default(&app.config_path)?;
    config.apply_form(form)?;
    ExportFormat::parse(&config.general.output_file_format)?;
    config.save(&app.config_path)?;
    info!("Configuration saved to {}", app.config_path.display());

    let handle = runner::start_run(&app.db, Arc::clone(&app.source), &config)?;
    redirect(&format!("/runs/{}", handle.run_id))
}

fn show_run(app: &App, run_id: i64) -> ResultResp {
    let (run, table, category_counts, failures) = app.db.with_conn(|conn| {
        let run = get_run(conn, run_id)?.ok_or(ServerError::NotFound)?;
        let table = load_run_table(conn, run_id)?;
        let counts = count_by_category(conn, run_id)?;
        let failures = load_run_failures(conn, run_id)?;
        Ok((run, table, counts, failures))
    })?;

    html_response(run_page(&RunVm {
        run: &run,
        table: table.as_ref(),
        category_counts: &category_counts,
        failures: &failures,
    }))
}

fn download(app: &App, run_id: i64) -> ResultResp {
    let (run, table) = app.db.with_conn(|conn| {
        let run = get_run(conn, run_id)?.ok_or(ServerError::NotFound)?;
        let table = load_run_table(conn, run_id)?;
        Ok((run, table))
    })?;

    let table = match (run.status, table) {
        (RunStatus::Completed, Some(table)) => table,
        (RunStatus::Running, _) => {
            return Err(ServerError::BadRequest(format!(
                "run {run_id} is still running"
            )))
        }
        _ => return Err(ServerError::NotFound),
    };

    let format = ExportFormat::parse(&run.output_format)?;
    let buffer = export_table(&table, format)?;
    export_response(buffer, format, &run.output_file_name)
}

fn parse_run_id(raw: &str) -> Result<i64, ServerError> {
    raw.parse::<i64>().map_err(|_| ServerError::NotFound)
}

fn read_form(req: &mut Request) -> Result<HashMap<String, String>, ServerError> {
    let mut body = Vec::new();
    req.body_mut()
        .reader()
        .take(MAX_FORM_BYTES + 1)
        .read_to_end(&mut body)
        .map_err(|e| ServerError::BadRequest(format!("could not read form: {e}")))?;
    if body.len() as u64 > MAX_FORM_BYTES {
        return Err(ServerError::BadRequest("form is too large".to_string()));
    }

    Ok(url::form_urlencoded::parse(&body).into_owned().collect())
}
