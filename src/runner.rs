// src/runner.rs

use crate::cleaning::{clean_listings, HighSeason};
use crate::config::{AppConfig, SearchVariables, Thresholds};
use crate::db::results::save_run_results;
use crate::db::runs::{self, RunCompletion};
use crate::db::Database;
use crate::errors::ServerError;
use crate::listing_source::{ListingSource, SourceError};
use crate::spreadsheets::ExportFormat;
use chrono::Utc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use tracing::{error, info};

/// What a finished run produced.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub run_id: i64,
    pub listings_seen: usize,
    pub rows: usize,
    pub listings_failed: usize,
    pub high_season: HighSeason,
}

/// A run in progress. Dropping the handle detaches the worker; the run keeps
/// reporting its state through the database either way.
#[derive(Debug)]
pub struct RunHandle {
    pub run_id: i64,
    handle: JoinHandle<Result<RunSummary, ServerError>>,
}

impl RunHandle {
    pub fn wait(self) -> Result<RunSummary, ServerError> {
        self.handle.join().map_err(|_| ServerError::InternalError)?
    }
}

/// Records a new run and cleans it on a worker thread.
///
/// The config is validated before anything is written, so a bad threshold or
/// format never leaves a run row behind.
pub fn start_run(
    db: &Database,
    source: Arc<dyn ListingSource>,
    config: &AppConfig,
) -> Result<RunHandle, ServerError> {
    let thresholds = config.thresholds()?;
    let format = ExportFormat::parse(&config.general.output_file_format)?;
    let search = config.search.clone();

    let now = Utc::now().naive_utc();
    let run_id = db.with_conn(|conn| {
        runs::start_run(conn, format.as_str(), &config.general.output_file_name, now)
    })?;
    info!("Run {run_id} started ({} export)", format.as_str());

    let worker_db = db.clone();
    let spawned = thread::Builder::new()
        .name(format!("cleaning-run-{run_id}"))
        .spawn(move || {
            let result = execute(&worker_db, source.as_ref(), &search, &thresholds, run_id);
            if let Err(e) = &result {
                error!("Run {run_id} failed: {e}");
                let now = Utc::now().naive_utc();
                if let Err(db_err) =
                    worker_db.with_conn(|conn| runs::fail_run(conn, run_id, now, &e.to_string()))
                {
                    error!("Run {run_id}: could not record failure: {db_err}");
                }
            }
            result
        });

    match spawned {
        Ok(handle) => Ok(RunHandle { run_id, handle }),
        Err(e) => {
            let now = Utc::now().naive_utc();
            let message = format!("could not start worker: {e}");
            db.with_conn(|conn| runs::fail_run(conn, run_id, now, &message))?;
            Err(ServerError::InternalError)
        }
    }
}

fn execute(
    db: &Database,
    source: &dyn ListingSource,
    search: &SearchVariables,
    thresholds: &Thresholds,
    run_id: i64,
) -> Result<RunSummary, ServerError> {
    let raw = source.fetch_listings(search)?;
    if raw.as_array().is_some_and(|entries| entries.is_empty()) {
        return Err(SourceError::NoListings.into());
    }

    let outcome = clean_listings(&raw, thresholds)?;
    let summary = RunSummary {
        run_id,
        listings_seen: outcome.table.len() + outcome.failures.len(),
        rows: outcome.table.len(),
        listings_failed: outcome.failures.len(),
        high_season: outcome.high_season,
    };

    let now = Utc::now().naive_utc();
    db.with_conn(|conn| {
        save_run_results(conn, run_id, &outcome, now)?;
        runs::complete_run(
            conn,
            run_id,
            now,
            &RunCompletion {
                listings_seen: summary.listings_seen,
                listings_failed: summary.listings_failed,
                high_season: summary.high_season.quarter.map(|q| q.number()),
                high_season_reviews: summary.high_season.review_count,
            },
        )
    })?;

    info!(
        "Run {run_id} completed: {} rows, {} skipped",
        summary.rows, summary.listings_failed
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleaning::Quarter;
    use crate::db::results::load_run_table;
    use crate::db::runs::{get_run, RunStatus};
    use crate::tests::utils::{init_test_db, sample_listings, StaticSource};
    use serde_json::json;

    #[test]
    fn completed_run_is_persisted() {
        let db = init_test_db();
        let source = Arc::new(StaticSource::new(sample_listings()));

        let handle = start_run(&db, source, &AppConfig::default()).unwrap();
        let run_id = handle.run_id;
        let summary = handle.wait().unwrap();

        assert_eq!(summary.run_id, run_id);
        assert_eq!(summary.listings_seen, 3);
        assert_eq!(summary.rows, 3);
        assert_eq!(summary.high_season.quarter, Quarter::new(1));

        let run = db.with_conn(|conn| get_run(conn, run_id)).unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Completed);
        assert_eq!(run.listings_seen, Some(3));
        assert_eq!(run.high_season, Some(1));

        let table = db.with_conn(|conn| load_run_table(conn, run_id)).unwrap().unwrap();
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn empty_fetch_fails_the_run() {
        let db = init_test_db();
        let source = Arc::new(StaticSource::new(json!([])));

        let handle = start_run(&db, source, &AppConfig::default()).unwrap();
        let run_id = handle.run_id;
        assert!(matches!(
            handle.wait(),
            Err(ServerError::Source(SourceError::NoListings))
        ));

        let run = db.with_conn(|conn| get_run(conn, run_id)).unwrap().unwrap();
        assert_eq!(run.status, RunStatus::Failed);
        assert_eq!(run.error_message.as_deref(), Some("Listing Source Error: no listings returned"));
    }

    #[test]
    fn bad_shape_fails_the_run() {
        let db = init_test_db();
        let source = Arc::new(StaticSource::new(json!({"listings": []})));

        let handle = start_run(&db, source, &AppConfig::default()).unwrap();
        assert!(matches!(handle.wait(), Err(ServerError::Cleaning(_))));
    }

    #[test]
    fn invalid_config_is_rejected_before_a_run_exists() {
        let db = init_test_db();
        let source = Arc::new(StaticSource::new(sample_listings()));
        let mut config = AppConfig::default();
        config.general.output_file_format = "pdf".to_string();

        assert!(matches!(
            start_run(&db, source, &config),
            Err(ServerError::BadRequest(_))
        ));
        let runs = db.with_conn(|conn| runs::get_recent_runs(conn)).unwrap();
        assert!(runs.is_empty());
    }
}
