use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::config::Credentials;
use crate::domain::Observation;
use crate::error::ErrorLog;
use crate::flatten::flatten;
use crate::http::Transport;
use crate::inat::{InatApi, MAX_RECORDS_PER_REQUEST};
use crate::store::RowSink;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Idle,
    AwaitingAuth,
    Paging,
    Done,
    Aborted,
}

impl Phase {
    pub fn is_terminal(self) -> bool {
        matches!(self, Phase::Done | Phase::Aborted)
    }
}

#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Observations with ids at or below this are skipped.
    pub start_cursor: u64,
    /// Pause after every page.
    pub page_delay: Duration,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self {
            start_cursor: 0,
            page_delay: Duration::from_secs(1),
        }
    }
}

/// Everything the batch loop mutates, threaded through each page explicitly.
#[derive(Debug, Clone)]
pub struct RunState {
    pub phase: Phase,
    pub cursor: u64,
    pub batch: u64,
    pub total_results: Option<u64>,
    pub inserted: u64,
    pub errors: ErrorLog,
}

impl RunState {
    pub fn new(start_cursor: u64) -> Self {
        Self {
            phase: Phase::Idle,
            cursor: start_cursor,
            batch: 1,
            total_results: None,
            inserted: 0,
            errors: ErrorLog::default(),
        }
    }

    pub fn total_batches(&self) -> u64 {
        self.total_results
            .unwrap_or(0)
            .div_ceil(MAX_RECORDS_PER_REQUEST as u64)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    pub outcome: Phase,
    pub inserted: u64,
    pub batches: u64,
    pub last_cursor: u64,
    pub total_results: Option<u64>,
    pub errors: ErrorLog,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub elapsed_secs: f64,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

pub struct Importer<T: Transport, S: RowSink> {
    api: InatApi<T>,
    sink: S,
}

impl<T: Transport, S: RowSink> Importer<T, S> {
    pub fn new(api: InatApi<T>, sink: S) -> Self {
        Self { api, sink }
    }

    pub fn api(&self) -> &InatApi<T> {
        &self.api
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn run(
        &mut self,
        credentials: &Credentials,
        options: &ImportOptions,
        progress: &dyn ProgressSink,
    ) -> RunReport {
        let started_at = Utc::now();
        let start = Instant::now();
        let mut state = RunState::new(options.start_cursor);

        state.phase = Phase::AwaitingAuth;
        self.api.reset_session();
        match self.api.authenticate(credentials) {
            Ok(()) => {
                info!("authenticated as {}", credentials.username);
                if let Err(err) = self.api.fetch_api_token() {
                    state.errors.record(&err);
                    state.errors.push("Failed to retrieve JSON web token.");
                }
                state.phase = Phase::Paging;
            }
            Err(err) => {
                state.errors.record(&err);
                state.phase = Phase::Aborted;
            }
        }

        while state.phase == Phase::Paging {
            self.process_batch(&mut state, progress);
            if !options.page_delay.is_zero() {
                std::thread::sleep(options.page_delay);
            }
            if !state.phase.is_terminal() {
                state.batch += 1;
            }
        }

        info!(
            outcome = ?state.phase,
            inserted = state.inserted,
            errors = state.errors.len(),
            "import finished"
        );

        let elapsed = start.elapsed();
        RunReport {
            outcome: state.phase,
            inserted: state.inserted,
            batches: if state.phase == Phase::Aborted { 0 } else { state.batch },
            last_cursor: state.cursor,
            total_results: state.total_results,
            errors: state.errors,
            started_at,
            finished_at: Utc::now(),
            elapsed_secs: elapsed.as_secs_f64(),
        }
    }

    /// One page: fetch, flatten and upsert every record, move the cursor.
    pub fn process_batch(&mut self, state: &mut RunState, progress: &dyn ProgressSink) {
        let page = match self.api.fetch_observations(state.cursor) {
            Ok(page) => page,
            Err(err) => {
                state.errors.record(&err);
                state.errors.push("No observations found via iNaturalist API.");
                state.phase = Phase::Done;
                return;
            }
        };

        if page.results.is_empty() {
            state.errors.push("No observations found via iNaturalist API.");
            state.phase = Phase::Done;
            return;
        }

        if state.batch == 1 {
            state.total_results = page.total_results;
        }

        let message = format!(
            "Processing batch {} of {} (from record {})...",
            state.batch,
            state.total_batches(),
            state.cursor
        );
        info!("{message}");
        progress.event(ProgressEvent { message });

        let last_page = page.results.len() < MAX_RECORDS_PER_REQUEST;
        let started = Instant::now();
        for raw in page.results {
            self.process_record(raw, state);
        }
        debug!(
            batch = state.batch,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "batch stored"
        );

        if last_page {
            state.phase = Phase::Done;
        }
    }

    fn process_record(&mut self, raw: Value, state: &mut RunState) {
        let raw_id = raw.get("id").and_then(Value::as_u64);
        let observation = match Observation::from_value(raw) {
            Ok(observation) => observation,
            Err(err) => {
                state.errors.push(format!(
                    "Skipping observation {}: {err}",
                    raw_id.map(|id| id.to_string()).unwrap_or_else(|| "without id".to_string())
                ));
                if let Some(id) = raw_id {
                    state.cursor = id;
                }
                return;
            }
        };

        state.cursor = observation.id;
        let row = flatten(&self.api, &observation, &mut state.errors);
        match self.sink.upsert(&row) {
            Ok(()) => state.inserted += 1,
            Err(err) => state.errors.record(&err),
        }
    }
}
