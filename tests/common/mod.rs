#![allow(dead_code)]

use std::sync::Mutex;

use serde_json::{Value, json};

use inat_barcode_importer::app::{ProgressEvent, ProgressSink};
use inat_barcode_importer::config::Credentials;
use inat_barcode_importer::error::ImportError;
use inat_barcode_importer::http::Transport;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: &'static str,
    pub url: String,
    pub authorization: Option<String>,
}

type GetHandler = Box<dyn Fn(&str) -> Result<Value, ImportError> + Send + Sync>;

pub struct MockTransport {
    token_response: Result<Value, String>,
    get: GetHandler,
    requests: Mutex<Vec<Request>>,
}

impl MockTransport {
    pub fn new<F>(token_response: Value, get: F) -> Self
    where
        F: Fn(&str) -> Result<Value, ImportError> + Send + Sync + 'static,
    {
        Self {
            token_response: Ok(token_response),
            get: Box::new(get),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<Request> {
        self.requests.lock().unwrap().clone()
    }

    pub fn observation_requests(&self) -> Vec<Request> {
        self.requests()
            .into_iter()
            .filter(|request| request.url.contains("/observations?"))
            .collect()
    }
}

impl Transport for MockTransport {
    fn get_json(&self, url: &str, authorization: Option<&str>) -> Result<Value, ImportError> {
        self.requests.lock().unwrap().push(Request {
            method: "GET",
            url: url.to_string(),
            authorization: authorization.map(str::to_string),
        });
        (self.get)(url)
    }

    fn post_form(&self, url: &str, _form: &[(&str, &str)]) -> Result<Value, ImportError> {
        self.requests.lock().unwrap().push(Request {
            method: "POST",
            url: url.to_string(),
            authorization: None,
        });
        self.token_response
            .clone()
            .map_err(ImportError::Transport)
    }
}

pub struct SilentProgress;

impl ProgressSink for SilentProgress {
    fn event(&self, _event: ProgressEvent) {}
}

pub struct RecordingProgress {
    pub messages: Mutex<Vec<String>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self {
            messages: Mutex::new(Vec::new()),
        }
    }
}

impl ProgressSink for RecordingProgress {
    fn event(&self, event: ProgressEvent) {
        self.messages.lock().unwrap().push(event.message);
    }
}

pub fn credentials() -> Credentials {
    Credentials {
        app_id: "app".to_string(),
        app_secret: "secret".to_string(),
        username: "mycologist".to_string(),
        password: "hunter2".to_string(),
    }
}

pub fn id_above(url: &str) -> u64 {
    url.rsplit("id_above=")
        .next()
        .and_then(|value| value.parse().ok())
        .unwrap()
}

pub fn bare_observation(id: u64) -> Value {
    json!({
        "id": id,
        "observed_on_details": {"date": "2024-05-01"},
        "user": {"name": "Ada Lovelace", "login": "ada"},
        "description": null,
        "location": "30.1,-90.2",
        "geoprivacy": null,
        "place_ids": [],
        "taxon": {"name": "Amanita", "ancestor_ids": []},
        "ofvs": [{"name": "DNA Barcode ITS", "value": "ACGT"}]
    })
}

pub fn page(total: u64, results: Vec<Value>) -> Value {
    json!({"total_results": total, "results": results})
}
