use serde::Deserialize;
use serde_json::Value;

use crate::config::{Credentials, Endpoints};
use crate::error::ImportError;
use crate::http::{Session, Transport};

pub const MAX_RECORDS_PER_REQUEST: usize = 100;

#[derive(Debug, Clone, Deserialize)]
pub struct PlaceRecord {
    #[serde(default)]
    pub admin_level: Option<i64>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TaxonRecord {
    #[serde(default)]
    pub rank: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
}

/// One page of `/v1/observations`. Results stay raw so a single malformed
/// record does not sink the page.
#[derive(Debug, Clone, Deserialize)]
pub struct ObservationPage {
    #[serde(default)]
    pub total_results: Option<u64>,
    #[serde(default)]
    pub results: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct ResultList<T> {
    #[serde(default = "Vec::new")]
    results: Vec<T>,
}

pub struct InatApi<T: Transport> {
    transport: T,
    endpoints: Endpoints,
    session: Session,
}

impl<T: Transport> InatApi<T> {
    pub fn new(transport: T, endpoints: Endpoints) -> Self {
        Self {
            transport,
            endpoints,
            session: Session::default(),
        }
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub fn reset_session(&mut self) {
        self.session = Session::default();
    }

    pub fn token_url(&self) -> String {
        format!("{}/oauth/token", self.endpoints.auth_base)
    }

    pub fn api_token_url(&self) -> String {
        format!("{}/users/api_token", self.endpoints.auth_base)
    }

    pub fn places_url(&self, ids: &[u64]) -> String {
        format!(
            "{}/places/{}?admin_level=0,10,20",
            self.endpoints.api_base,
            join_ids(ids)
        )
    }

    pub fn taxa_url(&self, ids: &[u64]) -> String {
        format!("{}/taxa/{}", self.endpoints.api_base, join_ids(ids))
    }

    pub fn observations_url(&self, cursor: u64) -> String {
        format!(
            "{}/observations?per_page={}&verifiable=any&place_id=any&field:DNA%20Barcode%20ITS&order_by=id&order=asc&iconic_taxa=Fungi&id_above={}",
            self.endpoints.api_base, MAX_RECORDS_PER_REQUEST, cursor
        )
    }

    /// Password grant against the OAuth endpoint. The access token is stored in
    /// the session on success.
    pub fn authenticate(&mut self, credentials: &Credentials) -> Result<(), ImportError> {
        let form = [
            ("client_id", credentials.app_id.as_str()),
            ("client_secret", credentials.app_secret.as_str()),
            ("grant_type", "password"),
            ("username", credentials.username.as_str()),
            ("password", credentials.password.as_str()),
        ];
        let body = self
            .transport
            .post_form(&self.token_url(), &form)
            .map_err(|err| ImportError::Auth(err.to_string()))?;
        let token = body
            .get("access_token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ImportError::Auth("response has no access_token".to_string()))?;
        self.session.access_token = Some(token.to_string());
        Ok(())
    }

    /// Exchanges the access token for the legacy api token (a JWT).
    pub fn fetch_api_token(&mut self) -> Result<(), ImportError> {
        let bearer = self
            .session
            .access_token
            .as_deref()
            .map(|token| format!("Bearer {token}"));
        let body = self
            .transport
            .get_json(&self.api_token_url(), bearer.as_deref())?;
        let token = body
            .get("api_token")
            .and_then(Value::as_str)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ImportError::Decode("response has no api_token".to_string()))?;
        self.session.api_token = Some(token.to_string());
        Ok(())
    }

    pub fn fetch_places(&self, ids: &[u64]) -> Result<Vec<PlaceRecord>, ImportError> {
        self.get_results(&self.places_url(ids))
    }

    pub fn fetch_taxa(&self, ids: &[u64]) -> Result<Vec<TaxonRecord>, ImportError> {
        self.get_results(&self.taxa_url(ids))
    }

    pub fn fetch_observations(&self, cursor: u64) -> Result<ObservationPage, ImportError> {
        let body = self.get(&self.observations_url(cursor))?;
        serde_json::from_value(body).map_err(|err| ImportError::Decode(err.to_string()))
    }

    fn get(&self, url: &str) -> Result<Value, ImportError> {
        let authorization = self.session.authorization();
        self.transport.get_json(url, authorization.as_deref())
    }

    fn get_results<R>(&self, url: &str) -> Result<Vec<R>, ImportError>
    where
        R: for<'de> Deserialize<'de>,
    {
        let body = self.get(url)?;
        let list: ResultList<R> =
            serde_json::from_value(body).map_err(|err| ImportError::Decode(err.to_string()))?;
        Ok(list.results)
    }
}

fn join_ids(ids: &[u64]) -> String {
    ids.iter()
        .map(u64::to_string)
        .collect::<Vec<_>>()
        .join(",")
}
