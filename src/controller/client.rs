use reqwest::StatusCode;
use serde_json::Value;
use url::Url;

use super::error::{ExportError, ExportResult};

/// Identifies one object on one controller
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectQuery {
    pub controller: String,
    pub username: String,
    pub password: String,
    pub tenant: String,
    pub object_type: String,
    pub name: String,
    pub api_version: String,
}

impl ObjectQuery {
    /// Object type as used in API paths
    pub fn api_path(&self) -> String {
        self.object_type.to_lowercase()
    }

    /// `https://<controller>/api/<type>?name=<name>&include_name=true`
    pub fn url(&self) -> ExportResult<Url> {
        let host = self.controller.trim_end_matches('/');
        let base = if host.starts_with("http://") || host.starts_with("https://") {
            host.to_string()
        } else {
            format!("https://{}", host)
        };

        let mut url = Url::parse(&format!("{}/api/{}", base, self.api_path())).map_err(|e| {
            ExportError::InvalidInput(format!("Invalid controller '{}': {}", self.controller, e))
        })?;

        url.query_pairs_mut()
            .append_pair("name", &self.name)
            .append_pair("include_name", "true");

        Ok(url)
    }
}

/// Fetches a single object by name. Failures are fatal to the export.
pub trait ObjectFetcher: Send + Sync {
    fn fetch(&self, query: &ObjectQuery) -> ExportResult<Value>;
}

/// Blocking HTTP client for the controller REST API
pub struct AviControllerClient {
    client: reqwest::blocking::Client,
}

impl AviControllerClient {
    pub fn new() -> ExportResult<Self> {
        // Controllers are commonly deployed with self-signed certificates
        let client = reqwest::blocking::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| ExportError::ControllerApi {
                url: String::new(),
                status: None,
                message: format!("Failed to build HTTP client: {}", e),
            })?;

        Ok(Self { client })
    }
}

impl ObjectFetcher for AviControllerClient {
    fn fetch(&self, query: &ObjectQuery) -> ExportResult<Value> {
        let url = query.url()?;

        let response = self
            .client
            .get(url.clone())
            .basic_auth(&query.username, Some(&query.password))
            .header("X-Avi-Tenant", &query.tenant)
            .header("X-Avi-Version", &query.api_version)
            .send()
            .map_err(|e| ExportError::ControllerApi {
                url: url.to_string(),
                status: None,
                message: e.to_string(),
            })?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ExportError::Authentication(format!(
                "controller {} returned {} for user '{}'",
                query.controller, status, query.username
            )));
        }

        let body = response.text().map_err(|e| ExportError::ControllerApi {
            url: url.to_string(),
            status: Some(status.as_u16()),
            message: format!("Failed to read response body: {}", e),
        })?;

        if !status.is_success() {
            return Err(ExportError::ControllerApi {
                url: url.to_string(),
                status: Some(status.as_u16()),
                message: body,
            });
        }

        let envelope: Value = serde_json::from_str(&body)
            .map_err(|e| ExportError::InvalidResponse(format!("body is not JSON: {}", e)))?;

        extract_object(envelope, query)
    }
}

/// Pull the first object out of a `{count, results: [...]}` collection response
pub fn extract_object(envelope: Value, query: &ObjectQuery) -> ExportResult<Value> {
    let Value::Object(mut body) = envelope else {
        return Err(ExportError::InvalidResponse(
            "expected a JSON object".to_string(),
        ));
    };

    let results = match body.remove("results") {
        Some(Value::Array(results)) => results,
        Some(_) => {
            return Err(ExportError::InvalidResponse(
                "'results' is not a list".to_string(),
            ));
        }
        None => {
            return Err(ExportError::InvalidResponse(
                "missing 'results' field".to_string(),
            ));
        }
    };

    results
        .into_iter()
        .next()
        .ok_or_else(|| ExportError::ObjectNotFound {
            object_type: query.object_type.clone(),
            name: query.name.clone(),
        })
}

/// Fetcher returning a canned response, for tests
#[cfg(test)]
pub struct StaticFetcher {
    response: Option<Value>,
    queries: std::sync::Mutex<Vec<ObjectQuery>>,
}

#[cfg(test)]
impl StaticFetcher {
    pub fn returning(object: Value) -> Self {
        Self {
            response: Some(object),
            queries: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn not_found() -> Self {
        Self {
            response: None,
            queries: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn queries(&self) -> Vec<ObjectQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[cfg(test)]
impl ObjectFetcher for StaticFetcher {
    fn fetch(&self, query: &ObjectQuery) -> ExportResult<Value> {
        self.queries.lock().unwrap().push(query.clone());
        self.response
            .clone()
            .ok_or_else(|| ExportError::ObjectNotFound {
                object_type: query.object_type.clone(),
                name: query.name.clone(),
            })
    }
}
