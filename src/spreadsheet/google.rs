//! Google Sheets through the Sheets API v4 `values` endpoint.

use crate::config::Credentials;
use crate::error::ConfigError;
use crate::error::FetchError;
use crate::spreadsheet::RawTable;
use crate::spreadsheet::SheetSource;
use log::debug;
use reqwest::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use std::fs;
use tokio::runtime::Runtime;
use url::Url;
use yup_oauth2::ServiceAccountAuthenticator;
use yup_oauth2::ServiceAccountKey;

pub const DEFAULT_API_URL: &str = "https://sheets.googleapis.com/v4/";
const READONLY_SCOPE: &str = "https://www.googleapis.com/auth/spreadsheets.readonly";

#[derive(Deserialize)]
struct ValueRange {
    #[serde(default)]
    values: Vec<Vec<Value>>,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    message: String,
    /// Canonical code, e.g. `INVALID_ARGUMENT`
    #[serde(default)]
    status: String,
    #[serde(default)]
    details: Vec<ErrorInfo>,
}

#[derive(Deserialize)]
struct ErrorInfo {
    #[serde(default)]
    reason: String,
}

impl ErrorDetail {
    /// Bad or blocked API keys are reported as 400 `INVALID_ARGUMENT` with an
    /// `API_KEY_*` reason.
    fn is_auth_failure(&self) -> bool {
        matches!(self.status.as_str(), "UNAUTHENTICATED" | "PERMISSION_DENIED")
            || self.details.iter().any(|info| info.reason.starts_with("API_KEY_"))
    }

    fn is_unknown_range(&self) -> bool {
        self.message.starts_with("Unable to parse range")
    }
}

/// Reads worksheets of Google spreadsheets. The source id is the spreadsheet id.
///
/// Values are fetched as displayed in the sheet (`FORMATTED_VALUE`), row by
/// row. Requests block the calling thread on a private runtime.
pub struct GoogleSheetsSource {
    api_url: Url,
    credentials: Credentials,
    service_account: Option<ServiceAccountKey>,
    client: reqwest::Client,
    runtime: Runtime,
}

impl GoogleSheetsSource {
    /// Builds a source for `credentials`. A service account key file is read
    /// and checked up front.
    pub fn new(credentials: Credentials) -> Result<GoogleSheetsSource, ConfigError> {
        let service_account = match &credentials {
            Credentials::ServiceAccount(path) => Some(read_service_account_key(&path.display().to_string())?),
            Credentials::ApiKey(_) | Credentials::Anonymous => None,
        };
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()?;
        Ok(GoogleSheetsSource {
            api_url: parse_api_url(DEFAULT_API_URL)?,
            credentials,
            service_account,
            client: reqwest::Client::new(),
            runtime,
        })
    }

    /// Points the source at another API root, e.g. a proxy or a test server.
    pub fn with_api_url(mut self, api_url: &str) -> Result<GoogleSheetsSource, ConfigError> {
        self.api_url = parse_api_url(api_url)?;
        Ok(self)
    }

    /// `{api}/spreadsheets/{id}/values/'{worksheet}'?majorDimension=ROWS&...`
    fn values_url(&self, source_id: &str, worksheet: &str) -> Url {
        let range = format!("'{}'", worksheet.replace('\'', "''"));
        let mut url = self.api_url.clone();
        if let Ok(mut segments) = url.path_segments_mut() {
            segments.pop_if_empty().extend(["spreadsheets", source_id, "values", range.as_str()]);
        }
        {
            let mut query = url.query_pairs_mut();
            query.append_pair("majorDimension", "ROWS");
            query.append_pair("valueRenderOption", "FORMATTED_VALUE");
            if let Credentials::ApiKey(key) = &self.credentials {
                query.append_pair("key", key);
            }
        }
        url
    }

    async fn access_token(&self, source_id: &str) -> Result<Option<String>, FetchError> {
        let Some(key) = &self.service_account else {
            return Ok(None);
        };
        let unauthorized = |message: String| FetchError::Unauthorized {
            source_id: source_id.to_owned(),
            message,
        };
        let authenticator = ServiceAccountAuthenticator::builder(key.clone())
            .build()
            .await
            .map_err(|error| unauthorized(error.to_string()))?;
        let token = authenticator
            .token(&[READONLY_SCOPE])
            .await
            .map_err(|error| unauthorized(error.to_string()))?;
        match token.token() {
            Some(token) => Ok(Some(token.to_owned())),
            None => Err(unauthorized("no access token issued".to_owned())),
        }
    }

    async fn fetch_values(&self, source_id: &str, worksheet: &str) -> Result<RawTable, FetchError> {
        let unreachable = |error: reqwest::Error| FetchError::Unreachable {
            source_id: source_id.to_owned(),
            message: error.to_string(),
        };
        let mut request = self.client.get(self.values_url(source_id, worksheet));
        if let Some(token) = self.access_token(source_id).await? {
            request = request.bearer_auth(token);
        }
        let response = request.send().await.map_err(unreachable)?;
        let status = response.status();
        let body = response.text().await.map_err(unreachable)?;
        if !status.is_success() {
            return Err(status_error(status, &body, source_id, worksheet));
        }

        let range = serde_json::from_str::<ValueRange>(&body).map_err(|error| FetchError::Malformed {
            source_id: source_id.to_owned(),
            message: error.to_string(),
        })?;
        Ok(range
            .values
            .into_iter()
            .map(|row| row.into_iter().map(cell_text).collect())
            .collect())
    }
}

impl SheetSource for GoogleSheetsSource {
    fn fetch(&self, source_id: &str, worksheet: &str) -> Result<RawTable, FetchError> {
        debug!("Fetching '{worksheet}' from spreadsheet '{source_id}'");
        let table = self.runtime.block_on(self.fetch_values(source_id, worksheet))?;
        if table.is_empty() {
            return Err(FetchError::EmptyWorksheet {
                source_id: source_id.to_owned(),
                worksheet: worksheet.to_owned(),
            });
        }
        Ok(table)
    }
}

fn parse_api_url(value: &str) -> Result<Url, ConfigError> {
    let invalid = |message: String| ConfigError::InvalidApiUrl {
        url: value.to_owned(),
        message,
    };
    let mut url = Url::parse(value).map_err(|error| invalid(error.to_string()))?;
    if url.cannot_be_a_base() || !matches!(url.scheme(), "http" | "https") {
        return Err(invalid("expected an http(s) URL".to_owned()));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

fn read_service_account_key(path: &str) -> Result<ServiceAccountKey, ConfigError> {
    let credentials = |message: String| ConfigError::Credentials {
        path: path.to_owned(),
        message,
    };
    let json = fs::read_to_string(path).map_err(|error| credentials(error.to_string()))?;
    serde_json::from_str(&json).map_err(|error| credentials(error.to_string()))
}

/// Maps a failed API response onto the fetch error taxonomy. The API answers
/// 400 "Unable to parse range" for an unknown worksheet, and 400 with an
/// `API_KEY_INVALID` reason for a bad key.
fn status_error(status: StatusCode, body: &str, source_id: &str, worksheet: &str) -> FetchError {
    let detail = serde_json::from_str::<ErrorBody>(body).ok().map(|body| body.error);
    let message = detail
        .as_ref()
        .map(|detail| detail.message.as_str())
        .filter(|message| !message.is_empty());
    let source_id = source_id.to_owned();
    let unauthorized = |source_id| FetchError::Unauthorized {
        source_id,
        message: message.map_or_else(|| status.to_string(), str::to_owned),
    };
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => unauthorized(source_id),
        StatusCode::BAD_REQUEST if detail.as_ref().is_some_and(ErrorDetail::is_auth_failure) => unauthorized(source_id),
        StatusCode::BAD_REQUEST if !detail.as_ref().is_some_and(ErrorDetail::is_unknown_range) => {
            FetchError::Malformed {
                source_id,
                message: match message {
                    Some(message) => format!("{status}: {message}"),
                    None => status.to_string(),
                },
            }
        }
        StatusCode::NOT_FOUND | StatusCode::BAD_REQUEST => FetchError::NotFound {
            source_id,
            worksheet: worksheet.to_owned(),
        },
        StatusCode::TOO_MANY_REQUESTS => FetchError::RateLimited { source_id },
        _ => FetchError::Unreachable {
            source_id,
            message: match message {
                Some(message) => format!("{status}: {message}"),
                None => status.to_string(),
            },
        },
    }
}

fn cell_text(value: Value) -> String {
    match value {
        Value::String(text) => text,
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::BufRead;
    use std::io::BufReader;
    use std::io::Write;
    use std::net::TcpListener;
    use std::thread;
    use std::thread::JoinHandle;

    /// Serves one canned HTTP response and hands back the request line.
    fn serve_once(status: &str, body: &str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = format!("http://{}/v4", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );
        let handle = thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);
            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            loop {
                let mut header = String::new();
                reader.read_line(&mut header).unwrap();
                if header == "\r\n" || header.is_empty() {
                    break;
                }
            }
            reader.get_mut().write_all(response.as_bytes()).unwrap();
            request_line
        });
        (address, handle)
    }

    fn source(api_url: &str, credentials: Credentials) -> GoogleSheetsSource {
        GoogleSheetsSource::new(credentials).unwrap().with_api_url(api_url).unwrap()
    }

    #[test]
    fn test_values_url() {
        let source = source("https://sheets.example.com/v4", Credentials::ApiKey("secret".to_owned()));
        let url = source.values_url("abc123", "Q1 Sales's");
        assert_eq!(url.path(), "/v4/spreadsheets/abc123/values/'Q1%20Sales''s'");
        assert_eq!(
            url.query(),
            Some("majorDimension=ROWS&valueRenderOption=FORMATTED_VALUE&key=secret")
        );
    }

    #[test]
    fn test_invalid_api_url() {
        let source = GoogleSheetsSource::new(Credentials::Anonymous).unwrap();
        assert!(matches!(source.with_api_url("ftp://example.com"), Err(ConfigError::InvalidApiUrl { .. })));
    }

    #[test]
    fn test_missing_service_account_file() {
        let result = GoogleSheetsSource::new(Credentials::ServiceAccount("no-such-key.json".into()));
        assert!(matches!(result, Err(ConfigError::Credentials { .. })));
    }

    #[test]
    fn test_fetch_values() {
        let body = r#"{"range":"Sheet1!A1:C3","majorDimension":"ROWS","values":[["Name","Age","Active"],["Ada",36,true],["Grace"]]}"#;
        let (address, server) = serve_once("200 OK", body);
        let table = source(&address, Credentials::Anonymous).fetch("abc", "Sheet1").unwrap();
        assert_eq!(
            table,
            vec![
                vec!["Name".to_owned(), "Age".to_owned(), "Active".to_owned()],
                vec!["Ada".to_owned(), "36".to_owned(), "true".to_owned()],
                vec!["Grace".to_owned()],
            ]
        );
        let request_line = server.join().unwrap();
        assert!(request_line.starts_with("GET /v4/spreadsheets/abc/values/'Sheet1'?majorDimension=ROWS"), "{request_line}");
    }

    #[test]
    fn test_fetch_empty_worksheet() {
        let (address, server) = serve_once("200 OK", r#"{"range":"Sheet1!A1:Z1000","majorDimension":"ROWS"}"#);
        let error = source(&address, Credentials::Anonymous).fetch("abc", "Sheet1").unwrap_err();
        assert!(matches!(error, FetchError::EmptyWorksheet { .. }));
        server.join().unwrap();
    }

    #[test]
    fn test_fetch_error_statuses() {
        let cases = [
            ("400 Bad Request", r#"{"error":{"code":400,"message":"Unable to parse range: Nope"}}"#),
            ("403 Forbidden", r#"{"error":{"code":403,"message":"The caller does not have permission"}}"#),
            ("404 Not Found", r#"{"error":{"code":404,"message":"Requested entity was not found."}}"#),
            ("429 Too Many Requests", "{}"),
            ("503 Service Unavailable", "oops"),
            (
                "400 Bad Request",
                r#"{"error":{"code":400,"message":"API key not valid. Please pass a valid API key.","status":"INVALID_ARGUMENT","details":[{"@type":"type.googleapis.com/google.rpc.ErrorInfo","reason":"API_KEY_INVALID","domain":"googleapis.com"}]}}"#,
            ),
            ("400 Bad Request", r#"{"error":{"code":400,"message":"Invalid value at 'major_dimension'","status":"INVALID_ARGUMENT"}}"#),
        ];
        let mut errors = Vec::new();
        for (status, body) in cases {
            let (address, server) = serve_once(status, body);
            errors.push(source(&address, Credentials::Anonymous).fetch("abc", "Nope").unwrap_err());
            server.join().unwrap();
        }
        assert!(matches!(&errors[0], FetchError::NotFound { worksheet, .. } if worksheet == "Nope"));
        assert!(matches!(&errors[1], FetchError::Unauthorized { message, .. } if message == "The caller does not have permission"));
        assert!(matches!(&errors[2], FetchError::NotFound { .. }));
        assert!(matches!(&errors[3], FetchError::RateLimited { .. }));
        assert!(matches!(&errors[4], FetchError::Unreachable { message, .. } if message.starts_with("503")));
        assert!(matches!(&errors[5], FetchError::Unauthorized { message, .. } if message.starts_with("API key not valid")));
        assert!(matches!(&errors[6], FetchError::Malformed { message, .. } if message.contains("major_dimension")));
    }

    #[test]
    fn test_malformed_body() {
        let (address, server) = serve_once("200 OK", "<html>not json</html>");
        let error = source(&address, Credentials::Anonymous).fetch("abc", "Sheet1").unwrap_err();
        assert!(matches!(error, FetchError::Malformed { .. }));
        server.join().unwrap();
    }

    #[test]
    fn test_unreachable_server() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let address = format!("http://{}/v4", listener.local_addr().unwrap());
        drop(listener);
        let error = source(&address, Credentials::Anonymous).fetch("abc", "Sheet1").unwrap_err();
        assert!(matches!(error, FetchError::Unreachable { .. }));
    }
}
