use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, Url};
use serde::Deserialize;
use serde_json::json;

use super::credentials::ServiceAccountKey;
use super::token::TokenProvider;
use super::{RowSink, SinkError};
use crate::config::Config;

const SHEETS_API_BASE: &str = "https://sheets.googleapis.com/v4/spreadsheets";
const DRIVE_FILES_URL: &str = "https://www.googleapis.com/drive/v3/files";
const SPREADSHEET_MIME_TYPE: &str = "application/vnd.google-apps.spreadsheet";

#[derive(Debug, Deserialize)]
struct DriveFileList {
    #[serde(default)]
    files: Vec<DriveFile>,
}

#[derive(Debug, Deserialize)]
struct DriveFile {
    id: String,
}

#[derive(Debug, Deserialize)]
struct SpreadsheetMetadata {
    #[serde(default)]
    sheets: Vec<SheetEntry>,
}

#[derive(Debug, Deserialize)]
struct SheetEntry {
    properties: SheetProperties,
}

#[derive(Debug, Deserialize)]
struct SheetProperties {
    title: String,
    #[serde(default)]
    index: i64,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendResponse {
    updates: Option<AppendUpdates>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AppendUpdates {
    updated_range: Option<String>,
}

/// Base URLs of the Google APIs the worksheet talks to.
#[derive(Debug, Clone)]
pub struct GoogleEndpoints {
    pub sheets_base: String,
    pub drive_files_url: String,
}

impl Default for GoogleEndpoints {
    fn default() -> Self {
        Self {
            sheets_base: SHEETS_API_BASE.to_string(),
            drive_files_url: DRIVE_FILES_URL.to_string(),
        }
    }
}

/// Authorized handle to the first worksheet of one spreadsheet.
pub struct Worksheet {
    http: reqwest::Client,
    tokens: TokenProvider,
    endpoints: GoogleEndpoints,
    spreadsheet_id: String,
    title: String,
}

impl Worksheet {
    /// Resolve the configured spreadsheet and its first worksheet.
    pub async fn open(
        config: &Config,
        key: ServiceAccountKey,
        endpoints: GoogleEndpoints,
    ) -> Result<Self, SinkError> {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(30))
            .build()?;
        let tokens = TokenProvider::new(key, http.clone());

        let spreadsheet_id = match &config.spreadsheet_id {
            Some(id) => id.clone(),
            None => {
                let url = drive_search_url(&endpoints.drive_files_url, &config.spreadsheet_name)?;
                find_spreadsheet_id(&http, &tokens, url, &config.spreadsheet_name).await?
            }
        };

        let token = tokens.access_token().await?;
        let response = send_checked(
            http.get(metadata_url(&endpoints.sheets_base, &spreadsheet_id)?)
                .bearer_auth(token),
        )
        .await?;
        let metadata: SpreadsheetMetadata = response.json().await?;
        let title = first_worksheet_title(metadata)
            .ok_or_else(|| SinkError::NoWorksheets(spreadsheet_id.clone()))?;

        tracing::info!(
            spreadsheet_id = %spreadsheet_id,
            worksheet = %title,
            client_email = %tokens.client_email(),
            "Spreadsheet opened"
        );

        Ok(Self {
            http,
            tokens,
            endpoints,
            spreadsheet_id,
            title,
        })
    }
}

#[async_trait]
impl RowSink for Worksheet {
    async fn append_row(&self, row: Vec<String>) -> Result<(), SinkError> {
        let token = self.tokens.access_token().await?;
        let url = append_url(&self.endpoints.sheets_base, &self.spreadsheet_id, &self.title)?;

        let response = send_checked(
            self.http
                .post(url)
                .bearer_auth(token)
                .json(&json!({ "values": [row] })),
        )
        .await?;

        let body: AppendResponse = response.json().await?;
        if let Some(range) = body.updates.and_then(|u| u.updated_range) {
            tracing::debug!(range = %range, "Row appended");
        }
        Ok(())
    }

    async fn check(&self) -> Result<(), SinkError> {
        self.tokens.access_token().await.map(|_| ())
    }
}

async fn find_spreadsheet_id(
    http: &reqwest::Client,
    tokens: &TokenProvider,
    url: Url,
    name: &str,
) -> Result<String, SinkError> {
    let token = tokens.access_token().await?;
    let response = send_checked(http.get(url).bearer_auth(token)).await?;
    let list: DriveFileList = response.json().await?;

    list.files
        .into_iter()
        .next()
        .map(|f| f.id)
        .ok_or_else(|| SinkError::SpreadsheetNotFound(name.to_string()))
}

async fn send_checked(request: RequestBuilder) -> Result<Response, SinkError> {
    let response = request.send().await?;
    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(SinkError::Api { status, body });
    }
    Ok(response)
}

fn first_worksheet_title(metadata: SpreadsheetMetadata) -> Option<String> {
    metadata
        .sheets
        .into_iter()
        .min_by_key(|s| s.properties.index)
        .map(|s| s.properties.title)
}

/// Drive search expression matching a live spreadsheet with exactly `name`.
fn drive_query(name: &str) -> String {
    let escaped = name.replace('\\', "\\\\").replace('\'', "\\'");
    format!(
        "name = '{}' and mimeType = '{}' and trashed = false",
        escaped, SPREADSHEET_MIME_TYPE
    )
}

fn drive_search_url(files_url: &str, name: &str) -> Result<Url, SinkError> {
    Url::parse_with_params(
        files_url,
        &[
            ("q", drive_query(name).as_str()),
            ("fields", "files(id,name)"),
            ("supportsAllDrives", "true"),
            ("includeItemsFromAllDrives", "true"),
        ],
    )
    .map_err(|e| SinkError::Url(e.to_string()))
}

fn spreadsheet_url(base: &str, spreadsheet_id: &str, tail: &[&str]) -> Result<Url, SinkError> {
    let mut url = Url::parse(base).map_err(|e| SinkError::Url(e.to_string()))?;
    url.path_segments_mut()
        .map_err(|_| SinkError::Url(base.to_string()))?
        .push(spreadsheet_id)
        .extend(tail);
    Ok(url)
}

fn metadata_url(base: &str, spreadsheet_id: &str) -> Result<Url, SinkError> {
    let mut url = spreadsheet_url(base, spreadsheet_id, &[])?;
    url.query_pairs_mut()
        .append_pair("fields", "sheets.properties(title,index)");
    Ok(url)
}

/// A1 range covering a whole worksheet; quotes are doubled inside the name.
fn sheet_range(title: &str) -> String {
    format!("'{}'", title.replace('\'', "''"))
}

fn append_url(base: &str, spreadsheet_id: &str, title: &str) -> Result<Url, SinkError> {
    let target = format!("{}:append", sheet_range(title));
    let mut url = spreadsheet_url(base, spreadsheet_id, &["values", target.as_str()])?;
    url.query_pairs_mut()
        .append_pair("valueInputOption", "RAW")
        .append_pair("insertDataOption", "INSERT_ROWS");
    Ok(url)
}
