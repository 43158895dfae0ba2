use reqwest::{Client, StatusCode};
use scraper::{Html, Selector};
use thiserror::Error;
use tracing::warn;
use url::Url;

/// The distinct ways a single row's extraction can fail. None of these abort
/// the batch; they are logged and surface as a missing price.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP status {0}")]
    Status(StatusCode),
    #[error("invalid extraction path `{0}`")]
    Path(String),
    #[error("no element matched `{0}`")]
    NoMatch(String),
}

/// Fetch `url` and extract the displayed price via `path`.
///
/// One attempt per row, no retries. Any failure is logged and collapses to
/// `None` so that one bad URL never takes the batch down with it.
pub async fn fetch_price(client: &Client, url: &str, path: &str) -> Option<String> {
    match try_fetch_price(client, url, path).await {
        Ok(price) => Some(price),
        Err(err) => {
            warn!(url, error = %err, "price extraction failed");
            None
        }
    }
}

async fn try_fetch_price(client: &Client, url: &str, path: &str) -> Result<String, FetchError> {
    let url = Url::parse(url)?;
    let response = client.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Status(status));
    }
    let body = response.text().await?;
    extract_first_match(&body, path)
}

/// Evaluate `path` against `html` and return the first match's concatenated
/// text content, whitespace runs collapsed to single spaces.
pub fn extract_first_match(html: &str, path: &str) -> Result<String, FetchError> {
    let selector =
        Selector::parse(path).map_err(|err| FetchError::Path(format!("{path}: {err}")))?;
    let document = Html::parse_document(html);
    let element = document
        .select(&selector)
        .next()
        .ok_or_else(|| FetchError::NoMatch(path.to_string()))?;
    Ok(collapse_whitespace(&element.text().collect::<String>()))
}

fn collapse_whitespace(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}
