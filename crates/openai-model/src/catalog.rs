use producer_model::ErrorKind;
use reqwest::Client;

use crate::Error;
use crate::config::DEFAULT_BASE_URL;
use crate::proto::ModelList;

/// Provider prefixes offered in the model picker.
pub const ALLOWED_PROVIDERS: [&str; 4] =
    ["openai", "google", "anthropic", "moonshot"];

/// An entry of the model picker.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CatalogModel {
    /// The full identifier, e.g. `anthropic/claude-4-5-sonnet`.
    pub id: String,
    /// The display name: the identifier without its provider prefix.
    pub name: String,
}

impl CatalogModel {
    /// Creates an entry from a model identifier.
    pub fn from_id<S: Into<String>>(id: S) -> Self {
        let id = id.into();
        let name = id.rsplit('/').next().unwrap_or(&id).to_owned();
        Self { id, name }
    }
}

/// Keeps only the identifiers whose provider prefix is allowed.
pub fn filter_catalog<I, S>(ids: I) -> Vec<CatalogModel>
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    ids.into_iter()
        .map(Into::into)
        .filter(|id| {
            id.split_once('/').is_some_and(|(provider, _)| {
                ALLOWED_PROVIDERS.contains(&provider)
            })
        })
        .map(CatalogModel::from_id)
        .collect()
}

/// Parses the body of a `GET /models` response.
pub fn parse_catalog(body: &str) -> Result<Vec<CatalogModel>, Error> {
    let list: ModelList = serde_json::from_str(body).map_err(|err| {
        Error::new(format!("Invalid model list: {err}"), ErrorKind::Other)
    })?;
    Ok(filter_catalog(list.data.into_iter().map(|entry| entry.id)))
}

/// Lists the models available at an endpoint. No credentials are needed.
#[derive(Clone, Debug)]
pub struct ModelCatalog {
    client: Client,
    base_url: String,
}

impl Default for ModelCatalog {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl ModelCatalog {
    /// Creates a catalog for the given base URL.
    #[inline]
    pub fn new<S: Into<String>>(base_url: S) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    /// Fetches and filters the model list.
    pub async fn fetch(&self) -> Result<Vec<CatalogModel>, Error> {
        let url = format!("{}/models", self.base_url);
        debug!("fetching model catalog from {url}");
        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .and_then(|resp| resp.error_for_status())
            .map_err(|err| Error::new(err.to_string(), ErrorKind::Network))?;
        let body = resp
            .text()
            .await
            .map_err(|err| Error::new(err.to_string(), ErrorKind::Network))?;
        parse_catalog(&body)
    }
}

/// Fetches the filtered model list from `base_url`.
#[inline]
pub async fn fetch_models(base_url: &str) -> Result<Vec<CatalogModel>, Error> {
    ModelCatalog::new(base_url).fetch().await
}
