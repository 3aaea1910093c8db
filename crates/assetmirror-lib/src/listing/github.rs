use super::types::{ListingError, ListingSource, RemoteEntry, RepositoryId};
use reqwest::Url;
use reqwest::header::{ACCEPT, HeaderMap, LINK};
use serde::Deserialize;
use tracing::{debug, trace};

const GITHUB_JSON: &str = "application/vnd.github+json";
const MAX_ERROR_MESSAGE_LEN: usize = 200;

#[derive(Debug, Deserialize)]
struct ContentItem {
    path: String,
    #[serde(default)]
    download_url: Option<String>,
}

/// The contents endpoint returns an array for directories and a bare object for a file path.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ContentsResponse {
    Listing(Vec<ContentItem>),
    Single(ContentItem),
}

impl ContentsResponse {
    fn into_entries(self, url: &Url) -> Result<Vec<RemoteEntry>, ListingError> {
        let items = match self {
            ContentsResponse::Listing(items) => items,
            ContentsResponse::Single(item) if item.download_url.is_none() => {
                return Err(ListingError::NotADirectory { path: item.path });
            }
            ContentsResponse::Single(item) => vec![item],
        };

        items
            .into_iter()
            .map(|item| -> Result<RemoteEntry, ListingError> {
                let download_url = item
                    .download_url
                    .map(|raw| {
                        Url::parse(&raw).map_err(|e| ListingError::Malformed {
                            url: url.clone(),
                            reason: format!("bad download_url {raw:?} for {}: {e}", item.path),
                        })
                    })
                    .transpose()?;
                Ok(RemoteEntry {
                    path: item.path,
                    download_url,
                })
            })
            .collect()
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

fn api_error_message(body: &str) -> String {
    match serde_json::from_str::<ApiErrorBody>(body) {
        Ok(parsed) => parsed.message,
        Err(_) => body.chars().take(MAX_ERROR_MESSAGE_LEN).collect(),
    }
}

/// Extracts the `rel="next"` target from RFC 8288 `Link` headers.
pub(crate) fn next_page_link(headers: &HeaderMap) -> Option<Url> {
    headers
        .get_all(LINK)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .find_map(|link| {
            let mut parts = link.split(';');
            let target = parts
                .next()?
                .trim()
                .strip_prefix('<')?
                .strip_suffix('>')?;
            let is_next = parts.any(|param| {
                matches!(
                    param.trim().replace(' ', "").as_str(),
                    "rel=\"next\"" | "rel=next"
                )
            });
            if is_next { Url::parse(target).ok() } else { None }
        })
}

/// Lists directories through the GitHub repository contents API.
#[derive(Clone, Debug)]
pub struct GithubContentsClient {
    client: reqwest::Client,
    api_url: Url,
    token: Option<String>,
}

impl GithubContentsClient {
    pub fn new(
        client: reqwest::Client,
        api_url: &str,
        token: Option<String>,
    ) -> Result<Self, ListingError> {
        let api_url = Url::parse(api_url).map_err(|e| ListingError::InvalidApiUrl {
            url: api_url.to_string(),
            reason: e.to_string(),
        })?;
        if api_url.cannot_be_a_base() {
            return Err(ListingError::InvalidApiUrl {
                url: api_url.to_string(),
                reason: "not a base URL".to_string(),
            });
        }
        Ok(Self {
            client,
            api_url,
            token: token.filter(|t| !t.is_empty()),
        })
    }

    pub fn contents_url(
        &self,
        repository: &RepositoryId,
        git_ref: Option<&str>,
        path: &str,
    ) -> Result<Url, ListingError> {
        let mut url = self.api_url.clone();
        url.path_segments_mut()
            .map_err(|_| ListingError::InvalidApiUrl {
                url: self.api_url.to_string(),
                reason: "not a base URL".to_string(),
            })?
            .pop_if_empty()
            .extend([
                "repos",
                repository.owner.as_str(),
                repository.name.as_str(),
                "contents",
            ])
            .extend(path.split('/').filter(|segment| !segment.is_empty()));
        if let Some(git_ref) = git_ref {
            url.query_pairs_mut().append_pair("ref", git_ref);
        }
        Ok(url)
    }

    /// The token only goes to the configured API host, never to a foreign pagination link.
    fn token_for(&self, url: &Url) -> Option<&str> {
        self.token
            .as_deref()
            .filter(|_| url.origin() == self.api_url.origin())
    }

    async fn list_page(&self, url: &Url) -> Result<(Vec<RemoteEntry>, Option<Url>), ListingError> {
        trace!(url = %url, "Requesting listing page");

        let mut request = self.client.get(url.clone()).header(ACCEPT, GITHUB_JSON);
        if let Some(token) = self.token_for(url) {
            request = request.bearer_auth(token);
        } else if self.token.is_some() {
            debug!(url = %url, "Not sending token to foreign host");
        }

        let response = request
            .send()
            .await
            .map_err(|source| ListingError::Request {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ListingError::Status {
                url: url.clone(),
                status,
                message: api_error_message(&body),
            });
        }

        let next = next_page_link(response.headers());
        let body = response
            .bytes()
            .await
            .map_err(|source| ListingError::Request {
                url: url.clone(),
                source,
            })?;
        let page: ContentsResponse =
            serde_json::from_slice(&body).map_err(|e| ListingError::Malformed {
                url: url.clone(),
                reason: e.to_string(),
            })?;

        Ok((page.into_entries(url)?, next))
    }
}

impl ListingSource for GithubContentsClient {
    async fn list(
        &self,
        repository: &RepositoryId,
        git_ref: Option<&str>,
        path: &str,
    ) -> Result<Vec<RemoteEntry>, ListingError> {
        let mut next = Some(self.contents_url(repository, git_ref, path)?);
        let mut entries = Vec::new();

        while let Some(url) = next.take() {
            let (page, next_url) = self.list_page(&url).await?;
            entries.extend(page);
            next = next_url;
        }

        debug!(
            repository = %repository,
            path,
            entries = entries.len(),
            "Listed remote directory"
        );
        Ok(entries)
    }
}
