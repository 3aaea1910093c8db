use super::types::{DownloadTask, FetchError, FetchOptions, FetchReport, StatusPolicy};
use reqwest::Url;
use std::path::Path;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, warn};

const MAX_REDIRECTS: usize = 10;

/// Builds the client shared by the fetcher and the listing API client so that both send the
/// same identifying header and honour the same timeout.
///
/// The timeout bounds connecting and each individual read, not the whole transfer.
pub fn build_http_client(options: &FetchOptions) -> Result<reqwest::Client, FetchError> {
    reqwest::Client::builder()
        .user_agent(options.user_agent.as_str())
        .connect_timeout(options.timeout)
        .read_timeout(options.timeout)
        .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
        .build()
        .map_err(FetchError::Client)
}

pub fn parse_asset_url(url: &str) -> Result<Url, FetchError> {
    Url::parse(url).map_err(|e| FetchError::InvalidUrl {
        url: url.to_string(),
        reason: e.to_string(),
    })
}

/// Output file name for a URL: its final, non-empty path segment.
pub fn file_name_from_url(url: &Url) -> Result<String, FetchError> {
    let name = url
        .path_segments()
        .and_then(|mut segments| segments.next_back())
        .filter(|segment| !segment.is_empty() && *segment != "." && *segment != "..")
        .ok_or_else(|| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: "no file name in path".to_string(),
        })?;
    Ok(name.to_string())
}

#[derive(Clone, Debug)]
pub struct AssetFetcher {
    client: reqwest::Client,
    options: FetchOptions,
}

impl AssetFetcher {
    pub fn new(options: FetchOptions) -> Result<Self, FetchError> {
        let client = build_http_client(&options)?;
        Ok(Self::with_client(client, options))
    }

    pub fn with_client(client: reqwest::Client, options: FetchOptions) -> Self {
        Self { client, options }
    }

    pub fn client(&self) -> &reqwest::Client {
        &self.client
    }

    pub fn options(&self) -> &FetchOptions {
        &self.options
    }

    /// Downloads `url` into `destination_dir`, naming the file after the last URL segment.
    pub async fn fetch(&self, url: &str, destination_dir: &Path) -> Result<FetchReport, FetchError> {
        let url = parse_asset_url(url)?;
        let file_name = file_name_from_url(&url)?;
        self.fetch_as(&url, destination_dir, &file_name).await
    }

    pub async fn run(&self, task: &DownloadTask) -> Result<FetchReport, FetchError> {
        self.fetch_as(&task.source_url, &task.destination_dir, &task.file_name)
            .await
    }

    pub async fn fetch_as(
        &self,
        url: &Url,
        destination_dir: &Path,
        file_name: &str,
    ) -> Result<FetchReport, FetchError> {
        tokio::fs::create_dir_all(destination_dir)
            .await
            .map_err(|source| FetchError::Filesystem {
                path: destination_dir.to_path_buf(),
                source,
            })?;

        let output_path = destination_dir.join(file_name);
        debug!(url = %url, output = %output_path.display(), "Fetching");

        let mut response = self
            .client
            .get(url.clone())
            .send()
            .await
            .map_err(|source| FetchError::Transfer {
                url: url.clone(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!(url = %url, status = %status, "Remote responded with non-success status");
            if self.options.status_policy == StatusPolicy::Reject {
                return Err(FetchError::RemoteStatus {
                    url: url.clone(),
                    status,
                });
            }
        }

        let file = tokio::fs::File::create(&output_path)
            .await
            .map_err(|source| FetchError::Filesystem {
                path: output_path.clone(),
                source,
            })?;
        let mut writer = BufWriter::new(file);

        let mut bytes = 0u64;
        while let Some(chunk) = response
            .chunk()
            .await
            .map_err(|source| FetchError::Transfer {
                url: url.clone(),
                source,
            })?
        {
            writer
                .write_all(&chunk)
                .await
                .map_err(|source| FetchError::Filesystem {
                    path: output_path.clone(),
                    source,
                })?;
            bytes += chunk.len() as u64;
        }

        writer
            .flush()
            .await
            .map_err(|source| FetchError::Filesystem {
                path: output_path.clone(),
                source,
            })?;

        info!(url = %url, output = %output_path.display(), bytes, "Fetched");
        Ok(FetchReport {
            path: output_path,
            status,
            bytes,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_name_from_url_uses_last_segment() {
        let url = Url::parse("https://vulkan-tutorial.com/images/texture.jpg").unwrap();
        assert_eq!(file_name_from_url(&url).unwrap(), "texture.jpg");
    }

    #[test]
    fn test_file_name_from_url_ignores_query() {
        let url = Url::parse("https://raw.example.com/org/repo/main/model.gltf?token=abc").unwrap();
        assert_eq!(file_name_from_url(&url).unwrap(), "model.gltf");
    }

    #[test]
    fn test_file_name_from_url_rejects_directory_url() {
        let url = Url::parse("https://example.com/images/").unwrap();
        assert!(matches!(
            file_name_from_url(&url),
            Err(FetchError::InvalidUrl { .. })
        ));

        let url = Url::parse("https://example.com").unwrap();
        assert!(file_name_from_url(&url).is_err());
    }

    #[test]
    fn test_parse_asset_url_rejects_relative() {
        assert!(matches!(
            parse_asset_url("images/texture.jpg"),
            Err(FetchError::InvalidUrl { .. })
        ));
    }

    #[test]
    fn test_download_task_output_path() {
        let task = DownloadTask {
            source_url: Url::parse("https://example.com/raw/albedo.png").unwrap(),
            destination_dir: "out/textures".into(),
            file_name: "albedo.png".to_string(),
        };
        assert_eq!(
            task.output_path(),
            std::path::PathBuf::from("out/textures/albedo.png")
        );
    }
}
