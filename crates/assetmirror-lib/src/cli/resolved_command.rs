use crate::cli::args::{Command, HttpOverrides};
use crate::cli::params::{AssetParams, FetchParams, MirrorParams, NetworkParams, SyncParams};
use crate::config::{HttpConfig, load_config};
use crate::error::AssetMirrorError;
use crate::fetch::{FetchOptions, StatusPolicy, parse_asset_url};
use crate::listing::RepositoryId;
use crate::mirror::MirrorRequest;
use std::path::PathBuf;
use std::time::Duration;

const TOKEN_ENV: &str = "GITHUB_TOKEN";

#[derive(Debug, Clone)]
pub enum ResolvedCommand {
    Fetch(FetchParams),
    Mirror(MirrorParams),
    Sync(SyncParams),
}

fn resolve_fetch_options(
    http: &HttpConfig,
    overrides: &HttpOverrides,
) -> Result<(FetchOptions, usize), AssetMirrorError> {
    let mut options = FetchOptions::from(http);
    if let Some(user_agent) = &overrides.user_agent {
        options.user_agent = user_agent.clone();
    }
    if let Some(timeout_secs) = overrides.timeout_secs {
        options.timeout = Duration::from_secs(timeout_secs);
    }
    if overrides.write_error_bodies {
        options.status_policy = StatusPolicy::WriteBody;
    }
    let parallelism = overrides.parallelism.unwrap_or(http.parallelism);

    if options.timeout.is_zero() {
        return Err(AssetMirrorError::CliArgumentValidation {
            details: "timeout-secs must be greater than 0.".to_string(),
        });
    }
    if parallelism == 0 {
        return Err(AssetMirrorError::CliArgumentValidation {
            details: "parallelism must be greater than 0.".to_string(),
        });
    }
    if options.user_agent.trim().is_empty() {
        return Err(AssetMirrorError::CliArgumentValidation {
            details: "user-agent must not be empty.".to_string(),
        });
    }

    Ok((options, parallelism))
}

fn parse_repository(repository: &str) -> Result<RepositoryId, AssetMirrorError> {
    repository
        .parse()
        .map_err(|e: crate::listing::ListingError| AssetMirrorError::CliArgumentValidation {
            details: e.to_string(),
        })
}

fn parse_url_argument(url: &str) -> Result<reqwest::Url, AssetMirrorError> {
    parse_asset_url(url).map_err(|e| AssetMirrorError::CliArgumentValidation {
        details: e.to_string(),
    })
}

pub fn resolve_command(
    command: Command,
    overrides: HttpOverrides,
) -> Result<ResolvedCommand, AssetMirrorError> {
    match command {
        Command::Fetch { url, output_dir } => {
            let http = HttpConfig::default();
            let (fetch_options, parallelism) = resolve_fetch_options(&http, &overrides)?;

            Ok(ResolvedCommand::Fetch(FetchParams {
                url: parse_url_argument(&url)?,
                output_dir: PathBuf::from(output_dir),
                network: NetworkParams {
                    fetch_options,
                    parallelism,
                    api_url: crate::config::DEFAULT_GITHUB_API_URL.to_string(),
                    token: None,
                },
            }))
        }
        Command::Mirror {
            repository,
            path,
            output_dir,
            git_ref,
            api_url,
            token,
        } => {
            let http = HttpConfig::default();
            let (fetch_options, parallelism) = resolve_fetch_options(&http, &overrides)?;
            let repository = parse_repository(&repository)?;

            Ok(ResolvedCommand::Mirror(MirrorParams {
                request: MirrorRequest::new(repository, path, output_dir).with_ref(git_ref),
                network: NetworkParams {
                    fetch_options,
                    parallelism,
                    api_url: api_url
                        .unwrap_or_else(|| crate::config::DEFAULT_GITHUB_API_URL.to_string()),
                    token,
                },
            }))
        }
        Command::Sync { config_path } => {
            let app_config = load_config(&config_path)?;

            if app_config.assets.is_empty() && app_config.mirrors.is_empty() {
                return Err(AssetMirrorError::EmptyConfig {
                    path: PathBuf::from(config_path),
                });
            }

            let (fetch_options, parallelism) =
                resolve_fetch_options(&app_config.http, &overrides)?;

            let assets = app_config
                .assets
                .iter()
                .map(|asset| -> Result<AssetParams, AssetMirrorError> {
                    Ok(AssetParams {
                        url: parse_url_argument(&asset.url)?,
                        destination: asset.destination.clone(),
                    })
                })
                .collect::<Result<Vec<_>, AssetMirrorError>>()?;

            let mirrors = app_config
                .mirrors
                .iter()
                .map(|mirror| -> Result<MirrorRequest, AssetMirrorError> {
                    Ok(MirrorRequest::new(
                        parse_repository(&mirror.repository)?,
                        &mirror.path,
                        mirror.destination.clone(),
                    )
                    .with_ref(mirror.git_ref.clone()))
                })
                .collect::<Result<Vec<_>, AssetMirrorError>>()?;

            let token = app_config
                .github
                .token
                .clone()
                .or_else(|| std::env::var(TOKEN_ENV).ok());

            Ok(ResolvedCommand::Sync(SyncParams {
                assets,
                mirrors,
                network: NetworkParams {
                    fetch_options,
                    parallelism,
                    api_url: app_config.github.api_url.clone(),
                    token,
                },
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_resolve_mirror_normalises_request() {
        let command = Command::Mirror {
            repository: "org/repo".to_string(),
            path: "/2.0/Sample/".to_string(),
            output_dir: "out".to_string(),
            git_ref: Some("main".to_string()),
            api_url: None,
            token: None,
        };

        let ResolvedCommand::Mirror(params) =
            resolve_command(command, HttpOverrides::default()).unwrap()
        else {
            panic!("expected mirror command");
        };

        assert_eq!(params.request.remote_subdir, "2.0/Sample");
        assert_eq!(params.request.git_ref.as_deref(), Some("main"));
        assert_eq!(params.request.local_root, PathBuf::from("out"));
        assert_eq!(params.network.api_url, "https://api.github.com");
        assert_eq!(params.network.fetch_options.user_agent, "XY");
        assert_eq!(
            params.network.fetch_options.status_policy,
            StatusPolicy::Reject
        );
    }

    #[test]
    fn test_resolve_applies_http_overrides() {
        let command = Command::Fetch {
            url: "https://vulkan-tutorial.com/images/texture.jpg".to_string(),
            output_dir: "./assets/textures".to_string(),
        };
        let overrides = HttpOverrides {
            user_agent: Some("engine".to_string()),
            timeout_secs: Some(5),
            parallelism: Some(2),
            write_error_bodies: true,
        };

        let ResolvedCommand::Fetch(params) = resolve_command(command, overrides).unwrap() else {
            panic!("expected fetch command");
        };

        assert_eq!(params.network.fetch_options.user_agent, "engine");
        assert_eq!(params.network.fetch_options.timeout, Duration::from_secs(5));
        assert_eq!(params.network.parallelism, 2);
        assert_eq!(
            params.network.fetch_options.status_policy,
            StatusPolicy::WriteBody
        );
    }

    #[test]
    fn test_resolve_rejects_zero_parallelism() {
        let command = Command::Fetch {
            url: "https://example.com/a.png".to_string(),
            output_dir: ".".to_string(),
        };
        let overrides = HttpOverrides {
            parallelism: Some(0),
            ..Default::default()
        };

        assert!(matches!(
            resolve_command(command, overrides),
            Err(AssetMirrorError::CliArgumentValidation { .. })
        ));
    }

    #[test]
    fn test_resolve_rejects_malformed_repository() {
        let command = Command::Mirror {
            repository: "just-a-name".to_string(),
            path: String::new(),
            output_dir: "out".to_string(),
            git_ref: None,
            api_url: None,
            token: None,
        };

        assert!(matches!(
            resolve_command(command, HttpOverrides::default()),
            Err(AssetMirrorError::CliArgumentValidation { .. })
        ));
    }

    #[test]
    fn test_resolve_sync_rejects_empty_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assets.yaml");
        std::fs::write(&path, "http:\n  user_agent: XY\n").unwrap();

        let command = Command::Sync {
            config_path: path.to_str().unwrap().to_string(),
        };

        assert!(matches!(
            resolve_command(command, HttpOverrides::default()),
            Err(AssetMirrorError::EmptyConfig { .. })
        ));
    }
}
