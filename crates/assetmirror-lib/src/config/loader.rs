use super::Config;
use crate::error::AssetMirrorError;
use config::Config as ConfigBuilder;

pub fn load_config(config_path: &str) -> Result<Config, AssetMirrorError> {
    let config_builder = ConfigBuilder::builder()
        .add_source(config::File::with_name(config_path))
        .build()?;

    config_builder.try_deserialize().map_err(Into::into)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::StatusPolicy;
    use std::path::PathBuf;

    fn write_config(contents: &str) -> (tempfile::TempDir, String) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("assets.yaml");
        std::fs::write(&path, contents).unwrap();
        (dir, path.to_str().unwrap().to_string())
    }

    #[test]
    fn test_load_config_applies_defaults() {
        let (_dir, path) = write_config(
            r#"
assets:
  - url: https://vulkan-tutorial.com/images/texture.jpg
    destination: ./assets/textures
"#,
        );

        let config = load_config(&path).unwrap();

        assert_eq!(config.http.user_agent, "XY");
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.http.parallelism, 8);
        assert_eq!(config.http.status_policy, StatusPolicy::Reject);
        assert_eq!(config.github.api_url, "https://api.github.com");
        assert!(config.github.token.is_none());
        assert_eq!(config.assets.len(), 1);
        assert_eq!(
            config.assets[0].destination,
            PathBuf::from("./assets/textures")
        );
        assert!(config.mirrors.is_empty());
    }

    #[test]
    fn test_load_config_reads_mirrors_and_overrides() {
        let (_dir, path) = write_config(
            r#"
http:
  user_agent: engine-assets
  status_policy: write_body
mirrors:
  - repository: KhronosGroup/glTF-Sample-Models
    path: 2.0/Sponza
    ref: main
    destination: ./assets/models/Sponza
"#,
        );

        let config = load_config(&path).unwrap();

        assert_eq!(config.http.user_agent, "engine-assets");
        assert_eq!(config.http.timeout_secs, 30);
        assert_eq!(config.http.status_policy, StatusPolicy::WriteBody);
        assert_eq!(config.mirrors.len(), 1);
        let mirror = &config.mirrors[0];
        assert_eq!(mirror.repository, "KhronosGroup/glTF-Sample-Models");
        assert_eq!(mirror.path, "2.0/Sponza");
        assert_eq!(mirror.git_ref.as_deref(), Some("main"));
    }

    #[test]
    fn test_load_config_rejects_unknown_fields() {
        let (_dir, path) = write_config(
            r#"
mirrors:
  - repository: org/repo
    destination: ./out
    recursive: true
"#,
        );

        assert!(matches!(
            load_config(&path),
            Err(AssetMirrorError::Config(_))
        ));
    }
}
