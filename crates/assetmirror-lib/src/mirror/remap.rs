use super::types::{MirrorRequest, RemapError};
use crate::fetch::DownloadTask;
use reqwest::Url;
use std::path::{Path, PathBuf};

/// Maps a remote file path to its local directory and file name.
///
/// `remote_root` is stripped as a whole leading prefix on a segment boundary, so a later
/// segment that happens to repeat the root name is left alone.
pub fn remap_entry_path(
    entry_path: &str,
    remote_root: &str,
    local_root: &Path,
) -> Result<(PathBuf, String), RemapError> {
    let root = remote_root.trim_matches('/');
    let entry = entry_path.trim_start_matches('/');

    let remainder = if root.is_empty() {
        entry
    } else {
        entry
            .strip_prefix(root)
            .and_then(|rest| rest.strip_prefix('/'))
            .ok_or_else(|| RemapError::OutsideRoot {
                path: entry_path.to_string(),
                root: root.to_string(),
            })?
    };

    let mut segments: Vec<&str> = remainder
        .split('/')
        .filter(|segment| !segment.is_empty())
        .collect();

    if segments
        .iter()
        .any(|segment| *segment == "." || *segment == ".." || segment.contains('\\'))
    {
        return Err(RemapError::UnsafeSegment {
            path: entry_path.to_string(),
        });
    }

    let file_name = segments.pop().ok_or_else(|| RemapError::MissingFileName {
        path: entry_path.to_string(),
        root: root.to_string(),
    })?;

    let destination_dir = segments
        .iter()
        .fold(local_root.to_path_buf(), |dir, segment| dir.join(segment));

    Ok((destination_dir, file_name.to_string()))
}

pub fn download_task(
    entry_path: &str,
    download_url: &Url,
    request: &MirrorRequest,
) -> Result<DownloadTask, RemapError> {
    let (destination_dir, file_name) =
        remap_entry_path(entry_path, &request.remote_subdir, &request.local_root)?;
    Ok(DownloadTask {
        source_url: download_url.clone(),
        destination_dir,
        file_name,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn remap(entry: &str, root: &str) -> Result<(PathBuf, String), RemapError> {
        remap_entry_path(entry, root, Path::new("local"))
    }

    #[test]
    fn test_remap_file_at_root() {
        let (dir, name) = remap("2.0/Sample/model.gltf", "2.0/Sample").unwrap();
        assert_eq!(dir, PathBuf::from("local"));
        assert_eq!(name, "model.gltf");
    }

    #[test]
    fn test_remap_nested_file() {
        let (dir, name) = remap("2.0/Sample/textures/albedo.png", "2.0/Sample").unwrap();
        assert_eq!(dir, PathBuf::from("local").join("textures"));
        assert_eq!(name, "albedo.png");
    }

    #[test]
    fn test_remap_keeps_repeated_root_name() {
        let (dir, name) = remap("Sample/Sample/Sample.gltf", "Sample").unwrap();
        assert_eq!(dir, PathBuf::from("local").join("Sample"));
        assert_eq!(name, "Sample.gltf");
    }

    #[test]
    fn test_remap_ignores_root_slashes() {
        let (dir, name) = remap("2.0/Sample/textures/albedo.png", "/2.0/Sample/").unwrap();
        assert_eq!(dir, PathBuf::from("local").join("textures"));
        assert_eq!(name, "albedo.png");
    }

    #[test]
    fn test_remap_repository_root() {
        let (dir, name) = remap("2.0/Sample/model.gltf", "").unwrap();
        assert_eq!(dir, PathBuf::from("local").join("2.0").join("Sample"));
        assert_eq!(name, "model.gltf");
    }

    #[test]
    fn test_remap_rejects_partial_segment_prefix() {
        assert_eq!(
            remap("2.0/SampleExtra/model.gltf", "2.0/Sample"),
            Err(RemapError::OutsideRoot {
                path: "2.0/SampleExtra/model.gltf".to_string(),
                root: "2.0/Sample".to_string(),
            })
        );
    }

    #[test]
    fn test_remap_rejects_path_outside_root() {
        assert!(matches!(
            remap("other/model.gltf", "2.0/Sample"),
            Err(RemapError::OutsideRoot { .. })
        ));
    }

    #[test]
    fn test_remap_rejects_root_itself() {
        assert!(matches!(
            remap("2.0/Sample/", "2.0/Sample"),
            Err(RemapError::MissingFileName { .. })
        ));
    }

    #[test]
    fn test_remap_rejects_parent_segments() {
        assert!(matches!(
            remap("2.0/Sample/../../etc/passwd", "2.0/Sample"),
            Err(RemapError::UnsafeSegment { .. })
        ));
    }

    #[test]
    fn test_download_task_uses_request_root() {
        let request = MirrorRequest::new("org/repo".parse().unwrap(), "2.0/Sample", "out");
        let url = Url::parse("https://raw.example.com/org/repo/main/2.0/Sample/textures/albedo.png")
            .unwrap();

        let task = download_task("2.0/Sample/textures/albedo.png", &url, &request).unwrap();

        assert_eq!(task.source_url, url);
        assert_eq!(task.output_path(), PathBuf::from("out/textures/albedo.png"));
    }
}
