use axum::Router;
use axum::body::Body;
use axum::extract::State;
use axum::http::header::{AUTHORIZATION, LINK, USER_AGENT};
use axum::http::{HeaderMap, StatusCode, Uri};
use axum::response::{IntoResponse, Redirect, Response};
use eyre::Result;
use futures::StreamExt;
use serde_json::{Value, json};
use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;

/// In-memory remote repository plus raw file host.
#[derive(Debug, Default, Clone)]
pub struct FixtureTree {
    files: BTreeMap<String, Vec<u8>>,
    dirs: BTreeSet<String>,
    failing_dirs: BTreeSet<String>,
    submodules: BTreeSet<String>,
    raw: BTreeMap<String, (StatusCode, Vec<u8>)>,
    trickled: BTreeMap<String, (Vec<Vec<u8>>, Duration)>,
    delays: BTreeMap<String, Duration>,
    page_size: Option<usize>,
}

impl FixtureTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a repository file; its ancestor directories are created implicitly.
    pub fn file(mut self, path: &str, contents: impl Into<Vec<u8>>) -> Self {
        self.add_ancestors(path);
        self.files.insert(path.to_string(), contents.into());
        self
    }

    pub fn dir(mut self, path: &str) -> Self {
        self.add_ancestors(path);
        self.dirs.insert(path.to_string());
        self
    }

    /// A directory whose listing fails with a rate-limit error.
    pub fn failing_dir(mut self, path: &str) -> Self {
        self.add_ancestors(path);
        self.dirs.insert(path.to_string());
        self.failing_dirs.insert(path.to_string());
        self
    }

    /// A submodule: listed without a download URL, and a bare object when listed directly.
    pub fn submodule(mut self, path: &str) -> Self {
        self.add_ancestors(path);
        self.submodules.insert(path.to_string());
        self
    }

    /// A file served under `/raw/<path>` only, outside any repository tree.
    pub fn raw(mut self, path: &str, status: StatusCode, body: impl Into<Vec<u8>>) -> Self {
        self.raw.insert(path.to_string(), (status, body.into()));
        self
    }

    /// A raw file streamed one chunk at a time, pausing `interval` before each chunk.
    pub fn trickled(mut self, path: &str, chunks: &[&str], interval: Duration) -> Self {
        let chunks = chunks.iter().map(|chunk| chunk.as_bytes().to_vec()).collect();
        self.trickled.insert(path.to_string(), (chunks, interval));
        self
    }

    /// Holds back the response for `/raw/<path>` by `delay`.
    pub fn delayed(mut self, path: &str, delay: Duration) -> Self {
        self.delays.insert(path.to_string(), delay);
        self
    }

    pub fn paginate(mut self, page_size: usize) -> Self {
        self.page_size = Some(page_size);
        self
    }

    fn add_ancestors(&mut self, path: &str) {
        let mut current = path;
        while let Some((parent, _)) = current.rsplit_once('/') {
            self.dirs.insert(parent.to_string());
            current = parent;
        }
    }

    fn children(&self, dir: &str) -> Vec<(String, EntryKind)> {
        let is_child = |path: &str| match path.rsplit_once('/') {
            Some((parent, _)) => parent == dir,
            None => dir.is_empty(),
        };
        let dirs = self
            .dirs
            .iter()
            .filter(|path| is_child(path.as_str()))
            .map(|path| (path.clone(), EntryKind::Dir));
        let submodules = self
            .submodules
            .iter()
            .filter(|path| is_child(path.as_str()))
            .map(|path| (path.clone(), EntryKind::Submodule));
        let files = self
            .files
            .keys()
            .filter(|path| is_child(path.as_str()))
            .map(|path| (path.clone(), EntryKind::File));
        dirs.chain(submodules).chain(files).collect()
    }
}

#[derive(Debug, Clone, Copy)]
enum EntryKind {
    Dir,
    Submodule,
    File,
}

fn entry_json(base_url: &str, path: &str, kind: EntryKind) -> Value {
    let name = path.rsplit('/').next().unwrap_or(path);
    match kind {
        EntryKind::Dir => json!({"name": name, "path": path, "type": "dir", "download_url": null}),
        EntryKind::Submodule => json!({
            "name": name,
            "path": path,
            "type": "submodule",
            "download_url": null,
            "submodule_git_url": format!("https://github.com/org/{name}.git"),
        }),
        EntryKind::File => json!({
            "name": name,
            "path": path,
            "type": "file",
            "download_url": format!("{base_url}/raw/{path}"),
        }),
    }
}

#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub path: String,
    pub query: Option<String>,
    pub user_agent: Option<String>,
    pub authorization: Option<String>,
}

struct FixtureState {
    tree: FixtureTree,
    base_url: String,
    requests: Mutex<Vec<RecordedRequest>>,
}

pub struct FixtureServer {
    pub base_url: String,
    state: Arc<FixtureState>,
    handle: JoinHandle<()>,
}

impl Drop for FixtureServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

impl FixtureServer {
    pub async fn spawn(tree: FixtureTree) -> Result<Self> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let base_url = format!("http://{}", listener.local_addr()?);

        let state = Arc::new(FixtureState {
            tree,
            base_url: base_url.clone(),
            requests: Mutex::new(Vec::new()),
        });
        let app = Router::new().fallback(route_request).with_state(state.clone());

        let handle = tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Ok(Self {
            base_url,
            state,
            handle,
        })
    }

    pub fn raw_url(&self, path: &str) -> String {
        format!("{}/raw/{}", self.base_url, path)
    }

    pub fn redirect_url(&self, path: &str) -> String {
        format!("{}/redirect/{}", self.base_url, path)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn listing_requests(&self) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|request| request.path.starts_with("/repos/"))
            .collect()
    }
}

fn header_string(headers: &HeaderMap, name: axum::http::HeaderName) -> Option<String> {
    headers
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

async fn route_request(State(state): State<Arc<FixtureState>>, uri: Uri, headers: HeaderMap) -> Response {
    state.requests.lock().unwrap().push(RecordedRequest {
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        user_agent: header_string(&headers, USER_AGENT),
        authorization: header_string(&headers, AUTHORIZATION),
    });

    let path = uri.path();
    if let Some(rest) = path.strip_prefix("/raw/") {
        if let Some(delay) = state.tree.delays.get(rest) {
            tokio::time::sleep(*delay).await;
        }
        return serve_raw(&state, rest);
    }
    if let Some(rest) = path.strip_prefix("/redirect/") {
        return Redirect::temporary(&format!("/raw/{rest}")).into_response();
    }
    if let Some(rest) = path.strip_prefix("/repos/") {
        let mut parts = rest.splitn(4, '/');
        let (Some(_owner), Some(_repo), Some("contents")) = (parts.next(), parts.next(), parts.next())
        else {
            return not_found();
        };
        let dir = parts.next().unwrap_or("").trim_end_matches('/');
        return serve_listing(&state, path, dir, page_number(uri.query()));
    }
    not_found()
}

fn not_found() -> Response {
    (
        StatusCode::NOT_FOUND,
        axum::Json(json!({"message": "Not Found"})),
    )
        .into_response()
}

fn page_number(query: Option<&str>) -> usize {
    query
        .into_iter()
        .flat_map(|q| q.split('&'))
        .find_map(|pair| pair.strip_prefix("page="))
        .and_then(|page| page.parse().ok())
        .unwrap_or(1)
}

fn serve_raw(state: &FixtureState, path: &str) -> Response {
    if let Some((chunks, interval)) = state.tree.trickled.get(path) {
        let interval = *interval;
        let body = futures::stream::iter(chunks.clone()).then(move |chunk| async move {
            tokio::time::sleep(interval).await;
            Ok::<_, std::io::Error>(chunk)
        });
        return Body::from_stream(body).into_response();
    }
    if let Some(contents) = state.tree.files.get(path) {
        return (StatusCode::OK, contents.clone()).into_response();
    }
    if let Some((status, body)) = state.tree.raw.get(path) {
        return (*status, body.clone()).into_response();
    }
    (StatusCode::NOT_FOUND, "404: Not Found").into_response()
}

fn serve_listing(state: &FixtureState, request_path: &str, dir: &str, page: usize) -> Response {
    let tree = &state.tree;
    if tree.submodules.contains(dir) {
        return axum::Json(entry_json(&state.base_url, dir, EntryKind::Submodule)).into_response();
    }
    if !dir.is_empty() && !tree.dirs.contains(dir) {
        return not_found();
    }
    if tree.failing_dirs.contains(dir) {
        return (
            StatusCode::FORBIDDEN,
            axum::Json(json!({"message": "API rate limit exceeded"})),
        )
            .into_response();
    }

    let entries: Vec<Value> = tree
        .children(dir)
        .into_iter()
        .map(|(path, kind)| entry_json(&state.base_url, &path, kind))
        .collect();

    let Some(page_size) = tree.page_size else {
        return axum::Json(Value::Array(entries)).into_response();
    };

    let start = (page - 1) * page_size;
    let chunk: Vec<Value> = entries.iter().skip(start).take(page_size).cloned().collect();
    let mut headers = HeaderMap::new();
    if start + page_size < entries.len() {
        let next = format!(
            "<{}{}?page={}>; rel=\"next\"",
            state.base_url,
            request_path,
            page + 1
        );
        if let Ok(value) = next.parse() {
            headers.insert(LINK, value);
        }
    }
    (headers, axum::Json(Value::Array(chunk))).into_response()
}

/// Relative paths of every file below `root`, sorted, with `/` separators.
pub fn collect_files(root: &Path) -> Result<Vec<String>> {
    fn walk(root: &Path, dir: &Path, out: &mut Vec<String>) -> Result<()> {
        for entry in std::fs::read_dir(dir)? {
            let path = entry?.path();
            if path.is_dir() {
                walk(root, &path, out)?;
            } else {
                let relative = path.strip_prefix(root)?;
                let segments: Vec<_> = relative
                    .components()
                    .map(|c| c.as_os_str().to_string_lossy().into_owned())
                    .collect();
                out.push(segments.join("/"));
            }
        }
        Ok(())
    }

    let mut files = Vec::new();
    if root.exists() {
        walk(root, root, &mut files)?;
    }
    files.sort();
    Ok(files)
}
