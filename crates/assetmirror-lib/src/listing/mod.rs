mod github;
mod types;

pub use github::GithubContentsClient;
pub use types::{ListingError, ListingSource, RemoteEntry, RepositoryId};
