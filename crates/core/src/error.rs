#[derive(Debug, thiserror::Error)]
pub enum PostError {
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("invalid post id: {0}")]
    InvalidPostId(String),
    #[error("invalid metadata key: {0}")]
    InvalidMetaKey(String),
    #[error("post not found: {0}")]
    PostNotFound(String),
    #[error("failed to create storage directory: {0}")]
    StorageDirCreation(std::io::Error),
    #[error("failed to create post directory: {0}")]
    PostDirCreation(std::io::Error),
    #[error(
        "create failed and cleanup also failed (path: {path}): create={create_error}; cleanup={cleanup_error}",
        path = path.display()
    )]
    CleanupAfterCreateFailed {
        path: std::path::PathBuf,
        #[source]
        create_error: Box<PostError>,
        cleanup_error: std::io::Error,
    },
    #[error("failed to write record file: {0}")]
    FileWrite(std::io::Error),
    #[error("failed to read record file: {0}")]
    FileRead(std::io::Error),
    #[error("failed to serialize record: {0}")]
    Serialization(serde_json::Error),
    #[error("failed to deserialize record: {0}")]
    Deserialization(serde_json::Error),
    #[error("{0}")]
    Text(#[from] postmeta_types::TextError),
}

pub type PostResult<T> = std::result::Result<T, PostError>;
