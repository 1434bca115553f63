use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("config error: {0}")]
    Config(String),

    #[error("storage error: {0}")]
    Lmdb(#[from] diploma_store_lmdb::LmdbError),

    #[error("store error: {0}")]
    Store(#[from] diploma_store::StoreError),

    #[error("metrics error: {0}")]
    Metrics(#[from] prometheus::Error),

    #[error("server error: {0}")]
    Server(#[from] diploma_rpc::RpcError),

    #[error("task failed: {0}")]
    Task(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
