use diploma_store::StoreError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum KpiError {
    #[error("storage error: {0}")]
    Store(#[from] StoreError),
}
