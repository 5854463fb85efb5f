use compta_client::ApiError;
use compta_kv::KVError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("storage: {0}")]
    Storage(#[from] KVError),

    #[error("http client: {0}")]
    Api(#[from] ApiError),
}
