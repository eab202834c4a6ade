use bayline_core::error::CoreError;
use bayline_db::store::StoreError;

/// Error returned by the queue services.
///
/// Domain failures pass through as [`CoreError`]. Store failures carry the
/// operation and id that triggered them.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error(transparent)]
    Core(#[from] CoreError),

    #[error("{context}: {source}")]
    Store {
        context: String,
        #[source]
        source: StoreError,
    },
}

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Attach operation context to a store result.
pub(crate) trait StoreContext<T> {
    fn context<F>(self, context: F) -> ServiceResult<T>
    where
        F: FnOnce() -> String;
}

impl<T> StoreContext<T> for Result<T, StoreError> {
    fn context<F>(self, context: F) -> ServiceResult<T>
    where
        F: FnOnce() -> String,
    {
        self.map_err(|source| ServiceError::Store {
            context: context(),
            source,
        })
    }
}
