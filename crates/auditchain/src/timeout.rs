//! Bounded backend calls.

use std::future::Future;
use std::time::Duration;

use auditchain_store::Result as StoreResult;

use crate::error::{AuditError, Result};

/// Await a backend call for at most `after`, mapping both failure modes.
pub(crate) async fn bounded<T, F>(operation: &'static str, after: Duration, call: F) -> Result<T>
where
    F: Future<Output = StoreResult<T>>,
{
    match tokio::time::timeout(after, call).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(source)) => Err(AuditError::StorageUnavailable { operation, source }),
        Err(_) => Err(AuditError::Timeout { operation, after }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use auditchain_store::StoreError;

    #[tokio::test]
    async fn test_passes_value_through() {
        let value = bounded("count", Duration::from_secs(1), async { Ok(7u64) })
            .await
            .unwrap();
        assert_eq!(value, 7);
    }

    #[tokio::test]
    async fn test_maps_store_error() {
        let err = bounded::<(), _>("list", Duration::from_secs(1), async {
            Err(StoreError::Poisoned)
        })
        .await
        .unwrap_err();
        assert!(matches!(err, AuditError::StorageUnavailable { operation: "list", .. }));
    }

    #[tokio::test]
    async fn test_times_out() {
        let err = bounded::<(), _>("head", Duration::from_millis(10), async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        })
        .await
        .unwrap_err();
        assert!(matches!(err, AuditError::Timeout { operation: "head", .. }));
    }
}
