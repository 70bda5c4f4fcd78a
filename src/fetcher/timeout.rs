//! Timeout wrapper for browser operations

use anyhow::Result;
use std::future::Future;
use std::time::Duration;

/// Bound a page operation, turning expiry into an error naming the operation
pub async fn with_page_timeout<F, T>(operation: F, timeout: Duration, operation_name: &str) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(timeout, operation).await {
        Ok(result) => result,
        Err(_) => Err(anyhow::anyhow!(
            "{operation_name} timeout after {:.1} seconds",
            timeout.as_secs_f64()
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn expiry_names_the_operation() {
        let err = with_page_timeout(
            async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                Ok(())
            },
            Duration::from_secs(1),
            "Screenshot",
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "Screenshot timeout after 1.0 seconds");
    }

    #[tokio::test]
    async fn inner_errors_pass_through() {
        let err = with_page_timeout(
            async { Err::<(), _>(anyhow::anyhow!("boom")) },
            Duration::from_secs(1),
            "Scroll",
        )
        .await
        .unwrap_err();
        assert_eq!(err.to_string(), "boom");
    }
}
