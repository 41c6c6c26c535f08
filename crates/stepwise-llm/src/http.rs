//! Retrying JSON POST shared by the HTTP providers

use backoff::{future::retry, ExponentialBackoff};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Serialize};
use std::time::Duration;

use crate::error::{ModelError, Result};

/// Upper bound on the time spent retrying transient failures
const MAX_RETRY_ELAPSED: Duration = Duration::from_secs(30);

/// POST `body` to `url` and decode the JSON reply
///
/// Server errors, rate limits and connection failures are retried with
/// exponential backoff. Client errors and request timeouts are permanent;
/// the decision loop owns the overall deadline.
pub(crate) async fn post_json<B, T>(
    client: &Client,
    url: &str,
    headers: &[(&str, &str)],
    body: &B,
    timeout: Duration,
) -> Result<T>
where
    B: Serialize + ?Sized,
    T: DeserializeOwned,
{
    let operation = || async {
        let mut request = client
            .post(url)
            .header("Content-Type", "application/json")
            .timeout(timeout)
            .json(body);
        for (name, value) in headers {
            request = request.header(*name, *value);
        }

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                backoff::Error::Permanent(ModelError::Timeout)
            } else {
                backoff::Error::Transient {
                    err: ModelError::HttpError(e),
                    retry_after: None,
                }
            }
        })?;

        let status = response.status();

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after_secs: Option<u64> = response
                .headers()
                .get("retry-after")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok());

            return Err(backoff::Error::Transient {
                err: ModelError::RateLimitExceeded(retry_after_secs),
                retry_after: retry_after_secs.map(Duration::from_secs),
            });
        }

        if status.is_server_error() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(backoff::Error::Transient {
                err: ModelError::api_error(format!("Server error: {}", error_text)),
                retry_after: None,
            });
        }

        if status.is_client_error() {
            let error_text = response.text().await.unwrap_or_default();
            return Err(backoff::Error::Permanent(ModelError::api_error(format!(
                "Client error ({}): {}",
                status, error_text
            ))));
        }

        response
            .json::<T>()
            .await
            .map_err(|e| backoff::Error::Permanent(ModelError::parse_error(e.to_string())))
    };

    let backoff_config = ExponentialBackoff {
        max_elapsed_time: Some(MAX_RETRY_ELAPSED),
        ..Default::default()
    };

    retry(backoff_config, operation).await
}

/// Trim a completion and reject empty text
pub(crate) fn non_empty(text: String) -> Result<String> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        Err(ModelError::EmptyResponse)
    } else {
        Ok(trimmed.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty() {
        assert_eq!(non_empty("  FINAL_ANSWER: 1\n".to_string()).unwrap(), "FINAL_ANSWER: 1");
        assert!(matches!(
            non_empty(" \n ".to_string()),
            Err(ModelError::EmptyResponse)
        ));
    }
}
