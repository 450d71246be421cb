// SPDX-License-Identifier: MIT
// Copyright (c) 2025 Leif Rydenfalk – https://github.com/Leif-Rydenfalk/cell

use crate::error::TransportError;
use std::future::Future;
use std::time::Duration;
use tracing::debug;

/// Upper bound on a single exchange.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Deadline(Duration);

impl Deadline {
    pub fn new(timeout: Duration) -> Self {
        Self(timeout)
    }

    pub fn duration(&self) -> Duration {
        self.0
    }

    /// Runs `f`, reporting `TransportError::Timeout` if it outlives the bound.
    /// The future is dropped on expiry.
    pub async fn execute<F, T>(&self, f: F) -> Result<T, TransportError>
    where
        F: Future<Output = Result<T, TransportError>>,
    {
        tokio::time::timeout(self.0, f).await.unwrap_or_else(|_| {
            debug!(timeout_ms = self.0.as_millis() as u64, "deadline expired");
            Err(TransportError::Timeout(self.0))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn fast_results_pass_through() {
        let deadline = Deadline::new(Duration::from_secs(1));
        assert_eq!(deadline.execute(async { Ok(5) }).await, Ok(5));
        assert_eq!(
            deadline.execute(async { Err::<u8, _>(TransportError::Closed) }).await,
            Err(TransportError::Closed)
        );
    }

    #[tokio::test]
    async fn slow_results_time_out() {
        let deadline = Deadline::new(Duration::from_millis(50));
        let slow = async {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(())
        };
        assert_eq!(deadline.execute(slow).await, Err(TransportError::Timeout(Duration::from_millis(50))));
    }
}
