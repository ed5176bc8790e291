//! Chunked atomic batch writes.
//!
//! The record store caps how many operations one transaction may carry, so
//! large booking batches are split into bounded chunks committed strictly in
//! order. The first failing chunk aborts the remainder; whatever committed
//! stays committed and the failure reports exactly how far the batch got.
//! There is no automatic retry. Read-back verification is the caller's job.

use crate::domain::bookings::Booking;
use crate::error::ApiError;
use crate::store::BookingStore;

/// Matches the store's per-transaction operation ceiling
pub const DEFAULT_CHUNK_SIZE: usize = 500;

/// Result of a fully committed batch
#[derive(Debug, Clone, Copy)]
pub struct BatchCommitOutcome {
    pub committed_count: usize,
    pub chunk_count: usize,
}

pub struct BatchWriteCoordinator {
    chunk_size: usize,
}

impl BatchWriteCoordinator {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Commit `writes` in ordered chunks of at most `chunk_size`. On a chunk
    /// failure the remaining chunks are never attempted and the error carries
    /// the 0-based failing chunk index plus the count already committed.
    pub async fn commit(
        &self,
        store: &dyn BookingStore,
        writes: &[Booking],
    ) -> Result<BatchCommitOutcome, ApiError> {
        let mut committed_count = 0;
        let mut chunk_count = 0;

        for (chunk_index, chunk) in writes.chunks(self.chunk_size).enumerate() {
            if let Err(e) = store.insert_bookings(chunk).await {
                return Err(ApiError::PartialBatchFailure {
                    committed_count,
                    failed_chunk: chunk_index,
                    reason: e.to_string(),
                });
            }
            committed_count += chunk.len();
            chunk_count += 1;
        }

        Ok(BatchCommitOutcome {
            committed_count,
            chunk_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduling::test_support;
    use crate::store::testing::MockStore;
    use std::sync::atomic::Ordering;
    use uuid::Uuid;

    fn writes(count: usize) -> Vec<Booking> {
        (0..count)
            .map(|_| Booking {
                id: Uuid::new_v4(),
                ..test_support::booking()
            })
            .collect()
    }

    #[tokio::test]
    async fn splits_writes_into_ordered_chunks() {
        let store = MockStore::new();
        let coordinator = BatchWriteCoordinator::new(500);

        let outcome = coordinator.commit(&store, &writes(1200)).await.unwrap();

        assert_eq!(outcome.committed_count, 1200);
        assert_eq!(outcome.chunk_count, 3);
        assert_eq!(store.insert_chunk_calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn chunk_failure_aborts_the_remainder() {
        let store = MockStore::with_failing_chunk(1);
        let coordinator = BatchWriteCoordinator::new(500);

        let err = coordinator.commit(&store, &writes(1200)).await.unwrap_err();

        match err {
            ApiError::PartialBatchFailure {
                committed_count,
                failed_chunk,
                ..
            } => {
                assert_eq!(committed_count, 500);
                assert_eq!(failed_chunk, 1);
            }
            other => panic!("expected PartialBatchFailure, got {other:?}"),
        }
        // The third chunk is never attempted
        assert_eq!(store.insert_chunk_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn short_batch_commits_in_one_chunk() {
        let store = MockStore::new();
        let coordinator = BatchWriteCoordinator::new(500);

        let outcome = coordinator.commit(&store, &writes(7)).await.unwrap();

        assert_eq!(outcome.committed_count, 7);
        assert_eq!(outcome.chunk_count, 1);
    }

    #[tokio::test]
    async fn empty_batch_is_a_no_op() {
        let store = MockStore::new();
        let coordinator = BatchWriteCoordinator::new(500);

        let outcome = coordinator.commit(&store, &[]).await.unwrap();

        assert_eq!(outcome.committed_count, 0);
        assert_eq!(outcome.chunk_count, 0);
        assert_eq!(store.insert_chunk_calls.load(Ordering::SeqCst), 0);
    }
}
