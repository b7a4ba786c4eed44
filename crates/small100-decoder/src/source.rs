//! The logits source the search pulls next-token scores from.

use async_trait::async_trait;
use futures::future::try_join_all;

use crate::errors::BoxError;

/// Produces next-token logits for a token sequence.
///
/// Implementations must be deterministic for a given sequence and must not
/// retain the slice. Calls for different beams in one step may run
/// concurrently.
#[async_trait]
pub trait LogitsSource: Send + Sync {
    /// Vocabulary-length logits for the token after `tokens`.
    async fn next_logits(&self, tokens: &[u32]) -> Result<Vec<f32>, BoxError>;

    /// Logits for several sequences at once, one row per input, in order.
    ///
    /// Default: runs [`LogitsSource::next_logits`] for every sequence
    /// concurrently. Backends that can batch should override this.
    async fn next_logits_batch(&self, sequences: &[&[u32]]) -> Result<Vec<Vec<f32>>, BoxError> {
        try_join_all(sequences.iter().map(|tokens| self.next_logits(tokens))).await
    }
}

/// [`LogitsSource`] backed by a synchronous closure.
pub struct FnSource<F> {
    f: F,
}

/// Wrap a closure as a [`LogitsSource`].
pub fn from_fn<F>(f: F) -> FnSource<F>
where
    F: Fn(&[u32]) -> Result<Vec<f32>, BoxError> + Send + Sync,
{
    FnSource { f }
}

#[async_trait]
impl<F> LogitsSource for FnSource<F>
where
    F: Fn(&[u32]) -> Result<Vec<f32>, BoxError> + Send + Sync,
{
    async fn next_logits(&self, tokens: &[u32]) -> Result<Vec<f32>, BoxError> {
        (self.f)(tokens)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn from_fn_forwards_tokens() {
        let source = from_fn(|tokens: &[u32]| Ok(vec![tokens.len() as f32; 3]));
        let logits = source.next_logits(&[2, 5]).await.unwrap();
        assert_eq!(logits, vec![2.0, 2.0, 2.0]);
    }

    #[tokio::test]
    async fn default_batch_keeps_order() {
        let source = from_fn(|tokens: &[u32]| Ok(vec![tokens[tokens.len() - 1] as f32]));
        let a: &[u32] = &[2, 7];
        let b: &[u32] = &[2, 9];
        let rows = source.next_logits_batch(&[a, b]).await.unwrap();
        assert_eq!(rows, vec![vec![7.0], vec![9.0]]);
    }

    #[tokio::test]
    async fn default_batch_calls_once_per_sequence() {
        let calls = AtomicUsize::new(0);
        let source = from_fn(|_: &[u32]| {
            let _ = calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![0.0])
        });
        let seq: &[u32] = &[2];
        let rows = source.next_logits_batch(&[seq, seq, seq]).await.unwrap();
        assert_eq!(rows.len(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn errors_propagate() {
        let source = from_fn(|_: &[u32]| Err("session closed".into()));
        let seq: &[u32] = &[2];
        let err = source.next_logits_batch(&[seq]).await.unwrap_err();
        assert_eq!(err.to_string(), "session closed");
    }

    #[tokio::test]
    async fn empty_batch() {
        let source = from_fn(|_: &[u32]| Ok(vec![1.0]));
        let rows = source.next_logits_batch(&[]).await.unwrap();
        assert!(rows.is_empty());
    }
}
