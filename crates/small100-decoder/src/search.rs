//! Beam-search decode loop.

use std::fmt;
use std::time::Instant;

use tokio_util::sync::CancellationToken;
use tracing::{debug, trace};

use crate::beam::Beam;
use crate::config::DecoderConfig;
use crate::errors::{DecodeError, Result};
use crate::logits::{apply_repetition_penalty, banned_ngram_tokens, log_softmax};
use crate::source::LogitsSource;

/// Why the decode loop ended.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StopReason {
    /// `max_new_tokens` generation steps ran.
    MaxSteps,
    /// Every beam finished.
    NoActiveBeams,
    /// The best finished beam already beats every active beam.
    EarlyStop,
}

impl StopReason {
    /// Stable lowercase name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MaxSteps => "max_steps",
            Self::NoActiveBeams => "no_active_beams",
            Self::EarlyStop => "early_stop",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The winning sequence and how the search got there.
#[derive(Clone, Debug, PartialEq)]
pub struct SearchOutcome {
    /// Winning token ids, seed tokens included.
    pub tokens: Vec<u32>,
    /// Cumulative log-probability of the winner.
    pub score: f32,
    /// Length-normalized score of the winner.
    pub normalized_score: f32,
    /// Whether the winner ends with EOS.
    pub finished: bool,
    /// Generation steps executed.
    pub steps: usize,
    /// Why the loop ended.
    pub stop: StopReason,
}

/// Beam-search decoder over an injected [`LogitsSource`].
///
/// Holds only its configuration; every call owns its own beam pools, so one
/// decoder can serve concurrent decodes.
#[derive(Clone, Debug)]
pub struct BeamSearchDecoder {
    config: DecoderConfig,
}

impl BeamSearchDecoder {
    /// Create a decoder, rejecting invalid configuration.
    pub fn new(config: DecoderConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self { config })
    }

    /// The decoder's configuration.
    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode up to `max_new_tokens` tokens after `start`.
    ///
    /// Returns the best sequence with `start` at the front.
    pub async fn decode<S>(
        &self,
        start: &[u32],
        max_new_tokens: usize,
        source: &S,
        cancel: &CancellationToken,
    ) -> Result<Vec<u32>>
    where
        S: LogitsSource + ?Sized,
    {
        Ok(self
            .search(start, max_new_tokens, source, cancel)
            .await?
            .tokens)
    }

    /// Like [`BeamSearchDecoder::decode`], with score and stop details.
    pub async fn search<S>(
        &self,
        start: &[u32],
        max_new_tokens: usize,
        source: &S,
        cancel: &CancellationToken,
    ) -> Result<SearchOutcome>
    where
        S: LogitsSource + ?Sized,
    {
        let seed = Beam::seed(start.to_vec());
        if seed.is_empty() {
            return Err(DecodeError::EmptyStart);
        }

        let started = Instant::now();
        let length_penalty = self.config.length_penalty;
        let mut active = vec![seed];
        let mut finished: Vec<Beam> = Vec::new();
        let mut steps = 0;
        let mut stop = StopReason::MaxSteps;

        while steps < max_new_tokens {
            if cancel.is_cancelled() {
                debug!(steps, "beam search cancelled");
                return Err(DecodeError::Cancelled { steps });
            }
            if active.is_empty() {
                stop = StopReason::NoActiveBeams;
                break;
            }
            if self.should_stop_early(&finished, &active) {
                stop = StopReason::EarlyStop;
                break;
            }

            let sequences: Vec<&[u32]> = active.iter().map(Beam::tokens).collect();
            let rows = source
                .next_logits_batch(&sequences)
                .await
                .map_err(DecodeError::Logits)?;
            if rows.len() != active.len() {
                return Err(DecodeError::BatchSize {
                    expected: active.len(),
                    actual: rows.len(),
                });
            }

            let mut candidates = Vec::new();
            for (beam, logits) in active.iter().zip(rows) {
                candidates.extend(self.expand(beam, logits));
            }
            sort_by_normalized_score(&mut candidates, length_penalty);
            active = self.distribute(candidates, &mut finished);
            steps += 1;

            trace!(
                step = steps,
                active = active.len(),
                finished = finished.len(),
                "beam step"
            );
        }

        let finished_count = finished.len();
        let outcome = match select_best(finished, active, length_penalty) {
            Some(best) => SearchOutcome {
                score: best.score(),
                normalized_score: best.normalized_score(length_penalty),
                finished: best.is_finished(),
                tokens: best.into_tokens(),
                steps,
                stop,
            },
            None => SearchOutcome {
                tokens: start.to_vec(),
                score: 0.0,
                normalized_score: 0.0,
                finished: false,
                steps,
                stop,
            },
        };

        debug!(
            steps,
            stop = %stop,
            beams = self.config.num_beams,
            finished = finished_count,
            output_len = outcome.tokens.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "beam search complete"
        );
        Ok(outcome)
    }

    /// Stop once enough beams finished and the best of them beats every active beam.
    fn should_stop_early(&self, finished: &[Beam], active: &[Beam]) -> bool {
        if finished.len() < self.config.num_beams {
            return false;
        }
        let length_penalty = self.config.length_penalty;
        let Some(best_finished) = finished.first() else {
            return false;
        };
        let best_active = active
            .iter()
            .map(|beam| beam.normalized_score(length_penalty))
            .fold(f32::NEG_INFINITY, f32::max);
        best_finished.normalized_score(length_penalty) > best_active
    }

    /// Expand one beam into its top `2 × num_beams` successors.
    fn expand(&self, beam: &Beam, mut logits: Vec<f32>) -> Vec<Beam> {
        let config = &self.config;
        apply_repetition_penalty(&mut logits, beam.tokens(), config.repetition_penalty);
        let log_probs = log_softmax(&logits);

        let suppress_eos = beam.len() <= 1;
        let banned = banned_ngram_tokens(beam.tokens(), config.no_repeat_ngram_size);

        let mut scored: Vec<(u32, f32)> = log_probs
            .iter()
            .enumerate()
            .map(|(i, &log_prob)| (i as u32, log_prob))
            .filter(|(id, _)| !(suppress_eos && *id == config.eos_token_id))
            .filter(|(id, _)| !banned.contains(id))
            .collect();
        top_k(&mut scored, config.candidates_per_beam());

        scored
            .into_iter()
            .map(|(id, log_prob)| beam.extend(id, log_prob, config.eos_token_id))
            .collect()
    }

    /// Route sorted candidates into the finished pool and the next active pool.
    fn distribute(&self, candidates: Vec<Beam>, finished: &mut Vec<Beam>) -> Vec<Beam> {
        let num_beams = self.config.num_beams;
        let length_penalty = self.config.length_penalty;
        let mut next = Vec::new();

        for candidate in candidates {
            if candidate.is_finished() {
                insert_sorted(finished, candidate, length_penalty);
            } else if next.len() < num_beams {
                next.push(candidate);
            }
            if next.len() >= num_beams && finished.len() >= num_beams {
                break;
            }
        }
        next
    }
}

/// Keep the `k` highest log-probabilities, sorted descending; ties go to the lower id.
fn top_k(scored: &mut Vec<(u32, f32)>, k: usize) {
    let order = |a: &(u32, f32), b: &(u32, f32)| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0));
    if k == 0 {
        scored.clear();
        return;
    }
    if k < scored.len() {
        let _ = scored.select_nth_unstable_by(k - 1, order);
        scored.truncate(k);
    }
    scored.sort_by(order);
}

fn sort_by_normalized_score(beams: &mut [Beam], length_penalty: f32) {
    beams.sort_by(|a, b| {
        b.normalized_score(length_penalty)
            .total_cmp(&a.normalized_score(length_penalty))
    });
}

/// Insert after every beam scoring at least as high.
fn insert_sorted(pool: &mut Vec<Beam>, beam: Beam, length_penalty: f32) {
    let score = beam.normalized_score(length_penalty);
    let idx = pool.partition_point(|b| b.normalized_score(length_penalty) >= score);
    pool.insert(idx, beam);
}

fn select_best(finished: Vec<Beam>, active: Vec<Beam>, length_penalty: f32) -> Option<Beam> {
    let mut all = finished;
    all.extend(active);
    sort_by_normalized_score(&mut all, length_penalty);
    all.into_iter().next()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::from_fn;
    use assert_matches::assert_matches;

    const EOS: u32 = 2;

    fn config(num_beams: usize, ngram: usize) -> DecoderConfig {
        DecoderConfig {
            eos_token_id: EOS,
            num_beams,
            length_penalty: 1.0,
            repetition_penalty: 1.0,
            no_repeat_ngram_size: ngram,
        }
    }

    fn one_hot(vocab: usize, hot: u32) -> Vec<f32> {
        let mut logits = vec![-100.0; vocab];
        logits[hot as usize] = 100.0;
        logits
    }

    #[test]
    fn new_rejects_invalid_config() {
        let result = BeamSearchDecoder::new(config(0, 0));
        assert_matches!(result, Err(DecodeError::InvalidConfig(_)));
    }

    #[test]
    fn top_k_orders_and_breaks_ties_by_id() {
        let mut scored = vec![(0, -1.0), (1, -0.5), (2, -0.5), (3, -3.0), (4, -0.1)];
        top_k(&mut scored, 3);
        assert_eq!(scored, vec![(4, -0.1), (1, -0.5), (2, -0.5)]);
    }

    #[test]
    fn top_k_larger_than_input() {
        let mut scored = vec![(0, -2.0), (1, -1.0)];
        top_k(&mut scored, 10);
        assert_eq!(scored, vec![(1, -1.0), (0, -2.0)]);
    }

    #[test]
    fn insert_sorted_keeps_descending_order() {
        let mut pool = Vec::new();
        let seed = Beam::seed(vec![EOS]);
        insert_sorted(&mut pool, seed.extend(5, -2.0, EOS), 1.0);
        insert_sorted(&mut pool, seed.extend(6, -1.0, EOS), 1.0);
        insert_sorted(&mut pool, seed.extend(7, -3.0, EOS), 1.0);
        insert_sorted(&mut pool, seed.extend(8, -1.0, EOS), 1.0);
        let last: Vec<u32> = pool.iter().map(|b| b.tokens()[1]).collect();
        assert_eq!(last, vec![6, 8, 5, 7]);
    }

    #[test]
    fn expand_suppresses_eos_on_seed() {
        let decoder = BeamSearchDecoder::new(config(1, 0)).unwrap();
        let seed = Beam::seed(vec![EOS]);
        let out = decoder.expand(&seed, one_hot(5, EOS));
        assert!(out.iter().all(|b| b.tokens()[1] != EOS));
        assert_eq!(out.len(), 2);
    }

    #[test]
    fn expand_allows_eos_after_content() {
        let decoder = BeamSearchDecoder::new(config(1, 0)).unwrap();
        let beam = Beam::seed(vec![EOS]).extend(4, -0.1, EOS);
        let out = decoder.expand(&beam, one_hot(5, EOS));
        assert_eq!(out[0].tokens(), &[EOS, 4, EOS]);
        assert!(out[0].is_finished());
    }

    #[test]
    fn expand_blocks_ngram_candidates() {
        let decoder = BeamSearchDecoder::new(config(2, 2)).unwrap();
        let beam = Beam::seed(vec![EOS, 3, 4, 3]);
        let out = decoder.expand(&beam, one_hot(6, 4));
        assert!(out.iter().all(|b| b.tokens()[4] != 4));
    }

    #[test]
    fn expand_empty_logits_yields_nothing() {
        let decoder = BeamSearchDecoder::new(config(2, 0)).unwrap();
        let out = decoder.expand(&Beam::seed(vec![EOS]), Vec::new());
        assert!(out.is_empty());
    }

    #[tokio::test]
    async fn empty_start_rejected() {
        let decoder = BeamSearchDecoder::new(config(1, 0)).unwrap();
        let source = from_fn(|_: &[u32]| Ok(vec![0.0; 4]));
        let result = decoder
            .decode(&[], 4, &source, &CancellationToken::new())
            .await;
        assert_matches!(result, Err(DecodeError::EmptyStart));
    }

    #[tokio::test]
    async fn zero_steps_returns_seed() {
        let decoder = BeamSearchDecoder::new(config(3, 0)).unwrap();
        let source = from_fn(|_: &[u32]| Ok(vec![0.0; 4]));
        let outcome = decoder
            .search(&[EOS], 0, &source, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.tokens, vec![EOS]);
        assert_eq!(outcome.steps, 0);
        assert_eq!(outcome.stop, StopReason::MaxSteps);
    }

    #[tokio::test]
    async fn finished_beam_triggers_early_stop() {
        let decoder = BeamSearchDecoder::new(config(1, 0)).unwrap();
        let source = from_fn(|tokens: &[u32]| {
            if tokens.len() == 1 {
                Ok(one_hot(3, 1))
            } else {
                Ok(one_hot(3, EOS))
            }
        });
        let outcome = decoder
            .search(&[EOS], 50, &source, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.tokens, vec![EOS, 1, EOS]);
        assert!(outcome.finished);
        assert_eq!(outcome.stop, StopReason::EarlyStop);
        assert_eq!(outcome.steps, 2);
    }

    #[tokio::test]
    async fn all_finished_stops_with_no_active_beams() {
        // Unigram blocking leaves EOS as the only candidate on the second step.
        let decoder = BeamSearchDecoder::new(config(1, 1)).unwrap();
        let source = from_fn(|_: &[u32]| Ok(vec![0.0; 3]));
        let outcome = decoder
            .search(&[0], 50, &source, &CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(outcome.tokens, vec![0, 1, EOS]);
        assert_eq!(outcome.stop, StopReason::NoActiveBeams);
        assert_eq!(outcome.steps, 2);
    }

    #[tokio::test]
    async fn batch_size_mismatch_is_error() {
        struct Short;

        #[async_trait::async_trait]
        impl LogitsSource for Short {
            async fn next_logits(&self, _: &[u32]) -> std::result::Result<Vec<f32>, crate::BoxError> {
                Ok(vec![0.0; 4])
            }

            async fn next_logits_batch(
                &self,
                _: &[&[u32]],
            ) -> std::result::Result<Vec<Vec<f32>>, crate::BoxError> {
                Ok(Vec::new())
            }
        }

        let decoder = BeamSearchDecoder::new(config(1, 0)).unwrap();
        let result = decoder
            .decode(&[EOS], 4, &Short, &CancellationToken::new())
            .await;
        assert_matches!(
            result,
            Err(DecodeError::BatchSize {
                expected: 1,
                actual: 0
            })
        );
    }

    #[test]
    fn select_best_picks_highest_normalized_across_pools() {
        let seed = Beam::seed(vec![EOS]);
        let finished = vec![seed.extend(5, -1.0, EOS).extend(EOS, -2.0, EOS)];
        let active = vec![seed.extend(6, -0.4, EOS), seed.extend(7, -0.2, EOS)];
        let best = select_best(finished, active, 1.0).unwrap();
        assert_eq!(best.tokens(), &[EOS, 7]);
    }

    #[test]
    fn select_best_prefers_finished_on_tie() {
        let seed = Beam::seed(vec![EOS]);
        let finished = vec![seed.extend(EOS, -1.0, EOS)];
        let active = vec![seed.extend(6, -1.0, EOS)];
        let best = select_best(finished, active, 1.0).unwrap();
        assert!(best.is_finished());
    }

    #[test]
    fn select_best_empty_pools() {
        assert!(select_best(Vec::new(), Vec::new(), 1.0).is_none());
    }

    #[test]
    fn stop_reason_display() {
        assert_eq!(StopReason::MaxSteps.to_string(), "max_steps");
        assert_eq!(StopReason::NoActiveBeams.to_string(), "no_active_beams");
        assert_eq!(StopReason::EarlyStop.to_string(), "early_stop");
    }
}
