//! Pure numeric routines used by each beam expansion.

use std::collections::HashSet;

/// Push the logits of every token in `seen` toward zero.
///
/// Positive logits are divided by `penalty`, the rest multiplied by it. Each
/// distinct id is penalized once no matter how often it occurs. Ids outside
/// the logits vector are ignored.
pub fn apply_repetition_penalty(logits: &mut [f32], seen: &[u32], penalty: f32) {
    let distinct: HashSet<u32> = seen.iter().copied().collect();
    for id in distinct {
        if let Some(logit) = logits.get_mut(id as usize) {
            *logit = if *logit > 0.0 {
                *logit / penalty
            } else {
                *logit * penalty
            };
        }
    }
}

/// Log-softmax with max subtraction.
pub fn log_softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let sum_exp: f32 = logits.iter().map(|&v| (v - max).exp()).sum();
    let log_sum_exp = max + sum_exp.ln();
    logits.iter().map(|&v| v - log_sum_exp).collect()
}

/// Whether appending `next` to `tokens` recreates an n-gram of size `n`
/// that already occurs in `tokens`.
pub fn would_repeat_ngram(tokens: &[u32], next: u32, n: usize) -> bool {
    if n == 0 || tokens.len() < n {
        return false;
    }
    let context = &tokens[tokens.len() - (n - 1)..];
    tokens
        .windows(n)
        .any(|window| window[n - 1] == next && window[..n - 1] == *context)
}

/// Every token that [`would_repeat_ngram`] rejects, computed in one pass.
pub fn banned_ngram_tokens(tokens: &[u32], n: usize) -> HashSet<u32> {
    if n == 0 || tokens.len() < n {
        return HashSet::new();
    }
    let context = &tokens[tokens.len() - (n - 1)..];
    tokens
        .windows(n)
        .filter(|window| window[..n - 1] == *context)
        .map(|window| window[n - 1])
        .collect()
}

/// `score / len^length_penalty`.
pub fn normalized_score(score: f32, len: usize, length_penalty: f32) -> f32 {
    score / (len as f32).powf(length_penalty)
}
