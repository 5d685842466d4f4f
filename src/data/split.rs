//! Sequential train/test splitting.
//!
//! Samples are never shuffled: the test set is always the most recent
//! segment, so no future information leaks into training.

use thiserror::Error;

/// Errors for dataset splitting
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SplitError {
    #[error("Need at least 2 samples, got {0}")]
    InsufficientSamples(usize),

    #[error("Train ratio must be in (0, 1), got {0}")]
    InvalidRatio(f64),

    #[error("Invalid split index {index} for {len} samples")]
    InvalidSplit { index: usize, len: usize },
}

/// Split ordered samples into a train prefix and a test suffix.
///
/// The split index is `floor(len * train_ratio)`; both sides must be non-empty.
pub fn split_sequential<T: Clone>(
    samples: &[T],
    train_ratio: f64,
) -> Result<(Vec<T>, Vec<T>), SplitError> {
    if samples.len() < 2 {
        return Err(SplitError::InsufficientSamples(samples.len()));
    }
    if !(train_ratio > 0.0 && train_ratio < 1.0) {
        return Err(SplitError::InvalidRatio(train_ratio));
    }

    let split_idx = (samples.len() as f64 * train_ratio).floor() as usize;
    if split_idx == 0 || split_idx >= samples.len() {
        return Err(SplitError::InvalidSplit {
            index: split_idx,
            len: samples.len(),
        });
    }

    Ok((samples[..split_idx].to_vec(), samples[split_idx..].to_vec()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_sequential() {
        let samples: Vec<i32> = (0..10).collect();
        let (train, test) = split_sequential(&samples, 0.7).unwrap();

        assert_eq!(train, vec![0, 1, 2, 3, 4, 5, 6]);
        assert_eq!(test, vec![7, 8, 9]);
    }

    #[test]
    fn test_split_is_prefix_suffix_partition() {
        let samples: Vec<i32> = (0..37).collect();
        for &ratio in &[0.1, 0.25, 0.5, 0.66, 0.9] {
            let (train, test) = split_sequential(&samples, ratio).unwrap();
            assert_eq!(train.len(), (37.0 * ratio) as usize);
            assert_eq!(train.len() + test.len(), samples.len());

            let joined: Vec<i32> = train.into_iter().chain(test).collect();
            assert_eq!(joined, samples);
        }
    }

    #[test]
    fn test_split_rejects_degenerate_index() {
        let samples = vec![1, 2, 3];
        // floor(3 * 0.2) == 0
        assert_eq!(
            split_sequential(&samples, 0.2).unwrap_err(),
            SplitError::InvalidSplit { index: 0, len: 3 }
        );
    }

    #[test]
    fn test_split_rejects_bad_input() {
        assert_eq!(
            split_sequential(&[1], 0.5).unwrap_err(),
            SplitError::InsufficientSamples(1)
        );
        assert!(matches!(
            split_sequential(&[1, 2, 3], 1.0),
            Err(SplitError::InvalidRatio(_))
        ));
        assert!(matches!(
            split_sequential(&[1, 2, 3], 0.0),
            Err(SplitError::InvalidRatio(_))
        ));
        assert!(matches!(
            split_sequential(&[1, 2, 3], f64::NAN),
            Err(SplitError::InvalidRatio(_))
        ));
    }
}
