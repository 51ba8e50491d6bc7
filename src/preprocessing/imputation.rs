//! Missing-sample imputation
//!
//! Each missing (NaN) sample is replaced by the mean of the observed
//! samples of its channel over the entire recording. The means are taken
//! per file, not per training fold, so a file's later samples influence the
//! values imputed into its earlier windows.

use super::recording::Recording;

/// Per-channel mean imputation summary
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ImputationReport {
    /// Number of imputed samples per channel
    pub missing_per_channel: Vec<usize>,
}

impl ImputationReport {
    /// Total number of imputed samples
    pub fn total_missing(&self) -> usize {
        self.missing_per_channel.iter().sum()
    }
}

/// Replace NaN samples with their channel's observed mean
///
/// A channel with no observed sample at all is filled with 0.0.
pub fn impute_channel_means(recording: &mut Recording) -> ImputationReport {
    let names = recording.channel_names().to_vec();
    let mut report = ImputationReport::default();

    for (name, channel) in names.iter().zip(recording.channels_mut().iter_mut()) {
        let (sum, observed) = channel
            .iter()
            .filter(|v| !v.is_nan())
            .fold((0.0, 0usize), |(s, n), &v| (s + v, n + 1));
        let missing = channel.len() - observed;
        report.missing_per_channel.push(missing);

        if missing == 0 {
            continue;
        }

        let fill = if observed > 0 {
            sum / observed as f64
        } else {
            log::warn!("Channel {} has no observed samples, imputing 0.0", name);
            0.0
        };

        for v in channel.iter_mut().filter(|v| v.is_nan()) {
            *v = fill;
        }
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_imputes_whole_recording_mean() {
        let mut rec = Recording::new(
            vec!["a".to_string(), "b".to_string()],
            vec![vec![1.0, f64::NAN, 3.0, 8.0], vec![2.0, 2.0, 2.0, 2.0]],
        )
        .unwrap();

        let report = impute_channel_means(&mut rec);

        assert_eq!(report.missing_per_channel, vec![1, 0]);
        assert_eq!(rec.channel(0), &[1.0, 4.0, 3.0, 8.0]);
        assert_eq!(rec.channel(1), &[2.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn test_all_missing_channel_becomes_zero() {
        let mut rec =
            Recording::new(vec!["a".to_string()], vec![vec![f64::NAN, f64::NAN]]).unwrap();
        let report = impute_channel_means(&mut rec);
        assert_eq!(report.total_missing(), 2);
        assert_eq!(rec.channel(0), &[0.0, 0.0]);
    }
}
