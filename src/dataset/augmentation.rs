//! Additive Gaussian noise augmentation
//!
//! Each channel of a window receives zero-mean noise whose standard
//! deviation is a fixed fraction of that channel's own standard deviation
//! within the window. Louder channels get proportionally more noise.

use rand::rngs::StdRng;
use rand_distr::{Distribution, Normal};

use crate::config::AugmentationConfig;
use crate::features::statistics::std_dev;

/// Add scaled Gaussian noise to every channel of a window in place
///
/// Draws are taken channel by channel, sample by sample, so the sequence
/// consumed from `rng` depends only on the window shape.
///
/// Channels with zero (or undefined) spread are left untouched.
pub fn add_relative_noise(window: &mut [Vec<f64>], config: &AugmentationConfig, rng: &mut StdRng) {
    for channel in window.iter_mut() {
        let sigma = config.relative_noise * std_dev(channel);
        if !(sigma > 0.0) || !sigma.is_finite() {
            continue;
        }
        // sigma is finite and positive here, so construction cannot fail
        let Ok(normal) = Normal::new(0.0, sigma) else {
            continue;
        };
        for x in channel.iter_mut() {
            *x += normal.sample(rng);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    fn window() -> Vec<Vec<f64>> {
        vec![
            (0..256).map(|i| (i as f64 * 0.1).sin()).collect(),
            (0..256).map(|i| 50.0 * (i as f64 * 0.1).sin()).collect(),
            vec![3.0; 256],
        ]
    }

    #[test]
    fn test_same_seed_same_noise() {
        let config = AugmentationConfig::default();
        let mut a = window();
        let mut b = window();
        add_relative_noise(&mut a, &config, &mut StdRng::seed_from_u64(7));
        add_relative_noise(&mut b, &config, &mut StdRng::seed_from_u64(7));
        assert_eq!(a, b);
        assert_ne!(a, window());
    }

    #[test]
    fn test_noise_scales_with_channel_spread() {
        let config = AugmentationConfig::default();
        let clean = window();
        let mut noisy = window();
        add_relative_noise(&mut noisy, &config, &mut StdRng::seed_from_u64(1));

        let residual_std = |c: usize| {
            let r: Vec<f64> = noisy[c].iter().zip(&clean[c]).map(|(n, x)| n - x).collect();
            std_dev(&r)
        };
        let quiet = residual_std(0);
        let loud = residual_std(1);

        assert!(loud > 20.0 * quiet, "loud {:.4} vs quiet {:.4}", loud, quiet);
        // 2% of the channel std (about 0.707) within sampling error
        assert!((quiet - 0.02 * std_dev(&clean[0])).abs() < 0.004, "quiet {:.5}", quiet);
    }

    #[test]
    fn test_constant_channel_untouched() {
        let mut w = window();
        add_relative_noise(&mut w, &AugmentationConfig::default(), &mut StdRng::seed_from_u64(3));
        assert!(w[2].iter().all(|&x| x == 3.0));
    }
}
