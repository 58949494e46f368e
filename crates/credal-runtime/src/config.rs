use rand::SeedableRng;
use rand::rngs::StdRng;
use serde::Deserialize;

/// Run configuration for the sampling algorithm family.
///
/// Deserializes leniently: absent fields fall back to their defaults, so a
/// partial JSON override merges over [`SamplerConfig::default`].
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct SamplerConfig {
    /// Samples a one-time run draws before freezing its state.
    pub num_samples: u64,
    /// Fixed RNG seed; `None` seeds from the operating system.
    pub seed: Option<u64>,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            num_samples: 1000,
            seed: None,
        }
    }
}

impl SamplerConfig {
    pub fn new(num_samples: u64) -> Self {
        Self {
            num_samples,
            ..Self::default()
        }
    }

    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    pub(crate) fn rng(&self) -> StdRng {
        match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_merges_over_defaults() {
        let config = SamplerConfig::from_json(r#"{"num_samples": 50}"#).unwrap();
        assert_eq!(config.num_samples, 50);
        assert_eq!(config.seed, None);
    }

    #[test]
    fn empty_json_is_the_default() {
        assert_eq!(SamplerConfig::from_json("{}").unwrap(), SamplerConfig::default());
    }

    #[test]
    fn seeded_rngs_reproduce() {
        use rand::Rng;
        let config = SamplerConfig::new(1).with_seed(42);
        let a: f64 = config.rng().random();
        let b: f64 = config.rng().random();
        assert_eq!(a, b);
    }
}
