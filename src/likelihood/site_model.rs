use crate::likelihood::LikelihoodError;

/// Among-site rate variation as discrete rate categories.
///
/// Every category has a relative rate and a proportion (equal proportions).
/// A single category of rate 1 means no rate variation.
#[derive(Debug, Clone, PartialEq)]
pub struct SiteModel {
    rates: Vec<f64>,
    proportions: Vec<f64>,
}

impl Default for SiteModel {
    fn default() -> Self {
        Self::single()
    }
}

impl SiteModel {
    /// A single category of rate 1.
    pub fn single() -> Self {
        Self {
            rates: vec![1.0],
            proportions: vec![1.0],
        }
    }

    /// Categories with the given relative `rates` in equal proportions.
    ///
    /// # Errors
    /// [LikelihoodError::InvalidModel] if there are no rates or a rate is negative.
    pub fn with_rates(rates: Vec<f64>) -> Result<Self, LikelihoodError> {
        if rates.is_empty() {
            return Err(LikelihoodError::InvalidModel("no rate categories".to_string()));
        }
        if rates.iter().any(|&r| !(r >= 0.0 && r.is_finite())) {
            return Err(LikelihoodError::InvalidModel(format!("invalid category rates: {rates:?}")));
        }
        let proportions = vec![1.0 / rates.len() as f64; rates.len()];
        Ok(Self { rates, proportions })
    }

    pub fn category_count(&self) -> usize {
        self.rates.len()
    }

    pub fn rate(&self, category: usize) -> f64 {
        self.rates[category]
    }

    pub fn proportion(&self, category: usize) -> f64 {
        self.proportions[category]
    }
}
