use crate::likelihood::LikelihoodError;

const FREQUENCY_TOLERANCE: f64 = 1e-6;

/// Equal-input substitution model (F81, or Jukes-Cantor with equal frequencies).
///
/// The instantaneous rate into state `j` is proportional to its equilibrium
/// frequency `π_j`; the rate matrix is normalised to one expected substitution
/// per unit of time and then scaled by `rate`. Transition probabilities are
/// `P_ij(t) = e^(-βt) δ_ij + (1 - e^(-βt)) π_j` with `β = rate / (1 - Σ π²)`.
#[derive(Debug, Clone, PartialEq)]
pub struct SubstitutionModel {
    frequencies: Vec<f64>,
    rate: f64,
    beta: f64,
}

impl SubstitutionModel {
    /// Model with equal frequencies over `state_count` states.
    pub fn equal_frequencies(state_count: usize) -> Result<Self, LikelihoodError> {
        Self::new(vec![1.0 / state_count as f64; state_count], 1.0)
    }

    /// Model with the given equilibrium `frequencies` and overall `rate`.
    ///
    /// # Errors
    /// [LikelihoodError::InvalidModel] if there are fewer than two states,
    /// a frequency is not positive, the frequencies do not sum to one,
    /// or the rate is not positive.
    pub fn new(frequencies: Vec<f64>, rate: f64) -> Result<Self, LikelihoodError> {
        if frequencies.len() < 2 {
            return Err(LikelihoodError::InvalidModel("at least two states are required".to_string()));
        }
        if frequencies.iter().any(|&f| !(f > 0.0 && f.is_finite())) {
            return Err(LikelihoodError::InvalidModel(format!("frequencies must be positive: {frequencies:?}")));
        }
        let total: f64 = frequencies.iter().sum();
        if (total - 1.0).abs() > FREQUENCY_TOLERANCE {
            return Err(LikelihoodError::InvalidModel(format!("frequencies sum to {total}, not 1")));
        }
        if !(rate > 0.0 && rate.is_finite()) {
            return Err(LikelihoodError::InvalidModel(format!("rate must be positive: {rate}")));
        }
        let homozygosity: f64 = frequencies.iter().map(|f| f * f).sum();
        Ok(Self {
            beta: 1.0 / (1.0 - homozygosity),
            frequencies,
            rate,
        })
    }

    pub fn state_count(&self) -> usize {
        self.frequencies.len()
    }

    pub fn frequencies(&self) -> &[f64] {
        &self.frequencies
    }

    pub fn rate(&self) -> f64 {
        self.rate
    }

    /// Writes the row-major transition matrix for time `distance` into `matrix`.
    pub fn transition_probabilities(&self, distance: f64, matrix: &mut [f64]) {
        let n = self.state_count();
        debug_assert_eq!(matrix.len(), n * n);
        let stay = (-self.beta * self.rate * distance).exp();
        for (i, row) in matrix.chunks_exact_mut(n).enumerate() {
            for (j, p) in row.iter_mut().enumerate() {
                *p = (1.0 - stay) * self.frequencies[j];
                if i == j {
                    *p += stay;
                }
            }
        }
    }
}
