use crate::ancestry::SamplingError;
use rand::Rng;

/// Draws an index with probability proportional to its weight.
///
/// Draws `u` uniformly from `[0, Σw)` and returns the smallest index whose
/// cumulative weight exceeds `u`. Weights need not be normalised.
///
/// # Errors
/// [SamplingError::DegenerateWeights] if a weight is negative or not finite,
/// or if all weights are zero.
///
/// # Example
/// ```
/// use rand::SeedableRng;
/// use rand_chacha::ChaCha8Rng;
/// use stochmap::ancestry::random_choice_pdf;
///
/// let mut rng = ChaCha8Rng::seed_from_u64(7);
/// assert_eq!(random_choice_pdf(&[0.0, 3.0, 0.0], &mut rng), Ok(1));
/// ```
pub fn random_choice_pdf<R: Rng + ?Sized>(weights: &[f64], rng: &mut R) -> Result<usize, SamplingError> {
    if weights.iter().any(|w| !(w.is_finite() && *w >= 0.0)) {
        return Err(SamplingError::DegenerateWeights(weights.to_vec()));
    }
    let total: f64 = weights.iter().sum();
    if !(total > 0.0 && total.is_finite()) {
        return Err(SamplingError::DegenerateWeights(weights.to_vec()));
    }

    let u = rng.random::<f64>() * total;
    let mut cumulative = 0.0;
    for (i, w) in weights.iter().enumerate() {
        cumulative += w;
        if u < cumulative {
            return Ok(i);
        }
    }

    // rounding left u at the very top; take the last index with mass
    weights
        .iter()
        .rposition(|&w| w > 0.0)
        .ok_or_else(|| SamplingError::DegenerateWeights(weights.to_vec()))
}
