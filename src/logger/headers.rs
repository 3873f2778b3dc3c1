use crate::alignment::SitePatterns;
use crate::logger::SetupError;

/// Label used when no site labels are configured.
pub const DEFAULT_SITE_LABEL: &str = "site";

/// Derives one label per non-excluded site from the whitespace-separated `value`.
///
/// * no token: as if `value` were `site`
/// * a single token `t` with more than one non-excluded site: `t0, t1, ...`
/// * one token per site: the tokens of excluded sites are dropped
///
/// # Errors
/// [SetupError::HeaderMismatch] if the result does not have one label per non-excluded site.
///
/// # Example
/// ```
/// use stochmap::alignment::{Alignment, DataType, SitePatterns};
/// use stochmap::logger::site_headers;
///
/// let alignment = Alignment::from_sequences(DataType::Binary, [("a", "010"), ("b", "011")]).unwrap();
/// let patterns = SitePatterns::with_exclusion(&alignment, Some(0..1)).unwrap();
///
/// assert_eq!(site_headers("", &patterns).unwrap(), vec!["site0", "site1"]);
/// assert_eq!(site_headers("x y z", &patterns).unwrap(), vec!["y", "z"]);
/// ```
pub fn site_headers(value: &str, patterns: &SitePatterns) -> Result<Vec<String>, SetupError> {
    let included = patterns.included_site_count();
    let mut tokens: Vec<String> = value.split_whitespace().map(String::from).collect();
    if tokens.is_empty() {
        tokens.push(DEFAULT_SITE_LABEL.to_string());
    }

    let headers = if tokens.len() == 1 && included > 1 {
        (0..included).map(|i| format!("{}{}", tokens[0], i)).collect()
    } else if tokens.len() == patterns.site_count() {
        tokens
            .into_iter()
            .enumerate()
            .filter(|(site, _)| !patterns.is_site_excluded(*site))
            .map(|(_, token)| token)
            .collect()
    } else {
        tokens
    };

    if headers.len() != included {
        return Err(SetupError::HeaderMismatch {
            labels: headers.len(),
            sites: included,
        });
    }
    Ok(headers)
}
