use crate::error::SkipReason;
use once_cell::sync::Lazy;
use regex::Regex;

// label(.label)+ where the last label is alphabetic and at least two long
static DOMAIN_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9-]+(\.[A-Za-z0-9-]+)*\.[A-Za-z]{2,}$")
        .expect("domain pattern is a valid regex")
});

/// Returns the domain part of `email`, or why the address was rejected.
///
/// The address must hold exactly one `@` with a non-empty local part, and the
/// domain must be a syntactically plausible host name. Surrounding whitespace
/// is ignored; letter case is preserved.
pub fn extract_domain(email: &str) -> Result<&str, SkipReason> {
    let email = email.trim();
    let (local, domain) = email.split_once('@').ok_or(SkipReason::MissingSeparator)?;
    if domain.contains('@') {
        return Err(SkipReason::MissingSeparator);
    }
    if local.is_empty() {
        return Err(SkipReason::EmptyLocalPart);
    }
    if !is_valid_domain(domain) {
        return Err(SkipReason::InvalidDomain(domain.to_string()));
    }
    Ok(domain)
}

pub fn is_valid_domain(domain: &str) -> bool {
    DOMAIN_PATTERN.is_match(domain)
}
