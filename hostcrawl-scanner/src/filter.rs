use crate::host::{DomainSuffix, Host};
use std::collections::HashSet;
use tracing::trace;

/// Reduce raw absolute links to the set of in-domain hosts.
///
/// Links that fail to parse or carry no host are skipped.
pub fn filter_links<I, S>(raw_links: I, suffix: &DomainSuffix) -> HashSet<Host>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    raw_links
        .into_iter()
        .filter_map(|link| match Host::parse(link.as_ref()) {
            Ok(host) => Some(host),
            Err(e) => {
                trace!("Skipping link: {}", e);
                None
            }
        })
        .filter(|host| suffix.matches(host))
        .collect()
}
