//! Version ordering for picking the newest release.

use std::cmp::Ordering;

/// Compare two version strings.
///
/// Versions that parse as semver (after stripping a leading `v`) are ordered
/// by semver and rank above every version that does not parse. Versions that
/// do not parse are ordered as plain strings. This is a total order, so the
/// maximum of a set does not depend on the order it is visited in.
pub fn compare(a: &str, b: &str) -> Ordering {
    let parse = |s: &str| semver::Version::parse(s.trim_start_matches('v')).ok();
    match (parse(a), parse(b)) {
        (Some(va), Some(vb)) => va.cmp(&vb),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

/// Return the newest version in `versions`, if any.
pub fn latest<'a, I>(versions: I) -> Option<&'a str>
where
    I: IntoIterator<Item = &'a str>,
{
    versions.into_iter().max_by(|a, b| compare(a, b))
}
