use std::cmp::Ordering;
use std::fmt;

/// Characters that separate numeric segments in a version string.
pub const VERSION_DELIMITERS: [char; 3] = ['.', '-', '_'];

/// A version parsed into its numeric segments.
///
/// Parsing never fails: segments that are not plain decimal numbers are
/// dropped, so `"1.x.3"` becomes `[1, 3]` and `"abc"` becomes `[]`.
/// Comparison treats a missing segment as `0`, which makes `"1.2"` equal to
/// `"1.2.0"` and an empty identifier equal to `"0"`.
#[derive(Debug, Clone, Default)]
pub struct VersionIdentifier {
    segments: Vec<u64>,
}

impl VersionIdentifier {
    #[must_use]
    pub fn parse(raw: &str) -> Self {
        let segments = raw
            .trim()
            .split(VERSION_DELIMITERS)
            .filter_map(parse_segment)
            .collect();
        Self { segments }
    }

    #[must_use]
    pub fn segments(&self) -> &[u64] {
        &self.segments
    }

    /// Segment at `index`, or `0` past the end of the identifier.
    #[must_use]
    pub fn segment(&self, index: usize) -> u64 {
        self.segments.get(index).copied().unwrap_or(0)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    fn padded_cmp(&self, other: &Self) -> Ordering {
        let len = self.segments.len().max(other.segments.len());
        (0..len)
            .map(|index| self.segment(index).cmp(&other.segment(index)))
            .find(|ordering| ordering.is_ne())
            .unwrap_or(Ordering::Equal)
    }
}

fn parse_segment(segment: &str) -> Option<u64> {
    if segment.is_empty() || !segment.bytes().all(|byte| byte.is_ascii_digit()) {
        return None;
    }
    segment.parse().ok()
}

impl PartialEq for VersionIdentifier {
    fn eq(&self, other: &Self) -> bool {
        self.padded_cmp(other).is_eq()
    }
}

impl Eq for VersionIdentifier {}

impl PartialOrd for VersionIdentifier {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for VersionIdentifier {
    fn cmp(&self, other: &Self) -> Ordering {
        self.padded_cmp(other)
    }
}

impl fmt::Display for VersionIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (index, segment) in self.segments.iter().enumerate() {
            if index > 0 {
                f.write_str(".")?;
            }
            write!(f, "{segment}")?;
        }
        Ok(())
    }
}

/// Strip surrounding whitespace and a single leading `v` from a release tag.
#[must_use]
pub fn strip_tag_prefix(tag: &str) -> &str {
    let tag = tag.trim();
    tag.strip_prefix('v').unwrap_or(tag).trim()
}

/// Whether `remote` is strictly newer than `local`.
///
/// Both strings are expected without a tag prefix. An unparseable `remote`
/// compares as all zeros and therefore never wins against a real version.
#[must_use]
pub fn is_newer_version(remote: &str, local: &str) -> bool {
    VersionIdentifier::parse(remote) > VersionIdentifier::parse(local)
}
