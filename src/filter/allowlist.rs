//! Allow-list of permitted domains.
//!
//! Built once at startup from a line-oriented text source and never
//! mutated afterwards, so lookups need no locking.

use std::io;
use std::path::Path;

use rustc_hash::FxHashSet;
use tracing::error;

use crate::dns::normalize_domain;

/// A set of permitted domains for efficient lookup.
///
/// Matching is exact and case-sensitive. `example.com` and `example.com.`
/// are the same entry.
#[derive(Debug, Default, Clone)]
pub struct Allowlist {
    domains: FxHashSet<String>,
}

impl Allowlist {
    /// Build an allow-list from raw text lines.
    ///
    /// Blank lines and `#` comments are skipped, a single trailing dot is
    /// stripped, duplicates collapse. No domain syntax validation is done.
    pub fn from_lines<I, S>(lines: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let domains = lines
            .into_iter()
            .filter_map(|line| {
                let line = line.as_ref().trim();
                if line.is_empty() || line.starts_with('#') {
                    return None;
                }
                let domain = normalize_domain(line);
                if domain.is_empty() {
                    return None;
                }
                Some(domain.to_string())
            })
            .collect();

        Self { domains }
    }

    /// Read an allow-list file.
    ///
    /// Bytes that are not valid UTF-8 are replaced rather than rejected, so
    /// one bad line cannot empty the whole list.
    pub fn read(path: &Path) -> io::Result<Self> {
        let bytes = std::fs::read(path)?;
        let contents = String::from_utf8_lossy(&bytes);

        Ok(Self::from_lines(contents.lines()))
    }

    /// Load an allow-list file, falling back to an empty list.
    ///
    /// An unreadable file denies everything instead of stopping the process.
    pub fn load(path: &Path) -> Self {
        match Self::read(path) {
            Ok(allowlist) => allowlist,
            Err(e) => {
                error!(
                    path = %path.display(),
                    error = %e,
                    "allow-list unreadable, denying all"
                );
                Self::default()
            }
        }
    }

    /// Check if a domain is permitted.
    pub fn contains(&self, domain: &str) -> bool {
        self.domains.contains(normalize_domain(domain))
    }

    /// Returns the number of domains in the allow-list.
    pub fn len(&self) -> usize {
        self.domains.len()
    }

    pub fn is_empty(&self) -> bool {
        self.domains.is_empty()
    }
}
