//! Helper functions for radix tree operations

use crate::constants::{CATCH_ALL_MARKER, PARAM_MARKER, SEPARATOR};
use crate::errors::Error;

#[inline(always)]
pub fn is_wildcard(b: u8) -> bool {
    b == PARAM_MARKER || b == CATCH_ALL_MARKER
}

/// Number of `:`/`*` markers in a pattern.
pub fn count_wildcards(pattern: &str) -> usize {
    pattern.bytes().filter(|&b| is_wildcard(b)).count()
}

/// Length of the longest common byte prefix of `a` and `b`.
#[inline]
pub fn common_prefix_len(a: &[u8], b: &[u8]) -> usize {
    a.iter().zip(b).take_while(|(x, y)| x == y).count()
}

/// Index of the next `/` at or after `from`, or `bytes.len()`.
#[inline]
pub fn segment_end(bytes: &[u8], from: usize) -> usize {
    bytes[from..]
        .iter()
        .position(|&b| b == SEPARATOR)
        .map_or(bytes.len(), |p| from + p)
}

/// First wildcard in `path` as `(start, end)`, where `end` is the index of the
/// terminating `/` (or the path length).
pub fn find_wildcard(path: &[u8]) -> Option<(usize, usize)> {
    let start = path.iter().position(|&b| is_wildcard(b))?;
    Some((start, segment_end(path, start + 1)))
}

pub fn lossy(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).into_owned()
}

/// Checks the wildcard grammar of a whole pattern before the tree is touched.
pub fn validate_pattern(pattern: &str) -> Result<(), Error> {
    let bytes = pattern.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        let c = bytes[i];
        if !is_wildcard(c) {
            i += 1;
            continue;
        }

        let end = segment_end(bytes, i + 1);
        if bytes[i + 1..end].iter().any(|&b| is_wildcard(b)) {
            return Err(Error::MultipleWildcardsInSegment {
                pattern: pattern.to_owned(),
                segment: lossy(&bytes[i..end]),
            });
        }
        if end - i < 2 {
            return Err(Error::EmptyWildcardName {
                pattern: pattern.to_owned(),
            });
        }
        if c == CATCH_ALL_MARKER {
            if end != bytes.len() {
                return Err(Error::CatchAllNotAtEnd {
                    pattern: pattern.to_owned(),
                });
            }
            if i == 0 || bytes[i - 1] != SEPARATOR {
                return Err(Error::CatchAllMissingSlash {
                    pattern: pattern.to_owned(),
                });
            }
        }
        i = end;
    }
    Ok(())
}
