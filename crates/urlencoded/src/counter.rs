//! Parameter counting, the denial-of-service guard run before any key-value parsing.

use crate::config::ParameterLimit;
use memchr::memchr_iter;

/// Counts the `&` separators of `body`.
///
/// Returns `None` as soon as the running count reaches the ceiling of `limit`,
/// so a body with `n` separators is accepted only when `n < ceiling`. The scan
/// never allocates and stops at the separator that reaches the ceiling.
pub fn count_parameters(body: &[u8], limit: ParameterLimit) -> Option<usize> {
    let ceiling = match limit {
        ParameterLimit::Bounded(ceiling) => ceiling.get(),
        ParameterLimit::Unbounded => return Some(memchr_iter(b'&', body).count()),
    };

    let mut count = 0;
    for _ in memchr_iter(b'&', body) {
        count += 1;
        if count == ceiling {
            return None;
        }
    }

    Some(count)
}
