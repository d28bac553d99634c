//! SELECT statement rewriting: row-cap (LIMIT) injection.
//!
//! The gateway protects itself and the client from unbounded result sets by
//! appending or tightening a trailing `LIMIT` clause. This is a regex-level
//! structural check, not SQL parsing: non-SELECT statements pass through
//! untouched so that e.g. `SHOW TABLES` never gains an invalid clause.

use once_cell::sync::Lazy;
use regex::Regex;

static BLOCK_COMMENTS: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)/\*.*?\*/").unwrap());
static TRAILING_LIMIT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s+LIMIT\s+(\d+)\s*$").unwrap());

/// Appends `LIMIT <cap>` to a SELECT statement, or tightens an existing
/// trailing `LIMIT n` when `n > cap`. Returns the rewritten statement and
/// whether the cap was applied.
///
/// Block comments are stripped before analysis so they cannot hide or fake a
/// limit clause, and a single trailing `;` is dropped to avoid producing
/// `...; LIMIT n`. A `cap <= 0` disables capping entirely.
pub fn add_limit(statement: &str, cap: i64) -> (String, bool) {
    if cap <= 0 {
        return (statement.to_string(), false);
    }

    let stripped = BLOCK_COMMENTS.replace_all(statement, "");
    let s = stripped.trim();
    let s = s.strip_suffix(';').unwrap_or(s).trim_end();

    let is_select = s.get(..6).map_or(false, |p| p.eq_ignore_ascii_case("SELECT"));
    if !is_select {
        return (s.to_string(), false);
    }

    if let Some(caps) = TRAILING_LIMIT.captures(s) {
        // An unparseable (overflowing) user limit is certainly above the cap.
        let user_limit: i64 = caps[1].parse().unwrap_or(i64::MAX);
        if user_limit <= cap {
            return (s.to_string(), false);
        }
        let clause = caps.get(0).expect("regex matched");
        return (format!("{} LIMIT {}", &s[..clause.start()], cap), true);
    }

    (format!("{} LIMIT {}", s, cap), true)
}
