//! Query-string helpers shared by watcher endpoints.

use std::str::FromStr;

use crate::domain::query_signature::LIST_SEPARATOR;
use crate::error::TrackerError;

/// Raw query-string pairs in request order.
///
/// Kept as pairs rather than a map so that repeated keys such as
/// `activityTypes[]=swap&activityTypes[]=transfer` survive extraction.
pub type QueryPairs = Vec<(String, String)>;

/// Returns the last non-blank value for `name`.
#[must_use]
pub fn last_value<'a>(pairs: &'a [(String, String)], name: &str) -> Option<&'a str> {
    pairs
        .iter()
        .rev()
        .find(|(k, v)| k == name && !v.trim().is_empty())
        .map(|(_, v)| v.trim())
}

/// Parses the last value for `name` as `T`.
///
/// # Errors
///
/// Returns [`TrackerError::InvalidInput`] if the value is present but does
/// not parse.
pub fn parse_value<T: FromStr>(
    pairs: &[(String, String)],
    name: &str,
) -> Result<Option<T>, TrackerError> {
    last_value(pairs, name)
        .map(|raw| {
            raw.parse().map_err(|_| {
                TrackerError::InvalidInput(format!("{name} has an invalid value: {raw}"))
            })
        })
        .transpose()
}

/// Collects every value of a list parameter.
///
/// Accepts `name`, `name[]`, and comma-separated values in either form.
#[must_use]
pub fn list_values(pairs: &[(String, String)], name: &str) -> Vec<String> {
    let bracketed = format!("{name}[]");
    pairs
        .iter()
        .filter(|(k, _)| k == name || *k == bracketed)
        .flat_map(|(_, v)| v.split(LIST_SEPARATOR))
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(ToString::to_string)
        .collect()
}

#[cfg(test)]
#[allow(clippy::panic)]
mod tests {
    use super::*;

    fn pairs(raw: &[(&str, &str)]) -> QueryPairs {
        raw.iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn last_value_skips_blank() {
        let p = pairs(&[("userId", "u1"), ("userId", "  ")]);
        assert_eq!(last_value(&p, "userId"), Some("u1"));
        assert_eq!(last_value(&p, "walletAddress"), None);
    }

    #[test]
    fn list_values_accepts_all_forms() {
        let p = pairs(&[
            ("activityTypes[]", "swap"),
            ("activityTypes", "transfer, stake"),
            ("other", "x"),
        ]);
        assert_eq!(list_values(&p, "activityTypes"), vec!["swap", "transfer", "stake"]);
    }

    #[test]
    fn parse_value_reports_field() {
        let p = pairs(&[("pageSize", "ten")]);
        let Err(TrackerError::InvalidInput(msg)) = parse_value::<usize>(&p, "pageSize") else {
            panic!("expected invalid input");
        };
        assert!(msg.contains("pageSize"));
    }
}
