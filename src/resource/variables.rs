//! Placeholder-name lists and their comma separated form encoding

use serde::{Deserialize, Deserializer};

/// Parse the comma separated form input into a list of placeholder names.
///
/// Splits on `,`, trims every piece and drops empty ones. Order is kept and
/// duplicates are left alone.
pub fn parse_variables(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(String::from)
        .collect()
}

/// Render a list back into the form input
pub fn join_variables(variables: &[String]) -> String {
    variables.join(", ")
}

/// Accept `null` or a missing field as an empty list
pub(crate) fn nullable_list<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<Vec<String>>::deserialize(deserializer)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_trims_and_drops_empties() {
        assert_eq!(
            parse_variables("user_name, accept_url"),
            vec!["user_name", "accept_url"]
        );
        assert_eq!(parse_variables(" a ,, b,  ,c "), vec!["a", "b", "c"]);
        assert!(parse_variables("").is_empty());
        assert!(parse_variables(" , ,").is_empty());
    }

    #[test]
    fn test_parse_keeps_order_and_duplicates() {
        assert_eq!(parse_variables("b, a, b"), vec!["b", "a", "b"]);
    }

    #[test]
    fn test_round_trip_example() {
        let input = "user_name, accept_url";
        let parsed = parse_variables(input);
        assert_eq!(join_variables(&parsed), input);
    }

    #[test]
    fn test_join_empty() {
        assert_eq!(join_variables(&[]), "");
    }
}
