//! Header normalization: raw worksheet headers to unique SQL-safe column names.

use regex::Regex;
use std::collections::HashMap;
use std::collections::HashSet;
use std::sync::LazyLock;

static INVALID_CHARACTERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^A-Za-z0-9_]").expect("Hardcode regex pattern"));

/// Turns raw header cells into column identifiers, one per position.
///
/// Blank headers become `column_{position}`, other characters outside
/// `[A-Za-z0-9_]` become `_`, names not starting with a letter get a `col_`
/// prefix, and repeated names are suffixed `_1`, `_2`, ... in encounter order.
///
/// Names are compared ASCII case-insensitively, like SQL identifiers, so `id`
/// and `ID` count as repeats. The first spelling is kept.
pub fn normalize<S: AsRef<str>>(headers: &[S]) -> Vec<String> {
    let mut counters = HashMap::<String, usize>::new();
    let mut used = HashSet::<String>::new();
    headers
        .iter()
        .enumerate()
        .map(|(position, header)| {
            let name = clean_column_name(header.as_ref(), position);
            let key = name.to_ascii_lowercase();
            let unique = if used.contains(&key) {
                let counter = counters.entry(key).or_insert(0);
                loop {
                    *counter += 1;
                    let candidate = format!("{name}_{counter}");
                    if !used.contains(&candidate.to_ascii_lowercase()) {
                        break candidate;
                    }
                }
            } else {
                name
            };
            used.insert(unique.to_ascii_lowercase());
            unique
        })
        .collect()
}

/// Cleans a single header without looking at its neighbours.
pub fn clean_column_name(header: &str, position: usize) -> String {
    let header = header.trim();
    if header.is_empty() {
        return format!("column_{position}");
    }
    let name = INVALID_CHARACTERS.replace_all(header, "_");
    if name.starts_with(|c: char| c.is_ascii_alphabetic()) {
        name.into_owned()
    } else {
        format!("col_{name}")
    }
}

/// Returns true if `name` could have been produced by [`normalize`].
pub fn is_valid_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if first.is_ascii_alphabetic() => chars.all(|c| c.is_ascii_alphanumeric() || c == '_'),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_headers_use_position() {
        assert_eq!(normalize(&["", "  ", "x"]), vec!["column_0", "column_1", "x"]);
        assert_eq!(normalize(&["a", "\t"]), vec!["a", "column_1"]);
    }

    #[test]
    fn test_leading_non_letter_gets_prefix() {
        assert_eq!(normalize(&["1st", "1st"]), vec!["col_1st", "col_1st_1"]);
        assert_eq!(normalize(&["_id"]), vec!["col__id"]);
        assert_eq!(normalize(&["%%"]), vec!["col___"]);
    }

    #[test]
    fn test_special_characters_become_underscores() {
        assert_eq!(normalize(&["Full Name", "Full Name"]), vec!["Full_Name", "Full_Name_1"]);
        assert_eq!(normalize(&["  e-mail (work) "]), vec!["e_mail__work_"]);
        assert_eq!(normalize(&["Größe"]), vec!["Gr__e"]);
    }

    #[test]
    fn test_duplicates_follow_encounter_order() {
        assert_eq!(
            normalize(&["b", "a", "b", "a", "b"]),
            vec!["b", "a", "b_1", "a_1", "b_2"]
        );
        assert_eq!(normalize(&["a b", "a-b", "a_b"]), vec!["a_b", "a_b_1", "a_b_2"]);
    }

    #[test]
    fn test_generated_suffix_never_collides() {
        assert_eq!(normalize(&["a", "a", "a_1"]), vec!["a", "a_1", "a_1_1"]);
        assert_eq!(normalize(&["a", "a_1", "a"]), vec!["a", "a_1", "a_2"]);
        assert_eq!(normalize(&["column_1", ""]), vec!["column_1", "column_1_1"]);
    }

    #[test]
    fn test_case_variants_are_repeats() {
        assert_eq!(normalize(&["id", "ID"]), vec!["id", "ID_1"]);
        assert_eq!(normalize(&["Name", "name", "NAME"]), vec!["Name", "name_1", "NAME_2"]);
        assert_eq!(normalize(&["a", "A", "a_1"]), vec!["a", "A_1", "a_1_1"]);
    }

    #[test]
    fn test_empty_input() {
        assert!(normalize::<&str>(&[]).is_empty());
    }

    #[test]
    fn test_output_is_valid_and_unique() {
        let headers = [
            "", "id", "ID", "id", " id ", "1", "1", "#", "#", "naïve", "a_1", "a", "a", "column_0",
            "Full Name", "Full_Name", "   ",
        ];
        let names = normalize(&headers);
        assert_eq!(names.len(), headers.len());
        assert!(names.iter().all(|name| is_valid_identifier(name)), "{names:?}");
        let distinct: HashSet<String> = names.iter().map(|name| name.to_ascii_lowercase()).collect();
        assert_eq!(distinct.len(), names.len(), "{names:?}");
    }

    #[test]
    fn test_idempotent_on_own_output() {
        let inputs: Vec<Vec<&str>> = vec![
            vec!["", "  ", "x"],
            vec!["1st", "1st"],
            vec!["Full Name", "Full Name", "Full Name"],
            vec!["a", "a", "a_1", "", "?"],
        ];
        for headers in inputs {
            let once = normalize(&headers);
            assert_eq!(normalize(&once), once);
        }
    }

    #[test]
    fn test_is_valid_identifier() {
        assert!(is_valid_identifier("a"));
        assert!(is_valid_identifier("Col_9"));
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("9a"));
        assert!(!is_valid_identifier("_a"));
        assert!(!is_valid_identifier("a-b"));
    }
}
