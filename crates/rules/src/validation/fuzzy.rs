//! Name suggestions and rule id conventions.

/// Closest candidate by edit distance, or `None` when nothing is within half
/// the longer string's length.
pub(crate) fn suggest<'a>(input: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let needle = input.trim().to_lowercase();
    let (best, dist) = candidates
        .into_iter()
        .map(|c| (c, edit_distance(&needle, &c.to_lowercase())))
        .min_by_key(|&(_, d)| d)?;

    let max_len = needle.chars().count().max(best.chars().count());
    (dist <= max_len / 2).then_some(best)
}

/// Levenshtein distance over chars.
pub(crate) fn edit_distance(a: &str, b: &str) -> usize {
    let a: Vec<char> = a.chars().collect();
    let b: Vec<char> = b.chars().collect();

    let mut prev: Vec<usize> = (0..=b.len()).collect();
    let mut curr = vec![0; b.len() + 1];

    for i in 1..=a.len() {
        curr[0] = i;
        for j in 1..=b.len() {
            let cost = usize::from(a[i - 1] != b[j - 1]);
            curr[j] = (prev[j] + 1).min(curr[j - 1] + 1).min(prev[j - 1] + cost);
        }
        std::mem::swap(&mut prev, &mut curr);
    }

    prev[b.len()]
}

/// `^[a-z0-9]+(-[a-z0-9]+)*$`
pub(crate) fn is_kebab_case(s: &str) -> bool {
    !s.is_empty()
        && s.split('-').all(|part| {
            !part.is_empty() && part.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit())
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    const PARAMETERS: &[&str] = &["age", "service_period", "join_date", "department", "location"];

    #[test]
    fn edit_distance_basic() {
        assert_eq!(edit_distance("kitten", "sitting"), 3);
        assert_eq!(edit_distance("", "abc"), 3);
        assert_eq!(edit_distance("age", "age"), 0);
    }

    #[test]
    fn suggest_finds_close_names() {
        assert_eq!(suggest("departmnt", PARAMETERS.iter().copied()), Some("department"));
        assert_eq!(suggest("Service_Period", PARAMETERS.iter().copied()), Some("service_period"));
    }

    #[test]
    fn suggest_rejects_distant_names() {
        assert_eq!(suggest("zzzzzzzzzzzz", PARAMETERS.iter().copied()), None);
        assert_eq!(suggest("x", std::iter::empty()), None);
    }

    #[test]
    fn kebab_case() {
        assert!(is_kebab_case("executive-age-band"));
        assert!(is_kebab_case("opd2024"));
        assert!(!is_kebab_case("Executive"));
        assert!(!is_kebab_case("a--b"));
        assert!(!is_kebab_case("-a"));
        assert!(!is_kebab_case("a_b"));
        assert!(!is_kebab_case(""));
    }
}
