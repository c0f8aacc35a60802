//! Table-name pluralization heuristic used to generate a default entity
//! name during promotion (§4.5). Deliberately simple English suffix rules
//! rather than a dictionary-backed pluralizer — collisions this heuristic
//! gets wrong are resolved by the merge service, not by making the
//! heuristic smarter.

pub fn pluralize(table_name: &str) -> String {
    let lower = table_name.to_ascii_lowercase();
    if let Some(stem) = lower.strip_suffix('y') {
        if !stem.ends_with(|c: char| "aeiou".contains(c)) {
            return format!("{stem}ies");
        }
    }
    if lower.ends_with('s')
        || lower.ends_with('x')
        || lower.ends_with("ch")
        || lower.ends_with("sh")
    {
        return format!("{lower}es");
    }
    format!("{lower}s")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn consonant_y_becomes_ies() {
        assert_eq!(pluralize("company"), "companies");
    }

    #[test]
    fn vowel_y_just_adds_s() {
        assert_eq!(pluralize("day"), "days");
    }

    #[test]
    fn s_x_ch_sh_take_es() {
        assert_eq!(pluralize("status"), "statuses");
        assert_eq!(pluralize("box"), "boxes");
        assert_eq!(pluralize("branch"), "branches");
        assert_eq!(pluralize("wish"), "wishes");
    }

    #[test]
    fn default_case_adds_s() {
        assert_eq!(pluralize("order"), "orders");
        assert_eq!(pluralize("user"), "users");
    }

    #[test]
    fn lowercases_input() {
        assert_eq!(pluralize("Customer"), "customers");
    }
}
