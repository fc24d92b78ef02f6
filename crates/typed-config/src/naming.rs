//! Conversion between declared field/constant names and the document's
//! lower-hyphen-case keys.

/// Convert a lower-camel-case declared name to lower-hyphen-case.
///
/// A separator is inserted at every lowercase-to-uppercase transition and
/// the result is lower-cased, so runs of capitals stay together:
/// `databaseUrl` becomes `database-url`, `APIKey` becomes `apikey`.
pub fn camel_to_kebab(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    let mut prev_lower = false;
    for ch in name.chars() {
        if ch.is_uppercase() && prev_lower {
            out.push('-');
        }
        prev_lower = ch.is_lowercase();
        out.extend(ch.to_lowercase());
    }
    out
}

/// Convert an upper-snake-case constant name to lower-hyphen-case.
///
/// Underscores between two alphanumeric characters become hyphens:
/// `MYSQL_DATABASE` becomes `mysql-database`.
pub fn constant_to_kebab(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len());
    for (i, &ch) in chars.iter().enumerate() {
        let between_alnum = i > 0
            && chars[i - 1].is_alphanumeric()
            && chars.get(i + 1).is_some_and(|next| next.is_alphanumeric());
        if ch == '_' && between_alnum {
            out.push('-');
        } else {
            out.extend(ch.to_lowercase());
        }
    }
    out
}

/// Resolve the document key for a declared field name. An explicit
/// override is used verbatim.
pub fn external_name(declared: &str, name_override: Option<&str>) -> String {
    match name_override {
        Some(name) => name.to_string(),
        None => camel_to_kebab(declared),
    }
}

#[cfg(test)]
mod tests {
    use super::{camel_to_kebab, constant_to_kebab, external_name};

    #[test]
    fn camel_case_names() {
        assert_eq!(camel_to_kebab("appName"), "app-name");
        assert_eq!(camel_to_kebab("databaseUrl"), "database-url");
        assert_eq!(camel_to_kebab("APIKey"), "apikey");
        assert_eq!(camel_to_kebab("host"), "host");
        assert_eq!(camel_to_kebab("maxPoolSize"), "max-pool-size");
    }

    #[test]
    fn constant_names() {
        assert_eq!(constant_to_kebab("MYSQL_DATABASE"), "mysql-database");
        assert_eq!(constant_to_kebab("DEBUG"), "debug");
        assert_eq!(constant_to_kebab("_LEADING"), "_leading");
        assert_eq!(constant_to_kebab("A__B"), "a__b");
    }

    #[test]
    fn override_is_verbatim() {
        assert_eq!(external_name("appName", Some("APP_Name")), "APP_Name");
        assert_eq!(external_name("appName", None), "app-name");
    }
}
