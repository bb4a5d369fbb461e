//! Name casing helpers shared by the builder and the emitter.

/// Split an identifier into words.
///
/// Boundaries are `_`, `-`, a lower-to-upper transition (`getItem`) and the
/// last capital of an acronym run (`HTMLPage` -> `HTML`, `Page`). Digits stay
/// attached to the preceding word.
pub fn split_words(s: &str) -> Vec<String> {
    let chars: Vec<char> = s.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' || c.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            continue;
        }

        if c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower)
            {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// `GetGreetings` -> `getGreetings`, `HTMLPage` -> `htmlPage`, `ID` -> `id`.
pub fn to_lower_camel(s: &str) -> String {
    let words = split_words(s);
    let mut out = String::with_capacity(s.len());
    for (i, word) in words.iter().enumerate() {
        if i == 0 {
            out.push_str(&word.to_lowercase());
        } else {
            out.push_str(&capitalize_first(word));
        }
    }
    out
}

/// `GetGreetings` -> `get_greetings`, `UserID` -> `user_id`.
pub fn to_snake_case(s: &str) -> String {
    split_words(s)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<Vec<_>>()
        .join("_")
}

/// Capitalize the first character of a string
pub fn capitalize_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first.to_uppercase().chain(chars).collect(),
    }
}

/// Join a namespace and a local name into a qualified name.
pub fn qualify(namespace: &str, name: &str) -> String {
    if namespace.is_empty() {
        name.to_string()
    } else {
        format!("{namespace}.{name}")
    }
}

/// True for identifiers made of letters, digits and `_`, not starting with a digit.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    chars
        .next()
        .is_some_and(|c| c.is_alphabetic() || c == '_')
        && chars.all(|c| c.is_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_words_handles_acronyms() {
        assert_eq!(split_words("HTMLPage"), vec!["HTML", "Page"]);
        assert_eq!(split_words("UserID"), vec!["User", "ID"]);
        assert_eq!(split_words("getItem"), vec!["get", "Item"]);
        assert_eq!(split_words("page_size"), vec!["page", "size"]);
        assert_eq!(split_words("Version2Info"), vec!["Version2", "Info"]);
    }

    #[test]
    fn test_to_lower_camel() {
        assert_eq!(to_lower_camel("GetGreetings"), "getGreetings");
        assert_eq!(to_lower_camel("HTMLPage"), "htmlPage");
        assert_eq!(to_lower_camel("ID"), "id");
        assert_eq!(to_lower_camel("NewCustomer"), "newCustomer");
        assert_eq!(to_lower_camel("UserID"), "userID");
    }

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("GetGreetings"), "get_greetings");
        assert_eq!(to_snake_case("UserID"), "user_id");
        assert_eq!(to_snake_case("Text"), "text");
    }

    #[test]
    fn test_qualify() {
        assert_eq!(qualify("pleasantries", "Greeting"), "pleasantries.Greeting");
        assert_eq!(qualify("", "Greeting"), "Greeting");
    }

    #[test]
    fn test_is_identifier() {
        assert!(is_identifier("Greeting"));
        assert!(is_identifier("_private2"));
        assert!(!is_identifier("2fast"));
        assert!(!is_identifier(""));
        assert!(!is_identifier("a.b"));
    }
}
