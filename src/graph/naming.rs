use regex::Regex;
use std::sync::LazyLock;

static INVALID_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^_0-9A-Za-z]").expect("static pattern"));

/// Rewrites `name` into a valid GraphQL name.
pub fn sanitize(name: &str) -> String {
    let cleaned = INVALID_NAME_CHARS.replace_all(name, "_");
    if cleaned.starts_with(|c: char| c.is_ascii_digit()) || cleaned.is_empty() {
        format!("_{}", cleaned)
    } else {
        cleaned.into_owned()
    }
}

pub fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

pub fn lower_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `User` + `address` → `UserAddress`
pub fn nested_type_name(parent: &str, field: &str) -> String {
    format!("{}{}", parent, upper_first(&sanitize(field)))
}

/// `User` + `status` → `UserStatusEnum`
pub fn enum_type_name(parent: &str, field: &str) -> String {
    format!("{}Enum", nested_type_name(parent, field))
}

pub fn embedded_type_name(model: &str) -> String {
    upper_first(&sanitize(model))
}

pub fn input_type_name(object: &str) -> String {
    format!("{}Input", object)
}

/// `User` + `profile.friends` → `UserProfileFriendsConnection`
pub fn connection_type_name(owner: &str, path: &str) -> String {
    format!("{}Connection", path_type_name(owner, path))
}

pub fn edge_type_name(owner: &str, path: &str) -> String {
    format!("{}Edge", path_type_name(owner, path))
}

fn path_type_name(owner: &str, path: &str) -> String {
    path.split('.')
        .fold(owner.to_string(), |acc, segment| nested_type_name(&acc, segment))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize() {
        assert_eq!(sanitize("first-name"), "first_name");
        assert_eq!(sanitize("2fa"), "_2fa");
        assert_eq!(sanitize("ok_Name1"), "ok_Name1");
    }

    #[test]
    fn test_type_names() {
        assert_eq!(nested_type_name("User", "address"), "UserAddress");
        assert_eq!(enum_type_name("UserAddress", "kind"), "UserAddressKindEnum");
        assert_eq!(connection_type_name("User", "profile.friends"), "UserProfileFriendsConnection");
        assert_eq!(edge_type_name("User", "friends"), "UserFriendsEdge");
        assert_eq!(lower_first("BlogPost"), "blogPost");
    }
}
