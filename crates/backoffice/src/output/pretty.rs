//! Pretty output formatting.

use backoffice_core::storage::Page;

use crate::models::User;

/// Format a user for display.
pub fn format_user(user: &User) -> String {
    let mut output = format!("{}\n  ID: {}\n  Email: {}", user.name, user.id, user.email);
    if !user.permissions.is_empty() {
        output.push_str(&format!("\n  Permissions: {}", user.permissions.join(", ")));
    }
    output
}

/// Format a page of users for display.
pub fn format_users(page: &Page<User>) -> String {
    if page.data.is_empty() {
        return format!("No users found ({} total).", page.count);
    }
    let mut output = format!("USERS ({} of {})\n", page.data.len(), page.count);
    output.push_str(&"-".repeat(40));
    for user in &page.data {
        output.push_str(&format!("\n{}", format_user(user)));
        output.push('\n');
    }
    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ann() -> User {
        User {
            id: "u1".to_string(),
            name: "Ann".to_string(),
            email: "ann@example.com".to_string(),
            permissions: vec!["admin".to_string()],
        }
    }

    #[test]
    fn test_format_user() {
        assert_eq!(
            format_user(&ann()),
            "Ann\n  ID: u1\n  Email: ann@example.com\n  Permissions: admin"
        );
    }

    #[test]
    fn test_format_users_reports_total() {
        let page = Page { data: vec![ann()], count: 7 };
        assert!(format_users(&page).starts_with("USERS (1 of 7)\n"));
        assert_eq!(format_users(&Page::<User>::empty()), "No users found (0 total).");
    }
}
