use std::sync::LazyLock;

use regex::Regex;

use super::ValidationErrors;
use crate::entities::user::NewUser;

static EMAIL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("static regex"));

pub const MIN_PASSWORD: usize = 6;

pub fn validate_user(u: &NewUser) -> Result<(), ValidationErrors> {
    let mut errs = ValidationErrors::default();

    let name = u.name.trim().chars().count();
    if name == 0 {
        errs.push("name", "Name is required");
    } else if !(2..=50).contains(&name) {
        errs.push("name", "Name must be between 2 and 50 characters");
    }

    let email = u.email.trim();
    if email.is_empty() {
        errs.push("email", "Email is required");
    } else if !EMAIL.is_match(email) {
        errs.push("email", "Please provide a valid email");
    }

    if u.password.is_empty() {
        errs.push("password", "Password is required");
    } else if u.password.chars().count() < MIN_PASSWORD {
        errs.push(
            "password",
            format!("Password must be at least {MIN_PASSWORD} characters"),
        );
    }

    if errs.is_empty() {
        Ok(())
    } else {
        Err(errs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::user::Role;

    fn user(name: &str, email: &str, password: &str) -> NewUser {
        NewUser {
            name: name.into(),
            email: email.into(),
            password: password.into(),
            role: Role::User,
        }
    }

    #[test]
    fn accepts_well_formed_user() {
        assert!(validate_user(&user("Bob", "bob@dealer.co.uk", "secret1")).is_ok());
    }

    #[test]
    fn reports_every_bad_field() {
        let errs = validate_user(&user("B", "not-an-email", "123")).unwrap_err();
        assert_eq!(errs.len(), 3);
        assert_eq!(errs.get("name"), Some("Name must be between 2 and 50 characters"));
        assert_eq!(errs.get("email"), Some("Please provide a valid email"));
        assert_eq!(errs.get("password"), Some("Password must be at least 6 characters"));
    }

    #[test]
    fn missing_fields_are_required() {
        let errs = validate_user(&user("", "", "")).unwrap_err();
        assert_eq!(errs.first().unwrap().message, "Name is required");
        assert_eq!(errs.get("password"), Some("Password is required"));
    }
}
