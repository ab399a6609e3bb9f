// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Field rules shared by request bodies (`validator` custom functions).

use validator::ValidationError;

/// Characters that count toward the password's special-character rule.
pub const PASSWORD_SPECIALS: &str = "@$!%*?&";
pub const PASSWORD_MIN_LEN: usize = 8;

pub const PASSWORD_POLICY_MESSAGE: &str = "Password must be at least 8 characters and include uppercase, lowercase, a number, and a special character (@$!%*?&).";

pub const GENDERS: [&str; 2] = ["Male", "Female"];
pub const GUIDE_TYPES: [&str; 2] = ["Tour/Translator", "Tour/Translator/Transportation"];

/// Password policy: at least 8 characters drawn only from ASCII letters,
/// digits, and `@$!%*?&`, with at least one of each class.
pub fn password_meets_policy(password: &str) -> bool {
    let is_special = |c: char| PASSWORD_SPECIALS.contains(c);

    password.chars().count() >= PASSWORD_MIN_LEN
        && password
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || is_special(c))
        && password.chars().any(|c| c.is_ascii_lowercase())
        && password.chars().any(|c| c.is_ascii_uppercase())
        && password.chars().any(|c| c.is_ascii_digit())
        && password.chars().any(is_special)
}

pub fn validate_password(password: &str) -> Result<(), ValidationError> {
    if password_meets_policy(password) {
        Ok(())
    } else {
        Err(ValidationError::new("password_policy").with_message(PASSWORD_POLICY_MESSAGE.into()))
    }
}

pub fn validate_gender(gender: &str) -> Result<(), ValidationError> {
    one_of(gender, &GENDERS, "gender")
}

pub fn validate_guide_type(guide_type: &str) -> Result<(), ValidationError> {
    one_of(guide_type, &GUIDE_TYPES, "guide_type")
}

fn one_of(value: &str, allowed: &[&str], code: &'static str) -> Result<(), ValidationError> {
    if allowed.contains(&value) {
        Ok(())
    } else {
        Err(ValidationError::new(code))
    }
}
