//! Client-side form validation.
//!
//! Each form collects every field error instead of stopping at the first one,
//! so the UI can render them inline. A form that fails validation is never
//! submitted.

use crate::shared::error::SharedError;
use crate::shared::monster::{CreateMonsterRequest, MonsterType, MAX_TYPES};
use crate::shared::user::{ChangePasswordRequest, LoginRequest, RegisterRequest};

/// Minimum password length accepted by every form
pub const MIN_PASSWORD_LEN: usize = 8;

pub type FieldErrors = Vec<SharedError>;

fn is_email(value: &str) -> bool {
    let mut parts = value.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && !value.chars().any(char::is_whitespace)
        && domain.split('.').count() >= 2
        && domain.split('.').all(|label| !label.is_empty())
}

fn check_email(errors: &mut FieldErrors, field: &str, value: &str) {
    if !is_email(value) {
        errors.push(SharedError::validation(field, "Enter a valid e-mail address"));
    }
}

fn check_password(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.chars().count() < MIN_PASSWORD_LEN {
        errors.push(SharedError::validation(
            field,
            format!("Password must have at least {} characters", MIN_PASSWORD_LEN),
        ));
    }
}

fn check_required(errors: &mut FieldErrors, field: &str, value: &str) {
    if value.trim().is_empty() {
        errors.push(SharedError::validation(field, "This field is required"));
    }
}

fn finish<T>(errors: FieldErrors, value: T) -> Result<T, FieldErrors> {
    if errors.is_empty() {
        Ok(value)
    } else {
        Err(errors)
    }
}

#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub email: String,
    pub password: String,
}

impl LoginForm {
    pub fn validate(&self) -> Result<LoginRequest, FieldErrors> {
        let mut errors = Vec::new();
        check_email(&mut errors, "email", self.email.trim());
        check_password(&mut errors, "password", &self.password);
        finish(
            errors,
            LoginRequest {
                email: self.email.trim().to_string(),
                password: self.password.clone(),
            },
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct RegisterForm {
    pub name: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

impl RegisterForm {
    pub fn validate(&self) -> Result<RegisterRequest, FieldErrors> {
        let mut errors = Vec::new();
        check_required(&mut errors, "name", &self.name);
        check_email(&mut errors, "email", self.email.trim());
        check_password(&mut errors, "password", &self.password);
        if self.password != self.confirm_password {
            errors.push(SharedError::validation("confirm_password", "Passwords do not match"));
        }
        finish(
            errors,
            RegisterRequest {
                name: self.name.trim().to_string(),
                email: self.email.trim().to_string(),
                password: self.password.clone(),
            },
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct ChangePasswordForm {
    pub current_password: String,
    pub new_password: String,
    pub confirm_password: String,
}

impl ChangePasswordForm {
    pub fn validate(&self) -> Result<ChangePasswordRequest, FieldErrors> {
        let mut errors = Vec::new();
        check_password(&mut errors, "current_password", &self.current_password);
        check_password(&mut errors, "new_password", &self.new_password);
        if self.new_password != self.confirm_password {
            errors.push(SharedError::validation("confirm_password", "Passwords do not match"));
        }
        finish(
            errors,
            ChangePasswordRequest {
                current_password: self.current_password.clone(),
                new_password: self.new_password.clone(),
            },
        )
    }
}

#[derive(Debug, Clone, Default)]
pub struct CreateMonsterForm {
    pub name: String,
    pub description: String,
    pub story: String,
    pub types: Vec<MonsterType>,
}

impl CreateMonsterForm {
    pub fn validate(&self) -> Result<CreateMonsterRequest, FieldErrors> {
        let mut errors = Vec::new();
        check_required(&mut errors, "name", &self.name);
        check_required(&mut errors, "description", &self.description);

        let mut types: Vec<MonsterType> = Vec::with_capacity(self.types.len());
        for t in &self.types {
            if !types.contains(t) {
                types.push(*t);
            }
        }
        if types.is_empty() {
            errors.push(SharedError::validation("types", "Select at least one type"));
        } else if types.len() > MAX_TYPES {
            errors.push(SharedError::validation(
                "types",
                format!("Select at most {} types", MAX_TYPES),
            ));
        }

        let story = self.story.trim();
        finish(
            errors,
            CreateMonsterRequest {
                name: self.name.trim().to_string(),
                description: self.description.trim().to_string(),
                story: (!story.is_empty()).then(|| story.to_string()),
                types,
            },
        )
    }
}
