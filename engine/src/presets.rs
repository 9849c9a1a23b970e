//! Ready-made schemas for the authentication screens.

use crate::schema::{FieldDef, FormSchema};

fn email() -> FieldDef {
    FieldDef::email("email")
        .label("Email")
        .placeholder("name@example.com")
}

fn password(label: &str, placeholder: &str) -> FieldDef {
    FieldDef::password("password")
        .label(label)
        .placeholder(placeholder)
}

fn confirm_password(label: &str, placeholder: &str) -> FieldDef {
    FieldDef::password("confirmPassword")
        .label(label)
        .placeholder(placeholder)
}

pub fn login() -> FormSchema {
    FormSchema::new(vec![email(), password("Password", "Enter your password")])
        .submit_text("Sign In")
        .show_reset(false)
}

pub fn register() -> FormSchema {
    FormSchema::new(vec![
        FieldDef::text("name").label("Name").placeholder("John Doe"),
        email(),
        password("Password", "Create a password"),
        confirm_password("Confirm Password", "Confirm your password"),
    ])
    .submit_text("Create Account")
    .show_reset(false)
}

pub fn forgot_password() -> FormSchema {
    FormSchema::new(vec![email()])
        .submit_text("Send Reset Link")
        .show_reset(false)
}

pub fn reset_password() -> FormSchema {
    FormSchema::new(vec![
        password("New Password", "Enter your new password"),
        confirm_password("Confirm New Password", "Confirm your new password"),
    ])
    .submit_text("Reset Password")
    .show_reset(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Form, FieldType, SubmitOutcome};
    use serde_json::json;

    #[test]
    fn presets_are_valid_schemas() {
        for schema in [login(), register(), forgot_password(), reset_password()] {
            schema.check().unwrap();
            assert!(!schema.show_reset);
        }
    }

    #[test]
    fn login_fields() {
        let schema = login();
        assert_eq!(schema.submit_text.as_deref(), Some("Sign In"));
        let names: Vec<_> = schema.fields.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, ["email", "password"]);
        assert_eq!(schema.fields[1].field_type(), FieldType::Password);
    }

    #[test]
    fn register_submits_all_fields() {
        let mut form = Form::new(register()).unwrap();
        form.set_value("name", "John Doe").unwrap();
        form.set_value("email", "test@example.com").unwrap();
        form.set_value("password", "password123").unwrap();
        form.set_value("confirmPassword", "password123").unwrap();

        let mut submitted = None;
        assert_eq!(
            form.submit(|v| submitted = Some(v.clone())),
            SubmitOutcome::Submitted
        );
        assert_eq!(
            submitted,
            Some(json!({
                "name": "John Doe",
                "email": "test@example.com",
                "password": "password123",
                "confirmPassword": "password123",
            }))
        );
    }

    #[test]
    fn forgot_password_rejects_malformed_email() {
        let mut form = Form::new(forgot_password()).unwrap();
        form.set_value("email", "not-an-email").unwrap();
        assert!(matches!(form.submit(|_| {}), SubmitOutcome::Invalid(_)));
        assert!(form.error("email").is_some());
    }
}
