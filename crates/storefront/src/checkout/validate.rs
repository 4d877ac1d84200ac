//! Step validators for the checkout wizard.
//!
//! Validators are pure: they look at a form and return a map of field
//! errors. An empty map means the step may advance. Messages are the exact
//! strings the forms render.

use std::collections::BTreeMap;

use fernway_core::ShippingMethodId;

use crate::models::{AddressFields, PersonalInfo};

use super::IdentityForm;

pub const MSG_EMAIL_REQUIRED: &str = "Email is required";
pub const MSG_PASSWORD_REQUIRED: &str = "Password is required";
pub const MSG_FIRST_NAME_REQUIRED: &str = "First name is required";
pub const MSG_LAST_NAME_REQUIRED: &str = "Last name is required";
pub const MSG_PHONE_REQUIRED: &str = "Phone number is required";
pub const MSG_PASSWORDS_DO_NOT_MATCH: &str = "Passwords do not match";
pub const MSG_ADDRESS_REQUIRED: &str = "Address is required";
pub const MSG_CITY_REQUIRED: &str = "City is required";
pub const MSG_POSTCODE_REQUIRED: &str = "Postcode is required";
pub const MSG_METHOD_REQUIRED: &str = "Please select a shipping method";

/// A form field that can carry a validation error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    Email,
    Password,
    ConfirmPassword,
    FirstName,
    LastName,
    Phone,
    Address,
    City,
    Postcode,
    ShippingMethod,
}

impl Field {
    /// The field's form name.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::Email => "email",
            Self::Password => "password",
            Self::ConfirmPassword => "confirm_password",
            Self::FirstName => "first_name",
            Self::LastName => "last_name",
            Self::Phone => "phone",
            Self::Address => "address",
            Self::City => "city",
            Self::Postcode => "postcode",
            Self::ShippingMethod => "shipping_method",
        }
    }
}

/// Field-keyed validation errors. Empty means valid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<Field, String>);

impl FieldErrors {
    /// No errors.
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    /// Whether the validated form may proceed.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failing fields.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// The message for one field, if it failed.
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    /// Record a failure.
    pub fn insert(&mut self, field: Field, message: impl Into<String>) {
        self.0.insert(field, message.into());
    }

    /// Iterate failures in field order.
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, msg)| (*field, msg.as_str()))
    }
}

fn blank(s: &str) -> bool {
    s.trim().is_empty()
}

/// Identity step, login mode: email and password non-empty.
#[must_use]
pub fn validate_login(form: &IdentityForm) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if blank(&form.email) {
        errors.insert(Field::Email, MSG_EMAIL_REQUIRED);
    }
    if blank(&form.password) {
        errors.insert(Field::Password, MSG_PASSWORD_REQUIRED);
    }
    errors
}

/// Identity step, signup mode: the login checks plus name, phone, and an
/// exact password confirmation match.
#[must_use]
pub fn validate_signup(form: &IdentityForm) -> FieldErrors {
    let mut errors = validate_login(form);
    if blank(&form.first_name) {
        errors.insert(Field::FirstName, MSG_FIRST_NAME_REQUIRED);
    }
    if blank(&form.last_name) {
        errors.insert(Field::LastName, MSG_LAST_NAME_REQUIRED);
    }
    if blank(&form.phone) {
        errors.insert(Field::Phone, MSG_PHONE_REQUIRED);
    }
    if form.confirm_password != form.password {
        errors.insert(Field::ConfirmPassword, MSG_PASSWORDS_DO_NOT_MATCH);
    }
    errors
}

/// Address form: address, city, postcode non-empty. Country is optional.
#[must_use]
pub fn validate_address(fields: &AddressFields) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if blank(&fields.address) {
        errors.insert(Field::Address, MSG_ADDRESS_REQUIRED);
    }
    if blank(&fields.city) {
        errors.insert(Field::City, MSG_CITY_REQUIRED);
    }
    if blank(&fields.zipcode) {
        errors.insert(Field::Postcode, MSG_POSTCODE_REQUIRED);
    }
    errors
}

/// Method step: a shipping method must be selected.
#[must_use]
pub fn validate_method(selected: Option<ShippingMethodId>) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if selected.is_none() {
        errors.insert(Field::ShippingMethod, MSG_METHOD_REQUIRED);
    }
    errors
}

/// Personal-info edit: all four fields non-empty. Runs on explicit save,
/// independent of step gating.
#[must_use]
pub fn validate_personal_info(info: &PersonalInfo) -> FieldErrors {
    let mut errors = FieldErrors::new();
    if blank(&info.first_name) {
        errors.insert(Field::FirstName, MSG_FIRST_NAME_REQUIRED);
    }
    if blank(&info.last_name) {
        errors.insert(Field::LastName, MSG_LAST_NAME_REQUIRED);
    }
    if blank(&info.email) {
        errors.insert(Field::Email, MSG_EMAIL_REQUIRED);
    }
    if blank(&info.phone) {
        errors.insert(Field::Phone, MSG_PHONE_REQUIRED);
    }
    errors
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_login_requires_email_and_password() {
        let errors = validate_login(&IdentityForm::default());
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get(Field::Email).unwrap(), "Email is required");
        assert_eq!(errors.get(Field::Password).unwrap(), "Password is required");
    }

    #[test]
    fn test_login_whitespace_is_blank() {
        let form = IdentityForm {
            email: "   ".to_string(),
            password: "hunter2".to_string(),
            ..IdentityForm::default()
        };
        let errors = validate_login(&form);
        assert_eq!(errors.len(), 1);
        assert!(errors.get(Field::Email).is_some());
    }

    #[test]
    fn test_signup_password_mismatch() {
        let form = IdentityForm {
            email: "mira@example.com".to_string(),
            password: "hunter2".to_string(),
            confirm_password: "hunter3".to_string(),
            first_name: "Mira".to_string(),
            last_name: "Holt".to_string(),
            phone: "2345550123".to_string(),
            ..IdentityForm::default()
        };
        let errors = validate_signup(&form);
        assert_eq!(errors.len(), 1);
        assert_eq!(
            errors.get(Field::ConfirmPassword).unwrap(),
            "Passwords do not match"
        );
    }

    #[test]
    fn test_signup_all_fields_required() {
        let errors = validate_signup(&IdentityForm::default());
        for field in [
            Field::Email,
            Field::Password,
            Field::FirstName,
            Field::LastName,
            Field::Phone,
        ] {
            assert!(errors.get(field).is_some(), "missing error for {field:?}");
        }
        // Two empty passwords match, so no confirm error.
        assert!(errors.get(Field::ConfirmPassword).is_none());
    }

    #[test]
    fn test_address_country_optional() {
        let fields = AddressFields {
            address: "14 Garden Row".to_string(),
            city: "Portland".to_string(),
            zipcode: "97201".to_string(),
            country: String::new(),
            shipping_method: None,
        };
        assert!(validate_address(&fields).is_empty());
    }

    #[test]
    fn test_address_required_fields() {
        let errors = validate_address(&AddressFields::default());
        assert_eq!(errors.get(Field::Address).unwrap(), "Address is required");
        assert_eq!(errors.get(Field::City).unwrap(), "City is required");
        assert_eq!(errors.get(Field::Postcode).unwrap(), "Postcode is required");
    }

    #[test]
    fn test_method_selection_required() {
        assert!(!validate_method(None).is_empty());
        assert!(validate_method(Some(ShippingMethodId::new(1))).is_empty());
    }

    #[test]
    fn test_field_names() {
        assert_eq!(Field::ConfirmPassword.name(), "confirm_password");
        assert_eq!(Field::ShippingMethod.name(), "shipping_method");
    }
}
