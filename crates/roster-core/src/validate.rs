#![forbid(unsafe_code)]

//! Field rules for customer drafts.
//!
//! These are the rules the entry form enforces before submitting. The cache
//! coordinator never calls them: a draft that reaches it is sent as-is and
//! the server has the final word.

use std::fmt;
use std::sync::OnceLock;

use regex::Regex;

use crate::record::Record;

/// Which draft field a rule applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    Name,
    Email,
    Phone,
    Address,
}

impl Field {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
            Self::Address => "address",
        }
    }
}

/// One violated rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: Field,
    pub message: &'static str,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field.as_str(), self.message)
    }
}

impl std::error::Error for FieldError {}

const NAME_MIN: usize = 2;
const ADDRESS_MIN: usize = 5;

const EMAIL_PATTERN: &str = r"(?i)^[A-Z0-9._%+-]+@[A-Z0-9.-]+\.[A-Z]{2,}$";
const PHONE_PATTERN: &str = r"^[0-9\-+() ]{10,}$";

fn compiled(cell: &'static OnceLock<Option<Regex>>, pattern: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(pattern).ok()).as_ref()
}

fn email_regex() -> Option<&'static Regex> {
    static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&EMAIL, EMAIL_PATTERN)
}

fn phone_regex() -> Option<&'static Regex> {
    static PHONE: OnceLock<Option<Regex>> = OnceLock::new();
    compiled(&PHONE, PHONE_PATTERN)
}

/// Check every field of a draft; returns all violations, first per field.
pub fn validate_draft(draft: &Record) -> Result<(), Vec<FieldError>> {
    let errors: Vec<FieldError> = [
        check_name(&draft.name),
        check_email(&draft.email),
        check_phone(&draft.phone),
        check_address(&draft.address),
    ]
    .into_iter()
    .flatten()
    .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn fail(field: Field, message: &'static str) -> Option<FieldError> {
    Some(FieldError { field, message })
}

fn check_name(name: &str) -> Option<FieldError> {
    if name.is_empty() {
        return fail(Field::Name, "Name is required");
    }
    if name.chars().count() < NAME_MIN {
        return fail(Field::Name, "Name must be at least 2 characters");
    }
    None
}

fn check_email(email: &str) -> Option<FieldError> {
    if email.is_empty() {
        return fail(Field::Email, "Email is required");
    }
    if !is_email(email) {
        return fail(Field::Email, "Invalid email address");
    }
    None
}

fn check_phone(phone: &str) -> Option<FieldError> {
    if phone.is_empty() {
        return fail(Field::Phone, "Phone is required");
    }
    if !phone_regex().is_some_and(|re| re.is_match(phone)) {
        return fail(Field::Phone, "Invalid phone number");
    }
    None
}

fn check_address(address: &str) -> Option<FieldError> {
    if address.is_empty() {
        return fail(Field::Address, "Address is required");
    }
    if address.chars().count() < ADDRESS_MIN {
        return fail(Field::Address, "Address must be at least 5 characters");
    }
    None
}

/// `local@domain.tld`, case-insensitive.
fn is_email(value: &str) -> bool {
    email_regex().is_some_and(|re| re.is_match(value))
}
