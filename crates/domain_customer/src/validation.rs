//! Attribute normalisation and validation rules
//!
//! Names are titleized before they are validated. The rules here are the
//! ones that need no store access; uniqueness is checked by the save helpers
//! inside the operation's transaction.
//!
//! # Validation Rules
//!
//! ## Customer groups
//! - Name is required and 3 to 50 characters long
//! - Name is unique, case-insensitive
//!
//! ## Customers
//! - Name is required and 3 to 50 characters long
//! - Name is unique, case-insensitive
//! - Mobile number is required and unique, case-insensitive

use validator::Validate;

use crate::customer::Customer;
use crate::group::CustomerGroup;

pub const NAME_MIN_LENGTH: u64 = 3;
pub const NAME_MAX_LENGTH: u64 = 50;

pub const NAME_BLANK: &str = "Name can't be blank";
pub const MOBILE_NO_BLANK: &str = "Mobile no can't be blank";
pub const GROUP_NAME_TAKEN: &str = "Name should be uniq, Group already present with same name.";
pub const CUSTOMER_NAME_TAKEN: &str =
    "Name should be uniq. Please enter another name to identify customer.";
pub const MOBILE_NO_TAKEN: &str =
    "Mobile no should be uniq. Customer already exists with same mobile no.";

/// Titleizes a free-text name
///
/// Underscores and hyphens become spaces, camel-cased words are split,
/// whitespace runs collapse and every word is capitalised:
/// `"  acme  north_side "` becomes `"Acme North Side"` and `"mc-donald"`
/// or `"McDonald"` become `"Mc Donald"`.
pub fn titleize(raw: &str) -> String {
    split_words(raw)
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first
                    .to_uppercase()
                    .chain(chars.flat_map(char::to_lowercase))
                    .collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Turns separators into spaces and opens a word at each camel-case hump
///
/// A hump is an upper-case letter after a lower-case letter or digit, or the
/// last capital of an acronym run followed by a lower-case letter
/// (`"HTMLParser"` splits as `"HTML Parser"`).
fn split_words(raw: &str) -> String {
    let chars: Vec<char> = raw.chars().collect();
    let mut out = String::with_capacity(raw.len() + 4);

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' || c == '-' {
            out.push(' ');
            continue;
        }
        if c.is_uppercase() && i > 0 {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            if prev.is_lowercase() || prev.is_ascii_digit() || (prev.is_uppercase() && next_is_lower) {
                out.push(' ');
            }
        }
        out.push(c);
    }
    out
}

/// Result of validating an entity
#[derive(Debug, Clone)]
pub struct ValidationResult {
    /// Whether the entity is valid
    pub is_valid: bool,
    /// Full, attribute-prefixed messages
    pub errors: Vec<String>,
}

impl ValidationResult {
    pub fn ok() -> Self {
        Self {
            is_valid: true,
            errors: Vec::new(),
        }
    }

    pub fn fail(errors: Vec<String>) -> Self {
        Self {
            is_valid: errors.is_empty(),
            errors,
        }
    }

    pub fn add_error(&mut self, error: impl Into<String>) {
        self.errors.push(error.into());
        self.is_valid = false;
    }

    pub fn merge(&mut self, other: ValidationResult) {
        if !other.is_valid {
            self.is_valid = false;
        }
        self.errors.extend(other.errors);
    }
}

impl Default for ValidationResult {
    fn default() -> Self {
        Self::ok()
    }
}

#[derive(Debug, Validate)]
struct NameLength {
    #[validate(length(min = 3, max = 50))]
    name: String,
}

/// Presence and length checks shared by groups and customers
fn validate_name(name: &str) -> ValidationResult {
    let mut result = ValidationResult::ok();

    if name.trim().is_empty() {
        result.add_error(NAME_BLANK);
    }

    let rule = NameLength {
        name: name.to_string(),
    };
    if let Err(errors) = rule.validate() {
        if errors.field_errors().contains_key("name") {
            let length = name.chars().count() as u64;
            if length < NAME_MIN_LENGTH {
                result.add_error(format!(
                    "Name is too short (minimum is {} characters)",
                    NAME_MIN_LENGTH
                ));
            } else {
                result.add_error(format!(
                    "Name is too long (maximum is {} characters)",
                    NAME_MAX_LENGTH
                ));
            }
        }
    }

    result
}

/// Validator for customer groups
pub struct GroupValidator;

impl GroupValidator {
    /// Normalises the group name in place
    pub fn normalize(group: &mut CustomerGroup) {
        group.name = titleize(&group.name);
    }

    pub fn validate(group: &CustomerGroup) -> ValidationResult {
        validate_name(&group.name)
    }
}

/// Validator for customers
pub struct CustomerValidator;

impl CustomerValidator {
    /// Normalises the customer name and trims the mobile number in place
    pub fn normalize(customer: &mut Customer) {
        customer.name = titleize(&customer.name);
        customer.mobile_no = customer.mobile_no.trim().to_string();
    }

    pub fn validate(customer: &Customer) -> ValidationResult {
        let mut result = validate_name(&customer.name);
        if customer.mobile_no.trim().is_empty() {
            result.add_error(MOBILE_NO_BLANK);
        }
        result
    }
}
