//! Field constraints for [`UserInput`].
//!
//! Every field is checked and all violations are returned together; a blank
//! field reports only its "mandatory" message.

use crate::model::UserInput;
use common_http_errors::FieldViolation;
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[A-Za-z0-9!#$%&'*+/=?^_`{|}~.-]+@[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?(?:\.[A-Za-z0-9](?:[A-Za-z0-9-]*[A-Za-z0-9])?)*$")
        .expect("email pattern compiles")
});
static MOBILE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\+?[0-9]{10,12}$").expect("mobile pattern compiles"));

pub const NAME_REQUIRED: &str = "Name is mandatory";
pub const EMAIL_REQUIRED: &str = "Email is mandatory";
pub const EMAIL_INVALID: &str = "Email should be valid";
pub const MOBILE_REQUIRED: &str = "Mobile is mandatory";
pub const MOBILE_INVALID: &str = "Mobile number must be valid with 10-12 digits and optional '+' prefix";
pub const ADDRESS_REQUIRED: &str = "Address is mandatory";

fn is_blank(s: &str) -> bool { s.trim().is_empty() }

pub fn is_valid_email(s: &str) -> bool { EMAIL_RE.is_match(s) }

pub fn is_valid_mobile(s: &str) -> bool { MOBILE_RE.is_match(s) }

impl UserInput {
    pub fn validate(&self) -> Result<(), Vec<FieldViolation>> {
        let mut violations = Vec::new();
        if is_blank(&self.name) {
            violations.push(FieldViolation::new("name", NAME_REQUIRED));
        }
        if is_blank(&self.email) {
            violations.push(FieldViolation::new("email", EMAIL_REQUIRED));
        } else if !is_valid_email(&self.email) {
            violations.push(FieldViolation::new("email", EMAIL_INVALID));
        }
        if is_blank(&self.mobile) {
            violations.push(FieldViolation::new("mobile", MOBILE_REQUIRED));
        } else if !is_valid_mobile(&self.mobile) {
            violations.push(FieldViolation::new("mobile", MOBILE_INVALID));
        }
        if is_blank(&self.address) {
            violations.push(FieldViolation::new("address", ADDRESS_REQUIRED));
        }
        if violations.is_empty() { Ok(()) } else { Err(violations) }
    }
}
