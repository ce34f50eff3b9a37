use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{ConstraintViolation, ViolationKind};

/// Navi Mumbai nodes the estimator offers as locations.
pub const KNOWN_LOCATIONS: &[&str] = &[
    "Airoli",
    "CBD Belapur",
    "Ghansoli",
    "Kharghar",
    "Nerul",
    "Panvel",
    "Ulwe",
    "Vashi",
];

pub const FLAG_ON: &str = "1";
pub const FLAG_OFF: &str = "0";

pub fn is_known_location(location: &str) -> bool {
    KNOWN_LOCATIONS
        .iter()
        .any(|known| known.eq_ignore_ascii_case(location.trim()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormField {
    Location,
    AreaSqft,
    Bhk,
    Bathrooms,
    AgeOfProperty,
    Parking,
    Lift,
}

impl FormField {
    pub const ALL: [FormField; 7] = [
        FormField::Location,
        FormField::AreaSqft,
        FormField::Bhk,
        FormField::Bathrooms,
        FormField::AgeOfProperty,
        FormField::Parking,
        FormField::Lift,
    ];

    pub fn key(self) -> &'static str {
        match self {
            FormField::Location => "location",
            FormField::AreaSqft => "area_sqft",
            FormField::Bhk => "bhk",
            FormField::Bathrooms => "bathrooms",
            FormField::AgeOfProperty => "age_of_property",
            FormField::Parking => "parking",
            FormField::Lift => "lift",
        }
    }

    pub fn from_key(key: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.key() == key)
    }
}

impl fmt::Display for FormField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Checkbox-style fields that hold `"0"` or `"1"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BooleanField {
    Parking,
    Lift,
}

impl From<BooleanField> for FormField {
    fn from(value: BooleanField) -> Self {
        match value {
            BooleanField::Parking => FormField::Parking,
            BooleanField::Lift => FormField::Lift,
        }
    }
}

/// Raw form input. Every value stays text until submission so partial input
/// can be held as typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormState {
    pub location: String,
    pub area_sqft: String,
    pub bhk: String,
    pub bathrooms: String,
    pub age_of_property: String,
    pub parking: String,
    pub lift: String,
}

impl Default for FormState {
    fn default() -> Self {
        Self {
            location: String::new(),
            area_sqft: String::new(),
            bhk: String::new(),
            bathrooms: String::new(),
            age_of_property: String::new(),
            parking: FLAG_OFF.into(),
            lift: FLAG_OFF.into(),
        }
    }
}

impl FormState {
    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::Location => &self.location,
            FormField::AreaSqft => &self.area_sqft,
            FormField::Bhk => &self.bhk,
            FormField::Bathrooms => &self.bathrooms,
            FormField::AgeOfProperty => &self.age_of_property,
            FormField::Parking => &self.parking,
            FormField::Lift => &self.lift,
        }
    }

    pub fn set(&mut self, field: FormField, value: impl Into<String>) {
        let slot = match field {
            FormField::Location => &mut self.location,
            FormField::AreaSqft => &mut self.area_sqft,
            FormField::Bhk => &mut self.bhk,
            FormField::Bathrooms => &mut self.bathrooms,
            FormField::AgeOfProperty => &mut self.age_of_property,
            FormField::Parking => &mut self.parking,
            FormField::Lift => &mut self.lift,
        };
        *slot = value.into();
    }

    pub fn is_checked(&self, field: BooleanField) -> bool {
        self.get(field.into()) == FLAG_ON
    }

    pub fn set_checked(&mut self, field: BooleanField, checked: bool) {
        self.set(field.into(), if checked { FLAG_ON } else { FLAG_OFF });
    }

    pub fn toggle(&mut self, field: BooleanField) {
        let checked = self.is_checked(field);
        self.set_checked(field, !checked);
    }

    /// Checks the limits a form front end puts on its inputs: required
    /// fields, numeric values and their ranges. Submission does not call this.
    pub fn constraint_violations(&self) -> Vec<ConstraintViolation> {
        let mut violations = Vec::new();

        if self.location.trim().is_empty() {
            violations.push(ConstraintViolation::new(
                FormField::Location,
                ViolationKind::Missing,
            ));
        }

        let numeric_rules = [
            (FormField::AreaSqft, true, Some(100.0), None),
            (FormField::Bhk, true, Some(1.0), Some(10.0)),
            (FormField::Bathrooms, true, Some(1.0), None),
            (FormField::AgeOfProperty, false, Some(0.0), None),
        ];

        for (field, required, min, max) in numeric_rules {
            let raw = self.get(field).trim();
            if raw.is_empty() {
                if required {
                    violations.push(ConstraintViolation::new(field, ViolationKind::Missing));
                }
                continue;
            }

            let Ok(value) = raw.parse::<f64>() else {
                violations.push(ConstraintViolation::new(field, ViolationKind::NotNumeric));
                continue;
            };
            if !value.is_finite() {
                violations.push(ConstraintViolation::new(field, ViolationKind::NotNumeric));
                continue;
            }

            if let Some(min) = min {
                if value < min {
                    violations.push(ConstraintViolation::new(
                        field,
                        ViolationKind::BelowMinimum(min),
                    ));
                    continue;
                }
            }
            if let Some(max) = max {
                if value > max {
                    violations.push(ConstraintViolation::new(
                        field,
                        ViolationKind::AboveMaximum(max),
                    ));
                }
            }
        }

        violations
    }
}

/// Reads the longest leading decimal number from `raw` the way a lenient text
/// box parser does: `" 12.5 sqft"` is `12.5`, `"abc"` and `""` are `NaN`.
pub fn parse_leading_float(raw: &str) -> f64 {
    let text = raw.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }

    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;

    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        if digits > 0 || frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }

    if digits == 0 {
        return f64::NAN;
    }

    if matches!(bytes.get(end), Some(b'e' | b'E')) {
        let mut exp_end = end + 1;
        if matches!(bytes.get(exp_end), Some(b'+' | b'-')) {
            exp_end += 1;
        }
        let exp_digits_start = exp_end;
        while bytes.get(exp_end).is_some_and(u8::is_ascii_digit) {
            exp_end += 1;
        }
        if exp_end > exp_digits_start {
            end = exp_end;
        }
    }

    text[..end].parse::<f64>().unwrap_or(f64::NAN)
}

/// Reads a leading integer (`"1"`, `" 0 "`, `"1abc"`); `None` when there is none.
pub fn parse_leading_int(raw: &str) -> Option<i64> {
    let text = raw.trim_start();
    let bytes = text.as_bytes();
    let mut end = 0;

    if matches!(bytes.first(), Some(b'+' | b'-')) {
        end += 1;
    }
    let digits_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    if end == digits_start {
        return None;
    }

    text[..end].parse::<i64>().ok()
}
