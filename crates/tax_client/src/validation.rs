//! Form validation for the calculator input.
//!
//! Validation is a pure derivation of the current [`FormFields`]; nothing is
//! stored, so callers simply call [`validate`] (or [`FormFields::validation`])
//! again after every edit.

use shared::{domain::MunicipalityId, protocol::TaxRequest};

pub const REQUIRED_FIELD: &str = "Required field";

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FormFields {
    pub municipality_id: String,
    /// `None` when the salary input is empty or not a number.
    pub gross_monthly_salary: Option<f64>,
    pub compare_mode: bool,
    pub compare_municipality_id: String,
    pub church_member: bool,
    pub is_pensioner: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    pub municipality: Option<String>,
    pub salary: Option<String>,
    pub compare_municipality: Option<String>,
}

impl ValidationErrors {
    pub fn is_empty(&self) -> bool {
        self.municipality.is_none() && self.salary.is_none() && self.compare_municipality.is_none()
    }

    /// `(field, message)` pairs for every field that has an error.
    pub fn fields(&self) -> Vec<(&'static str, &str)> {
        [
            ("municipality", self.municipality.as_deref()),
            ("salary", self.salary.as_deref()),
            ("compareMunicipality", self.compare_municipality.as_deref()),
        ]
        .into_iter()
        .filter_map(|(field, message)| message.map(|m| (field, m)))
        .collect()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Validation {
    pub errors: ValidationErrors,
    pub is_valid: bool,
}

/// Primary request plus the comparison request when compare mode is on.
#[derive(Debug, Clone, PartialEq)]
pub struct CalculationRequests {
    pub primary: TaxRequest,
    pub compare: Option<TaxRequest>,
}

impl FormFields {
    /// Parses free-form salary input. Whitespace (including the Swedish
    /// thousands separator) is ignored and `,` is accepted as decimal mark.
    pub fn parse_salary(raw: &str) -> Option<f64> {
        let cleaned: String = raw
            .chars()
            .filter(|c| !c.is_whitespace())
            .map(|c| if c == ',' { '.' } else { c })
            .collect();
        cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
    }

    pub fn set_salary_input(&mut self, raw: &str) {
        self.gross_monthly_salary = Self::parse_salary(raw);
    }

    pub fn validation(&self) -> Validation {
        validate(self)
    }

    /// Requests for the current input, or `None` while the form is invalid.
    pub fn requests(&self) -> Option<CalculationRequests> {
        if !self.validation().is_valid {
            return None;
        }
        let salary = self.gross_monthly_salary?;
        let build = |municipality_id: &str| {
            TaxRequest::new(MunicipalityId::new(municipality_id.trim()), salary)
                .with_church_member(self.church_member)
                .with_pensioner(self.is_pensioner)
        };

        Some(CalculationRequests {
            primary: build(self.municipality_id.as_str()),
            compare: self
                .compare_mode
                .then(|| build(self.compare_municipality_id.as_str())),
        })
    }
}

fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn has_positive_salary(fields: &FormFields) -> bool {
    fields.gross_monthly_salary.is_some_and(|salary| salary > 0.0)
}

fn required_if(missing: bool) -> Option<String> {
    missing.then(|| REQUIRED_FIELD.to_string())
}

pub fn validate(fields: &FormFields) -> Validation {
    let errors = ValidationErrors {
        municipality: required_if(is_blank(&fields.municipality_id)),
        salary: required_if(!has_positive_salary(fields)),
        compare_municipality: required_if(
            fields.compare_mode && is_blank(&fields.compare_municipality_id),
        ),
    };

    let base_valid = !is_blank(&fields.municipality_id) && has_positive_salary(fields);
    let is_valid = base_valid && (!fields.compare_mode || !is_blank(&fields.compare_municipality_id));

    Validation { errors, is_valid }
}

#[cfg(test)]
#[path = "tests/validation_tests.rs"]
mod tests;
