//! Cohort query parameters and their validation.
//!
//! [`CohortQueryParams`] is what arrives on the query string. Converting it
//! into [`CohortFilters`] checks every rule and resolves controlled terms to
//! full IRIs, so nothing unchecked reaches the query builder.

use std::borrow::Cow;

use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use validator::Validate;

use crate::vocab::{terms::CONTROLLED_TERM_PATTERN, ControlledTerm};

/// SNOMED CT codes accepted for `sex`: male, female, other.
pub const SEX_CODES: &[&str] = &["248153007", "248152002", "32570681000036106"];

const SEX_PREFIXES: &[&str] = &["snomed"];
const DIAGNOSIS_PREFIXES: &[&str] = &["snomed"];
const ASSESSMENT_PREFIXES: &[&str] = &["nb", "cogatlas", "snomed"];
const IMAGE_MODAL_PREFIXES: &[&str] = &["nidm", "nb", "snomed"];

pub const CONTROL_WITH_DIAGNOSIS: &str =
    "Subjects cannot both be healthy controls and have a diagnosis";

/// Raw `/query` parameters. Every field is optional; unknown names are
/// rejected during deserialization.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize, Validate)]
#[serde(deny_unknown_fields)]
#[validate(schema(function = "validate_combination"))]
pub struct CohortQueryParams {
    #[serde(default)]
    #[validate(
        range(min = 0.0, message = "must be a non-negative number"),
        custom(function = "validate_finite")
    )]
    pub min_age: Option<f64>,
    #[serde(default)]
    #[validate(
        range(min = 0.0, message = "must be a non-negative number"),
        custom(function = "validate_finite")
    )]
    pub max_age: Option<f64>,
    #[serde(default)]
    #[validate(
        regex(path = *CONTROLLED_TERM_PATTERN, message = "must be a prefixed term such as `snomed:248152002`"),
        custom(function = "validate_sex")
    )]
    pub sex: Option<String>,
    #[serde(default)]
    #[validate(
        regex(path = *CONTROLLED_TERM_PATTERN, message = "must be a prefixed term such as `snomed:35489007`"),
        custom(function = "validate_diagnosis")
    )]
    pub diagnosis: Option<String>,
    #[serde(default, deserialize_with = "lenient_bool")]
    pub is_control: Option<bool>,
    #[serde(default)]
    pub min_num_phenotypic_sessions: Option<u32>,
    #[serde(default)]
    pub min_num_imaging_sessions: Option<u32>,
    #[serde(default)]
    #[validate(
        regex(path = *CONTROLLED_TERM_PATTERN, message = "must be a prefixed term such as `cogatlas:tsk_U9gDp8utahAfO`"),
        custom(function = "validate_assessment")
    )]
    pub assessment: Option<String>,
    #[serde(default)]
    #[validate(
        regex(path = *CONTROLLED_TERM_PATTERN, message = "must be a prefixed term such as `nidm:T1Weighted`"),
        custom(function = "validate_image_modal")
    )]
    pub image_modal: Option<String>,
}

/// Validated cohort filters with controlled terms resolved to IRIs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CohortFilters {
    pub min_age: Option<f64>,
    pub max_age: Option<f64>,
    pub sex: Option<ControlledTerm>,
    pub diagnosis: Option<ControlledTerm>,
    pub is_control: Option<bool>,
    pub min_num_phenotypic_sessions: Option<u32>,
    pub min_num_imaging_sessions: Option<u32>,
    pub assessment: Option<ControlledTerm>,
    pub image_modal: Option<ControlledTerm>,
}

/// One rejected parameter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ParamIssue {
    pub param: String,
    pub message: String,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    /// One or more parameters broke a rule.
    #[error("{}", describe(.0))]
    Params(Vec<ParamIssue>),
    /// The query string itself could not be decoded into parameters
    /// (unknown name, non-numeric age, ...).
    #[error("{0}")]
    Request(String),
}

impl ValidationError {
    /// A single issue with `param`.
    pub fn for_param(param: &str, message: impl Into<String>) -> Self {
        Self::Params(vec![ParamIssue {
            param: param.to_string(),
            message: message.into(),
        }])
    }

    /// Individual parameter issues, empty for request-level failures.
    #[must_use]
    pub fn issues(&self) -> &[ParamIssue] {
        match self {
            Self::Params(issues) => issues,
            Self::Request(_) => &[],
        }
    }
}

fn describe(issues: &[ParamIssue]) -> String {
    issues
        .iter()
        .map(|issue| {
            if issue.param.is_empty() {
                issue.message.clone()
            } else {
                format!("{}: {}", issue.param, issue.message)
            }
        })
        .collect::<Vec<_>>()
        .join("; ")
}

impl From<validator::ValidationErrors> for ValidationError {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut issues: Vec<ParamIssue> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                let param = if field == "__all__" {
                    String::new()
                } else {
                    field.to_string()
                };
                errs.iter().map(move |err| ParamIssue {
                    param: param.clone(),
                    message: err
                        .message
                        .as_ref()
                        .map_or_else(|| err.code.to_string(), ToString::to_string),
                })
            })
            .collect();
        issues.sort_by(|a, b| a.param.cmp(&b.param).then(a.message.cmp(&b.message)));
        Self::Params(issues)
    }
}

impl TryFrom<CohortQueryParams> for CohortFilters {
    type Error = ValidationError;

    fn try_from(params: CohortQueryParams) -> Result<Self, Self::Error> {
        params.validate()?;
        Ok(Self {
            min_age: params.min_age,
            max_age: params.max_age,
            sex: resolve("sex", params.sex.as_deref())?,
            diagnosis: resolve("diagnosis", params.diagnosis.as_deref())?,
            is_control: params.is_control,
            min_num_phenotypic_sessions: params.min_num_phenotypic_sessions,
            min_num_imaging_sessions: params.min_num_imaging_sessions,
            assessment: resolve("assessment", params.assessment.as_deref())?,
            image_modal: resolve("image_modal", params.image_modal.as_deref())?,
        })
    }
}

fn resolve(param: &str, value: Option<&str>) -> Result<Option<ControlledTerm>, ValidationError> {
    value
        .map(|value| {
            ControlledTerm::parse(value)
                .map_err(|err| ValidationError::for_param(param, err.to_string()))
        })
        .transpose()
}

fn validate_combination(params: &CohortQueryParams) -> Result<(), validator::ValidationError> {
    if let (Some(min), Some(max)) = (params.min_age, params.max_age) {
        if min > max {
            return Err(validator::ValidationError::new("age_range").with_message(
                Cow::Borrowed("`max_age` must be greater than or equal to `min_age`"),
            ));
        }
    }
    if params.is_control == Some(true) && params.diagnosis.is_some() {
        return Err(validator::ValidationError::new("control_with_diagnosis")
            .with_message(Cow::Borrowed(CONTROL_WITH_DIAGNOSIS)));
    }
    Ok(())
}

/// `NaN` and infinities decode as `f64` but have no SPARQL literal form.
#[allow(clippy::trivially_copy_pass_by_ref)]
fn validate_finite(value: f64) -> Result<(), validator::ValidationError> {
    if value.is_finite() {
        return Ok(());
    }
    Err(validator::ValidationError::new("not_finite")
        .with_message(Cow::Borrowed("must be a finite number")))
}

fn check_prefix(value: &str, allowed: &[&str]) -> Result<(), validator::ValidationError> {
    let prefix = value.split_once(':').map_or(value, |(prefix, _)| prefix);
    if allowed.contains(&prefix) {
        return Ok(());
    }
    Err(
        validator::ValidationError::new("unknown_prefix").with_message(Cow::Owned(format!(
            "prefix `{prefix}` is not allowed here (expected one of: {})",
            allowed.join(", ")
        ))),
    )
}

fn validate_sex(value: &str) -> Result<(), validator::ValidationError> {
    check_prefix(value, SEX_PREFIXES)?;
    let code = value.split_once(':').map_or("", |(_, code)| code);
    if SEX_CODES.contains(&code) {
        return Ok(());
    }
    Err(
        validator::ValidationError::new("unknown_sex").with_message(Cow::Owned(format!(
            "must be one of: {}",
            SEX_CODES
                .iter()
                .map(|code| format!("snomed:{code}"))
                .collect::<Vec<_>>()
                .join(", ")
        ))),
    )
}

fn validate_diagnosis(value: &str) -> Result<(), validator::ValidationError> {
    check_prefix(value, DIAGNOSIS_PREFIXES)
}

fn validate_assessment(value: &str) -> Result<(), validator::ValidationError> {
    check_prefix(value, ASSESSMENT_PREFIXES)
}

fn validate_image_modal(value: &str) -> Result<(), validator::ValidationError> {
    check_prefix(value, IMAGE_MODAL_PREFIXES)
}

/// Accepts `true`/`false` in any letter case.
fn lenient_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let Some(raw) = Option::<String>::deserialize(deserializer)? else {
        return Ok(None);
    };
    match raw.to_ascii_lowercase().as_str() {
        "true" => Ok(Some(true)),
        "false" => Ok(Some(false)),
        _ => Err(serde::de::Error::custom(format!(
            "is_control: expected `true` or `false`, got `{raw}`"
        ))),
    }
}
