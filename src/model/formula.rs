//! Per-parameter linear regression formulas
//!
//! Formulas follow the `"<param> ~ term + term"` notation the sampler accepts:
//! `v ~ numFW + pixFW + envFW` makes the drift rate a linear function of the
//! three Weber fractions. The intercept is implicit; a `0` term removes it.

use crate::error::PrepError;
use crate::model::parameter::DdmParameter;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Link function between the linear predictor and the parameter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinkFunction {
    #[default]
    Identity,
}

/// Linear regression of one DDM parameter on table columns
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RegressorDescriptor", into = "RegressorDescriptor")]
pub struct Regressor {
    pub parameter: DdmParameter,
    pub covariates: Vec<String>,
    pub intercept: bool,
    pub link: LinkFunction,
}

/// Wire form: `{"model": "v ~ numFW", "link_func": "identity"}`
#[derive(Debug, Clone, Serialize, Deserialize)]
struct RegressorDescriptor {
    model: String,
    #[serde(default)]
    link_func: LinkFunction,
}

impl TryFrom<RegressorDescriptor> for Regressor {
    type Error = PrepError;

    fn try_from(descriptor: RegressorDescriptor) -> Result<Self, Self::Error> {
        let mut regressor = Regressor::parse(&descriptor.model)?;
        regressor.link = descriptor.link_func;
        Ok(regressor)
    }
}

impl From<Regressor> for RegressorDescriptor {
    fn from(regressor: Regressor) -> Self {
        Self {
            model: regressor.formula(),
            link_func: regressor.link,
        }
    }
}

impl Regressor {
    /// Parse a formula such as `"a ~ rt"` or `"v ~ 0 + numFW"`
    pub fn parse(formula: &str) -> Result<Self, PrepError> {
        let invalid = |reason: &str| PrepError::InvalidFormula {
            formula: formula.to_string(),
            reason: reason.to_string(),
        };

        let (lhs, rhs) = formula.split_once('~').ok_or_else(|| invalid("missing '~'"))?;
        let parameter: DdmParameter = lhs
            .trim()
            .parse()
            .map_err(|_| invalid("left-hand side is not a DDM parameter"))?;

        let mut intercept = true;
        let mut covariates: Vec<String> = Vec::new();
        let mut seen = HashSet::new();

        for term in rhs.split('+').map(str::trim) {
            match term {
                "" => return Err(invalid("empty term")),
                "1" => intercept = true,
                "0" => intercept = false,
                name if is_identifier(name) => {
                    if !seen.insert(name) {
                        return Err(invalid(&format!("term {name} appears twice")));
                    }
                    covariates.push(name.to_string());
                }
                other => return Err(invalid(&format!("term {other:?} is not a column name"))),
            }
        }

        if covariates.is_empty() && !intercept {
            return Err(invalid("no terms left"));
        }

        Ok(Self {
            parameter,
            covariates,
            intercept,
            link: LinkFunction::Identity,
        })
    }

    /// Formula text in canonical spacing
    pub fn formula(&self) -> String {
        let mut terms: Vec<&str> = Vec::new();
        if !self.intercept {
            terms.push("0");
        } else if self.covariates.is_empty() {
            terms.push("1");
        }
        terms.extend(self.covariates.iter().map(String::as_str));
        format!("{} ~ {}", self.parameter, terms.join(" + "))
    }

    /// Names of the regression coefficients the sampler reports
    /// (`v_Intercept`, `v_numFW`, ...)
    pub fn coefficient_names(&self) -> Vec<String> {
        let mut names = Vec::with_capacity(self.covariates.len() + 1);
        if self.intercept {
            names.push(format!("{}_Intercept", self.parameter));
        }
        names.extend(
            self.covariates
                .iter()
                .map(|c| format!("{}_{}", self.parameter, c)),
        );
        names
    }

    /// Coefficients other than the intercept
    pub fn slope_names(&self) -> Vec<String> {
        self.covariates
            .iter()
            .map(|c| format!("{}_{}", self.parameter, c))
            .collect()
    }
}

impl fmt::Display for Regressor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.formula())
    }
}

fn is_identifier(term: &str) -> bool {
    let mut chars = term.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_drift_formula() {
        let regressor = Regressor::parse("v ~ numFW + pixFW + envFW").unwrap();
        assert_eq!(regressor.parameter, DdmParameter::V);
        assert_eq!(regressor.covariates, vec!["numFW", "pixFW", "envFW"]);
        assert!(regressor.intercept);
        assert_eq!(
            regressor.coefficient_names(),
            vec!["v_Intercept", "v_numFW", "v_pixFW", "v_envFW"]
        );
    }

    #[test]
    fn test_parse_without_intercept() {
        let regressor = Regressor::parse("a~0+rt").unwrap();
        assert!(!regressor.intercept);
        assert_eq!(regressor.formula(), "a ~ 0 + rt");
        assert_eq!(regressor.coefficient_names(), vec!["a_rt"]);
    }

    #[test]
    fn test_formula_round_trip_text() {
        for text in ["v ~ numFW + pixFW + envFW", "a ~ rt", "t ~ 1"] {
            assert_eq!(Regressor::parse(text).unwrap().formula(), text);
        }
    }

    #[test]
    fn test_rejects_bad_formulas() {
        for text in [
            "v numFW",
            "drift ~ numFW",
            "v ~ ",
            "v ~ numFW +",
            "v ~ numFW + numFW",
            "v ~ 0",
            "v ~ num-FW",
        ] {
            assert!(
                matches!(Regressor::parse(text), Err(PrepError::InvalidFormula { .. })),
                "{text} should be rejected"
            );
        }
    }

    #[test]
    fn test_wire_form() {
        let regressor = Regressor::parse("a ~ rt").unwrap();
        let json = serde_json::to_value(&regressor).unwrap();
        assert_eq!(json, serde_json::json!({"model": "a ~ rt", "link_func": "identity"}));

        let back: Regressor = serde_json::from_value(json).unwrap();
        assert_eq!(back, regressor);

        let bad = serde_json::from_str::<Regressor>(r#"{"model": "q ~ rt"}"#);
        assert!(bad.is_err());
    }
}
