//! Hierarchical model description
//!
//! A [`ModelSpec`] says which DDM parameters are regressed on which columns,
//! which parameters are estimated separately per condition, and how long the
//! sampler runs. Three presets cover the analyses of the numerosity study.

use crate::error::PrepError;
use crate::model::formula::Regressor;
use crate::model::parameter::DdmParameter;
use crate::types::PreparedTable;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Default number of posterior samples
pub const DEFAULT_SAMPLES: u32 = 5000;

/// Default number of discarded warm-up samples
pub const DEFAULT_BURN: u32 = 100;

/// Condition column used to stratify parameters (stimulus duration in ms)
pub const DEFAULT_CONDITION_COLUMN: &str = "time";

/// Analysis preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "cli", derive(clap::ValueEnum))]
pub enum ModelVariant {
    /// Plain hierarchical DDM, no regression
    Baseline,
    /// Drift rate on the Weber fractions, threshold on response time
    Regression,
    /// Regression plus v, a, t estimated per stimulus duration
    Stratified,
}

impl ModelVariant {
    pub fn as_str(&self) -> &'static str {
        match self {
            ModelVariant::Baseline => "baseline",
            ModelVariant::Regression => "regression",
            ModelVariant::Stratified => "stratified",
        }
    }
}

impl fmt::Display for ModelVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ModelVariant {
    type Err = PrepError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "baseline" => Ok(ModelVariant::Baseline),
            "regression" => Ok(ModelVariant::Regression),
            "stratified" => Ok(ModelVariant::Stratified),
            other => Err(PrepError::InvalidModel(format!("unknown variant {other:?}"))),
        }
    }
}

/// Configuration handed to the hierarchical sampler
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelSpec {
    /// Per-parameter regressions (empty for a plain DDM)
    #[serde(default)]
    pub regressors: Vec<Regressor>,
    /// Parameters estimated separately for every level of a condition column
    #[serde(default)]
    pub depends_on: BTreeMap<DdmParameter, String>,
    /// Parameters to estimate (empty means the sampler's default set)
    #[serde(default)]
    pub include: Vec<DdmParameter>,
    #[serde(default = "default_group_model")]
    pub is_group_model: bool,
    #[serde(default = "default_samples")]
    pub samples: u32,
    #[serde(default = "default_burn")]
    pub burn: u32,
}

fn default_group_model() -> bool {
    true
}

fn default_samples() -> u32 {
    DEFAULT_SAMPLES
}

fn default_burn() -> u32 {
    DEFAULT_BURN
}

impl Default for ModelSpec {
    fn default() -> Self {
        Self::for_variant(ModelVariant::Baseline)
    }
}

impl ModelSpec {
    /// Preset for one of the study's analyses
    pub fn for_variant(variant: ModelVariant) -> Self {
        let core = [DdmParameter::V, DdmParameter::A, DdmParameter::T];
        let regressors = || {
            vec![
                Regressor {
                    parameter: DdmParameter::V,
                    covariates: vec!["numFW".into(), "pixFW".into(), "envFW".into()],
                    intercept: true,
                    link: Default::default(),
                },
                Regressor {
                    parameter: DdmParameter::A,
                    covariates: vec!["rt".into()],
                    intercept: true,
                    link: Default::default(),
                },
            ]
        };

        match variant {
            ModelVariant::Baseline => Self {
                regressors: Vec::new(),
                depends_on: BTreeMap::new(),
                include: Vec::new(),
                is_group_model: true,
                samples: DEFAULT_SAMPLES,
                burn: DEFAULT_BURN,
            },
            ModelVariant::Regression => Self {
                regressors: regressors(),
                depends_on: BTreeMap::new(),
                include: core.to_vec(),
                is_group_model: true,
                samples: DEFAULT_SAMPLES,
                burn: DEFAULT_BURN,
            },
            ModelVariant::Stratified => Self {
                regressors: regressors(),
                depends_on: core
                    .iter()
                    .map(|p| (*p, DEFAULT_CONDITION_COLUMN.to_string()))
                    .collect(),
                include: core.to_vec(),
                is_group_model: true,
                samples: DEFAULT_SAMPLES,
                burn: DEFAULT_BURN,
            },
        }
    }

    pub fn from_json(json: &str) -> Result<Self, PrepError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Regressor of a parameter, if any
    pub fn regressor(&self, parameter: DdmParameter) -> Option<&Regressor> {
        self.regressors.iter().find(|r| r.parameter == parameter)
    }

    /// All regression coefficient names
    pub fn coefficient_names(&self) -> Vec<String> {
        self.regressors
            .iter()
            .flat_map(Regressor::coefficient_names)
            .collect()
    }

    /// Condition columns named in `depends_on`
    pub fn condition_columns(&self) -> BTreeSet<&str> {
        self.depends_on.values().map(String::as_str).collect()
    }

    /// Check the model against the table it will be fitted on
    pub fn validate(&self, table: &PreparedTable) -> Result<(), PrepError> {
        if self.samples == 0 || self.burn >= self.samples {
            return Err(PrepError::InvalidModel(format!(
                "burn ({}) must be smaller than samples ({})",
                self.burn, self.samples
            )));
        }

        let mut regressed = BTreeSet::new();
        for regressor in &self.regressors {
            if !regressed.insert(regressor.parameter) {
                return Err(PrepError::InvalidModel(format!(
                    "parameter {} has more than one regression",
                    regressor.parameter
                )));
            }
            for covariate in &regressor.covariates {
                if table.numeric_column(covariate).is_none() {
                    return Err(PrepError::InvalidModel(format!(
                        "{} uses {covariate}, which is not a numeric column",
                        regressor.formula()
                    )));
                }
            }
        }

        for (parameter, column) in &self.depends_on {
            if !table.has_column(column) {
                return Err(PrepError::InvalidModel(format!(
                    "{parameter} depends on missing column {column}"
                )));
            }
        }

        let mut included = BTreeSet::new();
        for parameter in &self.include {
            if !included.insert(*parameter) {
                return Err(PrepError::InvalidModel(format!(
                    "{parameter} is included twice"
                )));
            }
        }

        Ok(())
    }
}

/// Distinct values of a condition column, ordered numerically when every value
/// is a number
pub fn condition_levels(table: &PreparedTable, column: &str) -> Result<Vec<String>, PrepError> {
    let values = table
        .text_column(column)
        .ok_or_else(|| PrepError::MissingColumn(column.to_string()))?;

    let mut levels: Vec<String> = values
        .into_iter()
        .map(|v| v.trim().to_string())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();

    let numeric: Option<Vec<f64>> = levels.iter().map(|l| l.parse::<f64>().ok()).collect();
    if let Some(numbers) = numeric {
        let mut keyed: Vec<(f64, String)> = numbers.into_iter().zip(levels).collect();
        keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
        levels = keyed.into_iter().map(|(_, l)| l).collect();
    }
    Ok(levels)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::prepare_csv;
    use crate::schema::PrepConfig;
    use pretty_assertions::assert_eq;

    fn table() -> PreparedTable {
        prepare_csv(
            "id,correcta,rt,numAZ,numAM,pixAZ,pixAM,envAZ,envAM,time,block\n\
             S01,1,850,4,8,10,10,0,5,400,A\n\
             S01,0,1210,9,12,40,36,2,6,100,B\n\
             S02,1,640,3,7,15,20,4,4,800,A\n\
             S02,1,705,3,7,15,20,4,4,200,A\n\
             S02,1,705,3,7,15,20,4,4,100,B\n",
            &PrepConfig::default(),
        )
        .unwrap()
    }

    #[test]
    fn test_presets() {
        let baseline = ModelSpec::for_variant(ModelVariant::Baseline);
        assert!(baseline.regressors.is_empty());
        assert!(baseline.depends_on.is_empty());

        let regression = ModelSpec::for_variant(ModelVariant::Regression);
        assert_eq!(regression.regressors[0].formula(), "v ~ numFW + pixFW + envFW");
        assert_eq!(regression.regressors[1].formula(), "a ~ rt");
        assert_eq!(regression.include, vec![DdmParameter::V, DdmParameter::A, DdmParameter::T]);

        let stratified = ModelSpec::for_variant(ModelVariant::Stratified);
        assert_eq!(stratified.depends_on.len(), 3);
        assert_eq!(stratified.condition_columns().into_iter().collect::<Vec<_>>(), vec!["time"]);
    }

    #[test]
    fn test_presets_validate_against_study_table() {
        let table = table();
        for variant in [
            ModelVariant::Baseline,
            ModelVariant::Regression,
            ModelVariant::Stratified,
        ] {
            ModelSpec::for_variant(variant).validate(&table).unwrap();
        }
    }

    #[test]
    fn test_unknown_covariate_rejected() {
        let mut spec = ModelSpec::for_variant(ModelVariant::Regression);
        spec.regressors[1] = Regressor::parse("a ~ lumFW").unwrap();
        assert!(matches!(spec.validate(&table()), Err(PrepError::InvalidModel(_))));
    }

    #[test]
    fn test_text_covariate_rejected() {
        let mut spec = ModelSpec::default();
        spec.regressors.push(Regressor::parse("t ~ block").unwrap());
        assert!(spec.validate(&table()).is_err());
    }

    #[test]
    fn test_duplicate_regression_rejected() {
        let mut spec = ModelSpec::for_variant(ModelVariant::Regression);
        spec.regressors.push(Regressor::parse("v ~ rt").unwrap());
        assert!(spec.validate(&table()).is_err());
    }

    #[test]
    fn test_missing_condition_column_rejected() {
        let mut spec = ModelSpec::default();
        spec.depends_on.insert(DdmParameter::V, "duration".into());
        assert!(spec.validate(&table()).is_err());
    }

    #[test]
    fn test_burn_must_leave_samples() {
        let mut spec = ModelSpec::default();
        spec.burn = spec.samples;
        assert!(spec.validate(&table()).is_err());
    }

    #[test]
    fn test_spec_from_json_defaults() {
        let spec = ModelSpec::from_json(
            r#"{"regressors": [{"model": "v ~ numFW"}], "depends_on": {"t": "time"}}"#,
        )
        .unwrap();
        assert_eq!(spec.samples, DEFAULT_SAMPLES);
        assert_eq!(spec.burn, DEFAULT_BURN);
        assert!(spec.is_group_model);
        assert_eq!(spec.depends_on[&DdmParameter::T], "time");
        assert_eq!(spec.coefficient_names(), vec!["v_Intercept", "v_numFW"]);
    }

    #[test]
    fn test_condition_levels_numeric_order() {
        let levels = condition_levels(&table(), "time").unwrap();
        assert_eq!(levels, vec!["100", "200", "400", "800"]);

        let blocks = condition_levels(&table(), "block").unwrap();
        assert_eq!(blocks, vec!["A", "B"]);

        assert!(condition_levels(&table(), "duration").is_err());
    }

    #[test]
    fn test_variant_parse() {
        assert_eq!("Stratified".parse::<ModelVariant>().unwrap(), ModelVariant::Stratified);
        assert!("full".parse::<ModelVariant>().is_err());
    }
}
