//! Posterior report
//!
//! Collects the series behind the diagnostic figures of one fitted job:
//! bar charts of posterior means for the drift rate and the threshold
//! (one chart per condition level when the parameter is stratified) and
//! histograms of the regression slopes.

use crate::error::PrepError;
use crate::model::{DdmParameter, FitOutput, ModelJob};
use crate::posterior::histogram::Histogram;
use crate::posterior::stats::{BarSeries, NameFilter};
use log::{debug, warn};
use serde::{Deserialize, Serialize};

/// Parameters charted by default
pub const CHARTED_PARAMETERS: [DdmParameter; 2] = [DdmParameter::V, DdmParameter::A];

/// Plot data of one fitted job
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PosteriorReport {
    pub job_id: String,
    pub bars: Vec<BarSeries>,
    pub histograms: Vec<Histogram>,
}

impl PosteriorReport {
    pub fn build(job: &ModelJob, fit: &FitOutput, bins: usize) -> Result<Self, PrepError> {
        let mut bars = Vec::new();
        for parameter in CHARTED_PARAMETERS {
            let by_level = job.condition_filters(parameter);
            if by_level.is_empty() {
                bars.push(fit.stats.bar_series(
                    &NameFilter::parameter(parameter),
                    &format!("Posterior means of {parameter} nodes"),
                ));
                continue;
            }
            for (level, filter) in by_level {
                let series = fit.stats.bar_series(
                    &filter,
                    &format!("Posterior means of {parameter} for condition {level}"),
                );
                if series.is_empty() {
                    warn!("no subject nodes match {}", filter.pattern());
                }
                bars.push(series);
            }
        }

        let histograms = plotted_coefficients(job)
            .iter()
            .map(|name| fit.traces.histogram(name, bins, true))
            .collect::<Result<Vec<_>, PrepError>>()?;

        debug!(
            "report for job {}: {} bar series, {} histograms",
            job.job_id,
            bars.len(),
            histograms.len()
        );

        Ok(Self {
            job_id: job.job_id.clone(),
            bars,
            histograms,
        })
    }
}

/// Regression slopes whose posterior distribution is plotted
pub fn plotted_coefficients(job: &ModelJob) -> Vec<String> {
    job.spec
        .regressors
        .iter()
        .flat_map(|r| r.slope_names())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ModelVariant;
    use crate::pipeline::prepare_csv;
    use crate::posterior::{SummaryStats, TraceStore};
    use crate::schema::PrepConfig;
    use pretty_assertions::assert_eq;

    fn job(variant: ModelVariant) -> ModelJob {
        let table = prepare_csv(
            "id,correcta,rt,numAZ,numAM,pixAZ,pixAM,envAZ,envAM,time\n\
             S01,1,850,4,8,10,10,0,5,200\n\
             S01,0,1210,9,12,40,36,2,6,100\n\
             S02,1,640,3,7,15,20,4,4,200\n",
            &PrepConfig::default(),
        )
        .unwrap();
        ModelJob::for_variant(variant, &table).unwrap()
    }

    fn fit() -> FitOutput {
        let stats = SummaryStats::from_csv_str(
            ",mean\n\
             a_Intercept,1.2\n\
             a_rt,0.4\n\
             a_subj(100).S01,1.1\n\
             a_subj(200).S01,1.3\n\
             t,0.28\n\
             v_Intercept,0.9\n\
             v_numFW,-1.1\n\
             v_subj(100).S01,0.7\n\
             v_subj(200).S01,0.8\n\
             v_subj(200).S02,0.6\n",
        )
        .unwrap();

        let mut traces = TraceStore::new();
        traces.insert("v_numFW", vec![-1.0, -1.2, -1.1, -0.9]);
        traces.insert("v_pixFW", vec![0.1, 0.2, 0.3, 0.2]);
        traces.insert("v_envFW", vec![0.0, 0.1, 0.05, 0.02]);
        traces.insert("a_rt", vec![0.4, 0.5, 0.45, 0.41]);
        FitOutput { stats, traces }
    }

    #[test]
    fn test_stratified_report() {
        let job = job(ModelVariant::Stratified);
        let report = PosteriorReport::build(&job, &fit(), 4).unwrap();

        let titles: Vec<&str> = report.bars.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(
            titles,
            vec![
                "Posterior means of v for condition 100",
                "Posterior means of v for condition 200",
                "Posterior means of a for condition 100",
                "Posterior means of a for condition 200",
            ]
        );
        assert_eq!(report.bars[1].labels, vec!["v_subj(200).S01", "v_subj(200).S02"]);
        assert_eq!(report.bars[1].values, vec![0.8, 0.6]);

        let nodes: Vec<&str> = report.histograms.iter().map(|h| h.parameter.as_str()).collect();
        assert_eq!(nodes, vec!["v_numFW", "v_pixFW", "v_envFW", "a_rt"]);
        assert!(report.histograms.iter().all(|h| h.bins() == 4 && h.density));
        assert_eq!(report.job_id, job.job_id);
    }

    #[test]
    fn test_regression_report_charts_whole_parameters() {
        let report = PosteriorReport::build(&job(ModelVariant::Regression), &fit(), 30).unwrap();
        assert_eq!(report.bars.len(), 2);
        assert_eq!(report.bars[0].len(), 5);
        assert_eq!(report.bars[1].labels[0], "a_Intercept");
    }

    #[test]
    fn test_missing_trace() {
        let mut fit = fit();
        fit.traces = TraceStore::new();
        let result = PosteriorReport::build(&job(ModelVariant::Regression), &fit, 30);
        assert!(matches!(result, Err(PrepError::UnknownParameter(name)) if name == "v_numFW"));
    }

    #[test]
    fn test_baseline_plots_no_histograms() {
        let job = job(ModelVariant::Baseline);
        assert!(plotted_coefficients(&job).is_empty());
        let report = PosteriorReport::build(&job, &fit(), 30).unwrap();
        assert!(report.histograms.is_empty());
    }
}
