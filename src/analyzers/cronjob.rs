//! CronJob checks.
//!
//! Rule precedence: a suspended CronJob reports only the suspension. Its
//! schedule and starting deadline are not checked because suspension already
//! explains why it does not run. For unsuspended CronJobs the schedule and
//! deadline rules are independent and may both fire.

use super::{AnalysisResult, Analyzer, AnalyzerResult, ExecutionContext, Failure, PreAnalysis};
use async_trait::async_trait;
use croner::Cron;
use k8s_openapi::api::batch::v1::CronJob;
use kube::ResourceExt;
use tracing::{debug, info};

const KIND: &str = "CronJob";

/// Errors produced while validating a cron schedule
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ScheduleError {
    #[error("invalid schedule format {raw:?}: {cause}")]
    InvalidScheduleFormat { raw: String, cause: String },
}

/// Check that `schedule` is a standard five-field cron expression, optionally
/// prefixed with a `TZ=` or `CRON_TZ=` time zone.
/// `@every <duration>` schedules are accepted when the duration is positive.
pub fn check_cron_schedule(schedule: &str) -> Result<(), ScheduleError> {
    let expression = strip_time_zone(schedule.trim());

    if let Some(interval) = expression.strip_prefix("@every") {
        return parse_interval(interval.trim())
            .map(|_| ())
            .map_err(|cause| ScheduleError::InvalidScheduleFormat {
                raw: schedule.to_string(),
                cause,
            });
    }

    Cron::new(expression)
        .parse()
        .map(|_| ())
        .map_err(|e| ScheduleError::InvalidScheduleFormat {
            raw: schedule.to_string(),
            cause: e.to_string(),
        })
}

/// Parse a duration such as `90s`, `1h30m` or `1.5h` into seconds.
fn parse_interval(raw: &str) -> Result<f64, String> {
    if raw.is_empty() {
        return Err("missing duration after @every".to_string());
    }

    let mut seconds = 0.0;
    let mut rest = raw;
    while !rest.is_empty() {
        let number_len = rest
            .find(|c: char| !(c.is_ascii_digit() || c == '.'))
            .unwrap_or(rest.len());
        let value: f64 = rest[..number_len]
            .parse()
            .map_err(|_| format!("invalid duration {:?}", raw))?;
        rest = &rest[number_len..];

        let unit_len = rest
            .find(|c: char| c.is_ascii_digit() || c == '.')
            .unwrap_or(rest.len());
        let scale = match &rest[..unit_len] {
            "h" => 3600.0,
            "m" => 60.0,
            "s" => 1.0,
            "ms" => 1e-3,
            "us" | "µs" => 1e-6,
            "ns" => 1e-9,
            "" => return Err(format!("missing unit in duration {:?}", raw)),
            unit => return Err(format!("unknown unit {:?} in duration {:?}", unit, raw)),
        };
        seconds += value * scale;
        rest = &rest[unit_len..];
    }

    if seconds <= 0.0 {
        return Err(format!("duration {:?} must be positive", raw));
    }
    Ok(seconds)
}

fn strip_time_zone(schedule: &str) -> &str {
    for prefix in ["CRON_TZ=", "TZ="] {
        if let Some(rest) = schedule.strip_prefix(prefix) {
            return rest
                .split_once(char::is_whitespace)
                .map(|(_, expression)| expression.trim_start())
                .unwrap_or("");
        }
    }
    schedule
}

/// Flags suspended CronJobs, unparsable schedules and negative starting deadlines
pub struct CronJobAnalyzer;

impl CronJobAnalyzer {
    fn evaluate(cron_job: &CronJob) -> Vec<Failure> {
        let namespace = cron_job.namespace().unwrap_or_default();
        let name = cron_job.name_any();
        let failure = |text: String| {
            Failure::new(text)
                .with_sensitive(namespace.clone())
                .with_sensitive(name.clone())
        };

        let Some(spec) = cron_job.spec.as_ref() else {
            return Vec::new();
        };

        if spec.suspend == Some(true) {
            return vec![failure(format!("CronJob {} is suspended", name))];
        }

        let mut failures = Vec::new();

        if let Err(ScheduleError::InvalidScheduleFormat { cause, .. }) =
            check_cron_schedule(&spec.schedule)
        {
            debug!("CronJob {}/{} has invalid schedule {:?}", namespace, name, spec.schedule);
            failures.push(failure(format!(
                "CronJob {} has an invalid schedule: {}",
                name, cause
            )));
        }

        if let Some(deadline) = spec.starting_deadline_seconds {
            if deadline < 0 {
                failures.push(failure(format!(
                    "CronJob {} has a negative starting deadline",
                    name
                )));
            }
        }

        failures
    }
}

#[async_trait]
impl Analyzer for CronJobAnalyzer {
    async fn analyze(&self, ctx: &ExecutionContext) -> AnalyzerResult<Vec<AnalysisResult>> {
        ctx.metrics.reset(KIND);

        let cron_jobs = ctx
            .list(KIND, ctx.client.list_cron_jobs(&ctx.namespace))
            .await?;
        debug!("Evaluating {} cron jobs", cron_jobs.len());

        let mut pre_analysis = PreAnalysis::new();
        for cron_job in &cron_jobs {
            let failures = Self::evaluate(cron_job);
            pre_analysis.record(
                &cron_job.namespace().unwrap_or_default(),
                &cron_job.name_any(),
                failures,
            );
        }

        let results = ctx.publish(KIND, pre_analysis);
        info!("CronJob analysis completed with {} results", results.len());
        Ok(results)
    }

    fn kind(&self) -> &str {
        KIND
    }

    fn description(&self) -> &str {
        "Suspended CronJobs, invalid schedules and negative starting deadlines"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analyzers::test_support::context_for;
    use crate::mask::mask;

    fn cron_job(namespace: &str, name: &str, schedule: &str, extra: &str) -> String {
        format!(
            r#"---
apiVersion: batch/v1
kind: CronJob
metadata:
  name: {name}
  namespace: {namespace}
spec:
  schedule: "{schedule}"
  jobTemplate: {{}}
{extra}
"#
        )
    }

    #[test]
    fn test_valid_schedules() {
        for schedule in [
            "* * * * *",
            "0 3 * * *",
            "*/15 * * * *",
            "0 0 1 1 *",
            "30 6 * * 1-5",
            "TZ=Europe/Warsaw 0 3 * * *",
            "@hourly",
            "@daily",
            "@every 5m",
            "@every 1h30m",
            "@every 1.5h",
        ] {
            assert!(check_cron_schedule(schedule).is_ok(), "{} should be valid", schedule);
        }
    }

    #[test]
    fn test_invalid_schedules() {
        for schedule in [
            "* * *",
            "not a schedule",
            "61 * * * *",
            "",
            "@every",
            "@every 0s",
            "@every 5",
            "@every 5 minutes",
        ] {
            let err = check_cron_schedule(schedule).unwrap_err();
            let ScheduleError::InvalidScheduleFormat { raw, cause } = err;
            assert_eq!(raw, schedule);
            assert!(!cause.is_empty());
        }
    }

    #[tokio::test]
    async fn test_invalid_schedule_yields_single_failure() {
        let (ctx, metrics) = context_for(&cron_job("ops", "backup", "* * *", "  suspend: false"));

        let results = CronJobAnalyzer.analyze(&ctx).await.unwrap();

        assert_eq!(results.len(), 1);
        let result = &results[0];
        assert_eq!(result.kind, "CronJob");
        assert_eq!(result.name, "ops/backup");
        assert_eq!(result.error.len(), 1);

        let failure = &result.error[0];
        assert!(failure.text.starts_with("CronJob backup has an invalid schedule: "));
        let cause = match check_cron_schedule("* * *") {
            Err(ScheduleError::InvalidScheduleFormat { cause, .. }) => cause,
            Ok(()) => unreachable!(),
        };
        assert!(failure.text.ends_with(&cause));

        let unmasked: Vec<&str> = failure.sensitive.iter().map(|s| s.unmasked.as_str()).collect();
        assert_eq!(unmasked, vec!["ops", "backup"]);
        assert_eq!(failure.sensitive[0].masked, mask("ops"));
        assert_eq!(failure.sensitive[1].masked, mask("backup"));

        assert_eq!(metrics.value("CronJob", "backup", "ops"), Some(1.0));
    }

    #[tokio::test]
    async fn test_suspension_takes_precedence() {
        let manifest = cron_job(
            "batch",
            "nightly",
            "* * *",
            "  suspend: true\n  startingDeadlineSeconds: -10",
        );
        let (ctx, _) = context_for(&manifest);

        let results = CronJobAnalyzer.analyze(&ctx).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].name, "batch/nightly");
        assert_eq!(results[0].error.len(), 1);
        assert_eq!(results[0].error[0].text, "CronJob nightly is suspended");
    }

    #[tokio::test]
    async fn test_interval_schedule_is_healthy() {
        let (ctx, _) = context_for(&cron_job("ops", "sync", "@every 1h", ""));

        let results = CronJobAnalyzer.analyze(&ctx).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_negative_deadline() {
        let manifest = cron_job("ops", "report", "0 3 * * *", "  startingDeadlineSeconds: -5");
        let (ctx, _) = context_for(&manifest);

        let results = CronJobAnalyzer.analyze(&ctx).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].error.len(), 1);
        assert_eq!(
            results[0].error[0].text,
            "CronJob report has a negative starting deadline"
        );
    }

    #[tokio::test]
    async fn test_invalid_schedule_and_negative_deadline_both_reported() {
        let manifest = cron_job("ops", "broken", "every day", "  startingDeadlineSeconds: -1");
        let (ctx, metrics) = context_for(&manifest);

        let results = CronJobAnalyzer.analyze(&ctx).await.unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results[0].error.len(), 2);
        assert!(results[0].error[0].text.contains("invalid schedule"));
        assert!(results[0].error[1].text.contains("negative starting deadline"));
        assert_eq!(metrics.value("CronJob", "broken", "ops"), Some(2.0));
    }

    #[tokio::test]
    async fn test_healthy_cron_jobs_yield_nothing() {
        let manifests = [
            cron_job("ops", "hourly", "0 * * * *", ""),
            cron_job("ops", "zero-deadline", "0 * * * *", "  startingDeadlineSeconds: 0"),
            cron_job("ops", "with-deadline", "0 * * * *", "  startingDeadlineSeconds: 200\n  suspend: false"),
        ]
        .concat();
        let (ctx, metrics) = context_for(&manifests);

        let results = CronJobAnalyzer.analyze(&ctx).await.unwrap();

        assert!(results.is_empty());
        assert_eq!(metrics.series_count("CronJob"), 0);
    }

    #[tokio::test]
    async fn test_results_follow_listing_order() {
        let manifests = [
            cron_job("b", "second", "bad", ""),
            cron_job("a", "first", "0 * * * *", "  suspend: true"),
            cron_job("c", "fine", "0 * * * *", ""),
            cron_job("a", "third", "0 * * * *", "  startingDeadlineSeconds: -3"),
        ]
        .concat();
        let (ctx, _) = context_for(&manifests);

        let results = CronJobAnalyzer.analyze(&ctx).await.unwrap();
        let names: Vec<&str> = results.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["b/second", "a/first", "a/third"]);
    }

    #[tokio::test]
    async fn test_stale_series_cleared_on_rerun() {
        let (ctx, metrics) = context_for(&cron_job("ops", "backup", "0 * * * *", ""));
        metrics.set("CronJob", "deleted-job", "ops", 1);
        metrics.set("Pod", "web-0", "default", 2);

        let results = CronJobAnalyzer.analyze(&ctx).await.unwrap();

        assert!(results.is_empty());
        assert_eq!(metrics.value("CronJob", "deleted-job", "ops"), None);
        assert_eq!(metrics.value("Pod", "web-0", "default"), Some(2.0));
    }

    #[tokio::test]
    async fn test_listing_failure_is_fatal() {
        use crate::analyzers::test_support::context_with_client;
        use crate::client::InMemoryClusterClient;

        let client = InMemoryClusterClient::from_manifests_str(&cron_job("ops", "backup", "* * *", ""))
            .unwrap()
            .with_failure("CronJob", "the server could not find the requested resource");
        let (ctx, metrics) = context_with_client(client);

        let err = CronJobAnalyzer.analyze(&ctx).await.unwrap_err();
        assert!(matches!(err, crate::analyzers::AnalyzerError::List { .. }));
        assert_eq!(metrics.series_count("CronJob"), 0);
    }
}
