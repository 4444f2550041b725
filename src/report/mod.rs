//! Gear activity reporting: a session that generates a report for a date
//! range, keeps the last good one, and exports it.

pub mod export;

use std::sync::Arc;

use chrono::NaiveDate;
use serde::Deserialize;
use thiserror::Error;

use crate::models::report::{ReportTotals, WeeklyUsageReport};
use crate::store::UsageReportSource;
use export::ExportFile;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ReportError {
    #[error("Please select a date range")]
    MissingRange,

    #[error("Failed to generate report. Please try again.")]
    Failed,
}

/// A possibly incomplete date range, as selected by the caller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self {
            from: Some(from),
            to: Some(to),
        }
    }

    pub fn bounds(&self) -> Option<(NaiveDate, NaiveDate)> {
        Some((self.from?, self.to?))
    }
}

/// Sets `loading` while alive. Dropping it clears the flag, also when the fetch is cancelled.
struct LoadingGuard<'a>(&'a mut bool);

impl<'a> LoadingGuard<'a> {
    fn set(flag: &'a mut bool) -> Self {
        *flag = true;
        Self(flag)
    }
}

impl Drop for LoadingGuard<'_> {
    fn drop(&mut self) {
        *self.0 = false;
    }
}

pub struct ReportSession {
    source: Arc<dyn UsageReportSource>,
    report: Option<WeeklyUsageReport>,
    loading: bool,
    error: Option<ReportError>,
}

impl ReportSession {
    pub fn new(source: Arc<dyn UsageReportSource>) -> Self {
        Self {
            source,
            report: None,
            loading: false,
            error: None,
        }
    }

    pub fn report(&self) -> Option<&WeeklyUsageReport> {
        self.report.as_ref()
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// The user-facing message of the last failed generation.
    pub fn error(&self) -> Option<&ReportError> {
        self.error.as_ref()
    }

    /// Column totals of the held report.
    pub fn totals(&self) -> Option<ReportTotals> {
        self.report.as_ref().map(WeeklyUsageReport::totals)
    }

    /// Validate the range and fetch a fresh report. A missing endpoint makes
    /// no fetch; a failed fetch clears any previously held report.
    ///
    /// The `&mut` receiver keeps a second generation out while one is
    /// pending. A generation dropped mid-fetch leaves the session idle.
    pub async fn generate(
        &mut self,
        range: DateRange,
    ) -> Result<&WeeklyUsageReport, ReportError> {
        let Some((from, to)) = range.bounds() else {
            self.error = Some(ReportError::MissingRange);
            return Err(ReportError::MissingRange);
        };

        self.error = None;
        let result = {
            let _loading = LoadingGuard::set(&mut self.loading);
            self.source.generate_usage_report_for_range(from, to).await
        };

        match result {
            Ok(report) => {
                tracing::info!(
                    %from,
                    %to,
                    rows = report.gear_usage.len(),
                    "generated usage report"
                );
                Ok(self.report.insert(report))
            }
            Err(e) => {
                tracing::error!(%from, %to, "Error generating report: {:#}", e);
                self.report = None;
                self.error = Some(ReportError::Failed);
                Err(ReportError::Failed)
            }
        }
    }

    /// CSV export of the held report; `None` when there is no report.
    pub fn download_as_csv(&self) -> anyhow::Result<Option<ExportFile>> {
        self.report.as_ref().map(export::generate_csv_report).transpose()
    }

    /// PDF export of the held report; `None` when there is no report.
    pub fn download_as_pdf(&self) -> anyhow::Result<Option<ExportFile>> {
        self.report
            .as_ref()
            .map(|r| export::generate_pdf_report(r, &r.title()))
            .transpose()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::report::GearUsage;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
    use std::time::Duration;
    use uuid::Uuid;

    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
        fail: AtomicBool,
        delay_ms: AtomicU64,
    }

    #[async_trait]
    impl UsageReportSource for CountingSource {
        async fn generate_usage_report_for_range(
            &self,
            from: NaiveDate,
            to: NaiveDate,
        ) -> anyhow::Result<WeeklyUsageReport> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let delay = self.delay_ms.load(Ordering::SeqCst);
            if delay > 0 {
                tokio::time::sleep(Duration::from_millis(delay)).await;
            }
            if self.fail.load(Ordering::SeqCst) {
                anyhow::bail!("relation \"gear_bookings\" does not exist");
            }
            Ok(WeeklyUsageReport {
                start_date: from,
                end_date: to,
                gear_usage: vec![GearUsage {
                    id: Uuid::new_v4(),
                    gear_name: "Canon R5".into(),
                    request_count: 3,
                    checkout_count: 2,
                    checkin_count: 2,
                    booking_count: 1,
                    damage_count: 0,
                }],
            })
        }
    }

    fn may(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
    }

    #[tokio::test]
    async fn test_missing_endpoint_is_rejected_without_fetch() {
        let source = Arc::new(CountingSource::default());
        let mut session = ReportSession::new(source.clone());

        let range = DateRange {
            from: Some(may(6)),
            to: None,
        };
        assert_eq!(session.generate(range).await.unwrap_err(), ReportError::MissingRange);
        assert_eq!(session.error().unwrap().to_string(), "Please select a date range");
        assert_eq!(source.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_success_holds_report_and_totals() {
        let source = Arc::new(CountingSource::default());
        let mut session = ReportSession::new(source);

        let report = session.generate(DateRange::new(may(6), may(12))).await.unwrap();
        assert_eq!(report.gear_usage[0].total_activity(), 8);
        assert_eq!(session.totals().unwrap().requests, 3);
        assert!(session.error().is_none());
        assert!(!session.is_loading());
    }

    #[tokio::test]
    async fn test_failure_drops_previous_report() {
        let source = Arc::new(CountingSource::default());
        let mut session = ReportSession::new(source.clone());
        session.generate(DateRange::new(may(6), may(12))).await.unwrap();

        source.fail.store(true, Ordering::SeqCst);
        let err = session.generate(DateRange::new(may(13), may(19))).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to generate report. Please try again.");
        assert!(session.report().is_none());
        assert!(!session.is_loading());
    }

    #[tokio::test(start_paused = true)]
    async fn test_cancelled_generation_leaves_session_usable() {
        let source = Arc::new(CountingSource::default());
        source.delay_ms.store(200, Ordering::SeqCst);
        let mut session = ReportSession::new(source.clone());

        let timed_out = tokio::time::timeout(
            Duration::from_millis(10),
            session.generate(DateRange::new(may(6), may(12))),
        )
        .await;
        assert!(timed_out.is_err());
        assert!(!session.is_loading());

        source.delay_ms.store(0, Ordering::SeqCst);
        let report = session.generate(DateRange::new(may(6), may(12))).await.unwrap();
        assert_eq!(report.gear_usage[0].gear_name, "Canon R5");
        assert_eq!(source.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_exports_are_noops_without_report() {
        let session = ReportSession::new(Arc::new(CountingSource::default()));
        assert!(session.download_as_csv().unwrap().is_none());
        assert!(session.download_as_pdf().unwrap().is_none());
    }

    #[tokio::test]
    async fn test_exports_use_held_report() {
        let mut session = ReportSession::new(Arc::new(CountingSource::default()));
        session.generate(DateRange::new(may(6), may(12))).await.unwrap();

        let csv = session.download_as_csv().unwrap().unwrap();
        assert_eq!(csv.file_name, "gear-activity-report_2024-05-06_2024-05-12.csv");
        let pdf = session.download_as_pdf().unwrap().unwrap();
        assert!(pdf.bytes.starts_with(b"%PDF"));
    }
}
