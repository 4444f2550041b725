use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Activity counts for one piece of gear over a date range.
#[derive(Debug, Serialize, Deserialize, sqlx::FromRow, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GearUsage {
    pub id: Uuid,
    pub gear_name: String,
    pub request_count: i64,
    pub checkout_count: i64,
    pub checkin_count: i64,
    pub booking_count: i64,
    pub damage_count: i64,
}

impl GearUsage {
    /// Sum of the five activity counts for this row.
    pub fn total_activity(&self) -> i64 {
        self.request_count
            + self.checkout_count
            + self.checkin_count
            + self.booking_count
            + self.damage_count
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeeklyUsageReport {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub gear_usage: Vec<GearUsage>,
}

impl WeeklyUsageReport {
    pub fn totals(&self) -> ReportTotals {
        ReportTotals::from_usage(&self.gear_usage)
    }

    /// Title used for exported documents.
    pub fn title(&self) -> String {
        format!(
            "Gear Activity Report: {} to {}",
            self.start_date, self.end_date
        )
    }

    /// File name stem shared by the CSV and PDF exports.
    pub fn file_stem(&self) -> String {
        format!("gear-activity-report_{}_{}", self.start_date, self.end_date)
    }
}

/// Column sums across every row of a report.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReportTotals {
    pub requests: i64,
    pub checkouts: i64,
    pub checkins: i64,
    pub bookings: i64,
    pub damages: i64,
}

impl ReportTotals {
    pub fn from_usage(rows: &[GearUsage]) -> Self {
        rows.iter().fold(Self::default(), |acc, gear| Self {
            requests: acc.requests + gear.request_count,
            checkouts: acc.checkouts + gear.checkout_count,
            checkins: acc.checkins + gear.checkin_count,
            bookings: acc.bookings + gear.booking_count,
            damages: acc.damages + gear.damage_count,
        })
    }

    pub fn total_activity(&self) -> i64 {
        self.requests + self.checkouts + self.checkins + self.bookings + self.damages
    }
}

/// A report row as returned by the API: the counts plus the row total.
#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GearUsageRow {
    #[serde(flatten)]
    pub usage: GearUsage,
    pub total_activity: i64,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UsageReportView {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub gear_usage: Vec<GearUsageRow>,
    pub totals: ReportTotals,
}

impl From<&WeeklyUsageReport> for UsageReportView {
    fn from(report: &WeeklyUsageReport) -> Self {
        Self {
            start_date: report.start_date,
            end_date: report.end_date,
            gear_usage: report
                .gear_usage
                .iter()
                .map(|usage| GearUsageRow {
                    total_activity: usage.total_activity(),
                    usage: usage.clone(),
                })
                .collect(),
            totals: report.totals(),
        }
    }
}

/// The Monday..=Sunday week containing `today`.
pub fn week_containing(today: NaiveDate) -> (NaiveDate, NaiveDate) {
    let offset = u64::from(today.weekday().num_days_from_monday());
    let start = today.checked_sub_days(Days::new(offset)).unwrap_or(today);
    let end = start.checked_add_days(Days::new(6)).unwrap_or(start);
    (start, end)
}

/// Format an integer with comma thousands separators (`12345` → `12,345`).
pub fn format_number(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canon_r5() -> GearUsage {
        GearUsage {
            id: Uuid::new_v4(),
            gear_name: "Canon R5".into(),
            request_count: 3,
            checkout_count: 2,
            checkin_count: 2,
            booking_count: 1,
            damage_count: 0,
        }
    }

    #[test]
    fn test_row_total_sums_all_counts() {
        assert_eq!(canon_r5().total_activity(), 8);
    }

    #[test]
    fn test_totals_are_fieldwise_sums() {
        let mut sony = canon_r5();
        sony.gear_name = "Sony A7 IV".into();
        sony.damage_count = 4;

        let totals = ReportTotals::from_usage(&[canon_r5(), sony]);
        assert_eq!(
            totals,
            ReportTotals {
                requests: 6,
                checkouts: 4,
                checkins: 4,
                bookings: 2,
                damages: 4,
            }
        );
        assert_eq!(totals.total_activity(), 20);
    }

    #[test]
    fn test_empty_report_has_zero_totals() {
        assert_eq!(ReportTotals::from_usage(&[]), ReportTotals::default());
    }

    #[test]
    fn test_view_carries_row_totals() {
        let report = WeeklyUsageReport {
            start_date: NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 5, 12).unwrap(),
            gear_usage: vec![canon_r5()],
        };
        let view = UsageReportView::from(&report);
        assert_eq!(view.gear_usage[0].total_activity, 8);
        assert_eq!(view.totals.requests, 3);

        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["gearUsage"][0]["gearName"], "Canon R5");
        assert_eq!(json["gearUsage"][0]["totalActivity"], 8);
        assert_eq!(json["startDate"], "2024-05-06");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(0), "0");
        assert_eq!(format_number(999), "999");
        assert_eq!(format_number(1000), "1,000");
        assert_eq!(format_number(1234567), "1,234,567");
        assert_eq!(format_number(-12345), "-12,345");
    }

    #[test]
    fn test_week_containing_starts_on_monday() {
        // 2024-05-09 is a Thursday
        let (start, end) = week_containing(NaiveDate::from_ymd_opt(2024, 5, 9).unwrap());
        assert_eq!(start, NaiveDate::from_ymd_opt(2024, 5, 6).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2024, 5, 12).unwrap());
    }

    #[test]
    fn test_title_and_file_stem() {
        let report = WeeklyUsageReport {
            start_date: NaiveDate::from_ymd_opt(2024, 5, 6).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 5, 12).unwrap(),
            gear_usage: vec![],
        };
        assert_eq!(report.title(), "Gear Activity Report: 2024-05-06 to 2024-05-12");
        assert_eq!(report.file_stem(), "gear-activity-report_2024-05-06_2024-05-12");
    }
}
