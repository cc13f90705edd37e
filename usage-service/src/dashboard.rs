use std::{fmt::Write as _, path::Path};

use energy_client::{
    aggregate::{self, AlertLevel, DashboardSummary},
    store, ReadError, UsageRecord, UserName,
};
use serde::Serialize;

use crate::metrics_server::{DASHBOARD_VIEWS, STORE_ROWS_DROPPED};

const BAR_WIDTH: usize = 30;

/// What the dashboard can show for a request.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardView {
    /// No name has been given in this session.
    MissingUser,
    /// The store has not been created yet.
    NoStore,
    NoRecords { user: UserName },
    ReadFailed(String),
    Summary { user: UserName, summary: DashboardSummary },
}

impl DashboardView {
    /// Whether the view reports a store that could not be read.
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::ReadFailed(_))
    }
}

/// Load, filter and summarize the store for `user`.
pub fn load(store_path: &Path, user: Option<&UserName>, recent_limit: usize) -> DashboardView {
    let Some(user) = user else {
        return DashboardView::MissingUser;
    };

    metrics::counter!(DASHBOARD_VIEWS).increment(1);

    let snapshot = match store::load_all(store_path) {
        Ok(s) => s,
        Err(ReadError::StoreNotFound(path)) => {
            tracing::debug!(path = %path.display(), "usage store not created yet");
            return DashboardView::NoStore;
        }
        Err(e @ ReadError::StoreParse(_)) => {
            tracing::error!(error = %e, "failed to read usage store");
            return DashboardView::ReadFailed(e.to_string());
        }
    };

    if snapshot.dropped_rows > 0 {
        metrics::counter!(STORE_ROWS_DROPPED).increment(snapshot.dropped_rows as u64);
        tracing::debug!(dropped = snapshot.dropped_rows, "skipped malformed store rows");
    }
    tracing::debug!(user = %user, users = ?snapshot.users(), "users in store");

    let records = snapshot.for_user(user);
    if records.is_empty() {
        return DashboardView::NoRecords { user: user.clone() };
    }

    DashboardView::Summary {
        user: user.clone(),
        summary: aggregate::summarize(&records, recent_limit),
    }
}

pub fn alert_message(level: AlertLevel) -> &'static str {
    match level {
        AlertLevel::High => "High energy usage detected! Consider turning off unused appliances.",
        AlertLevel::Moderate => "Moderate energy consumption. Monitor regularly.",
        AlertLevel::Optimal => "Energy usage is within optimal range.",
    }
}

pub fn render(view: &DashboardView) -> String {
    let mut out = String::from("Your Energy Dashboard\n\n");

    match view {
        DashboardView::MissingUser => {
            out.push_str("Please log your name first in 'Log Data'.\n");
        }
        DashboardView::NoStore => {
            out.push_str("No data file found yet. Please log some usage first.\n");
        }
        DashboardView::NoRecords { .. } => {
            out.push_str("No data logged yet for you. Go to 'Log Data' and add some!\n");
        }
        DashboardView::ReadFailed(diagnostic) => {
            let _ = writeln!(out, "Error reading data file.\n  {diagnostic}");
        }
        DashboardView::Summary { user, summary } => render_summary(&mut out, user, summary),
    }

    out
}

fn render_summary(out: &mut String, user: &UserName, summary: &DashboardSummary) {
    let _ = writeln!(out, "Recent Logs for {user}");
    render_recent(out, &summary.recent);

    let _ = writeln!(out, "\nTotal Energy Used (kWh): {:.2}", summary.total_energy_kwh);
    let _ = writeln!(out, "Estimated Cost (INR):    \u{20b9}{:.2}", summary.estimated_cost);

    let _ = writeln!(out, "\nEnergy Alerts");
    let _ = writeln!(out, "  [{}] {}", summary.alert, alert_message(summary.alert));

    let _ = writeln!(out, "\nUsage per Appliance");
    let bars: Vec<(String, f64)> = summary
        .per_appliance
        .iter()
        .map(|(name, kwh)| (name.clone(), *kwh))
        .collect();
    render_bars(out, &bars);

    let _ = writeln!(out, "\nEnergy Usage Over Time");
    let points: Vec<(String, f64)> = summary
        .time_series
        .iter()
        .map(|b| (format_ts(&b.timestamp), b.energy_kwh))
        .collect();
    render_bars(out, &points);
}

fn render_recent(out: &mut String, records: &[UsageRecord]) {
    let _ = writeln!(
        out,
        "  {:<19}  {:<12}  {:<16}  {:>6}  {:>9}  {:>10}",
        "Timestamp", "User", "Appliance", "Status", "KW_Rating", "Energy_kWh"
    );
    for r in records {
        let _ = writeln!(
            out,
            "  {:<19}  {:<12}  {:<16}  {:>6}  {:>9}  {:>10.2}",
            format_ts(&r.timestamp),
            r.user,
            r.appliance,
            r.status,
            r.kw_rating,
            r.energy_kwh
        );
    }
}

/// Horizontal bars scaled to the largest value.
fn render_bars(out: &mut String, rows: &[(String, f64)]) {
    let label_width = rows.iter().map(|(l, _)| l.chars().count()).max().unwrap_or(0);
    let max = rows.iter().map(|(_, v)| *v).fold(0.0_f64, f64::max);

    for (label, value) in rows {
        let len = if max > 0.0 {
            ((value / max) * BAR_WIDTH as f64).round() as usize
        } else {
            0
        };
        let _ = writeln!(
            out,
            "  {label:<label_width$}  {bar:<BAR_WIDTH$}  {value:.2}",
            bar = "#".repeat(len)
        );
    }
}

fn format_ts(ts: &time::PrimitiveDateTime) -> String {
    ts.format(energy_client::domain::usage_record::TIMESTAMP_FORMAT)
        .unwrap_or_else(|_| ts.to_string())
}

#[derive(Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
enum JsonView<'a> {
    MissingUser,
    NoStore,
    NoRecords { user: &'a str },
    ReadFailed { error: &'a str },
    Ok {
        user: &'a str,
        alert_message: &'static str,
        summary: &'a DashboardSummary,
    },
}

pub fn render_json(view: &DashboardView) -> serde_json::Result<String> {
    let json = match view {
        DashboardView::MissingUser => JsonView::MissingUser,
        DashboardView::NoStore => JsonView::NoStore,
        DashboardView::NoRecords { user } => JsonView::NoRecords { user: user.as_str() },
        DashboardView::ReadFailed(error) => JsonView::ReadFailed { error },
        DashboardView::Summary { user, summary } => JsonView::Ok {
            user: user.as_str(),
            alert_message: alert_message(summary.alert),
            summary,
        },
    };
    serde_json::to_string_pretty(&json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    const HEADER: &str = "Timestamp,User,Appliance,Status,KW_Rating,Energy_kWh\n";

    fn temp_store(contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("dashboard-{}.csv", uuid::Uuid::new_v4()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    fn ana() -> UserName {
        UserName::parse("Ana").unwrap()
    }

    #[test]
    fn missing_user_short_circuits() {
        let view = load(Path::new("unused.csv"), None, 10);
        assert_eq!(view, DashboardView::MissingUser);
        assert!(render(&view).contains("Please log your name first"));
    }

    #[test]
    fn missing_store_and_no_rows_render_differently() {
        let missing = std::env::temp_dir().join(format!("absent-{}.csv", uuid::Uuid::new_v4()));
        let view = load(&missing, Some(&ana()), 10);
        assert_eq!(view, DashboardView::NoStore);
        assert!(render(&view).contains("No data file found yet"));

        let path = temp_store(&format!("{HEADER}2024-01-01 10:00:00,Ben,Lights,1,0.08,0.07\n"));
        let view = load(&path, Some(&ana()), 10);
        assert!(matches!(view, DashboardView::NoRecords { .. }));
        assert!(render(&view).contains("No data logged yet for you"));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn summary_shows_totals_alert_and_charts() {
        let path = temp_store(&format!(
            "{HEADER}2024-01-01 10:00:00,Ana,Air Conditioner,1,1.5,1.5\n\
             2024-01-01 10:00:00,Ana,Microwave,1,1.2,1.25\n\
             2024-01-01 10:00:00,Ana,Lights,1,0.08,oops\n\
             2024-01-02 09:30:00, ana ,Air Conditioner,1,1.5,1.75\n"
        ));

        let view = load(&path, Some(&ana()), 10);
        let DashboardView::Summary { summary, .. } = &view else {
            panic!("expected summary, got {view:?}");
        };
        assert!((summary.total_energy_kwh - 4.5).abs() < 1e-9);
        assert_eq!(summary.alert, AlertLevel::Optimal);
        assert_eq!(summary.recent.len(), 3);

        let text = render(&view);
        assert!(text.contains("Recent Logs for Ana"));
        assert!(text.contains("Total Energy Used (kWh): 4.50"));
        assert!(text.contains("\u{20b9}36.00"));
        assert!(text.contains("Energy usage is within optimal range."));
        assert!(text.contains("2024-01-02 09:30:00"));
        assert!(text.contains(&"#".repeat(BAR_WIDTH)));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn json_view_carries_status_tag() {
        let json = render_json(&DashboardView::NoStore).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["status"], "no_store");

        let path = temp_store(&format!(
            "{HEADER}2024-01-01 10:00:00,Ana,Microwave,1,1.2,1.2\n"
        ));
        let view = load(&path, Some(&ana()), 10);
        let value: serde_json::Value = serde_json::from_str(&render_json(&view).unwrap()).unwrap();
        assert_eq!(value["status"], "ok");
        assert_eq!(value["user"], "Ana");
        assert_eq!(value["summary"]["alert"], "Optimal");
        assert_eq!(value["summary"]["time_series"][0]["timestamp"], "2024-01-01 10:00:00");
        assert_eq!(value["summary"]["recent"][0]["appliance"], "Microwave");
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn high_usage_is_flagged() {
        let path = temp_store(&format!(
            "{HEADER}2024-01-01 10:00:00,Ana,Air Conditioner,1,1.5,1.8\n\
             2024-01-01 11:00:00,Ana,Air Conditioner,1,1.5,1.8\n\
             2024-01-01 12:00:00,Ana,Air Conditioner,1,1.5,1.8\n\
             2024-01-01 13:00:00,Ana,Air Conditioner,1,1.5,1.8\n\
             2024-01-01 14:00:00,Ana,Air Conditioner,1,1.5,1.8\n\
             2024-01-01 15:00:00,Ana,Air Conditioner,1,1.5,1.8\n"
        ));

        let text = render(&load(&path, Some(&ana()), 10));
        assert!(text.contains("[High] High energy usage detected!"));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn moderate_usage_is_flagged() {
        let path = temp_store(&format!(
            "{HEADER}2024-01-01 10:00:00,Ana,Air Conditioner,1,1.5,1.5\n\
             2024-01-01 11:00:00,Ana,Air Conditioner,1,1.5,1.5\n\
             2024-01-01 12:00:00,Ana,Air Conditioner,1,1.5,1.5\n\
             2024-01-01 13:00:00,Ana,Air Conditioner,1,1.5,1.5\n"
        ));

        let text = render(&load(&path, Some(&ana()), 10));
        assert!(text.contains("[Moderate] Moderate energy consumption. Monitor regularly."));
        assert!(!text.contains("[High]"));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn unreadable_header_reports_read_failure() {
        let path = std::env::temp_dir().join(format!("dashboard-{}.csv", uuid::Uuid::new_v4()));
        std::fs::write(&path, b"Time\xff,User\n2024-01-01 10:00:00,Ana\n").unwrap();

        let view = load(&path, Some(&ana()), 10);
        let DashboardView::ReadFailed(diagnostic) = &view else {
            panic!("expected read failure, got {view:?}");
        };
        assert!(view.is_failure());
        assert!(diagnostic.contains("failed to read store header"));

        let text = render(&view);
        assert!(text.contains("Error reading data file."));
        assert!(text.contains(diagnostic.as_str()));
        std::fs::remove_file(path).unwrap();
    }

    #[test]
    fn only_read_failure_is_a_failure() {
        assert!(!DashboardView::MissingUser.is_failure());
        assert!(!DashboardView::NoStore.is_failure());
        assert!(!DashboardView::NoRecords { user: ana() }.is_failure());
    }
}
