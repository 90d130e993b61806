//! Text rendering of the dashboard.
//!
//! Every render rebuilds the whole screen from one [`DashboardSnapshot`];
//! nothing here keeps state between calls. The per-section formatters are
//! public so the one-shot CLI commands print the same tables.

use crate::analytics::{breakdown_shares, AnalyticsCache, HeatmapView, TopRiskView};
use crate::client::{HealthReport, HealthTier, MetricsSnapshot, SearchResult};
use crate::risk::{filter_results, format_percentage, CategoryFilter, RiskCategory};
use crate::state::{ConnectionStatus, ConnectionState, DashboardSnapshot, Notice, NoticeLevel, SearchState};
use colored::Colorize;
use comfy_table::{presets::UTF8_FULL, Cell, ContentArrangement, Table};

/// Placeholder for a slice that has never loaded or failed to load.
pub const NO_DATA: &str = "No data available";

fn new_table<I, T>(header: I) -> Table
where
    I: IntoIterator<Item = T>,
    T: Into<Cell>,
{
    let mut table = Table::new();
    table.load_preset(UTF8_FULL);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(header);
    table
}

fn heading(title: &str) -> String {
    format!("{}", title.bold().underline())
}

fn no_data() -> String {
    NO_DATA.dimmed().to_string()
}

/// Render the complete dashboard.
pub fn render_dashboard(snapshot: &DashboardSnapshot) -> String {
    let mut sections = vec![format!(
        "{}  {}",
        "rxwatch".bold().cyan(),
        "Medication name confusion-risk monitor".dimmed()
    )];

    let mut status_lines = vec![format_connection(&snapshot.connection)];
    status_lines.push(match &snapshot.health {
        Some(report) => format_health_line(report),
        None => format!("Backend: {}", "not checked".dimmed()),
    });
    if snapshot.is_busy() {
        status_lines.push("Working...".yellow().to_string());
    }
    sections.push(status_lines.join("\n"));

    sections.push(format!(
        "{}\n{}",
        heading("Live Metrics"),
        match &snapshot.metrics {
            Some(metrics) => format_metrics(metrics),
            None => no_data(),
        }
    ));

    sections.push(format_search_section(&snapshot.search, snapshot.selected_filter));
    sections.push(format_analytics(&snapshot.analytics));

    if !snapshot.notices.is_empty() {
        sections.push(format!(
            "{}\n{}",
            heading("Notices"),
            format_notices(&snapshot.notices)
        ));
    }

    sections.join("\n\n")
}

/// One-line push channel banner.
pub fn format_connection(connection: &ConnectionStatus) -> String {
    match connection.state {
        ConnectionState::Connected => {
            let since = connection
                .connected_at
                .map(|at| format!(" since {}", at.format("%H:%M:%S")))
                .unwrap_or_default();
            format!(
                "Live updates: {}{} ({} received)",
                "● Connected".green(),
                since,
                connection.updates_received
            )
        }
        ConnectionState::Connecting => format!("Live updates: {}", "○ Connecting...".yellow()),
        ConnectionState::Reconnecting { attempt } => format!(
            "Live updates: {}{}",
            format!("○ Reconnecting (attempt {})", attempt).yellow(),
            connection
                .last_error
                .as_ref()
                .map(|e| format!(" after: {}", e))
                .unwrap_or_default()
        ),
        ConnectionState::Disconnected => {
            let reason = connection
                .last_error
                .as_ref()
                .map(|e| format!(" ({})", e))
                .unwrap_or_default();
            format!(
                "Live updates: {}{}. Type `retry` to reconnect.",
                "✗ Disconnected".red().bold(),
                reason
            )
        }
    }
}

/// One-line backend health summary.
pub fn format_health_line(report: &HealthReport) -> String {
    let tier = match report.tier {
        HealthTier::Healthy => report.tier.label().green(),
        HealthTier::Degraded => report.tier.label().yellow(),
        HealthTier::Unreachable => report.tier.label().red(),
    };
    let detail = match (&report.status, &report.error) {
        (Some(_), _) => format!(
            "{} drugs, {} analyses",
            report.drugs_in_database, report.total_analyses
        ),
        (None, Some(error)) => error.clone(),
        (None, None) => String::new(),
    };
    format!(
        "Backend: {} {} (checked {})",
        tier,
        detail,
        report.checked_at.format("%H:%M:%S")
    )
}

/// Summary metrics plus the newest recent searches.
pub fn format_metrics(metrics: &MetricsSnapshot) -> String {
    let mut table = new_table(vec![
        "Total drugs",
        "Critical pairs",
        "High-risk pairs",
        "Avg risk",
        "Clients",
    ]);
    table.add_row(vec![
        Cell::new(metrics.total_drugs),
        Cell::new(RiskCategory::Critical.paint(&metrics.critical_risk_pairs.to_string())),
        Cell::new(RiskCategory::High.paint(&metrics.high_risk_pairs.to_string())),
        Cell::new(format_percentage(metrics.avg_risk_score)),
        Cell::new(metrics.connected_clients),
    ]);

    let recent = metrics.recent_searches_shown();
    if recent.is_empty() {
        return table.to_string();
    }

    let mut searches = new_table(vec!["Time", "Drug", "Matches", "Highest risk"]);
    for event in recent {
        let category = RiskCategory::classify(event.highest_risk);
        searches.add_row(vec![
            Cell::new(match event.timestamp {
                Some(at) => at.format("%H:%M:%S").to_string(),
                None => "Just now".to_string(),
            }),
            Cell::new(&event.drug_name),
            Cell::new(event.similar_drugs_found),
            Cell::new(category.paint(&format_percentage(event.highest_risk))),
        ]);
    }
    format!("{}\nRecent searches\n{}", table, searches)
}

fn format_search_section(search: &SearchState, filter: CategoryFilter) -> String {
    let title = match &search.query {
        Some(query) => format!("Search: {} (filter: {})", query, filter),
        None => format!("Search (filter: {})", filter),
    };
    let body = match &search.query {
        None => "No search yet. Type `search <drug>` or `example <n>`."
            .dimmed()
            .to_string(),
        Some(query) if search.results.is_empty() => format!("No look-alike drugs found for {}", query),
        Some(_) => format_search_results(&search.results, filter),
    };
    format!("{}\n{}", heading(&title), body)
}

/// Search results table after applying `filter`.
pub fn format_search_results(results: &[SearchResult], filter: CategoryFilter) -> String {
    let visible = filter_results(results, filter);
    if visible.is_empty() {
        return format!("No {} results ({} hidden by filter)", filter, results.len());
    }

    let mut table = new_table(vec![
        "Drug",
        "Spelling",
        "Phonetic",
        "Therapeutic",
        "Combined",
        "Risk",
    ]);
    for result in visible.iter() {
        let category = result.risk_category();
        table.add_row(vec![
            Cell::new(result.target_drug.display_name()),
            Cell::new(format_percentage(result.spelling_similarity)),
            Cell::new(format_percentage(result.phonetic_similarity)),
            Cell::new(format_percentage(result.therapeutic_context_risk)),
            Cell::new(category.paint(&format_percentage(result.combined_risk))),
            Cell::new(category.paint(category.label())),
        ]);
    }

    let mut out = table.to_string();
    if visible.len() < results.len() {
        out.push_str(&format!(
            "\n{} of {} results shown",
            visible.len(),
            results.len()
        ));
    }
    out
}

/// All four analytics slices.
pub fn format_analytics(cache: &AnalyticsCache) -> String {
    let summary = match &cache.summary {
        Some(metrics) => format!(
            "{} drugs, {} critical pairs, {} high-risk pairs, average risk {}",
            metrics.total_drugs,
            metrics.critical_risk_pairs,
            metrics.high_risk_pairs,
            format_percentage(metrics.avg_risk_score)
        ),
        None => no_data(),
    };
    let top_risks = match &cache.top_risks {
        Some(views) => format_top_risks(views),
        None => no_data(),
    };
    let breakdown = match &cache.breakdown {
        Some(entries) => format_breakdown(entries),
        None => no_data(),
    };
    let heatmap = match &cache.heatmap {
        Some(view) => format_heatmap(view),
        None => no_data(),
    };
    let refreshed = cache
        .refreshed_at
        .map(|at| format!(" (refreshed {})", at.format("%H:%M:%S")))
        .unwrap_or_default();

    [
        format!("{}\n{}", heading(&format!("Analytics{}", refreshed)), summary),
        format!("{}\n{}", heading("Top Risk Pairs"), top_risks),
        format!("{}\n{}", heading("Risk Breakdown"), breakdown),
        format!("{}\n{}", heading("Confusion Heatmap"), heatmap),
    ]
    .join("\n\n")
}

pub fn format_top_risks(views: &[TopRiskView]) -> String {
    if views.is_empty() {
        return no_data();
    }
    let mut table = new_table(vec!["#", "Pair", "Risk", "Category"]);
    for view in views {
        table.add_row(vec![
            Cell::new(view.rank),
            Cell::new(&view.label),
            Cell::new(view.category.paint(&view.percentage)),
            Cell::new(view.category.paint(view.category.label())),
        ]);
    }
    table.to_string()
}

pub fn format_breakdown(entries: &[crate::client::RiskBreakdown]) -> String {
    if entries.is_empty() {
        return no_data();
    }
    let mut table = new_table(vec!["Category", "Pairs", "Share"]);
    for share in breakdown_shares(entries) {
        let label = match share.category.parse::<RiskCategory>() {
            Ok(category) => category.paint(category.label()).to_string(),
            Err(_) => share.category.clone(),
        };
        table.add_row(vec![
            Cell::new(label),
            Cell::new(share.count),
            Cell::new(format_percentage(share.percentage)),
        ]);
    }
    table.to_string()
}

/// Matrix table with annotated cells in bold, followed by the annotation list.
pub fn format_heatmap(view: &HeatmapView) -> String {
    if view.dimension() == 0 {
        return no_data();
    }

    let mut header = vec![String::new()];
    header.extend(view.drug_names.iter().cloned());
    let mut table = new_table(header);

    for (i, row) in view.matrix.iter().enumerate() {
        let mut cells = vec![Cell::new(&view.drug_names[i])];
        for (j, value) in row.iter().enumerate() {
            let category = RiskCategory::classify(*value);
            let annotation = view.annotations.iter().find(|a| a.row == i && a.col == j);
            let text = match annotation {
                Some(a) => category.paint(&a.label.to_string()).bold().to_string(),
                None => format!("{:.0}", value).dimmed().to_string(),
            };
            cells.push(Cell::new(text));
        }
        table.add_row(cells);
    }

    if view.annotations.is_empty() {
        return format!("{}\nNo pairs above the annotation threshold", table);
    }

    let annotated: Vec<String> = view
        .annotations
        .iter()
        .map(|a| {
            format!(
                "{} ↔ {}: {}",
                view.drug_names[a.row], view.drug_names[a.col], a.label
            )
        })
        .collect();
    format!("{}\nAnnotated: {}", table, annotated.join(", "))
}

pub fn format_health(report: &HealthReport) -> String {
    let mut table = new_table(vec!["Tier", "Status", "Drugs", "Analyses", "Checked"]);
    table.add_row(vec![
        Cell::new(report.tier.label()),
        Cell::new(report.status.as_deref().unwrap_or("-")),
        Cell::new(report.drugs_in_database),
        Cell::new(report.total_analyses),
        Cell::new(report.checked_at.format("%Y-%m-%d %H:%M:%S")),
    ]);
    match &report.error {
        Some(error) => format!("{}\n{}", table, error.red()),
        None => table.to_string(),
    }
}

pub fn format_notices(notices: &[Notice]) -> String {
    notices
        .iter()
        .map(|notice| {
            let tag = match notice.level {
                NoticeLevel::Info => "info".cyan(),
                NoticeLevel::Warning => "warn".yellow(),
                NoticeLevel::Error => "error".red(),
            };
            format!("[{}] {} {}", notice.at.format("%H:%M:%S"), tag, notice.message)
        })
        .collect::<Vec<_>>()
        .join("\n")
}
