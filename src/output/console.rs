//! Human-readable console rendering of a report

use crate::analytics::{
    round_to, DurationStats, Insight, LatencyTrend, LatencyTrendSummary, Report, ReviewerStats,
    ThroughputTrendSummary, OVERALL_LABEL,
};

const MAX_TREND_STAGES: usize = 5;
const MAX_QUEUE_REVIEWERS: usize = 5;

/// Print the full report to stdout.
pub fn print_report(report: &Report, insights: &[Insight], reviewer_top: usize) {
    println!("Review Queue Forecaster");
    println!("Generated: {}", report.generated_at.to_rfc3339());
    println!("SLA Days: {}", report.sla_days);
    println!("Total Events: {}\n", report.total_events);

    println!("Overall");
    print_stats(&report.overall.stage, &report.overall.stats);
    println!();

    println!("By Stage");
    for stage in &report.stages {
        print_stats(&stage.stage, &stage.stats);
    }

    println!();
    println!("Throughput");
    println!(
        "- Window: last {} days (as of {})",
        report.throughput.window_days,
        report.throughput.as_of.to_rfc3339()
    );
    println!(
        "  Events in window: {} | Throughput: {:.2} events/week",
        report.throughput.events_in_window, report.throughput.throughput_per_week
    );

    print_reviewer_snapshot(&report.reviewers, reviewer_top);
    print_throughput_trends(&report.throughput_trend);
    print_latency_trends(&report.latency_trend);

    if let Some(queue) = &report.queue {
        println!();
        println!("Queue Forecast");
        println!(
            "- As of {} | Pending: {} | Assigned: {} | Unassigned: {} | Avg Age: {:.2} days",
            queue.as_of.to_rfc3339(),
            queue.total_pending,
            queue.assigned_count,
            queue.unassigned_count,
            queue.avg_age_days
        );
        println!(
            "  On Track: {} | Due Soon: {} | Overdue: {} | Due Soon Ratio: {:.2}",
            queue.on_track_count, queue.due_soon_count, queue.overdue_count, queue.due_soon_ratio
        );
        for stage in &queue.stages {
            println!("  - {}", stage.stage);
            println!(
                "    Pending: {} | Avg Age: {:.2} days | On Track: {} | Due Soon: {} | Overdue: {}",
                stage.pending_count,
                stage.avg_age_days,
                stage.on_track_count,
                stage.due_soon_count,
                stage.overdue_count
            );
            println!(
                "    Daily Throughput: {:.2} | Clear Days: {:.2} | Status: {}",
                stage.daily_throughput, stage.estimated_clear_days, stage.clearance_status
            );
        }
        if !queue.reviewers.is_empty() {
            let shown = MAX_QUEUE_REVIEWERS.min(queue.reviewers.len());
            println!("  Reviewer Forecast (Top {shown} by Pending)");
            for reviewer in queue.reviewers.iter().take(shown) {
                println!("  - {}", reviewer.reviewer_id);
                println!(
                    "    Pending: {} | Avg Age: {:.2} days | On Track: {} | Due Soon: {} | Overdue: {}",
                    reviewer.pending_count,
                    reviewer.avg_age_days,
                    reviewer.on_track_count,
                    reviewer.due_soon_count,
                    reviewer.overdue_count
                );
                println!(
                    "    Throughput: {:.2}/week | Clear Days: {:.2} | Status: {}",
                    reviewer.throughput_per_week,
                    reviewer.estimated_clear_days,
                    reviewer.clearance_status
                );
            }
        }
    }

    if !insights.is_empty() {
        println!();
        println!("Insights");
        for insight in insights {
            println!("- [{}] {}: {}", insight.severity, insight.area, insight.message);
        }
    }
}

fn print_stats(label: &str, stats: &DurationStats) {
    println!("- {label}");
    println!(
        "  Count: {} | Avg: {:.2} days | Median: {:.2} days | P90: {:.2} days | Max: {:.2} days",
        stats.count, stats.average_days, stats.median_days, stats.p90_days, stats.max_days
    );
    println!(
        "  SLA Breach: {} ({:.1}%) | Distinct Reviewers: {}",
        stats.sla_breach_count, stats.sla_breach_rate, stats.distinct_reviewers
    );
    if stats.count > 0 {
        println!(
            "  Aging: On Time {} ({:.1}%) | At Risk {} ({:.1}%) | Overdue {} ({:.1}%) | Risk Tier: {}",
            stats.aging_buckets.on_time,
            percent_of(stats.aging_buckets.on_time, stats.count),
            stats.aging_buckets.at_risk,
            percent_of(stats.aging_buckets.at_risk, stats.count),
            stats.aging_buckets.overdue,
            percent_of(stats.aging_buckets.overdue, stats.count),
            stats.risk_tier
        );
    }
}

fn print_reviewer_snapshot(reviewers: &[ReviewerStats], top: usize) {
    if reviewers.is_empty() {
        return;
    }
    let top = if top == 0 { 5 } else { top };
    let top = top.min(reviewers.len());

    println!();
    println!("Reviewer Snapshot (Top {top} by Throughput)");
    for reviewer in reviewers.iter().take(top) {
        println!("- {}", reviewer.reviewer_id);
        println!(
            "  Count: {} | Avg: {:.2} days | Median: {:.2} days | P90: {:.2} days | Max: {:.2} days",
            reviewer.stats.count,
            reviewer.stats.average_days,
            reviewer.stats.median_days,
            reviewer.stats.p90_days,
            reviewer.stats.max_days
        );
        println!(
            "  SLA Breach: {} ({:.1}%) | Last Reviewed: {} | Throughput: {:.2} events/week",
            reviewer.stats.sla_breach_count,
            reviewer.stats.sla_breach_rate,
            reviewer.last_reviewed_at.to_rfc3339(),
            reviewer.throughput_per_week
        );
    }
}

fn print_throughput_trends(summary: &ThroughputTrendSummary) {
    if summary.trends.is_empty() {
        return;
    }

    println!();
    println!("Throughput Trend");
    println!(
        "- Current window: {} to {} ({} days)",
        summary.current_window_start.to_rfc3339(),
        summary.current_window_end.to_rfc3339(),
        summary.window_days
    );
    println!(
        "  Prior window: {} to {}",
        summary.prior_window_start.to_rfc3339(),
        summary.prior_window_end.to_rfc3339()
    );

    println!("  Overall");
    for trend in summary.trends.iter().filter(|t| t.label == OVERALL_LABEL) {
        println!(
            "  - {} | Current: {} | Prior: {} | Delta: {:+} ({:.1}%) | Trend: {}",
            trend.label,
            trend.current_count,
            trend.prior_count,
            trend.delta,
            trend.delta_percent,
            trend.trend
        );
        println!(
            "    Current: {:.2}/week | Prior: {:.2}/week",
            trend.current_per_week, trend.prior_per_week
        );
    }

    println!("  Top {MAX_TREND_STAGES} Stages");
    for trend in summary
        .trends
        .iter()
        .filter(|t| t.label != OVERALL_LABEL)
        .take(MAX_TREND_STAGES)
    {
        println!(
            "  - {} | Current: {} | Prior: {} | Delta: {:+} ({:.1}%) | Trend: {}",
            trend.label,
            trend.current_count,
            trend.prior_count,
            trend.delta,
            trend.delta_percent,
            trend.trend
        );
        println!(
            "    Current: {:.2}/week | Prior: {:.2}/week",
            trend.current_per_week, trend.prior_per_week
        );
    }
}

fn print_latency_trends(summary: &LatencyTrendSummary) {
    if summary.trends.is_empty() {
        return;
    }

    println!();
    println!("Latency Trend");
    println!(
        "- Current window: {} to {} ({} days)",
        summary.current_window_start.to_rfc3339(),
        summary.current_window_end.to_rfc3339(),
        summary.window_days
    );
    println!(
        "  Prior window: {} to {}",
        summary.prior_window_start.to_rfc3339(),
        summary.prior_window_end.to_rfc3339()
    );

    println!("  Overall");
    for trend in summary.trends.iter().filter(|t| t.label == OVERALL_LABEL) {
        print_latency_line(trend);
    }

    println!("  Top {MAX_TREND_STAGES} Stages");
    for trend in summary
        .trends
        .iter()
        .filter(|t| t.label != OVERALL_LABEL)
        .take(MAX_TREND_STAGES)
    {
        print_latency_line(trend);
    }
}

fn print_latency_line(trend: &LatencyTrend) {
    println!(
        "  - {} | Avg: {:.2} -> {:.2} days ({:+.2}, {:.1}%) | Median: {:.2} -> {:.2} days ({:+.2}, {:.1}%) | Trend: {}",
        trend.label,
        trend.prior_avg_days,
        trend.current_avg_days,
        trend.avg_delta_days,
        trend.avg_delta_percent,
        trend.prior_median_days,
        trend.current_median_days,
        trend.median_delta_days,
        trend.median_delta_pct,
        trend.trend
    );
}

fn percent_of(part: usize, total: usize) -> f64 {
    if total == 0 {
        return 0.0;
    }
    round_to(part as f64 / total as f64 * 100.0, 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_of_guards_zero_total() {
        assert_eq!(percent_of(3, 0), 0.0);
        assert_eq!(percent_of(1, 3), 33.3);
        assert_eq!(percent_of(2, 4), 50.0);
    }
}
