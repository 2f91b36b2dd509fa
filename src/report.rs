//! Console rendering of the analysis and remediation results
use std::time::Duration;

use crate::{
    category::{Category, CategoryPartition, RepositoryObservation},
    remediate::{Action, Outcome, RemediationReport},
};

/// Rough time taken by one reconnection
const RECONNECT_ESTIMATE: Duration = Duration::from_secs(2);

/// Rough time taken by one creation and push, excluding the delay
const CREATE_ESTIMATE: Duration = Duration::from_secs(10);

/// Estimated wall-clock time of the remediation, saturating at [`Duration::MAX`]
pub fn estimate_duration(partition: &CategoryPartition, delay: Duration) -> Duration {
    let creations = u32::try_from(partition.creation_count()).unwrap_or(u32::MAX);
    let reconnections = u32::try_from(partition.needs_reconnection.len()).unwrap_or(u32::MAX);
    delay
        .saturating_mul(creations.saturating_sub(1))
        .saturating_add(CREATE_ESTIMATE.saturating_mul(creations))
        .saturating_add(RECONNECT_ESTIMATE.saturating_mul(reconnections))
}

/// Format a duration as `1h 2m 3s`, dropping leading zero units
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let (hours, minutes, seconds) = (secs / 3600, (secs % 3600) / 60, secs % 60);
    if hours > 0 {
        format!("{hours}h {minutes}m {seconds}s")
    } else if minutes > 0 {
        format!("{minutes}m {seconds}s")
    } else {
        format!("{seconds}s")
    }
}

/// One line per observation
fn print_listing(title: &str, observations: &[RepositoryObservation]) {
    if observations.is_empty() {
        return;
    }
    println!("{title}:");
    for obs in observations {
        match &obs.note {
            Some(note) => println!("- {} ({}): {}", obs.name, obs.path.display(), note),
            None => println!("- {} ({})", obs.name, obs.path.display()),
        }
    }
}

/// Print the partition counts and the listings that need attention
pub fn print_analysis(partition: &CategoryPartition) {
    println!("Number of repositories found: {}", partition.total());
    for category in Category::ALL {
        println!("- {}: {}", category, partition.get(category).len());
    }
    print_listing("Needs reconnection", &partition.needs_reconnection);
    print_listing("Problems (fix manually)", &partition.problems);
}

/// Print the time the remediation should take
pub fn print_estimate(partition: &CategoryPartition, delay: Duration) {
    println!(
        "Estimated time: {} ({} reconnections, {} creations, {}s between creations)",
        format_duration(estimate_duration(partition, delay)),
        partition.needs_reconnection.len(),
        partition.creation_count(),
        delay.as_secs()
    );
}

/// Print the outcome counts of the remediation
pub fn print_remediation(report: &RemediationReport) {
    println!("Reconnected: {}", report.succeeded(Action::Reconnect));
    println!("Created and pushed: {}", report.succeeded(Action::CreateAndPush));
    let failures: Vec<_> = report.failures().collect();
    println!("Failed: {}", failures.len());
    for record in failures {
        if let Outcome::Failed(message) = &record.outcome {
            println!("- {}: {}", record.name, message);
        }
    }
    if report.rate_limited() {
        println!("Some failures look like rate limiting: rerun later or with a longer --delay");
    }
}
