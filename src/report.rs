use std::collections::BTreeMap;
use std::fmt::Write;

use chrono::NaiveDate;

use crate::criteria::Criterion;
use crate::models::{DusunSummary, RankedResult};
use crate::policy::PolarityProfile;
use crate::weights::WeightVector;

const REPORT_PRIORITY_ROWS: usize = 20;

/// Results visible for one dusun (or all), paginated. Ranks stay global.
pub fn select_page<'a>(
    results: &'a [RankedResult],
    dusun: Option<&str>,
    offset: usize,
    limit: usize,
) -> Vec<&'a RankedResult> {
    results
        .iter()
        .filter(|result| dusun.map_or(true, |d| result.dusun == d))
        .skip(offset)
        .take(limit)
        .collect()
}

pub fn summarize_by_dusun(results: &[RankedResult]) -> Vec<DusunSummary> {
    let mut map: BTreeMap<&str, Vec<&RankedResult>> = BTreeMap::new();
    for result in results {
        map.entry(result.dusun.as_str()).or_default().push(result);
    }

    let mut summaries: Vec<DusunSummary> = map
        .into_iter()
        .filter_map(|(dusun, members)| {
            let top = members.iter().min_by_key(|r| r.rank)?;
            let total: f64 = members.iter().map(|r| r.final_score).sum();
            Some(DusunSummary {
                dusun: dusun.to_string(),
                household_count: members.len(),
                avg_score: total / members.len() as f64,
                top_household: top.name.clone(),
                top_rank: top.rank,
            })
        })
        .collect();

    summaries.sort_by(|a, b| {
        b.household_count
            .cmp(&a.household_count)
            .then_with(|| a.dusun.cmp(&b.dusun))
    });
    summaries
}

pub fn average_utilities(results: &[&RankedResult]) -> Vec<(Criterion, f64)> {
    Criterion::ALL
        .into_iter()
        .map(|criterion| {
            let total: f64 = results
                .iter()
                .filter_map(|r| r.utilities.get(&criterion))
                .sum();
            let average = if results.is_empty() {
                0.0
            } else {
                total / results.len() as f64
            };
            (criterion, average)
        })
        .collect()
}

pub fn build_report(
    dusun: Option<&str>,
    generated_on: NaiveDate,
    weights: &WeightVector,
    polarity: &PolarityProfile,
    results: &[RankedResult],
) -> String {
    let scoped = select_page(results, dusun, 0, usize::MAX);
    let summaries = summarize_by_dusun(results);

    let mut output = String::new();
    let scope_label = dusun.unwrap_or("all dusun");

    let _ = writeln!(output, "# Bantuan Priority Report");
    let _ = writeln!(
        output,
        "Generated for {} on {} ({} of {} households)",
        scope_label,
        generated_on,
        scoped.len(),
        results.len()
    );
    let _ = writeln!(output);
    let _ = writeln!(output, "## Weight Profile");
    let _ = writeln!(output, "| Criterion | Polarity | Weight |");
    let _ = writeln!(output, "|---|---|---|");
    for (criterion, weight) in weights.iter() {
        let _ = writeln!(
            output,
            "| {} | {} | {:.3} |",
            criterion,
            polarity.get(criterion),
            weight
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Priority Ranking");

    if scoped.is_empty() {
        let _ = writeln!(output, "No households in this scope.");
    } else {
        for result in scoped.iter().take(REPORT_PRIORITY_ROWS) {
            let _ = writeln!(
                output,
                "{}. {} ({}, {}) score {:.4}",
                result.rank, result.name, result.household_id, result.dusun, result.final_score
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Dusun Breakdown");

    if summaries.is_empty() {
        let _ = writeln!(output, "No households recorded.");
    } else {
        for summary in summaries.iter() {
            let _ = writeln!(
                output,
                "- {}: {} households (avg score {:.4}, highest priority {} at rank {})",
                summary.dusun,
                summary.household_count,
                summary.avg_score,
                summary.top_household,
                summary.top_rank
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Average Utility by Criterion");

    if scoped.is_empty() {
        let _ = writeln!(output, "No households in this scope.");
    } else {
        for (criterion, average) in average_utilities(&scoped) {
            let _ = writeln!(output, "- {}: {:.3}", criterion, average);
        }
    }

    output
}
