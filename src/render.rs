//! Terminal presentation of analysis results.
//!
//! Purely reactive: renders whatever the orchestrator produced and holds no
//! flow logic of its own.

use crate::analysis::AnalysisResult;
use crate::storage::StoredAnalysis;
use colored::{Color, Colorize};

/// Human reading of a score band, mirroring how the report email grades it
fn interpret_score(score: i64) -> (&'static str, Color) {
    match score {
        90..=100 => ("EXCELLENT", Color::Green),
        75..=89 => ("VERY GOOD", Color::Yellow),
        60..=74 => ("GOOD", Color::Blue),
        40..=59 => ("NEEDS IMPROVEMENT", Color::Magenta),
        _ => ("REQUIRES ATTENTION", Color::Red),
    }
}

/// Print a full analysis report
pub fn print_result(result: &AnalysisResult) {
    let (grade, color) = interpret_score(result.ats_score);

    println!("\n=== ANALYSIS COMPLETE ===\n");

    if result.is_fallback {
        println!("{}\n", "Note: the scoring service was unavailable, this is a provisional result.".yellow());
    }

    let score_text = result.ats_score.to_string();
    println!(
        "ATS Score: {} ({})",
        score_text.as_str().color(color).bold(),
        grade.color(color)
    );

    println!("\n💡 Summary:");
    println!("  {}", result.overall_summary);

    print_section("📌 Strengths", &result.strengths);
    print_section("⚠️  Missing or Weak Areas", &result.missing_or_weak_areas);
    print_section("🔑 ATS Keyword Gaps", &result.ats_keyword_gaps);
    print_section("🛠  Improvement Suggestions", &result.improvement_suggestions);
    print_section("🧱 Structure Feedback", &result.structure_feedback);

    println!("\n✅ Final Recommendation:");
    println!("  {}", result.final_recommendation);
}

/// Print the post-render email confirmation line
pub fn print_email_outcome(email_sent: bool, target: Option<&str>) {
    match (email_sent, target) {
        (true, Some(addr)) => println!("\n📧 Report emailed to {}", addr.bold()),
        (false, Some(_)) => println!("\n{}", "Report email could not be delivered.".dimmed()),
        _ => {}
    }
}

/// Print one history entry in the list view
pub fn print_history_entry(stored: &StoredAnalysis) {
    let (grade, color) = interpret_score(stored.result.ats_score);
    let score_text = stored.result.ats_score.to_string();
    println!(
        "📄 {} - {} {} ({})",
        stored.file_name.as_str().bold(),
        score_text.as_str().color(color),
        grade.color(color),
        stored.created_at.format("%Y-%m-%d %H:%M")
    );
    if let Some(email) = &stored.email {
        println!("   {}", email);
    }
    println!("   {}\n", stored.result.overall_summary);
}

fn print_section(title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    println!("\n{}:", title);
    for item in items {
        println!("  • {}", item);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn score_bands_match_the_report_grades() {
        assert_eq!(interpret_score(100).0, "EXCELLENT");
        assert_eq!(interpret_score(90).0, "EXCELLENT");
        assert_eq!(interpret_score(82).0, "VERY GOOD");
        assert_eq!(interpret_score(60).0, "GOOD");
        assert_eq!(interpret_score(45).0, "NEEDS IMPROVEMENT");
        assert_eq!(interpret_score(0).0, "REQUIRES ATTENTION");
    }
}
