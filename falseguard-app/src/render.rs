use anyhow::Result;
use falseguard_pipeline::{AnalysisOutcome, MediaVerdict};
use std::fmt::Write as _;

pub fn print_outcome(outcome: &AnalysisOutcome, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(outcome)?);
    } else {
        print!("{}", outcome_text(outcome));
    }
    Ok(())
}

pub fn print_verdict(verdict: &MediaVerdict, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(verdict)?);
    } else {
        print!("{}", verdict_text(verdict));
    }
    Ok(())
}

fn percent(confidence: f64) -> String {
    format!("{:.0}%", confidence * 100.0)
}

fn outcome_text(outcome: &AnalysisOutcome) -> String {
    let mut out = String::new();
    match outcome {
        AnalysisOutcome::GeneralAnswer { answer, .. } => {
            let _ = writeln!(out, "{}", answer.answer);
        }
        AnalysisOutcome::Analysis {
            classification,
            explanation,
            evidence,
        } => {
            let _ = writeln!(
                out,
                "Verdict: {} ({} confidence)\n",
                classification.label,
                percent(classification.confidence)
            );
            let _ = writeln!(out, "Why: {}", explanation.text);
            if let Some(ev) = &explanation.evidence_text {
                let _ = writeln!(out, "Evidence: {ev}");
            }
            let _ = writeln!(
                out,
                "\nWhat the web says ({} confidence):\n{}",
                percent(evidence.confidence),
                evidence.counter_response
            );
            if !evidence.supporting_links.is_empty() {
                let _ = writeln!(out, "\nSources:");
                for link in &evidence.supporting_links {
                    let _ = writeln!(out, "  - {} <{}>", link.title, link.url);
                }
            }
        }
    }
    out
}

fn verdict_text(verdict: &MediaVerdict) -> String {
    let mut out = String::new();
    let flag = if verdict.is_fake_news {
        "Likely misleading"
    } else {
        "No fake-news indicators"
    };
    let _ = writeln!(out, "{flag} ({} confidence)\n", percent(verdict.confidence));
    let _ = writeln!(out, "{}", verdict.reasoning);
    if let Some(ev) = &verdict.evidence {
        let _ = writeln!(out, "\nEvidence: {ev}");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use falseguard_pipeline::{Classification, EvidenceReport, Explanation, Label, SupportingLink};

    #[test]
    fn analysis_lists_sources() {
        let outcome = AnalysisOutcome::Analysis {
            classification: Classification {
                label: Label::Fake,
                confidence: 0.93,
            },
            explanation: Explanation {
                text: "No study supports this.".into(),
                confidence: 0.9,
                evidence_text: None,
            },
            evidence: EvidenceReport {
                counter_response: "Chocolate does not cure cancer.".into(),
                supporting_links: vec![SupportingLink {
                    title: "Fact check".into(),
                    url: "https://factcheck.example/c".into(),
                }],
                confidence: 0.8,
            },
        };
        let text = outcome_text(&outcome);
        assert!(text.starts_with("Verdict: Fake (93% confidence)"));
        assert!(text.contains("  - Fact check <https://factcheck.example/c>"));
        assert!(!text.contains("Evidence:"));
    }

    #[test]
    fn verdict_text_reports_flag() {
        let verdict = MediaVerdict {
            is_fake_news: false,
            reasoning: "A rainfall report.".into(),
            confidence: 0.5,
            evidence: None,
        };
        assert!(verdict_text(&verdict).starts_with("No fake-news indicators (50% confidence)"));
    }
}
