use crate::error::PipelineError;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::fmt;
use url::Url;

/// Text submitted for analysis. Validated on construction, immutable after.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    content: String,
    source_url: Option<Url>,
}

impl AnalysisRequest {
    /// Fails when `content` is blank or `source_url` is not an absolute
    /// http(s) URL.
    pub fn new(content: impl Into<String>, source_url: Option<&str>) -> Result<Self, PipelineError> {
        let content = content.into();
        if content.trim().is_empty() {
            return Err(PipelineError::Validation(
                "content must not be empty".to_string(),
            ));
        }

        let source_url = match source_url.map(str::trim).filter(|s| !s.is_empty()) {
            None => None,
            Some(raw) => {
                let url = Url::parse(raw).map_err(|e| {
                    PipelineError::Validation(format!("source URL {raw:?} is malformed: {e}"))
                })?;
                if !matches!(url.scheme(), "http" | "https") {
                    return Err(PipelineError::Validation(format!(
                        "source URL must use http or https, got {}",
                        url.scheme()
                    )));
                }
                Some(url)
            }
        };

        Ok(Self {
            content,
            source_url,
        })
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn source_url(&self) -> Option<&Url> {
        self.source_url.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum Label {
    Real,
    Fake,
    Question,
}

impl Label {
    pub fn as_str(self) -> &'static str {
        match self {
            Label::Real => "Real",
            Label::Fake => "Fake",
            Label::Question => "Question",
        }
    }
}

impl fmt::Display for Label {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Classification {
    pub label: Label,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Explanation {
    pub text: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence_text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SupportingLink {
    pub title: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EvidenceReport {
    pub counter_response: String,
    pub supporting_links: Vec<SupportingLink>,
    pub confidence: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneralAnswer {
    pub answer: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MediaVerdict {
    pub is_fake_news: bool,
    pub reasoning: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub evidence: Option<String>,
}

/// Result of [`crate::Orchestrator::classify_and_explain`].
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AnalysisOutcome {
    Analysis {
        classification: Classification,
        explanation: Explanation,
        evidence: EvidenceReport,
    },
    GeneralAnswer {
        classification: Classification,
        answer: GeneralAnswer,
    },
}

impl AnalysisOutcome {
    pub fn classification(&self) -> &Classification {
        match self {
            AnalysisOutcome::Analysis { classification, .. }
            | AnalysisOutcome::GeneralAnswer { classification, .. } => classification,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_content_is_rejected() {
        let err = AnalysisRequest::new("  \n\t", None).unwrap_err();
        assert!(matches!(err, PipelineError::Validation(_)));
    }

    #[test]
    fn source_url_is_checked() {
        assert!(AnalysisRequest::new("headline", Some("not a url")).is_err());
        assert!(AnalysisRequest::new("headline", Some("mailto:a@b.c")).is_err());

        let req = AnalysisRequest::new("headline", Some(" https://news.example/a ")).unwrap();
        assert_eq!(req.source_url().unwrap().host_str(), Some("news.example"));

        let req = AnalysisRequest::new("headline", Some("")).unwrap();
        assert!(req.source_url().is_none());
    }

    #[test]
    fn outcome_serializes_with_kind_tag() {
        let outcome = AnalysisOutcome::GeneralAnswer {
            classification: Classification {
                label: Label::Question,
                confidence: 0.9,
            },
            answer: GeneralAnswer {
                answer: "Plants turn light into sugar.".into(),
            },
        };
        let v = serde_json::to_value(&outcome).unwrap();
        assert_eq!(v["kind"], "general_answer");
        assert_eq!(v["classification"]["label"], "Question");
    }
}
