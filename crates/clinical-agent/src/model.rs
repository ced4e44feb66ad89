//! Domain Models
//!
//! Wire types for the record store, order endpoint and messaging provider,
//! plus the structured outcomes of the decision tools.

use std::fmt;
use std::sync::LazyLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::{ClinicalError, Result};

/// Sentinel returned by `diagnose` when confidence is below threshold
pub const NEED_FURTHER_TEST: &str = "<need further test>";

/// Label `recommend_test` uses when no test is warranted
pub const NO_FURTHER_TEST: &str = "<no further test>";

/// Confidence at or above which `diagnose` commits to an impression
pub const IMPRESSION_THRESHOLD: u8 = 3;

/// Opaque patient identifier; never blank
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PatientId(String);

impl PatientId {
    pub fn parse(raw: impl AsRef<str>) -> Result<Self> {
        let id = raw.as_ref().trim();
        if id.is_empty() {
            return Err(ClinicalError::InvalidPatientId(raw.as_ref().to_string()));
        }
        Ok(Self(id.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PatientId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// One row of patient history from the record store
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestRecord {
    #[serde(default)]
    pub record_id: Option<String>,

    #[serde(default)]
    pub order_id: Option<String>,

    /// Test name; records uploaded without an order carry none
    #[serde(default)]
    pub test: Option<String>,

    #[serde(default)]
    pub content: Option<String>,
}

impl TestRecord {
    pub fn new(test: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            test: Some(test.into()),
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// `"<test> : <content>"`
    pub fn summary_line(&self) -> String {
        format!(
            "{} : {}",
            self.test.as_deref().unwrap_or("Unspecified test"),
            self.content.as_deref().unwrap_or("")
        )
    }
}

/// Render history as one `test : content` line per record
pub fn format_history(records: &[TestRecord]) -> String {
    records
        .iter()
        .map(TestRecord::summary_line)
        .collect::<Vec<_>>()
        .join("\n")
        .trim()
        .to_string()
}

/// `{ "data": [...] }` envelope from the record store
#[derive(Clone, Debug, Deserialize)]
pub struct HistoryResponse {
    #[serde(default)]
    pub data: Vec<TestRecord>,
}

/// Body of an order request
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct OrderRequest {
    pub patient_id: String,
    pub test: String,
}

/// A created order as echoed by the order endpoint
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderConfirmation {
    #[serde(default, alias = "id")]
    pub order_id: Option<String>,
    pub patient_id: String,
    pub test: String,
}

/// `{ "data": {...} }` envelope from the order endpoint
#[derive(Clone, Debug, Deserialize)]
pub struct OrderResponse {
    pub data: OrderConfirmation,
}

/// Provider receipt for a sent notification
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationReceipt {
    /// Provider message id
    pub sid: String,

    /// Recipient number without channel prefix or `+`
    pub to: String,

    pub sent_at: DateTime<Utc>,
}

/// Model self-reported confidence, 1 (unsure) to 5 (certain)
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Confidence(u8);

impl Confidence {
    pub const DEFAULT: Self = Self(3);

    pub const fn new(value: u8) -> Option<Self> {
        if matches!(value, 1..=5) {
            Some(Self(value))
        } else {
            None
        }
    }

    pub const fn value(self) -> u8 {
        self.0
    }

    pub const fn warrants_impression(self) -> bool {
        self.0 >= IMPRESSION_THRESHOLD
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/5", self.0)
    }
}

/// Whether the confidence came from the model or the lenient default
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConfidenceSource {
    Parsed,
    Defaulted,
}

/// Structured outcome of `diagnose`
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiagnosisAssessment {
    /// Raw reply to the findings prompt
    pub findings: String,
    pub confidence: Confidence,
    pub confidence_source: ConfidenceSource,
    /// Present only when confidence met the threshold
    pub impression: Option<String>,
}

impl DiagnosisAssessment {
    /// Tool output text
    pub fn render(&self) -> String {
        match &self.impression {
            Some(impression) => format!(
                "CLINICAL IMPRESSION: {}\nCONFIDENCE: {}",
                impression.trim(),
                self.confidence
            ),
            None => NEED_FURTHER_TEST.to_string(),
        }
    }
}

/// Outcome of `recommend_test`: exactly one of the two
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "test", rename_all = "snake_case")]
pub enum TestRecommendation {
    NoFurtherTest,
    Test(String),
}

static LABEL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([^<>]*)>").expect("label pattern is valid"));

impl TestRecommendation {
    /// Interpret a model label.
    ///
    /// `<no further test>` is recognised anywhere in the reply, in any case,
    /// as long as it is the only bracketed token. A test is accepted only when
    /// the whole reply is a single `<name>` token, optionally quoted or
    /// followed by punctuation. Anything else is `None`.
    pub fn parse(label: &str) -> Option<Self> {
        let tokens: Vec<&str> = LABEL_RE
            .captures_iter(label)
            .filter_map(|c| c.get(1))
            .map(|m| m.as_str().trim())
            .collect();

        let sentinel = NO_FURTHER_TEST.trim_matches(['<', '>']);
        if matches!(tokens.as_slice(), [only] if only.eq_ignore_ascii_case(sentinel)) {
            return Some(Self::NoFurtherTest);
        }

        let bare = label
            .trim()
            .trim_end_matches(['.', '!', ',', ';', ':'])
            .trim_matches(['"', '\'', '`'])
            .trim();
        let inner = bare.strip_prefix('<')?.strip_suffix('>')?.trim();
        if inner.is_empty() || inner.contains(['<', '>']) {
            return None;
        }
        Some(Self::Test(inner.to_string()))
    }

    pub fn test_name(&self) -> Option<&str> {
        match self {
            Self::NoFurtherTest => None,
            Self::Test(name) => Some(name),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_patient_id_rejects_blank() {
        assert!(PatientId::parse("   ").is_err());
        assert!(PatientId::parse("").is_err());
        assert_eq!(PatientId::parse(" p-1 ").unwrap().as_str(), "p-1");
    }

    #[test]
    fn test_history_formatting() {
        let records = vec![
            TestRecord::new("CBC", "normal"),
            TestRecord::new("Lipase", "elevated"),
        ];
        assert_eq!(format_history(&records), "CBC : normal\nLipase : elevated");
        assert_eq!(format_history(&[]), "");
    }

    #[test]
    fn test_history_response_decoding() {
        let raw = r#"{"data":[{"record_id":"r1","order_id":null,"content":"normal","test":"CBC"},
                              {"record_id":"r2","content":"scan attached","test":null}]}"#;
        let parsed: HistoryResponse = serde_json::from_str(raw).unwrap();
        assert_eq!(parsed.data.len(), 2);
        assert_eq!(parsed.data[0].summary_line(), "CBC : normal");
        assert_eq!(parsed.data[1].summary_line(), "Unspecified test : scan attached");
    }

    #[test]
    fn test_confidence_bounds() {
        assert!(Confidence::new(0).is_none());
        assert!(Confidence::new(6).is_none());
        assert!(Confidence::new(3).unwrap().warrants_impression());
        assert!(!Confidence::new(2).unwrap().warrants_impression());
        assert_eq!(Confidence::DEFAULT.value(), 3);
    }

    #[test]
    fn test_recommendation_labels() {
        assert_eq!(
            TestRecommendation::parse("<no further test>"),
            Some(TestRecommendation::NoFurtherTest)
        );
        assert_eq!(
            TestRecommendation::parse("\"<Troponin>\"\n"),
            Some(TestRecommendation::Test("Troponin".into()))
        );
        assert_eq!(
            TestRecommendation::parse("<D-dimer>").and_then(|r| r.test_name().map(String::from)),
            Some("D-dimer".into())
        );
        assert_eq!(TestRecommendation::parse("<>"), None);
    }

    #[test]
    fn test_recommendation_rejects_loose_labels() {
        assert_eq!(
            TestRecommendation::parse("<no further test>."),
            Some(TestRecommendation::NoFurtherTest)
        );
        assert_eq!(
            TestRecommendation::parse("I recommend <No Further Test> at this time."),
            Some(TestRecommendation::NoFurtherTest)
        );
        assert_eq!(
            TestRecommendation::parse("<Troponin>."),
            Some(TestRecommendation::Test("Troponin".into()))
        );
        assert_eq!(TestRecommendation::parse("<Troponin> <D-dimer>"), None);
        assert_eq!(TestRecommendation::parse("<no further test> <Troponin>"), None);
        assert_eq!(TestRecommendation::parse("No further testing is needed."), None);
        assert_eq!(TestRecommendation::parse("I suggest <Troponin>"), None);
        assert_eq!(TestRecommendation::parse("D-dimer"), None);
    }

    #[test]
    fn test_assessment_rendering() {
        let confident = DiagnosisAssessment {
            findings: "4".into(),
            confidence: Confidence::new(4).unwrap(),
            confidence_source: ConfidenceSource::Parsed,
            impression: Some("Iron deficiency anemia.\n".into()),
        };
        assert_eq!(
            confident.render(),
            "CLINICAL IMPRESSION: Iron deficiency anemia.\nCONFIDENCE: 4/5"
        );

        let unsure = DiagnosisAssessment {
            impression: None,
            confidence: Confidence::new(2).unwrap(),
            ..confident
        };
        assert_eq!(unsure.render(), NEED_FURTHER_TEST);
    }
}
