//! Canonical manifest model and boundary normalization.
//!
//! Two physically different manifest shapes reach this crate: the manifest
//! store produced by the C2PA SDK family (an active-manifest pointer into a
//! `manifests` map, with camelCase or snake_case keys depending on the SDK
//! generation) and the flat snake_case record served by the watermark
//! registry. Both are normalized here into one `Manifest` type; nothing
//! downstream inspects raw JSON shapes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Assertion label carrying Schema.org CreativeWork metadata.
pub const CREATIVE_WORK_LABEL: &str = "stds.schema-org.CreativeWork";

/// Assertion label carrying the C2PA action history.
pub const ACTIONS_LABEL: &str = "c2pa.actions";

/// One labeled fact inside a manifest.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Assertion {
    pub label: String,
    pub data: Value,
}

/// Signer identity attached to a manifest.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SignatureInfo {
    pub issuer: Option<String>,
    pub time: Option<DateTime<Utc>>,
}

impl SignatureInfo {
    /// One-line issuance summary, e.g. `Issued by Truepic on Mar 4, 2026`.
    pub fn summary(&self) -> String {
        let issuer = self.issuer.as_deref().unwrap_or("Unknown");
        match self.time {
            Some(time) => format!("Issued by {} on {}", issuer, time.format("%b %-d, %Y")),
            None => format!("Issued by {} on an unknown date", issuer),
        }
    }
}

/// Canonical provenance record. Both ingestion shapes normalize into this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Manifest {
    pub assertions: Vec<Assertion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub signature_info: Option<SignatureInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub claim_generator: Option<String>,
}

impl Manifest {
    /// Normalize the manifest store produced by the C2PA SDK family.
    ///
    /// The store points at its active manifest either by URN into a
    /// `manifests` map (Rust SDK) or with the manifest object inlined
    /// (JS SDK). Field casing differs between SDK generations; both are
    /// accepted here and nowhere else.
    pub fn from_sdk_store(store: &Value) -> Option<Self> {
        let active = field(store, "active_manifest", "activeManifest")?;
        let entry = match active {
            Value::String(urn) => store.get("manifests")?.get(urn.as_str())?,
            Value::Object(_) => active,
            _ => return None,
        };
        Some(Self::from_entry(entry))
    }

    /// Normalize the flat record served by the watermark registry.
    pub fn from_registry_record(record: &Value) -> Option<Self> {
        record.as_object()?;
        Some(Self::from_entry(record))
    }

    fn from_entry(entry: &Value) -> Self {
        let claim_generator = field(entry, "claim_generator", "claimGenerator")
            .and_then(Value::as_str)
            .map(str::to_string);

        let signature_info = field(entry, "signature_info", "signatureInfo")
            .and_then(Value::as_object)
            .map(|sig| SignatureInfo {
                issuer: sig.get("issuer").and_then(Value::as_str).map(str::to_string),
                time: sig
                    .get("time")
                    .and_then(Value::as_str)
                    .and_then(|t| DateTime::parse_from_rfc3339(t).ok())
                    .map(|t| t.with_timezone(&Utc)),
            });

        let assertions = entry
            .get("assertions")
            .map(assertion_list)
            .unwrap_or_default();

        Self {
            assertions,
            signature_info,
            claim_generator,
        }
    }

    /// Look up an assertion by exact label match.
    pub fn find_assertion(&self, label: &str) -> Option<&Assertion> {
        self.assertions.iter().find(|a| a.label == label)
    }

    /// The Schema.org CreativeWork metadata, when present.
    pub fn creative_work(&self) -> Option<CreativeWork> {
        let data = &self.find_assertion(CREATIVE_WORK_LABEL)?.data;
        Some(CreativeWork {
            name: data.get("name").and_then(Value::as_str).map(str::to_string),
            authors: data
                .get("author")
                .and_then(Value::as_array)
                .map(|authors| {
                    authors
                        .iter()
                        .filter_map(|a| a.get("name").and_then(Value::as_str))
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default(),
            description: data
                .get("description")
                .and_then(Value::as_str)
                .map(str::to_string),
            url: data.get("url").and_then(Value::as_str).map(str::to_string),
        })
    }

    /// The software that performed the `c2pa.created` action.
    pub fn software_agent(&self) -> Option<String> {
        let agent = self.created_action()?.get("softwareAgent")?;
        match agent {
            Value::String(name) => Some(name.clone()),
            // Newer SDKs emit a ClaimGeneratorInfo object here.
            Value::Object(_) => agent.get("name").and_then(Value::as_str).map(str::to_string),
            _ => None,
        }
    }

    /// The IPTC digital source type of the `c2pa.created` action.
    pub fn digital_source_type(&self) -> Option<DigitalSourceType> {
        self.created_action()?
            .get("digitalSourceType")
            .and_then(Value::as_str)
            .map(DigitalSourceType::from_url)
    }

    fn created_action(&self) -> Option<&Value> {
        self.find_assertion(ACTIONS_LABEL)?
            .data
            .get("actions")?
            .as_array()?
            .iter()
            .find(|a| a.get("action").and_then(Value::as_str) == Some("c2pa.created"))
    }
}

/// First of two spellings present on a JSON object.
fn field<'a>(value: &'a Value, snake: &str, camel: &str) -> Option<&'a Value> {
    value.get(snake).or_else(|| value.get(camel))
}

/// Assertions arrive either as a bare array or wrapped as `{ "data": [...] }`.
fn assertion_list(value: &Value) -> Vec<Assertion> {
    let items = match value {
        Value::Array(items) => items.as_slice(),
        Value::Object(_) => match value.get("data").and_then(Value::as_array) {
            Some(items) => items.as_slice(),
            None => return Vec::new(),
        },
        _ => return Vec::new(),
    };

    items
        .iter()
        .filter_map(|item| {
            Some(Assertion {
                label: item.get("label")?.as_str()?.to_string(),
                data: item.get("data").cloned().unwrap_or(Value::Null),
            })
        })
        .collect()
}

/// Parsed `stds.schema-org.CreativeWork` assertion payload.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CreativeWork {
    pub name: Option<String>,
    pub authors: Vec<String>,
    pub description: Option<String>,
    pub url: Option<String>,
}

const IPTC_PREFIX: &str = "http://cv.iptc.org/newscodes/digitalsourcetype/";

/// IPTC digital source type of an asset, from the newscodes vocabulary.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DigitalSourceType {
    DigitalCapture,
    TrainedAlgorithmicMedia,
    CompositeWithTrainedAlgorithmicMedia,
    DigitalCreation,
    Other(String),
}

impl DigitalSourceType {
    pub fn from_url(url: &str) -> Self {
        match url.strip_prefix(IPTC_PREFIX) {
            Some("digitalCapture") => Self::DigitalCapture,
            Some("trainedAlgorithmicMedia") => Self::TrainedAlgorithmicMedia,
            Some("compositeWithTrainedAlgorithmicMedia") => {
                Self::CompositeWithTrainedAlgorithmicMedia
            }
            Some("digitalCreation") => Self::DigitalCreation,
            _ => Self::Other(url.to_string()),
        }
    }

    /// Human-readable label for display surfaces.
    pub fn label(&self) -> &str {
        match self {
            Self::DigitalCapture => "Digital Capture",
            Self::TrainedAlgorithmicMedia => "AI-Generated",
            Self::CompositeWithTrainedAlgorithmicMedia => "Composite with AI",
            Self::DigitalCreation => "Digital Creation",
            Self::Other(url) => url,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sdk_store_snake() -> Value {
        json!({
            "active_manifest": "urn:uuid:1234",
            "manifests": {
                "urn:uuid:1234": {
                    "claim_generator": "make_test_images/0.16.1",
                    "signature_info": {
                        "issuer": "C2PA Test Signing Cert",
                        "time": "2026-03-04T10:30:00Z"
                    },
                    "assertions": [
                        {
                            "label": "stds.schema-org.CreativeWork",
                            "data": {
                                "name": "Sunset Over the Lake",
                                "author": [{ "name": "John Doe" }, { "name": "Jane Roe" }],
                                "url": "https://example.com/artwork/123"
                            }
                        },
                        {
                            "label": "c2pa.actions",
                            "data": {
                                "actions": [
                                    {
                                        "action": "c2pa.created",
                                        "softwareAgent": "Articulator.ai",
                                        "digitalSourceType": "http://cv.iptc.org/newscodes/digitalsourcetype/digitalCapture"
                                    },
                                    { "action": "c2pa.watermarked" }
                                ]
                            }
                        }
                    ]
                }
            }
        })
    }

    fn sdk_store_camel() -> Value {
        json!({
            "activeManifest": {
                "claimGenerator": "Articulator.ai/1.0",
                "signatureInfo": {
                    "issuer": "Truepic",
                    "time": "2026-01-15T08:00:00+00:00"
                },
                "assertions": {
                    "data": [
                        {
                            "label": "c2pa.actions",
                            "data": {
                                "actions": [
                                    {
                                        "action": "c2pa.created",
                                        "softwareAgent": { "name": "Articulator.ai", "version": "1.0" },
                                        "digitalSourceType": "http://cv.iptc.org/newscodes/digitalsourcetype/trainedAlgorithmicMedia"
                                    }
                                ]
                            }
                        }
                    ]
                }
            }
        })
    }

    #[test]
    fn test_sdk_store_snake_case() {
        let manifest = Manifest::from_sdk_store(&sdk_store_snake()).unwrap();
        assert_eq!(
            manifest.claim_generator.as_deref(),
            Some("make_test_images/0.16.1")
        );
        assert_eq!(manifest.assertions.len(), 2);

        let sig = manifest.signature_info.unwrap();
        assert_eq!(sig.issuer.as_deref(), Some("C2PA Test Signing Cert"));
        assert!(sig.time.is_some());
    }

    #[test]
    fn test_sdk_store_camel_case_inline_active() {
        let manifest = Manifest::from_sdk_store(&sdk_store_camel()).unwrap();
        assert_eq!(manifest.claim_generator.as_deref(), Some("Articulator.ai/1.0"));
        assert_eq!(manifest.assertions.len(), 1);
        assert_eq!(manifest.software_agent().as_deref(), Some("Articulator.ai"));
        assert_eq!(
            manifest.digital_source_type(),
            Some(DigitalSourceType::TrainedAlgorithmicMedia)
        );
    }

    #[test]
    fn test_sdk_store_missing_active_manifest() {
        assert!(Manifest::from_sdk_store(&json!({ "manifests": {} })).is_none());
        assert!(Manifest::from_sdk_store(&json!({ "active_manifest": 42 })).is_none());
        assert!(
            Manifest::from_sdk_store(&json!({ "active_manifest": "urn:missing" })).is_none(),
            "dangling pointer should not normalize"
        );
    }

    #[test]
    fn test_registry_record() {
        let record = json!({
            "claim_generator": "Articulator.ai/1.0",
            "signature_info": { "issuer": "Credlens Registry", "time": "2026-02-01T12:00:00Z" },
            "assertions": [
                { "label": "c2pa.actions", "data": { "actions": [] } }
            ]
        });
        let manifest = Manifest::from_registry_record(&record).unwrap();
        assert_eq!(manifest.claim_generator.as_deref(), Some("Articulator.ai/1.0"));
        assert_eq!(manifest.assertions.len(), 1);
        assert_eq!(
            manifest.signature_info.unwrap().issuer.as_deref(),
            Some("Credlens Registry")
        );
    }

    #[test]
    fn test_registry_record_rejects_non_object() {
        assert!(Manifest::from_registry_record(&json!("not a record")).is_none());
        assert!(Manifest::from_registry_record(&json!([1, 2, 3])).is_none());
    }

    #[test]
    fn test_registry_record_tolerates_sparse_fields() {
        let manifest = Manifest::from_registry_record(&json!({})).unwrap();
        assert!(manifest.assertions.is_empty());
        assert!(manifest.signature_info.is_none());
        assert!(manifest.claim_generator.is_none());
    }

    #[test]
    fn test_find_assertion_exact_label() {
        let manifest = Manifest::from_sdk_store(&sdk_store_snake()).unwrap();
        assert!(manifest.find_assertion("stds.schema-org.CreativeWork").is_some());
        assert!(manifest.find_assertion("c2pa.actions").is_some());
        // Prefix or fuzzy matches must not resolve
        assert!(manifest.find_assertion("stds.schema-org").is_none());
        assert!(manifest.find_assertion("c2pa").is_none());
    }

    #[test]
    fn test_creative_work() {
        let manifest = Manifest::from_sdk_store(&sdk_store_snake()).unwrap();
        let work = manifest.creative_work().unwrap();
        assert_eq!(work.name.as_deref(), Some("Sunset Over the Lake"));
        assert_eq!(work.authors, vec!["John Doe", "Jane Roe"]);
        assert!(work.description.is_none());
        assert_eq!(work.url.as_deref(), Some("https://example.com/artwork/123"));
    }

    #[test]
    fn test_software_agent_string_and_object() {
        let snake = Manifest::from_sdk_store(&sdk_store_snake()).unwrap();
        assert_eq!(snake.software_agent().as_deref(), Some("Articulator.ai"));

        let camel = Manifest::from_sdk_store(&sdk_store_camel()).unwrap();
        assert_eq!(camel.software_agent().as_deref(), Some("Articulator.ai"));
    }

    #[test]
    fn test_digital_source_type_mapping() {
        assert_eq!(
            DigitalSourceType::from_url(
                "http://cv.iptc.org/newscodes/digitalsourcetype/digitalCapture"
            ),
            DigitalSourceType::DigitalCapture
        );
        assert_eq!(
            DigitalSourceType::from_url(
                "http://cv.iptc.org/newscodes/digitalsourcetype/compositeWithTrainedAlgorithmicMedia"
            )
            .label(),
            "Composite with AI"
        );
        assert_eq!(
            DigitalSourceType::from_url(
                "http://cv.iptc.org/newscodes/digitalsourcetype/digitalCreation"
            ),
            DigitalSourceType::DigitalCreation
        );

        let other = DigitalSourceType::from_url("https://example.com/custom");
        assert_eq!(other, DigitalSourceType::Other("https://example.com/custom".into()));
        assert_eq!(other.label(), "https://example.com/custom");
    }

    #[test]
    fn test_signature_summary() {
        let sig = SignatureInfo {
            issuer: Some("Truepic".into()),
            time: Some("2026-03-04T10:30:00Z".parse().unwrap()),
        };
        assert_eq!(sig.summary(), "Issued by Truepic on Mar 4, 2026");

        let unsigned = SignatureInfo::default();
        assert_eq!(unsigned.summary(), "Issued by Unknown on an unknown date");
    }
}
