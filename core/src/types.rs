//! Request payloads for the scan and static-analysis services.
//!
//! The client itself accepts any `Serialize` payload; these types only give
//! the harness and suite files a typed shape for the two known services.

use serde::{Deserialize, Serialize};

/// A source component handed to the malware scanner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Component {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub branch: String,
    pub url: String,
}

/// Payload for `POST /rest/clamav/scan/{username}/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScanPayload {
    pub project: String,
    pub components: Vec<Component>,
}

/// Payload for `POST /rest/klocwork/submit/{username}/`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnalysisPayload {
    pub project: String,
    pub component: String,
    pub url: String,
    pub kw_scan_link: String,
}

/// Short human-readable name for a case, used in reports and logs.
pub trait CaseLabel {
    fn label(&self) -> String;
}

impl CaseLabel for ScanPayload {
    fn label(&self) -> String {
        let names: Vec<&str> = self.components.iter().map(|c| c.name.as_str()).collect();
        format!("{}[{}]", self.project, names.join(","))
    }
}

impl CaseLabel for AnalysisPayload {
    fn label(&self) -> String {
        format!("{}/{}", self.project, self.component)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn component_kind_serializes_as_type() {
        let payload = ScanPayload {
            project: "p".to_string(),
            components: vec![Component {
                name: "c".to_string(),
                kind: "code".to_string(),
                branch: "master".to_string(),
                url: "https://example/repo".to_string(),
            }],
        };
        let json = serde_json::to_value(&payload).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "project": "p",
                "components": [
                    {"name": "c", "type": "code", "branch": "master", "url": "https://example/repo"}
                ]
            })
        );
    }

    #[test]
    fn labels_name_the_case() {
        let scan: ScanPayload = serde_json::from_str(
            r#"{"project":"p","components":[
                {"name":"a","type":"code","branch":"b","url":"u"},
                {"name":"b","type":"code","branch":"b","url":"u"}]}"#,
        )
        .unwrap();
        assert_eq!(scan.label(), "p[a,b]");

        let analysis = AnalysisPayload {
            project: "p".to_string(),
            component: "c".to_string(),
            url: "u".to_string(),
            kw_scan_link: "l".to_string(),
        };
        assert_eq!(analysis.label(), "p/c");
    }
}
