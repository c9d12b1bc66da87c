use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Opaque identifier as the platform returned it.
///
/// Ids come back as JSON strings or integers depending on the resource; they are echoed
/// back in the same shape.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RawId {
    Number(u64),
    Text(String),
}

impl std::fmt::Display for RawId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RawId::Number(n) => write!(f, "{n}"),
            RawId::Text(s) => f.write_str(s),
        }
    }
}

impl From<&str> for RawId {
    fn from(value: &str) -> Self {
        RawId::Text(value.to_string())
    }
}

impl From<u64> for RawId {
    fn from(value: u64) -> Self {
        RawId::Number(value)
    }
}

macro_rules! resource_id {
    ($(#[$meta:meta])* $name:ident) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(RawId);

        impl $name {
            pub fn new(raw: impl Into<RawId>) -> Self {
                Self(raw.into())
            }

            pub fn raw(&self) -> &RawId {
                &self.0
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

resource_id!(
    /// Network resolved from the configured name
    NetworkId
);
resource_id!(
    /// Assessment container created for this run
    AssessmentId
);
resource_id!(
    /// Upload slot bound to one assessment and one network
    UploadId
);

/// Assessment as created by this run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CreatedAssessment {
    pub id: AssessmentId,
    pub name: String,
    pub start_date: String,
    pub start_time: String,
}

/// Local report produced by the dependency scan
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFile {
    folder: PathBuf,
    file_name: String,
}

impl ReportFile {
    pub fn new(folder: impl Into<PathBuf>, file_name: impl Into<String>) -> Self {
        Self {
            folder: folder.into(),
            file_name: file_name.into(),
        }
    }

    pub fn folder(&self) -> &Path {
        &self.folder
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn path(&self) -> PathBuf {
        self.folder.join(&self.file_name)
    }
}

// Wire formats

#[derive(Debug, Clone, Serialize)]
pub struct SearchFilter {
    pub field: String,
    pub exclusive: bool,
    pub operator: String,
    pub value: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SortField {
    pub field: String,
    pub direction: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct NetworkSearchRequest {
    pub filters: Vec<SearchFilter>,
    pub projection: String,
    pub sort: Vec<SortField>,
    pub page: u32,
    pub size: u32,
}

impl NetworkSearchRequest {
    /// Exact match on the network name, first page of size one
    pub fn exact_name(name: &str) -> Self {
        Self {
            filters: vec![SearchFilter {
                field: "name".to_string(),
                exclusive: false,
                operator: "EXACT".to_string(),
                value: name.to_string(),
            }],
            projection: "basic".to_string(),
            sort: vec![SortField {
                field: "name".to_string(),
                direction: "ASC".to_string(),
            }],
            page: 0,
            size: 1,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct PageInfo {
    #[serde(rename = "totalElements")]
    pub total_elements: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkSummary {
    pub id: NetworkId,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct EmbeddedNetworks {
    #[serde(default)]
    pub networks: Vec<NetworkSummary>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NetworkSearchResponse {
    pub page: PageInfo,
    #[serde(rename = "_embedded", default)]
    pub embedded: EmbeddedNetworks,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAssessment {
    pub name: String,
    pub start_date: String,
    pub notes: String,
    pub start_time: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewUpload {
    pub assessment_id: AssessmentId,
    pub name: String,
    pub network_id: NetworkId,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartParsing {
    pub auto_urba: bool,
}

/// Body of any "created" response; only the id is used
#[derive(Debug, Clone, Deserialize)]
pub struct Created<Id> {
    pub id: Id,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_ids_keep_their_wire_shape() {
        let text: NetworkId = serde_json::from_value(json!("net-42")).unwrap();
        let number: NetworkId = serde_json::from_value(json!(42)).unwrap();

        assert_eq!(text.to_string(), "net-42");
        assert_eq!(number.to_string(), "42");
        assert_eq!(serde_json::to_value(&text).unwrap(), json!("net-42"));
        assert_eq!(serde_json::to_value(&number).unwrap(), json!(42));
    }

    #[test]
    fn test_new_upload_serializes_camel_case() {
        let body = NewUpload {
            assessment_id: AssessmentId::new("assess-7"),
            name: "2024-01-15".to_string(),
            network_id: NetworkId::new(42),
        };
        assert_eq!(
            serde_json::to_value(body).unwrap(),
            json!({"assessmentId": "assess-7", "name": "2024-01-15", "networkId": 42})
        );
    }

    #[test]
    fn test_network_search_request_shape() {
        let body = serde_json::to_value(NetworkSearchRequest::exact_name("CorpNet")).unwrap();
        assert_eq!(
            body,
            json!({
                "filters": [{"field": "name", "exclusive": false, "operator": "EXACT", "value": "CorpNet"}],
                "projection": "basic",
                "sort": [{"field": "name", "direction": "ASC"}],
                "page": 0,
                "size": 1
            })
        );
    }

    #[test]
    fn test_search_response_without_embedded_list() {
        let response: NetworkSearchResponse =
            serde_json::from_value(json!({"page": {"totalElements": 0}})).unwrap();
        assert_eq!(response.page.total_elements, 0);
        assert!(response.embedded.networks.is_empty());
    }

    #[test]
    fn test_report_path_joins_folder_and_name() {
        let report = ReportFile::new("/data/reports", "dependabot.csv");
        assert_eq!(report.path(), PathBuf::from("/data/reports/dependabot.csv"));
    }
}
