//! Firestore REST v1 implementation of [`DocumentStore`].
//!
//! Listing uses one `documents:runQuery` call per category; deleting uses
//! `documents:commit`, which applies all of its writes or none. Requests are
//! not retried: a failed run can be re-invoked since reconciliation is
//! idempotent.

use std::collections::HashMap;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use sitebook_recon::config::MAX_BATCH_SIZE;
use sitebook_recon::{
    CatalogRecord, CatalogType, DeleteOutcome, DocumentStore, RecordId, ReconcileConfig, StoreError,
};

use crate::credentials::StoreTarget;
use crate::exit_codes;
use crate::CliError;

// ── Constants ───────────────────────────────────────────────────────

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const USER_AGENT: &str = concat!("clean-templates/", env!("CARGO_PKG_VERSION"));

// ── Wire types ──────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
struct RunQueryItem {
    #[serde(default)]
    document: Option<Document>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Document {
    name: String,
    #[serde(default)]
    fields: HashMap<String, Value>,
    #[serde(default)]
    create_time: Option<String>,
}

// ── Client ──────────────────────────────────────────────────────────

pub struct FirestoreStore {
    http: reqwest::blocking::Client,
    base_url: String,
    token: String,
    /// `projects/{p}/databases/{db}/documents`
    documents_path: String,
    collection: String,
    type_field: String,
    tenant_field: String,
    value_field: String,
}

impl FirestoreStore {
    pub fn new(target: &StoreTarget, config: &ReconcileConfig) -> Result<Self, CliError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(DEFAULT_TIMEOUT_SECS))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| CliError {
                code: exit_codes::EXIT_ERROR,
                message: format!("failed to build HTTP client: {e}"),
                hint: None,
            })?;

        Ok(Self {
            http,
            base_url: target.base_url.trim_end_matches('/').to_string(),
            token: target.token.clone(),
            documents_path: format!(
                "projects/{}/databases/{}/documents",
                target.project, target.database
            ),
            collection: config.collection.clone(),
            type_field: config.type_field.clone(),
            tenant_field: config.tenant_field.clone(),
            value_field: config.value_field.clone(),
        })
    }

    fn endpoint(&self, method: &str) -> String {
        format!("{}/v1/{}:{}", self.base_url, self.documents_path, method)
    }

    fn document_name(&self, id: &RecordId) -> String {
        format!("{}/{}/{}", self.documents_path, self.collection, id)
    }

    fn post(&self, method: &str, body: &Value) -> Result<String, StoreError> {
        let resp = self
            .http
            .post(self.endpoint(method))
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;

        let status = resp.status().as_u16();
        let text = resp
            .text()
            .map_err(|e| StoreError::Unavailable(format!("failed to read response body: {e}")))?;

        if (200..300).contains(&status) {
            return Ok(text);
        }

        let message = extract_error_message(&text, status);
        if status == 401 || status == 403 {
            return Err(StoreError::Unauthorized(message));
        }
        Err(StoreError::Rejected { status, message })
    }

    fn run_query_body(&self, catalog_type: CatalogType) -> Value {
        json!({
            "structuredQuery": {
                "from": [{ "collectionId": self.collection }],
                "where": {
                    "fieldFilter": {
                        "field": { "fieldPath": self.type_field },
                        "op": "EQUAL",
                        "value": { "stringValue": catalog_type.wire_name() }
                    }
                }
            }
        })
    }

    fn decode_document(&self, doc: Document, catalog_type: CatalogType) -> CatalogRecord {
        let id = doc.name.rsplit('/').next().unwrap_or(&doc.name).to_string();
        CatalogRecord {
            id: RecordId(id),
            catalog_type,
            tenant: doc.fields.get(&self.tenant_field).and_then(scalar_string),
            value: doc.fields.get(&self.value_field).and_then(scalar_string),
            created_at: doc.create_time.as_deref().and_then(parse_timestamp),
        }
    }
}

impl DocumentStore for FirestoreStore {
    fn list_records(&self, catalog_type: CatalogType) -> Result<Vec<CatalogRecord>, StoreError> {
        let text = self.post("runQuery", &self.run_query_body(catalog_type))?;
        let items: Vec<RunQueryItem> = serde_json::from_str(&text).map_err(|e| {
            StoreError::Decode(format!(
                "runQuery response: {e} (body: {})",
                text.chars().take(200).collect::<String>()
            ))
        })?;

        Ok(items
            .into_iter()
            .filter_map(|item| item.document)
            .map(|doc| self.decode_document(doc, catalog_type))
            .collect())
    }

    fn delete_batch(&self, ids: &[RecordId]) -> Result<DeleteOutcome, StoreError> {
        let writes: Vec<Value> = ids
            .iter()
            .map(|id| json!({ "delete": self.document_name(id) }))
            .collect();
        self.post("commit", &json!({ "writes": writes }))?;
        Ok(DeleteOutcome::Committed)
    }

    fn max_batch_size(&self) -> usize {
        MAX_BATCH_SIZE
    }
}

// ── Value decoding ──────────────────────────────────────────────────

/// String form of a scalar Firestore value. Null, empty and composite
/// values yield `None`.
fn scalar_string(value: &Value) -> Option<String> {
    let obj = value.as_object()?;
    let s = if let Some(s) = obj.get("stringValue") {
        s.as_str()?.to_string()
    } else if let Some(i) = obj.get("integerValue") {
        // int64 travels as a JSON string
        match i {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    } else if let Some(d) = obj.get("doubleValue") {
        // whole doubles print without a fraction so 2.0 groups with integer 2;
        // NaN and Infinity travel as strings
        match d {
            Value::String(s) => s.clone(),
            other => other.as_f64()?.to_string(),
        }
    } else if let Some(b) = obj.get("booleanValue") {
        b.as_bool()?.to_string()
    } else {
        return None;
    };
    (!s.is_empty()).then_some(s)
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s).ok().map(|t| t.with_timezone(&Utc))
}

fn extract_error_message(body: &str, status: u16) -> String {
    // Single-query errors come back as a one-element array.
    let parsed: Value = serde_json::from_str(body).unwrap_or(Value::Null);
    let error = match &parsed {
        Value::Array(items) => items.first().and_then(|v| v.get("error")),
        other => other.get("error"),
    };
    error
        .and_then(|e| e.get("message"))
        .and_then(|m| m.as_str())
        .map(String::from)
        .unwrap_or_else(|| format!("HTTP {status}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    const DOCS: &str = "/v1/projects/demo/databases/(default)/documents";

    fn store_for(server: &MockServer) -> FirestoreStore {
        let target = StoreTarget {
            base_url: server.base_url(),
            project: "demo".into(),
            database: "(default)".into(),
            token: "test-token".into(),
            emulator: true,
        };
        FirestoreStore::new(&target, &ReconcileConfig::default()).unwrap()
    }

    fn doc(id: &str, company: Option<&str>, value: Value, create_time: &str) -> Value {
        let mut fields = serde_json::Map::new();
        fields.insert("type".into(), json!({ "stringValue": "boq_units" }));
        if let Some(c) = company {
            fields.insert("companyId".into(), json!({ "stringValue": c }));
        }
        fields.insert("value".into(), value);
        fields.insert("label".into(), json!({ "stringValue": "ignored" }));
        json!({
            "document": {
                "name": format!("projects/demo/databases/(default)/documents/templates/{id}"),
                "fields": fields,
                "createTime": create_time,
                "updateTime": create_time
            },
            "readTime": "2026-01-01T00:00:00Z"
        })
    }

    #[test]
    fn run_query_decodes_documents() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path(format!("{DOCS}:runQuery"))
                .header("authorization", "Bearer test-token")
                .json_body(json!({
                    "structuredQuery": {
                        "from": [{ "collectionId": "templates" }],
                        "where": {
                            "fieldFilter": {
                                "field": { "fieldPath": "type" },
                                "op": "EQUAL",
                                "value": { "stringValue": "boq_units" }
                            }
                        }
                    }
                }));
            then.status(200).json_body(json!([
                doc("a1", Some("T1"), json!({ "stringValue": "m2" }), "2025-03-01T10:00:00.123456Z"),
                doc("a2", None, json!({ "integerValue": "42" }), "2025-03-02T10:00:00Z"),
                doc("a3", Some("T1"), json!({ "nullValue": null }), "2025-03-03T10:00:00Z"),
                { "readTime": "2026-01-01T00:00:00Z" }
            ]));
        });

        let records = store_for(&server).list_records(CatalogType::UnitOfMeasure).unwrap();
        mock.assert();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].id.as_str(), "a1");
        assert_eq!(records[0].tenant.as_deref(), Some("T1"));
        assert_eq!(records[0].value.as_deref(), Some("m2"));
        assert!(records[0].created_at.is_some());
        assert_eq!(records[1].tenant, None);
        assert_eq!(records[1].value.as_deref(), Some("42"));
        assert_eq!(records[2].value, None);
        assert!(records.iter().all(|r| r.catalog_type == CatalogType::UnitOfMeasure));
    }

    #[test]
    fn empty_query_result() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path(format!("{DOCS}:runQuery"));
            then.status(200).json_body(json!([{ "readTime": "2026-01-01T00:00:00Z" }]));
        });
        let records = store_for(&server).list_records(CatalogType::StockUnit).unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn commit_sends_one_delete_per_id() {
        let server = MockServer::start();
        let mock = server.mock(|when, then| {
            when.method(POST)
                .path(format!("{DOCS}:commit"))
                .json_body(json!({
                    "writes": [
                        { "delete": "projects/demo/databases/(default)/documents/templates/d1" },
                        { "delete": "projects/demo/databases/(default)/documents/templates/d2" }
                    ]
                }));
            then.status(200).json_body(json!({
                "writeResults": [{}, {}],
                "commitTime": "2026-01-01T00:00:00Z"
            }));
        });

        let outcome = store_for(&server)
            .delete_batch(&["d1".into(), "d2".into()])
            .unwrap();
        mock.assert();
        assert_eq!(outcome, DeleteOutcome::Committed);
    }

    #[test]
    fn permission_denied_is_unauthorized() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path(format!("{DOCS}:commit"));
            then.status(403).json_body(json!({
                "error": { "code": 403, "message": "Missing or insufficient permissions.", "status": "PERMISSION_DENIED" }
            }));
        });
        let err = store_for(&server).delete_batch(&["d1".into()]).unwrap_err();
        assert_eq!(err, StoreError::Unauthorized("Missing or insufficient permissions.".into()));
    }

    #[test]
    fn quota_error_is_rejected_with_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path(format!("{DOCS}:runQuery"));
            then.status(429).json_body(json!([{
                "error": { "code": 429, "message": "Quota exceeded.", "status": "RESOURCE_EXHAUSTED" }
            }]));
        });
        let err = store_for(&server).list_records(CatalogType::StockUnit).unwrap_err();
        assert_eq!(err, StoreError::Rejected { status: 429, message: "Quota exceeded.".into() });
    }

    #[test]
    fn non_json_body_is_decode_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(POST).path(format!("{DOCS}:runQuery"));
            then.status(200).body("<html>proxy</html>");
        });
        let err = store_for(&server).list_records(CatalogType::StockUnit).unwrap_err();
        assert!(matches!(err, StoreError::Decode(_)));
    }

    #[test]
    fn connection_refused_is_unavailable() {
        let target = StoreTarget {
            base_url: "http://127.0.0.1:9".into(),
            project: "demo".into(),
            database: "(default)".into(),
            token: "t".into(),
            emulator: true,
        };
        let store = FirestoreStore::new(&target, &ReconcileConfig::default()).unwrap();
        let err = store.list_records(CatalogType::StockUnit).unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }

    #[test]
    fn whole_double_matches_integer() {
        let int = scalar_string(&json!({ "integerValue": "2" }));
        let double = scalar_string(&json!({ "doubleValue": 2.0 }));
        assert_eq!(int.as_deref(), Some("2"));
        assert_eq!(double, int);
        assert_eq!(scalar_string(&json!({ "doubleValue": -0.5 })), Some("-0.5".into()));
    }

    #[test]
    fn scalar_string_rules() {
        assert_eq!(scalar_string(&json!({ "stringValue": "kg" })), Some("kg".into()));
        assert_eq!(scalar_string(&json!({ "stringValue": "" })), None);
        assert_eq!(scalar_string(&json!({ "booleanValue": true })), Some("true".into()));
        assert_eq!(scalar_string(&json!({ "doubleValue": 2.5 })), Some("2.5".into()));
        assert_eq!(scalar_string(&json!({ "doubleValue": "NaN" })), Some("NaN".into()));
        assert_eq!(scalar_string(&json!({ "mapValue": { "fields": {} } })), None);
        assert_eq!(scalar_string(&json!("bare")), None);
    }
}
