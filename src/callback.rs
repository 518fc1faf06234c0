//! 检索回调：记录数据集查询与命中计数（旁路写入，不影响主流程）。
//!
//! Retrieval callback contract.
//!
//! When a conversation is grounded on dataset retrieval, the surrounding system records the
//! query, bumps a hit counter for every retrieved segment and stores the resources cited in the
//! answer. The gateway only defines the contract ([`RetrievalStore`]) and the callback that
//! drives it ([`IndexToolCallback`]); persistence belongs to the caller.
//!
//! Writes are fire-and-forget: a failing store is logged at `warn` and never fails the call.

use crate::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::{Arc, RwLock};
use tracing::{debug, warn};

/// Surface a call was made from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InvokeFrom {
    ServiceApi,
    WebApp,
    Explore,
    Debugger,
}

impl InvokeFrom {
    /// Role recorded as the query author: workspace members for explore/debugger, end users
    /// everywhere else.
    pub fn created_by_role(&self) -> &'static str {
        match self {
            InvokeFrom::Explore | InvokeFrom::Debugger => "account",
            InvokeFrom::ServiceApi | InvokeFrom::WebApp => "end_user",
        }
    }
}

/// One dataset query event.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatasetQuery {
    pub dataset_id: String,
    pub content: String,
    pub source: String,
    pub source_app_id: String,
    pub created_by_role: String,
    pub created_by: String,
}

/// A resource cited in an answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetrieverResource {
    pub message_id: String,
    pub position: Option<u32>,
    pub dataset_id: Option<String>,
    pub dataset_name: Option<String>,
    pub document_id: Option<String>,
    pub document_name: Option<String>,
    pub data_source_type: Option<String>,
    pub segment_id: Option<String>,
    pub score: Option<f64>,
    pub hit_count: Option<u64>,
    pub word_count: Option<u64>,
    pub segment_position: Option<u64>,
    pub index_node_hash: Option<String>,
    pub content: Option<String>,
    pub retriever_from: Option<String>,
    pub created_by: String,
}

/// Document returned by a retrieval tool.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RetrievedDocument {
    pub page_content: String,
    #[serde(default)]
    pub metadata: Map<String, Value>,
}

impl RetrievedDocument {
    pub fn new(page_content: impl Into<String>) -> Self {
        Self {
            page_content: page_content.into(),
            metadata: Map::new(),
        }
    }

    pub fn with_doc_id(mut self, doc_id: impl Into<String>) -> Self {
        self.metadata
            .insert("doc_id".to_string(), Value::String(doc_id.into()));
        self
    }

    /// Index node id of the segment this document came from.
    pub fn doc_id(&self) -> Option<&str> {
        self.metadata.get("doc_id").and_then(Value::as_str)
    }
}

/// Persistence side channel for retrieval events.
#[async_trait]
pub trait RetrievalStore: Send + Sync {
    async fn record_query(&self, query: DatasetQuery) -> Result<()>;

    /// Add one hit to the segment indexed under `doc_id`.
    async fn increment_hit_count(&self, doc_id: &str) -> Result<()>;

    async fn save_retriever_resource(&self, resource: RetrieverResource) -> Result<()>;
}

/// Store that drops everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRetrievalStore;

#[async_trait]
impl RetrievalStore for NoopRetrievalStore {
    async fn record_query(&self, _query: DatasetQuery) -> Result<()> {
        Ok(())
    }

    async fn increment_hit_count(&self, _doc_id: &str) -> Result<()> {
        Ok(())
    }

    async fn save_retriever_resource(&self, _resource: RetrieverResource) -> Result<()> {
        Ok(())
    }
}

pub fn noop_store() -> Arc<dyn RetrievalStore> {
    Arc::new(NoopRetrievalStore)
}

#[derive(Debug, Default)]
struct Recorded {
    queries: Vec<DatasetQuery>,
    hits: Vec<String>,
    resources: Vec<RetrieverResource>,
}

/// In-memory store for testing.
#[derive(Debug, Default)]
pub struct InMemoryRetrievalStore {
    inner: RwLock<Recorded>,
}

impl InMemoryRetrievalStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> std::sync::RwLockReadGuard<'_, Recorded> {
        self.inner.read().unwrap_or_else(|p| p.into_inner())
    }

    fn write(&self) -> std::sync::RwLockWriteGuard<'_, Recorded> {
        self.inner.write().unwrap_or_else(|p| p.into_inner())
    }

    pub fn queries(&self) -> Vec<DatasetQuery> {
        self.read().queries.clone()
    }

    pub fn resources(&self) -> Vec<RetrieverResource> {
        self.read().resources.clone()
    }

    /// Hits recorded for `doc_id`.
    pub fn hit_count(&self, doc_id: &str) -> usize {
        self.read().hits.iter().filter(|h| h.as_str() == doc_id).count()
    }
}

#[async_trait]
impl RetrievalStore for InMemoryRetrievalStore {
    async fn record_query(&self, query: DatasetQuery) -> Result<()> {
        self.write().queries.push(query);
        Ok(())
    }

    async fn increment_hit_count(&self, doc_id: &str) -> Result<()> {
        self.write().hits.push(doc_id.to_string());
        Ok(())
    }

    async fn save_retriever_resource(&self, resource: RetrieverResource) -> Result<()> {
        self.write().resources.push(resource);
        Ok(())
    }
}

/// Callback for dataset retrieval tools, bound to one message of one app.
pub struct IndexToolCallback {
    store: Arc<dyn RetrievalStore>,
    app_id: String,
    message_id: String,
    user_id: String,
    invoke_from: InvokeFrom,
}

impl IndexToolCallback {
    pub fn new(
        store: Arc<dyn RetrievalStore>,
        app_id: impl Into<String>,
        message_id: impl Into<String>,
        user_id: impl Into<String>,
        invoke_from: InvokeFrom,
    ) -> Self {
        Self {
            store,
            app_id: app_id.into(),
            message_id: message_id.into(),
            user_id: user_id.into(),
            invoke_from,
        }
    }

    pub async fn on_query(&self, query: &str, dataset_id: &str) {
        let event = DatasetQuery {
            dataset_id: dataset_id.to_string(),
            content: query.to_string(),
            source: "app".to_string(),
            source_app_id: self.app_id.clone(),
            created_by_role: self.invoke_from.created_by_role().to_string(),
            created_by: self.user_id.clone(),
        };
        if let Err(e) = self.store.record_query(event).await {
            warn!(dataset_id, error = %e, "failed to record dataset query");
        }
    }

    /// Count one hit per retrieved document; documents without a `doc_id` are skipped.
    pub async fn on_tool_end(&self, documents: &[RetrievedDocument]) {
        for doc in documents {
            let Some(doc_id) = doc.doc_id() else {
                debug!("retrieved document without doc_id; hit not counted");
                continue;
            };
            if let Err(e) = self.store.increment_hit_count(doc_id).await {
                warn!(doc_id, error = %e, "failed to increment segment hit count");
            }
        }
    }

    /// Store the resources cited in the answer.
    ///
    /// Each item is a loosely typed object; unknown keys are ignored and items that do not fit
    /// the resource shape are skipped.
    pub async fn return_retriever_resources(&self, resources: &[Value]) {
        for item in resources {
            let mut resource: RetrieverResource = match serde_json::from_value(item.clone()) {
                Ok(r) => r,
                Err(e) => {
                    warn!(error = %e, "skipping malformed retriever resource");
                    continue;
                }
            };
            resource.message_id = self.message_id.clone();
            resource.created_by = self.user_id.clone();
            if let Err(e) = self.store.save_retriever_resource(resource).await {
                warn!(
                    message_id = self.message_id.as_str(),
                    error = %e,
                    "failed to save retriever resource"
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_created_by_role() {
        assert_eq!(InvokeFrom::Explore.created_by_role(), "account");
        assert_eq!(InvokeFrom::Debugger.created_by_role(), "account");
        assert_eq!(InvokeFrom::WebApp.created_by_role(), "end_user");
        assert_eq!(InvokeFrom::ServiceApi.created_by_role(), "end_user");
    }

    #[test]
    fn test_invoke_from_wire_names() {
        let v: InvokeFrom = serde_json::from_str("\"service-api\"").unwrap();
        assert_eq!(v, InvokeFrom::ServiceApi);
    }

    #[test]
    fn test_doc_id() {
        assert_eq!(RetrievedDocument::new("x").with_doc_id("n1").doc_id(), Some("n1"));
        assert_eq!(RetrievedDocument::new("x").doc_id(), None);
    }
}
