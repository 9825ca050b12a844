//! Tool runtime context passed to every handler invocation.

use pcommon::{MetadataMap, RequestId};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolExecutionContext {
    pub request_id: RequestId,
    pub metadata: MetadataMap,
}

impl ToolExecutionContext {
    pub fn new(request_id: RequestId) -> Self {
        Self {
            request_id,
            metadata: MetadataMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}
