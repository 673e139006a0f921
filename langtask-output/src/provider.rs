//! Provider adapter boundary.
//!
//! A [`ProviderAdapter`] invokes the text-generation service and hands back
//! raw output. How it builds prompts, talks to the service, retries or
//! times out is its own business.

use async_trait::async_trait;
use langtask_schema::CompiledType;
use std::sync::Arc;

use crate::error::AdapterError;
use crate::raw::RawOutput;

/// Invokes a generation service for a compiled type.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    /// Identity of the adapter, e.g. `openai`.
    fn name(&self) -> &str;

    /// Produce raw output for `compiled`.
    async fn invoke(&self, compiled: &CompiledType) -> Result<RawOutput, AdapterError>;
}

/// Boxed adapter for dynamic dispatch.
pub type BoxedAdapter = Arc<dyn ProviderAdapter>;

/// Wraps a synchronous function as an adapter.
pub struct SyncAdapter<F> {
    name: String,
    func: F,
}

impl<F> SyncAdapter<F>
where
    F: Fn(&CompiledType) -> Result<RawOutput, AdapterError> + Send + Sync,
{
    /// Create a new sync adapter.
    pub fn new(name: impl Into<String>, func: F) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

#[async_trait]
impl<F> ProviderAdapter for SyncAdapter<F>
where
    F: Fn(&CompiledType) -> Result<RawOutput, AdapterError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    async fn invoke(&self, compiled: &CompiledType) -> Result<RawOutput, AdapterError> {
        (self.func)(compiled)
    }
}

impl<F> std::fmt::Debug for SyncAdapter<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyncAdapter")
            .field("name", &self.name)
            .finish()
    }
}
