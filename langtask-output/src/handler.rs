//! Generation-result handling.
//!
//! Invokes a provider adapter and sorts whatever it produces into one of
//! three outcomes: a validation error (passed through), a parsing failure
//! (reported as a [`ErrorCategory::Parse`] error on the target type), or
//! an infrastructure failure.

use langtask_core::{
    truncate_text, ClassifiedError, Constraints, Error, ErrorCategory, InfrastructureError,
};
use langtask_schema::{CompiledType, StructuredResponse};
use std::sync::Arc;
use tracing::error;

use crate::error::AdapterError;
use crate::provider::ProviderAdapter;
use crate::validator::OutputValidator;

impl OutputValidator {
    /// Invoke `adapter` for `compiled` and validate its output.
    pub async fn handle_generation_result<A>(
        &self,
        adapter: &A,
        compiled: &Arc<CompiledType>,
    ) -> Result<StructuredResponse, Error>
    where
        A: ProviderAdapter + ?Sized,
    {
        let raw = match adapter.invoke(compiled).await {
            Ok(raw) => raw,
            Err(err) => return Err(self.classify_adapter_error(adapter.name(), compiled, err)),
        };
        Ok(self.validate(raw, compiled)?)
    }

    fn classify_adapter_error(
        &self,
        provider: &str,
        compiled: &CompiledType,
        err: AdapterError,
    ) -> Error {
        let is_parsing_error = err.is_parsing_error();
        let classified = match err {
            AdapterError::Validation(err) => Error::Classified(err),
            AdapterError::Parse { message, raw } => {
                let type_name = compiled.name();
                let mut constraints = Constraints::new(ErrorCategory::Parse)
                    .with_detail("provider", provider);
                if let Some(raw) = raw {
                    constraints = constraints
                        .with_preview(truncate_text(&raw, self.settings().preview_limit));
                }
                let message = format!(
                    "Could not parse the generated output into '{}': {}. \
                     Adjust the upstream instructions to request output matching the schema.",
                    type_name, message
                );
                Error::Classified(
                    ClassifiedError::new(ErrorCategory::Parse, type_name, message)
                        .with_constraints(constraints),
                )
            }
            AdapterError::Failed { message, response } => Error::Infrastructure(
                InfrastructureError::new("Generation request failed", provider)
                    .with_response(response)
                    .with_cause(message),
            ),
        };

        error!(
            provider,
            type_name = compiled.name(),
            category = %classified.category(),
            is_parsing_error,
            error = %classified,
            "Generation failed"
        );
        classified
    }
}

/// Invoke `adapter` and validate its output with default settings.
pub async fn handle_generation_result<A>(
    adapter: &A,
    compiled: &Arc<CompiledType>,
) -> Result<StructuredResponse, Error>
where
    A: ProviderAdapter + ?Sized,
{
    OutputValidator::new()
        .handle_generation_result(adapter, compiled)
        .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{BoxedAdapter, SyncAdapter};
    use crate::raw::{Generation, RawOutput};
    use async_trait::async_trait;
    use langtask_schema::compile;
    use serde_json::json;

    fn sentiment() -> Arc<CompiledType> {
        compile(
            Some(&json!({
                "sentiment": {"type": "string", "options": ["positive", "negative", "neutral"]},
                "confidence": {"type": "number"}
            })),
            "/schemas/sentiment_schema.yaml",
        )
        .unwrap()
        .unwrap()
    }

    struct FixedAdapter {
        outcome: Result<RawOutput, AdapterError>,
    }

    #[async_trait]
    impl ProviderAdapter for FixedAdapter {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn invoke(&self, _compiled: &CompiledType) -> Result<RawOutput, AdapterError> {
            self.outcome.clone()
        }
    }

    #[tokio::test]
    async fn test_success() {
        let _ = tracing_subscriber::fmt().with_test_writer().try_init();
        let adapter = FixedAdapter {
            outcome: Ok(Generation::new("")
                .with_data(json!({"sentiment": "positive", "confidence": 0.9}))
                .into()),
        };
        let response = handle_generation_result(&adapter, &sentiment()).await.unwrap();
        assert_eq!(response.get("sentiment").unwrap(), &"positive");
    }

    #[tokio::test]
    async fn test_validation_error_passes_through() {
        let adapter = FixedAdapter {
            outcome: Ok(json!({"confidence": 0.9}).into()),
        };
        let err = handle_generation_result(&adapter, &sentiment()).await.unwrap_err();
        assert_eq!(err.category(), ErrorCategory::MissingField);
        assert_eq!(err.as_classified().unwrap().field, "sentiment");
    }

    #[tokio::test]
    async fn test_adapter_validation_error_unchanged() {
        let original = ClassifiedError::new(ErrorCategory::OptionMismatch, "sentiment", "bad option");
        let adapter = FixedAdapter {
            outcome: Err(AdapterError::Validation(original.clone())),
        };
        let err = handle_generation_result(&adapter, &sentiment()).await.unwrap_err();
        assert_eq!(err, Error::Classified(original));
    }

    #[tokio::test]
    async fn test_parse_error_is_reclassified() {
        let adapter = FixedAdapter {
            outcome: Err(AdapterError::parse_with_raw("expected value at line 1", "x".repeat(150))),
        };
        let err = handle_generation_result(&adapter, &sentiment()).await.unwrap_err();
        let classified = err.as_classified().unwrap();
        assert_eq!(classified.category, ErrorCategory::Parse);
        assert_eq!(classified.field, "SentimentSchemaResponse");
        assert!(classified.message.contains("expected value at line 1"));
        assert_eq!(classified.input_preview().map(|p| p.chars().count()), Some(103));
        assert_eq!(classified.constraints.details["provider"], json!("fixed"));
    }

    #[tokio::test]
    async fn test_other_failure_is_infrastructure() {
        let adapter: BoxedAdapter = Arc::new(SyncAdapter::new("flaky", |_: &CompiledType| {
            Err(AdapterError::failed_with_response("HTTP 503", json!({"status": 503})))
        }));
        let err = handle_generation_result(adapter.as_ref(), &sentiment())
            .await
            .unwrap_err();

        match err {
            Error::Infrastructure(infra) => {
                assert_eq!(infra.provider, "flaky");
                assert_eq!(infra.response, Some(json!({"status": 503})));
                assert_eq!(infra.cause.as_deref(), Some("HTTP 503"));
            }
            other => panic!("expected infrastructure error, got {:?}", other),
        }
    }
}
