use super::propagation::PropagationReport;
use crate::common::AnalysisConfig;
use crate::domain::{PropagationRequest, RunMode, StackResult};

/// One way of turning a bin directory's measurements into derived
/// properties. Implementations share the ratio and abundance kernels and
/// differ only in how uncertainty is handled.
pub trait PropagationStrategy {
    fn mode(&self) -> RunMode;

    fn execute(
        &self,
        request: &PropagationRequest,
        config: &AnalysisConfig,
    ) -> StackResult<PropagationReport>;
}

#[cfg(test)]
mod tests {
    use super::PropagationStrategy;
    use crate::common::AnalysisConfig;
    use crate::domain::{PropagationRequest, RunMode, StackError, StackErrorCategory};
    use crate::modules::propagation::PropagationReport;

    struct FailingStrategy;

    impl PropagationStrategy for FailingStrategy {
        fn mode(&self) -> RunMode {
            RunMode::Deterministic
        }

        fn execute(
            &self,
            _request: &PropagationRequest,
            _config: &AnalysisConfig,
        ) -> crate::domain::StackResult<PropagationReport> {
            Err(StackError::computation("RUN.PROPAGATION", "propagation failed"))
        }
    }

    #[test]
    fn strategies_use_shared_error_types() {
        let request = PropagationRequest::new("bins", RunMode::Deterministic);
        let error = FailingStrategy
            .execute(&request, &AnalysisConfig::default())
            .expect_err("strategy should fail");
        assert_eq!(error.category(), StackErrorCategory::ComputationError);
        assert_eq!(error.exit_code(), 4);
        assert_eq!(error.placeholder(), "RUN.PROPAGATION");
    }
}
