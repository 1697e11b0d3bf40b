//! Bundle describing how to reach and read one operator's container map.

use std::sync::Arc;

use crate::extract::{RecordExtractor, ScriptBlockLocator, VariableNames};
use crate::model::OperatorMeta;
use crate::ports::UpstreamPort;

/// Everything needed to query containers of a single operator.
pub struct OperatorPlugin {
    /// Static metadata describing the operator.
    pub meta: OperatorMeta,
    /// Script variables carrying the district and container arrays.
    pub variables: VariableNames,
    /// Implementation for downloading the operator page.
    pub upstream: Arc<dyn UpstreamPort>,
}

impl OperatorPlugin {
    /// Locator recognising this operator's script block.
    #[must_use]
    pub fn locator(&self) -> ScriptBlockLocator {
        ScriptBlockLocator::new(self.variables.clone())
    }

    /// Extractor decoding this operator's records.
    #[must_use]
    pub fn extractor(&self) -> RecordExtractor {
        RecordExtractor::new(self.variables.clone())
    }
}
