//! Default InvokeMethod.

use cim_model::{CimObjectName, CimParamValue, NocaseMap};

use crate::base::BaseProvider;
use crate::error::{CimError, Result};
use crate::providers::traits::MethodProvider;
use crate::types::InvokeMethodResult;

/// Fallback for classes without a registered method provider. Extrinsic
/// methods have no generic behavior, so every call fails.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultMethodProvider;

impl DefaultMethodProvider {
    pub fn invoke_method(
        &self,
        _base: &mut BaseProvider,
        namespace: &str,
        method_name: &str,
        object_name: &CimObjectName,
        _params: &NocaseMap<CimParamValue>,
    ) -> Result<InvokeMethodResult> {
        Err(CimError::method_not_found(format!(
            "No method provider registered for method {method_name} of class {} in namespace {namespace}",
            object_name.classname()
        )))
    }
}

impl MethodProvider for DefaultMethodProvider {
    fn provider_classnames(&self) -> Vec<String> {
        Vec::new()
    }
}
