//! Open..., Pull... and CloseEnumeration.
//!
//! Every Open... runs the corresponding non-pull operation to build the
//! complete result set, then hands it to the enumeration contexts for
//! paging.

use cim_model::{CimInstance, CimInstanceName, CimObjectName};
use tracing::warn;

use super::MainProvider;
use crate::config::FILTER_QUERY_LANGUAGE_FQL;
use crate::enumeration::{ContextItem, ContextSettings, PullType};
use crate::error::{CimError, Result};
use crate::types::{
    AssociatorOptions, CimObject, InstanceOptions, OpenOptions, PullResult, ReferenceOptions,
};

impl MainProvider {
    fn require_pull_enabled(&self) -> Result<()> {
        if self.base.config().disable_pull_operations {
            Err(CimError::not_supported("Pull operations are disabled"))
        } else {
            Ok(())
        }
    }

    /// Checks shared by every Open... operation.
    fn validate_open(&self, namespace: &str, options: &OpenOptions) -> Result<()> {
        self.require_pull_enabled()?;
        self.base.validate_namespace(namespace)?;

        match (&options.filter_query_language, &options.filter_query) {
            (None, Some(_)) => {
                return Err(CimError::invalid_parameter(
                    "FilterQuery requires FilterQueryLanguage",
                ))
            }
            (Some(language), _) if language != FILTER_QUERY_LANGUAGE_FQL => {
                return Err(CimError::query_language_not_supported(format!(
                    "Filter query language {language} is not supported; only {FILTER_QUERY_LANGUAGE_FQL} is"
                )))
            }
            (Some(_), Some(query)) => {
                warn!(namespace = %namespace, filter_query = %query, "FilterQuery accepted but not applied");
            }
            _ => {}
        }

        if let Some(timeout) = options.operation_timeout {
            let ceiling = self.base.config().open_max_timeout;
            if timeout > ceiling {
                return Err(CimError::invalid_parameter(format!(
                    "OperationTimeout {timeout} exceeds the server maximum of {ceiling} seconds"
                )));
            }
        }
        Ok(())
    }

    fn max_object_count(&self, requested: Option<u32>) -> u32 {
        requested.unwrap_or(self.base.config().default_max_object_count)
    }

    fn open<T: ContextItem>(
        &mut self,
        pull_type: PullType,
        namespace: &str,
        items: Vec<T>,
        options: &OpenOptions,
    ) -> PullResult<T> {
        let max = self.max_object_count(options.max_object_count);
        self.contexts.open(
            pull_type,
            namespace,
            items,
            max,
            ContextSettings {
                operation_timeout: options.operation_timeout,
                continue_on_error: options.continue_on_error.unwrap_or(false),
            },
        )
    }

    pub fn open_enumerate_instances(
        &mut self,
        namespace: &str,
        classname: &str,
        instance_options: &InstanceOptions,
        options: &OpenOptions,
    ) -> Result<PullResult<CimInstance>> {
        self.validate_open(namespace, options)?;
        let items = self.enumerate_instances(namespace, classname, instance_options)?;
        Ok(self.open(PullType::InstancesWithPath, namespace, items, options))
    }

    pub fn open_enumerate_instance_paths(
        &mut self,
        namespace: &str,
        classname: &str,
        options: &OpenOptions,
    ) -> Result<PullResult<CimInstanceName>> {
        self.validate_open(namespace, options)?;
        let items = self.enumerate_instance_names(namespace, classname)?;
        Ok(self.open(PullType::InstancePaths, namespace, items, options))
    }

    pub fn open_references_instances(
        &mut self,
        namespace: &str,
        instance_name: &CimInstanceName,
        reference_options: &ReferenceOptions,
        options: &OpenOptions,
    ) -> Result<PullResult<CimInstance>> {
        self.validate_open(namespace, options)?;
        let object_name = CimObjectName::Instance(instance_name.clone());
        let items = instances_of(self.references(namespace, &object_name, reference_options)?);
        Ok(self.open(PullType::InstancesWithPath, namespace, items, options))
    }

    pub fn open_reference_instance_paths(
        &mut self,
        namespace: &str,
        instance_name: &CimInstanceName,
        reference_options: &ReferenceOptions,
        options: &OpenOptions,
    ) -> Result<PullResult<CimInstanceName>> {
        self.validate_open(namespace, options)?;
        let object_name = CimObjectName::Instance(instance_name.clone());
        let items = instance_paths_of(self.reference_names(
            namespace,
            &object_name,
            reference_options,
        )?);
        Ok(self.open(PullType::InstancePaths, namespace, items, options))
    }

    pub fn open_associator_instances(
        &mut self,
        namespace: &str,
        instance_name: &CimInstanceName,
        associator_options: &AssociatorOptions,
        options: &OpenOptions,
    ) -> Result<PullResult<CimInstance>> {
        self.validate_open(namespace, options)?;
        let object_name = CimObjectName::Instance(instance_name.clone());
        let items = instances_of(self.associators(namespace, &object_name, associator_options)?);
        Ok(self.open(PullType::InstancesWithPath, namespace, items, options))
    }

    pub fn open_associator_instance_paths(
        &mut self,
        namespace: &str,
        instance_name: &CimInstanceName,
        associator_options: &AssociatorOptions,
        options: &OpenOptions,
    ) -> Result<PullResult<CimInstanceName>> {
        self.validate_open(namespace, options)?;
        let object_name = CimObjectName::Instance(instance_name.clone());
        let items = instance_paths_of(self.associator_names(
            namespace,
            &object_name,
            associator_options,
        )?);
        Ok(self.open(PullType::InstancePaths, namespace, items, options))
    }

    /// OpenQueryInstances. Fails like ExecQuery once the open parameters
    /// have been validated.
    pub fn open_query_instances(
        &mut self,
        namespace: &str,
        query_language: &str,
        query: &str,
        options: &OpenOptions,
    ) -> Result<PullResult<CimInstance>> {
        self.validate_open(namespace, options)?;
        let items = self.exec_query(namespace, query_language, query)?;
        Ok(self.open(PullType::Instances, namespace, items, options))
    }

    pub fn pull_instances_with_path(
        &mut self,
        namespace: &str,
        context: &str,
        max_object_count: Option<u32>,
    ) -> Result<PullResult<CimInstance>> {
        self.require_pull_enabled()?;
        let max = self.max_object_count(max_object_count);
        self.contexts
            .pull(PullType::InstancesWithPath, namespace, context, max)
    }

    pub fn pull_instance_paths(
        &mut self,
        namespace: &str,
        context: &str,
        max_object_count: Option<u32>,
    ) -> Result<PullResult<CimInstanceName>> {
        self.require_pull_enabled()?;
        let max = self.max_object_count(max_object_count);
        self.contexts
            .pull(PullType::InstancePaths, namespace, context, max)
    }

    pub fn pull_instances(
        &mut self,
        namespace: &str,
        context: &str,
        max_object_count: Option<u32>,
    ) -> Result<PullResult<CimInstance>> {
        self.require_pull_enabled()?;
        let max = self.max_object_count(max_object_count);
        self.contexts.pull(PullType::Instances, namespace, context, max)
    }

    /// CloseEnumeration. InvalidEnumerationContext if the context is not
    /// open.
    pub fn close_enumeration(&mut self, namespace: &str, context: &str) -> Result<()> {
        self.require_pull_enabled()?;
        self.base.validate_namespace(namespace)?;
        self.contexts.close(context)
    }
}

fn instances_of(objects: Vec<CimObject>) -> Vec<CimInstance> {
    objects
        .into_iter()
        .filter_map(|object| match object {
            CimObject::Instance(inst) => Some(inst),
            CimObject::Class(..) => None,
        })
        .collect()
}

fn instance_paths_of(names: Vec<CimObjectName>) -> Vec<CimInstanceName> {
    names
        .into_iter()
        .filter_map(|name| match name {
            CimObjectName::Instance(path) => Some(path),
            CimObjectName::Class(_) => None,
        })
        .collect()
}
