//! Instance operations, InvokeMethod and ExecQuery.
//!
//! Retrieval honours PropertyList. LocalOnly is always treated as false
//! (see [`INSTANCE_RETRIEVAL_LOCAL_ONLY`]), and the config can force
//! IncludeQualifiers and IncludeClassOrigin to false.

use cim_model::{
    normalize_namespace, CimInstance, CimInstanceName, CimObjectName, CimParamValue,
};
use tracing::{debug, warn};

use super::MainProvider;
use crate::base::filter_instance;
use crate::config::INSTANCE_RETRIEVAL_LOCAL_ONLY;
use crate::error::{CimError, Result};
use crate::types::{GetClassOptions, InstanceOptions, InvokeMethodResult};

/// Effective (include_qualifiers, include_classorigin) of an instance
/// retrieval request.
pub(super) struct RetrievalFlags {
    pub include_qualifiers: bool,
    pub include_classorigin: bool,
}

impl MainProvider {
    pub(super) fn retrieval_flags(
        &self,
        include_qualifiers: Option<bool>,
        include_classorigin: Option<bool>,
        local_only: Option<bool>,
    ) -> RetrievalFlags {
        let config = self.base.config();
        if local_only.is_some_and(|l| l != INSTANCE_RETRIEVAL_LOCAL_ONLY) {
            debug!("LocalOnly on instance retrieval is ignored");
        }
        RetrievalFlags {
            include_qualifiers: !config.ignore_instance_include_qualifiers
                && include_qualifiers.unwrap_or(false),
            include_classorigin: !config.ignore_instance_include_classorigin
                && include_classorigin.unwrap_or(false),
        }
    }

    /// Copy of a stored instance prepared for return: filtered, and with
    /// its path carrying the namespace.
    pub(super) fn returned_instance(
        &self,
        namespace: &str,
        instance: &CimInstance,
        flags: &RetrievalFlags,
        property_list: Option<&[String]>,
    ) -> CimInstance {
        let mut instance = instance.clone();
        filter_instance(
            &mut instance,
            flags.include_qualifiers,
            flags.include_classorigin,
            property_list,
        );
        if let Some(path) = instance.path.as_mut() {
            path.namespace = Some(normalize_namespace(namespace).to_string());
        }
        instance
    }

    /// GetInstance. InvalidClass if the creation class does not exist,
    /// NotFound if the instance does not.
    pub fn get_instance(
        &self,
        namespace: &str,
        instance_name: &CimInstanceName,
        options: &InstanceOptions,
    ) -> Result<CimInstance> {
        self.require_class(namespace, &instance_name.classname)?;
        let stored = self.base.stored_instance(namespace, instance_name)?;
        let flags = self.retrieval_flags(
            options.include_qualifiers,
            options.include_classorigin,
            options.local_only,
        );
        Ok(self.returned_instance(namespace, stored, &flags, options.property_list.as_deref()))
    }

    /// EnumerateInstances: instances of `classname` and its subclasses.
    ///
    /// DeepInheritance defaults to true. Without it, only the properties
    /// exposed by `classname` itself are returned.
    pub fn enumerate_instances(
        &self,
        namespace: &str,
        classname: &str,
        options: &InstanceOptions,
    ) -> Result<Vec<CimInstance>> {
        self.require_class(namespace, classname)?;
        let flags = self.retrieval_flags(
            options.include_qualifiers,
            options.include_classorigin,
            options.local_only,
        );

        let property_list: Option<Vec<String>> = if options.deep_inheritance.unwrap_or(true) {
            options.property_list.clone()
        } else {
            let class = self
                .base
                .get_class(namespace, classname, &GetClassOptions::full())?;
            let exposed = class.properties.keys().map(str::to_string);
            Some(match &options.property_list {
                Some(requested) => exposed
                    .filter(|name| requested.iter().any(|r| r.eq_ignore_ascii_case(name)))
                    .collect(),
                None => exposed.collect(),
            })
        };

        let closure = self.base.class_closure(namespace, classname)?;
        let instances: Vec<CimInstance> = self
            .base
            .instance_store(namespace)?
            .iter_values()
            .filter(|inst| closure.contains(&inst.classname.to_lowercase()))
            .map(|inst| self.returned_instance(namespace, inst, &flags, property_list.as_deref()))
            .collect();
        debug!(
            namespace = %namespace,
            classname = %classname,
            count = instances.len(),
            "Enumerated instances"
        );
        Ok(instances)
    }

    /// EnumerateInstanceNames: paths of the instances of `classname` and
    /// its subclasses.
    pub fn enumerate_instance_names(
        &self,
        namespace: &str,
        classname: &str,
    ) -> Result<Vec<CimInstanceName>> {
        self.require_class(namespace, classname)?;
        let closure = self.base.class_closure(namespace, classname)?;
        Ok(self
            .base
            .instance_paths_of(namespace, &closure)?
            .into_iter()
            .map(|path| path.with_namespace(normalize_namespace(namespace)))
            .collect())
    }

    pub fn create_instance(
        &mut self,
        namespace: &str,
        new_instance: CimInstance,
    ) -> Result<CimInstanceName> {
        self.dispatcher
            .create_instance(&mut self.base, namespace, new_instance)
    }

    pub fn modify_instance(
        &mut self,
        namespace: &str,
        modified_instance: CimInstance,
        include_qualifiers: Option<bool>,
        property_list: Option<&[String]>,
    ) -> Result<()> {
        self.dispatcher.modify_instance(
            &mut self.base,
            namespace,
            modified_instance,
            include_qualifiers,
            property_list,
        )
    }

    pub fn delete_instance(
        &mut self,
        namespace: &str,
        instance_name: &CimInstanceName,
    ) -> Result<()> {
        self.dispatcher
            .delete_instance(&mut self.base, namespace, instance_name)
    }

    pub fn invoke_method(
        &mut self,
        namespace: &str,
        method_name: &str,
        object_name: &CimObjectName,
        params: Vec<CimParamValue>,
    ) -> Result<InvokeMethodResult> {
        self.dispatcher
            .invoke_method(&mut self.base, namespace, method_name, object_name, params)
    }

    /// ExecQuery. No query language is implemented.
    pub fn exec_query(
        &self,
        namespace: &str,
        query_language: &str,
        query: &str,
    ) -> Result<Vec<CimInstance>> {
        self.base.validate_namespace(namespace)?;
        warn!(namespace = %namespace, query_language = %query_language, query = %query, "ExecQuery rejected");
        Err(CimError::query_language_not_supported(format!(
            "ExecQuery is not implemented (query language {query_language})"
        )))
    }
}
