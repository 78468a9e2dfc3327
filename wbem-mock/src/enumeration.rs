//! Enumeration contexts of the pull operations.
//!
//! An Open... call that cannot return its whole result set at once stores
//! the remainder here under a generated token. Pull... calls take pages
//! off the front until the remainder is exhausted, at which point the
//! context is dropped. CloseEnumeration drops it early.

use std::collections::{HashMap, VecDeque};

use chrono::{DateTime, Utc};
use cim_model::{normalize_namespace, CimInstance, CimInstanceName};
use tracing::debug;
use uuid::Uuid;

use crate::error::{CimError, Result};
use crate::types::PullResult;

/// The Pull... operation a context must be continued with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullType {
    InstancesWithPath,
    InstancePaths,
    Instances,
}

impl PullType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::InstancesWithPath => "PullInstancesWithPath",
            Self::InstancePaths => "PullInstancePaths",
            Self::Instances => "PullInstances",
        }
    }
}

impl std::fmt::Display for PullType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Items still to be delivered by a context.
#[derive(Debug, Clone)]
pub enum ContextItems {
    Instances(VecDeque<CimInstance>),
    Paths(VecDeque<CimInstanceName>),
}

impl ContextItems {
    pub fn len(&self) -> usize {
        match self {
            Self::Instances(items) => items.len(),
            Self::Paths(items) => items.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Result item type that can be parked in a context.
pub trait ContextItem: Sized {
    fn wrap(items: VecDeque<Self>) -> ContextItems;

    /// Remove up to `count` items from the front; `None` if `items` holds
    /// another item type.
    fn take(items: &mut ContextItems, count: usize) -> Option<Vec<Self>>;
}

impl ContextItem for CimInstance {
    fn wrap(items: VecDeque<Self>) -> ContextItems {
        ContextItems::Instances(items)
    }

    fn take(items: &mut ContextItems, count: usize) -> Option<Vec<Self>> {
        match items {
            ContextItems::Instances(items) => {
                let count = count.min(items.len());
                Some(items.drain(..count).collect())
            }
            ContextItems::Paths(_) => None,
        }
    }
}

impl ContextItem for CimInstanceName {
    fn wrap(items: VecDeque<Self>) -> ContextItems {
        ContextItems::Paths(items)
    }

    fn take(items: &mut ContextItems, count: usize) -> Option<Vec<Self>> {
        match items {
            ContextItems::Paths(items) => {
                let count = count.min(items.len());
                Some(items.drain(..count).collect())
            }
            ContextItems::Instances(_) => None,
        }
    }
}

/// Server-side state of one open enumeration.
///
/// `created`, `operation_timeout` and `continue_on_error` are session
/// metadata for callers inspecting open contexts through
/// [`EnumerationContexts::get`]; paging does not consult them.
#[derive(Debug, Clone)]
pub struct EnumerationContext {
    pub pull_type: PullType,
    pub namespace: String,
    pub items: ContextItems,
    /// When the Open... call created the context
    pub created: DateTime<Utc>,
    /// Requested OperationTimeout in seconds; recorded, not enforced
    pub operation_timeout: Option<u32>,
    /// Requested ContinueOnError; recorded, not acted on
    pub continue_on_error: bool,
}

/// Parameters of an Open... call that are kept with the context.
#[derive(Debug, Clone, Copy, Default)]
pub struct ContextSettings {
    pub operation_timeout: Option<u32>,
    pub continue_on_error: bool,
}

/// Open enumeration contexts of one repository, keyed by token.
#[derive(Debug, Default)]
pub struct EnumerationContexts {
    contexts: HashMap<String, EnumerationContext>,
}

impl EnumerationContexts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.contexts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.contexts.is_empty()
    }

    pub fn get(&self, context: &str) -> Option<&EnumerationContext> {
        self.contexts.get(context)
    }

    /// Deliver the first page of `items`. If more than `max_object_count`
    /// items remain, they are parked in a new context.
    pub fn open<T: ContextItem>(
        &mut self,
        pull_type: PullType,
        namespace: &str,
        items: Vec<T>,
        max_object_count: u32,
        settings: ContextSettings,
    ) -> PullResult<T> {
        let page_size = max_object_count as usize;
        if items.len() <= page_size {
            debug!(
                namespace = %namespace,
                pull_type = %pull_type,
                count = items.len(),
                "Enumeration complete on open"
            );
            return PullResult {
                items,
                end_of_sequence: true,
                context: None,
            };
        }

        let mut remaining: VecDeque<T> = items.into();
        let page: Vec<T> = remaining.drain(..page_size).collect();
        let token = Uuid::new_v4().to_string();
        debug!(
            namespace = %namespace,
            pull_type = %pull_type,
            context = %token,
            returned = page.len(),
            remaining = remaining.len(),
            "Opened enumeration context"
        );
        self.contexts.insert(
            token.clone(),
            EnumerationContext {
                pull_type,
                namespace: normalize_namespace(namespace).to_string(),
                items: T::wrap(remaining),
                created: Utc::now(),
                operation_timeout: settings.operation_timeout,
                continue_on_error: settings.continue_on_error,
            },
        );
        PullResult {
            items: page,
            end_of_sequence: false,
            context: Some(token),
        }
    }

    /// Deliver the next page of an open context.
    ///
    /// The context must exist, belong to `namespace` and have been opened
    /// for `pull_type`; otherwise the call fails with
    /// InvalidEnumerationContext and the context is left untouched.
    pub fn pull<T: ContextItem>(
        &mut self,
        pull_type: PullType,
        namespace: &str,
        context: &str,
        max_object_count: u32,
    ) -> Result<PullResult<T>> {
        let Some(entry) = self.contexts.get_mut(context) else {
            return Err(CimError::invalid_enumeration_context(format!(
                "Enumeration context {context} not found"
            )));
        };
        if entry.pull_type != pull_type {
            return Err(CimError::invalid_enumeration_context(format!(
                "Enumeration context {context} was opened for {}, not {pull_type}",
                entry.pull_type
            )));
        }
        if !entry
            .namespace
            .eq_ignore_ascii_case(normalize_namespace(namespace))
        {
            return Err(CimError::invalid_enumeration_context(format!(
                "Enumeration context {context} belongs to namespace {}, not {}",
                entry.namespace,
                normalize_namespace(namespace)
            )));
        }
        let Some(items) = T::take(&mut entry.items, max_object_count as usize) else {
            return Err(CimError::invalid_enumeration_context(format!(
                "Enumeration context {context} holds items of another kind"
            )));
        };

        if entry.items.is_empty() {
            self.contexts.remove(context);
            debug!(context = %context, returned = items.len(), "Enumeration context exhausted");
            Ok(PullResult {
                items,
                end_of_sequence: true,
                context: None,
            })
        } else {
            debug!(
                context = %context,
                returned = items.len(),
                remaining = entry.items.len(),
                "Pulled from enumeration context"
            );
            Ok(PullResult {
                items,
                end_of_sequence: false,
                context: Some(context.to_string()),
            })
        }
    }

    /// Drop a context; InvalidEnumerationContext if it does not exist.
    pub fn close(&mut self, context: &str) -> Result<()> {
        match self.contexts.remove(context) {
            Some(entry) => {
                debug!(
                    context = %context,
                    undelivered = entry.items.len(),
                    "Closed enumeration context"
                );
                Ok(())
            }
            None => Err(CimError::invalid_enumeration_context(format!(
                "Enumeration context {context} not found"
            ))),
        }
    }
}
