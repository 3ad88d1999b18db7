//! Process-wide table of type supports, keyed by transport type name.

use std::{collections::BTreeMap, sync::Arc};

use tracing::debug;

use crate::error::{Error, Result};
use crate::service::ServiceTypeSupport;
use crate::topic_data_type::TopicDataType;
use crate::typesupport::TypeSupport;

/// Populated once at startup, then only read. Each type name may be
/// registered once.
#[derive(Debug, Default)]
pub struct TypeRegistry {
    types: BTreeMap<String, Arc<dyn TypeSupport>>,
}

impl TypeRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, type_support: Arc<dyn TypeSupport>) -> Result<()> {
        let name = type_support.type_name().to_owned();
        if self.types.contains_key(&name) {
            return Err(Error::DuplicateTypeName(name));
        }
        debug!(
            type_name = %name,
            type_size = type_support.max_serialized_size(),
            "registered type"
        );
        self.types.insert(name, type_support);
        Ok(())
    }

    pub fn register_data_type(&mut self, data_type: &TopicDataType) -> Result<()> {
        self.register(data_type.type_support().clone())
    }

    /// Registers both halves of a service, or neither.
    pub fn register_service(
        &mut self,
        request: ServiceTypeSupport,
        response: ServiceTypeSupport,
    ) -> Result<()> {
        for name in [request.type_name(), response.type_name()] {
            if self.types.contains_key(name) {
                return Err(Error::DuplicateTypeName(name.to_owned()));
            }
        }
        if request.type_name() == response.type_name() {
            return Err(Error::DuplicateTypeName(request.type_name().to_owned()));
        }
        self.register(Arc::new(request))?;
        self.register(Arc::new(response))
    }

    pub fn get(&self, type_name: &str) -> Option<&Arc<dyn TypeSupport>> {
        self.types.get(type_name)
    }

    pub fn contains(&self, type_name: &str) -> bool {
        self.types.contains_key(type_name)
    }

    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Registered types in name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Arc<dyn TypeSupport>)> {
        self.types.iter().map(|(name, ts)| (name.as_str(), ts))
    }
}
