use std::any::{Any, TypeId};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::ConfigError;
use crate::schema::ReferenceType;

type Element = Arc<dyn Any + Send + Sync>;
type Lookup = dyn Fn(&str) -> Option<Element> + Send + Sync;

struct Provider {
    ty: ReferenceType,
    lookup: Box<Lookup>,
}

/// Lazy pointer to an externally owned object, identified by key.
///
/// Every call to [`element`](Self::element) scans the provider's collection
/// as it is at that moment; nothing is cached in the handle.
#[derive(Clone)]
pub struct ReferenceHandle {
    key: String,
    provider: Arc<Provider>,
}

impl ReferenceHandle {
    pub fn key(&self) -> &str {
        &self.key
    }

    pub fn reference_type(&self) -> ReferenceType {
        self.provider.ty
    }

    pub fn element(&self) -> Result<Element, ConfigError> {
        (self.provider.lookup)(&self.key).ok_or_else(|| ConfigError::UnresolvedReferenceKey {
            type_name: self.provider.ty.name().to_string(),
            key: self.key.clone(),
        })
    }

    pub fn element_as<T: Any + Send + Sync>(&self) -> Result<Arc<T>, ConfigError> {
        self.element()?.downcast::<T>().map_err(|_| {
            ConfigError::UnresolvedReferenceKey {
                type_name: std::any::type_name::<T>().to_string(),
                key: self.key.clone(),
            }
        })
    }
}

impl fmt::Debug for ReferenceHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReferenceHandle")
            .field("key", &self.key)
            .field("type", &self.provider.ty.name())
            .finish()
    }
}

impl PartialEq for ReferenceHandle {
    fn eq(&self, other: &Self) -> bool {
        self.key == other.key && self.provider.ty == other.provider.ty
    }
}

/// Typed view of a [`ReferenceHandle`].
pub struct Reference<T> {
    handle: ReferenceHandle,
    _marker: PhantomData<fn() -> T>,
}

impl<T: Any + Send + Sync> Reference<T> {
    /// Returns `None` when the handle refers to a different type.
    pub fn new(handle: ReferenceHandle) -> Option<Self> {
        (handle.reference_type().id() == TypeId::of::<T>()).then_some(Self {
            handle,
            _marker: PhantomData,
        })
    }

    pub fn key(&self) -> &str {
        self.handle.key()
    }

    pub fn element(&self) -> Result<Arc<T>, ConfigError> {
        self.handle.element_as::<T>()
    }

    pub fn handle(&self) -> &ReferenceHandle {
        &self.handle
    }
}

impl<T> Clone for Reference<T> {
    fn clone(&self) -> Self {
        Self {
            handle: self.handle.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T> fmt::Debug for Reference<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Reference").field(&self.handle).finish()
    }
}

impl<T> PartialEq for Reference<T> {
    fn eq(&self, other: &Self) -> bool {
        self.handle == other.handle
    }
}

/// Providers of live collections that reference fields resolve against,
/// one per referenced type.
#[derive(Default)]
pub struct ReferenceRegistry {
    providers: RwLock<HashMap<TypeId, Arc<Provider>>>,
}

impl ReferenceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Install the provider for `T`.
    ///
    /// `supplier` is called on every resolution and must return the
    /// collection as it currently is.
    pub fn install<T, K, S>(&self, key_extractor: K, supplier: S) -> Result<(), ConfigError>
    where
        T: Any + Send + Sync,
        K: Fn(&T) -> String + Send + Sync + 'static,
        S: Fn() -> Vec<Arc<T>> + Send + Sync + 'static,
    {
        let ty = ReferenceType::of::<T>();
        let lookup = move |key: &str| -> Option<Element> {
            supplier()
                .into_iter()
                .find(|item| key_extractor(item.as_ref()) == key)
                .map(|item| item as Element)
        };

        match self.providers.write().entry(ty.id()) {
            Entry::Occupied(_) => Err(ConfigError::schema(format!(
                "a reference provider for {} is already installed",
                ty.name()
            ))),
            Entry::Vacant(slot) => {
                log::debug!("installed reference provider for {}", ty.name());
                slot.insert(Arc::new(Provider {
                    ty,
                    lookup: Box::new(lookup),
                }));
                Ok(())
            }
        }
    }

    /// Remove the provider for `T`, reporting whether one was installed.
    /// Handles created earlier keep resolving against the removed provider.
    pub fn uninstall<T: Any>(&self) -> bool {
        self.uninstall_type(&ReferenceType::of::<T>())
    }

    pub fn uninstall_type(&self, ty: &ReferenceType) -> bool {
        let removed = self.providers.write().remove(&ty.id()).is_some();
        if removed {
            log::debug!("uninstalled reference provider for {}", ty.name());
        }
        removed
    }

    pub fn is_installed(&self, ty: &ReferenceType) -> bool {
        self.providers.read().contains_key(&ty.id())
    }

    /// Create a lazy handle for `key`. The provider's collection is not
    /// read until the handle is dereferenced.
    pub fn resolve(&self, key: &str, ty: &ReferenceType) -> Result<ReferenceHandle, ConfigError> {
        let provider = self.providers.read().get(&ty.id()).cloned().ok_or_else(|| {
            ConfigError::UnregisteredReferenceProvider {
                type_name: ty.name().to_string(),
            }
        })?;
        Ok(ReferenceHandle {
            key: key.to_string(),
            provider,
        })
    }

    pub fn clear(&self) {
        self.providers.write().clear();
    }
}

impl fmt::Debug for ReferenceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let providers = self.providers.read();
        f.debug_struct("ReferenceRegistry")
            .field(
                "providers",
                &providers.values().map(|p| p.ty.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}
