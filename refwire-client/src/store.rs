use refwire_core::{PropertyBag, Resource, Value};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::client::Client;
use crate::error::{ClientError, Result};

/// Typed access to one resource type through a [`Client`].
pub struct ResourceStore<R> {
    client: Client,
    _resource: PhantomData<fn() -> R>,
}

impl<R: Resource> ResourceStore<R> {
    /// Registers `R` with the client and returns a store for it.
    pub fn new(client: &Client) -> Result<Self> {
        client.register::<R>()?;
        Ok(Self {
            client: client.clone(),
            _resource: PhantomData,
        })
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// `<base_path><PREFIX>`
    pub fn collection_uri(&self) -> String {
        format!("{}{}", self.client.config().base_path, R::PREFIX)
    }

    pub fn uri_for(&self, id: impl fmt::Display) -> String {
        format!("{}/{}", self.collection_uri(), id)
    }

    pub async fn get(&self, id: impl fmt::Display) -> Result<Arc<R>> {
        self.get_uri(&self.uri_for(id)).await
    }

    pub async fn get_uri(&self, uri: &str) -> Result<Arc<R>> {
        self.client.get_entity::<R>(uri).await
    }

    /// POSTs `data` to the collection and returns the created entity.
    pub async fn create(&self, data: &PropertyBag) -> Result<Arc<R>> {
        let uri = self.collection_uri();
        let value = self.client.save(&uri, data).await?;
        self.expect_entity(&uri, value)
    }

    pub async fn update(&self, entity: &R, data: &PropertyBag) -> Result<Arc<R>> {
        let value = self.client.update(entity, data).await?;
        self.expect_entity(entity.uri().as_str(), value)
    }

    pub async fn destroy(&self, entity: &R) -> Result<()> {
        self.client.destroy(entity).await?;
        Ok(())
    }

    fn expect_entity(&self, uri: &str, value: Value) -> Result<Arc<R>> {
        value.entity::<R>().ok_or_else(|| ClientError::UnexpectedValue {
            uri: uri.to_string(),
            expected: std::any::type_name::<R>().to_string(),
            found: value.type_name(),
        })
    }
}

impl<R> Clone for ResourceStore<R> {
    fn clone(&self) -> Self {
        Self {
            client: self.client.clone(),
            _resource: PhantomData,
        }
    }
}

impl<R> fmt::Debug for ResourceStore<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ResourceStore")
            .field("resource", &std::any::type_name::<R>())
            .finish()
    }
}
