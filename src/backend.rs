//! Backend abstraction over the cloud control plane.

use std::future::Future;
use std::pin::Pin;

use crate::resources::{Resource, ResourceRef, ResourceSpec};

/// Outcome of an existence check.
#[derive(Clone, Debug, PartialEq)]
pub enum Lookup {
    /// The resource exists in its current remote form.
    Found(Resource),
    /// The control plane reported that the resource does not exist.
    NotFound,
}

impl Lookup {
    /// Returns the resource when found.
    #[must_use]
    pub fn found(self) -> Option<Resource> {
        match self {
            Self::Found(resource) => Some(resource),
            Self::NotFound => None,
        }
    }
}

/// Future returned by backend operations.
pub type BackendFuture<'a, T, E> = Pin<Box<dyn Future<Output = Result<T, E>> + Send + 'a>>;

/// Minimal interface implemented by cloud control planes.
pub trait Backend {
    /// Provider specific error type returned by the backend.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Fetches a resource by address.
    ///
    /// A missing resource is reported as [`Lookup::NotFound`], never as an
    /// error.
    fn get<'a>(&'a self, target: &'a ResourceRef) -> BackendFuture<'a, Lookup, Self::Error>;

    /// Creates or converges a resource and waits for the remote operation to
    /// finish, returning the resulting resource.
    fn create_or_update<'a>(
        &'a self,
        target: &'a ResourceRef,
        spec: &'a ResourceSpec,
    ) -> BackendFuture<'a, Resource, Self::Error>;
}
