//! Test support utilities shared across unit and integration tests.

use std::collections::{BTreeSet, HashMap};
use std::env;
use std::ffi::OsString;
use std::net::{IpAddr, Ipv4Addr};
use std::sync::{Arc, Mutex as StdMutex, PoisonError};

use serde_json::json;
use thiserror::Error;
use tokio::sync::{Mutex, MutexGuard};

use crate::backend::{Backend, BackendFuture, Lookup};
use crate::resources::{Resource, ResourceKind, ResourceRef, ResourceSpec};

/// Subscription used when synthesising resource IDs.
pub const TEST_SUBSCRIPTION_ID: &str = "00000000-0000-0000-0000-000000000000";

/// Address assigned to public IPs unless overridden.
pub const TEST_PUBLIC_IP: IpAddr = IpAddr::V4(Ipv4Addr::new(203, 0, 113, 10));

/// Operation recorded by [`RecordingBackend`].
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Operation {
    /// Existence check.
    Get,
    /// Create or converge.
    CreateOrUpdate,
}

/// A single call made against [`RecordingBackend`].
#[derive(Clone, Debug, PartialEq)]
pub struct Call {
    /// Operation invoked.
    pub operation: Operation,
    /// Resource addressed.
    pub target: ResourceRef,
    /// Create parameters, for [`Operation::CreateOrUpdate`] only.
    pub spec: Option<ResourceSpec>,
}

/// Scripted failure raised by [`RecordingBackend`].
#[derive(Clone, Debug, Error, Eq, PartialEq)]
#[error("simulated failure for {target}")]
pub struct RecordingBackendError {
    /// Rendered address of the resource whose call failed.
    pub target: String,
}

#[derive(Debug)]
struct State {
    resources: HashMap<ResourceRef, Resource>,
    calls: Vec<Call>,
    public_ip_address: Option<IpAddr>,
    failing_gets: Vec<ResourceKind>,
    failing_creates: Vec<ResourceKind>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            resources: HashMap::new(),
            calls: Vec::new(),
            public_ip_address: Some(TEST_PUBLIC_IP),
            failing_gets: Vec::new(),
            failing_creates: Vec::new(),
        }
    }
}

/// In-memory control plane that records every call.
///
/// Created resources persist across runs of the same backend, so a second
/// deployment observes everything the first one created. Clones share state.
#[derive(Clone, Debug, Default)]
pub struct RecordingBackend {
    state: Arc<StdMutex<State>>,
}

impl RecordingBackend {
    /// Creates an empty backend whose public IPs receive [`TEST_PUBLIC_IP`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the address reported for public IPs created afterwards.
    #[must_use]
    pub fn with_public_ip_address(self, address: IpAddr) -> Self {
        self.with_state(|state| state.public_ip_address = Some(address));
        self
    }

    /// Makes public IPs created afterwards report no address.
    #[must_use]
    pub fn without_public_ip_address(self) -> Self {
        self.with_state(|state| state.public_ip_address = None);
        self
    }

    /// Makes every lookup of `kind` fail.
    #[must_use]
    pub fn fail_get(self, kind: ResourceKind) -> Self {
        self.with_state(|state| state.failing_gets.push(kind));
        self
    }

    /// Makes every creation of `kind` fail.
    #[must_use]
    pub fn fail_create(self, kind: ResourceKind) -> Self {
        self.with_state(|state| state.failing_creates.push(kind));
        self
    }

    /// Seeds an existing resource without recording a call.
    pub fn insert_existing(&self, target: &ResourceRef) -> Resource {
        self.with_state(|state| {
            let resource = synthesise(target, state.public_ip_address);
            state.resources.insert(target.clone(), resource.clone());
            resource
        })
    }

    /// Returns every call recorded so far.
    #[must_use]
    pub fn calls(&self) -> Vec<Call> {
        self.with_state(|state| state.calls.clone())
    }

    /// Returns the create parameters passed so far, in call order.
    #[must_use]
    pub fn created_specs(&self) -> Vec<ResourceSpec> {
        self.calls().into_iter().filter_map(|call| call.spec).collect()
    }

    /// Returns the kinds created so far, in call order.
    #[must_use]
    pub fn created_kinds(&self) -> Vec<ResourceKind> {
        self.calls()
            .into_iter()
            .filter(|call| call.operation == Operation::CreateOrUpdate)
            .map(|call| call.target.kind)
            .collect()
    }

    /// Returns the stored resource at `target`, if any.
    #[must_use]
    pub fn resource(&self, target: &ResourceRef) -> Option<Resource> {
        self.with_state(|state| state.resources.get(target).cloned())
    }

    fn with_state<T>(&self, action: impl FnOnce(&mut State) -> T) -> T {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        action(&mut state)
    }
}

fn synthesise(target: &ResourceRef, public_ip_address: Option<IpAddr>) -> Resource {
    let properties = match (target.kind, public_ip_address) {
        (ResourceKind::PublicIpAddress, Some(address)) => json!({
            "provisioningState": "Succeeded",
            "ipAddress": address.to_string(),
        }),
        _ => json!({ "provisioningState": "Succeeded" }),
    };
    Resource {
        id: target.resource_id(TEST_SUBSCRIPTION_ID),
        name: target.name.clone(),
        properties,
    }
}

impl Backend for RecordingBackend {
    type Error = RecordingBackendError;

    fn get<'a>(&'a self, target: &'a ResourceRef) -> BackendFuture<'a, Lookup, Self::Error> {
        Box::pin(async move {
            self.with_state(|state| {
                state.calls.push(Call {
                    operation: Operation::Get,
                    target: target.clone(),
                    spec: None,
                });
                if state.failing_gets.contains(&target.kind) {
                    return Err(RecordingBackendError {
                        target: target.to_string(),
                    });
                }
                Ok(state
                    .resources
                    .get(target)
                    .cloned()
                    .map_or(Lookup::NotFound, Lookup::Found))
            })
        })
    }

    fn create_or_update<'a>(
        &'a self,
        target: &'a ResourceRef,
        spec: &'a ResourceSpec,
    ) -> BackendFuture<'a, Resource, Self::Error> {
        Box::pin(async move {
            self.with_state(|state| {
                state.calls.push(Call {
                    operation: Operation::CreateOrUpdate,
                    target: target.clone(),
                    spec: Some(spec.clone()),
                });
                if state.failing_creates.contains(&target.kind) {
                    return Err(RecordingBackendError {
                        target: target.to_string(),
                    });
                }
                let resource = synthesise(target, state.public_ip_address);
                state.resources.insert(target.clone(), resource.clone());
                Ok(resource)
            })
        })
    }
}

/// Global mutex used to serialise environment mutation in tests.
pub static ENV_LOCK: Mutex<()> = Mutex::const_new(());

/// Guard that holds the env mutex and restores variables on drop.
pub struct EnvGuard {
    previous: Vec<(String, Option<OsString>)>,
    _guard: MutexGuard<'static, ()>,
}

impl EnvGuard {
    /// Sets and clears environment variables while holding a global mutex.
    ///
    /// Pairs with a `None` value are removed for the guard's lifetime.
    pub async fn set_vars(pairs: &[(&str, Option<&str>)]) -> Self {
        debug_assert!(
            {
                let mut seen = BTreeSet::new();
                pairs.iter().all(|(key, _)| seen.insert(*key))
            },
            "duplicate environment variable keys passed to EnvGuard::set_vars"
        );

        let guard = ENV_LOCK.lock().await;
        let mut previous = Vec::with_capacity(pairs.len());
        for (key, value) in pairs {
            previous.push(((*key).to_owned(), env::var_os(key)));
            // SAFETY: Environment mutation is serialised by `ENV_LOCK`, preventing races.
            unsafe {
                match value {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }

        Self {
            previous,
            _guard: guard,
        }
    }
}

impl Drop for EnvGuard {
    fn drop(&mut self) {
        for (key, old) in &self.previous {
            // SAFETY: Environment mutation is serialised by holding `_guard`.
            unsafe {
                match old {
                    Some(val) => env::set_var(key, val),
                    None => env::remove_var(key),
                }
            }
        }
    }
}
