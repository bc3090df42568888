// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::Result;
use std::sync::mpsc::Sender;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread;

use crate::record::Record;
use crate::resource::Resource;
use crate::table::RecordTable;

pub const FETCH_ERROR_MESSAGE: &str = "Fetching of data failed";

/// Process-wide fetch health, shared by handle between every view.
///
/// Once a message is set it is never cleared; a restart is the only recovery.
#[derive(Debug, Clone, Default)]
pub struct ErrorState {
    message: Arc<RwLock<Option<String>>>,
}

impl ErrorState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_ok(&self) -> bool {
        self.read().is_none()
    }

    pub fn has_error(&self) -> bool {
        !self.is_ok()
    }

    pub fn message(&self) -> Option<String> {
        self.read().clone()
    }

    pub fn set_error(&self, message: impl Into<String>) {
        *self.write() = Some(message.into());
    }

    pub fn set_fetch_error(&self) {
        self.set_error(FETCH_ERROR_MESSAGE);
    }

    fn read(&self) -> RwLockReadGuard<'_, Option<String>> {
        match self.message.read() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn write(&self) -> RwLockWriteGuard<'_, Option<String>> {
        match self.message.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

pub trait Fetcher: Send + Sync {
    fn fetch(&self, resource: &Resource) -> Result<Vec<Record>>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum FetchPhase {
    Idle,
    Loading,
    Ready(RecordTable),
    Failed,
}

/// Outcome of a background fetch, tagged with the mount that requested it.
#[derive(Debug)]
pub struct FetchResolution {
    pub mount_id: u64,
    pub outcome: Result<Vec<Record>>,
}

/// Load-once state machine for one mounted view.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchLifecycle {
    resource: Resource,
    mount_id: u64,
    phase: FetchPhase,
}

impl FetchLifecycle {
    pub fn new(resource: Resource, mount_id: u64) -> Self {
        Self {
            resource,
            mount_id,
            phase: FetchPhase::Idle,
        }
    }

    pub fn resource(&self) -> &Resource {
        &self.resource
    }

    pub const fn mount_id(&self) -> u64 {
        self.mount_id
    }

    pub fn phase(&self) -> &FetchPhase {
        &self.phase
    }

    pub fn table(&self) -> Option<&RecordTable> {
        match &self.phase {
            FetchPhase::Ready(table) => Some(table),
            _ => None,
        }
    }

    pub fn table_mut(&mut self) -> Option<&mut RecordTable> {
        match &mut self.phase {
            FetchPhase::Ready(table) => Some(table),
            _ => None,
        }
    }

    /// Everything short of `Ready` keeps the loading display.
    pub fn is_loading(&self) -> bool {
        !matches!(self.phase, FetchPhase::Ready(_))
    }

    /// Moves `Idle` to `Loading` unless a fetch already failed somewhere.
    /// Returns whether the caller should issue the request.
    pub fn begin(&mut self, errors: &ErrorState) -> bool {
        if self.phase != FetchPhase::Idle {
            return false;
        }
        if errors.has_error() {
            tracing::debug!(
                resource = %self.resource.path(),
                "fetch suppressed by earlier failure"
            );
            return false;
        }
        tracing::debug!(
            resource = %self.resource.path(),
            mount_id = self.mount_id,
            "fetch started"
        );
        self.phase = FetchPhase::Loading;
        true
    }

    pub fn resolve(&mut self, outcome: Result<Vec<Record>>, errors: &ErrorState) {
        if self.phase != FetchPhase::Loading {
            return;
        }
        match outcome {
            Ok(records) => {
                let table = RecordTable::build(&self.resource.template(), records);
                tracing::info!(
                    resource = %self.resource.path(),
                    rows = table.records().len(),
                    columns = table.schema().len(),
                    "fetch ready"
                );
                self.phase = FetchPhase::Ready(table);
            }
            Err(error) => {
                tracing::warn!(
                    resource = %self.resource.path(),
                    error = %format!("{error:#}"),
                    "fetch failed"
                );
                errors.set_fetch_error();
                self.phase = FetchPhase::Failed;
            }
        }
    }

    /// Applies a background resolution if it belongs to this mount. Late
    /// resolutions for an unmounted view are dropped without side effects.
    pub fn accept(&mut self, resolution: FetchResolution, errors: &ErrorState) -> bool {
        if resolution.mount_id != self.mount_id {
            tracing::debug!(
                stale = resolution.mount_id,
                current = self.mount_id,
                "dropping resolution for unmounted view"
            );
            return false;
        }
        self.resolve(resolution.outcome, errors);
        true
    }

    pub fn load(&mut self, fetcher: &dyn Fetcher, errors: &ErrorState) -> &FetchPhase {
        if self.begin(errors) {
            let outcome = fetcher.fetch(&self.resource);
            self.resolve(outcome, errors);
        }
        &self.phase
    }

    /// Runs the request on a worker thread. The error check happens here, on
    /// the caller's thread, before the request starts; a failure recorded by
    /// another view in the meantime does not stop this one.
    pub fn spawn(
        &mut self,
        fetcher: Arc<dyn Fetcher>,
        errors: &ErrorState,
        tx: Sender<FetchResolution>,
    ) -> bool {
        self.spawn_with(fetcher, errors, move |resolution| {
            if tx.send(resolution).is_err() {
                tracing::debug!("fetch resolved after shutdown");
            }
        })
    }

    /// Like [`spawn`](Self::spawn), handing the resolution to `deliver` on
    /// the worker thread.
    pub fn spawn_with<F>(
        &mut self,
        fetcher: Arc<dyn Fetcher>,
        errors: &ErrorState,
        deliver: F,
    ) -> bool
    where
        F: FnOnce(FetchResolution) + Send + 'static,
    {
        if !self.begin(errors) {
            return false;
        }
        let resource = self.resource.clone();
        let mount_id = self.mount_id;
        thread::spawn(move || {
            let outcome = fetcher.fetch(&resource);
            deliver(FetchResolution { mount_id, outcome });
        });
        true
    }
}
