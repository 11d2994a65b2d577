// this_file: src/capability.rs
//! Capability probing: which optional services does the platform expose?

use crate::platform::{Platform, ServiceHandle, ServiceId};
use log::{debug, info};
use serde::Serialize;
use std::fmt;

/// Presence of one service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CapabilityStatus {
    Present,
    Absent,
    /// The run ended before this service was looked up
    NotProbed,
}

impl CapabilityStatus {
    pub fn is_present(self) -> bool {
        matches!(self, CapabilityStatus::Present)
    }

    /// Summary wording.
    pub fn as_found(self) -> &'static str {
        match self {
            CapabilityStatus::Present => "FOUND",
            CapabilityStatus::Absent => "NOT FOUND",
            CapabilityStatus::NotProbed => "NOT PROBED",
        }
    }
}

impl From<bool> for CapabilityStatus {
    fn from(present: bool) -> Self {
        if present {
            CapabilityStatus::Present
        } else {
            CapabilityStatus::Absent
        }
    }
}

/// Result of one probe: the handle when present, the host's reason when not.
pub enum Capability<'a> {
    Present(ServiceHandle<'a>),
    Absent { status: &'static str, detail: String },
}

impl<'a> Capability<'a> {
    pub fn status(&self) -> CapabilityStatus {
        match self {
            Capability::Present(_) => CapabilityStatus::Present,
            Capability::Absent { .. } => CapabilityStatus::Absent,
        }
    }

    /// Host status name for the console report.
    pub fn status_name(&self) -> &'static str {
        match self {
            Capability::Present(_) => "Success",
            Capability::Absent { status, .. } => *status,
        }
    }

    pub fn handle(&self) -> Option<ServiceHandle<'a>> {
        match self {
            Capability::Present(handle) => Some(*handle),
            Capability::Absent { .. } => None,
        }
    }
}

impl fmt::Debug for Capability<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Capability::Present(handle) => write!(f, "Present({:?})", handle.id()),
            Capability::Absent { status, .. } => write!(f, "Absent({})", status),
        }
    }
}

/// Query one service. Never fails: absence is a value.
pub fn probe<P: Platform + ?Sized>(platform: &P, id: ServiceId) -> Capability<'_> {
    match platform.locate_service(id) {
        Ok(handle) if handle.id() == id => {
            info!("{} located", id);
            Capability::Present(handle)
        }
        Ok(handle) => {
            debug!("{} lookup returned {:?}, treating as absent", id, handle.id());
            Capability::Absent {
                status: "Not Found",
                detail: format!("platform returned a {:?} handle", handle.id()),
            }
        }
        Err(e) => {
            info!("{} not available: {}", id, e);
            Capability::Absent {
                status: e.status(),
                detail: e.to_string(),
            }
        }
    }
}

/// Presence of all three services, in probe order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub font: CapabilityStatus,
    pub database: CapabilityStatus,
    pub graphics: CapabilityStatus,
}

impl Capabilities {
    pub fn new(font: bool, database: bool, graphics: bool) -> Self {
        Self {
            font: font.into(),
            database: database.into(),
            graphics: graphics.into(),
        }
    }

    /// Font service missing: nothing else was probed.
    pub fn font_absent() -> Self {
        Self {
            font: CapabilityStatus::Absent,
            database: CapabilityStatus::NotProbed,
            graphics: CapabilityStatus::NotProbed,
        }
    }
}
