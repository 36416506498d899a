//! Cloud platform model
//!
//! Platforms only differ in the pre-flight notice shown before monitoring
//! starts. The monitoring core never branches on the platform.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where the daemon is running
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlatformKind {
    /// Google Compute Engine
    Gce,
    /// Microsoft Azure
    Azure,
    /// Anything else (bare metal, other clouds, local VMs)
    Generic,
}

const AZURE_DEALLOCATE_WARNING: &str = "\
Azure VM detected, action required!
=====================================

This VM will be powered off by auto-shutdown but NOT deallocated,
so it may keep incurring costs until it is deallocated.

To fully deallocate the VM on shutdown:
  1. Assign a managed identity (MSI) to the VM
  2. Grant that identity these permissions on the VM:
     - Microsoft.Compute/virtualMachines/deallocate/action
     - Microsoft.Compute/virtualMachines/start/action
     - Microsoft.Compute/virtualMachines/stop/action
     - Microsoft.Compute/virtualMachines/restart/action
     - Microsoft.Compute/virtualMachines/powerOff/action
     - Microsoft.Compute/virtualMachines/delete/action
     or the 'Virtual Machine Contributor' role
  3. Install a systemd unit that deallocates the VM through that identity on shutdown";

impl PlatformKind {
    pub fn display_name(&self) -> &'static str {
        match self {
            PlatformKind::Gce => "GCE",
            PlatformKind::Azure => "Azure",
            PlatformKind::Generic => "Generic",
        }
    }

    /// Notice the operator should see before monitoring begins
    pub fn preflight_warning(&self) -> Option<&'static str> {
        match self {
            PlatformKind::Azure => Some(AZURE_DEALLOCATE_WARNING),
            PlatformKind::Gce | PlatformKind::Generic => None,
        }
    }
}

impl fmt::Display for PlatformKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}
