//! hidpp10: host-side codec and device handle for the HID++ 1.0 protocol.
//!
//! HID++ 1.0 devices (mice and their receivers) expose configuration
//! through numbered registers carried in short and long HID reports:
//! DPI tables, button/macro profiles stored in on-device flash, LED
//! state, battery, pairing. This crate translates between structured
//! Rust types and those fixed binary payloads, and drives the
//! multi-step flash operations (paged reads, erase/stage/commit
//! writes) needed to read and write profiles.
//!
//! The raw HID channel is not part of this crate; callers supply a
//! [`Transport`] that moves one request report to the device and
//! returns its response.

pub mod device;
pub mod dpi;
pub mod error;
pub mod macros;
pub mod memory;
pub mod profile;
pub mod registers;
pub mod report;
pub mod transport;

pub use device::Hidpp10Device;
pub use dpi::{DpiMapping, DpiTable};
pub use error::{Error, Result};
pub use macros::{JumpTarget, MacroData, MacroRun};
pub use profile::{Button, DirectoryEntry, DpiMode, Profile, ProfileType, SpecialAction};
pub use registers::{
    BatteryLevel, BatteryMileage, BatteryStatus, ChargeState, FirmwareInformation,
    IndividualFeatures, LedStatus, NotificationFlags, PairingInformation,
};
pub use report::Report;
pub use transport::Transport;

/// Number of profile slots the profile directory is read for.
pub const NUM_PROFILES: usize = 5;

/// Highest addressable flash page.
pub const MAX_PAGE_NUMBER: u8 = 31;

/// Bytes per flash page: 16 rows of 2 banks of 16 bytes.
pub const PAGE_SIZE: usize = 512;
