//! critfix-core: repair logic for `critical_data` phone backups.
//!
//! A `critical_data` backup is colon-delimited `key : value` text whose
//! `criticalData` field carries a hex payload with two fixed-width IMEI
//! fields (tags `020f` and `030f`) and a little-endian CRC-32 trailer.
//! This crate rewrites the IMEI fields, recomputes the trailer, and stamps
//! in a signature key bundle taken from a built-in profile or harvested
//! from a donor backup.
//!
//! Components:
//! - [`crc32`]: the checksum the trailer uses
//! - codec: hex/IMEI/trailer conversions and the [`Imei`] newtype
//! - [`TextRecord`]: line-indexed model of the backup text
//! - profiles: built-in table, donor parsing, platform policy
//! - [`patch_document`]: the patch itself
//! - [`Session`]: single-flight re-run discipline for reactive frontends

mod checksum;
mod codec;
mod error;
mod patcher;
mod profile;
mod record;
mod session;

pub use checksum::crc32;
pub use codec::{bytes_to_hex, hex_to_bytes, imei_hex, u32_to_le_hex, Imei, ImeiError};
pub use error::Error;
pub use patcher::{patch_critical_data, patch_document};
pub use profile::{
    builtin_profile, list_profiles, parse_donor_keys, resolve_key_bundle, BuiltInProfile,
    KeyBundle, Platform, ProfileInfo, ProfileKeys, ProfilePlatform, ProfileSource,
    BUILTIN_PROFILES,
};
pub use record::{
    FieldRef, TextRecord, KEY_CRITICAL_DATA, KEY_CRITICAL_DATA_ALIAS, KEY_CRITICAL_DATA_SIGN,
    KEY_DEV_PUB_KEY_MODULUS, KEY_DEV_PUB_KEY_SIGN,
};
pub use session::{Fingerprint, Session, SessionState};

pub type Result<T> = std::result::Result<T, Error>;
