//! Signature key profiles: the built-in table and donor-derived bundles.
//!
//! A repair needs four pieces of key material (modulus, exponent, device
//! signature, critical-data signature). Qualcomm devices use one of the
//! fixed built-in profiles below; MediaTek devices need the material
//! harvested from a donor backup taken off a working device of the same
//! model. Nothing here is ever validated cryptographically; signatures
//! are copied verbatim into the repaired backup.

use serde::Serialize;

use crate::error::Error;
use crate::record::{
    KEY_CRITICAL_DATA_SIGN, KEY_DEV_PUB_KEY_MODULUS, KEY_DEV_PUB_KEY_SIGN,
};
use crate::Result;

/// Exponent assumed for donor-derived bundles. Donor backups do not carry
/// an exponent field, so 65537 is taken on faith.
const DONOR_EXPONENT: &str = "10001";

/// Baseband platform of the device being repaired.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Qualcomm,
    Mediatek,
}

impl Platform {
    /// Parse a platform name as given on a command line.
    pub fn parse(name: &str) -> std::result::Result<Self, String> {
        match name.to_ascii_lowercase().as_str() {
            "qualcomm" => Ok(Platform::Qualcomm),
            "mediatek" | "mtk" => Ok(Platform::Mediatek),
            other => Err(format!(
                "unknown platform '{other}' (expected 'qualcomm' or 'mediatek')"
            )),
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Platform::Qualcomm => f.write_str("qualcomm"),
            Platform::Mediatek => f.write_str("mediatek"),
        }
    }
}

/// Platform tag on a built-in profile. `Universal` entries are offered
/// under either platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProfilePlatform {
    Qualcomm,
    Mediatek,
    Universal,
}

impl ProfilePlatform {
    pub fn applies_to(self, platform: Platform) -> bool {
        match self {
            ProfilePlatform::Universal => true,
            ProfilePlatform::Qualcomm => platform == Platform::Qualcomm,
            ProfilePlatform::Mediatek => platform == Platform::Mediatek,
        }
    }
}

impl std::fmt::Display for ProfilePlatform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProfilePlatform::Qualcomm => f.write_str("qualcomm"),
            ProfilePlatform::Mediatek => f.write_str("mediatek"),
            ProfilePlatform::Universal => f.write_str("universal"),
        }
    }
}

/// Normalized signature key material applied during a repair.
///
/// Immutable once resolved. The exponent rides along for completeness but
/// is not written into the repaired document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct KeyBundle {
    pub modulus: String,
    pub exponent: String,
    pub device_sign: String,
    pub data_sign: String,
}

/// Fixed key material stored on a built-in profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProfileKeys {
    pub modulus: &'static str,
    pub exponent: &'static str,
    pub device_sign: &'static str,
    pub data_sign: &'static str,
}

/// A named entry in the built-in profile table.
#[derive(Debug, Clone, Copy)]
pub struct BuiltInProfile {
    pub key: &'static str,
    pub name: &'static str,
    pub platform: ProfilePlatform,
    /// `None` for placeholder entries that only make sense with
    /// user-supplied material.
    pub keys: Option<ProfileKeys>,
}

/// The built-in signature profile table, in presentation order.
pub const BUILTIN_PROFILES: &[BuiltInProfile] = &[
    BuiltInProfile {
        key: "qualcomm_profile_1",
        name: "Qualcomm Profile #1 (Common)",
        platform: ProfilePlatform::Qualcomm,
        keys: Some(ProfileKeys {
            modulus: "8b9e34c788daea2a95f2bc383274a997bc432f520f1320059d6ff024292d50dec675d99dbcfba50bf422df0729c056903aaff5c6fb4605ed363402c5c15c6ec2cc6f5b5cd5ec1f760def3a114149217a85f2e7a82c8bf51b58686e032665a3916d556ae97b567f1bc15baecb657ffea66e7650bc00bbca4ec9ea76d46ea6367f",
            exponent: "10001",
            device_sign: "054746C24F153459D1635867ED66A519D0107B0579EB76E459556ECE5B495B931B8CFE733F182291BE665516FD5CE9F49AE4EA550CBDA83BD45B67FD87CA03B29E6EAA116ED6F221DB2E40BACE7DA2E41374BA19A083B226E027D7F7798915E359DE68CC7403C8F41B237113E7E9EBACC331772DA57ADCB6FAF3AC061C85F50BCA43197AE76E8103EE7C0ED40C4F1A3CA80C42095C6FABD91A3C8CEBBFC16D46AF9ImeI1f8E58585BA7F440CDCDF0F3FB5FDD4A837E68E99ED69B4AE17F679C5543AF811AC29B0119B9CA4BAE45F8778F9F48738E7E32AD0AC92BDF5BCA810D841A1527B38FB79CC30C2FBEA9B9D3794D3A5D18AEBCED666CFD359CE6269F486738",
            data_sign: "7ee3be5a72bcc39749ff682bb22d92cb3ac166bfb1271f48ab9e16f7642c2c1d7a5c2142a14bce0d1a6e700a7075b838563059d3a0f6de73fc62a41f2bcec76e907b3d26010ce27dd3a8e6a9754ac0bda1be6f249055a5ae4d112a0fd2081f95b8191feb084e098f8db9011d5f1d6cc10b0d1d419c3e5929d0432014611cd2de",
        }),
    },
    BuiltInProfile {
        key: "qualcomm_profile_2",
        name: "Qualcomm Profile #2 (Alternate)",
        platform: ProfilePlatform::Qualcomm,
        keys: Some(ProfileKeys {
            modulus: "b87035cc66c7d6da029ea5bc042f349d5e9e5bd08b1bbe583a964e9b2059f6a9137586ffed3a3c3f230b2f6c1dd9d92c86c180b54de2cd5f04c8e6be74dd6aff536412a8b6bfdb1a14a9cd99962f38b4e323cb3c685716eebe965257132b3035f23d021d8c1793f8d6f8b09efaa51114ef60a2252797e1d28035a539aa55c14f",
            exponent: "10001",
            device_sign: "49BEE3D78B81BD5FEC1A9F8E8CFEC0468BD1C06A523184377ED549A4F74B24205CF77C906571DE793570686EEB0FC71F97F273E985FB17B147D1A494E1679723C83E3FB6891EE1B815513DA6523E0135F5F990B2B8EBA43FB87B33E18A15D139349E233659F409C2D4E6F077BAF90F4ED7457CA1C2CFF6AEF16716BF667543F89BCFC3402B6FD3F21E940E51AB5FD2790E8B383A27AB14DB39E5FAD62E654995FA6D1FC8631018AFCE591578C8CD4E15F5F805EE4954EA5950B183D9B432B27AEA72FE003ACEE8E6016FD19B570843E0B2018C840414B212CEC7DF025434CB336B19E8720245A84C7CB17F501722E87FB679A865E64B7F3161B7DD8F52E1127F",
            data_sign: "53c559b769af2296f8e0dfd03d4781a98338a731eefd91c60710719df65f06d960970de9b861cb7bd1a77ba0cbad1a9f385e282ce3a7c64f5559864118935ad58aa48563b1103c4fcf1f0ad9e6b371f65e0eaf2aa95c714a579b96c703d129e4b571ac0448a145f5d57ef00a57a9a759624f26547d9edd2617c2dcfb63267021",
        }),
    },
    BuiltInProfile {
        key: "custom",
        name: "Custom Profile (Advanced)",
        platform: ProfilePlatform::Universal,
        keys: None,
    },
];

/// Look up a built-in profile by key.
pub fn builtin_profile(key: &str) -> Option<&'static BuiltInProfile> {
    BUILTIN_PROFILES.iter().find(|p| p.key == key)
}

/// Listing view of a built-in profile, for frontends.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileInfo {
    pub key: &'static str,
    pub name: &'static str,
    pub platform: ProfilePlatform,
    pub has_keys: bool,
}

/// List the built-in profiles, optionally restricted to those visible
/// under a platform.
pub fn list_profiles(platform: Option<Platform>) -> Vec<ProfileInfo> {
    BUILTIN_PROFILES
        .iter()
        .filter(|p| platform.map_or(true, |pl| p.platform.applies_to(pl)))
        .map(|p| ProfileInfo {
            key: p.key,
            name: p.name,
            platform: p.platform,
            has_keys: p.keys.is_some(),
        })
        .collect()
}

/// Where the key material for a repair comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProfileSource {
    /// A key into [`BUILTIN_PROFILES`].
    BuiltIn(String),
    /// A bundle harvested from a donor backup.
    Custom(KeyBundle),
}

impl ProfileSource {
    /// Stable identity string, used for run fingerprinting.
    pub fn identity(&self) -> String {
        match self {
            ProfileSource::BuiltIn(key) => format!("builtin:{key}"),
            ProfileSource::Custom(bundle) => format!(
                "custom:{}:{}:{}",
                bundle.modulus, bundle.device_sign, bundle.data_sign
            ),
        }
    }
}

/// Harvest a key bundle from donor backup text.
///
/// The first occurrence of each of `devPubKeyModulus`, `devPubKeySign`
/// and `crticalDataSign` is authoritative; a missing (or empty) field
/// fails with [`Error::MissingField`]. The exponent is always `"10001"`;
/// donor backups do not expose one.
pub fn parse_donor_keys(text: &str) -> Result<KeyBundle> {
    let mut modulus: Option<&str> = None;
    let mut device_sign: Option<&str> = None;
    let mut data_sign: Option<&str> = None;

    for line in text.lines() {
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim();
        let value = value.trim();
        match key {
            KEY_DEV_PUB_KEY_MODULUS if modulus.is_none() => modulus = Some(value),
            KEY_DEV_PUB_KEY_SIGN if device_sign.is_none() => device_sign = Some(value),
            KEY_CRITICAL_DATA_SIGN if data_sign.is_none() => data_sign = Some(value),
            _ => {}
        }
    }

    let require = |field: Option<&str>, name: &str| -> Result<String> {
        field
            .filter(|v| !v.is_empty())
            .map(str::to_owned)
            .ok_or_else(|| Error::MissingField(name.to_owned()))
    };

    Ok(KeyBundle {
        modulus: require(modulus, KEY_DEV_PUB_KEY_MODULUS)?,
        exponent: DONOR_EXPONENT.to_owned(),
        device_sign: require(device_sign, KEY_DEV_PUB_KEY_SIGN)?,
        data_sign: require(data_sign, KEY_CRITICAL_DATA_SIGN)?,
    })
}

/// Resolve the key bundle for a repair, enforcing the platform's
/// profile-sourcing policy: MediaTek repairs need a donor-derived bundle,
/// Qualcomm repairs need a selected built-in profile.
pub fn resolve_key_bundle(
    platform: Platform,
    source: Option<&ProfileSource>,
) -> Result<KeyBundle> {
    match (platform, source) {
        (Platform::Mediatek, Some(ProfileSource::Custom(bundle))) => Ok(bundle.clone()),
        (Platform::Mediatek, _) => Err(Error::MissingInputs(
            "a MediaTek repair needs a key profile built from a donor backup",
        )),
        (Platform::Qualcomm, Some(ProfileSource::BuiltIn(key))) => {
            let profile =
                builtin_profile(key).ok_or_else(|| Error::InvalidProfile(key.clone()))?;
            let keys = profile
                .keys
                .ok_or_else(|| Error::InvalidProfile(key.clone()))?;
            Ok(KeyBundle {
                modulus: keys.modulus.to_owned(),
                exponent: keys.exponent.to_owned(),
                device_sign: keys.device_sign.to_owned(),
                data_sign: keys.data_sign.to_owned(),
            })
        }
        (Platform::Qualcomm, _) => Err(Error::MissingInputs(
            "a Qualcomm repair needs one of the built-in profiles selected",
        )),
    }
}
