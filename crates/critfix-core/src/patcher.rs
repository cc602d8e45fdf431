//! The record patcher: rewrites the IMEI fields inside a critical_data
//! backup, recomputes the CRC-32 trailer, and stamps in the signature
//! bundle.
//!
//! The patch is all-or-nothing: any failure leaves the caller holding the
//! untouched original. Progress is reported as `tracing` events so a
//! frontend can surface the step log.

use tracing::{info, warn};

use crate::checksum::crc32;
use crate::codec::{hex_to_bytes, imei_hex, u32_to_le_hex, Imei};
use crate::error::Error;
use crate::profile::KeyBundle;
use crate::record::{
    TextRecord, KEY_CRITICAL_DATA, KEY_CRITICAL_DATA_ALIAS, KEY_CRITICAL_DATA_SIGN,
    KEY_DEV_PUB_KEY_MODULUS, KEY_DEV_PUB_KEY_SIGN,
};
use crate::Result;

/// Marker preceding the IMEI 1 field in the payload.
const IMEI1_TAG: &str = "020f";
/// Marker preceding the IMEI 2 field.
const IMEI2_TAG: &str = "030f";
/// Width of an encoded IMEI field: 15 ASCII digits as hex.
const IMEI_FIELD_LEN: usize = 30;
/// Width of the CRC-32 trailer in hex characters.
const TRAILER_LEN: usize = 8;

/// Overwrite the fixed-width field that follows the first occurrence of
/// `tag`. The overwrite never changes the payload length: exactly
/// [`IMEI_FIELD_LEN`] characters after the tag are replaced. A tag with no
/// room left for its full field is as unusable as a missing one.
fn overwrite_after_tag(payload: &str, tag: &'static str, field: &str) -> Result<String> {
    let tag_at = payload.find(tag).ok_or(Error::MissingTag(tag))?;
    let start = tag_at + tag.len();
    let end = start + IMEI_FIELD_LEN;
    if end > payload.len() {
        return Err(Error::MissingTag(tag));
    }

    let mut patched = String::with_capacity(payload.len());
    patched.push_str(&payload[..start]);
    patched.push_str(field);
    patched.push_str(&payload[end..]);
    Ok(patched)
}

/// Rewrite both IMEI fields inside a critical-data hex payload and
/// recompute its CRC-32 trailer.
///
/// The trailer covers every byte of the payload except itself; it is
/// stripped, the remainder is checksummed, and the new checksum is
/// appended as 8 little-endian hex digits.
pub fn patch_critical_data(payload: &str, imei1: &Imei, imei2: &Imei) -> Result<String> {
    if !payload.is_ascii() {
        return Err(Error::InvalidHex);
    }

    let patched = overwrite_after_tag(payload, IMEI1_TAG, &imei_hex(imei1))?;
    info!(imei = %imei1, "writing new IMEI 1");

    // The second tag is searched in the already-patched payload. IMEI
    // encodings contain no 'f', so the first overwrite cannot fabricate
    // or destroy a tag.
    let patched = overwrite_after_tag(&patched, IMEI2_TAG, &imei_hex(imei2))?;
    info!(imei = %imei2, "writing new IMEI 2");

    let data_len = patched
        .len()
        .checked_sub(TRAILER_LEN)
        .ok_or(Error::InvalidHex)?;
    let data_part = &patched[..data_len];
    let checksum = crc32(&hex_to_bytes(data_part)?);
    let trailer = u32_to_le_hex(checksum);
    info!(checksum = %trailer.to_uppercase(), "new checksum computed");

    Ok(format!("{data_part}{trailer}"))
}

/// Apply a full repair to a backup document.
///
/// Locates the critical-data field (either spelling), patches its payload,
/// and substitutes the new payload plus the signature bundle into the
/// document. Target fields absent from the document are skipped with a
/// warning; some backup variants simply do not carry them.
pub fn patch_document(
    original: &str,
    imei1: &Imei,
    imei2: &Imei,
    bundle: &KeyBundle,
) -> Result<String> {
    let mut record = TextRecord::parse(original);

    let (data_key, payload) = {
        let field = record
            .find_first(&[KEY_CRITICAL_DATA, KEY_CRITICAL_DATA_ALIAS])
            .filter(|f| !f.value.is_empty())
            .ok_or_else(|| Error::MissingField(KEY_CRITICAL_DATA.to_owned()))?;
        (field.key.to_owned(), field.value.to_owned())
    };
    info!(key = %data_key, "critical data section read");

    let new_payload = patch_critical_data(&payload, imei1, imei2)?;

    replace_logged(&mut record, KEY_DEV_PUB_KEY_MODULUS, &bundle.modulus);
    replace_logged(&mut record, KEY_DEV_PUB_KEY_SIGN, &bundle.device_sign);
    // The payload goes back under whichever spelling the document used.
    replace_logged(&mut record, &data_key, &new_payload);
    replace_logged(&mut record, KEY_CRITICAL_DATA_SIGN, &bundle.data_sign);

    Ok(record.render())
}

fn replace_logged(record: &mut TextRecord, key: &str, value: &str) {
    if record.replace_first(key, value) {
        info!(key, "field updated");
    } else {
        warn!(key, "field not present in document, leaving as-is");
    }
}
