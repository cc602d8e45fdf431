//! End-to-end repair scenarios against minimal backup documents.

use critfix::{
    crc32, hex_to_bytes, parse_donor_keys, patch_document, resolve_key_bundle, u32_to_le_hex,
    Error, Imei, KeyBundle, Platform, ProfileSource, TextRecord, KEY_CRITICAL_DATA,
    KEY_CRITICAL_DATA_ALIAS,
};

const IMEI1: &str = "123456789012345";
const IMEI2: &str = "543210987654321";

/// The minimal repairable document: a payload with both tags, placeholder
/// IMEI fields, a stale trailer, and the three signature fields.
fn minimal_document() -> String {
    let payload = format!(
        "AABB020f{}030f{}DEADBEEF",
        "0".repeat(30),
        "0".repeat(30)
    );
    format!(
        "criticalData:{payload}\ndevPubKeyModulus:old\ndevPubKeySign:old\ncrticalDataSign:old"
    )
}

fn bundle() -> KeyBundle {
    KeyBundle {
        modulus: "M".into(),
        exponent: "10001".into(),
        device_sign: "S".into(),
        data_sign: "D".into(),
    }
}

fn imei(s: &str) -> Imei {
    Imei::new(s).unwrap()
}

fn critical_data_value(document: &str) -> String {
    TextRecord::parse(document)
        .find_first(&[KEY_CRITICAL_DATA, KEY_CRITICAL_DATA_ALIAS])
        .expect("document must keep its critical data field")
        .value
        .to_owned()
}

#[test]
fn full_repair_scenario() {
    let out = patch_document(&minimal_document(), &imei(IMEI1), &imei(IMEI2), &bundle()).unwrap();

    // (a) both tag offsets carry the new IMEIs, hex-ASCII encoded.
    let payload = critical_data_value(&out);
    let tag1 = payload.find("020f").unwrap();
    assert_eq!(&payload[tag1 + 4..tag1 + 34], "313233343536373839303132333435");
    let tag2 = payload.find("030f").unwrap();
    assert_eq!(&payload[tag2 + 4..tag2 + 34], "353433323130393837363534333231");

    // (b) the trailer is freshly computed, not the stale one.
    assert!(!payload.ends_with("DEADBEEF"));
    let (data_part, trailer) = payload.split_at(payload.len() - 8);
    assert_eq!(trailer, u32_to_le_hex(crc32(&hex_to_bytes(data_part).unwrap())));

    // (c) the signature fields took the bundle values.
    assert!(out.contains("devPubKeyModulus:M"));
    assert!(out.contains("devPubKeySign:S"));
    assert!(out.contains("crticalDataSign:D"));
}

#[test]
fn payload_length_is_preserved() {
    let original = critical_data_value(&minimal_document());
    let out = patch_document(&minimal_document(), &imei(IMEI1), &imei(IMEI2), &bundle()).unwrap();
    assert_eq!(critical_data_value(&out).len(), original.len());
}

#[test]
fn repatching_with_same_imeis_is_a_noop_on_the_payload() {
    let one = imei(IMEI1);
    let two = imei(IMEI2);

    let first = patch_document(&minimal_document(), &one, &two, &bundle()).unwrap();
    let second = patch_document(&first, &one, &two, &bundle()).unwrap();
    assert_eq!(critical_data_value(&first), critical_data_value(&second));
    assert_eq!(first, second);
}

#[test]
fn missing_critical_data_field_fails_without_output() {
    let document = "devPubKeyModulus:old\ndevPubKeySign:old\ncrticalDataSign:old";
    let result = patch_document(document, &imei(IMEI1), &imei(IMEI2), &bundle());
    assert_eq!(
        result,
        Err(Error::MissingField(KEY_CRITICAL_DATA.to_owned()))
    );
}

#[test]
fn misspelled_critical_data_key_is_preserved() {
    let document = minimal_document().replace("criticalData:", "crticalData:");
    let out = patch_document(&document, &imei(IMEI1), &imei(IMEI2), &bundle()).unwrap();
    assert!(out.starts_with("crticalData:"));
    assert!(!out.contains("criticalData:"));
    assert!(!critical_data_value(&out).ends_with("DEADBEEF"));
}

#[test]
fn donor_repair_end_to_end() {
    let donor = "\
devPubKeyModulus:feedface
devPubKeySign:cafebabe
crticalDataSign:baadf00d
";
    let source = ProfileSource::Custom(parse_donor_keys(donor).unwrap());
    let resolved = resolve_key_bundle(Platform::Mediatek, Some(&source)).unwrap();
    assert_eq!(resolved.exponent, "10001");

    let out =
        patch_document(&minimal_document(), &imei(IMEI1), &imei(IMEI2), &resolved).unwrap();
    assert!(out.contains("devPubKeyModulus:feedface"));
    assert!(out.contains("devPubKeySign:cafebabe"));
    assert!(out.contains("crticalDataSign:baadf00d"));
}

#[test]
fn donor_without_data_sign_yields_no_profile() {
    let donor = "devPubKeyModulus:aa\ndevPubKeySign:bb\n";
    let parsed = parse_donor_keys(donor);
    assert!(matches!(&parsed, Err(Error::MissingField(_))));

    // A failed donor parse leaves the repair with no custom profile at
    // all; resolution then reports the missing input.
    let source: Option<ProfileSource> = parsed.ok().map(ProfileSource::Custom);
    assert!(matches!(
        resolve_key_bundle(Platform::Mediatek, source.as_ref()),
        Err(Error::MissingInputs(_))
    ));
}

#[test]
fn untouched_content_survives_verbatim() {
    let document = format!("# comment line\nmodel:demo\n{}\nextra:1", minimal_document());
    let out = patch_document(&document, &imei(IMEI1), &imei(IMEI2), &bundle()).unwrap();
    assert!(out.starts_with("# comment line\nmodel:demo\n"));
    assert!(out.ends_with("extra:1"));
}
