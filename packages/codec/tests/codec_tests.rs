//! End-to-end tests for the surface → field → ciphertext pipeline

use slidedeck_codec::{denormalize, normalize, FieldCipher};

#[test]
fn test_surface_to_ciphertext_and_back() {
    let cipher = FieldCipher::from_passphrase("deck-key");

    let value = normalize("<b>Revenue</b> up 12%", "Click to add text");
    let stored = cipher.encrypt(value.as_str());
    assert!(!stored.contains("Revenue"));

    let restored = cipher.decrypt(&stored);
    assert_eq!(denormalize(&restored.into()), "<b>Revenue</b> up 12%");
}

#[test]
fn test_cleared_surface_is_stored_as_placeholder() {
    let cipher = FieldCipher::from_passphrase("deck-key");

    let value = normalize("<div><br></div>", "Click to add notes");
    let stored = cipher.encrypt(value.as_str());
    assert_eq!(cipher.decrypt(&stored), "Click to add notes");
}

#[test]
fn test_legacy_rows_survive_mixed_reads() {
    let cipher = FieldCipher::from_passphrase("deck-key");
    let rows = vec![
        cipher.encrypt("new row"),
        "legacy plaintext row".to_string(),
        "enc1:corrupted".to_string(),
    ];

    let read: Vec<String> = rows.iter().map(|r| cipher.decrypt(r)).collect();
    assert_eq!(read, vec!["new row", "legacy plaintext row", "enc1:corrupted"]);
}
