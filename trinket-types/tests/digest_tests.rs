use trinket_types::Digest;

#[test]
fn digest_matches_known_sha256() {
    assert_eq!(
        Digest::of(b"abc").to_hex(),
        "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn equal_bytes_give_equal_digests() {
    assert_eq!(Digest::of(b"same"), Digest::of(b"same"));
    assert_ne!(Digest::of(b"same"), Digest::of(b"other"));
}

#[test]
fn display_is_full_hex_and_debug_is_short() {
    let digest = Digest::of(b"");
    assert_eq!(digest.to_string().len(), 64);
    assert_eq!(format!("{digest:?}"), "Digest(e3b0c44298fc)");
}
