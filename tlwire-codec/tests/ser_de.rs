use tlwire_codec::{Cursor, Deserializable, Error, RawVec, Serializable, gzip_packed};

// ── Primitive round-trips ─────────────────────────────────────────────────────

#[test]
fn roundtrip_i32() {
    for v in [0i32, -1, i32::MAX, i32::MIN, 42] {
        assert_eq!(i32::from_bytes(&v.to_bytes()).unwrap(), v);
    }
}

#[test]
fn roundtrip_i64() {
    for v in [0i64, -1, i64::MAX, i64::MIN, 1_234_567_890] {
        assert_eq!(i64::from_bytes(&v.to_bytes()).unwrap(), v);
    }
}

#[test]
fn double_is_little_endian_ieee754() {
    let bytes = 1.5f64.to_bytes();
    assert_eq!(bytes, [0, 0, 0, 0, 0, 0, 0xf8, 0x3f]);
    assert_eq!(f64::from_bytes(&bytes).unwrap(), 1.5);
}

#[test]
fn bool_ids() {
    assert_eq!(true.to_bytes(), 0x997275b5u32.to_le_bytes());
    assert_eq!(false.to_bytes(), 0xbc799737u32.to_le_bytes());
    assert!(bool::from_bytes(&true.to_bytes()).unwrap());
    assert!(!bool::from_bytes(&false.to_bytes()).unwrap());
}

// ── String / bytes ────────────────────────────────────────────────────────────

#[test]
fn framing_is_aligned_for_every_length_class() {
    for len in [0usize, 1, 252, 253, 254, 255, 65536] {
        let payload: Vec<u8> = (0..len).map(|i| (i * 7) as u8).collect();
        let header = if len <= 253 { 1 } else { 4 };
        let expected = (header + len).div_ceil(4) * 4;

        let mut wire = payload.to_bytes();
        assert_eq!(wire.len(), expected, "len {len}");
        wire.extend([0xee; 4]);

        let mut cur = Cursor::from_slice(&wire);
        assert_eq!(Vec::<u8>::deserialize(&mut cur).unwrap(), payload, "len {len}");
        assert_eq!(cur.pos(), expected, "len {len}");
    }
}

#[test]
fn roundtrip_long_string() {
    let s = "x".repeat(300);
    assert_eq!(String::from_bytes(&s.to_bytes()).unwrap(), s);
}

#[test]
fn invalid_utf8_is_a_content_error() {
    let wire = vec![0xffu8, 0xfe].to_bytes();
    let err = String::from_bytes(&wire).unwrap_err();
    assert!(matches!(err, Error::Content { .. }));
    assert!(!err.is_framing());
}

// ── Vectors ───────────────────────────────────────────────────────────────────

#[test]
fn roundtrip_vec_i32() {
    for n in [0usize, 1, 1000] {
        let v: Vec<i32> = (0..n as i32).map(|i| i * 3 - 7).collect();
        let wire = v.to_bytes();
        assert_eq!(wire.len(), 8 + 4 * n);
        assert_eq!(Vec::<i32>::from_bytes(&wire).unwrap(), v);
    }
}

#[test]
fn gzip_packed_vector() {
    let v = vec![5i64, -6, 7];
    assert_eq!(Vec::<i64>::from_bytes(&gzip_packed(&v.to_bytes())).unwrap(), v);
}

#[test]
fn bare_vector_has_no_tag() {
    let wire = RawVec(vec![1i32, 2]).to_bytes();
    assert_eq!(wire.len(), 12);
    assert_eq!(RawVec::<i32>::from_bytes(&wire).unwrap(), RawVec(vec![1, 2]));
}

#[test]
fn vector_with_wrong_tag() {
    let wire = [0x01u8, 0, 0, 0, 0, 0, 0, 0];
    let mut cur = Cursor::from_slice(&wire);
    let err = Vec::<i32>::deserialize(&mut cur).unwrap_err();
    assert!(matches!(err, Error::UnknownTag { offset: 0, .. }));
    assert_eq!(cur.pos(), 4);
}

// ── Fixed-size arrays ─────────────────────────────────────────────────────────

#[test]
fn roundtrip_int128() {
    let v: [u8; 16] = [1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16];
    assert_eq!(<[u8; 16]>::from_bytes(&v.to_bytes()).unwrap(), v);
}

#[test]
fn roundtrip_int512() {
    let v: [u8; 64] = core::array::from_fn(|i| i as u8);
    assert_eq!(<[u8; 64]>::from_bytes(&v.to_bytes()).unwrap(), v);
}

// ── Truncation ────────────────────────────────────────────────────────────────

#[test]
fn deserialize_truncated() {
    assert_eq!(i32::from_bytes(&[0x01, 0x02]), Err(Error::StreamTruncated { offset: 0, needed: 4 }));
}
