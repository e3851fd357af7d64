use crate::error::TraceError;
use crate::trace::{self, check, decode, encode, MAX_NAME_LEN};

#[test]
fn encoded_records_pass_check() {
    let mut buf = [0u8; 8 + MAX_NAME_LEN];
    let len = encode(&mut buf, 7, "blink");
    assert_eq!(check(trace::SCENE_UPDATE, &buf[..len]), Ok(()));
    assert_eq!(decode(&buf[..len]), Some((7, "blink")));
}

#[test]
fn unknown_record_is_rejected() {
    assert_eq!(check(0x01, &[]), Err(TraceError::Rejected(0x01)));
    assert_eq!(
        check(trace::SCENE_IDLE + 1, &[]),
        Err(TraceError::Rejected(trace::SCENE_IDLE + 1))
    );
}

#[test]
fn oversized_payload_is_refused() {
    let payload = [0u8; 8 + MAX_NAME_LEN + 1];
    assert_eq!(
        check(trace::SCENE_ADD, &payload),
        Err(TraceError::PayloadTooLarge(8 + MAX_NAME_LEN + 1))
    );
}

#[test]
fn long_names_are_cut_on_char_boundary() {
    let name = "é".repeat(MAX_NAME_LEN);
    let mut buf = [0u8; 8 + MAX_NAME_LEN];
    let len = encode(&mut buf, 1, &name);
    assert_eq!(len, 8 + MAX_NAME_LEN);
    let (_, cut) = decode(&buf[..len]).unwrap();
    assert_eq!(cut.chars().count(), MAX_NAME_LEN / 2);
}
