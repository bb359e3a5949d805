//! Protocol Tests
//!
//! Tests for the RTTY sentence formatter/decoder and the FSK frames.
//! Run with: cargo test --test protocol_tests

use balloon_tx::config::{EngineConfig, CALLSIGN};
use balloon_tx::power::{BatteryVoltage, Temperature};
use balloon_tx::protocol::binary::{
    format_frame, horus_packet, test_frame, FrameBuf, FskPayload, HORUS_PACKET_LEN, PREAMBLE_BYTE,
    UNIQUE_WORD,
};
use balloon_tx::protocol::checksum::{crc16, crc16_bytes};
use balloon_tx::protocol::sentence::{format_sentence, Sentence, SentenceBuf};
use balloon_tx::protocol::{FormatError, ParseError};
use balloon_tx::telemetry::TelemetrySnapshot;
use balloon_tx::types::{FixQuality, GpsFix};

fn locked_fix() -> GpsFix {
    GpsFix {
        fix: FixQuality::FIX_3D,
        lat_raw: -452_345_678,
        lon_raw: 1_452_345_678,
        alt_raw: 12_345_000,
        speed_raw: 3,
        sats_raw: 7,
        ..GpsFix::default()
    }
}

fn snapshot(frame: u32, fix: GpsFix) -> TelemetrySnapshot {
    TelemetrySnapshot::new(
        frame,
        Temperature::from_celsius(-5),
        BatteryVoltage::from_centivolts(330),
        fix,
        &EngineConfig::default(),
    )
}

fn render(callsign: &str, snap: &TelemetrySnapshot) -> SentenceBuf {
    let mut out = SentenceBuf::new();
    format_sentence(callsign, snap, &mut out).unwrap();
    out
}

// =============================================================================
// Sentence Formatting
// =============================================================================

#[test]
fn sentence_with_lock() {
    let out = render("TEST", &snapshot(1, locked_fix()));
    assert_eq!(
        out.as_str(),
        "$$$$$TEST,1,00:00:00,-45.2345,145.2345,12345,3,7,3300,-5*9764\n"
    );
}

#[test]
fn sentence_without_lock_zeroes_position() {
    let fix = GpsFix {
        fix: FixQuality::FIX_2D,
        ..locked_fix()
    };
    let snap = snapshot(1, fix);
    assert!(!snap.gps_lock());

    let out = render("TEST", &snap);
    assert!(out.contains(",0.0000,0.0000,"));
}

#[test]
fn checksum_covers_body_only() {
    let out = render(CALLSIGN, &snapshot(42, locked_fix()));
    let (body, tail) = out.rsplit_once('*').unwrap();
    let body = body.trim_start_matches('$');
    let expected = format!("{:04X}\n", crc16(body.as_bytes()));
    assert_eq!(tail, expected);
}

#[test]
fn time_fields_zero_padded() {
    let fix = GpsFix {
        hours: 7,
        minutes: 3,
        seconds: 9,
        ..locked_fix()
    };
    let out = render("TEST", &snapshot(1, fix));
    assert!(out.contains(",07:03:09,"));
}

#[test]
fn minus_sign_only_when_negative() {
    for raw in [-1_800_000_000, -5_000, -1, 0, 1, 5_000, 1_800_000_000] {
        let fix = GpsFix {
            lat_raw: raw,
            ..locked_fix()
        };
        let out = render("TEST", &snapshot(1, fix));
        let lat = out.split(',').nth(3).unwrap();
        assert_eq!(lat.starts_with('-'), raw < 0, "lat {raw} rendered as {lat}");
    }
}

#[test]
fn invalid_callsigns_rejected() {
    let snap = snapshot(1, locked_fix());
    let mut out = SentenceBuf::new();
    for callsign in ["", "A,B", "STAR*", "$IGN", "WAY-TOO-LONG-CALL", "SP ACE"] {
        assert_eq!(
            format_sentence(callsign, &snap, &mut out),
            Err(FormatError::InvalidCallsign),
            "{callsign:?}"
        );
    }
}

// =============================================================================
// Sentence Decoding
// =============================================================================

#[test]
fn decode_recovers_fields() {
    let fix = GpsFix {
        hours: 12,
        minutes: 34,
        seconds: 56,
        ..locked_fix()
    };
    let out = render("TEST", &snapshot(17, fix));
    let sentence = Sentence::parse(&out).unwrap();

    assert_eq!(sentence.callsign.as_str(), "TEST");
    assert_eq!(sentence.frame, 17);
    assert_eq!(sentence.time, (12, 34, 56));
    assert_eq!(sentence.lat_raw, -452_345_000);
    assert_eq!(sentence.lon_raw, 1_452_345_000);
    assert_eq!(sentence.altitude_m, 12_345);
    assert_eq!(sentence.speed, 3);
    assert_eq!(sentence.sats, 7);
    assert_eq!(sentence.millivolts, 3300);
    assert_eq!(sentence.temperature, -5);
}

#[test]
fn decode_rejects_corruption() {
    let out = render("TEST", &snapshot(1, locked_fix()));
    let corrupted = out.replace("12345", "12346");
    assert!(matches!(
        Sentence::parse(&corrupted),
        Err(ParseError::ChecksumMismatch { .. })
    ));
}

#[test]
fn decode_structural_errors() {
    assert_eq!(Sentence::parse("TEST,1*0000"), Err(ParseError::MissingMarker));
    assert_eq!(Sentence::parse("$$TEST,1"), Err(ParseError::MissingChecksum));
    assert_eq!(Sentence::parse("$$TEST,1*12"), Err(ParseError::BadChecksumField));

    let body = "TEST,1,2";
    let line = format!("$$$$${body}*{:04X}", crc16(body.as_bytes()));
    assert_eq!(Sentence::parse(&line), Err(ParseError::FieldCount(3)));
}

// =============================================================================
// FSK Frames
// =============================================================================

#[test]
fn test_frame_layout() {
    let mut out = FrameBuf::new();
    let len = test_frame(&mut out).unwrap();
    assert_eq!(len, 22);
    assert_eq!(&out[..4], &[PREAMBLE_BYTE; 4]);
    assert_eq!(&out[4..6], &UNIQUE_WORD);
    assert!(out[6..].iter().copied().eq(0u8..16));
}

#[test]
fn test_frame_ignores_snapshot() {
    let mut a = FrameBuf::new();
    let mut b = FrameBuf::new();
    format_frame(FskPayload::TestFrame, &snapshot(1, locked_fix()), &mut a).unwrap();
    format_frame(FskPayload::TestFrame, &snapshot(9, GpsFix::default()), &mut b).unwrap();
    assert_eq!(a, b);
}

#[test]
fn horus_packet_fields() {
    let fix = GpsFix {
        hours: 1,
        minutes: 2,
        seconds: 3,
        speed_raw: 1000,
        ..locked_fix()
    };
    let packet = horus_packet(5, &snapshot(0x0102, fix));

    assert_eq!(packet[0], 5);
    assert_eq!(&packet[1..3], &[0x02, 0x01]);
    assert_eq!(&packet[3..6], &[1, 2, 3]);
    let lat = f32::from_le_bytes(packet[6..10].try_into().unwrap());
    assert!((lat + 45.234_568).abs() < 1e-4);
    assert_eq!(u16::from_le_bytes([packet[14], packet[15]]), 12_345);
    // 10 m/s = 36 km/h
    assert_eq!(packet[16], 36);
    assert_eq!(packet[17], 7);
    assert_eq!(packet[18] as i8, -5);
    assert_eq!(packet[19], 168);

    let crc = crc16_bytes(&packet[..HORUS_PACKET_LEN - 2]);
    assert_eq!(&packet[20..], &crc.to_le_bytes());
}

#[test]
fn horus_frame_has_header() {
    let snap = snapshot(3, locked_fix());
    let mut out = FrameBuf::new();
    let len = format_frame(FskPayload::HorusBinary { payload_id: 1 }, &snap, &mut out).unwrap();
    assert_eq!(len, 6 + HORUS_PACKET_LEN);
    assert_eq!(&out[..6], &[0x1B, 0x1B, 0x1B, 0x1B, 0x24, 0x24]);
    assert_eq!(&out[6..], &horus_packet(1, &snap));
}
