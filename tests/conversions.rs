// Copyright 2026 Adobe. All rights reserved.
// This file is licensed to you under the Apache License,
// Version 2.0 (http://www.apache.org/licenses/LICENSE-2.0)
// or the MIT license (http://opensource.org/licenses/MIT),
// at your option.

// Scalar conversions through the public façade, driven by decoder-shaped
// trees and hand-built values.

use chrono::{DateTime, FixedOffset, TimeDelta, TimeZone, Utc};
use half::f16;
use valcast::{EpochUnit, ErrorKind, Kind, Number, Options, Segment, Target, Value};

fn json(text: &str) -> Value {
    serde_json::from_str(text).unwrap()
}

#[test]
fn test_identity_for_every_target() {
    let at = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap().fixed_offset();
    let wait = TimeDelta::milliseconds(1500);

    assert_eq!(valcast::to_string_e(&Value::from("abc")).unwrap(), "abc");
    assert!(valcast::to_bool_e(&Value::from(true)).unwrap());
    assert_eq!(valcast::to_i8_e(&Value::from(i8::MIN)).unwrap(), i8::MIN);
    assert_eq!(valcast::to_i16_e(&Value::from(i16::MAX)).unwrap(), i16::MAX);
    assert_eq!(valcast::to_i32_e(&Value::from(-5i32)).unwrap(), -5);
    assert_eq!(valcast::to_i64_e(&Value::from(i64::MAX)).unwrap(), i64::MAX);
    assert_eq!(valcast::to_isize_e(&Value::from(-9isize)).unwrap(), -9);
    assert_eq!(valcast::to_u8_e(&Value::from(u8::MAX)).unwrap(), u8::MAX);
    assert_eq!(valcast::to_u16_e(&Value::from(7u16)).unwrap(), 7);
    assert_eq!(valcast::to_u32_e(&Value::from(u32::MAX)).unwrap(), u32::MAX);
    assert_eq!(valcast::to_u64_e(&Value::from(u64::MAX)).unwrap(), u64::MAX);
    assert_eq!(valcast::to_usize_e(&Value::from(3usize)).unwrap(), 3);
    assert_eq!(valcast::to_f32_e(&Value::from(0.1f32)).unwrap(), 0.1f32);
    assert_eq!(valcast::to_f64_e(&Value::from(0.1f64)).unwrap(), 0.1f64);
    assert_eq!(valcast::to_time_e(&Value::from(at)).unwrap(), at);
    assert_eq!(valcast::to_duration_e(&Value::from(wait)).unwrap(), wait);
}

#[test]
fn test_widen_and_narrow_inside_range() {
    for n in [i8::MIN, -1, 0, 1, i8::MAX] {
        let wide = valcast::to_i64_e(&Value::from(n)).unwrap();
        assert_eq!(valcast::to_i8_e(&Value::from(wide)).unwrap(), n);
    }
    for n in [0u16, 1, 255] {
        let wide = valcast::to_u64_e(&Value::from(n)).unwrap();
        assert_eq!(valcast::to_u8_e(&Value::from(wide)).unwrap(), n as u8);
    }
}

#[test]
fn test_narrow_outside_range_overflows() {
    let cases = [
        valcast::to_i8_e(&Value::from(200u8)).unwrap_err(),
        valcast::to_u8_e(&Value::from(-1i64)).unwrap_err(),
        valcast::to_u32_e(&Value::from(-0.5f64 - 1.0)).unwrap_err(),
        valcast::to_i32_e(&Value::from(i64::MAX)).unwrap_err(),
        valcast::to_u64_e(&Value::from(f32::NAN)).unwrap_err(),
    ];
    for err in cases {
        assert_eq!(err.kind(), ErrorKind::Overflow, "{err}");
    }
}

#[test]
fn test_text_to_integers() {
    assert_eq!(valcast::to_u8_e(&Value::from("123")).unwrap(), 123);

    let err = valcast::to_u8_e(&Value::from("256")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Overflow);
    assert_eq!(err.target(), &Target::U8);
    assert_eq!(
        err.to_string(),
        r#"unable to cast "256" of kind string to u8: out of range integral type conversion attempted"#
    );

    let err = valcast::to_i32_e(&Value::from("abc")).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSyntax);
    assert_eq!(err.value_kind(), Kind::String);
}

#[test]
fn test_absent_values_become_zero() {
    for absent in [Value::Null, Value::null_ptr(), Value::from(None::<i32>)] {
        assert_eq!(valcast::to_i32_e(&absent).unwrap(), 0);
        assert_eq!(valcast::to_u64_e(&absent).unwrap(), 0);
        assert_eq!(valcast::to_f64_e(&absent).unwrap(), 0.0);
        assert!(!valcast::to_bool_e(&absent).unwrap());
        assert_eq!(valcast::to_string_e(&absent).unwrap(), "");
    }
}

#[test]
fn test_absent_pointer_resolves_to_null() {
    let value = Value::from(None::<i32>);
    assert_eq!(value.resolve(), (&Value::Null, true));
}

#[test]
fn test_pointers_are_followed() {
    let value = Value::ptr(Value::ptr("42"));
    assert_eq!(valcast::to_i64_e(&value).unwrap(), 42);
    assert_eq!(value.cast::<String>().unwrap(), "42");
}

#[test]
fn test_bool_string_round_trip() {
    for b in [true, false] {
        let text = valcast::to_string_e(&Value::from(b)).unwrap();
        assert_eq!(valcast::to_bool_e(&Value::from(text)).unwrap(), b);
    }
}

#[test]
fn test_best_effort_and_must_forms() {
    assert_eq!(valcast::to::<u8>(&Value::from("256")), 0);
    assert_eq!(valcast::to_u8(&Value::from("12")), 12);
    assert_eq!(valcast::to_string(&Value::Seq(vec![])), "");
    assert!(!valcast::to_bool(&Value::from("maybe")));
    assert_eq!(valcast::to_duration(&Value::from("oops")), TimeDelta::zero());
    assert_eq!(valcast::to_time(&Value::from("oops")).timestamp(), 0);
    assert_eq!(valcast::must_to::<i16>(&Value::from("-300")), -300);
}

#[test]
#[should_panic(expected = r#"unable to cast "x" of kind string to i64"#)]
fn test_must_to_panics_with_message() {
    valcast::must_to::<i64>(&Value::from("x"));
}

#[test]
fn test_numbers_from_decoder() {
    let value = json(r#"{"big": 18446744073709551615, "neg": -5, "ratio": 0.25}"#);
    assert_eq!(valcast::to_u64_e(value.get("big").unwrap()).unwrap(), u64::MAX);
    assert_eq!(
        valcast::to_i64_e(value.get("big").unwrap()).unwrap_err().kind(),
        ErrorKind::Overflow
    );
    assert_eq!(valcast::to_i8_e(value.get("neg").unwrap()).unwrap(), -5);
    assert_eq!(valcast::to_f32_e(value.get("ratio").unwrap()).unwrap(), 0.25);
    assert_eq!(valcast::to_string_e(value.get("ratio").unwrap()).unwrap(), "0.25");
}

#[test]
fn test_number_text_keeps_precision() {
    let value = Value::Number(Number::new("340282366920938463463374607431768211455"));
    assert_eq!(
        valcast::to_string_e(&value).unwrap(),
        "340282366920938463463374607431768211455"
    );
    assert_eq!(valcast::to_u64_e(&value).unwrap_err().kind(), ErrorKind::Overflow);
}

#[test]
fn test_f16_leaves() {
    let value = Value::from(f16::from_f32(1.5));
    assert_eq!(valcast::to_string_e(&value).unwrap(), "1.5");
    assert_eq!(valcast::to_f64_e(&value).unwrap(), 1.5);
    assert_eq!(valcast::to_i32_e(&value).unwrap(), 1);
}

#[test]
fn test_time_layouts() {
    let expected = Utc.with_ymd_and_hms(2024, 1, 15, 10, 30, 0).unwrap();
    for text in [
        "2024-01-15T10:30:00Z",
        "2024-01-15T12:30:00+02:00",
        "Mon, 15 Jan 2024 10:30:00 +0000",
        "2024-01-15 10:30:00",
        "2024-01-15T10:30:00",
    ] {
        let t = valcast::to_time_e(&Value::from(text)).unwrap();
        assert_eq!(t, expected, "{text}");
    }
    let day = valcast::to_time_e(&Value::from("2024-01-15")).unwrap();
    assert_eq!(day.to_rfc3339(), "2024-01-15T00:00:00+00:00");
}

#[test]
fn test_time_in_offset() {
    let plus_two = FixedOffset::east_opt(2 * 3600).unwrap();
    let t = valcast::to_time_in_offset_e(&Value::from("2024-01-15 12:30:00"), plus_two).unwrap();
    assert_eq!(t.offset(), &plus_two);
    assert_eq!(t.timestamp(), 1705314600);

    // explicit offsets win over the default
    let t = valcast::to_time_in_offset(&Value::from("2024-01-15T10:30:00Z"), plus_two);
    assert_eq!(t.timestamp(), 1705314600);
}

#[test]
fn test_numeric_instants_need_epoch_unit() {
    let value = Value::from(1_705_314_600_000u64);
    let err = valcast::to_time_e(&value).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Unconvertible);
    assert_eq!(err.target(), &Target::Instant);

    let options = Options::default().with_epoch(EpochUnit::Millis);
    let t: DateTime<FixedOffset> = valcast::to_with(&value, &options).unwrap();
    assert_eq!(t.timestamp(), 1705314600);
}

#[test]
fn test_options_from_config_document() {
    let options: Options =
        serde_json::from_str(r#"{"epoch": "seconds", "default_offset": -18000}"#).unwrap();
    let t: DateTime<FixedOffset> = valcast::to_with(&Value::from(1705314600i64), &options).unwrap();
    assert_eq!(t.timestamp(), 1705314600);
    assert_eq!(t.offset().local_minus_utc(), -18000);
}

#[test]
fn test_durations() {
    assert_eq!(
        valcast::to_duration_e(&Value::from("72h3m0.5s")).unwrap(),
        TimeDelta::hours(72) + TimeDelta::minutes(3) + TimeDelta::milliseconds(500)
    );
    assert_eq!(
        valcast::to_duration_e(&Value::from("-1.5µs")).unwrap(),
        TimeDelta::nanoseconds(-1500)
    );
    assert_eq!(valcast::to_duration_e(&Value::from("0")).unwrap(), TimeDelta::zero());
    assert_eq!(
        valcast::to_duration_e(&Value::from(1_000_000_000u32)).unwrap(),
        TimeDelta::seconds(1)
    );
    assert_eq!(
        valcast::to_duration_e(&Value::from("1h1x")).unwrap_err().kind(),
        ErrorKind::InvalidSyntax
    );
    assert_eq!(
        valcast::to_string_e(&Value::from(std::time::Duration::from_millis(1500))).unwrap(),
        "1.5s"
    );
}

#[test]
fn test_unconvertible_kinds() {
    let map = json(r#"{"a": 1}"#);
    for err in [
        valcast::to_i64_e(&map).unwrap_err(),
        valcast::to_bool_e(&json("[true]")).unwrap_err(),
        valcast::to_string_e(&map).unwrap_err(),
        valcast::to_duration_e(&Value::Null).unwrap_err(),
        valcast::to_time_e(&Value::Null).unwrap_err(),
        valcast::to_i64_e(&Value::from(Utc::now())).unwrap_err(),
    ] {
        assert_eq!(err.kind(), ErrorKind::Unconvertible, "{err}");
        assert!(err.path().is_empty());
    }
}

#[test]
fn test_container_scenarios() {
    let err = valcast::to_vec_e::<i64>(&json(r#"["1", "2", "x"]"#)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidSyntax);
    assert_eq!(err.path(), &[Segment::Index(2)]);

    let value = json(r#"{"ports": {"http": "80", "https": 443}}"#);
    let ports = valcast::to_map_e::<String, u16>(value.get("ports").unwrap()).unwrap();
    assert_eq!(ports["http"], 80);
    assert_eq!(ports["https"], 443);

    let ids = valcast::to_vec::<u32>(&json("[1, 2.9, \"3\", true, null]"));
    assert_eq!(ids, vec![1, 2, 3, 1, 0]);
}
