use pretty_assertions::assert_eq;
use rtml::rtml::codec::coords;
use rtml::rtml::codec::timestamp;
use rtml::{Declination, ErrorKind, Period, RightAscension};

/// (text, milliseconds)
const PERIOD_CASES: &[(&str, i64)] = &[
    ("PT0S", 0),
    ("PT1H", 3_600_000),
    ("PT60M", 3_600_000),
    ("PT1.5S", 1_500),
    ("P1D", 86_400_000),
    ("P1DT2H30M15.5S", 95_415_500),
    ("P1M", 30 * 86_400_000),
    ("P1Y", 365 * 86_400_000),
];

const BAD_PERIODS: &[&str] = &["PT", "1H", "P1H", "PT1D", "", "P-1D", "PT1.5M"];

#[test]
fn right_ascension_sexagesimal_round_trip() {
    let ra = RightAscension::parse("00 43 56.61", "hms").expect("valid ra");
    assert_eq!((ra.hours, ra.minutes), (0, 43));
    assert!((ra.seconds - 56.61).abs() < 1e-9);
    assert_eq!(ra.to_string(), "00 43 56.61");

    let padded = RightAscension::parse("  1  2   3.5 ", "hms").expect("loose whitespace");
    assert_eq!(padded.to_string(), "01 02 03.50");
}

#[test]
fn right_ascension_rejects_bad_input() {
    let cases: &[(&str, &str, ErrorKind)] = &[
        ("00 43 56.61", "degrees", ErrorKind::UnitMismatch),
        ("00 43", "hms", ErrorKind::Format),
        ("24 00 00.00", "hms", ErrorKind::Format),
        ("12 60 00.00", "hms", ErrorKind::Format),
        ("12 00 xx", "hms", ErrorKind::Format),
        ("not-a-number", "radians", ErrorKind::Format),
    ];
    for (text, units, expected) in cases {
        let err = RightAscension::parse(text, units).expect_err(text);
        assert_eq!(err.kind(), *expected, "{} [{}]: {}", text, units, err);
    }
}

#[test]
fn right_ascension_seconds_carry_into_minutes_and_hours() {
    assert_eq!(RightAscension::new(1, 59, 59.999).to_string(), "02 00 00.00");
    assert_eq!(RightAscension::new(23, 59, 59.999).to_string(), "00 00 00.00");
    assert_eq!(RightAscension::new(5, 0, 0.004).to_string(), "05 00 00.00");
}

#[test]
fn declination_keeps_negative_zero_degrees() {
    let dec = Declination::parse("-00 43 56.6", "dms").expect("valid dec");
    assert!(dec.negative);
    assert_eq!(dec.degrees, 0);
    assert!(dec.to_degrees() < 0.0);
    assert_eq!(dec.to_string(), "-00 43 56.60");

    let typeset = Declination::parse("\u{2212}12 30 00.00", "dms").expect("unicode minus");
    assert!(typeset.negative);
    assert_eq!(typeset.to_string(), "-12 30 00.00");
}

#[test]
fn declination_requires_a_sign() {
    let err = Declination::parse("41 16 09.00", "dms").expect_err("unsigned");
    assert_eq!(err.kind(), ErrorKind::Format);

    let err = Declination::parse("+91 00 00.00", "dms").expect_err("beyond the pole");
    assert_eq!(err.kind(), ErrorKind::Format);

    for text in ["+90 30 00.00", "-90 00 00.01", "+90 00 59.99"] {
        let err = Declination::parse(text, "dms").expect_err(text);
        assert_eq!(err.kind(), ErrorKind::Format, "{}", text);
    }
    let pole = Declination::parse("-90 00 00.00", "dms").expect("south pole");
    assert_eq!(pole.to_degrees(), -90.0);

    let err = Declination::parse("+41 16 09.00", "hms").expect_err("wrong units");
    assert_eq!(err.kind(), ErrorKind::UnitMismatch);
}

#[test]
fn radians_convert_both_ways() {
    let ra = RightAscension::parse(&std::f64::consts::PI.to_string(), "radians").expect("pi");
    assert_eq!(ra.to_string(), "12 00 00.00");
    assert!((ra.to_radians() - std::f64::consts::PI).abs() < 1e-9);

    let wrapped = RightAscension::from_radians(-std::f64::consts::FRAC_PI_2);
    assert_eq!(wrapped.to_string(), "18 00 00.00");

    let dec = Declination::parse("-0.7853981633974483", "radians").expect("-pi/4");
    assert!(dec.negative);
    assert_eq!(dec.to_string(), "-45 00 00.00");

    let err = Declination::from_radians(2.0).expect_err("beyond the pole");
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn offsets_accept_arcsecond_spellings_only() {
    for units in coords::OFFSET_UNITS {
        assert_eq!(coords::parse_offset("1.50", units).expect(units), 1.5);
    }
    let err = coords::parse_offset("1.50", "degrees").expect_err("degrees");
    assert_eq!(err.kind(), ErrorKind::UnitMismatch);

    let ra = RightAscension::new(0, 0, 0.0).with_offset(-2.5);
    assert_eq!(ra.offset, Some(-2.5));
}

#[test]
fn periods_measure_in_milliseconds() {
    for (text, ms) in PERIOD_CASES {
        let period: Period = text.parse().unwrap_or_else(|e| panic!("{}: {}", text, e));
        assert_eq!(period.milliseconds(), *ms, "{}", text);
    }
}

#[test]
fn period_fields_are_kept() {
    let period: Period = "P1DT2H30M15.5S".parse().expect("valid period");
    assert_eq!(period.days(), 1);
    assert_eq!(period.hours(), 2);
    assert_eq!(period.minutes(), 30);
    assert_eq!(period.seconds(), 15.5);
    assert_eq!(period.years(), 0);
    assert_eq!(period.months(), 0);
    assert_eq!(period.to_string(), "P1DT2H30M15.5S");
}

#[test]
fn periods_compare_by_length() {
    let sixty_minutes: Period = "PT60M".parse().expect("PT60M");
    let one_hour: Period = "PT1H".parse().expect("PT1H");
    assert_eq!(sixty_minutes, one_hour);
    assert_eq!(sixty_minutes.to_string(), "PT60M");
    assert_ne!(one_hour, Period::from_minutes(59));
}

#[test]
fn malformed_periods_are_format_errors() {
    for text in BAD_PERIODS {
        let err = text.parse::<Period>().expect_err(text);
        assert_eq!(err.kind(), ErrorKind::Format, "{:?}", text);
    }
}

#[test]
fn period_formatting() {
    assert_eq!(Period::default().to_string(), "PT0S");
    assert_eq!(Period::from_hours(2).to_string(), "PT2H");

    let period = Period::from_milliseconds(90_061_001);
    assert_eq!(
        (period.days(), period.hours(), period.minutes()),
        (1, 1, 1)
    );
    assert!((period.seconds() - 1.001).abs() < 1e-9);
    assert_eq!(period.to_string(), "P1DT1H1M1.001S");
    assert_eq!(period.milliseconds(), 90_061_001);
}

#[test]
fn formatted_periods_read_back_to_the_same_length() {
    for step in 0..200_000u32 {
        let period = Period {
            days: 1,
            seconds: f64::from(step) / 10_000.0,
            ..Period::default()
        };
        let text = period.to_string();
        let parsed: Period = text.parse().unwrap_or_else(|e| panic!("{}: {}", text, e));
        assert_eq!(
            parsed.milliseconds(),
            period.milliseconds(),
            "{} -> {}",
            period.seconds,
            text
        );
    }
}

#[test]
fn negative_seconds_count_as_zero() {
    let period = Period {
        minutes: 5,
        seconds: -1.0,
        ..Period::default()
    };
    assert_eq!(period.milliseconds(), 300_000);
    assert_eq!(period.to_string(), "PT5M");

    let empty = Period {
        seconds: -1.0,
        ..Period::default()
    };
    assert_eq!(empty.to_string(), "PT0S");
    assert_eq!(empty.to_string().parse::<Period>().expect("PT0S"), Period::default());
}

#[test]
fn timestamps_and_the_never_sentinel() {
    assert_eq!(timestamp::parse("never", "start").expect("never"), None);
    assert_eq!(timestamp::parse(" never ", "start").expect("never"), None);
    assert_eq!(timestamp::format(None), "never");

    let utc = timestamp::parse("2026-10-17T18:00:00Z", "start")
        .expect("valid")
        .expect("not never");
    assert_eq!(timestamp::format(Some(&utc)), "2026-10-17T18:00:00+0000");

    let colon = timestamp::parse("2026-10-17T18:00:00+01:00", "start")
        .expect("valid")
        .expect("not never");
    assert_eq!(timestamp::format(Some(&colon)), "2026-10-17T18:00:00+0100");

    let compact = timestamp::parse("2026-10-17T18:00:00-0530", "start")
        .expect("valid")
        .expect("not never");
    assert_eq!(timestamp::format(Some(&compact)), "2026-10-17T18:00:00-0530");
    assert_eq!(compact.timestamp(), utc.timestamp() + 5 * 3600 + 30 * 60);
}

#[test]
fn bad_timestamps_name_their_field() {
    for text in ["yesterday", "2026-10-17", "2026-13-01T00:00:00+0000", ""] {
        let err = timestamp::parse(text, "end time").expect_err(text);
        assert_eq!(err.kind(), ErrorKind::Format, "{:?}", text);
        assert!(err.to_string().contains("end time"), "{}", err);
    }
}
