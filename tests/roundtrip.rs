use pretty_assertions::assert_eq;
use rtml::rtml::codec::timestamp;
use rtml::rtml::device::{Detector, Device, Grating, HalfWavePlate, RotorSpeed, Wavelength, WavelengthUnits};
use rtml::rtml::models::{
    Aperture, Contact, History, HistoryEntry, IntelligentAgent, Length, Location, Project, Score,
    Telescope,
};
use rtml::rtml::observation::{ImageType, Magnitude, ObjectList};
use rtml::rtml::schedule::{
    AirmassConstraint, CloudCover, DEFAULT_PRIORITY, ExtinctionConstraint, MoonConstraint,
    SeeingConstraint, SeriesConstraint, SkyBrightness, SkyConstraint, TimeWindow,
};
use rtml::{
    Declination, ErrorKind, Exposure, ImageData, Observation, Period, RequestKind, RightAscension,
    RtmlConfig, RtmlDocument, RtmlEngine, RtmlVersion, Schedule, Target, TargetKind, Timestamp,
};

fn ts(text: &str) -> Timestamp {
    timestamp::parse(text, "test timestamp")
        .expect("valid timestamp")
        .expect("not never")
}

fn round_trip(document: &RtmlDocument) -> RtmlDocument {
    let bytes = rtml::create(document).expect("document should serialise");
    let (parsed, diagnostics) = RtmlEngine::default()
        .parse_bytes_with_diagnostics(&bytes)
        .expect("serialised document should parse");
    assert!(
        diagnostics.is_clean(),
        "{:?}\n{}",
        diagnostics,
        String::from_utf8_lossy(&bytes)
    );
    parsed
}

fn m31() -> Target {
    Target {
        kind: TargetKind::Normal,
        ident: Some("SingleExposure".to_string()),
        name: Some("M31".to_string()),
        ra: Some(RightAscension::new(0, 42, 44.3)),
        dec: Some(Declination::new(false, 41, 16, 9.0)),
        equinox: Some("J2000".to_string()),
        magnitude: Some(Magnitude {
            value: 3.44,
            filter: Some("R".to_string()),
            error: Some(0.1),
        }),
    }
}

fn full_v22_document() -> RtmlDocument {
    let observation = Observation {
        device: Some(Device::camera("B")),
        target: Target {
            kind: TargetKind::Toop,
            ..m31()
        },
        schedule: Schedule {
            priority: 1,
            exposure: Exposure::time(30.0, "seconds", 2),
            time_window: Some(TimeWindow {
                start: Some(ts("2026-10-17T18:00:00+0000")),
                end: Some(ts("2026-10-18T06:00:00+0100")),
            }),
            series: Some(SeriesConstraint {
                count: 3,
                interval: Some(Period::from_hours(2)),
                tolerance: Some(Period::from_minutes(15)),
            }),
            seeing: Some(SeeingConstraint {
                minimum: Some(0.5),
                maximum: Some(1.3),
            }),
            moon: Some(MoonConstraint::degrees(30.0)),
            sky: Some(SkyConstraint::Brightness(SkyBrightness::Dark)),
            ..Schedule::default()
        },
        image_data: vec![ImageData {
            image_type: ImageType::Fits16,
            fits_header: Some("SIMPLE  =                    T".to_string()),
            object_list: Some(ObjectList::votable_url("http://example.org/frame.votable")),
            url: Some("http://example.org/frame.fits".to_string()),
        }],
    };

    RtmlDocument {
        version: RtmlVersion::V22,
        kind: RequestKind::Update,
        contact: Some(Contact {
            pi: true,
            name: Some("Jo Observer".to_string()),
            user: Some("TEST/observer".to_string()),
            institution: Some("Example Observatory".to_string()),
            address: Some("1 Dome Road".to_string()),
            telephone: Some("+44 0000 000000".to_string()),
            fax: Some("+44 0000 000001".to_string()),
            email: Some("jo@example.org".to_string()),
            url: Some("http://example.org/~jo".to_string()),
        }),
        project: Some(Project::new("agent_test")),
        telescope: Some(Telescope {
            name: Some("FTN".to_string()),
            aperture: Some(Aperture {
                value: 2.0,
                units: "meters".to_string(),
                kind: Some("geometric".to_string()),
            }),
            focal_length: Some(Length {
                value: 20.0,
                units: "meters".to_string(),
            }),
            focal_ratio: Some("f/10".to_string()),
            location: None,
        }),
        agent: Some(IntelligentAgent {
            id: Some("000123:UA:v1-24:run#6:user#agent".to_string()),
            hostname: Some("agent.example.org".to_string()),
            port: Some(8000),
            uri: None,
        }),
        device: Some(Device {
            kind: Some("camera".to_string()),
            name: Some("EM01".to_string()),
            spectral_region: Some("optical".to_string()),
            filter: Some("R".to_string()),
            detector: Some(Detector::binned(2, 2)),
            ..Device::default()
        }),
        observations: vec![observation],
        score: Some(0.75),
        scores: vec![
            Score {
                delay: Period::from_hours(1),
                probability: 0.5,
                cumulative: 0.5,
            },
            Score {
                delay: Period::from_milliseconds(90_061_000),
                probability: 0.25,
                cumulative: 0.625,
            },
        ],
        completion_time: Some(ts("2026-10-18T07:30:00+0000")),
        ..RtmlDocument::default()
    }
}

fn full_v31_document() -> RtmlDocument {
    let grb = Observation {
        device: None,
        target: Target {
            kind: TargetKind::Toop,
            ident: Some("GRB261017".to_string()),
            name: Some("GRB 261017A".to_string()),
            ra: Some(RightAscension::new(0, 43, 56.61).with_offset(1.5)),
            dec: Some(Declination::new(true, 0, 43, 56.6).with_offset(-0.25)),
            equinox: Some("J2000".to_string()),
            magnitude: None,
        },
        schedule: Schedule {
            priority: 0,
            exposure: Exposure::time(60.0, "seconds", 3),
            time_window: Some(TimeWindow {
                start: Some(ts("2026-10-17T20:00:00+0000")),
                end: None,
            }),
            series: Some(SeriesConstraint {
                count: 4,
                interval: Some(Period::from_hours(1)),
                tolerance: Some(Period::from_minutes(10)),
            }),
            seeing: Some(SeeingConstraint {
                minimum: None,
                maximum: Some(1.5),
            }),
            moon: Some(MoonConstraint::degrees(15.0)),
            sky: Some(SkyConstraint::Flux {
                value: 21.5,
                units: "mag/arcsec2".to_string(),
            }),
            airmass: Some(AirmassConstraint {
                minimum: Some(1.0),
                maximum: Some(2.0),
            }),
            extinction: Some(ExtinctionConstraint {
                clouds: CloudCover::Light,
            }),
        },
        image_data: vec![
            ImageData {
                image_type: ImageType::Fits16,
                fits_header: Some("SIMPLE  =                    T".to_string()),
                object_list: Some(ObjectList::cluster("1 10.9859 -0.7324 17.20")),
                url: Some("http://example.org/frames/a.fits".to_string()),
            },
            ImageData::from_url("http://example.org/frames/b.jpg"),
        ],
    };

    let polarimetry = Observation {
        device: Some(Device {
            kind: Some("polarimeter".to_string()),
            half_wave_plate: Some(HalfWavePlate {
                rotor_speed: RotorSpeed::Fast,
            }),
            ..Device::default()
        }),
        target: Target::named("Vega"),
        schedule: Schedule {
            priority: 2,
            exposure: Exposure::snr(50.0),
            sky: Some(SkyConstraint::Brightness(SkyBrightness::Grey)),
            ..Schedule::default()
        },
        image_data: Vec::new(),
    };

    RtmlDocument {
        version: RtmlVersion::V31,
        kind: RequestKind::Request,
        uid: Some("req-0007".to_string()),
        contact: Some(Contact {
            name: Some("Jo Observer".to_string()),
            user: Some("jobs".to_string()),
            email: Some("jo@example.org".to_string()),
            ..Contact::default()
        }),
        project: Some(Project::new("survey-7")),
        telescope: Some(Telescope {
            name: Some("LT".to_string()),
            aperture: Some(Aperture {
                value: 2.0,
                units: "meters".to_string(),
                kind: None,
            }),
            focal_length: None,
            focal_ratio: None,
            location: Some(Location {
                name: Some("ORM".to_string()),
                latitude: 28.7624,
                longitude: -17.8792,
                altitude: 2363.0,
            }),
        }),
        agent: Some(IntelligentAgent {
            uri: Some("http://agent.example.org:8080/".to_string()),
            ..IntelligentAgent::default()
        }),
        device: Some(Device {
            kind: Some("spectrograph".to_string()),
            name: Some("SPRAT".to_string()),
            spectral_region: Some("optical".to_string()),
            filter: None,
            detector: Some(Detector {
                row_binning: 2,
                column_binning: 1,
                gain: Some(2.1),
            }),
            grating: Some(Grating {
                name: Some("blue".to_string()),
                wavelength: Some(Wavelength {
                    value: 550.0,
                    units: WavelengthUnits::Nanometers,
                }),
                resolution: Some(350.0),
                angle: Some(12.5),
            }),
            half_wave_plate: None,
        }),
        target: Some(Target {
            ident: Some("default".to_string()),
            ..m31()
        }),
        observations: vec![grb, polarimetry],
        score: Some(0.25),
        scores: vec![Score {
            delay: Period::from_hours(1),
            probability: 0.5,
            cumulative: 0.5,
        }],
        history: Some(History {
            entries: vec![
                HistoryEntry {
                    timestamp: Some(ts("2026-10-17T19:00:00+0000")),
                    agent_name: Some("scheduler".to_string()),
                    agent_uri: Some("http://node.example.org/".to_string()),
                    description: Some("Queued".to_string()),
                    ..HistoryEntry::default()
                },
                HistoryEntry {
                    timestamp: Some(ts("2026-10-17T19:05:00+0000")),
                    rejection_reason: Some("insufficient time".to_string()),
                    error: Some("retry later".to_string()),
                    ..HistoryEntry::default()
                },
            ],
        }),
        ..RtmlDocument::default()
    }
}

#[test]
fn rtml22_document_survives_a_round_trip() {
    let document = full_v22_document();
    assert_eq!(round_trip(&document), document);
}

#[test]
fn rtml31_document_survives_a_round_trip() {
    let document = full_v31_document();
    assert_eq!(round_trip(&document), document);
}

#[test]
fn empty_documents_round_trip() {
    for version in [RtmlVersion::V22, RtmlVersion::V31] {
        let document = RtmlDocument::new(version, RequestKind::ScoreInquiry);
        assert_eq!(round_trip(&document), document);
    }
}

#[test]
fn to_version_moves_identity_and_priorities() {
    let mut document = full_v22_document();
    let mut normal = document.observations[0].clone();
    normal.target.kind = TargetKind::Normal;
    normal.schedule.priority = 0;
    document.observations[0].schedule.priority = 5;
    document.observations.push(normal);

    let v31 = document.to_version(RtmlVersion::V31);
    assert_eq!(v31.version, RtmlVersion::V31);
    assert_eq!(v31.uid.as_deref(), Some("000123:UA:v1-24:run#6:user#agent"));
    let agent = v31.agent.as_ref().expect("agent");
    assert_eq!(agent.id, None);
    assert_eq!(agent.uri.as_deref(), Some("http://agent.example.org:8000/"));
    assert_eq!(v31.observations[0].schedule.priority, 0);
    assert_eq!(v31.observations[1].schedule.priority, DEFAULT_PRIORITY);

    let reread = round_trip(&v31);
    assert_eq!(reread.observations[0].target.kind, TargetKind::Toop);
    assert_eq!(reread.observations[1].target.kind, TargetKind::Normal);

    let back = v31.to_version(RtmlVersion::V22);
    assert_eq!(back.uid, None);
    assert_eq!(back.uid(), Some("000123:UA:v1-24:run#6:user#agent"));
}

#[test]
fn to_version_is_a_no_op_for_the_same_version() {
    let document = full_v31_document();
    assert_eq!(document.clone().to_version(RtmlVersion::V31), document);
}

#[test]
fn prolog_follows_the_dialect_and_config() {
    let engine = RtmlEngine::default();

    let v22 = engine.create_string(&full_v22_document()).expect("2.2 output");
    assert!(v22.starts_with("<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>\n"));
    assert!(v22.contains(r#"<!DOCTYPE RTML SYSTEM "http://www.estar.org.uk/documents/rtml2.2.dtd">"#));
    assert!(v22.contains(r#"<RTML version="2.2" type="update">"#));

    let v31 = engine.create_string(&full_v31_document()).expect("3.1a output");
    assert!(!v31.contains("<!DOCTYPE"));
    assert!(v31.contains(r#"xmlns="http://www.rtml.org/v3.1a""#));
    assert!(v31.contains(r#"xmlns:xsi="http://www.w3.org/2001/XMLSchema-instance""#));
    assert!(v31.contains(
        r#"xsi:schemaLocation="http://www.rtml.org/v3.1a http://telescope.livjm.ac.uk/rtml/RTML-nightly.xsd""#
    ));

    let custom = RtmlEngine::new(
        RtmlConfig::default()
            .with_doctype_system_id("file:///opt/rtml/rtml2.2.dtd")
            .with_schema_location("http://www.rtml.org/v3.1a file:///opt/rtml/RTML-3.1a.xsd"),
    );
    let v22 = custom.create_string(&full_v22_document()).expect("2.2 output");
    assert!(v22.contains(r#"<!DOCTYPE RTML SYSTEM "file:///opt/rtml/rtml2.2.dtd">"#));
    let v31 = custom.create_string(&full_v31_document()).expect("3.1a output");
    assert!(v31.contains(r#"xsi:schemaLocation="http://www.rtml.org/v3.1a file:///opt/rtml/RTML-3.1a.xsd""#));
}

#[test]
fn single_exposures_omit_their_count() {
    let mut document = full_v22_document();
    document.observations[0].schedule.exposure = Exposure::time(500.0, "ms", 1);
    let v22 = rtml::RtmlEngine::default().create_string(&document).expect("2.2 output");
    assert!(!v22.contains("<Count>1</Count>"), "{}", v22);
    assert!(v22.contains("<Count>3</Count>"), "series count is still written");

    let mut document = full_v31_document();
    document.observations[0].schedule.exposure = Exposure::time(500.0, "ms", 1);
    let v31 = RtmlEngine::default().create_string(&document).expect("3.1a output");
    assert!(!v31.contains("<Exposure count="), "{}", v31);
    assert!(v31.contains(r#"<ExposureTime units="ms">500</ExposureTime>"#));
}

#[test]
fn nan_probabilities_are_written_literally() {
    let mut document = full_v22_document();
    document.scores[0].probability = f64::NAN;
    let text = RtmlEngine::default().create_string(&document).expect("2.2 output");
    assert!(text.contains(r#"probability="NaN""#), "{}", text);

    let parsed = rtml::parse(text.as_bytes()).expect("NaN reads back");
    assert!(parsed.scores[0].probability.is_nan());
    assert_eq!(parsed.scores[0].cumulative, 0.5);
}

#[test]
fn writer_rejects_what_the_reader_would_reject() {
    let mut radians = full_v31_document();
    radians.observations[0].schedule.moon = Some(MoonConstraint {
        distance: 0.5,
        units: "radians".to_string(),
    });
    let err = rtml::create(&radians).expect_err("radians moon distance");
    assert_eq!(err.kind(), ErrorKind::UnitMismatch);
    assert!(err.to_string().contains("observation #1"), "{}", err);

    let mut fortnights = full_v22_document();
    fortnights.observations[0].schedule.exposure = Exposure::time(1.0, "fortnights", 1);
    let err = rtml::create(&fortnights).expect_err("unknown time unit");
    assert_eq!(err.kind(), ErrorKind::UnitMismatch);

    let mut none = full_v22_document();
    none.observations[0].schedule.exposure.count = 0;
    let err = rtml::create(&none).expect_err("zero exposures");
    assert_eq!(err.kind(), ErrorKind::Format);
}

#[test]
fn zero_sized_optics_are_left_out() {
    let mut document = full_v22_document();
    if let Some(telescope) = document.telescope.as_mut() {
        telescope.aperture = Some(Aperture {
            value: 0.0,
            units: "meters".to_string(),
            kind: None,
        });
        telescope.focal_length = Some(Length::default());
    }
    let text = RtmlEngine::default().create_string(&document).expect("2.2 output");
    assert!(!text.contains("<Aperture"), "{}", text);
    assert!(!text.contains("<FocalLength"), "{}", text);

    let telescope = rtml::parse(text.as_bytes())
        .expect("reads back")
        .telescope
        .expect("telescope");
    assert_eq!(telescope.aperture, None);
    assert_eq!(telescope.focal_length, None);
}

#[test]
fn output_is_latin1_with_character_references() {
    let mut document = RtmlDocument::new(RtmlVersion::V31, RequestKind::Request);
    document.contact = Some(Contact {
        name: Some("Zo\u{eb} \u{3a9}".to_string()),
        ..Contact::default()
    });

    let bytes = rtml::create(&document).expect("serialises");
    assert!(bytes.contains(&0xEB), "e-diaeresis is a single Latin-1 byte");
    let ascii = String::from_utf8_lossy(&bytes);
    assert!(ascii.contains("&#937;"), "{}", ascii);

    let parsed = rtml::parse(&bytes).expect("reads back");
    assert_eq!(
        parsed.contact.and_then(|c| c.name).as_deref(),
        Some("Zo\u{eb} \u{3a9}")
    );
}

#[test]
fn output_never_uses_the_c1_byte_range() {
    let name = "O\u{2019}Brien \u{20ac}5 \u{201c}M31\u{201d} \u{2013} \u{2122} \u{a0}\u{ff}";
    for version in [RtmlVersion::V22, RtmlVersion::V31] {
        let mut document = RtmlDocument::new(version, RequestKind::Request);
        document.contact = Some(Contact {
            name: Some(name.to_string()),
            ..Contact::default()
        });

        let bytes = rtml::create(&document).expect("serialises");
        assert!(
            !bytes.iter().any(|b| (0x80..=0x9F).contains(b)),
            "{:?}",
            String::from_utf8_lossy(&bytes)
        );

        let latin1: String = bytes.iter().map(|&b| char::from(b)).collect();
        assert!(latin1.starts_with("<?xml version=\"1.0\" encoding=\"ISO-8859-1\"?>"));
        assert!(
            latin1.contains("O&#8217;Brien &#8364;5 &#8220;M31&#8221; &#8211; &#8482; \u{a0}\u{ff}"),
            "{}",
            latin1
        );

        let parsed = rtml::parse(&bytes).expect("reads back");
        assert_eq!(parsed.contact.and_then(|c| c.name).as_deref(), Some(name));
    }
}

#[test]
fn error_strings_belong_to_error_kinds() {
    for version in [RtmlVersion::V22, RtmlVersion::V31] {
        let mut reject = RtmlDocument::new(version, RequestKind::Reject);
        reject.project = Some(Project::new("agent_test"));
        reject.error_string = Some("Telescope <closed> for maintenance & repair".to_string());
        assert_eq!(round_trip(&reject), reject);

        let mut request = RtmlDocument::new(version, RequestKind::Request);
        request.error_string = Some("not carried".to_string());
        assert_eq!(round_trip(&request).error_string, None);
    }
}

#[test]
fn lossy_fields_are_dropped_when_translating_down() {
    let document = full_v31_document().to_version(RtmlVersion::V22);
    let parsed = round_trip(&document);

    assert_eq!(parsed.history, None);
    assert_eq!(parsed.target, None);
    assert_eq!(parsed.uid(), Some("req-0007"));
    assert_eq!(parsed.telescope.and_then(|t| t.location), None);

    let device = parsed.device.expect("device");
    assert_eq!(device.grating, None);
    assert_eq!(device.detector.and_then(|d| d.gain), None);

    let schedule = &parsed.observations[0].schedule;
    assert_eq!(schedule.airmass, None);
    assert_eq!(schedule.extinction, None);
    assert_eq!(schedule.sky, None);
    assert_eq!(schedule.series.as_ref().map(|s| s.count), Some(4));
    assert_eq!(parsed.observations[1].schedule.exposure, Exposure::snr(50.0));
}
