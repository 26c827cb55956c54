use chrono::{DateTime, TimeZone, Utc};
use compliance_poller::timestamp::{
    format_canonical, is_canonical, normalize, parse_canonical, resolve, TimestampError,
};

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2013, 11, 15, 17, 16, 0).unwrap()
}

#[test]
fn test_ninety_minutes_back() {
    assert_eq!(normalize("90m", now()).unwrap(), "201311151546");
}

#[test]
fn test_twenty_four_hours_back() {
    let now = Utc.with_ymd_and_hms(2013, 11, 20, 12, 0, 0).unwrap();
    assert_eq!(normalize("24h", now).unwrap(), "201311191200");
}

#[test]
fn test_canonical_input_is_identity() {
    for value in ["201311151546", "200001010000", "209912312359"] {
        assert_eq!(normalize(value, now()).unwrap(), value);
    }
}

#[test]
fn test_equivalent_offsets_agree() {
    let now = now();
    assert_eq!(normalize("90m", now).unwrap(), normalize("1.5h", now).unwrap());
    assert_eq!(normalize("24h", now).unwrap(), normalize("1d", now).unwrap());
    assert_eq!(normalize("1440M", now).unwrap(), normalize("1D", now).unwrap());
    assert_eq!(normalize("0m", now).unwrap(), format_canonical(now));
}

#[test]
fn test_larger_offsets_are_earlier() {
    let now = now();
    let mut previous = normalize("0m", now).unwrap();
    for minutes in 1..=180 {
        let current = normalize(&format!("{minutes}m"), now).unwrap();
        assert!(current < previous, "{minutes}m did not move backwards");
        previous = current;
    }
}

#[test]
fn test_iso_and_short_forms_agree() {
    let now = now();
    let iso = normalize("2013-11-15T17:16:42.000Z", now).unwrap();
    let short = normalize("2013-11-15 17:16", now).unwrap();
    assert_eq!(iso, "201311151716");
    assert_eq!(iso, short);
}

#[test]
fn test_iso_offset_converted_to_utc() {
    assert_eq!(
        normalize("2013-11-15T18:16:00+01:00", now()).unwrap(),
        "201311151716"
    );
}

#[test]
fn test_zoned_layouts_accepted() {
    for input in [
        "2013-11-15T17:16:42.000+0000",
        "2013-11-15T17:16:42+00:00",
        "2013-11-15 17:16:42.000+0000",
        "2013-11-15 17:16:42 +0000",
        "2013-11-15T17:16Z",
        "2013-11-15T17:16+0000",
        "2013-11-15 17:16 +00:00",
        "2013-11-15T17:16:42.000Z",
    ] {
        assert_eq!(normalize(input, now()).unwrap(), "201311151716", "{input}");
    }
}

#[test]
fn test_basic_offset_converted_to_utc() {
    assert_eq!(
        normalize("2013-11-15T12:16:42.000-0500", now()).unwrap(),
        "201311151716"
    );
    assert_eq!(
        normalize("2013-11-15T18:46+0130", now()).unwrap(),
        "201311151716"
    );
}

#[test]
fn test_result_is_always_canonical() {
    let now = now();
    for input in [
        "90m",
        "2h",
        "3d",
        "201311151546",
        "2013-11-15 15:46",
        "2013-11-15T15:46:00Z",
    ] {
        let value = normalize(input, now).unwrap();
        assert!(is_canonical(&value), "{input} -> {value}");
        assert!(parse_canonical(&value).is_ok());
    }
}

#[test]
fn test_unparseable_inputs() {
    for input in ["", "soon", "2013", "2013-11-15", "-5m", "xh", "20131115154"] {
        assert!(
            matches!(
                normalize(input, now()),
                Err(TimestampError::UnparseableTimestamp { .. })
            ),
            "{input:?} should be rejected"
        );
    }
}

#[test]
fn test_resolve_returns_instant() {
    assert_eq!(
        resolve("90m", now()).unwrap(),
        Utc.with_ymd_and_hms(2013, 11, 15, 15, 46, 0).unwrap()
    );
}
