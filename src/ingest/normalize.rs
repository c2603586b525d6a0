// src/ingest/normalize.rs
//
// Maps heterogeneous upstream records into `NormalizedEvent`, dropping rows
// without usable coordinates. Field-name chains per schema are documented on
// the row mappers below.

use serde_json::Value;

use crate::ingest::types::{NormalizedEvent, RawEventRecord, SourceSchema};

pub const UNKNOWN_EVENT: &str = "Unknown Event";
pub const UNKNOWN_LOCATION: &str = "Unknown";

const TITLE_MAX_CHARS: usize = 200;

// GDELT v2 event-table export column positions (61-column layout).
mod tsv_col {
    pub const SQLDATE: usize = 1;
    pub const ACTOR1_NAME: usize = 6;
    pub const ACTOR2_NAME: usize = 16;
    pub const EVENT_CODE: usize = 26;
    pub const AVG_TONE: usize = 34;
    pub const ACTOR1_GEO_FULLNAME: usize = 36;
    pub const ACTOR1_GEO_LAT: usize = 40;
    pub const ACTOR1_GEO_LONG: usize = 41;
    pub const ACTION_GEO_FULLNAME: usize = 52;
    pub const ACTION_GEO_LAT: usize = 56;
    pub const ACTION_GEO_LONG: usize = 57;
    pub const SOURCE_URL: usize = 60;
}

/// Normalize a batch of raw records under the given schema tag. Records
/// missing a coercible latitude or longitude are excluded entirely; they are
/// never defaulted to (0, 0), which would mislocate them on the globe.
/// Output ids are batch-local ordinals.
pub fn normalize(schema: SourceSchema, raw: &[RawEventRecord]) -> Vec<NormalizedEvent> {
    let row: fn(&Value) -> Option<NormalizedEvent> = match schema {
        SourceSchema::GdeltEvents => gdelt_event_row,
        SourceSchema::GdeltTsv => gdelt_tsv_row,
        SourceSchema::AcledGeoJson => acled_feature_row,
    };
    let mut out: Vec<NormalizedEvent> = raw.iter().filter_map(row).collect();
    for (i, ev) in out.iter_mut().enumerate() {
        ev.id = i as u32;
    }
    out
}

/// GDELT events JSON row. Title: Actor1Name > Actor2Name > EventCode.
/// Coordinates: the ActionGeo pair, else the Actor1Geo pair — pairwise, so
/// a half-usable primary pair falls through instead of mixing geographies.
/// Lat/lon arrive as strings or numbers depending on the API day.
fn gdelt_event_row(v: &Value) -> Option<NormalizedEvent> {
    let (latitude, longitude) = [
        ("ActionGeo_Lat", "ActionGeo_Long"),
        ("Actor1Geo_Lat", "Actor1Geo_Long"),
    ]
    .iter()
    .find_map(|(la, lo)| Some((coerce_f64(v.get(la))?, coerce_f64(v.get(lo))?)))?;

    let title = text_chain(v, &["Actor1Name", "Actor2Name", "EventCode"], UNKNOWN_EVENT);
    let location = text_chain(
        v,
        &["ActionGeo_FullName", "Actor1Geo_FullName"],
        UNKNOWN_LOCATION,
    );
    let date = string_value(pick(v, &["SQLDATE", "DATEADDED"])).unwrap_or_default();

    Some(NormalizedEvent {
        id: 0,
        title,
        latitude,
        longitude,
        location,
        date,
        fatalities: None,
        tone: coerce_f64(pick(v, &["AvgTone"])),
        url: string_value(pick(v, &["SOURCEURL"])),
        event_type: string_value(pick(v, &["EventCode"])),
    })
}

/// GDELT export row: a positional array of strings. Every column is present
/// (often empty) in a full-width row, so the coordinate fallback goes by
/// coercion, pairwise; rows narrower than the coordinate columns drop out.
fn gdelt_tsv_row(v: &Value) -> Option<NormalizedEvent> {
    let cols = v.as_array()?;
    let col = |i: usize| cols.get(i);

    let (latitude, longitude) = [
        (tsv_col::ACTION_GEO_LAT, tsv_col::ACTION_GEO_LONG),
        (tsv_col::ACTOR1_GEO_LAT, tsv_col::ACTOR1_GEO_LONG),
    ]
    .iter()
    .find_map(|&(la, lo)| Some((coerce_f64(col(la))?, coerce_f64(col(lo))?)))?;

    let title = [tsv_col::ACTOR1_NAME, tsv_col::ACTOR2_NAME, tsv_col::EVENT_CODE]
        .iter()
        .find_map(|&i| non_empty(string_value(col(i))))
        .map(|s| scrub_title(&s))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| UNKNOWN_EVENT.to_string());
    let location = [tsv_col::ACTION_GEO_FULLNAME, tsv_col::ACTOR1_GEO_FULLNAME]
        .iter()
        .find_map(|&i| non_empty(string_value(col(i))))
        .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());

    Some(NormalizedEvent {
        id: 0,
        title,
        latitude,
        longitude,
        location,
        date: string_value(col(tsv_col::SQLDATE)).unwrap_or_default(),
        fatalities: None,
        tone: coerce_f64(col(tsv_col::AVG_TONE)),
        url: non_empty(string_value(col(tsv_col::SOURCE_URL))),
        event_type: non_empty(string_value(col(tsv_col::EVENT_CODE))),
    })
}

/// ACLED-style GeoJSON feature: coordinates under `geometry.coordinates`
/// as `[lon, lat]`, everything else under `properties`. Fatalities arrive
/// as strings in CSV-derived exports and as numbers in native ones.
fn acled_feature_row(v: &Value) -> Option<NormalizedEvent> {
    let coords = v.get("geometry")?.get("coordinates")?.as_array()?;
    let longitude = coerce_f64(coords.first())?;
    let latitude = coerce_f64(coords.get(1))?;

    let props = v.get("properties").unwrap_or(&Value::Null);
    let title = text_chain(props, &["actor1", "event_type"], UNKNOWN_EVENT);
    let location = text_chain(props, &["location", "country"], UNKNOWN_LOCATION);

    Some(NormalizedEvent {
        id: 0,
        title,
        latitude,
        longitude,
        location,
        date: string_value(pick(props, &["event_date", "date"])).unwrap_or_default(),
        fatalities: coerce_u32(pick(props, &["fatalities"])),
        tone: None,
        url: non_empty(string_value(pick(props, &["source_url", "link"]))),
        event_type: non_empty(string_value(pick(props, &["sub_event_type", "event_type"]))),
    })
}

/// Scrub a display title: decode HTML entities, strip tags, collapse
/// whitespace, cap length. Upstream titles are occasionally raw article
/// fragments with markup in them.
pub fn scrub_title(s: &str) -> String {
    let mut out = html_escape::decode_html_entities(s).to_string();

    static RE_TAGS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_tags = RE_TAGS.get_or_init(|| regex::Regex::new(r"(?is)</?[^>]+>").unwrap());
    out = re_tags.replace_all(&out, "").to_string();

    static RE_WS: once_cell::sync::OnceCell<regex::Regex> = once_cell::sync::OnceCell::new();
    let re_ws = RE_WS.get_or_init(|| regex::Regex::new(r"\s+").unwrap());
    out = re_ws.replace_all(&out, " ").trim().to_string();

    if out.chars().count() > TITLE_MAX_CHARS {
        out = out.chars().take(TITLE_MAX_CHARS).collect();
    }
    out
}

/// First present value among `keys` on a JSON object.
fn pick<'a>(v: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    keys.iter().find_map(|k| v.get(k))
}

/// First key that yields non-empty text, scrubbed; else the placeholder.
fn text_chain(v: &Value, keys: &[&str], placeholder: &str) -> String {
    keys.iter()
        .find_map(|k| non_empty(string_value(v.get(k))))
        .map(|s| scrub_title(&s))
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| placeholder.to_string())
}

/// Lenient float coercion: JSON numbers pass through, numeric strings are
/// parsed, anything else (null, empty, garbage, non-finite) is "missing".
fn coerce_f64(v: Option<&Value>) -> Option<f64> {
    let v = v?;
    let f = match v {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    f.is_finite().then_some(f)
}

fn coerce_u32(v: Option<&Value>) -> Option<u32> {
    let v = v?;
    match v {
        Value::Number(n) => n.as_u64().and_then(|x| u32::try_from(x).ok()),
        Value::String(s) => s.trim().parse::<u32>().ok(),
        _ => None,
    }
}

/// String view of a scalar: strings as-is, numbers rendered (SQLDATE shows
/// up both ways across GDELT responses).
fn string_value(v: Option<&Value>) -> Option<String> {
    match v? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
