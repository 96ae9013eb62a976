//! The fixture CSV schema: a simple fixed-column format used
//! both as a backup written alongside the JSON config document, and as
//! the payload for `POST /api/fixtures/import`.
//!
//! No CSV crate is pulled in for this: the schema is one flat row shape
//! with no quoting or embedded-comma fields, so a hand-rolled
//! split/join is simpler than adapting a general CSV writer/reader to it.

use crate::error::{Error, Result};
use crate::fixture::Fixture;

const HEADER: &[&str] = &[
    "id",
    "enabled",
    "universe",
    "start_addr",
    "pan_coarse",
    "pan_fine",
    "tilt_coarse",
    "tilt_fine",
    "dimmer",
    "zoom",
    "zoom_fine",
    "color_temp_channel",
    "color_temp_value",
    "invert_pan",
    "invert_tilt",
    "pan_bias",
    "tilt_bias",
    "status_led",
];

fn bool_str(b: bool) -> &'static str {
    if b {
        "True"
    } else {
        "False"
    }
}

/// Accepts "True"/"False" (and, leniently, "true"/"false"/"1"/"0") and
/// normalizes to a strict bool.
fn parse_bool(s: &str) -> Result<bool> {
    match s.trim() {
        "True" | "true" | "1" => Ok(true),
        "False" | "false" | "0" => Ok(false),
        other => Err(Error::validation(format!("not a boolean: {}", other))),
    }
}

fn parse_field<T: ::std::str::FromStr>(s: &str, field: &str) -> Result<T> {
    s.trim()
        .parse()
        .map_err(|_| Error::validation(format!("invalid {}: {}", field, s)))
}

pub fn write(fixtures: &[Fixture]) -> String {
    let mut out = String::new();
    out.push_str(&HEADER.join(","));
    out.push('\n');
    for f in fixtures {
        out.push_str(&format!(
            "{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{},{}\n",
            f.id,
            bool_str(f.enabled),
            f.universe,
            f.start_addr,
            f.pan_coarse,
            f.pan_fine,
            f.tilt_coarse,
            f.tilt_fine,
            f.dimmer,
            f.zoom,
            f.zoom_fine,
            f.color_temp_channel,
            f.color_temp_value,
            bool_str(f.invert_pan),
            bool_str(f.invert_tilt),
            f.pan_bias,
            f.tilt_bias,
            f.status_led_slot,
        ));
    }
    out
}

pub fn parse(text: &str) -> Result<Vec<Fixture>> {
    let mut lines = text.lines();
    let header = lines.next().ok_or_else(|| Error::validation("empty CSV"))?;
    let columns: Vec<&str> = header.split(',').map(|c| c.trim()).collect();
    if columns != HEADER {
        return Err(Error::validation("CSV header does not match fixture schema"));
    }

    let mut fixtures = Vec::new();
    for (lineno, line) in lines.enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let fields: Vec<&str> = line.split(',').collect();
        if fields.len() != HEADER.len() {
            return Err(Error::validation(format!(
                "row {}: expected {} columns, got {}",
                lineno + 2,
                HEADER.len(),
                fields.len()
            )));
        }
        fixtures.push(Fixture {
            id: fields[0].trim().to_owned(),
            enabled: parse_bool(fields[1])?,
            universe: parse_field(fields[2], "universe")?,
            start_addr: parse_field(fields[3], "start_addr")?,
            pan_coarse: parse_field(fields[4], "pan_coarse")?,
            pan_fine: parse_field(fields[5], "pan_fine")?,
            tilt_coarse: parse_field(fields[6], "tilt_coarse")?,
            tilt_fine: parse_field(fields[7], "tilt_fine")?,
            dimmer: parse_field(fields[8], "dimmer")?,
            zoom: parse_field(fields[9], "zoom")?,
            zoom_fine: parse_field(fields[10], "zoom_fine")?,
            color_temp_channel: parse_field(fields[11], "color_temp_channel")?,
            color_temp_value: parse_field(fields[12], "color_temp_value")?,
            invert_pan: parse_bool(fields[13])?,
            invert_tilt: parse_bool(fields[14])?,
            pan_bias: parse_field(fields[15], "pan_bias")?,
            tilt_bias: parse_field(fields[16], "tilt_bias")?,
            status_led_slot: parse_field(fields[17], "status_led")?,
        });
    }
    Ok(fixtures)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixture::Fixture;

    fn sample() -> Fixture {
        Fixture {
            id: "F1".into(),
            enabled: true,
            universe: 1,
            start_addr: 1,
            pan_coarse: 1,
            pan_fine: 2,
            tilt_coarse: 3,
            tilt_fine: 4,
            dimmer: 5,
            zoom: 0,
            zoom_fine: 0,
            color_temp_channel: 0,
            color_temp_value: 0,
            invert_pan: false,
            invert_tilt: true,
            pan_bias: -100,
            tilt_bias: 100,
            status_led_slot: 1,
        }
    }

    #[test]
    fn round_trips_through_csv() {
        let fixtures = vec![sample()];
        let text = write(&fixtures);
        let parsed = parse(&text).unwrap();
        assert_eq!(parsed, fixtures);
    }

    #[test]
    fn accepts_lowercase_booleans() {
        let text = "id,enabled,universe,start_addr,pan_coarse,pan_fine,tilt_coarse,tilt_fine,dimmer,zoom,zoom_fine,color_temp_channel,color_temp_value,invert_pan,invert_tilt,pan_bias,tilt_bias,status_led\nF1,true,1,1,1,2,3,4,5,0,0,0,0,false,true,0,0,0\n";
        let parsed = parse(text).unwrap();
        assert_eq!(parsed.len(), 1);
        assert!(parsed[0].enabled);
        assert!(parsed[0].invert_tilt);
    }

    #[test]
    fn rejects_wrong_header() {
        assert!(parse("a,b,c\n1,2,3\n").is_err());
    }
}
