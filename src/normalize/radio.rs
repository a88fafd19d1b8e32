use super::skipped;
use crate::api::radio_browser::RawStation;
use crate::error::ServiceError;
use crate::types::RadioStation;

fn text(value: &Option<String>) -> String {
    value.as_deref().map(str::trim).unwrap_or("").to_string()
}

/// Split the directory's comma separated tag string, lowercased, first
/// occurrence wins.
pub fn split_tags(tags: Option<&str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for tag in tags.unwrap_or("").split(',') {
        let tag = tag.trim().to_lowercase();
        if !tag.is_empty() && !out.contains(&tag) {
            out.push(tag);
        }
    }
    out
}

/// Normalize one directory entry. Stations without a playable stream are
/// skipped.
pub fn normalize_station(raw: &RawStation) -> Result<RadioStation, ServiceError> {
    if raw.stationuuid.trim().is_empty() {
        return Err(skipped("", "missing station uuid"));
    }

    let stream_url = [&raw.url_resolved, &raw.url]
        .into_iter()
        .filter_map(|u| u.as_deref().map(str::trim))
        .find(|u| !u.is_empty())
        .ok_or_else(|| skipped(&raw.stationuuid, "no stream url"))?
        .to_string();

    let name = raw.name.trim();

    Ok(RadioStation {
        id: raw.stationuuid.trim().to_string(),
        name: if name.is_empty() {
            "Unnamed station".to_string()
        } else {
            name.to_string()
        },
        stream_url,
        homepage: text(&raw.homepage),
        favicon: text(&raw.favicon),
        tags: split_tags(raw.tags.as_deref()),
        country: text(&raw.country),
        country_code: text(&raw.countrycode).to_uppercase(),
        codec: text(&raw.codec).to_uppercase(),
        bitrate: raw.bitrate.unwrap_or(0),
        votes: raw.votes.unwrap_or(0),
    })
}

pub fn normalize_stations(raw: &[RawStation]) -> Vec<RadioStation> {
    raw.iter()
        .filter_map(|s| match normalize_station(s) {
            Ok(station) => Some(station),
            Err(err) => {
                log::debug!("{}", err);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn station(json: serde_json::Value) -> RawStation {
        serde_json::from_value(json).unwrap()
    }

    #[test]
    fn test_normalize_station() {
        let raw = station(serde_json::json!({
            "stationuuid": "9617a958-0601-11e8-ae97-52543be04c81",
            "name": " Radio Guerrilla ",
            "url": "http://live.guerrillaradio.ro:8010/guerrilla.aac",
            "url_resolved": "https://live.guerrillaradio.ro:8443/guerrilla.aac",
            "homepage": "https://www.guerrillaradio.ro/",
            "tags": "rock, Alternative,rock,,indie",
            "country": "Romania",
            "countrycode": "ro",
            "codec": "aac",
            "bitrate": 128,
            "votes": 4321
        }));
        let n = normalize_station(&raw).unwrap();
        assert_eq!(n.name, "Radio Guerrilla");
        assert_eq!(n.stream_url, "https://live.guerrillaradio.ro:8443/guerrilla.aac");
        assert_eq!(n.tags, vec!["rock", "alternative", "indie"]);
        assert_eq!(n.country_code, "RO");
        assert_eq!(n.codec, "AAC");
        assert_eq!(n.favicon, "");
        assert_eq!(n.bitrate, 128);
    }

    #[test]
    fn test_falls_back_to_unresolved_url() {
        let raw = station(serde_json::json!({
            "stationuuid": "s1",
            "name": "",
            "url": "http://stream.example/live",
            "url_resolved": ""
        }));
        let n = normalize_station(&raw).unwrap();
        assert_eq!(n.stream_url, "http://stream.example/live");
        assert_eq!(n.name, "Unnamed station");
    }

    #[test]
    fn test_stations_without_stream_are_dropped() {
        let raw = vec![
            station(serde_json::json!({"stationuuid": "a", "name": "A", "url": "http://a"})),
            station(serde_json::json!({"stationuuid": "b", "name": "B"})),
            station(serde_json::json!({"name": "C", "url": "http://c"})),
        ];
        let stations = normalize_stations(&raw);
        assert_eq!(stations.len(), 1);
        assert_eq!(stations[0].id, "a");
    }
}
