//! Loader for directories of Censys JSON record files.
//!
//! Each file holds one JSON array whose elements are either record objects
//! or strings wrapping a JSON-encoded record (the shape the upstream export
//! tooling writes); plain NDJSON loads too. Files are visited in sorted
//! name order, so when an identifier repeats across files the banner from
//! the last file wins deterministically.

use std::fs;
use std::path::{Path, PathBuf};

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine;
use serde::Deserialize;
use serde_json::Value;

use botcensus_core::error::Malformed;
use botcensus_core::types::{
    is_telnet_port, valid_identifier, CensysCatalog, CensysVersion, DeviceObservation,
};

use crate::error::Result;

/// One record as it appears on disk. Field types are deliberately loose
/// because upstream exports drift between numbers and strings.
#[derive(Debug, Clone, Deserialize)]
pub struct CensysRecord {
    /// Raw value so non-string identifiers are rejected, not coerced.
    ip: Option<Value>,
    /// v2: every open port on the host.
    ports: Option<Vec<PortValue>>,
    /// v1: the single scanned port.
    port_number: Option<PortValue>,
    /// v1: protocol spoken on that port.
    protocol: Option<String>,
    banner: Option<String>,
    description: Option<String>,
    asn: Option<ScalarValue>,
    country_code: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum PortValue {
    Number(i64),
    Text(String),
}

impl PortValue {
    fn as_u16(&self) -> Option<u16> {
        match self {
            PortValue::Number(n) => u16::try_from(*n).ok(),
            PortValue::Text(s) => s.trim().parse().ok(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum ScalarValue {
    Number(i64),
    Text(String),
}

impl ScalarValue {
    fn normalized(&self) -> String {
        match self {
            ScalarValue::Number(n) => n.to_string(),
            ScalarValue::Text(s) => s.trim().to_string(),
        }
    }
}

impl CensysRecord {
    /// The validated identifier, or why it is unusable.
    fn identifier(&self) -> std::result::Result<&str, Malformed> {
        let raw = match &self.ip {
            Some(Value::String(s)) => s.as_str(),
            Some(other) => return Err(Malformed::InvalidIdentifier(other.to_string())),
            None => return Err(Malformed::InvalidIdentifier(String::new())),
        };
        if valid_identifier(raw) {
            Ok(raw)
        } else {
            Err(Malformed::InvalidIdentifier(raw.to_string()))
        }
    }

    /// Telnet eligibility under the given schema generation.
    fn is_telnet_eligible(&self, version: CensysVersion) -> bool {
        match version {
            CensysVersion::V2 => self
                .ports
                .as_deref()
                .unwrap_or_default()
                .iter()
                .filter_map(PortValue::as_u16)
                .any(is_telnet_port),
            CensysVersion::V1 => {
                let on_telnet_port = self
                    .port_number
                    .as_ref()
                    .and_then(PortValue::as_u16)
                    .map(is_telnet_port)
                    .unwrap_or(false);
                on_telnet_port && self.protocol.as_deref() == Some("telnet")
            }
        }
    }

    /// Banner text, unwrapping v1's base64 encoding. Undecodable v1
    /// banners are kept verbatim.
    fn banner_text(&self, version: CensysVersion) -> Option<String> {
        let raw = self.banner.as_deref()?;
        match version {
            CensysVersion::V2 => Some(raw.to_string()),
            CensysVersion::V1 => match BASE64.decode(raw.trim()) {
                Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
                Err(_) => Some(raw.to_string()),
            },
        }
    }

    fn observation(&self, ip: &str) -> DeviceObservation {
        DeviceObservation {
            ip: ip.to_string(),
            asn: self.asn.as_ref().map(ScalarValue::normalized),
            country: self.country_code.clone(),
            description: self.description.clone(),
        }
    }
}

/// Load every record file under `dir` in one pass.
pub fn load_catalog(dir: &Path, version: CensysVersion) -> Result<CensysCatalog> {
    let mut catalog = CensysCatalog::default();
    for path in record_files(dir)? {
        let text = fs::read_to_string(&path)?;
        for entry in decode_entries(&text) {
            match entry {
                Ok(record) => ingest_record(&mut catalog, &record, version),
                Err(reason) => {
                    tracing::debug!(file = %path.display(), error = %reason, "Skipping entry");
                    catalog.skipped.record(&reason);
                }
            }
        }
    }

    tracing::info!(
        dir = %dir.display(),
        eligible = catalog.eligible.len(),
        with_banner = catalog.with_banner.len(),
        without_banner = catalog.without_banner.len(),
        excluded_other_ports = catalog.excluded_other_ports,
        skipped = catalog.skipped.total(),
        "Censys catalog loaded"
    );
    Ok(catalog)
}

/// Non-hidden regular files under `dir`, in sorted name order.
fn record_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_file() || entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        files.push(path);
    }
    files.sort();
    Ok(files)
}

/// Decode one file's entries. A JSON array may hold record objects or
/// strings wrapping a record; any other file shape is read as NDJSON.
fn decode_entries(text: &str) -> Vec<std::result::Result<CensysRecord, Malformed>> {
    if let Ok(values) = serde_json::from_str::<Vec<Value>>(text) {
        return values.into_iter().map(decode_value).collect();
    }
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match serde_json::from_str::<Value>(line) {
            Ok(value) => decode_value(value),
            Err(e) => Err(Malformed::BadRecord(e.to_string())),
        })
        .collect()
}

fn decode_value(value: Value) -> std::result::Result<CensysRecord, Malformed> {
    let decoded = match value {
        Value::String(text) => serde_json::from_str(&text),
        other => serde_json::from_value(other),
    };
    decoded.map_err(|e| Malformed::BadRecord(e.to_string()))
}

fn ingest_record(catalog: &mut CensysCatalog, record: &CensysRecord, version: CensysVersion) {
    let eligible = record.is_telnet_eligible(version);
    match record.identifier() {
        Ok(ip) => {
            catalog.observations.push(record.observation(ip));
            if !eligible {
                catalog.excluded_other_ports += 1;
                return;
            }
            let ip = ip.to_string();
            match record.banner_text(version) {
                Some(banner) if !banner.is_empty() => {
                    catalog.with_banner.insert(ip.clone());
                    catalog.banners.insert(ip.clone(), banner);
                }
                _ => {
                    catalog.without_banner.insert(ip.clone());
                }
            }
            catalog.eligible.insert(ip);
        }
        Err(reason) if eligible => {
            tracing::debug!(error = %reason, "Skipping record");
            catalog.skipped.record(&reason);
        }
        // ports are checked before the identifier, so a malformed
        // identifier on a non-telnet record counts as excluded
        Err(_) => catalog.excluded_other_ports += 1,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn write_dir(files: &[(&str, String)]) -> TempDir {
        let dir = TempDir::new().unwrap();
        for (name, content) in files {
            let mut file = fs::File::create(dir.path().join(name)).unwrap();
            write!(file, "{content}").unwrap();
        }
        dir
    }

    fn string_array(records: &[&str]) -> String {
        serde_json::to_string(&records.to_vec()).unwrap()
    }

    #[test]
    fn loads_the_doubly_encoded_array_shape() {
        let dir = write_dir(&[(
            "a.json",
            string_array(&[
                r#"{"ip":"1.2.3.4","ports":[23,80],"banner":"RomPager","description":"Mikrotik RouterOS","asn":4134,"country_code":"CN"}"#,
            ]),
        )]);
        let catalog = load_catalog(dir.path(), CensysVersion::V2).unwrap();
        assert!(catalog.eligible.contains("1.2.3.4"));
        assert!(catalog.with_banner.contains("1.2.3.4"));
        assert_eq!(catalog.banners["1.2.3.4"], "RomPager");
        assert_eq!(catalog.observations.len(), 1);
        assert_eq!(catalog.observations[0].asn.as_deref(), Some("4134"));
    }

    #[test]
    fn loads_plain_object_arrays_and_ndjson() {
        let dir = write_dir(&[
            (
                "objects.json",
                r#"[{"ip":"1.1.1.1","ports":[23]}]"#.to_string(),
            ),
            (
                "lines.json",
                "{\"ip\":\"2.2.2.2\",\"ports\":[2323]}\n{\"ip\":\"3.3.3.3\",\"ports\":[23]}\n"
                    .to_string(),
            ),
        ]);
        let catalog = load_catalog(dir.path(), CensysVersion::V2).unwrap();
        assert_eq!(catalog.eligible.len(), 3);
    }

    #[test]
    fn only_telnet_ports_are_eligible() {
        let dir = write_dir(&[(
            "a.json",
            string_array(&[
                r#"{"ip":"1.1.1.1","ports":[80,443]}"#,
                r#"{"ip":"2.2.2.2","ports":[2323,8080]}"#,
            ]),
        )]);
        let catalog = load_catalog(dir.path(), CensysVersion::V2).unwrap();
        assert!(!catalog.eligible.contains("1.1.1.1"));
        assert!(catalog.eligible.contains("2.2.2.2"));
        assert_eq!(catalog.excluded_other_ports, 1);
    }

    #[test]
    fn string_ports_are_coerced() {
        let dir = write_dir(&[(
            "a.json",
            string_array(&[r#"{"ip":"1.1.1.1","ports":["23"]}"#]),
        )]);
        let catalog = load_catalog(dir.path(), CensysVersion::V2).unwrap();
        assert!(catalog.eligible.contains("1.1.1.1"));
    }

    #[test]
    fn missing_ports_field_is_excluded_not_fatal() {
        let dir = write_dir(&[("a.json", string_array(&[r#"{"ip":"1.1.1.1"}"#]))]);
        let catalog = load_catalog(dir.path(), CensysVersion::V2).unwrap();
        assert!(catalog.eligible.is_empty());
        assert_eq!(catalog.excluded_other_ports, 1);
        assert_eq!(catalog.skipped.total(), 0);
    }

    #[test]
    fn empty_and_absent_banners_group_together() {
        let dir = write_dir(&[(
            "a.json",
            string_array(&[
                r#"{"ip":"1.1.1.1","ports":[23],"banner":""}"#,
                r#"{"ip":"2.2.2.2","ports":[23]}"#,
            ]),
        )]);
        let catalog = load_catalog(dir.path(), CensysVersion::V2).unwrap();
        assert_eq!(catalog.without_banner.len(), 2);
        assert!(catalog.with_banner.is_empty());
        assert!(catalog.banners.is_empty());
    }

    #[test]
    fn non_string_identifier_is_tallied_when_eligible() {
        let dir = write_dir(&[(
            "a.json",
            string_array(&[
                r#"{"ip":16909060,"ports":[23]}"#,
                r#"{"ip":16909060,"ports":[80]}"#,
            ]),
        )]);
        let catalog = load_catalog(dir.path(), CensysVersion::V2).unwrap();
        assert_eq!(catalog.skipped.invalid_identifier, 1);
        assert_eq!(catalog.excluded_other_ports, 1);
    }

    #[test]
    fn undecodable_entries_are_counted() {
        let dir = write_dir(&[("a.json", string_array(&["not json at all"]))]);
        let catalog = load_catalog(dir.path(), CensysVersion::V2).unwrap();
        assert_eq!(catalog.skipped.bad_record, 1);
    }

    #[test]
    fn v1_requires_telnet_protocol_and_decodes_banners() {
        let encoded = BASE64.encode("BusyBox v1.13");
        let dir = write_dir(&[(
            "a.json",
            string_array(&[
                format!(
                    r#"{{"ip":"1.1.1.1","port_number":23,"protocol":"telnet","banner":"{encoded}"}}"#
                )
                .as_str(),
                r#"{"ip":"2.2.2.2","port_number":23,"protocol":"http"}"#,
                r#"{"ip":"3.3.3.3","port_number":8080,"protocol":"telnet"}"#,
            ]),
        )]);
        let catalog = load_catalog(dir.path(), CensysVersion::V1).unwrap();
        assert!(catalog.eligible.contains("1.1.1.1"));
        assert_eq!(catalog.banners["1.1.1.1"], "BusyBox v1.13");
        assert!(!catalog.eligible.contains("2.2.2.2"));
        assert!(!catalog.eligible.contains("3.3.3.3"));
        assert_eq!(catalog.excluded_other_ports, 2);
    }

    #[test]
    fn later_files_win_the_banner() {
        let dir = write_dir(&[
            (
                "a.json",
                string_array(&[r#"{"ip":"1.1.1.1","ports":[23],"banner":"old"}"#]),
            ),
            (
                "b.json",
                string_array(&[r#"{"ip":"1.1.1.1","ports":[23],"banner":"new"}"#]),
            ),
        ]);
        let catalog = load_catalog(dir.path(), CensysVersion::V2).unwrap();
        assert_eq!(catalog.banners["1.1.1.1"], "new");
        assert_eq!(catalog.eligible.len(), 1);
    }

    #[test]
    fn hidden_files_are_ignored() {
        let dir = write_dir(&[
            (".partial", string_array(&[r#"{"ip":"9.9.9.9","ports":[23]}"#])),
            (
                "a.json",
                string_array(&[r#"{"ip":"1.1.1.1","ports":[23]}"#]),
            ),
        ]);
        let catalog = load_catalog(dir.path(), CensysVersion::V2).unwrap();
        assert!(!catalog.eligible.contains("9.9.9.9"));
        assert_eq!(catalog.eligible.len(), 1);
    }

    #[test]
    fn observations_cover_ineligible_records_too() {
        let dir = write_dir(&[(
            "a.json",
            string_array(&[
                r#"{"ip":"1.1.1.1","ports":[23]}"#,
                r#"{"ip":"1.1.1.1","ports":[80],"description":"AVTECH"}"#,
            ]),
        )]);
        let catalog = load_catalog(dir.path(), CensysVersion::V2).unwrap();
        assert_eq!(catalog.observations.len(), 2);
        assert_eq!(
            catalog.observations[1].description.as_deref(),
            Some("AVTECH")
        );
    }
}
