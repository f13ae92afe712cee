//! JSON document writers.

use std::path::Path;

use serde::Serialize;
use tracing::debug;

use kbharvest_shared::{AggregateResult, HarvestError, Result};

/// Write `data` as pretty-printed JSON, replacing `path` atomically.
pub fn write_json<T: Serialize>(path: &Path, data: &T) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent).map_err(|e| HarvestError::io(parent, e))?;
    }

    let json = serde_json::to_string_pretty(data)?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output.json".into());
    let temp = path.with_file_name(format!(".{file_name}.tmp"));

    std::fs::write(&temp, json).map_err(|e| HarvestError::io(&temp, e))?;
    std::fs::rename(&temp, path).map_err(|e| HarvestError::io(path, e))?;

    debug!(path = %path.display(), "wrote JSON file");
    Ok(())
}

/// Write an aggregate result with `info_key` naming each record's section array.
pub fn write_aggregate(path: &Path, result: &AggregateResult, info_key: &str) -> Result<()> {
    write_json(path, &result.keyed(info_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    use kbharvest_shared::{ExtractionRecord, Section, Source};

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!(
            "kbh-output-test-{}-{name}",
            std::process::id()
        ));
        let _ = std::fs::remove_dir_all(&dir);
        dir
    }

    fn sample() -> AggregateResult {
        let source = Source {
            name: "Clinic".into(),
            url: "https://clinic.example/care".into(),
            description: "Antenatal care".into(),
            keywords: None,
        };
        let section = Section::new(
            "Pregnancy Care",
            vec!["Folic acid is important for pregnant women.".into()],
        )
        .unwrap();

        let mut result = AggregateResult::new(2, None);
        result.push(ExtractionRecord::parsed(&source, vec![section]));
        result.push(ExtractionRecord::failed(&source, "network error: timed out"));
        result
    }

    #[test]
    fn writes_into_missing_directories() {
        let dir = temp_dir("nested");
        let path = dir.join("out").join("kb.json");

        write_aggregate(&path, &sample(), "sections").unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["extraction_info"]["total_sources"], 2);
        assert_eq!(value["extraction_info"]["successful_extractions"], 1);
        assert!(value["extraction_info"].get("note").is_none());
        assert_eq!(value["sources"][0]["sections"][0]["title"], "Pregnancy Care");
        assert_eq!(value["sources"][1]["sections"], serde_json::json!([]));
        assert!(!dir.join("out").join(".kb.json.tmp").exists());

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn custom_info_key_renames_section_array() {
        let dir = temp_dir("keyed");
        let path = dir.join("kb.json");

        write_aggregate(&path, &sample(), "pregnancy_info").unwrap();

        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        let record = &value["sources"][0];
        assert!(record.get("sections").is_none());
        assert_eq!(record["pregnancy_info"][0]["content"][0], "Folic acid is important for pregnant women.");
        assert_eq!(record["source"], "Clinic");

        let _ = std::fs::remove_dir_all(&dir);
    }

    #[test]
    fn overwrites_existing_file() {
        let dir = temp_dir("overwrite");
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join("kb.json");
        std::fs::write(&path, "stale").unwrap();

        write_json(&path, &serde_json::json!({"fresh": true})).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("fresh"));

        let _ = std::fs::remove_dir_all(&dir);
    }
}
