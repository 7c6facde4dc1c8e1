//! Shared fixture files under `crates/testkit/fixtures`.

use config_console_ports::{ConfigDocument, SchemaDocument};
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Absolute path of the fixtures directory.
pub fn fixtures_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures")
}

/// Absolute path of one fixture file.
pub fn fixture_path(relative: &str) -> PathBuf {
    fixtures_dir().join(relative)
}

/// Read and parse a JSON fixture. Panics when the fixture is missing or malformed.
pub fn load_json_fixture(relative: &str) -> Value {
    let path = fixture_path(relative);
    let contents = std::fs::read_to_string(&path)
        .unwrap_or_else(|error| panic!("read fixture {}: {error}", path.display()));
    serde_json::from_str(&contents)
        .unwrap_or_else(|error| panic!("parse fixture {}: {error}", path.display()))
}

/// The config API schema used across editor tests.
pub fn backend_schema() -> SchemaDocument {
    SchemaDocument::new(load_json_fixture("api/backend-schema.json"))
}

/// The real (unmasked) config document matching [`backend_schema`].
pub fn backend_config() -> Value {
    load_json_fixture("api/backend-config.json")
}

/// The masked view of [`backend_config`].
pub fn backend_config_masked() -> ConfigDocument {
    let stored = backend_config().as_object().cloned().unwrap_or_default();
    let masked = crate::in_memory::mask_document(stored);
    ConfigDocument::from_value(Value::Object(masked)).expect("fixture is an object")
}
