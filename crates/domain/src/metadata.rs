//! Static display metadata for known config sections and fields.
//!
//! Entries only supplement the schema. A field with no entry falls back to the
//! schema `description` for help text and to the raw key for its label.

/// Label, help text, and placeholder for one `(section, key)` pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldMetadata {
    /// Display label.
    pub label: &'static str,
    /// Help text shown under the field.
    pub hint: &'static str,
    /// Input placeholder (empty means none).
    pub placeholder: &'static str,
}

const fn meta(label: &'static str, hint: &'static str, placeholder: &'static str) -> FieldMetadata {
    FieldMetadata {
        label,
        hint,
        placeholder,
    }
}

const LISTEN_HOST_HINT: &str = "0.0.0.0 listens on the LAN; 127.0.0.1 is local only";
const KEEP_SECRET_HINT: &str = "Stored server-side. Leave blank to keep the current key.";
const KEEP_SECRET_PLACEHOLDER: &str = "set (leave blank to keep)";

const FIELD_METADATA: &[(&str, &str, FieldMetadata)] = &[
    (
        "llm",
        "base_url",
        meta(
            "LLM API Base URL",
            "Base URL of the model API; proxies must expose the same API version",
            "https://.../v1beta",
        ),
    ),
    (
        "llm",
        "api_key",
        meta("LLM API Key", KEEP_SECRET_HINT, KEEP_SECRET_PLACEHOLDER),
    ),
    (
        "llm",
        "model",
        meta("Model", "Model identifier, e.g. gemini-2.0-flash", "gemini-2.0-flash"),
    ),
    (
        "llm",
        "timeout",
        meta("Request timeout (s)", "Upper bound for a single request", "30"),
    ),
    (
        "llm",
        "max_tokens",
        meta(
            "Max output tokens",
            "Caps tokens generated per request",
            "8192",
        ),
    ),
    (
        "embeddings",
        "base_url",
        meta(
            "Embedding API Base URL",
            "Base URL of the embedding API",
            "https://.../v1beta",
        ),
    ),
    (
        "embeddings",
        "api_key",
        meta("Embedding API Key", KEEP_SECRET_HINT, KEEP_SECRET_PLACEHOLDER),
    ),
    (
        "embeddings",
        "model",
        meta(
            "Embedding model",
            "Model identifier, e.g. text-embedding-004",
            "text-embedding-004",
        ),
    ),
    (
        "embeddings",
        "dimensions",
        meta(
            "Vector dimensions (optional)",
            "Leave blank to use the model default",
            "",
        ),
    ),
    (
        "embeddings",
        "timeout",
        meta("Request timeout (s)", "Upper bound for a single request", "30"),
    ),
    (
        "gateway",
        "host",
        meta("Listen address", LISTEN_HOST_HINT, "0.0.0.0"),
    ),
    ("gateway", "port", meta("Listen port", "Gateway port", "8788")),
    (
        "gateway",
        "cors_origins",
        meta(
            "CORS origins",
            "Usually empty; list origins only when cross-origin access is needed",
            "[]",
        ),
    ),
    (
        "node_host",
        "host",
        meta("Listen address", LISTEN_HOST_HINT, "0.0.0.0"),
    ),
    ("node_host", "port", meta("Listen port", "Node-Host port", "8789")),
    (
        "node_host",
        "gateway_url",
        meta(
            "Gateway URL",
            "Address the Node-Host uses to reach the Gateway",
            "http://127.0.0.1:8788",
        ),
    ),
    (
        "memory",
        "database_path",
        meta("Database path", "SQLite file path", "data/memory/memory.db"),
    ),
    (
        "memory",
        "chunk_size",
        meta("Chunk size", "Chunk size used for embedding and indexing", "1200"),
    ),
    (
        "memory",
        "chunk_overlap",
        meta("Chunk overlap", "Must be smaller than the chunk size", "200"),
    ),
    (
        "memory",
        "fts_enabled",
        meta("Full-text search", "Enable the FTS5 full-text index", ""),
    ),
    (
        "context",
        "budget_chars",
        meta(
            "Context budget (chars)",
            "Upper bound used for trimming and compaction",
            "20000",
        ),
    ),
    (
        "context",
        "soft_trim_ratio",
        meta(
            "Soft trim ratio",
            "Trimming starts when coverage falls below this ratio (0 to 1)",
            "0.7",
        ),
    ),
    (
        "context",
        "hard_clear_ratio",
        meta(
            "Hard clear ratio",
            "Tool output is cleared past this ratio (0 to 1)",
            "0.9",
        ),
    ),
    (
        "security",
        "sandbox_enabled",
        meta("Sandbox", "Run tool execution inside the sandbox", ""),
    ),
    (
        "security",
        "sandbox_network",
        meta(
            "Sandbox network",
            "Allow sandboxed tools to reach the network (off by default)",
            "",
        ),
    ),
    (
        "security",
        "tool_policy",
        meta("Tool policy", "allow/deny policy as JSON", "{}"),
    ),
    (
        "security",
        "exec_approval",
        meta(
            "Exec approval",
            "Require approval before high-risk exec calls",
            "",
        ),
    ),
    (
        "paths",
        "skills_dir",
        meta("Skills directory", "Relative to the working directory", "skills"),
    ),
    (
        "paths",
        "plugins_dir",
        meta("Plugins directory", "Relative to the working directory", "plugins"),
    ),
    (
        "paths",
        "transcripts_dir",
        meta(
            "Transcripts directory",
            "Where conversation transcripts are written",
            "data/transcripts",
        ),
    ),
    (
        "paths",
        "media_dir",
        meta("Media directory", "Where media files are stored", "media"),
    ),
];

const SECTION_LABELS: &[(&str, &str)] = &[
    ("llm", "LLM"),
    ("embeddings", "Embedding"),
    ("gateway", "Gateway"),
    ("node_host", "Node-Host"),
    ("memory", "Memory"),
    ("context", "Context"),
    ("security", "Security"),
    ("paths", "Paths"),
];

/// Look up display metadata for a field.
#[must_use]
pub fn field_metadata(section: &str, key: &str) -> Option<&'static FieldMetadata> {
    FIELD_METADATA
        .iter()
        .find(|(entry_section, entry_key, _)| *entry_section == section && *entry_key == key)
        .map(|(_, _, metadata)| metadata)
}

/// Display label for a section; unknown sections use their raw name.
#[must_use]
pub fn section_label(section: &str) -> &str {
    SECTION_LABELS
        .iter()
        .find(|(name, _)| *name == section)
        .map_or(section, |(_, label)| *label)
}
