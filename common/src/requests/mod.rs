use serde::Deserialize;

/// Payload of `POST /api/upload/parse`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParseFileRequest {
    pub file_id: String,
    #[serde(default)]
    pub start_line: usize,
    /// `"auto"` (or absent) lets the server detect the delimiter.
    #[serde(default)]
    pub separator: Option<String>,
}

/// Payload of `POST /api/mappings/lookup`.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LookupMappingsRequest {
    pub external_values: Vec<String>,
}

/// One entry of a batch mapping save. Entries with an empty field are
/// skipped by the store rather than failing the whole batch.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingEntry {
    #[serde(default)]
    pub external_value: String,
    #[serde(default)]
    pub adcopy_name: String,
}

/// Payload of `POST /api/mappings`.
#[derive(Debug, Deserialize)]
pub struct SaveMappingsRequest {
    pub mappings: Vec<MappingEntry>,
}
