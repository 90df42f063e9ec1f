const PT_BR_V1: &str = include_str!("../../vocabularies/pt-br-v1.json");
const PT_BR_V2: &str = include_str!("../../vocabularies/pt-br-v2.json");
const EN_V1: &str = include_str!("../../vocabularies/en-v1.json");

/// All embedded vocabularies, oldest first.
const ALL_VOCABULARIES: &[(&str, &str)] = &[
    ("pt-br-v1", PT_BR_V1),
    ("pt-br-v2", PT_BR_V2),
    ("en-v1", EN_V1),
];

/// Look up an embedded vocabulary by version ID.
pub fn get_embedded(version: &str) -> Option<&'static str> {
    ALL_VOCABULARIES
        .iter()
        .find(|(id, _)| *id == version)
        .map(|(_, json)| *json)
}

/// List all embedded vocabularies as (id, name, description).
pub fn list_embedded() -> Vec<(String, String, String)> {
    let mut result = Vec::new();
    for (version, json) in ALL_VOCABULARIES {
        if let Ok(vocabulary) = serde_json::from_str::<super::schema::Vocabulary>(json) {
            result.push((vocabulary.id, vocabulary.name, vocabulary.description));
        } else {
            result.push((version.to_string(), version.to_string(), String::new()));
        }
    }
    result
}
