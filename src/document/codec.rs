//! Text encodings for scene documents.

use serde::{Deserialize, Serialize};

use crate::document::model::SceneDocument;
use crate::error::DocumentError;

/// On-disk encoding of a scene document.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentFormat {
    /// Pretty-printed JSON.
    Json,
    /// YAML.
    Yaml,
}

impl DocumentFormat {
    /// Parse `text`, naming `location` in errors.
    pub fn decode(self, text: &str, location: &str) -> Result<SceneDocument, DocumentError> {
        match self {
            Self::Json => serde_json::from_str(text).map_err(|source| DocumentError::Json {
                location: location.to_string(),
                source,
            }),
            Self::Yaml => serde_yaml::from_str(text).map_err(|source| DocumentError::Yaml {
                location: location.to_string(),
                source,
            }),
        }
    }

    /// Serialise `document`, naming `location` in errors.
    pub fn encode(self, document: &SceneDocument, location: &str) -> Result<String, DocumentError> {
        match self {
            Self::Json => serde_json::to_string_pretty(document)
                .map(|mut text| {
                    text.push('\n');
                    text
                })
                .map_err(|source| DocumentError::Json {
                    location: location.to_string(),
                    source,
                }),
            Self::Yaml => serde_yaml::to_string(document).map_err(|source| DocumentError::Yaml {
                location: location.to_string(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const YAML: &str = r#"
sublayers:
  - ./sub.yaml
prims:
  - path: /World
    payloads: [./payload.json]
    properties:
      - name: texture
        time_samples:
          "1": ./tex.1.png
"#;

    #[test]
    fn converts_between_encodings() {
        let document = DocumentFormat::Yaml.decode(YAML, "root.yaml").unwrap();
        assert_eq!(document.sublayers, vec!["./sub.yaml".to_string()]);

        let json = DocumentFormat::Json.encode(&document, "root.json").unwrap();
        let reparsed = DocumentFormat::Json.decode(&json, "root.json").unwrap();
        assert_eq!(reparsed, document);
    }

    #[test]
    fn reports_the_failing_location() {
        let err = DocumentFormat::Json.decode("{", "broken.json").unwrap_err();
        assert!(err.to_string().contains("broken.json"));
    }
}
