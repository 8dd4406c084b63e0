use serde::de::DeserializeOwned;

/// Where and why a JSON document failed to deserialize. `location` is
/// either empty or ` at <path>`, ready to follow a "parse ... json" prefix.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JsonParseFailure {
    pub location: String,
    pub message: String,
}

pub fn deserialize_json<T: DeserializeOwned>(raw: &str) -> Result<T, JsonParseFailure> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    serde_path_to_error::deserialize::<_, T>(&mut deserializer).map_err(|error| {
        let path = error.path().to_string();
        let location = if path.is_empty() || path == "." {
            String::new()
        } else {
            format!(" at {path}")
        };
        JsonParseFailure {
            location,
            message: error.into_inner().to_string(),
        }
    })
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use serde::Deserialize;

    use super::*;

    #[derive(Debug, Deserialize)]
    struct Door {
        #[allow(dead_code)]
        x_pos: f32,
    }

    #[derive(Debug, Deserialize)]
    struct Doors {
        #[allow(dead_code)]
        door: Vec<Door>,
    }

    #[test]
    fn nested_failure_names_its_path() {
        let failure =
            deserialize_json::<Doors>(r#"{ "door": [ { "x_pos": 1.0 }, { "x_pos": "wide" } ] }"#)
                .expect_err("bad door");
        assert_eq!(failure.location, " at door[1].x_pos");
        assert!(failure.message.contains("invalid type"), "{}", failure.message);
    }

    #[test]
    fn root_level_failure_has_no_location() {
        let failure = deserialize_json::<BTreeMap<String, bool>>("[1, 2]").expect_err("not a map");
        assert_eq!(failure.location, "");

        let failure = deserialize_json::<BTreeMap<String, bool>>("{").expect_err("truncated");
        assert_eq!(failure.location, "");
        assert!(failure.message.contains("EOF"), "{}", failure.message);
    }

    #[test]
    fn well_formed_document_deserializes() {
        let levels: BTreeMap<String, bool> =
            deserialize_json(r#"{ "level1": true, "level2": false }"#).expect("progress map");
        assert_eq!(levels.get("level1"), Some(&true));
    }
}
