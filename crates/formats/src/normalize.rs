use serde_json::Value;

pub const LEGACY_ID_FIELD: &str = "SGI";
pub const NORMALIZED_ID_FIELD: &str = "sgi-id";

/// Copies the `from` property to `to` on every feature that has `from`.
///
/// Non-destructive: `from` is left in place and existing `to` values are
/// overwritten with the legacy value. Returns the number of features touched.
pub fn copy_id_property(collection: &mut Value, from: &str, to: &str) -> usize {
    let Some(features) = collection
        .get_mut("features")
        .and_then(|v| v.as_array_mut())
    else {
        return 0;
    };

    let mut touched = 0;
    for feature in features {
        let Some(props) = feature
            .get_mut("properties")
            .and_then(|v| v.as_object_mut())
        else {
            continue;
        };
        let Some(id) = props.get(from).cloned() else {
            continue;
        };
        props.insert(to.to_string(), id);
        touched += 1;
    }
    touched
}
