//! Chart selection rewriting.
//!
//! Legacy chart configs list selected entities under `selected-countries`,
//! one entry per entity. The newer `selection` array holds one entry per
//! (entity, main dimension) pair, with an explicit series index.
use itertools::iproduct;
use serde::Serialize;
use serde_json::Map;
use serde_json::Value;

pub const LEGACY_KEY: &str = "selected-countries";
pub const SELECTION_KEY: &str = "selection";
pub const DIMENSIONS_KEY: &str = "chart-dimensions";

/// Dimensions with this property are main dimensions.
pub const MAIN_PROPERTY: &str = "y";

#[derive(thiserror::Error, Debug)]
pub enum SelectionError {
    #[error("config is not valid JSON")]
    Parse(#[source] serde_json::Error),
    #[error("rewritten config could not be serialized")]
    Serialize(#[source] serde_json::Error),
    #[error("missing key `{0}`")]
    MissingKey(&'static str),
    #[error("cannot interpret {0} as an integer entity id")]
    TypeCoercion(Value),
    #[error("expected `{key}` to be {expected}")]
    UnexpectedType {
        key: &'static str,
        expected: &'static str,
    },
}

/// An entry of the new `selection` array.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SelectionEntry {
    pub entity_id: i64,
    /// Position of the series among main dimensions
    pub index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Value>,
}

/// Outcome of a rewritten config, kept around for diagnostics.
#[derive(Debug, Clone, PartialEq)]
pub struct Rewrite {
    /// The removed `selected-countries` array
    pub legacy: Value,
    pub selection: Vec<SelectionEntry>,
}

/// Returns the main dimensions of a config, in their original order.
pub fn main_dimensions(doc: &Map<String, Value>) -> Result<Vec<&Value>, SelectionError> {
    let dimensions = doc
        .get(DIMENSIONS_KEY)
        .ok_or(SelectionError::MissingKey(DIMENSIONS_KEY))?
        .as_array()
        .ok_or(SelectionError::UnexpectedType {
            key: DIMENSIONS_KEY,
            expected: "an array",
        })?;

    let mut main = vec![];
    for dimension in dimensions {
        let property = dimension
            .as_object()
            .ok_or(SelectionError::UnexpectedType {
                key: DIMENSIONS_KEY,
                expected: "an array of objects",
            })?
            .get("property")
            .ok_or(SelectionError::MissingKey("property"))?;
        if property.as_str() == Some(MAIN_PROPERTY) {
            main.push(dimension);
        }
    }
    Ok(main)
}

/// Interprets a legacy entity `id` as an integer.
///
/// Accepts integers, finite floats (truncated toward zero), booleans and
/// base-10 integer strings. Strings may carry surrounding whitespace, a sign
/// and single underscores between digits. Only ASCII digits are recognised,
/// other Unicode decimal digits (e.g. `"١٢"`) are rejected.
pub fn entity_id(value: &Value) -> Result<i64, SelectionError> {
    let coerced = match value {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().and_then(truncate)),
        Value::Bool(b) => Some(i64::from(*b)),
        Value::String(s) => parse_int_literal(s),
        _ => None,
    };
    coerced.ok_or_else(|| SelectionError::TypeCoercion(value.clone()))
}

fn truncate(f: f64) -> Option<i64> {
    // i64::MAX as f64 rounds up to 2^63, hence the strict upper bound.
    if f.is_finite() && f >= i64::MIN as f64 && f < i64::MAX as f64 {
        Some(f.trunc() as i64)
    } else {
        None
    }
}

fn parse_int_literal(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    let (sign, digits) = match trimmed.as_bytes().first() {
        Some(b'-') => ("-", &trimmed[1..]),
        Some(b'+') => ("", &trimmed[1..]),
        _ => ("", trimmed),
    };
    if digits.is_empty()
        || digits.starts_with('_')
        || digits.ends_with('_')
        || digits.contains("__")
    {
        return None;
    }
    let digits: String = digits.chars().filter(|c| *c != '_').collect();
    if !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    format!("{sign}{digits}").parse().ok()
}

/// Builds the new selection for given legacy entities.
///
/// Entries are entity-major: all main dimensions of the first entity, then
/// all main dimensions of the next one, and so on. Entity ids are only
/// inspected for produced entries.
pub fn build_selection(
    legacy: &[Value],
    main_dimension_count: usize,
) -> Result<Vec<SelectionEntry>, SelectionError> {
    iproduct!(legacy, 0..main_dimension_count)
        .map(|(entity, index)| selection_entry(entity, index))
        .collect()
}

fn selection_entry(entity: &Value, index: usize) -> Result<SelectionEntry, SelectionError> {
    let entity = entity.as_object().ok_or(SelectionError::UnexpectedType {
        key: LEGACY_KEY,
        expected: "an array of objects",
    })?;
    let id = entity.get("id").ok_or(SelectionError::MissingKey("id"))?;
    Ok(SelectionEntry {
        entity_id: entity_id(id)?,
        index,
        color: entity.get("color").cloned(),
    })
}

/// Replaces the legacy selection of a parsed config with the new one.
///
/// Returns `None`, leaving `doc` untouched, if there is no legacy selection.
/// The order of all other keys is preserved.
pub fn rewrite(doc: &mut Value) -> Result<Option<Rewrite>, SelectionError> {
    let Some(doc) = doc.as_object_mut() else {
        return Ok(None);
    };
    let Some(legacy) = doc.get(LEGACY_KEY) else {
        return Ok(None);
    };

    let main_dimension_count = main_dimensions(doc)?.len();
    let entities = legacy.as_array().ok_or(SelectionError::UnexpectedType {
        key: LEGACY_KEY,
        expected: "an array",
    })?;
    let selection = build_selection(entities, main_dimension_count)?;
    let legacy = legacy.clone();

    let new_value = serde_json::to_value(&selection).map_err(SelectionError::Serialize)?;
    doc.insert(SELECTION_KEY.to_owned(), new_value);
    doc.shift_remove(LEGACY_KEY);

    Ok(Some(Rewrite { legacy, selection }))
}

/// Rewrites a JSON-encoded config.
///
/// Returns the new config text along with the rewrite details, or `None`
/// if the config has no legacy selection. Numbers keep their original text.
/// `NaN` and `Infinity` are not valid JSON and fail with [`SelectionError::Parse`].
pub fn rewrite_config(text: &str) -> Result<Option<(String, Rewrite)>, SelectionError> {
    let mut doc: Value = serde_json::from_str(text).map_err(SelectionError::Parse)?;
    match rewrite(&mut doc)? {
        Some(rewrite) => {
            let text = serde_json::to_string(&doc).map_err(SelectionError::Serialize)?;
            Ok(Some((text, rewrite)))
        }
        None => Ok(None),
    }
}
