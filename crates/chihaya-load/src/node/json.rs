//! JSON mirror of the HDF5 group layout.
//!
//! An object is a group and its `"attributes"` member holds the group
//! attributes. An object with a `"dataset"` member (and an optional
//! `"shape"`) is a dataset, as is any bare scalar or nested array.
use std::{borrow::Cow, fs, path::Path};

use itertools::Itertools;
use serde_json::{Map, Value as Json};

use super::{Data, Entry, Group, Value, child_path, element_count};
use crate::error::{Error, ErrorKind};

const ATTRIBUTES: &str = "attributes";
const DATASET: &str = "dataset";
const SHAPE: &str = "shape";

/// Reads and parses the container at `path`.
pub fn open(path: impl AsRef<Path>) -> Result<Group, Error> {
    let path = path.as_ref();
    let display = path.display().to_string();
    let content =
        fs::read_to_string(path).map_err(|e| Error::new(display.clone(), ErrorKind::Io(e)))?;
    let json: Json =
        serde_json::from_str(&content).map_err(|e| Error::new(display, ErrorKind::Json(e)))?;

    Group::from_json(&json)
}

impl Group {
    pub fn from_json(json: &Json) -> Result<Group, Error> {
        match json {
            Json::Object(map) => group_from_object(map, "/"),
            _ => Err(invalid("/", "the root of a container must be an object")),
        }
    }
}

fn group_from_object(map: &Map<String, Json>, path: &str) -> Result<Group, Error> {
    let mut group = Group::new();

    for (name, json) in map {
        let entry_path = child_path(path, name);

        if name == ATTRIBUTES {
            let Json::Object(attrs) = json else {
                return Err(invalid(&entry_path, "attributes must be an object"));
            };
            for (attr, value) in attrs {
                let value = value_from_json(value, None, &child_path(&entry_path, attr))?;
                group.set_attribute(attr, value);
            }
            continue;
        }

        let entry = match json {
            Json::Object(obj) if obj.contains_key(DATASET) => {
                let shape = match obj.get(SHAPE) {
                    Some(shape) => Some(shape_from_json(shape, &entry_path)?),
                    None => None,
                };
                Entry::Dataset(value_from_json(&obj[DATASET], shape, &entry_path)?)
            }
            Json::Object(obj) => Entry::Group(group_from_object(obj, &entry_path)?),
            _ => Entry::Dataset(value_from_json(json, None, &entry_path)?),
        };
        group.insert(name, entry);
    }

    Ok(group)
}

fn shape_from_json(json: &Json, path: &str) -> Result<Vec<usize>, Error> {
    json.as_array()
        .and_then(|dims| {
            dims.iter()
                .map(|d| d.as_u64().and_then(|d| usize::try_from(d).ok()))
                .collect()
        })
        .ok_or_else(|| invalid(path, "shape must be an array of non-negative integers"))
}

fn value_from_json(json: &Json, shape: Option<Vec<usize>>, path: &str) -> Result<Value, Error> {
    let mut leaves = Vec::new();
    let inferred =
        infer_shape(json, &mut leaves).ok_or_else(|| invalid(path, "ragged nested array"))?;
    let data = data_from_leaves(&leaves).ok_or_else(|| {
        invalid(path, "values must be all numbers, all booleans or all strings")
    })?;

    let shape = shape.unwrap_or(inferred);
    let expected = element_count(&shape)
        .ok_or_else(|| invalid(path, format!("shape {:?} is too large", shape)))?;
    if expected != data.len() {
        return Err(invalid(
            path,
            format!("shape {:?} does not match {} values", shape, data.len()),
        ));
    }

    Ok(Value::new(shape, data))
}

/// Flattens `json` in row-major order and returns its shape, or `None` when ragged.
fn infer_shape<'a>(json: &'a Json, leaves: &mut Vec<&'a Json>) -> Option<Vec<usize>> {
    match json {
        Json::Array(items) => {
            let shapes = items
                .iter()
                .map(|item| infer_shape(item, leaves))
                .collect::<Option<Vec<_>>>()?;
            let inner = match shapes.iter().dedup().collect_vec().as_slice() {
                [] => Vec::new(),
                [single] => (*single).clone(),
                _ => return None,
            };
            Some(std::iter::once(items.len()).chain(inner).collect())
        }
        _ => {
            leaves.push(json);
            Some(Vec::new())
        }
    }
}

fn data_from_leaves(leaves: &[&Json]) -> Option<Data> {
    match leaves.first() {
        None => Some(Data::Float(Vec::new())),
        Some(Json::String(_)) => leaves
            .iter()
            .map(|l| l.as_str().map(String::from))
            .collect::<Option<Vec<_>>>()
            .map(Data::String),
        Some(Json::Bool(_)) => leaves
            .iter()
            .map(|l| l.as_bool())
            .collect::<Option<Vec<_>>>()
            .map(Data::Boolean),
        Some(Json::Number(_)) if leaves.iter().all(|l| l.is_i64()) => leaves
            .iter()
            .map(|l| l.as_i64())
            .collect::<Option<Vec<_>>>()
            .map(Data::Integer),
        Some(Json::Number(_)) => leaves
            .iter()
            .map(|l| l.as_f64())
            .collect::<Option<Vec<_>>>()
            .map(Data::Float),
        _ => None,
    }
}

fn invalid(path: &str, reason: impl Into<Cow<'static, str>>) -> Error {
    Error::new(path, ErrorKind::InvalidContainer(reason.into()))
}
