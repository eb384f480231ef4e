use serde_json::{Map, Value as JsonValue};
use std::{
    borrow::Cow,
    collections::{BTreeMap, HashMap},
    hash::BuildHasher,
};

///
/// InputSource
///
/// Generic, name-addressed input a row is parsed from. Each field asks for
/// its raw text; `None` means the input does not carry the field.
///

pub trait InputSource {
    fn text(&self, name: &str) -> Option<Cow<'_, str>>;
}

impl InputSource for Map<String, JsonValue> {
    fn text(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).and_then(json_text)
    }
}

impl InputSource for JsonValue {
    fn text(&self, name: &str) -> Option<Cow<'_, str>> {
        self.as_object().and_then(|map| map.text(name))
    }
}

impl InputSource for BTreeMap<String, String> {
    fn text(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(|s| Cow::Borrowed(s.as_str()))
    }
}

impl<S: BuildHasher> InputSource for HashMap<String, String, S> {
    fn text(&self, name: &str) -> Option<Cow<'_, str>> {
        self.get(name).map(|s| Cow::Borrowed(s.as_str()))
    }
}

// Arrays flatten to the comma-separated form multi-valued fields expect.
fn json_text(value: &JsonValue) -> Option<Cow<'_, str>> {
    match value {
        JsonValue::Null | JsonValue::Object(_) => None,
        JsonValue::String(s) => Some(Cow::Borrowed(s.as_str())),
        JsonValue::Bool(b) => Some(Cow::Owned(b.to_string())),
        JsonValue::Number(n) => Some(Cow::Owned(n.to_string())),
        JsonValue::Array(items) => {
            let parts: Vec<Cow<'_, str>> = items.iter().filter_map(json_text).collect();

            Some(Cow::Owned(parts.join(",")))
        }
    }
}
