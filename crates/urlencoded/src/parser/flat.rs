use crate::error::BodyError;
use crate::parser::{KeyValueParser, ParseOptions, tokenize};
use crate::value::{FormMap, FormValue};
use std::collections::btree_map::Entry;

/// Flat parser: every key is literal, a repeated key collects its values into an
/// array in body order (`a=1&a=2` gives `a: ["1", "2"]`).
#[derive(Debug, Default, Clone, Copy)]
pub struct FlatParser;

impl KeyValueParser for FlatParser {
    fn name(&self) -> &'static str {
        "flat"
    }

    fn parse(&self, input: &[u8], options: &ParseOptions) -> Result<FormMap, BodyError> {
        let mut map = FormMap::new();

        for (key, value) in tokenize(input, options.max_keys)? {
            match map.entry(key) {
                Entry::Vacant(entry) => {
                    entry.insert(FormValue::String(value));
                }
                Entry::Occupied(mut entry) => match entry.get_mut() {
                    FormValue::Array(values) => values.push(FormValue::String(value)),
                    existing => {
                        let first = std::mem::replace(existing, FormValue::Array(Vec::with_capacity(2)));
                        if let FormValue::Array(values) = existing {
                            values.push(first);
                            values.push(FormValue::String(value));
                        }
                    }
                },
            }
        }

        Ok(map)
    }
}
