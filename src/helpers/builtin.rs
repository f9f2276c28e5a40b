//! Built-in helpers. Each is a leaf plugin consuming only the public
//! helper contract.

use super::{Helper, HelperPlacement, Options};
use crate::error::{Error, Result};
use crate::render::{is_falsy, value_to_string};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

/// Register the default helper set under its conventional names.
pub(crate) fn register_defaults(helpers: &mut HashMap<String, Arc<dyn Helper>>) {
    helpers.insert("if".to_string(), Arc::new(IfHelper));
    helpers.insert("unless".to_string(), Arc::new(UnlessHelper));
    helpers.insert("with".to_string(), Arc::new(WithHelper));
    helpers.insert("each".to_string(), Arc::new(EachHelper));
    helpers.insert("isEven".to_string(), Arc::new(NumberParityHelper { even: true }));
    helpers.insert("isOdd".to_string(), Arc::new(NumberParityHelper { even: false }));
    helpers.insert("eval".to_string(), Arc::new(EvalHelper));
}

fn required_param(options: &Options<'_, '_>, index: usize) -> Result<Value> {
    options.param(index).cloned().ok_or_else(|| {
        Error::invalid_helper_call(
            format!(
                "helper '{}' requires at least {} parameter(s)",
                options.tag_info().name,
                index + 1
            ),
            options.tag_info().line,
        )
    })
}

/// `{{#if condition}}...{{else}}...{{/if}}`
pub struct IfHelper;

impl Helper for IfHelper {
    fn placement(&self) -> HelperPlacement {
        HelperPlacement::Block
    }

    fn execute(&self, options: &mut Options<'_, '_>) -> Result<()> {
        let condition = required_param(options, 0)?;
        if is_falsy(&condition) {
            options.render_inverse()
        } else {
            options.render_body()
        }
    }
}

/// `{{#unless condition}}...{{/unless}}`
pub struct UnlessHelper;

impl Helper for UnlessHelper {
    fn placement(&self) -> HelperPlacement {
        HelperPlacement::Block
    }

    fn execute(&self, options: &mut Options<'_, '_>) -> Result<()> {
        let condition = required_param(options, 0)?;
        if is_falsy(&condition) {
            options.render_body()
        } else {
            options.render_inverse()
        }
    }
}

/// `{{#with value}}...{{/with}}` — renders the body once with the value
/// pushed as the current frame.
pub struct WithHelper;

impl Helper for WithHelper {
    fn placement(&self) -> HelperPlacement {
        HelperPlacement::Block
    }

    fn execute(&self, options: &mut Options<'_, '_>) -> Result<()> {
        let value = required_param(options, 0)?;
        options.push(value);
        let result = options.render_body();
        options.pop()?;
        result
    }
}

/// `{{#each list}}...{{else}}...{{/each}}`
///
/// Each element is pushed as the current frame, with an `iter` metadata
/// frame beneath it exposing `index`, `position`, `first`, `last`,
/// `has_next` and `count`.
pub struct EachHelper;

impl Helper for EachHelper {
    fn placement(&self) -> HelperPlacement {
        HelperPlacement::Block
    }

    fn execute(&self, options: &mut Options<'_, '_>) -> Result<()> {
        let value = required_param(options, 0)?;
        let items = match value {
            Value::Array(items) => items,
            Value::Null => return options.render_inverse(),
            other => {
                return Err(Error::invalid_helper_call(
                    format!("'each' expects a list, got {}", type_name(&other)),
                    options.tag_info().line,
                ));
            }
        };
        if items.is_empty() {
            return options.render_inverse();
        }

        let count = items.len();
        for (index, item) in items.into_iter().enumerate() {
            options.push(json!({
                "iter": {
                    "index": index,
                    "position": index,
                    "first": index == 0,
                    "last": index + 1 == count,
                    "has_next": index + 1 < count,
                    "count": count,
                }
            }));
            options.push(item);
            let result = options.render_body();
            options.pop()?;
            options.pop()?;
            result?;
        }
        Ok(())
    }
}

/// Number parity test, usable inline or as a block:
///
/// `{{isEven idx "evenRow"}}`, `{{isEven idx "evenRow" "oddRow"}}`,
/// `{{#isEven idx}}...{{/isEven}}`.
pub struct NumberParityHelper {
    pub even: bool,
}

impl Helper for NumberParityHelper {
    fn execute(&self, options: &mut Options<'_, '_>) -> Result<()> {
        let Some(Value::Number(n)) = options.param(0).cloned() else {
            return Ok(());
        };
        let Some(value) = n.as_i64() else {
            return Ok(());
        };
        let matches = (value % 2 == 0) == self.even;

        if options.is_block() {
            if matches {
                options.render_body()
            } else {
                options.render_inverse()
            }
        } else if matches {
            match options.param(1).cloned() {
                Some(text) => options.write(&value_to_string(&text)),
                None => Err(Error::invalid_helper_call(
                    format!(
                        "inline '{}' requires a value parameter",
                        options.tag_info().name
                    ),
                    options.tag_info().line,
                )),
            }
        } else {
            match options.param(2).cloned() {
                Some(text) => options.write(&value_to_string(&text)),
                None => Ok(()),
            }
        }
    }
}

/// `{{eval 'base' key ...}}` — joins its parameters into a key path built
/// at render time and resolves it through the chain.
pub struct EvalHelper;

impl Helper for EvalHelper {
    fn execute(&self, options: &mut Options<'_, '_>) -> Result<()> {
        if options.params().is_empty() {
            return Err(Error::invalid_helper_call(
                "'eval' requires at least one parameter",
                options.tag_info().line,
            ));
        }
        let key = options
            .params()
            .iter()
            .map(value_to_string)
            .collect::<Vec<_>>()
            .join(".");

        let resolved = options.resolve(&key);
        if options.is_block() {
            match resolved {
                Some(value) if !is_falsy(&value) => {
                    options.push(value);
                    let result = options.render_body();
                    options.pop()?;
                    result
                }
                _ => Ok(()),
            }
        } else {
            match resolved {
                Some(Value::Null) | None => match options.missing_value(&key)? {
                    Some(value) => options.write_value(&value),
                    None => Ok(()),
                },
                Some(value) => options.write_value(&value),
            }
        }
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
