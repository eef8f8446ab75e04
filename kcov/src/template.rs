//! Embedded Tera templates of the coverage runtime.
//!
//! Please see the [`synth` module] for the data the templates are rendered with.
//!
//! [`synth` module]: ../synth/index.html

use utils::escape_c_string;

use serde_json::Value;
use tera::{Error, Result, Tera};

use std::collections::HashMap;

/// Name of the template producing the support block placed before the first function.
pub const RUNTIME_TEMPLATE: &str = "runtime.c";

/// Name of the template producing the statements placed at the start of `main`.
pub const INIT_TEMPLATE: &str = "init.c";

/// Creates the template registry holding the runtime templates.
///
/// The registry additionally contains the following filters:
///
/// | Filter | Action |
/// |--------|--------|
/// | `c_string` | Escapes a string for use inside a C string literal |
pub fn new() -> Result<Tera> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        (RUNTIME_TEMPLATE, include_str!("../res/templates/runtime.c.tera")),
        (INIT_TEMPLATE, include_str!("../res/templates/init.c.tera")),
    ])?;
    tera.autoescape_on(Vec::new());
    tera.register_filter("c_string", c_string);
    Ok(tera)
}

/// Provides the `c_string` filter.
fn c_string(value: &Value, _: &HashMap<String, Value>) -> Result<Value> {
    let string = value.as_str().ok_or_else(|| Error::msg("expecting string to escape"))?;
    Ok(Value::String(escape_c_string(string)))
}

#[test]
fn test_c_string_filter() {
    use tera::Context;

    let mut tera = new().unwrap();
    tera.add_raw_template("probe", r#""{{ text | c_string }}""#).unwrap();
    let mut context = Context::new();
    context.insert("text", r#"s == "a\b""#);
    assert_eq!(tera.render("probe", &context).unwrap(), r#""s == \"a\\b\"""#);

    context.insert("text", &3);
    assert!(tera.render("probe", &context).is_err());
}
