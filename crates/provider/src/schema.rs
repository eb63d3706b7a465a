//! Resource schema declaration and configuration validation

use serde::Serialize;
use serde_json::{Map, Value};
use std::collections::BTreeMap;

use crate::diag::{Diagnostic, Diagnostics};
use crate::timeouts::Timeouts;

/// Custom validation for a string value; `Err` carries the reason.
pub type StringValidator = fn(&str) -> Result<(), String>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AttributeType {
    String,
    StringList,
}

/// A single attribute declaration.
#[derive(Debug, Clone, Serialize)]
pub struct Attribute {
    #[serde(rename = "type")]
    pub kind: AttributeType,
    pub required: bool,
    pub optional: bool,
    pub computed: bool,
    pub force_new: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_items: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub allowed_values: Option<&'static [&'static str]>,
    #[serde(skip)]
    pub validate: Option<StringValidator>,
}

impl Attribute {
    fn base(kind: AttributeType) -> Self {
        Self {
            kind,
            required: false,
            optional: false,
            computed: false,
            force_new: false,
            min_items: None,
            allowed_values: None,
            validate: None,
        }
    }

    pub fn required_string() -> Self {
        Self {
            required: true,
            ..Self::base(AttributeType::String)
        }
    }

    pub fn optional_string() -> Self {
        Self {
            optional: true,
            ..Self::base(AttributeType::String)
        }
    }

    pub fn computed_string() -> Self {
        Self {
            computed: true,
            ..Self::base(AttributeType::String)
        }
    }

    pub fn optional_string_list() -> Self {
        Self {
            optional: true,
            ..Self::base(AttributeType::StringList)
        }
    }

    pub fn force_new(mut self) -> Self {
        self.force_new = true;
        self
    }

    /// Optional attribute whose value the remote side fills in when unset.
    pub fn computed(mut self) -> Self {
        self.computed = true;
        self
    }

    pub fn min_items(mut self, n: usize) -> Self {
        self.min_items = Some(n);
        self
    }

    pub fn one_of(mut self, values: &'static [&'static str]) -> Self {
        self.allowed_values = Some(values);
        self
    }

    pub fn validate_with(mut self, f: StringValidator) -> Self {
        self.validate = Some(f);
        self
    }

    fn computed_only(&self) -> bool {
        self.computed && !self.optional && !self.required
    }
}

/// Attribute declarations plus the resource's default timeouts.
#[derive(Debug, Clone, Serialize)]
pub struct Schema {
    pub attributes: BTreeMap<&'static str, Attribute>,
    pub timeouts: Timeouts,
}

impl Schema {
    pub fn new(timeouts: Timeouts) -> Self {
        Self {
            attributes: BTreeMap::new(),
            timeouts,
        }
    }

    pub fn with_attribute(mut self, name: &'static str, attribute: Attribute) -> Self {
        self.attributes.insert(name, attribute);
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Attribute> {
        self.attributes.get(name)
    }

    /// Check a configuration against the declarations. Every problem found is
    /// reported; validation does not stop at the first one.
    pub fn validate(&self, config: &Map<String, Value>) -> Diagnostics {
        let mut diags = Diagnostics::new();

        for key in config.keys() {
            if !self.attributes.contains_key(key.as_str()) {
                diags.push(
                    Diagnostic::error(format!("unsupported argument \"{key}\""))
                        .with_attribute(key.as_str()),
                );
            }
        }

        for (&name, attr) in &self.attributes {
            let value = config.get(name).filter(|v| !v.is_null());

            let Some(value) = value else {
                if attr.required {
                    diags.push(
                        Diagnostic::error(format!("missing required argument \"{name}\""))
                            .with_attribute(name),
                    );
                }
                continue;
            };

            if attr.computed_only() {
                diags.push(
                    Diagnostic::error(format!(
                        "can't configure a value for \"{name}\": its value is computed"
                    ))
                    .with_attribute(name),
                );
                continue;
            }

            match attr.kind {
                AttributeType::String => match value.as_str() {
                    Some(s) => {
                        if attr.required && s.is_empty() {
                            diags.push(
                                Diagnostic::error(format!(
                                    "missing required argument \"{name}\""
                                ))
                                .with_attribute(name),
                            );
                        } else if !s.is_empty() {
                            check_string(name, attr, s, &mut diags);
                        }
                    }
                    None => diags.push(
                        Diagnostic::error(format!("\"{name}\" must be a string"))
                            .with_attribute(name),
                    ),
                },
                AttributeType::StringList => {
                    let Some(items) = value.as_array() else {
                        diags.push(
                            Diagnostic::error(format!("\"{name}\" must be a list of strings"))
                                .with_attribute(name),
                        );
                        continue;
                    };
                    if items.iter().any(|v| !v.is_string()) {
                        diags.push(
                            Diagnostic::error(format!("\"{name}\" must be a list of strings"))
                                .with_attribute(name),
                        );
                        continue;
                    }
                    if let Some(min) = attr.min_items
                        && items.len() < min
                    {
                        diags.push(
                            Diagnostic::error(format!(
                                "\"{name}\" requires at least {min} item(s), got {}",
                                items.len()
                            ))
                            .with_attribute(name),
                        );
                    }
                    for item in items.iter().filter_map(Value::as_str) {
                        check_string(name, attr, item, &mut diags);
                    }
                }
            }
        }

        diags
    }
}

fn check_string(name: &str, attr: &Attribute, value: &str, diags: &mut Diagnostics) {
    if let Some(allowed) = attr.allowed_values
        && !allowed.contains(&value)
    {
        diags.push(
            Diagnostic::error(format!(
                "expected \"{name}\" to be one of [{}], got {value}",
                allowed.join(", ")
            ))
            .with_attribute(name),
        );
    }
    if let Some(validate) = attr.validate
        && let Err(reason) = validate(value)
    {
        diags.push(
            Diagnostic::error(format!("invalid value for \"{name}\": {reason}"))
                .with_attribute(name),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    fn twelve_digits(v: &str) -> Result<(), String> {
        if v.len() == 12 && v.chars().all(|c| c.is_ascii_digit()) {
            Ok(())
        } else {
            Err(format!("{v:?} is not a 12-digit account id"))
        }
    }

    fn schema() -> Schema {
        Schema::new(Timeouts::uniform(Duration::from_secs(600)))
            .with_attribute("name", Attribute::required_string().force_new())
            .with_attribute(
                "tier",
                Attribute::required_string()
                    .force_new()
                    .one_of(&["STANDARD", "ENTERPRISE"]),
            )
            .with_attribute(
                "account",
                Attribute::optional_string()
                    .computed()
                    .validate_with(twelve_digits),
            )
            .with_attribute(
                "groups",
                Attribute::optional_string_list().min_items(1).force_new(),
            )
            .with_attribute("status", Attribute::computed_string())
    }

    fn config(v: Value) -> Map<String, Value> {
        match v {
            Value::Object(m) => m,
            _ => panic!("config must be an object"),
        }
    }

    #[test]
    fn valid_config_has_no_diagnostics() {
        let diags = schema().validate(&config(json!({
            "name": "acme",
            "tier": "ENTERPRISE",
            "account": "123456789012",
            "groups": ["admins"],
        })));
        assert!(diags.is_empty(), "unexpected: {diags:?}");
    }

    #[test]
    fn reports_every_problem() {
        let diags = schema().validate(&config(json!({
            "tier": "PLATINUM",
            "account": "12",
            "groups": [],
            "status": "OK",
            "colour": "blue",
        })));
        let attrs: Vec<_> = diags
            .iter()
            .filter_map(|d| d.attribute.as_deref())
            .collect();
        for expected in ["name", "tier", "account", "groups", "status", "colour"] {
            assert!(attrs.contains(&expected), "no diagnostic for {expected}: {diags:?}");
        }
        assert!(diags.has_error());
    }

    #[test]
    fn empty_required_string_is_missing() {
        let diags = schema().validate(&config(json!({"name": "", "tier": "STANDARD"})));
        assert_eq!(diags.len(), 1);
        assert!(diags.iter().next().unwrap().summary.contains("missing required"));
    }

    #[test]
    fn wrong_types_are_rejected() {
        let diags = schema().validate(&config(json!({
            "name": 7,
            "tier": "STANDARD",
            "groups": ["ok", 3],
        })));
        assert_eq!(diags.len(), 2, "{diags:?}");
    }

    #[test]
    fn schema_serializes_without_validators() {
        let json = serde_json::to_value(schema()).unwrap();
        assert_eq!(json["attributes"]["tier"]["type"], "string");
        assert_eq!(json["attributes"]["tier"]["allowed_values"][1], "ENTERPRISE");
        assert_eq!(json["attributes"]["groups"]["min_items"], 1);
        assert!(json["attributes"]["account"].get("validate").is_none());
        assert_eq!(json["timeouts"]["create"], 600);
    }
}
