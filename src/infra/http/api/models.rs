//! Request bodies accepted by the catalog API.
//!
//! Fields are captured as raw JSON so that type mistakes are reported per field instead of
//! failing the whole body. An absent field and an explicit `null` are kept apart.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use crate::application::catalog::{CategoryCommand, ProductCommand, Violations};
use crate::domain::price::Price;

const NOT_NULL: &str = "this field may not be null";
const NOT_A_STRING: &str = "not a valid string";
const NOT_A_PK: &str = "incorrect type, expected pk value";

fn present<'de, D>(deserializer: D) -> Result<Option<Value>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Default, Deserialize)]
pub struct CategoryRequest {
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Value>,
}

impl CategoryRequest {
    pub fn into_command(self) -> Result<CategoryCommand, Violations> {
        let mut violations = Violations::new();
        let command = CategoryCommand {
            name: required_string("name", self.name, &mut violations),
            description: nullable_string("description", self.description, &mut violations),
        };
        violations.into_result().map(|()| command)
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ProductRequest {
    #[serde(default, deserialize_with = "present")]
    pub name: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub description: Option<Value>,
    #[serde(default, deserialize_with = "present")]
    pub price: Option<Value>,
    #[serde(default, alias = "category", deserialize_with = "present")]
    pub category_id: Option<Value>,
}

impl ProductRequest {
    pub fn into_command(self) -> Result<ProductCommand, Violations> {
        let mut violations = Violations::new();
        let name = required_string("name", self.name, &mut violations);
        let description = nullable_string("description", self.description, &mut violations);

        let price = match self.price {
            None => None,
            Some(Value::Null) => {
                violations.push("price", NOT_NULL);
                None
            }
            Some(value) => match Price::from_json(&value) {
                Ok(price) => Some(price),
                Err(err) => {
                    violations.push("price", err.to_string());
                    None
                }
            },
        };

        let category_id = match self.category_id {
            None => None,
            Some(Value::Null) => {
                violations.push("category_id", NOT_NULL);
                None
            }
            Some(value) => match pk_value(&value) {
                Some(id) => Some(id),
                None => {
                    violations.push("category_id", NOT_A_PK);
                    None
                }
            },
        };

        let command = ProductCommand {
            name,
            description,
            price,
            category_id,
        };
        violations.into_result().map(|()| command)
    }
}

fn required_string(
    field: &'static str,
    value: Option<Value>,
    violations: &mut Violations,
) -> Option<String> {
    match value {
        None => None,
        Some(Value::String(text)) => Some(text),
        Some(Value::Null) => {
            violations.push(field, NOT_NULL);
            None
        }
        Some(_) => {
            violations.push(field, NOT_A_STRING);
            None
        }
    }
}

fn nullable_string(
    field: &'static str,
    value: Option<Value>,
    violations: &mut Violations,
) -> Option<Option<String>> {
    match value {
        None => None,
        Some(Value::Null) => Some(None),
        Some(Value::String(text)) => Some(Some(text)),
        Some(_) => {
            violations.push(field, NOT_A_STRING);
            None
        }
    }
}

fn pk_value(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64(),
        Value::String(text) => text.trim().parse().ok(),
        _ => None,
    }
}
