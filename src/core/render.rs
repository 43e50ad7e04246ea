use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use tera::{Tera, Value};

use crate::error::Result;

use super::aggregate::PackageBucket;
use super::naming::{self, NamingResolver};

const MOCK_TEMPLATE: &str = include_str!("../templates/mock.go.tera");

/// Everything the template sees.
#[derive(Debug, Serialize)]
pub struct TemplateData {
    pub client_default: bool,
    pub package_name: String,
    pub packages: Vec<PackageBucket>,
}

/// Renders the generated mock source. The naming resolver backs the
/// `ToTitle` filter; `FirstCharLower` and `LowerCaseFirst` synthesize
/// idiomatic local names from display names.
pub struct MockRenderer {
    tera: Tera,
}

impl MockRenderer {
    pub fn new(resolver: NamingResolver) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_template("mock.go", MOCK_TEMPLATE)?;

        let resolver = Arc::new(resolver);
        tera.register_filter("ToTitle", {
            let resolver = resolver.clone();
            move |value: &Value, _: &HashMap<String, Value>| {
                Ok(Value::String(
                    resolver.display_name(expect_str(value, "ToTitle")?),
                ))
            }
        });
        tera.register_filter(
            "FirstCharLower",
            |value: &Value, _: &HashMap<String, Value>| {
                Ok(Value::String(naming::first_char_lower(expect_str(
                    value,
                    "FirstCharLower",
                )?)))
            },
        );
        tera.register_filter(
            "LowerCaseFirst",
            |value: &Value, _: &HashMap<String, Value>| {
                Ok(Value::String(naming::lower_case_first(expect_str(
                    value,
                    "LowerCaseFirst",
                )?)))
            },
        );

        Ok(Self { tera })
    }

    pub fn render(&self, data: &TemplateData) -> Result<String> {
        let context = tera::Context::from_serialize(data)?;
        Ok(self.tera.render("mock.go", &context)?)
    }
}

fn expect_str<'a>(value: &'a Value, filter: &str) -> tera::Result<&'a str> {
    value
        .as_str()
        .ok_or_else(|| tera::Error::msg(format!("{} expects a string", filter)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use crate::core::aggregate::FuncSig;

    fn renderer() -> MockRenderer {
        MockRenderer::new(NamingResolver::new(Config::default().naming_overrides)).unwrap()
    }

    fn data(client_default: bool) -> TemplateData {
        TemplateData {
            client_default,
            package_name: "awsmocked".to_string(),
            packages: vec![PackageBucket {
                path: "github.com/aws/aws-sdk-go-v2/service/dynamodb".to_string(),
                short_name: "dynamodb".to_string(),
                signatures: vec![
                    FuncSig {
                        name: "BatchGetItem".to_string(),
                        return_type: "BatchGetItemOutput".to_string(),
                    },
                    FuncSig {
                        name: "ListTables".to_string(),
                        return_type: "ListTablesOutput".to_string(),
                    },
                ],
            }],
        }
    }

    #[test]
    fn renders_the_display_name_and_operations() {
        let out = renderer().render(&data(false)).unwrap();
        assert!(out.contains("package awsmocked"));
        assert!(out.contains("type MockDynamoDB struct"));
        assert!(out.contains("func WithDynamoDB(d MockDynamoDB)"));
        assert!(out.contains("\"dynamoDBMock\""));
        assert!(out.contains("case \"BatchGetItem\":"));
        assert!(out.contains("*dynamodb.ListTablesOutput"));
    }

    #[test]
    fn client_default_toggles_the_panic_arm() {
        let with_panic = renderer().render(&data(true)).unwrap();
        assert!(with_panic.contains("panic("));
        assert!(!with_panic.contains("next.HandleFinalize"));

        let pass_through = renderer().render(&data(false)).unwrap();
        assert!(!pass_through.contains("panic("));
        assert!(pass_through.contains("next.HandleFinalize"));
    }
}
