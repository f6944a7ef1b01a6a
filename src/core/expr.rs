//! Lazy expression trees and their wire encoding.
//!
//! Every builder in this crate produces an [`Expr`]: a description of a
//! computation the platform performs later. Nothing is evaluated locally.
//! [`Expression::encode`] flattens the tree into the REST `Expression`
//! form, hoisting function bodies into the shared `values` table.

use crate::types::GeeResult;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};

static PENDING_ARGUMENTS: AtomicUsize = AtomicUsize::new(0);

/// Node of an unevaluated platform computation
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Constant(serde_json::Value),
    Array(Vec<Expr>),
    Dictionary(BTreeMap<String, Expr>),
    Invocation {
        function: String,
        arguments: BTreeMap<String, Expr>,
    },
    Function {
        parameters: Vec<String>,
        body: Box<Expr>,
    },
    Argument(String),
}

impl Expr {
    /// Invoke a platform algorithm with named arguments
    pub fn call<I, K>(function: &str, arguments: I) -> Self
    where
        I: IntoIterator<Item = (K, Expr)>,
        K: Into<String>,
    {
        Expr::Invocation {
            function: function.to_string(),
            arguments: arguments.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }

    pub fn constant(value: impl Into<serde_json::Value>) -> Self {
        Expr::Constant(value.into())
    }

    pub fn string(value: &str) -> Self {
        Expr::Constant(serde_json::Value::String(value.to_string()))
    }

    pub fn strings<S: AsRef<str>>(values: &[S]) -> Self {
        Expr::Array(values.iter().map(|s| Expr::string(s.as_ref())).collect())
    }

    /// Name of the invoked algorithm, if this node is an invocation
    pub fn function_name(&self) -> Option<&str> {
        match self {
            Expr::Invocation { function, .. } => Some(function),
            _ => None,
        }
    }

    pub fn argument(&self, name: &str) -> Option<&Expr> {
        match self {
            Expr::Invocation { arguments, .. } => arguments.get(name),
            _ => None,
        }
    }

    /// Build a one-parameter function whose body is produced by `f`.
    ///
    /// Parameter names follow the platform's `_MAPPING_VAR_<depth>_0`
    /// convention, where depth counts the functions nested in the body.
    pub fn lambda<F>(f: F) -> Self
    where
        F: FnOnce(Expr) -> Expr,
    {
        let pending = format!(
            "__pending_{}",
            PENDING_ARGUMENTS.fetch_add(1, Ordering::Relaxed)
        );
        let body = f(Expr::Argument(pending.clone()));
        let name = format!("_MAPPING_VAR_{}_0", body.function_depth());
        Expr::Function {
            parameters: vec![name.clone()],
            body: Box::new(body.rename_argument(&pending, &name)),
        }
    }

    fn function_depth(&self) -> usize {
        match self {
            Expr::Constant(_) | Expr::Argument(_) => 0,
            Expr::Array(items) => items.iter().map(Expr::function_depth).max().unwrap_or(0),
            Expr::Dictionary(items) | Expr::Invocation { arguments: items, .. } => {
                items.values().map(Expr::function_depth).max().unwrap_or(0)
            }
            Expr::Function { body, .. } => body.function_depth() + 1,
        }
    }

    fn rename_argument(self, from: &str, to: &str) -> Expr {
        match self {
            Expr::Argument(name) if name == from => Expr::Argument(to.to_string()),
            Expr::Array(items) => {
                Expr::Array(items.into_iter().map(|e| e.rename_argument(from, to)).collect())
            }
            Expr::Dictionary(items) => Expr::Dictionary(
                items.into_iter().map(|(k, e)| (k, e.rename_argument(from, to))).collect(),
            ),
            Expr::Invocation { function, arguments } => Expr::Invocation {
                function,
                arguments: arguments
                    .into_iter()
                    .map(|(k, e)| (k, e.rename_argument(from, to)))
                    .collect(),
            },
            Expr::Function { parameters, body } => Expr::Function {
                parameters,
                body: Box::new(body.rename_argument(from, to)),
            },
            other => other,
        }
    }
}

/// Wire form of a single value in an encoded expression
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueNode {
    ConstantValue(serde_json::Value),
    ArrayValue {
        values: Vec<ValueNode>,
    },
    DictionaryValue {
        values: BTreeMap<String, ValueNode>,
    },
    #[serde(rename_all = "camelCase")]
    FunctionInvocationValue {
        function_name: String,
        arguments: BTreeMap<String, ValueNode>,
    },
    #[serde(rename_all = "camelCase")]
    FunctionDefinitionValue {
        argument_names: Vec<String>,
        body: String,
    },
    ArgumentReference(String),
    ValueReference(String),
}

/// Encoded computation graph as accepted by the REST API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Expression {
    pub result: String,
    pub values: BTreeMap<String, ValueNode>,
}

impl Expression {
    /// Flatten an expression tree. Identical function bodies share one entry.
    pub fn encode(expr: &Expr) -> Self {
        let mut encoder = Encoder::default();
        let root = encoder.node(expr);
        let result = encoder.intern(root);
        Self {
            result,
            values: encoder.values,
        }
    }

    pub fn to_json(&self) -> GeeResult<serde_json::Value> {
        Ok(serde_json::to_value(self)?)
    }

    /// Root node of the graph
    pub fn root(&self) -> Option<&ValueNode> {
        self.values.get(&self.result)
    }
}

#[derive(Default)]
struct Encoder {
    values: BTreeMap<String, ValueNode>,
}

impl Encoder {
    fn intern(&mut self, node: ValueNode) -> String {
        if let Some((key, _)) = self.values.iter().find(|(_, existing)| **existing == node) {
            return key.clone();
        }
        let key = self.values.len().to_string();
        self.values.insert(key.clone(), node);
        key
    }

    fn node(&mut self, expr: &Expr) -> ValueNode {
        match expr {
            Expr::Constant(value) => ValueNode::ConstantValue(value.clone()),
            Expr::Array(items) => ValueNode::ArrayValue {
                values: items.iter().map(|e| self.node(e)).collect(),
            },
            Expr::Dictionary(items) => ValueNode::DictionaryValue {
                values: items.iter().map(|(k, e)| (k.clone(), self.node(e))).collect(),
            },
            Expr::Invocation { function, arguments } => ValueNode::FunctionInvocationValue {
                function_name: function.clone(),
                arguments: arguments.iter().map(|(k, e)| (k.clone(), self.node(e))).collect(),
            },
            Expr::Function { parameters, body } => {
                let body_node = self.node(body);
                ValueNode::FunctionDefinitionValue {
                    argument_names: parameters.clone(),
                    body: self.intern(body_node),
                }
            }
            Expr::Argument(name) => ValueNode::ArgumentReference(name.clone()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_invocation_encoding() {
        let expr = Expr::call("ImageCollection.load", [("id", Expr::string("UCSB-CHG/CHIRPS/DAILY"))]);
        let encoded = Expression::encode(&expr).to_json().unwrap();
        assert_eq!(
            encoded,
            json!({
                "result": "0",
                "values": {
                    "0": {
                        "functionInvocationValue": {
                            "functionName": "ImageCollection.load",
                            "arguments": {"id": {"constantValue": "UCSB-CHG/CHIRPS/DAILY"}}
                        }
                    }
                }
            })
        );
    }

    #[test]
    fn test_lambda_body_is_hoisted() {
        let mapper = Expr::lambda(|image| {
            Expr::call("Image.select", [("input", image), ("bandSelectors", Expr::strings(&["label"]))])
        });
        let expr = Expr::call(
            "Collection.map",
            [
                ("collection", Expr::call("ImageCollection.load", [("id", Expr::string("X"))])),
                ("baseAlgorithm", mapper),
            ],
        );
        let encoded = Expression::encode(&expr);
        assert_eq!(encoded.values.len(), 2);

        let body_key = encoded
            .values
            .values()
            .find_map(|node| match node {
                ValueNode::FunctionInvocationValue { arguments, .. } => {
                    match arguments.get("baseAlgorithm") {
                        Some(ValueNode::FunctionDefinitionValue { argument_names, body }) => {
                            assert_eq!(argument_names, &vec!["_MAPPING_VAR_0_0".to_string()]);
                            Some(body.clone())
                        }
                        _ => None,
                    }
                }
                _ => None,
            })
            .expect("map invocation with function definition");

        match &encoded.values[&body_key] {
            ValueNode::FunctionInvocationValue { function_name, arguments } => {
                assert_eq!(function_name, "Image.select");
                assert_eq!(
                    arguments["input"],
                    ValueNode::ArgumentReference("_MAPPING_VAR_0_0".to_string())
                );
            }
            other => panic!("unexpected body node: {:?}", other),
        }
    }

    #[test]
    fn test_nested_lambda_depth() {
        let outer = Expr::lambda(|x| {
            Expr::call("Collection.map", [("collection", x), ("baseAlgorithm", Expr::lambda(|y| y))])
        });
        match outer {
            Expr::Function { parameters, .. } => assert_eq!(parameters[0], "_MAPPING_VAR_1_0"),
            other => panic!("expected function, got {:?}", other),
        }
    }

    #[test]
    fn test_roundtrip_through_json() {
        let expr = Expr::call("Reducer.mean", Vec::<(String, Expr)>::new());
        let encoded = Expression::encode(&expr);
        let text = serde_json::to_string(&encoded).unwrap();
        let decoded: Expression = serde_json::from_str(&text).unwrap();
        assert_eq!(decoded, encoded);
    }
}
