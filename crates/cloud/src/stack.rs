//! The registration seam to the external orchestration engine.
//!
//! A [`Stack`] is a flat, ordered collection of resource declarations.
//! Builders in this crate append declarations; `synth` serializes the
//! whole set into the document the engine consumes. Nothing here talks
//! to a cloud API.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

/// Resource kind identifiers understood by the orchestration engine.
pub mod kind {
  pub const REST_API: &str = "AWS::ApiGateway::RestApi";
  pub const STAGE: &str = "AWS::ApiGateway::Stage";
  pub const AUTHORIZER: &str = "AWS::ApiGateway::Authorizer";
  pub const METHOD: &str = "AWS::ApiGateway::Method";
  pub const DOMAIN_NAME: &str = "AWS::ApiGateway::DomainName";
  pub const RECORD_SET: &str = "AWS::Route53::RecordSet";
  pub const FUNCTION: &str = "AWS::Lambda::Function";
}

/// A single declared resource: opaque to this crate beyond its identity
/// and kind, interpreted by the engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Resource {
  pub id: String,
  pub kind: String,
  pub properties: Value,
}

/// An ordered set of resource declarations registered under one
/// deployment unit.
#[derive(Debug, Serialize)]
pub struct Stack {
  pub name: String,
  resources: Vec<Resource>,
}

impl Stack {
  pub fn new(name: &str) -> Self {
    Self {
      name: name.to_string(),
      resources: Vec::new(),
    }
  }

  /// Register a resource declaration. Declaration order is preserved in
  /// the synthesized document.
  pub fn register(&mut self, resource: Resource) {
    debug!(id = %resource.id, kind = %resource.kind, "registered resource");
    self.resources.push(resource);
  }

  pub fn resources(&self) -> &[Resource] {
    &self.resources
  }

  /// Number of declared resources of the given kind.
  pub fn count_kind(&self, kind: &str) -> usize {
    self.resources.iter().filter(|r| r.kind == kind).count()
  }

  /// Serialize the declarations into the document handed to the
  /// orchestration engine.
  pub fn synth(&self) -> Value {
    serde_json::json!({
      "stack": self.name,
      "resources": self.resources,
    })
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_json::json;

  #[test]
  fn registration_preserves_order() {
    let mut stack = Stack::new("test");
    stack.register(Resource {
      id: "first".to_string(),
      kind: kind::REST_API.to_string(),
      properties: json!({}),
    });
    stack.register(Resource {
      id: "second".to_string(),
      kind: kind::STAGE.to_string(),
      properties: json!({}),
    });

    let ids: Vec<&str> = stack.resources().iter().map(|r| r.id.as_str()).collect();
    assert_eq!(ids, vec!["first", "second"]);
  }

  #[test]
  fn synth_emits_stack_name_and_resources() {
    let mut stack = Stack::new("test");
    stack.register(Resource {
      id: "api".to_string(),
      kind: kind::REST_API.to_string(),
      properties: json!({"name": "test"}),
    });

    let doc = stack.synth();
    assert_eq!(doc["stack"], "test");
    assert_eq!(doc["resources"].as_array().unwrap().len(), 1);
    assert_eq!(doc["resources"][0]["kind"], kind::REST_API);
  }

  #[test]
  fn count_kind_filters_by_kind() {
    let mut stack = Stack::new("test");
    for i in 0..3 {
      stack.register(Resource {
        id: format!("m{i}"),
        kind: kind::METHOD.to_string(),
        properties: json!({}),
      });
    }
    assert_eq!(stack.count_kind(kind::METHOD), 3);
    assert_eq!(stack.count_kind(kind::REST_API), 0);
  }
}
