//! Service assembly: gateway, OAuth2 authorization, and routed handlers.
//!
//! `Service` is a persistent builder: every configuration step consumes
//! the value and returns an augmented one, so partially configured
//! services can be shared and extended without aliasing surprises.
//! Nothing touches the stack until `register` runs.

use serde_json::json;
use tracing::info;

use skiff_core::BuildConfig;

use crate::gateway::{GatewayProps, register_gateway};
use crate::handler::{FunctionProps, register_function};
use crate::stack::{Resource, Stack, kind};
use crate::{CloudError, Result};

struct Route {
  path: String,
  handler: FunctionProps,
  scopes: Option<Vec<String>>,
}

/// A REST API service: one gateway, optional OAuth2 authorization, and a
/// set of path-prefixed Lambda handlers.
pub struct Service {
  gateway: GatewayProps,
  user_pool_arns: Option<Vec<String>>,
  routes: Vec<Route>,
}

impl Service {
  pub fn new(gateway: GatewayProps) -> Self {
    Self {
      gateway,
      user_pool_arns: None,
      routes: Vec::new(),
    }
  }

  /// Enable OAuth2 authorization of service requests against the given
  /// user pools. Routes declared with scopes will require a valid token.
  pub fn enable_oauth2(mut self, user_pool_arns: Vec<String>) -> Self {
    self.user_pool_arns = Some(user_pool_arns);
    self
  }

  /// Associate a handler with a path prefix. The handler serves the
  /// prefix itself and every subpath under it. Scopes are enforced only
  /// when OAuth2 is enabled on the service.
  pub fn add_resource(
    mut self,
    path: &str,
    handler: FunctionProps,
    scopes: Option<Vec<String>>,
  ) -> Self {
    self.routes.push(Route {
      path: path.to_string(),
      handler,
      scopes,
    });
    self
  }

  /// Materialize the service into resource declarations, in declaration
  /// order: gateway, authorizer, then one function and two ANY methods
  /// (prefix and greedy subpath) per route.
  pub fn register(self, stack: &mut Stack, config: &BuildConfig) -> Result<()> {
    let api_id = register_gateway(stack, &self.gateway)?;

    let authorizer_id = match &self.user_pool_arns {
      Some(arns) => Some(register_authorizer(stack, &api_id, arns)),
      None => None,
    };

    let route_count = self.routes.len();
    for route in self.routes {
      let path = route.path.trim_matches('/');
      if path.is_empty() {
        return Err(CloudError::InvalidPath {
          path: route.path.clone(),
          message: "route path must contain at least one segment".to_string(),
        });
      }

      let function_id = register_function(stack, config, &route.handler)?;

      // Scopes only bind when an authorizer exists on the service.
      let auth = authorizer_id.as_ref().zip(route.scopes.as_ref());
      register_method(stack, &api_id, &function_id, &format!("/{path}"), auth);
      register_method(stack, &api_id, &function_id, &format!("/{path}/{{any+}}"), auth);
    }

    info!(stack = %stack.name, routes = route_count, "registered service");
    Ok(())
  }
}

/// Cognito authorizer reading the bearer token from the Authorization
/// header.
fn register_authorizer(stack: &mut Stack, api_id: &str, user_pool_arns: &[String]) -> String {
  let authorizer_id = format!("{api_id}-oauth2");

  stack.register(Resource {
    id: authorizer_id.clone(),
    kind: kind::AUTHORIZER.to_string(),
    properties: json!({
      "restApi": api_id,
      "name": format!("{}-oauth2", stack.name),
      "type": "COGNITO_USER_POOLS",
      "identitySource": "method.request.header.Authorization",
      "providerArns": user_pool_arns,
    }),
  });

  authorizer_id
}

fn register_method(
  stack: &mut Stack,
  api_id: &str,
  function_id: &str,
  path: &str,
  auth: Option<(&String, &Vec<String>)>,
) {
  let mut properties = json!({
    "restApi": api_id,
    "path": path,
    "httpMethod": "ANY",
    "integration": { "function": function_id },
  });

  if let Some((authorizer_id, scopes)) = auth {
    properties["authorizationType"] = json!("COGNITO_USER_POOLS");
    properties["authorizer"] = json!(authorizer_id);
    properties["authorizationScopes"] = json!(scopes);
    properties["requestParameters"] = json!({
      "method.request.header.Authorization": true,
    });
  }

  stack.register(Resource {
    id: format!("{api_id}{}-method", path.replace('/', "-").replace(['{', '}', '+'], "")),
    kind: kind::METHOD.to_string(),
    properties,
  });
}
