//! REST API gateway declaration with optional custom-domain DNS binding.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::stack::{Resource, Stack, kind};
use crate::{CloudError, Result};

/// How the gateway endpoint is exposed. Only regional endpoints are
/// produced by the defaults; the type exists so callers can override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EndpointType {
  Regional,
  EdgeOptimized,
}

/// Configuration for the REST API gateway.
///
/// The defaults match the opinionated service shape: an auto-deployed
/// `api` stage, a regional endpoint, permissive CORS preflight with a
/// 10-minute cache, and synthesis failing on template warnings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GatewayProps {
  /// Gateway name; defaults to the stack name at registration time.
  pub name: Option<String>,

  /// Deployment stage, auto-deployed.
  pub stage: String,

  pub endpoint_type: EndpointType,

  /// Max age for cached CORS preflight responses, in seconds.
  pub cors_max_age_secs: u64,

  pub fail_on_warnings: bool,

  /// Fully qualified host for the custom domain, e.g. `api.example.com`.
  pub host: Option<String>,

  /// ARN of the TLS certificate covering `host`.
  pub tls_arn: Option<String>,
}

impl Default for GatewayProps {
  fn default() -> Self {
    Self {
      name: None,
      stage: "api".to_string(),
      endpoint_type: EndpointType::Regional,
      cors_max_age_secs: 600,
      fail_on_warnings: true,
      host: None,
      tls_arn: None,
    }
  }
}

impl GatewayProps {
  pub fn named(name: &str) -> Self {
    Self {
      name: Some(name.to_string()),
      ..Default::default()
    }
  }

  /// Bind the gateway to a custom domain secured by the given
  /// certificate. Registration will emit the domain name resource and a
  /// DNS alias record in the host's parent zone.
  pub fn with_domain(mut self, host: &str, tls_arn: &str) -> Self {
    self.host = Some(host.to_string());
    self.tls_arn = Some(tls_arn.to_string());
    self
  }
}

/// Derive the hosted zone apex from a fully qualified host by dropping
/// its first label: `api.example.com` -> `example.com`.
pub fn zone_apex(host: &str) -> Result<String> {
  match host.split_once('.') {
    Some((_, apex)) if !apex.is_empty() => Ok(apex.to_string()),
    _ => Err(CloudError::InvalidHost {
      host: host.to_string(),
    }),
  }
}

/// Register the gateway resources and return the API resource id other
/// declarations reference.
pub(crate) fn register_gateway(stack: &mut Stack, props: &GatewayProps) -> Result<String> {
  let name = props.name.clone().unwrap_or_else(|| stack.name.clone());
  let api_id = format!("{name}-gateway");

  stack.register(Resource {
    id: api_id.clone(),
    kind: kind::REST_API.to_string(),
    properties: json!({
      "name": name,
      "endpointType": props.endpoint_type,
      "failOnWarnings": props.fail_on_warnings,
      "corsPreflight": {
        "allowOrigins": ["*"],
        "maxAgeSeconds": props.cors_max_age_secs,
      },
    }),
  });

  stack.register(Resource {
    id: format!("{api_id}-stage"),
    kind: kind::STAGE.to_string(),
    properties: json!({
      "restApi": api_id,
      "stageName": props.stage,
      "autoDeploy": true,
    }),
  });

  match (&props.host, &props.tls_arn) {
    (Some(host), Some(tls_arn)) => register_domain(stack, &api_id, props, host, tls_arn)?,
    (None, None) => {}
    // Half a domain binding is a configuration error, never silently
    // skipped.
    (host, tls_arn) => {
      return Err(CloudError::InvalidDomainConfig {
        host: host.clone(),
        tls_arn: tls_arn.clone(),
      });
    }
  }

  Ok(api_id)
}

/// Custom domain: a DomainName resource mapped onto the API plus an
/// alias A-record in the parent hosted zone.
fn register_domain(
  stack: &mut Stack,
  api_id: &str,
  props: &GatewayProps,
  host: &str,
  tls_arn: &str,
) -> Result<()> {
  let zone = zone_apex(host)?;

  let domain_id = format!("{api_id}-domain");
  stack.register(Resource {
    id: domain_id.clone(),
    kind: kind::DOMAIN_NAME.to_string(),
    properties: json!({
      "domainName": host,
      "certificateArn": tls_arn,
      "endpointType": props.endpoint_type,
      "mapping": { "restApi": api_id },
    }),
  });

  stack.register(Resource {
    id: format!("{api_id}-arecord"),
    kind: kind::RECORD_SET.to_string(),
    properties: json!({
      "zone": zone,
      "recordName": host,
      "recordType": "A",
      "ttlSeconds": 60,
      "aliasTarget": domain_id,
    }),
  });

  Ok(())
}
