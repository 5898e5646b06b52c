use async_trait::async_trait;
use reqwest::{Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};
use tracing::debug;

use shared::config::DeploymentConfig;
use shared::error::{Result, ScopeError};
use shared::table::ShapeMap;

use super::source::DataSource;
use super::types::{
  DeleteBody, DeleteTarget, DocumentPage, DocumentPageBody, LogChunk, PageRequest, PaginationOpts,
  PatchBody, RawLogPage, StreamLogsBody,
};

/// HTTP transport to a deployment.
///
/// Carries the admin key on every request; the deployment validates it.
/// No client-side request timeout is set — the only timeout the engine
/// reacts to is the deployment's own 504, which feeds the tailer's retry
/// path.
pub struct HttpSource {
  client: Client,
  base_url: String,
  admin_key: String,
  component_id: Option<String>,
}

impl HttpSource {
  pub fn new(cfg: &DeploymentConfig) -> Result<Self> {
    let admin_key = cfg
      .admin_key
      .clone()
      .ok_or(ScopeError::MissingCredentials)?;

    let client = Client::builder()
      .pool_max_idle_per_host(10)
      .build()
      .map_err(|e| ScopeError::RequestFailed(Box::new(e)))?;

    Ok(Self {
      client,
      base_url: cfg.url.trim_end_matches('/').to_string(),
      admin_key,
      component_id: cfg.component_id.clone(),
    })
  }

  pub fn base_url(&self) -> &str {
    &self.base_url
  }

  fn url(&self, path: &str) -> String {
    format!("{}{}", self.base_url, path)
  }

  async fn post_json<B: serde::Serialize, T: DeserializeOwned>(
    &self,
    path: &str,
    body: &B,
  ) -> Result<T> {
    let resp = self
      .client
      .post(self.url(path))
      .header("Authorization", format!("Bearer {}", self.admin_key))
      .json(body)
      .send()
      .await
      .map_err(|e| ScopeError::RequestFailed(Box::new(e)))?;
    Self::decode(path, resp).await
  }

  async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
    let resp = self
      .client
      .get(self.url(path))
      .header("Authorization", format!("Bearer {}", self.admin_key))
      .send()
      .await
      .map_err(|e| ScopeError::RequestFailed(Box::new(e)))?;
    Self::decode(path, resp).await
  }

  async fn decode<T: DeserializeOwned>(path: &str, resp: Response) -> Result<T> {
    let status = resp.status();
    if !status.is_success() {
      return Err(Self::status_error(status, resp).await);
    }

    // Parse in two steps so a null or malformed payload surfaces as a
    // contract violation rather than a generic decode failure.
    let value: Value = resp
      .json()
      .await
      .map_err(|e| ScopeError::InvalidPage(e.to_string()))?;
    if value.is_null() {
      return Err(ScopeError::InvalidPage(format!("{path}: null payload")));
    }
    serde_json::from_value(value).map_err(|e| ScopeError::InvalidPage(format!("{path}: {e}")))
  }

  async fn status_error(status: StatusCode, resp: Response) -> ScopeError {
    match status {
      StatusCode::GATEWAY_TIMEOUT => ScopeError::GatewayTimeout,
      StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
        ScopeError::CredentialsRejected(status.as_u16())
      }
      _ => {
        let mut message = resp.text().await.unwrap_or_default();
        message.truncate(256);
        ScopeError::HttpStatus {
          status: status.as_u16(),
          message,
        }
      }
    }
  }
}

#[async_trait]
impl DataSource for HttpSource {
  async fn stream_logs(&self, cursor: Option<String>) -> Result<LogChunk> {
    debug!(cursor = ?cursor, "polling log stream");
    let raw: RawLogPage = self
      .post_json("/api/stream_logs", &StreamLogsBody { cursor })
      .await
      .map_err(|e| match e {
        // A log payload that fails to decode is a contract violation of
        // its own flavor, distinct from a bad document page.
        ScopeError::InvalidPage(msg) => {
          ScopeError::InvalidLogPayload(msg.into())
        }
        other => other,
      })?;

    Ok(LogChunk {
      entries: raw.entries.into_iter().map(|r| r.into_entry()).collect(),
      new_cursor: raw.new_cursor,
    })
  }

  async fn table_shapes(&self) -> Result<ShapeMap> {
    self.get_json("/api/shapes").await
  }

  async fn document_page(&self, req: PageRequest) -> Result<DocumentPage> {
    debug!(table = %req.table, cursor = ?req.cursor, "fetching document page");
    let body = DocumentPageBody {
      pagination_opts: PaginationOpts {
        cursor: req.cursor,
        num_items: req.num_items,
        id: req.query_id,
      },
      table: req.table,
      filters: req.filters,
      component_id: req.component_id.clone().or_else(|| self.component_id.clone()),
    };
    self.post_json("/api/documents/page", &body).await
  }

  async fn patch_documents(
    &self,
    table: &str,
    ids: &[String],
    fields: &Map<String, Value>,
  ) -> Result<()> {
    let body = PatchBody {
      table: table.to_string(),
      ids: ids.to_vec(),
      fields: fields.clone(),
    };
    let _: Value = self.post_json("/api/documents/patch", &body).await?;
    Ok(())
  }

  async fn delete_documents(&self, targets: &[DeleteTarget]) -> Result<()> {
    let body = DeleteBody {
      to_delete: targets.to_vec(),
    };
    let _: Value = self.post_json("/api/documents/delete", &body).await?;
    Ok(())
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn construction_requires_credentials() {
    let cfg = DeploymentConfig {
      url: "http://localhost:3210".to_string(),
      admin_key: None,
      component_id: None,
    };
    assert!(matches!(
      HttpSource::new(&cfg),
      Err(ScopeError::MissingCredentials)
    ));
  }

  #[test]
  fn trailing_slash_is_normalized() {
    let cfg = DeploymentConfig {
      url: "http://localhost:3210/".to_string(),
      admin_key: Some("key".to_string()),
      component_id: None,
    };
    let source = HttpSource::new(&cfg).unwrap();
    assert_eq!(source.url("/api/shapes"), "http://localhost:3210/api/shapes");
  }
}
