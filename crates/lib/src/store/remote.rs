//! Shared record store backed by a JSON document API.
//!
//! The remote side holds the whole user set as one JSON document in a hosted
//! bin. Reads fetch the latest document version; writes replace the document
//! wholesale and stamp a `lastUpdated` marker. The API has no
//! optimistic-concurrency check, so two devices writing at once can lose one
//! device's update; the sync coordinator treats the remote copy as the source
//! of truth to keep that window small.
//!
//! Sessions and the activity log stay on the device, so this backend only
//! implements [`RecordStore`].

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::SecondsFormat;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use crate::Result;
use crate::clock::Clock;
use crate::store::errors::StoreError;
use crate::store::{RecordSet, RecordStore, WriteReceipt};
use crate::types::UserRecord;

/// Authentication header the document API expects.
const MASTER_KEY_HEADER: &str = "X-Master-Key";

/// How long to wait on a remote request before calling it unreachable.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Where the shared document lives and how to authenticate to it.
#[derive(Clone, Debug)]
pub struct RemoteConfig {
    /// Base URL of the document API, without a trailing slash.
    pub api_base: String,
    /// Identifier of the bin holding the user document.
    pub bin_id: String,
    /// Master key sent on every request.
    pub api_key: String,
}

impl RemoteConfig {
    fn read_url(&self) -> String {
        format!("{}/b/{}/latest", self.api_base, self.bin_id)
    }

    fn write_url(&self) -> String {
        format!("{}/b/{}", self.api_base, self.bin_id)
    }
}

/// The document body as stored in the bin.
///
/// Records are kept as raw JSON values on read so one malformed record can be
/// quarantined without discarding the rest of the document.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredDocument {
    #[serde(default)]
    users: Vec<serde_json::Value>,
    #[serde(default)]
    #[allow(dead_code)]
    last_updated: Option<String>,
}

/// The read endpoint wraps the document in a `record` envelope.
#[derive(Debug, Deserialize)]
struct ReadEnvelope {
    record: StoredDocument,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct WriteDocument<'a> {
    users: &'a [UserRecord],
    last_updated: String,
}

/// HTTP-backed [`RecordStore`] over the shared JSON document.
pub struct RemoteStore {
    config: RemoteConfig,
    client: Client,
    clock: Arc<dyn Clock>,
}

impl RemoteStore {
    /// Build a store for the given bin.
    pub fn new(config: RemoteConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| StoreError::Http {
                reason: "Failed to build HTTP client".into(),
                source: Some(e),
            })?;

        Ok(Self {
            config,
            client,
            clock,
        })
    }
}

#[async_trait]
impl RecordStore for RemoteStore {
    async fn get_all(&self) -> Result<RecordSet> {
        let response = self
            .client
            .get(self.config.read_url())
            .header(MASTER_KEY_HEADER, &self.config.api_key)
            .send()
            .await
            .map_err(|e| StoreError::Http {
                reason: format!("Failed to fetch remote document: {e}"),
                source: Some(e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::RemoteStatus {
                status: status.as_u16(),
            }
            .into());
        }

        let envelope: ReadEnvelope = response.json().await.map_err(|e| StoreError::Http {
            reason: format!("Failed to decode remote document: {e}"),
            source: Some(e),
        })?;

        let mut records = Vec::with_capacity(envelope.record.users.len());
        for value in envelope.record.users {
            match serde_json::from_value::<UserRecord>(value) {
                Ok(record) => records.push(record),
                Err(e) => {
                    // Quarantine the malformed record, keep the rest
                    tracing::warn!(error = %e, "Skipping malformed remote record");
                }
            }
        }

        Ok(RecordSet {
            records,
            degraded: false,
        })
    }

    async fn save_all(&self, records: &[UserRecord]) -> Result<WriteReceipt> {
        let body = WriteDocument {
            users: records,
            last_updated: self
                .clock
                .now_utc()
                .to_rfc3339_opts(SecondsFormat::Millis, true),
        };

        let response = self
            .client
            .put(self.config.write_url())
            .header(MASTER_KEY_HEADER, &self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| StoreError::Http {
                reason: format!("Failed to write remote document: {e}"),
                source: Some(e),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(StoreError::RemoteStatus {
                status: status.as_u16(),
            }
            .into());
        }

        Ok(WriteReceipt { degraded: false })
    }
}
