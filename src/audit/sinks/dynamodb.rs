//! DynamoDB sink.
//!
//! One `PutItem` per record into the destination table, using the item
//! layout from [`AuditRecord::to_item`].

use crate::audit::record::AuditRecord;
use crate::audit::sink::{AuditSink, SinkKind};
use crate::core::SinkError;
use crate::stream::AttributeValue;
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_dynamodb::config::Region;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::primitives::Blob;
use aws_sdk_dynamodb::types::AttributeValue as SdkValue;
use aws_sdk_dynamodb::Client;
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use std::collections::HashMap;

/// Sink writing records to a DynamoDB table.
#[derive(Debug)]
pub struct DynamoDbSink {
    client: Client,
    table: String,
}

impl DynamoDbSink {
    /// Connect to the table in the given region.
    ///
    /// Credentials come from the default provider chain.
    pub async fn connect(region: &str, table: &str) -> Self {
        let shared = aws_config::defaults(BehaviorVersion::latest())
            .region(Region::new(region.to_string()))
            .load()
            .await;
        Self::with_client(Client::new(&shared), table)
    }

    /// Sink over an existing client.
    pub fn with_client(client: Client, table: &str) -> Self {
        Self {
            client,
            table: table.to_string(),
        }
    }

    /// Destination table name.
    pub fn table(&self) -> &str {
        &self.table
    }
}

#[async_trait]
impl AuditSink for DynamoDbSink {
    async fn put(&self, record: &AuditRecord) -> Result<(), SinkError> {
        let item = to_sdk_item(&record.to_item())?;

        self.client
            .put_item()
            .table_name(&self.table)
            .set_item(Some(item))
            .send()
            .await
            .map_err(|e| SinkError::Write {
                destination: self.table.clone(),
                message: DisplayErrorContext(e).to_string(),
            })?;

        Ok(())
    }

    fn kind(&self) -> SinkKind {
        SinkKind::DynamoDb
    }

    async fn health_check(&self) -> Result<bool, SinkError> {
        let described = self
            .client
            .describe_table()
            .table_name(&self.table)
            .send()
            .await;
        Ok(described.is_ok())
    }
}

fn to_sdk_item(
    item: &HashMap<String, AttributeValue>,
) -> Result<HashMap<String, SdkValue>, SinkError> {
    item.iter()
        .map(|(name, value)| Ok((name.clone(), to_sdk_value(value)?)))
        .collect()
}

fn to_sdk_value(value: &AttributeValue) -> Result<SdkValue, SinkError> {
    Ok(match value {
        AttributeValue::S(s) => SdkValue::S(s.clone()),
        AttributeValue::N(n) => SdkValue::N(n.as_str().to_string()),
        AttributeValue::B(b) => SdkValue::B(decode_blob(b)?),
        AttributeValue::Bool(b) => SdkValue::Bool(*b),
        AttributeValue::Null(b) => SdkValue::Null(*b),
        AttributeValue::M(m) => SdkValue::M(to_sdk_item(m)?),
        AttributeValue::L(l) => SdkValue::L(l.iter().map(to_sdk_value).collect::<Result<_, _>>()?),
        AttributeValue::Ss(ss) => SdkValue::Ss(ss.clone()),
        AttributeValue::Ns(ns) => SdkValue::Ns(ns.iter().map(|n| n.as_str().to_string()).collect()),
        AttributeValue::Bs(bs) => SdkValue::Bs(bs.iter().map(|b| decode_blob(b)).collect::<Result<_, _>>()?),
    })
}

fn decode_blob(text: &str) -> Result<Blob, SinkError> {
    STANDARD
        .decode(text)
        .map(Blob::new)
        .map_err(|e| SinkError::Rejected(format!("invalid base64 binary attribute: {}", e)))
}
