//! DynamoDB-backed hot tier store
//!
//! Table layout: partition key `pk` holds the UTC date (`YYYY-MM-DD`), sort
//! key `sk` holds `HH:MM:SS#device`, and the `payload` map attribute holds the
//! metric readings for that instant.

use std::collections::HashMap;

use async_trait::async_trait;
use aws_sdk_dynamodb::Client;
use aws_sdk_dynamodb::error::DisplayErrorContext;
use aws_sdk_dynamodb::types::AttributeValue;

use super::BACKEND;
use crate::core::constants::{HOT_PARTITION_KEY, HOT_PAYLOAD_ATTR, HOT_SORT_KEY};
use crate::data::error::DataError;
use crate::data::traits::{HotCursor, HotItem, HotPage, HotPageRequest, HotStore, RawValue};

#[derive(Debug, Clone)]
pub struct DynamoHotStore {
    client: Client,
    table: String,
}

impl DynamoHotStore {
    /// Build a store from shared AWS config, with an optional endpoint override
    /// (DynamoDB Local and similar)
    pub fn new(config: &aws_config::SdkConfig, endpoint: Option<&str>, table: String) -> Self {
        let mut builder = aws_sdk_dynamodb::config::Builder::from(config);
        if let Some(endpoint_url) = endpoint {
            builder = builder.endpoint_url(endpoint_url);
        }
        let client = Client::from_conf(builder.build());

        tracing::debug!(table = %table, endpoint = ?endpoint, "DynamoDB hot tier initialized");
        Self { client, table }
    }
}

#[async_trait]
impl HotStore for DynamoHotStore {
    async fn query_page(
        &self,
        request: &HotPageRequest,
        cursor: Option<HotCursor>,
    ) -> Result<HotPage, DataError> {
        let mut query = self
            .client
            .query()
            .table_name(&self.table)
            .key_condition_expression("#pk = :pk AND #sk BETWEEN :from AND :to")
            .expression_attribute_names("#pk", HOT_PARTITION_KEY)
            .expression_attribute_names("#sk", HOT_SORT_KEY)
            .expression_attribute_values(":pk", AttributeValue::S(request.partition()))
            .expression_attribute_values(":from", AttributeValue::S(request.from_sk.clone()))
            .expression_attribute_values(":to", AttributeValue::S(request.to_sk.clone()));

        if let Some(cursor) = cursor {
            query = query
                .exclusive_start_key(HOT_PARTITION_KEY, AttributeValue::S(cursor.pk))
                .exclusive_start_key(HOT_SORT_KEY, AttributeValue::S(cursor.sk));
        }

        let output = query
            .send()
            .await
            .map_err(|e| DataError::unavailable(BACKEND, DisplayErrorContext(&e).to_string()))?;

        let items = output
            .items()
            .iter()
            .map(item_from_attributes)
            .collect::<Result<Vec<_>, _>>()?;

        let cursor = match output.last_evaluated_key() {
            Some(key) => Some(HotCursor {
                pk: string_attr(key, HOT_PARTITION_KEY)?,
                sk: string_attr(key, HOT_SORT_KEY)?,
            }),
            None => None,
        };

        Ok(HotPage { items, cursor })
    }
}

fn string_attr(item: &HashMap<String, AttributeValue>, name: &str) -> Result<String, DataError> {
    item.get(name)
        .and_then(|v| v.as_s().ok())
        .cloned()
        .ok_or_else(|| DataError::malformed(BACKEND, format!("missing string attribute '{name}'")))
}

/// Map a raw DynamoDB item onto a [`HotItem`]
pub(crate) fn item_from_attributes(
    item: &HashMap<String, AttributeValue>,
) -> Result<HotItem, DataError> {
    let pk = string_attr(item, HOT_PARTITION_KEY)?;
    let sk = string_attr(item, HOT_SORT_KEY)?;

    let payload = match item.get(HOT_PAYLOAD_ATTR) {
        Some(AttributeValue::M(map)) => map
            .iter()
            .filter_map(|(k, v)| raw_value(v).map(|raw| (k.clone(), raw)))
            .collect(),
        Some(_) => {
            return Err(DataError::malformed(
                BACKEND,
                format!("attribute '{HOT_PAYLOAD_ATTR}' is not a map"),
            ));
        }
        None => HashMap::new(),
    };

    Ok(HotItem { pk, sk, payload })
}

/// Scalar attribute conversion; sets, lists and nested maps are not readings
fn raw_value(value: &AttributeValue) -> Option<RawValue> {
    match value {
        AttributeValue::S(s) => Some(RawValue::Text(s.clone())),
        AttributeValue::N(n) => Some(RawValue::Number(n.clone())),
        AttributeValue::Bool(b) => Some(RawValue::Bool(*b)),
        AttributeValue::Null(_) => Some(RawValue::Null),
        other => {
            tracing::trace!(value = ?other, "Skipping non-scalar payload attribute");
            None
        }
    }
}
