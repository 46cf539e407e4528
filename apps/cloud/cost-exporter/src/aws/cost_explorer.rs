//! Cost Explorer (`GetCostAndUsage`)

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_costexplorer::config::Region;
use aws_sdk_costexplorer::operation::get_cost_and_usage::GetCostAndUsageOutput;
use aws_sdk_costexplorer::types::{
    DateInterval, Dimension, DimensionValues, Expression, Granularity, GroupDefinition,
    GroupDefinitionType,
};
use aws_sdk_costexplorer::Client;
use chrono::NaiveDate;
use domain_pricing::billing::{
    BillingClient, CostAndUsagePage, CostGroup, MetricValue, ResultByTime, METRIC_UNBLENDED_COST,
    METRIC_USAGE_QUANTITY,
};
use domain_pricing::PricingResult;

use super::AwsError;

/// Cost Explorer is a global service served from us-east-1
pub const COST_EXPLORER_REGION: &str = "us-east-1";

const S3_SERVICE: &str = "Amazon Simple Storage Service";
const USAGE_TYPE: &str = "USAGE_TYPE";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Monthly S3 usage grouped by usage type
#[derive(Debug, Clone)]
pub struct CostExplorerClient {
    client: Client,
    service: String,
}

impl CostExplorerClient {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            service: S3_SERVICE.to_string(),
        }
    }

    /// Client for the global endpoint, or `endpoint` when overridden
    pub fn connect(config: &SdkConfig, endpoint: Option<&str>) -> Self {
        let mut builder =
            aws_sdk_costexplorer::config::Builder::from(config).region(Region::new(COST_EXPLORER_REGION));
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        Self::new(Client::from_conf(builder.build()))
    }

    async fn fetch_page(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        next_page_token: Option<String>,
    ) -> Result<CostAndUsagePage, AwsError> {
        let time_period = DateInterval::builder()
            .start(start.format(DATE_FORMAT).to_string())
            .end(end.format(DATE_FORMAT).to_string())
            .build()
            .map_err(|e| AwsError::Request(e.to_string()))?;

        let group_by = GroupDefinition::builder()
            .r#type(GroupDefinitionType::Dimension)
            .key(USAGE_TYPE)
            .build();

        let filter = Expression::builder()
            .dimensions(
                DimensionValues::builder()
                    .key(Dimension::Service)
                    .values(&self.service)
                    .build(),
            )
            .build();

        let output = self
            .client
            .get_cost_and_usage()
            .time_period(time_period)
            .granularity(Granularity::Monthly)
            .metrics(METRIC_UNBLENDED_COST)
            .metrics(METRIC_USAGE_QUANTITY)
            .group_by(group_by)
            .filter(filter)
            .set_next_page_token(next_page_token)
            .send()
            .await
            .map_err(AwsError::from_sdk)?;

        Ok(page_from_output(&output))
    }
}

/// Copy the parts of a Cost Explorer response the billing decoder reads
fn page_from_output(output: &GetCostAndUsageOutput) -> CostAndUsagePage {
    let results_by_time = output
        .results_by_time()
        .iter()
        .map(|result| ResultByTime {
            groups: result
                .groups()
                .iter()
                .map(|group| CostGroup {
                    keys: group.keys().to_vec(),
                    metrics: group
                        .metrics()
                        .map(|metrics| {
                            metrics
                                .iter()
                                .map(|(name, value)| {
                                    let value = MetricValue {
                                        amount: value.amount().unwrap_or_default().to_string(),
                                        unit: value.unit().unwrap_or_default().to_string(),
                                    };
                                    (name.clone(), value)
                                })
                                .collect()
                        })
                        .unwrap_or_default(),
                })
                .collect(),
        })
        .collect();

    CostAndUsagePage {
        results_by_time,
        next_page_token: output.next_page_token().map(str::to_string),
    }
}

#[async_trait]
impl BillingClient for CostExplorerClient {
    async fn get_cost_and_usage(
        &self,
        start: NaiveDate,
        end: NaiveDate,
        next_page_token: Option<String>,
    ) -> PricingResult<CostAndUsagePage> {
        self.fetch_page(start, end, next_page_token)
            .await
            .map_err(|e| e.into_billing())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_costexplorer::config::retry::RetryConfig;
    use aws_sdk_costexplorer::config::{BehaviorVersion, Credentials};
    use aws_sdk_costexplorer::types as ce;
    use domain_pricing::PricingError;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client(server: &MockServer) -> CostExplorerClient {
        let credentials = Credentials::new("AKIDEXAMPLE", "secret", None, None, "manual");
        let config = aws_sdk_costexplorer::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(COST_EXPLORER_REGION))
            .credentials_provider(credentials)
            .endpoint_url(server.uri())
            .retry_config(RetryConfig::disabled())
            .build();
        CostExplorerClient::new(Client::from_conf(config))
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_output_conversion() {
        let output = GetCostAndUsageOutput::builder()
            .results_by_time(
                ce::ResultByTime::builder()
                    .groups(
                        ce::Group::builder()
                            .keys("EUC1-TimedStorage-ByteHrs")
                            .metrics(
                                METRIC_UNBLENDED_COST,
                                ce::MetricValue::builder().amount("2.3").unit("USD").build(),
                            )
                            .metrics(METRIC_USAGE_QUANTITY, ce::MetricValue::builder().amount("100").build())
                            .build(),
                    )
                    .groups(ce::Group::builder().keys("USE1-Requests-Tier2").build())
                    .build(),
            )
            .build();

        let page = page_from_output(&output);

        assert_eq!(page.next_page_token, None);
        let groups = &page.results_by_time[0].groups;
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].usage_key(), Some("EUC1-TimedStorage-ByteHrs"));
        assert_eq!(groups[0].cost_usd(), 2.3);
        assert_eq!(groups[0].usage_amount(), 100.0);
        assert_eq!(groups[0].metrics[METRIC_USAGE_QUANTITY].unit, "");
        assert!(groups[1].metrics.is_empty());
    }

    #[tokio::test]
    async fn test_request_shape_and_page_decoding() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-amz-target", "AWSInsightsIndexService.GetCostAndUsage"))
            .and(body_partial_json(json!({
                "TimePeriod": { "Start": "2024-02-14", "End": "2024-03-15" },
                "Granularity": "MONTHLY",
                "Metrics": ["UnblendedCost", "UsageQuantity"],
                "GroupBy": [{ "Type": "DIMENSION", "Key": "USAGE_TYPE" }],
                "Filter": {
                    "Dimensions": { "Key": "SERVICE", "Values": ["Amazon Simple Storage Service"] }
                }
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "ResultsByTime": [{
                    "Groups": [{
                        "Keys": ["USE2-Requests-Tier1"],
                        "Metrics": {
                            "UnblendedCost": { "Amount": "0.005", "Unit": "USD" },
                            "UsageQuantity": { "Amount": "1000", "Unit": "Requests" }
                        }
                    }]
                }],
                "NextPageToken": "next"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let page = client(&server)
            .get_cost_and_usage(date(2024, 2, 14), date(2024, 3, 15), None)
            .await
            .unwrap();

        assert_eq!(page.next_page_token.as_deref(), Some("next"));
        let group = &page.results_by_time[0].groups[0];
        assert_eq!(group.usage_key(), Some("USE2-Requests-Tier1"));
        assert_eq!(group.usage_amount(), 1000.0);
    }

    #[tokio::test]
    async fn test_page_token_is_forwarded() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "NextPageToken": "abc" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "ResultsByTime": [] })))
            .expect(1)
            .mount(&server)
            .await;

        let page = client(&server)
            .get_cost_and_usage(date(2024, 1, 1), date(2024, 2, 1), Some("abc".to_string()))
            .await
            .unwrap();

        assert_eq!(page, CostAndUsagePage::default());
    }

    #[tokio::test]
    async fn test_error_maps_to_billing_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "__type": "DataUnavailableException",
                "Message": "Data is not available"
            })))
            .mount(&server)
            .await;

        let result = client(&server)
            .get_cost_and_usage(date(2024, 1, 1), date(2024, 2, 1), None)
            .await;

        assert_eq!(
            result,
            Err(PricingError::Billing(
                "DataUnavailableException: Data is not available".to_string()
            ))
        );
    }
}
