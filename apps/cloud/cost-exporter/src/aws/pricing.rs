//! Price List Query API (`GetProducts`)

use async_trait::async_trait;
use aws_config::SdkConfig;
use aws_sdk_pricing::config::Region;
use aws_sdk_pricing::types::{Filter, FilterType};
use aws_sdk_pricing::Client;
use domain_pricing::{PriceFilter, PricingClient, PricingResult};
use tracing::debug;

use super::AwsError;

const FORMAT_VERSION: &str = "aws_v1";
const MAX_RESULTS: i32 = 100;
const REGION_FIELD: &str = "regionCode";

/// Price List client bound to one configured region.
///
/// All regions share one SDK client (the Price List endpoint only exists in
/// a handful of regions); the region only selects the `regionCode` filter
/// and tags errors.
#[derive(Debug, Clone)]
pub struct PriceListClient {
    client: Client,
    region: String,
}

impl PriceListClient {
    /// SDK client for the Price List endpoint in `pricing_region`, or
    /// `endpoint` when overridden
    pub fn sdk_client(config: &SdkConfig, pricing_region: &str, endpoint: Option<&str>) -> Client {
        let mut builder =
            aws_sdk_pricing::config::Builder::from(config).region(Region::new(pricing_region.to_string()));
        if let Some(endpoint) = endpoint {
            builder = builder.endpoint_url(endpoint);
        }
        Client::from_conf(builder.build())
    }

    pub fn new(client: Client, region: impl Into<String>) -> Self {
        Self {
            client,
            region: region.into(),
        }
    }

    /// TERM_MATCH filters for the request, `regionCode` last
    fn filters(filters: &[PriceFilter], region: &str) -> Result<Vec<Filter>, AwsError> {
        filters
            .iter()
            .map(|filter| (filter.field.as_str(), filter.value.as_str()))
            .chain(std::iter::once((REGION_FIELD, region)))
            .map(|(field, value)| {
                Filter::builder()
                    .r#type(FilterType::TermMatch)
                    .field(field)
                    .value(value)
                    .build()
                    .map_err(|e| AwsError::Request(e.to_string()))
            })
            .collect()
    }

    async fn get_products(
        &self,
        service_code: &str,
        region: &str,
        filters: &[PriceFilter],
    ) -> Result<Vec<String>, AwsError> {
        let filters = Self::filters(filters, region)?;
        let mut documents = Vec::new();
        let mut next_token: Option<String> = None;
        let mut pages = 0;

        loop {
            let response = self
                .client
                .get_products()
                .service_code(service_code)
                .set_filters(Some(filters.clone()))
                .format_version(FORMAT_VERSION)
                .max_results(MAX_RESULTS)
                .set_next_token(next_token.take())
                .send()
                .await
                .map_err(AwsError::from_sdk)?;
            pages += 1;
            documents.extend_from_slice(response.price_list());

            match response.next_token().filter(|token| !token.is_empty()) {
                Some(token) => next_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!(
            service_code,
            region,
            client_region = %self.region,
            pages,
            documents = documents.len(),
            "Listed price documents"
        );

        Ok(documents)
    }
}

#[async_trait]
impl PricingClient for PriceListClient {
    async fn list_prices(
        &self,
        service_code: &str,
        region: &str,
        filters: &[PriceFilter],
    ) -> PricingResult<Vec<String>> {
        self.get_products(service_code, region, filters)
            .await
            .map_err(|e| e.into_pricing(region))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use aws_sdk_pricing::config::retry::RetryConfig;
    use aws_sdk_pricing::config::{BehaviorVersion, Credentials};
    use domain_pricing::PricingError;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn sdk_client(endpoint: &str) -> Client {
        let credentials = Credentials::new("AKIDEXAMPLE", "secret", None, None, "manual");
        let config = aws_sdk_pricing::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .retry_config(RetryConfig::disabled())
            .build();
        Client::from_conf(config)
    }

    fn client(server: &MockServer, region: &str) -> PriceListClient {
        PriceListClient::new(sdk_client(&server.uri()), region)
    }

    #[test]
    fn test_region_filter_is_appended() {
        let filters = PriceListClient::filters(
            &[PriceFilter::term_match("productFamily", "NAT Gateway")],
            "eu-west-1",
        )
        .unwrap();

        assert_eq!(filters.len(), 2);
        assert_eq!(filters[0].field(), "productFamily");
        assert_eq!(filters[1].field(), "regionCode");
        assert_eq!(filters[1].value(), "eu-west-1");
        assert!(filters.iter().all(|filter| *filter.r#type() == FilterType::TermMatch));
    }

    #[tokio::test]
    async fn test_request_carries_filters_and_region() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(header("x-amz-target", "AWSPriceListService.GetProducts"))
            .and(body_partial_json(json!({
                "ServiceCode": "AmazonEC2",
                "FormatVersion": "aws_v1",
                "MaxResults": 100,
                "Filters": [
                    { "Type": "TERM_MATCH", "Field": "productFamily", "Value": "NAT Gateway" },
                    { "Type": "TERM_MATCH", "Field": "regionCode", "Value": "eu-west-1" }
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "FormatVersion": "aws_v1",
                "PriceList": ["{\"doc\":1}"]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let documents = client(&server, "eu-west-1")
            .list_prices(
                "AmazonEC2",
                "eu-west-1",
                &[PriceFilter::term_match("productFamily", "NAT Gateway")],
            )
            .await
            .unwrap();

        assert_eq!(documents, vec!["{\"doc\":1}".to_string()]);
    }

    #[tokio::test]
    async fn test_pages_are_concatenated() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_partial_json(json!({ "NextToken": "page-2" })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "PriceList": ["c"]
            })))
            .with_priority(1)
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "PriceList": ["a", "b"],
                "NextToken": "page-2"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let documents = client(&server, "us-east-1")
            .list_prices("AmazonVPC", "us-east-1", &[])
            .await
            .unwrap();

        assert_eq!(documents, vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_api_error_is_tagged_with_region() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(400).set_body_json(json!({
                "__type": "ThrottlingException",
                "message": "Rate exceeded"
            })))
            .mount(&server)
            .await;

        let result = client(&server, "ap-south-1")
            .list_prices("AmazonRDS", "ap-south-1", &[])
            .await;

        assert_eq!(
            result,
            Err(PricingError::Client {
                region: "ap-south-1".to_string(),
                message: "ThrottlingException: Rate exceeded".to_string(),
            })
        );
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_a_client_error() {
        let client = PriceListClient::new(sdk_client("http://127.0.0.1:1"), "us-west-2");

        let result = client.list_prices("AmazonEC2", "us-west-2", &[]).await;

        assert!(matches!(
            result,
            Err(PricingError::Client { ref region, ref message })
                if region == "us-west-2" && !message.is_empty()
        ));
    }
}
