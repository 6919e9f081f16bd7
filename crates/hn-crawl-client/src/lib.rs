//! Thin client over the upstream item API.

pub mod client;
pub mod error;
pub mod fake;

pub use client::{HnApiClient, RawItem, UpstreamClient};
pub use error::{UpstreamError, UpstreamResult};
pub use fake::FakeUpstreamClient;

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn max_item_id_parses_integer_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/maxitem.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(42))
            .mount(&server)
            .await;

        let client = HnApiClient::new(server.uri(), std::time::Duration::from_secs(5)).unwrap();
        assert_eq!(client.max_item_id().await.unwrap(), 42);
    }

    #[tokio::test]
    async fn fetch_item_returns_some_for_object_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/item/1.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": 1,
                "type": "story",
                "by": "author",
            })))
            .mount(&server)
            .await;

        let client = HnApiClient::new(server.uri(), std::time::Duration::from_secs(5)).unwrap();
        let item = client.fetch_item(1).await.unwrap().unwrap();
        assert_eq!(item.id, 1);
        assert_eq!(item.item_type.as_deref(), Some("story"));
    }

    #[tokio::test]
    async fn fetch_item_returns_none_for_null_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/item/2.json"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::Value::Null))
            .mount(&server)
            .await;

        let client = HnApiClient::new(server.uri(), std::time::Duration::from_secs(5)).unwrap();
        assert!(client.fetch_item(2).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn fetch_item_returns_none_for_404() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/item/3.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;

        let client = HnApiClient::new(server.uri(), std::time::Duration::from_secs(5)).unwrap();
        assert!(client.fetch_item(3).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn fetch_item_returns_err_for_5xx() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/item/4.json"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = HnApiClient::new(server.uri(), std::time::Duration::from_secs(5)).unwrap();
        assert!(client.fetch_item(4).await.is_err());
    }

    #[tokio::test]
    async fn fake_client_replays_configured_responses() {
        let fake = FakeUpstreamClient::new(10)
            .with_item(
                1,
                RawItem {
                    id: 1,
                    item_type: Some("story".to_string()),
                    ..Default::default()
                },
            )
            .with_null(2)
            .with_error(3);

        assert_eq!(fake.max_item_id().await.unwrap(), 10);
        assert!(fake.fetch_item(1).await.unwrap().is_some());
        assert!(fake.fetch_item(2).await.unwrap().is_none());
        assert!(fake.fetch_item(3).await.is_err());
    }
}
