//! Real TCP round trips through the SDK client.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use snippets_sdk::ResourceClient;

mod common;

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "PascalCase")]
struct Snippet {
    #[serde(rename = "ID")]
    id: i64,
    title: String,
    content: String,
    version: i64,
}

#[tokio::test]
async fn test_crud_over_tcp() {
    let (addr, shutdown) = common::start_server(common::test_config()).await;
    let client = ResourceClient::new(&format!("http://{}", addr), "snippets").unwrap();

    let id = client
        .create(&Snippet {
            title: "over the wire".into(),
            content: "println!(\"hi\")".into(),
            ..Default::default()
        })
        .await
        .unwrap();

    let mut fetched: Snippet = client.get(id).await.unwrap();
    assert_eq!(fetched.id, id);
    assert_eq!(fetched.version, 1);

    fetched.title = "renamed".into();
    client.update(id, &fetched).await.unwrap();
    let stale = client.update(id, &fetched).await;
    assert!(stale.is_err());

    let listed: Vec<Snippet> = client.list().await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].title, "renamed");
    assert_eq!(listed[0].version, 2);

    client.delete(id).await.unwrap();
    assert!(client.get::<Snippet>(id).await.is_err());

    shutdown.trigger();
}

#[tokio::test]
async fn test_non_json_body_is_reported() {
    let (addr, shutdown) = common::start_server(common::test_config()).await;
    let root = ResourceClient::new(&format!("http://{}", addr), "/").unwrap();

    let err = root.list::<Snippet>().await.unwrap_err();
    assert!(err.to_string().contains("Hello Smart Snippets"));

    shutdown.trigger();
}

#[tokio::test]
async fn test_server_stops_on_shutdown() {
    let (addr, shutdown) = common::start_server(common::test_config()).await;
    let url = format!("http://{}/", addr);

    let body = reqwest::get(&url).await.unwrap().text().await.unwrap();
    assert_eq!(body, "Hello Smart Snippets");

    shutdown.trigger();
    tokio::time::sleep(Duration::from_millis(200)).await;
    assert!(reqwest::get(&url).await.is_err());
}
