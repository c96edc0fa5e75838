//! Client for the resource endpoints of a Smart Snippets service.

use reqwest::header::LOCATION;
use reqwest::{redirect, Client, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;

type Error = Box<dyn std::error::Error + Send + Sync>;

/// CRUD client bound to one resource collection, e.g. `/snippets`.
pub struct ResourceClient {
    client: Client,
    base_url: String,
    resource: String,
}

impl ResourceClient {
    pub fn new(base_url: &str, resource: &str) -> Result<Self, Error> {
        // Create answers with 303 + Location; the id is read from the header.
        let client = Client::builder().redirect(redirect::Policy::none()).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            resource: resource.trim_matches('/').to_string(),
        })
    }

    fn collection_url(&self) -> String {
        format!("{}/{}", self.base_url, self.resource)
    }

    fn item_url(&self, id: i64) -> String {
        format!("{}/{}/{}", self.base_url, self.resource, id)
    }

    /// Fetch every entity of the collection.
    pub async fn list<T: DeserializeOwned>(&self) -> Result<Vec<T>, Error> {
        let resp = self.client.get(self.collection_url()).send().await?;
        decode(check(resp).await?).await
    }

    pub async fn get<T: DeserializeOwned>(&self, id: i64) -> Result<T, Error> {
        let resp = self.client.get(self.item_url(id)).send().await?;
        decode(check(resp).await?).await
    }

    /// Create an entity and return the id the service assigned.
    pub async fn create<T: Serialize>(&self, entity: &T) -> Result<i64, Error> {
        let resp = self.client.post(self.collection_url()).json(entity).send().await?;
        let resp = check(resp).await?;
        let location = resp
            .headers()
            .get(LOCATION)
            .ok_or("missing Location header")?
            .to_str()?;
        let id = location
            .rsplit('/')
            .next()
            .ok_or("empty Location header")?
            .parse()?;
        Ok(id)
    }

    /// Replace an entity. The body must carry the version last read.
    pub async fn update<T: Serialize>(&self, id: i64, entity: &T) -> Result<(), Error> {
        let resp = self.client.put(self.item_url(id)).json(entity).send().await?;
        check(resp).await?;
        Ok(())
    }

    pub async fn delete(&self, id: i64) -> Result<(), Error> {
        let resp = self.client.delete(self.item_url(id)).send().await?;
        check(resp).await?;
        Ok(())
    }
}

/// Turn non-success statuses into errors carrying the body text.
/// Redirects count as success.
async fn check(resp: Response) -> Result<Response, Error> {
    let status = resp.status();
    if status.is_success() || status.is_redirection() {
        return Ok(resp);
    }
    let text = resp.text().await.unwrap_or_default();
    Err(format!("service returned error status {}: {}", status, text).into())
}

/// Decode the body text, reporting the text itself when it is not the
/// expected JSON.
async fn decode<T: DeserializeOwned>(resp: Response) -> Result<T, Error> {
    let text = resp.text().await?;
    serde_json::from_str(&text).map_err(|e| format!("unexpected response {:?}: {}", text, e).into())
}
