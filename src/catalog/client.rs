use async_trait::async_trait;
use color_eyre::{eyre::eyre, Result};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{Method, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::config::ApiConfig;
use crate::error::{RemoteError, RemoteResult};

use super::api_types::{
  upload_response_url, ApiCategory, ApiCategoryPayload, ApiProduct, ApiProductPayload,
};
use super::images::ImageUpload;
use super::types::{Category, CategoryDraft, Product, ProductDraft};

/// Which upload endpoint an image goes to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadTarget {
  Product,
  Category,
}

impl UploadTarget {
  fn path(self) -> &'static str {
    match self {
      UploadTarget::Product => "Products/upload-image",
      UploadTarget::Category => "Categories/upload-image",
    }
  }
}

/// The remote catalog API.
///
/// Every call either succeeds or reports a `RemoteError`; deciding what to
/// do about a failure is left to the sync store.
#[async_trait]
pub trait CatalogApi: Send + Sync {
  async fn list_products(&self) -> RemoteResult<Vec<Product>>;
  async fn get_product(&self, id: i64) -> RemoteResult<Product>;
  async fn create_product(&self, draft: &ProductDraft) -> RemoteResult<Product>;
  async fn update_product(&self, id: i64, draft: &ProductDraft) -> RemoteResult<Product>;
  async fn delete_product(&self, id: i64) -> RemoteResult<()>;
  async fn increment_purchase_count(&self, id: i64) -> RemoteResult<Product>;
  async fn most_requested(&self) -> RemoteResult<Vec<Product>>;
  async fn best_sellers(&self) -> RemoteResult<Vec<Product>>;
  async fn products_by_category(&self, category_id: i64) -> RemoteResult<Vec<Product>>;
  async fn search_products(&self, term: &str) -> RemoteResult<Vec<Product>>;

  async fn list_categories(&self) -> RemoteResult<Vec<Category>>;
  async fn get_category(&self, id: i64) -> RemoteResult<Category>;
  async fn create_category(&self, draft: &CategoryDraft) -> RemoteResult<Category>;
  async fn update_category(&self, id: i64, draft: &CategoryDraft) -> RemoteResult<Category>;
  async fn delete_category(&self, id: i64) -> RemoteResult<()>;

  /// Upload an image and return the URL the server stored it under.
  async fn upload_image(&self, target: UploadTarget, upload: &ImageUpload) -> RemoteResult<String>;

  /// GET an arbitrary path, returning the status code of a 2xx response.
  async fn probe(&self, path: &str) -> RemoteResult<u16>;
}

/// HTTP client for the catalog REST API
#[derive(Clone)]
pub struct HttpCatalogClient {
  http: reqwest::Client,
  base: Url,
}

impl HttpCatalogClient {
  pub fn new(config: &ApiConfig) -> Result<Self> {
    let mut base = Url::parse(&config.base_url)
      .map_err(|e| eyre!("Invalid API base URL {}: {}", config.base_url, e))?;

    // Url::join replaces the last segment unless the path ends in '/'
    if !base.path().ends_with('/') {
      let path = format!("{}/", base.path());
      base.set_path(&path);
    }

    let mut headers = HeaderMap::new();
    headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
    headers.insert(ACCEPT, HeaderValue::from_static("application/json"));

    let http = reqwest::Client::builder()
      .default_headers(headers)
      .timeout(Duration::from_secs(config.timeout_secs))
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, base })
  }

  pub fn base_url(&self) -> &Url {
    &self.base
  }

  fn endpoint(&self, path: &str) -> RemoteResult<Url> {
    self
      .base
      .join(path.trim_start_matches('/'))
      .map_err(|e| RemoteError::Request(format!("bad endpoint {}: {}", path, e)))
  }

  async fn send<B: Serialize + ?Sized>(
    &self,
    method: Method,
    url: Url,
    body: Option<&B>,
  ) -> RemoteResult<Response> {
    debug!(%method, %url, "catalog request");

    let mut request = self.http.request(method, url);
    if let Some(body) = body {
      request = request.json(body);
    }

    let response = request.send().await?;
    check_status(response)
  }

  async fn get_json<T: DeserializeOwned>(&self, path: &str) -> RemoteResult<T> {
    let url = self.endpoint(path)?;
    let response = self.send::<()>(Method::GET, url, None).await?;
    read_json(response)
      .await?
      .ok_or_else(|| RemoteError::Decode(format!("empty response from {}", path)))
  }

  async fn get_products(&self, path: &str) -> RemoteResult<Vec<Product>> {
    let products: Vec<ApiProduct> = self.get_json(path).await?;
    Ok(products.into_iter().map(ApiProduct::into_product).collect())
  }
}

fn check_status(response: Response) -> RemoteResult<Response> {
  let status = response.status();
  if status.is_success() {
    Ok(response)
  } else {
    Err(RemoteError::Server {
      status: status.as_u16(),
    })
  }
}

/// Decode a JSON body, treating an empty body as `None`.
async fn read_json<T: DeserializeOwned>(response: Response) -> RemoteResult<Option<T>> {
  let bytes = response.bytes().await?;
  if bytes.iter().all(u8::is_ascii_whitespace) {
    return Ok(None);
  }
  serde_json::from_slice(&bytes)
    .map(Some)
    .map_err(|e| RemoteError::Decode(e.to_string()))
}

#[async_trait]
impl CatalogApi for HttpCatalogClient {
  async fn list_products(&self) -> RemoteResult<Vec<Product>> {
    self.get_products("Products").await
  }

  async fn get_product(&self, id: i64) -> RemoteResult<Product> {
    let product: ApiProduct = self.get_json(&format!("Products/{}", id)).await?;
    Ok(product.into_product())
  }

  async fn create_product(&self, draft: &ProductDraft) -> RemoteResult<Product> {
    let url = self.endpoint("Products")?;
    let body = ApiProductPayload::new(0, draft);
    let response = self.send(Method::POST, url, Some(&body)).await?;

    read_json::<ApiProduct>(response)
      .await?
      .map(ApiProduct::into_product)
      .ok_or_else(|| RemoteError::Decode("create returned no product".to_string()))
  }

  async fn update_product(&self, id: i64, draft: &ProductDraft) -> RemoteResult<Product> {
    let url = self.endpoint(&format!("Products/{}", id))?;
    let body = ApiProductPayload::new(id, draft);
    let response = self.send(Method::PUT, url, Some(&body)).await?;

    // Some deployments answer 204 on update
    match read_json::<ApiProduct>(response).await? {
      Some(product) => Ok(product.into_product()),
      None => self.get_product(id).await,
    }
  }

  async fn delete_product(&self, id: i64) -> RemoteResult<()> {
    let url = self.endpoint(&format!("Products/{}", id))?;
    self.send::<()>(Method::DELETE, url, None).await?;
    Ok(())
  }

  async fn increment_purchase_count(&self, id: i64) -> RemoteResult<Product> {
    let url = self.endpoint(&format!("Products/{}/increment-purchase", id))?;
    let response = self.send::<()>(Method::POST, url, None).await?;

    match read_json::<ApiProduct>(response).await? {
      Some(product) => Ok(product.into_product()),
      None => self.get_product(id).await,
    }
  }

  async fn most_requested(&self) -> RemoteResult<Vec<Product>> {
    self.get_products("Products/most-requested").await
  }

  async fn best_sellers(&self) -> RemoteResult<Vec<Product>> {
    self.get_products("Products/most-selling").await
  }

  async fn products_by_category(&self, category_id: i64) -> RemoteResult<Vec<Product>> {
    self
      .get_products(&format!("Products/category/{}", category_id))
      .await
  }

  async fn search_products(&self, term: &str) -> RemoteResult<Vec<Product>> {
    let mut url = self.endpoint("Products/search")?;
    url.query_pairs_mut().append_pair("q", term);

    let response = self.send::<()>(Method::GET, url, None).await?;
    let products: Vec<ApiProduct> = read_json(response).await?.unwrap_or_default();
    Ok(products.into_iter().map(ApiProduct::into_product).collect())
  }

  async fn list_categories(&self) -> RemoteResult<Vec<Category>> {
    let categories: Vec<ApiCategory> = self.get_json("Categories").await?;
    Ok(categories.into_iter().map(Category::from).collect())
  }

  async fn get_category(&self, id: i64) -> RemoteResult<Category> {
    let category: ApiCategory = self.get_json(&format!("Categories/{}", id)).await?;
    Ok(category.into())
  }

  async fn create_category(&self, draft: &CategoryDraft) -> RemoteResult<Category> {
    let url = self.endpoint("Categories")?;
    let body = ApiCategoryPayload::new(0, draft);
    let response = self.send(Method::POST, url, Some(&body)).await?;

    read_json::<ApiCategory>(response)
      .await?
      .map(Category::from)
      .ok_or_else(|| RemoteError::Decode("create returned no category".to_string()))
  }

  async fn update_category(&self, id: i64, draft: &CategoryDraft) -> RemoteResult<Category> {
    let url = self.endpoint(&format!("Categories/{}", id))?;
    let body = ApiCategoryPayload::new(id, draft);
    let response = self.send(Method::PUT, url, Some(&body)).await?;

    match read_json::<ApiCategory>(response).await? {
      Some(category) => Ok(category.into()),
      None => self.get_category(id).await,
    }
  }

  async fn delete_category(&self, id: i64) -> RemoteResult<()> {
    let url = self.endpoint(&format!("Categories/{}", id))?;
    self.send::<()>(Method::DELETE, url, None).await?;
    Ok(())
  }

  async fn upload_image(&self, target: UploadTarget, upload: &ImageUpload) -> RemoteResult<String> {
    use reqwest::multipart::{Form, Part};

    let url = self.endpoint(target.path())?;
    let part = Part::bytes(upload.bytes.clone())
      .file_name(upload.file_name.clone())
      .mime_str(&upload.content_type)
      .map_err(|e| RemoteError::Request(e.to_string()))?;
    let form = Form::new().part("file", part);

    debug!(%url, file = %upload.file_name, "uploading image");

    // multipart sets its own content type over the JSON default
    let response = self.http.post(url).multipart(form).send().await?;
    let response = check_status(response)?;

    let value: serde_json::Value = read_json(response)
      .await?
      .ok_or_else(|| RemoteError::Decode("upload returned no body".to_string()))?;

    upload_response_url(&value)
      .ok_or_else(|| RemoteError::Decode("upload response has no image URL".to_string()))
  }

  async fn probe(&self, path: &str) -> RemoteResult<u16> {
    let url = self.endpoint(path)?;
    let response = self.send::<()>(Method::GET, url, None).await?;
    Ok(response.status().as_u16())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use tokio::io::{AsyncReadExt, AsyncWriteExt};
  use tokio::net::TcpListener;

  fn client_for(base_url: &str) -> HttpCatalogClient {
    HttpCatalogClient::new(&ApiConfig {
      base_url: base_url.to_string(),
      timeout_secs: 5,
    })
    .expect("client")
  }

  /// Serve `count` connections with a fixed HTTP response.
  async fn serve_fixed(status: &'static str, body: &'static str, count: usize) -> String {
    let response = format!(
      "HTTP/1.1 {}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
      status,
      body.len(),
      body
    );
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");

    tokio::spawn(async move {
      for _ in 0..count {
        let Ok((mut socket, _)) = listener.accept().await else {
          return;
        };
        let mut buf = vec![0u8; 8192];
        let mut read = Vec::new();
        // Read the headers, then as much body as they announce
        while request_complete(&read).is_none() {
          match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => read.extend_from_slice(&buf[..n]),
          }
        }
        let _ = socket.write_all(response.as_bytes()).await;
        let _ = socket.shutdown().await;
      }
    });

    format!("http://{}/api", addr)
  }

  /// Length of the request in `read` once it has fully arrived.
  fn request_complete(read: &[u8]) -> Option<usize> {
    let header_end = read.windows(4).position(|w| w == b"\r\n\r\n")? + 4;
    let headers = String::from_utf8_lossy(&read[..header_end]).to_lowercase();
    let body_len = headers
      .lines()
      .find_map(|line| line.strip_prefix("content-length:"))
      .and_then(|v| v.trim().parse::<usize>().ok())
      .unwrap_or(0);

    let total = header_end + body_len;
    (read.len() >= total).then_some(total)
  }

  #[test]
  fn test_endpoint_keeps_base_path() {
    let client = client_for("https://shop.example.com/api");
    assert_eq!(
      client.endpoint("/Products/7").unwrap().as_str(),
      "https://shop.example.com/api/Products/7"
    );
    assert_eq!(client.base_url().path(), "/api/");
  }

  #[test]
  fn test_invalid_base_url() {
    let result = HttpCatalogClient::new(&ApiConfig {
      base_url: "not a url".to_string(),
      timeout_secs: 5,
    });
    assert!(result.is_err());
  }

  #[tokio::test]
  async fn test_server_error_status() {
    let base = serve_fixed("500 Internal Server Error", "", 1).await;

    let err = client_for(&base).list_products().await.unwrap_err();
    assert!(matches!(err, RemoteError::Server { status: 500 }));
  }

  #[tokio::test]
  async fn test_list_products_decodes() {
    let base = serve_fixed("200 OK", r#"[{"id":1,"name":"Ball","price":120.0}]"#, 1).await;

    let products = client_for(&base).list_products().await.unwrap();
    assert_eq!(products.len(), 1);
    assert_eq!(products[0].name, "Ball");
    assert_eq!(products[0].price, 120.0);
  }

  #[tokio::test]
  async fn test_upload_image_reads_url() {
    let upload = ImageUpload::from_file("ball.png", vec![0x89, b'P', b'N', b'G']);

    let base = serve_fixed("200 OK", r#"{"imageUrl":"https://cdn.shop/ball.png"}"#, 1).await;
    let url = client_for(&base)
      .upload_image(UploadTarget::Product, &upload)
      .await
      .unwrap();
    assert_eq!(url, "https://cdn.shop/ball.png");

    let base = serve_fixed("200 OK", r#""https://cdn.shop/bags.png""#, 1).await;
    let url = client_for(&base)
      .upload_image(UploadTarget::Category, &upload)
      .await
      .unwrap();
    assert_eq!(url, "https://cdn.shop/bags.png");
  }

  #[tokio::test]
  async fn test_upload_image_without_url_is_decode_error() {
    let upload = ImageUpload::from_file("ball.png", vec![1, 2, 3]);
    let base = serve_fixed("200 OK", r#"{"ok":true}"#, 1).await;

    let err = client_for(&base)
      .upload_image(UploadTarget::Product, &upload)
      .await
      .unwrap_err();
    assert!(matches!(err, RemoteError::Decode(_)));
  }

  #[tokio::test]
  async fn test_upload_image_server_error() {
    let upload = ImageUpload::from_file("ball.png", vec![1, 2, 3]);
    let base = serve_fixed("413 Payload Too Large", "", 1).await;

    let err = client_for(&base)
      .upload_image(UploadTarget::Product, &upload)
      .await
      .unwrap_err();
    assert!(matches!(err, RemoteError::Server { status: 413 }));
  }

  #[tokio::test]
  async fn test_connection_refused_is_network_error() {
    // Bind then drop to get a port nothing listens on
    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);

    let err = client_for(&format!("http://{}/api", addr))
      .list_products()
      .await
      .unwrap_err();
    assert!(matches!(err, RemoteError::Network(_)));
    assert_eq!(err.status(), 0);
  }
}
