use std::{collections::BTreeMap, sync::Arc};

use anyhow::{anyhow, Context};
use reqwest::{
    header::{HeaderMap, HeaderName, HeaderValue},
    StatusCode,
};
use url::Url;

use simple_drive_core::{
    backends::{blob_storage, BlobStorageBackend},
    error,
    models::BackendKind,
    Error,
};

use super::sigv4::{self, SigningContext};

const SERVICE: &str = "s3";

/// Talks to an S3-compatible endpoint with path-style addressing
/// (`{endpoint}/{bucket}/{id}`) and hand-rolled SigV4 signing. One
/// connection-pooled client per instance.
#[derive(Clone, Debug)]
pub struct S3CompatibleStorage {
    client: reqwest::Client,
    endpoint_url: String,
    bucket: String,
    access_key_id: String,
    secret_access_key: String,
    region: String,
}

impl S3CompatibleStorage {
    pub fn open(
        endpoint_url: &str,
        bucket: &str,
        access_key_id: &str,
        secret_access_key: &str,
        region: &str,
    ) -> blob_storage::BlobStorage {
        Arc::new(S3CompatibleStorage::new(
            endpoint_url,
            bucket,
            access_key_id,
            secret_access_key,
            region,
        ))
    }

    fn new(
        endpoint_url: &str,
        bucket: &str,
        access_key_id: &str,
        secret_access_key: &str,
        region: &str,
    ) -> S3CompatibleStorage {
        S3CompatibleStorage {
            client: reqwest::Client::new(),
            endpoint_url: endpoint_url.trim_end_matches('/').to_string(),
            bucket: bucket.to_string(),
            access_key_id: access_key_id.to_string(),
            secret_access_key: secret_access_key.to_string(),
            region: region.to_string(),
        }
    }

    fn object_url(&self, blob_id: &str) -> String {
        format!("{}/{}/{}", self.endpoint_url, self.bucket, blob_id)
    }

    fn signed_headers(&self, method: &str, url: &str, payload: &[u8]) -> error::Result<HeaderMap> {
        let url = Url::parse(url).context("invalid object url")?;

        let mut headers = BTreeMap::new();
        headers.insert(
            "host".to_string(),
            url.host_str().unwrap_or_default().to_string(),
        );
        headers.insert(
            "x-amz-content-sha256".to_string(),
            sigv4::sha256_hex(payload),
        );
        if !payload.is_empty() {
            headers.insert("content-length".to_string(), payload.len().to_string());
        }

        let context = SigningContext {
            access_key: &self.access_key_id,
            secret_key: &self.secret_access_key,
            region: &self.region,
            service: SERVICE,
        };

        let headers = sigv4::sign(method, &url, headers, payload, &context);

        let mut map = HeaderMap::with_capacity(headers.len());
        for (name, value) in headers {
            let name = HeaderName::try_from(name.as_str()).context("invalid header name")?;
            let value = HeaderValue::from_str(&value).context("invalid header value")?;
            map.insert(name, value);
        }

        Ok(map)
    }
}

#[async_trait::async_trait]
impl BlobStorageBackend for S3CompatibleStorage {
    fn kind(&self) -> BackendKind {
        BackendKind::S3
    }

    async fn store(&self, blob_id: &str, data: &[u8]) -> error::Result<()> {
        let url = self.object_url(blob_id);
        let headers = self.signed_headers("PUT", &url, data)?;

        let response = self
            .client
            .put(&url)
            .headers(headers)
            .body(data.to_vec())
            .send()
            .await
            .context("s3 store request failed")?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Backend(anyhow!("s3 store failed: {status}")));
        }

        Ok(())
    }

    async fn retrieve(&self, blob_id: &str) -> error::Result<Vec<u8>> {
        let url = self.object_url(blob_id);
        let headers = self.signed_headers("GET", &url, b"")?;

        let response = self
            .client
            .get(&url)
            .headers(headers)
            .send()
            .await
            .context("s3 retrieve request failed")?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(Error::NotFound(blob_id.to_string()));
        }
        if !status.is_success() {
            return Err(Error::Backend(anyhow!("s3 retrieve failed: {status}")));
        }

        let data = response.bytes().await.context("s3 retrieve failed")?;

        Ok(data.to_vec())
    }

    /// Never fails: any transport or status failure reads as absent.
    async fn exists(&self, blob_id: &str) -> error::Result<bool> {
        let url = self.object_url(blob_id);
        let headers = match self.signed_headers("HEAD", &url, b"") {
            Ok(headers) => headers,
            Err(_) => return Ok(false),
        };

        match self.client.head(&url).headers(headers).send().await {
            Ok(response) => Ok(response.status() == StatusCode::OK),
            Err(_) => Ok(false),
        }
    }

    async fn delete(&self, blob_id: &str) -> error::Result<()> {
        let url = self.object_url(blob_id);
        let headers = self.signed_headers("DELETE", &url, b"")?;

        let response = self
            .client
            .delete(&url)
            .headers(headers)
            .send()
            .await
            .context("s3 delete request failed")?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Backend(anyhow!("s3 delete failed: {status}")));
        }

        Ok(())
    }
}
