use anyhow::{format_err, Error};
use aws_config::{meta::region::RegionProviderChain, BehaviorVersion};
use aws_sdk_s3::{primitives::ByteStream, Client as S3Client};
use log::debug;
use std::{fmt, path::Path};
use url::Url;

const SQLITE_CONTENT_TYPE: &str = "application/vnd.sqlite3";

/// Destination for finished backup files.
#[allow(async_fn_in_trait)]
pub trait ObjectStore {
    /// Upload the full contents of `path` to `key` in `bucket`.
    async fn upload(&self, bucket: &str, key: &str, path: &Path) -> Result<(), Error>;
}

/// Google Cloud Storage through its S3 interoperability endpoint.
#[derive(Clone)]
pub struct S3Instance {
    s3_client: S3Client,
    endpoint: Url,
}

impl fmt::Debug for S3Instance {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "S3Instance({})", self.endpoint)
    }
}

impl S3Instance {
    /// Credentials come from the aws default chain, holding GCS HMAC keys.
    pub async fn new(endpoint: &Url) -> Self {
        let region = RegionProviderChain::default_provider().or_else("auto");
        let sdk_config = aws_config::defaults(BehaviorVersion::latest())
            .region(region)
            .load()
            .await;
        let config = aws_sdk_s3::config::Builder::from(&sdk_config)
            .endpoint_url(endpoint.as_str().trim_end_matches('/'))
            .force_path_style(true)
            .build();
        Self {
            s3_client: S3Client::from_conf(config),
            endpoint: endpoint.clone(),
        }
    }
}

impl ObjectStore for S3Instance {
    async fn upload(&self, bucket: &str, key: &str, path: &Path) -> Result<(), Error> {
        let expected_size = i64::try_from(path.metadata()?.len())?;
        let body = ByteStream::from_path(path).await?;
        self.s3_client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(SQLITE_CONTENT_TYPE)
            .body(body)
            .send()
            .await?;

        let head = self
            .s3_client
            .head_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await?;
        debug!("head {bucket}/{key} {:?}", head.e_tag());
        match head.content_length() {
            Some(size) if size == expected_size => Ok(()),
            size => Err(format_err!(
                "Uploaded object {bucket}/{key} has size {size:?}, expected {expected_size}"
            )),
        }
    }
}
