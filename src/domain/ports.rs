use crate::utils::error::Result;

/// Durable binary storage for uploaded files.
///
/// `put` returns a fresh key on every call, even for identical content or a
/// reused name. `presign` does not check that the key exists; an unknown key
/// yields a URL that fails when fetched.
pub trait ArtifactStore: Send + Sync {
    fn put(
        &self,
        data: Vec<u8>,
        logical_name: &str,
    ) -> impl std::future::Future<Output = Result<String>> + Send;

    fn presign(
        &self,
        key: &str,
        expiry_seconds: u64,
    ) -> impl std::future::Future<Output = Result<String>> + Send;
}

/// Source of short external identifiers for contracts and target lists.
pub trait UidSource: Send + Sync {
    fn next_uid(&self) -> String;
}

pub trait ConfigProvider: Send + Sync {
    fn database_path(&self) -> Option<&str>;
    fn max_upload_bytes(&self) -> u64;
    fn default_uploaded_by(&self) -> &str;
    fn presign_expiry_seconds(&self) -> u64;
}
