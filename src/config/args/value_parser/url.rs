use url::Url;

const INVALID_SCHEME: &str = "scheme must be https:// or http:// .";
const PATH_NOT_ALLOWED: &str =
    "endpoint url must not contain a path. specify the bucket as SOURCE/TARGET.";

/// Endpoint urls name a service, never a bucket.
pub fn check_endpoint_url(url: &str) -> Result<String, String> {
    let parsed = Url::parse(url).map_err(|e| e.to_string())?;

    if parsed.scheme() != "https" && parsed.scheme() != "http" {
        return Err(INVALID_SCHEME.to_string());
    }

    if !parsed.path().is_empty() && parsed.path() != "/" {
        return Err(PATH_NOT_ALLOWED.to_string());
    }

    Ok(url.to_string())
}
