use url::{ParseError, Url};

use crate::types::StoragePath;

const INVALID_SCHEME: &str = "scheme must be s3:// .";
const INVALID_PATH: &str = "path must be a valid URL or a local path.";
const NO_BUCKET_NAME_SPECIFIED: &str = "bucket name must be specified.";
const NO_PATH_SPECIFIED: &str = "path must be specified.";
const PREFIX_NOT_SUPPORTED: &str = "prefix is not supported. tenants live at the bucket root.";

pub fn check_storage_path(path: &str) -> Result<String, String> {
    let result = Url::parse(path);
    if result == Err(ParseError::RelativeUrlWithoutBase) {
        if path.is_empty() {
            return Err(NO_PATH_SPECIFIED.to_string());
        }

        return Ok(path.to_string());
    }

    let parsed = result.map_err(|_| INVALID_PATH.to_string())?;
    match parsed.scheme() {
        "s3" => {
            if parsed.host_str().is_none_or(str::is_empty) {
                return Err(NO_BUCKET_NAME_SPECIFIED.to_string());
            }

            if !parsed.path().is_empty() && parsed.path() != "/" {
                return Err(PREFIX_NOT_SUPPORTED.to_string());
            }
        }
        _ => {
            if !is_windows_absolute_path(path) {
                return Err(INVALID_SCHEME.to_string());
            }
        }
    }

    Ok(path.to_string())
}

pub fn parse_storage_path(path: &str) -> Result<StoragePath, String> {
    check_storage_path(path)?;

    match Url::parse(path) {
        Err(ParseError::RelativeUrlWithoutBase) => Ok(StoragePath::Local(path.into())),
        _ if is_windows_absolute_path(path) => Ok(StoragePath::Local(path.into())),
        Ok(parsed) => {
            let bucket = parsed
                .host_str()
                .ok_or_else(|| NO_BUCKET_NAME_SPECIFIED.to_string())?;
            Ok(StoragePath::S3 {
                bucket: bucket.to_string(),
            })
        }
        Err(_) => Err(INVALID_PATH.to_string()),
    }
}

fn is_windows_absolute_path(path: &str) -> bool {
    if !cfg!(windows) {
        return false;
    }

    let bytes = path.as_bytes();
    bytes.len() >= 3 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' && bytes[2] == b'\\'
}
