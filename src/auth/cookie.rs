use axum_extra::extract::CookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD as BASE64_URL;

use crate::crypto;
use crate::models::StoredCredential;

pub const CREDENTIAL_COOKIE: &str = "google_credential";

const MAX_AGE_DAYS: i64 = 7;

/// Seal the credential into the deployment-wide cookie: JSON, AES-GCM
/// under the configured key, base64 on the wire. HttpOnly always; Secure
/// follows the deployment base URL.
pub fn store_credential(
    jar: CookieJar,
    credential: &StoredCredential,
    key: &str,
    secure: bool,
) -> Result<CookieJar, String> {
    let plain = serde_json::to_string(credential)
        .map_err(|e| format!("Failed to serialize credential: {e}"))?;
    let sealed = crypto::encrypt(&plain, key)?;
    let value = BASE64_URL.encode(sealed);

    let cookie = Cookie::build((CREDENTIAL_COOKIE, value))
        .path("/")
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .max_age(time::Duration::days(MAX_AGE_DAYS))
        .build();

    Ok(jar.add(cookie))
}

/// Read the stored credential back. Any structural problem (missing
/// cookie, bad base64, failed decryption, unparseable JSON) reads as
/// "no credential" so the caller re-authenticates.
pub fn read_credential(jar: &CookieJar, key: &str) -> Option<StoredCredential> {
    let raw = jar.get(CREDENTIAL_COOKIE)?.value().to_string();
    let sealed = BASE64_URL.decode(raw).ok()?;
    let plain = crypto::decrypt(&sealed, key).ok()?;
    serde_json::from_str(&plain).ok()
}
