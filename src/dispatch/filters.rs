//! Small value filters applied while the controller builds output.

use std::borrow::Cow;

/// Force https on admin-ajax URLs when the current request is secure.
pub fn maybe_force_admin_ajax_ssl(url: &str, is_ssl: bool) -> Cow<'_, str> {
    if is_ssl && url.contains("admin-ajax.php") {
        Cow::Owned(url.replace("http://", "https://"))
    } else {
        Cow::Borrowed(url)
    }
}
