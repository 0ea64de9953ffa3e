use ammonia;

/// Clean user-supplied free text using the ammonia library.
///
/// Listing titles and descriptions are rendered by other clients, so they
/// go through whitelist-based sanitization: safe tags (like <b>, <p>) are
/// preserved, dangerous tags (like <script>, <iframe>) and attributes
/// (like onclick) are stripped. Fail-safe against stored XSS.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
