use url::Url;

/// Query parameters stripped during canonicalization
///
/// These carry per-visitor session state and would otherwise make the same
/// page look like an unbounded family of distinct URIs.
const SESSION_PARAMS: &[&str] = &[
    "jsessionid",
    "phpsessid",
    "sid",
    "sessionid",
    "session_id",
    "aspsessionid",
    "cfid",
    "cftoken",
];

/// A single canonicalization rewrite rule
///
/// Rules are applied in order; the default chain is [`DEFAULT_RULES`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewriteRule {
    /// Lowercase the scheme and host
    CaseFold,
    /// Remove a leading "www." (and "www1.", "www2.", ...) from the host
    StripWww,
    /// Remove session-identifier query parameters and ";jsessionid=" path suffixes
    StripSessionIds,
    /// Remove the fragment (everything after '#')
    StripFragment,
    /// Sort remaining query parameters alphabetically
    SortQuery,
}

/// The default rule chain, applied in this order
pub const DEFAULT_RULES: &[RewriteRule] = &[
    RewriteRule::CaseFold,
    RewriteRule::StripWww,
    RewriteRule::StripSessionIds,
    RewriteRule::StripFragment,
    RewriteRule::SortQuery,
];

/// Canonicalizes a URI with the default rule chain
///
/// The result is the string key handed to the already-seen filter: two URIs
/// that canonicalize identically are treated as the same page and only the
/// first is admitted for scheduling.
///
/// # Examples
///
/// ```
/// use shiori::url::canonicalize;
/// use url::Url;
///
/// let url = Url::parse("https://WWW.Example.COM/page#top").unwrap();
/// assert_eq!(canonicalize(&url), "https://example.com/page");
/// ```
pub fn canonicalize(url: &Url) -> String {
    canonicalize_with(url, DEFAULT_RULES)
}

/// Canonicalizes a URI with an explicit, ordered rule chain
pub fn canonicalize_with(url: &Url, rules: &[RewriteRule]) -> String {
    let mut url = url.clone();

    for rule in rules {
        match rule {
            RewriteRule::CaseFold => case_fold(&mut url),
            RewriteRule::StripWww => strip_www(&mut url),
            RewriteRule::StripSessionIds => strip_session_ids(&mut url),
            RewriteRule::StripFragment => {
                url.set_fragment(None);
            }
            RewriteRule::SortQuery => sort_query(&mut url),
        }
    }

    url.to_string()
}

/// Lowercases the host (the `url` crate already folds the scheme)
fn case_fold(url: &mut Url) {
    if let Some(host) = url.host_str() {
        let lower = host.to_lowercase();
        if lower != host {
            // set_host only fails for cannot-be-a-base URLs, which we leave as-is
            let _ = url.set_host(Some(&lower));
        }
    }
}

/// Removes a leading "www." / "wwwN." label from the host
fn strip_www(url: &mut Url) {
    let Some(host) = url.host_str() else {
        return;
    };

    let stripped = host
        .strip_prefix("www.")
        .or_else(|| {
            host.split_once('.').and_then(|(first, rest)| {
                let digits = first.strip_prefix("www")?;
                if !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit()) {
                    Some(rest)
                } else {
                    None
                }
            })
        })
        .map(str::to_owned);

    if let Some(stripped) = stripped {
        // Never strip down to an empty or TLD-only host
        if stripped.contains('.') {
            let _ = url.set_host(Some(&stripped));
        }
    }
}

/// Removes session-id query parameters and ";jsessionid=" path segments
fn strip_session_ids(url: &mut Url) {
    // Path-embedded java session ids: /page;jsessionid=ABC123
    let path = url.path().to_string();
    if let Some(idx) = path.to_lowercase().find(";jsessionid=") {
        url.set_path(&path[..idx]);
    }

    let Some(query) = url.query() else {
        return;
    };

    let kept: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
        .filter(|(k, _)| !SESSION_PARAMS.contains(&k.to_lowercase().as_str()))
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if kept.is_empty() {
        url.set_query(None);
    } else {
        let rebuilt: String = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(kept)
            .finish();
        url.set_query(Some(&rebuilt));
    }
}

/// Sorts query parameters alphabetically so parameter order is irrelevant
fn sort_query(url: &mut Url) {
    let Some(query) = url.query() else {
        return;
    };

    let mut pairs: Vec<(String, String)> = url::form_urlencoded::parse(query.as_bytes())
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();

    if pairs.is_empty() {
        url.set_query(None);
        return;
    }

    pairs.sort();

    let rebuilt: String = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .finish();
    url.set_query(Some(&rebuilt));
}
