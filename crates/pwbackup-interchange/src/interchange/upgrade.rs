//! Upgrade of logins saved in the old signon layout, where HTTP-auth
//! entries were keyed by `host:port` and URLs kept default ports, paths and
//! embedded usernames.
//!
//! Entries already in the current layout pass through unchanged.

use lazy_static::lazy_static;
use log::debug;
use regex::Regex;
use url::Url;

use pwbackup_core::LoginRecord;

lazy_static! {
    static ref TRAILING_PORT: Regex = Regex::new(r":\d+$").unwrap();
}

/// Upgrade one login. A `host:port` entry on a non-standard port becomes
/// two logins, one per scheme, since the old layout did not say which.
pub fn upgrade_entry(mut login: LoginRecord) -> Vec<LoginRecord> {
    if !login.hostname.contains("://") {
        return upgrade_channel_login(login);
    }
    upgrade_url_login(&mut login);
    vec![login]
}

fn upgrade_channel_login(mut login: LoginRecord) -> Vec<LoginRecord> {
    // Without a port it was not saved by the browser itself.
    if !TRAILING_PORT.is_match(&login.hostname) {
        return vec![login];
    }

    let parsed = match Url::parse(&format!("http://{}", login.hostname)) {
        Ok(url) => url,
        Err(e) => {
            debug!("cannot parse hostname {}: {}", login.hostname, e);
            return vec![login];
        }
    };
    let Some(host) = parsed.host_str().map(str::to_string) else {
        return vec![login];
    };
    let port = parsed.port_or_known_default().unwrap_or(80);
    let old_host = std::mem::take(&mut login.hostname);

    let mut extra = None;
    login.hostname = match port {
        80 => format!("http://{host}"),
        443 => format!("https://{host}"),
        _ => {
            let mut clone = LoginRecord {
                hostname: format!("https://{host}:{port}"),
                username: login.username.clone(),
                password: login.password.clone(),
                submit_url: None,
                http_realm: login.http_realm.clone(),
                ..Default::default()
            };
            fill_blank_realm(&mut clone);
            extra = Some(clone);
            format!("http://{host}:{port}")
        }
    };
    fill_blank_realm(&mut login);
    debug!("upgraded {} to {}", old_host, login.hostname);

    let mut upgraded = vec![login];
    upgraded.extend(extra);
    upgraded
}

fn fill_blank_realm(login: &mut LoginRecord) {
    if login.http_realm.as_deref().map_or(true, str::is_empty) {
        login.http_realm = Some(login.hostname.clone());
    }
}

fn upgrade_url_login(login: &mut LoginRecord) {
    let is_form_login = login.submit_url.as_deref().map_or(false, |s| !s.is_empty())
        || !login.username_field.is_empty()
        || !login.password_field.is_empty();

    let cleaned = clean_url(&login.hostname, false);
    if cleaned.url != login.hostname {
        debug!("upgraded {} to {}", login.hostname, cleaned.url);
    }
    login.hostname = cleaned.url;

    if let Some(user) = cleaned.username {
        if !is_form_login && login.username.is_empty() {
            login.username = user;
        }
    }

    if let Some(submit) = login.submit_url.as_deref().filter(|s| !s.is_empty()) {
        login.submit_url = Some(clean_url(submit, true).url);
    }

    // Non-HTTP protocol logins were stored like form logins; give them a
    // realm so they are not mistaken for one.
    let is_http = login.hostname.starts_with("http://") || login.hostname.starts_with("https://");
    let has_realm = login.http_realm.as_deref().map_or(false, |r| !r.is_empty());
    if !is_http && !is_form_login && !has_realm {
        let is_ldap = login.hostname.starts_with("ldap://") || login.hostname.starts_with("ldaps://");
        login.http_realm = Some(if is_ldap {
            format!("{}{}", login.hostname, cleaned.path)
        } else {
            login.hostname.clone()
        });
        login.submit_url = None;
        login.username_field.clear();
        login.password_field.clear();
    }
}

struct CleanedUrl {
    url: String,
    username: Option<String>,
    path: String,
}

/// Reduce a URL to `scheme://host[:port]`, dropping a default port.
fn clean_url(raw: &str, allow_js: bool) -> CleanedUrl {
    let unchanged = || CleanedUrl { url: raw.to_string(), username: None, path: String::new() };

    let url = match Url::parse(raw) {
        Ok(url) => url,
        Err(e) => {
            debug!("cannot clean up URL {}: {}", raw, e);
            return unchanged();
        }
    };
    if allow_js && url.scheme() == "javascript" {
        return CleanedUrl { url: "javascript:".to_string(), username: None, path: String::new() };
    }
    let Some(host) = url.host_str() else {
        return unchanged();
    };

    let mut cleaned = format!("{}://{}", url.scheme(), host);
    if let Some(port) = url.port() {
        cleaned.push_str(&format!(":{port}"));
    }

    let username = match url.scheme() {
        "http" | "https" => None,
        _ => Some(url.username().to_string()).filter(|u| !u.is_empty()),
    };

    let mut path = String::new();
    if !url.path().is_empty() && url.path() != "/" {
        path.push_str(url.path());
    }
    if let Some(query) = url.query() {
        path.push('?');
        path.push_str(query);
    }

    CleanedUrl { url: cleaned, username, path }
}
