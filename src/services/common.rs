//! Helpers shared by the marketplace services: paging, slugs, country codes,
//! asset URLs and map coordinates.

use crate::errors::ServiceError;
use lazy_static::lazy_static;
use regex::Regex;
use url::Url;

lazy_static! {
    static ref SLUG_RE: Regex =
        Regex::new(r"^[a-z0-9]+(?:-[a-z0-9]+)*$").expect("valid slug regex");
    static ref COUNTRY_RE: Regex = Regex::new(r"^[A-Za-z]{2}$").expect("valid country regex");
}

pub const MAX_SLUG_LEN: usize = 120;

/// One page of a list request, already clamped to configured bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub page: u64,
    pub limit: u64,
}

impl Page {
    pub fn new(page: Option<u64>, limit: Option<u64>, default_limit: u64, max_limit: u64) -> Self {
        Self {
            page: page.unwrap_or(1).max(1),
            limit: limit.unwrap_or(default_limit).clamp(1, max_limit.max(1)),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1) * self.limit
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        if total == 0 {
            0
        } else {
            (total + self.limit - 1) / self.limit
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Self { page: 1, limit: 20 }
    }
}

/// Lowercase, ASCII, hyphen-separated form of a display name.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for ch in input.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            if pending_dash && !slug.is_empty() {
                slug.push('-');
            }
            pending_dash = false;
            slug.push(ch.to_ascii_lowercase());
        } else {
            pending_dash = true;
        }
    }

    if slug.len() > MAX_SLUG_LEN {
        slug.truncate(MAX_SLUG_LEN);
        while slug.ends_with('-') {
            slug.pop();
        }
    }
    slug
}

/// Uses the explicit slug when given, otherwise derives one from `name`.
pub fn resolve_slug(explicit: Option<&str>, name: &str) -> Result<String, ServiceError> {
    let slug = match explicit.map(str::trim).filter(|s| !s.is_empty()) {
        Some(given) => {
            let given = given.to_ascii_lowercase();
            if given.len() > MAX_SLUG_LEN || !SLUG_RE.is_match(&given) {
                return Err(ServiceError::ValidationError(format!(
                    "Invalid slug '{}': use lowercase letters, digits and single hyphens",
                    given
                )));
            }
            given
        }
        None => slugify(name),
    };

    if slug.is_empty() {
        return Err(ServiceError::ValidationError(
            "A slug could not be derived from the name".to_string(),
        ));
    }
    Ok(slug)
}

/// Normalises an ISO-2 country code to uppercase.
pub fn normalize_country(code: &str) -> Result<String, ServiceError> {
    let code = code.trim();
    if !COUNTRY_RE.is_match(code) {
        return Err(ServiceError::ValidationError(format!(
            "Invalid country code '{}': expected ISO 3166-1 alpha-2",
            code
        )));
    }
    Ok(code.to_ascii_uppercase())
}

pub fn normalize_countries(codes: &[String]) -> Result<Vec<String>, ServiceError> {
    let mut out: Vec<String> = Vec::with_capacity(codes.len());
    for code in codes {
        let code = normalize_country(code)?;
        if !out.contains(&code) {
            out.push(code);
        }
    }
    Ok(out)
}

/// Image URL rules for the external asset host.
///
/// With no hosts configured any absolute http(s) URL is accepted.
#[derive(Debug, Clone, Default)]
pub struct AssetPolicy {
    hosts: Vec<String>,
}

impl AssetPolicy {
    pub fn new(hosts: Vec<String>) -> Self {
        Self { hosts }
    }

    pub fn check(&self, field: &str, value: &str) -> Result<(), ServiceError> {
        let invalid =
            |reason: &str| ServiceError::ValidationError(format!("{} {}", field, reason));

        let url = Url::parse(value.trim()).map_err(|_| invalid("must be an absolute URL"))?;

        if self.hosts.is_empty() {
            return match url.scheme() {
                "http" | "https" => Ok(()),
                _ => Err(invalid("must use http or https")),
            };
        }

        if url.scheme() != "https" {
            return Err(invalid("must use https"));
        }
        let host = url.host_str().map(str::to_ascii_lowercase).unwrap_or_default();
        if self.hosts.iter().any(|allowed| *allowed == host) {
            Ok(())
        } else {
            Err(invalid("must be hosted on an allowed asset host"))
        }
    }

    pub fn check_opt(&self, field: &str, value: Option<&str>) -> Result<(), ServiceError> {
        match value {
            Some(v) => self.check(field, v),
            None => Ok(()),
        }
    }
}

pub fn check_coordinates(
    latitude: Option<f64>,
    longitude: Option<f64>,
) -> Result<(), ServiceError> {
    if let Some(lat) = latitude {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(ServiceError::ValidationError(
                "latitude must be between -90 and 90".to_string(),
            ));
        }
    }
    if let Some(lng) = longitude {
        if !(-180.0..=180.0).contains(&lng) {
            return Err(ServiceError::ValidationError(
                "longitude must be between -180 and 180".to_string(),
            ));
        }
    }
    Ok(())
}

/// `%term%` for case-insensitive LIKE searches; `None` for blank input.
pub fn search_pattern(search: Option<&str>) -> Option<String> {
    search
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| format!("%{}%", s.to_lowercase()))
}
