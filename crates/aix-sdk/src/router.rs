//! Hash-fragment routes (`#/<route>` and `#/<route>/<slug>`)

use std::fmt;

/// An in-app view
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Home,
    /// Smartphone catalog
    Catalog,
    /// One smartphone by slug
    Phone(String),
    News,
    /// One article by slug
    Article(String),
    Compare,
    /// TKDN certification search
    Tkdn,
    Bookmarks,
    Login,
    Admin,
    /// Back-office section, e.g. `articles` or `ads`
    AdminSection(String),
    NotFound(String),
}

impl Route {
    /// Parse a location hash such as `#/news/galaxy-s25-rilis?ref=home`
    pub fn parse(hash: &str) -> Self {
        let path = hash.trim_start_matches('#');
        let path = path.split(['?', '&']).next().unwrap_or_default();
        let segments: Vec<String> = path
            .split('/')
            .filter(|s| !s.is_empty())
            .map(decode)
            .collect();

        match segments.as_slice() {
            [] => Route::Home,
            [route] => match route.as_str() {
                "home" => Route::Home,
                "smartphones" => Route::Catalog,
                "news" => Route::News,
                "compare" => Route::Compare,
                "tkdn" => Route::Tkdn,
                "bookmarks" => Route::Bookmarks,
                "login" => Route::Login,
                "admin" => Route::Admin,
                _ => Route::NotFound(path.to_string()),
            },
            [route, slug] => match route.as_str() {
                "smartphones" => Route::Phone(slug.clone()),
                "news" => Route::Article(slug.clone()),
                "admin" => Route::AdminSection(slug.clone()),
                _ => Route::NotFound(path.to_string()),
            },
            _ => Route::NotFound(path.to_string()),
        }
    }

    /// Canonical fragment, including the leading `#/`
    pub fn to_hash(&self) -> String {
        match self {
            Route::Home => "#/".to_string(),
            Route::Catalog => "#/smartphones".to_string(),
            Route::Phone(slug) => format!("#/smartphones/{}", urlencoding::encode(slug)),
            Route::News => "#/news".to_string(),
            Route::Article(slug) => format!("#/news/{}", urlencoding::encode(slug)),
            Route::Compare => "#/compare".to_string(),
            Route::Tkdn => "#/tkdn".to_string(),
            Route::Bookmarks => "#/bookmarks".to_string(),
            Route::Login => "#/login".to_string(),
            Route::Admin => "#/admin".to_string(),
            Route::AdminSection(section) => format!("#/admin/{}", urlencoding::encode(section)),
            Route::NotFound(path) => format!("#/{}", path.trim_start_matches('/')),
        }
    }

    /// Views that need a signed-in user
    pub fn requires_auth(&self) -> bool {
        matches!(self, Route::Admin | Route::AdminSection(_) | Route::Bookmarks)
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hash())
    }
}

fn decode(segment: &str) -> String {
    urlencoding::decode(segment)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| segment.to_string())
}
