use crate::config::SearchVariables;
use crate::db::connection::{init_db, Database};
use crate::listing_source::{ListingSource, SourceError};
use astra::{Body, Request, Response};
use http::Method;
use serde_json::{json, Value};
use std::io::Read;
use std::sync::atomic::{AtomicUsize, Ordering};

static NEXT_DB: AtomicUsize = AtomicUsize::new(0);

/// Initialize a fresh test DB using the production schema. Every call gets its own file.
pub fn init_test_db() -> Database {
    let path = std::env::temp_dir().join(format!(
        "listing_quality_test_{}_{}.sqlite",
        std::process::id(),
        NEXT_DB.fetch_add(1, Ordering::SeqCst)
    ));
    let _ = std::fs::remove_file(&path);
    let db = Database::new(path.display().to_string());

    init_db(&db).unwrap_or_else(|e| panic!("Database initialization failed: {e}"));

    db
}

/// Serves the same dataset for every run.
pub struct StaticSource {
    data: Value,
}

impl StaticSource {
    pub fn new(data: Value) -> Self {
        Self { data }
    }
}

impl ListingSource for StaticSource {
    fn fetch_listings(&self, _search: &SearchVariables) -> Result<Value, SourceError> {
        Ok(self.data.clone())
    }
}

/// Three listings whose pooled reviews peak in Q1.
pub fn sample_listings() -> Value {
    json!([
        {
            "name": "Harbour Loft",
            "url": "https://rentals.example/rooms/1",
            "Location": "Portland",
            "stars": 4.8,
            "numberOfGuests": 4,
            "bedroomLabel": "2 bedrooms",
            "reviews": [
                { "createdAt": "2023-01-05T10:00:00.000Z" },
                { "createdAt": "2023-02-11T10:00:00.000Z" },
                { "createdAt": "2023-03-20T10:00:00.000Z" }
            ]
        },
        {
            "name": "Garden Studio",
            "url": "https://rentals.example/rooms/2",
            "bedroomLabel": "Studio",
            "reviews": [{ "createdAt": "2023-01-15T10:00:00.000Z" }]
        },
        {
            "name": "Lake House",
            "url": "https://rentals.example/rooms/3",
            "bedroomLabel": "4 bedrooms",
            "reviews": [
                { "createdAt": "2023-02-01T10:00:00.000Z" },
                { "createdAt": "2023-08-01T10:00:00.000Z" }
            ]
        }
    ])
}

pub fn request(method: Method, uri: &str, body: &str) -> Request {
    let mut req = Request::new(Body::from(body.to_string()));
    *req.method_mut() = method;
    *req.uri_mut() = uri.parse().expect("valid test uri");
    if !body.is_empty() {
        req.headers_mut().insert(
            "Content-Type",
            "application/x-www-form-urlencoded".parse().expect("valid header"),
        );
    }
    req
}

pub fn body_bytes(mut resp: Response) -> Vec<u8> {
    let mut bytes = Vec::new();
    resp.body_mut()
        .reader()
        .read_to_end(&mut bytes)
        .expect("readable body");
    bytes
}

pub fn body_string(resp: Response) -> String {
    String::from_utf8(body_bytes(resp)).expect("utf-8 body")
}
