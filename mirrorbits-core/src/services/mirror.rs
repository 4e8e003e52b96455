// src/services/mirror.rs
//! In-memory mirror record and its hand-written mapping to the store's field map.
//!
//! The field names below are the wire schema shared with the daemon; the Rust
//! field names are free to differ.

use chrono::{DateTime, Utc};

use crate::services::store::FieldMap;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Endpoints {
    pub http: String,
    pub rsync: String,
    pub ftp: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Sponsor {
    pub name: String,
    pub url: String,
    pub logo_url: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Admin {
    pub name: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Scope {
    pub continent_only: bool,
    pub country_only: bool,
    pub as_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoInfo {
    pub latitude: f32,
    pub longitude: f32,
    pub continent_code: String,
    /// Space-separated upper-case ISO codes.
    pub country_codes: String,
    pub asnum: u32,
}

impl GeoInfo {
    /// First listed country, used as the mirror's primary country.
    pub fn primary_country(&self) -> Option<&str> {
        self.country_codes.split_whitespace().next()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct MirrorRecord {
    pub id: String,
    pub endpoints: Endpoints,
    pub sponsor: Sponsor,
    pub admin: Admin,
    pub custom_data: String,
    pub scope: Scope,
    pub score: i64,
    pub geo: GeoInfo,
    pub enabled: bool,
    pub up: bool,
    /// Unix seconds of the last up/down transition.
    pub state_since: i64,
}

impl MirrorRecord {
    pub fn state_since_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp(self.state_since, 0)
    }

    /// Every field the operator controls. Excludes liveness (`up`,
    /// `stateSince`), which only the daemon's health checks maintain.
    pub fn editable_fields(&self) -> FieldMap {
        let mut m = FieldMap::new();
        put(&mut m, "ID", &self.id);
        put(&mut m, "http", &self.endpoints.http);
        put(&mut m, "rsync", &self.endpoints.rsync);
        put(&mut m, "ftp", &self.endpoints.ftp);
        put(&mut m, "sponsorName", &self.sponsor.name);
        put(&mut m, "sponsorURL", &self.sponsor.url);
        put(&mut m, "sponsorLogo", &self.sponsor.logo_url);
        put(&mut m, "adminName", &self.admin.name);
        put(&mut m, "adminEmail", &self.admin.email);
        put(&mut m, "customData", &self.custom_data);
        put(&mut m, "continentOnly", flag(self.scope.continent_only));
        put(&mut m, "countryOnly", flag(self.scope.country_only));
        put(&mut m, "asOnly", flag(self.scope.as_only));
        put(&mut m, "score", &self.score.to_string());
        put(&mut m, "latitude", &format!("{:.6}", self.geo.latitude));
        put(&mut m, "longitude", &format!("{:.6}", self.geo.longitude));
        put(&mut m, "continentCode", &self.geo.continent_code);
        put(&mut m, "countryCodes", &self.geo.country_codes);
        put(&mut m, "asnum", &self.geo.asnum.to_string());
        put(&mut m, "enabled", flag(self.enabled));
        m
    }

    /// The complete field map, liveness included.
    pub fn to_fields(&self) -> FieldMap {
        let mut m = self.editable_fields();
        put(&mut m, "up", flag(self.up));
        put(&mut m, "stateSince", &self.state_since.to_string());
        m
    }

    /// Rebuild a record from a stored field map. Missing or malformed fields
    /// fall back to their defaults, as the daemon does.
    pub fn from_fields(fields: &FieldMap) -> Self {
        let text = |name: &str| fields.get(name).cloned().unwrap_or_default();
        Self {
            id: text("ID"),
            endpoints: Endpoints {
                http: text("http"),
                rsync: text("rsync"),
                ftp: text("ftp"),
            },
            sponsor: Sponsor {
                name: text("sponsorName"),
                url: text("sponsorURL"),
                logo_url: text("sponsorLogo"),
            },
            admin: Admin {
                name: text("adminName"),
                email: text("adminEmail"),
            },
            custom_data: text("customData"),
            scope: Scope {
                continent_only: boolean(fields, "continentOnly"),
                country_only: boolean(fields, "countryOnly"),
                as_only: boolean(fields, "asOnly"),
            },
            score: number(fields, "score"),
            geo: GeoInfo {
                latitude: number(fields, "latitude"),
                longitude: number(fields, "longitude"),
                continent_code: text("continentCode"),
                country_codes: text("countryCodes"),
                asnum: number(fields, "asnum"),
            },
            enabled: boolean(fields, "enabled"),
            up: boolean(fields, "up"),
            state_since: number(fields, "stateSince"),
        }
    }
}

fn put(m: &mut FieldMap, name: &str, value: &str) {
    m.insert(name.to_string(), value.to_string());
}

fn flag(b: bool) -> &'static str {
    if b { "1" } else { "0" }
}

fn boolean(fields: &FieldMap, name: &str) -> bool {
    matches!(
        fields.get(name).map(|v| v.trim()),
        Some("1") | Some("true") | Some("TRUE") | Some("True")
    )
}

fn number<T: std::str::FromStr + Default>(fields: &FieldMap, name: &str) -> T {
    fields
        .get(name)
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or_default()
}
