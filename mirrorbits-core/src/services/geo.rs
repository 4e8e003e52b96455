// src/services/geo.rs
//! Geolocation seam used when a mirror is created.
//!
//! The real lookup database lives outside this crate. The shipped locator
//! resolves the host with the system resolver and consults the static
//! `[geo.hosts]` table from the config file.

use std::collections::BTreeMap;
use std::net::{IpAddr, ToSocketAddrs};

use crate::config::GeoEntry;
use crate::services::mirror::GeoInfo;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct GeoLookup {
    pub info: Option<GeoInfo>,
    /// The hostname resolved to more than one address, so the location is a guess.
    pub multiple_addresses: bool,
}

pub trait GeoLocator {
    fn locate(&self, host: &str) -> GeoLookup;
}

impl From<&GeoEntry> for GeoInfo {
    fn from(e: &GeoEntry) -> Self {
        GeoInfo {
            latitude: e.latitude,
            longitude: e.longitude,
            continent_code: e.continent_code.to_uppercase(),
            country_codes: e.country_code.to_uppercase(),
            asnum: e.asnum,
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct TableGeoLocator {
    hosts: BTreeMap<String, GeoEntry>,
}

impl TableGeoLocator {
    pub fn new(hosts: BTreeMap<String, GeoEntry>) -> Self {
        Self { hosts }
    }

    fn resolve(host: &str) -> Vec<IpAddr> {
        let mut ips: Vec<IpAddr> = match (host, 0u16).to_socket_addrs() {
            Ok(addrs) => addrs.map(|a| a.ip()).collect(),
            Err(e) => {
                tracing::debug!(host, "address lookup failed: {e}");
                Vec::new()
            }
        };
        ips.sort();
        ips.dedup();
        ips
    }
}

impl GeoLocator for TableGeoLocator {
    fn locate(&self, host: &str) -> GeoLookup {
        if let Some(entry) = self.hosts.get(host) {
            return GeoLookup {
                info: Some(entry.into()),
                multiple_addresses: false,
            };
        }
        let ips = Self::resolve(host);
        let info = ips
            .iter()
            .find_map(|ip| self.hosts.get(&ip.to_string()))
            .map(GeoInfo::from);
        GeoLookup {
            info,
            multiple_addresses: ips.len() > 1,
        }
    }
}
