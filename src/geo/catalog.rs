use crate::utils::{GeoAssistError, Result};
use serde::{Deserialize, Serialize};

pub const ZONE_MIN: u32 = 1;
pub const ZONE_MAX: u32 = 60;
pub const ZONES_PER_PAGE: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CrsFamily {
    Simple,
    Zoned,
}

/// Catalog entry. For the simple family `code` is the EPSG code itself; for
/// the zoned family it is the base offset the zone number is added to.
#[derive(Debug, Clone, Copy)]
pub struct CrsEntry {
    pub key: &'static str,
    pub label: &'static str,
    pub family: CrsFamily,
    code: u32,
}

/// A fully resolved reference system, ready to hand to the transform stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrsRef {
    pub code: String,
    pub label: String,
}

static CATALOG: &[CrsEntry] = &[
    CrsEntry {
        key: "wgs84",
        label: "WGS 84 (geographic)",
        family: CrsFamily::Simple,
        code: 4326,
    },
    CrsEntry {
        key: "sk42",
        label: "Pulkovo 1942 (geographic)",
        family: CrsFamily::Simple,
        code: 4284,
    },
    CrsEntry {
        key: "sk42_gk",
        label: "Pulkovo 1942 / Gauss-Kruger",
        family: CrsFamily::Zoned,
        code: 28400,
    },
    CrsEntry {
        key: "utm",
        label: "WGS 84 / UTM north",
        family: CrsFamily::Zoned,
        code: 32600,
    },
];

pub fn entries() -> &'static [CrsEntry] {
    CATALOG
}

pub fn lookup(key: &str) -> Result<&'static CrsEntry> {
    CATALOG
        .iter()
        .find(|e| e.key == key)
        .ok_or_else(|| GeoAssistError::UnknownCrs(key.to_string()))
}

impl CrsEntry {
    /// Realize a transform-ready descriptor. Zoned entries require a zone in
    /// [ZONE_MIN, ZONE_MAX]; out-of-range zones are rejected, never clamped.
    pub fn resolve(&self, zone: Option<u32>) -> Result<CrsRef> {
        match (self.family, zone) {
            (CrsFamily::Simple, _) => Ok(CrsRef {
                code: format!("EPSG:{}", self.code),
                label: self.label.to_string(),
            }),
            (CrsFamily::Zoned, Some(z)) => {
                if !(ZONE_MIN..=ZONE_MAX).contains(&z) {
                    return Err(GeoAssistError::InvalidZone(z));
                }
                Ok(CrsRef {
                    code: format!("EPSG:{}", self.code + z),
                    label: format!("{} zone {}", self.label, z),
                })
            }
            (CrsFamily::Zoned, None) => {
                Err(GeoAssistError::ZoneNotResolved(self.key.to_string()))
            }
        }
    }
}

/// Zone numbers for one presentation page: page 0 is 1..=30, page 1 is 31..=60.
pub fn zone_page(page: usize) -> Option<Vec<u32>> {
    let start = ZONE_MIN + (page as u32) * ZONES_PER_PAGE as u32;
    if start > ZONE_MAX {
        return None;
    }
    let end = (start + ZONES_PER_PAGE as u32 - 1).min(ZONE_MAX);
    Some((start..=end).collect())
}
