//! Read-only lookup documents used by the public lot panel.

use std::collections::HashMap;

use serde::Deserialize;

use crate::model::Feature;

pub const UNKNOWN_STATUS: &str = "desconocido";

/// One entry of the lot catalog (`lotes.json`).
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct LotInfo {
    pub estatus: Option<String>,
    pub paquete: Option<String>,
    pub package: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct LotCatalog(HashMap<String, LotInfo>);

impl LotCatalog {
    pub fn get(&self, lot_id: &str) -> Option<&LotInfo> {
        self.0.get(lot_id)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct Package {
    pub nombre: String,
    pub items: Vec<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct PackageCatalog(HashMap<String, Package>);

impl PackageCatalog {
    pub fn get(&self, key: &str) -> Option<&Package> {
        self.0.get(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LotStatus {
    Disponible,
    Ocupado,
    PorConstruir,
    #[default]
    Other,
}

impl LotStatus {
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "disponible" => LotStatus::Disponible,
            "ocupado" => LotStatus::Ocupado,
            "por construir" => LotStatus::PorConstruir,
            _ => LotStatus::Other,
        }
    }

    pub fn is_dashed(self) -> bool {
        self == LotStatus::PorConstruir
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PackageLookup {
    Unassigned,
    NotDefined(String),
    Found(Package),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LotSummary {
    pub id: String,
    pub estatus: String,
    pub status: LotStatus,
    /// Only available lots offer a package.
    pub package: Option<PackageLookup>,
}

fn non_empty(v: Option<&str>) -> Option<&str> {
    v.map(str::trim).filter(|s| !s.is_empty())
}

/// The feature's own `estatus`, else the catalog's, else [`UNKNOWN_STATUS`].
pub fn resolve_estatus<'a>(feature: &'a Feature, lots: &'a LotCatalog) -> &'a str {
    non_empty(feature.attr_str("estatus"))
        .or_else(|| non_empty(lots.get(&feature.id).and_then(|i| i.estatus.as_deref())))
        .unwrap_or(UNKNOWN_STATUS)
}

/// Merges the feature's own properties with the catalog entry. Properties win.
///
/// The first package key that is present decides, even when it is blank.
pub fn summarize_lot(feature: &Feature, lots: &LotCatalog, packages: &PackageCatalog) -> LotSummary {
    let estatus = resolve_estatus(feature, lots).to_string();
    let status = LotStatus::parse(&estatus);
    let package = (status == LotStatus::Disponible).then(|| {
        let info = lots.get(&feature.id);
        let key = feature
            .attr_str("paquete")
            .or_else(|| feature.attr_str("package"))
            .or_else(|| info.and_then(|i| i.paquete.as_deref()))
            .or_else(|| info.and_then(|i| i.package.as_deref()));
        match key.map(str::trim).filter(|k| !k.is_empty()) {
            None => PackageLookup::Unassigned,
            Some(key) => packages
                .get(key)
                .cloned()
                .map_or_else(|| PackageLookup::NotDefined(key.to_string()), PackageLookup::Found),
        }
    });
    LotSummary {
        id: feature.id.clone(),
        estatus,
        status,
        package,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Attributes, Point, Shape};
    use serde_json::json;

    fn lot(id: &str, props: serde_json::Value) -> Feature {
        let attrs: Attributes = serde_json::from_value(props).unwrap();
        Feature::new(id, Shape::circle(Point::new(0.0, 0.0), 1.0), attrs)
    }

    fn catalogs() -> (LotCatalog, PackageCatalog) {
        let lots = serde_json::from_value(json!({
            "L-1": {"estatus": "ocupado", "paquete": "PAQ-A"},
            "L-2": {"estatus": "disponible", "package": "PAQ-B"},
            "L-3": {"estatus": "disponible"}
        }))
        .unwrap();
        let packages = serde_json::from_value(json!({
            "PAQ-A": {"nombre": "Jardín estándar", "items": ["Lápida", "Florero"]}
        }))
        .unwrap();
        (lots, packages)
    }

    #[test]
    fn properties_override_catalog() {
        let (lots, packages) = catalogs();
        let summary = summarize_lot(&lot("L-1", json!({"estatus": "Disponible"})), &lots, &packages);
        assert_eq!(summary.estatus, "Disponible");
        assert_eq!(summary.status, LotStatus::Disponible);
        let Some(PackageLookup::Found(package)) = summary.package else {
            panic!("catalog package should resolve");
        };
        assert_eq!(package.items, vec!["Lápida", "Florero"]);
    }

    #[test]
    fn unresolved_package_is_not_defined() {
        let (lots, packages) = catalogs();
        let summary = summarize_lot(&lot("L-2", json!({})), &lots, &packages);
        assert_eq!(summary.package, Some(PackageLookup::NotDefined("PAQ-B".into())));
        let summary = summarize_lot(&lot("L-3", json!({"paquete": null})), &lots, &packages);
        assert_eq!(summary.package, Some(PackageLookup::Unassigned));
    }

    #[test]
    fn blank_package_property_means_unassigned() {
        let (lots, packages) = catalogs();
        let summary = summarize_lot(
            &lot("L-1", json!({"estatus": "disponible", "paquete": "  "})),
            &lots,
            &packages,
        );
        assert_eq!(summary.package, Some(PackageLookup::Unassigned));
    }

    #[test]
    fn packages_only_for_available_lots() {
        let (lots, packages) = catalogs();
        let occupied = summarize_lot(&lot("L-1", json!({})), &lots, &packages);
        assert_eq!(occupied.status, LotStatus::Ocupado);
        assert_eq!(occupied.package, None);
        for estatus in ["por construir", "reservado"] {
            let summary = summarize_lot(
                &lot("L-1", json!({"estatus": estatus, "paquete": "PAQ-A"})),
                &lots,
                &packages,
            );
            assert_eq!(summary.package, None, "{estatus}");
        }
    }

    #[test]
    fn missing_entry_is_unknown() {
        let (lots, packages) = catalogs();
        let summary = summarize_lot(&lot("L-404", json!({})), &lots, &packages);
        assert_eq!(summary.estatus, UNKNOWN_STATUS);
        assert_eq!(summary.status, LotStatus::Other);
        assert_eq!(summary.package, None);
    }

    #[test]
    fn status_classes_ignore_case() {
        assert_eq!(LotStatus::parse(" POR CONSTRUIR "), LotStatus::PorConstruir);
        assert!(LotStatus::parse("por construir").is_dashed());
        assert_eq!(LotStatus::parse("Ocupado"), LotStatus::Ocupado);
        assert_eq!(LotStatus::parse("reservado"), LotStatus::Other);
    }
}
