use serde_json::Value;

use crate::bulk::{DEFAULT_LOT_STATUS, Record};
use crate::model::{Attributes, DocumentKind, ID_KEY};

pub const LOT_STATUSES: [&str; 3] = ["disponible", "ocupado", "por construir"];

/// Where the lots of a newly created section are expected to live.
pub fn lots_file_for(section_id: &str) -> String {
    format!("./data/lotes-{section_id}.geojson")
}

/// Values typed (or pre-filled) for the next shape to be created.
#[derive(Clone, Debug, PartialEq)]
pub struct CreateForm {
    pub kind: DocumentKind,
    pub id: String,
    pub nombre: String,
    pub estatus: String,
    pub paquete: String,
}

impl CreateForm {
    pub fn blank(kind: DocumentKind) -> Self {
        Self {
            kind,
            id: String::new(),
            nombre: String::new(),
            estatus: DEFAULT_LOT_STATUS.to_string(),
            paquete: String::new(),
        }
    }

    pub fn fill_from(&mut self, record: &Record) {
        match record {
            Record::Section { id, nombre } => {
                self.id = id.clone();
                self.nombre = nombre.clone();
            }
            Record::Lot {
                id,
                estatus,
                paquete,
            } => {
                self.id = id.clone();
                self.estatus = estatus.clone();
                self.paquete = paquete.clone().unwrap_or_default();
            }
        }
    }

    pub fn trimmed_id(&self) -> Option<&str> {
        Some(self.id.trim()).filter(|id| !id.is_empty())
    }

    /// Properties for the new feature, without geometry-owned keys.
    pub fn attributes(&self) -> Attributes {
        let id = self.id.trim().to_string();
        let mut attrs = Attributes::new();
        match self.kind {
            DocumentKind::Sections => {
                let nombre = self.nombre.trim();
                let nombre = if nombre.is_empty() { id.as_str() } else { nombre };
                attrs.insert("nombre".into(), Value::from(nombre));
                attrs.insert("lotesFile".into(), Value::from(lots_file_for(&id)));
            }
            DocumentKind::Lots => {
                let estatus = self.estatus.trim();
                let estatus = if estatus.is_empty() {
                    DEFAULT_LOT_STATUS
                } else {
                    estatus
                };
                let paquete = self.paquete.trim();
                attrs.insert("estatus".into(), Value::from(estatus));
                attrs.insert(
                    "paquete".into(),
                    if paquete.is_empty() {
                        Value::Null
                    } else {
                        Value::from(paquete)
                    },
                );
            }
        }
        attrs.insert(ID_KEY.into(), Value::from(id));
        attrs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn section_attributes_default_name_and_lots_file() {
        let mut form = CreateForm::blank(DocumentKind::Sections);
        form.id = "  SEC-010 ".into();
        let attrs = form.attributes();
        assert_eq!(attrs["id"], "SEC-010");
        assert_eq!(attrs["nombre"], "SEC-010");
        assert_eq!(attrs["lotesFile"], "./data/lotes-SEC-010.geojson");
    }

    #[test]
    fn lot_attributes_use_null_for_missing_package() {
        let mut form = CreateForm::blank(DocumentKind::Lots);
        form.id = "L-1411".into();
        let attrs = form.attributes();
        assert_eq!(attrs["estatus"], "disponible");
        assert_eq!(attrs["paquete"], Value::Null);
        form.paquete = "PAQ-JARDIN-STD".into();
        assert_eq!(form.attributes()["paquete"], "PAQ-JARDIN-STD");
    }

    #[test]
    fn fill_from_lot_record() {
        let mut form = CreateForm::blank(DocumentKind::Lots);
        form.paquete = "stale".into();
        form.fill_from(&Record::Lot {
            id: "L-7".into(),
            estatus: "ocupado".into(),
            paquete: None,
        });
        assert_eq!(form.trimmed_id(), Some("L-7"));
        assert_eq!(form.estatus, "ocupado");
        assert!(form.paquete.is_empty());
    }

    #[test]
    fn blank_id_is_missing() {
        let mut form = CreateForm::blank(DocumentKind::Sections);
        form.id = "   ".into();
        assert_eq!(form.trimmed_id(), None);
    }
}
