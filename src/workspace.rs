use thiserror::Error;

use crate::loader::{self, DocumentSource};
use crate::model::{DocumentKind, Feature, FeatureCollection};

const LOTS_FILE_KEY: &str = "lotesFile";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkspaceError {
    #[error("section {0} does not exist")]
    UnknownSection(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SectionRef {
    pub id: String,
    pub nombre: String,
    pub lots_file: Option<String>,
}

impl SectionRef {
    fn from_feature(feature: &Feature) -> Self {
        Self {
            id: feature.id.clone(),
            nombre: feature.display_name().to_string(),
            lots_file: feature
                .attr_str(LOTS_FILE_KEY)
                .map(str::trim)
                .filter(|s| !s.is_empty())
                .map(str::to_string),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SectionLoad {
    Loaded { lots: usize },
    NoLotsFile,
}

/// The sections document, the chosen section and that section's lots.
///
/// `generation` changes whenever a collection is replaced, so anything
/// holding a `FeatureRef` across frames can tell whether it still points
/// into the collection it was taken from.
#[derive(Clone, Debug, Default)]
pub struct Workspace {
    sections: FeatureCollection,
    current: Option<SectionRef>,
    lots: Option<FeatureCollection>,
    generation: u64,
}

impl Workspace {
    pub fn from_sections(sections: FeatureCollection) -> Self {
        Self {
            sections,
            ..Self::default()
        }
    }

    pub fn load(source: &impl DocumentSource, sections_location: &str) -> Self {
        Self::from_sections(loader::load_collection(source, sections_location))
    }

    pub fn sections(&self) -> &FeatureCollection {
        &self.sections
    }

    pub fn current(&self) -> Option<&SectionRef> {
        self.current.as_ref()
    }

    pub fn lots(&self) -> Option<&FeatureCollection> {
        self.lots.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn collection(&self, kind: DocumentKind) -> Option<&FeatureCollection> {
        match kind {
            DocumentKind::Sections => Some(&self.sections),
            DocumentKind::Lots => self.lots.as_ref(),
        }
    }

    pub fn collection_mut(&mut self, kind: DocumentKind) -> Option<&mut FeatureCollection> {
        match kind {
            DocumentKind::Sections => Some(&mut self.sections),
            DocumentKind::Lots => self.lots.as_mut(),
        }
    }

    /// `(id, label)` pairs for a section picker.
    pub fn section_options(&self) -> Vec<(String, String)> {
        self.sections
            .iter()
            .filter(|f| !f.id.is_empty())
            .map(|f| (f.id.clone(), f.display_name().to_string()))
            .collect()
    }

    pub fn select_section(
        &mut self,
        source: &impl DocumentSource,
        id: &str,
    ) -> Result<SectionLoad, WorkspaceError> {
        let section = self
            .sections
            .find_by_id(id)
            .and_then(|r| self.sections.get(r))
            .map(SectionRef::from_feature)
            .ok_or_else(|| WorkspaceError::UnknownSection(id.to_string()))?;
        self.generation += 1;
        let outcome = match &section.lots_file {
            Some(location) => {
                let lots = loader::load_collection(source, location);
                let outcome = SectionLoad::Loaded { lots: lots.len() };
                self.lots = Some(lots);
                outcome
            }
            None => {
                log::warn!("section {} has no lots file", section.id);
                self.lots = None;
                SectionLoad::NoLotsFile
            }
        };
        self.current = Some(section);
        Ok(outcome)
    }

    pub fn clear_section(&mut self) {
        if self.current.take().is_some() || self.lots.is_some() {
            self.generation += 1;
        }
        self.lots = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::memory::MemorySource;

    const SECTIONS: &str = r#"{"type":"FeatureCollection","features":[
        {"type":"Feature","geometry":{"type":"Polygon","coordinates":[[[0,0],[10,0],[10,10],[0,0]]]},
         "properties":{"id":"SEC-001","nombre":"Zona A","lotesFile":"./data/lotes-SEC-001.geojson"}},
        {"type":"Feature","geometry":{"type":"Polygon","coordinates":[[[20,0],[30,0],[30,10],[20,0]]]},
         "properties":{"id":"SEC-002"}},
        {"type":"Feature","geometry":{"type":"Polygon","coordinates":[[[40,0],[50,0],[50,10],[40,0]]]},
         "properties":{"id":"SEC-003","lotesFile":"./data/lotes-SEC-003.geojson"}}
    ]}"#;

    const LOTS: &str = r#"{"features":[
        {"geometry":{"type":"Point","coordinates":[5,5]},
         "properties":{"id":"L-1","shape":"circle","radius":1,"estatus":"ocupado"}}
    ]}"#;

    fn source() -> MemorySource {
        MemorySource::default()
            .with("./data/secciones.geojson", SECTIONS)
            .with("./data/lotes-SEC-001.geojson", LOTS)
    }

    #[test]
    fn selecting_a_section_loads_its_lots() {
        let source = source();
        let mut ws = Workspace::load(&source, "./data/secciones.geojson");
        assert_eq!(ws.sections().len(), 3);
        assert!(ws.collection(DocumentKind::Lots).is_none());

        let before = ws.generation();
        assert_eq!(
            ws.select_section(&source, "SEC-001"),
            Ok(SectionLoad::Loaded { lots: 1 })
        );
        assert!(ws.generation() > before);
        assert_eq!(ws.current().unwrap().nombre, "Zona A");
        assert_eq!(ws.lots().unwrap().len(), 1);
    }

    #[test]
    fn section_without_lots_file() {
        let source = source();
        let mut ws = Workspace::load(&source, "./data/secciones.geojson");
        ws.select_section(&source, "SEC-001").unwrap();
        assert_eq!(ws.select_section(&source, "SEC-002"), Ok(SectionLoad::NoLotsFile));
        assert!(ws.lots().is_none());
        assert_eq!(ws.current().unwrap().nombre, "SEC-002");
    }

    #[test]
    fn unreachable_lots_file_is_an_empty_collection() {
        let source = source();
        let mut ws = Workspace::load(&source, "./data/secciones.geojson");
        assert_eq!(
            ws.select_section(&source, "SEC-003"),
            Ok(SectionLoad::Loaded { lots: 0 })
        );
        assert!(ws.collection_mut(DocumentKind::Lots).is_some());
    }

    #[test]
    fn unknown_section_changes_nothing() {
        let source = source();
        let mut ws = Workspace::load(&source, "./data/secciones.geojson");
        let generation = ws.generation();
        assert_eq!(
            ws.select_section(&source, "SEC-999"),
            Err(WorkspaceError::UnknownSection("SEC-999".into()))
        );
        assert_eq!(ws.generation(), generation);
        assert!(ws.current().is_none());
    }

    #[test]
    fn clear_section_drops_lots() {
        let source = source();
        let mut ws = Workspace::load(&source, "./data/secciones.geojson");
        ws.select_section(&source, "SEC-001").unwrap();
        ws.clear_section();
        assert!(ws.current().is_none());
        assert!(ws.lots().is_none());
        assert_eq!(
            ws.section_options()[0],
            ("SEC-001".to_string(), "Zona A".to_string())
        );
    }

    #[test]
    fn missing_sections_document_is_empty() {
        let ws = Workspace::load(&MemorySource::default(), "./data/secciones.geojson");
        assert!(ws.sections().is_empty());
        assert!(ws.section_options().is_empty());
    }
}
