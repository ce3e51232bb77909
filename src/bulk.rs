//! Pasted attribute lists (from a spreadsheet) used to pre-fill new shapes.

use crate::model::DocumentKind;

pub const DEFAULT_LOT_STATUS: &str = "disponible";

const HEADER_TOKEN: &str = "id";
const DELIMITERS: [char; 4] = ['\t', ',', ';', '|'];

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Record {
    Section {
        id: String,
        nombre: String,
    },
    Lot {
        id: String,
        estatus: String,
        paquete: Option<String>,
    },
}

impl Record {
    pub fn id(&self) -> &str {
        match self {
            Record::Section { id, .. } | Record::Lot { id, .. } => id,
        }
    }

    pub fn summary(&self) -> String {
        match self {
            Record::Section { id, nombre } => format!("{id} — {nombre}"),
            Record::Lot {
                id,
                estatus,
                paquete: Some(p),
            } => format!("{id} — {estatus} — {p}"),
            Record::Lot { id, estatus, .. } => format!("{id} — {estatus}"),
        }
    }
}

/// Splits one line on the first delimiter found among tab, comma, semicolon
/// and pipe, or on runs of two or more whitespace characters.
pub fn split_fields(line: &str) -> Vec<String> {
    if let Some(d) = DELIMITERS.iter().copied().find(|d| line.contains(*d)) {
        return line.split(d).map(|s| s.trim().to_string()).collect();
    }
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut run = String::new();
    for ch in line.chars() {
        if ch.is_whitespace() {
            run.push(ch);
            continue;
        }
        if run.chars().count() >= 2 {
            fields.push(current.trim().to_string());
            current.clear();
        } else {
            current.push_str(&run);
        }
        run.clear();
        current.push(ch);
    }
    fields.push(current.trim().to_string());
    fields
}

fn field(cols: &[String], i: usize) -> Option<&str> {
    cols.get(i).map(String::as_str).filter(|s| !s.is_empty())
}

pub fn parse(text: &str, kind: DocumentKind) -> Vec<Record> {
    let mut items = Vec::new();
    for line in text.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let mut cols = split_fields(line);
        if kind == DocumentKind::Sections {
            // Section lists ignore blank columns; lot columns are positional.
            cols.retain(|c| !c.is_empty());
        }
        let Some(id) = field(&cols, 0) else {
            continue;
        };
        if id.eq_ignore_ascii_case(HEADER_TOKEN) {
            continue;
        }
        let record = match kind {
            DocumentKind::Sections => Record::Section {
                id: id.to_string(),
                nombre: field(&cols, 1).unwrap_or(id).to_string(),
            },
            DocumentKind::Lots => Record::Lot {
                id: id.to_string(),
                estatus: field(&cols, 1).unwrap_or(DEFAULT_LOT_STATUS).to_string(),
                paquete: field(&cols, 2).map(str::to_string),
            },
        };
        items.push(record);
    }
    log::debug!("parsed {} {:?} records from bulk text", items.len(), kind);
    items
}

/// Parsed records plus a cursor that only moves forward.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct BulkQueue {
    items: Vec<Record>,
    cursor: usize,
    enabled: bool,
}

impl BulkQueue {
    /// Replaces the list and rewinds. The enabled flag is left as it was.
    pub fn load(&mut self, items: Vec<Record>) {
        self.items = items;
        self.cursor = 0;
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn remaining(&self) -> usize {
        self.items.len() - self.cursor
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
    }

    pub fn next(&self) -> Option<&Record> {
        self.items.get(self.cursor)
    }

    /// The record a new create form should be filled with, if any.
    pub fn prefill(&self) -> Option<&Record> {
        self.next().filter(|_| self.enabled)
    }

    pub fn skip(&mut self) {
        self.advance();
    }

    /// Called after a successful create; only an enabled queue is consumed.
    pub fn consume(&mut self) {
        if self.enabled {
            self.advance();
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
        self.cursor = 0;
        self.enabled = false;
    }

    pub fn status_line(&self) -> String {
        let next = self
            .next()
            .map(Record::summary)
            .unwrap_or_else(|| "(sin siguiente)".to_string());
        format!(
            "Lista: {} | Restantes: {} | Usar al crear: {} | Siguiente: {}",
            self.len(),
            self.remaining(),
            if self.enabled { "Sí" } else { "No" },
            next
        )
    }

    fn advance(&mut self) {
        if self.cursor < self.items.len() {
            self.cursor += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_line_is_skipped() {
        let records = parse("id,nombre\nSEC-001,Zona A", DocumentKind::Sections);
        assert_eq!(
            records,
            vec![Record::Section {
                id: "SEC-001".into(),
                nombre: "Zona A".into()
            }]
        );
    }

    #[test]
    fn header_match_ignores_case() {
        let records = parse("ID\tESTATUS\nL-1\tocupado", DocumentKind::Lots);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].id(), "L-1");
    }

    #[test]
    fn delimiter_priority_is_tab_comma_semicolon_pipe() {
        assert_eq!(split_fields("a,b\tc"), vec!["a,b", "c"]);
        assert_eq!(split_fields("a;b,c"), vec!["a;b", "c"]);
        assert_eq!(split_fields("a|b;c"), vec!["a|b", "c"]);
        assert_eq!(split_fields("a | b"), vec!["a", "b"]);
    }

    #[test]
    fn wide_whitespace_separates_fields() {
        assert_eq!(
            split_fields("L-1  por construir   PAQ-1"),
            vec!["L-1", "por construir", "PAQ-1"]
        );
        assert_eq!(split_fields("Zona A"), vec!["Zona A"]);
    }

    #[test]
    fn lot_defaults_fill_blank_columns() {
        let text = "L-1001,disponible,PAQ-JARDIN-STD\nL-1002,ocupado,\nL-1003\n ,ocupado\n\n";
        let records = parse(text, DocumentKind::Lots);
        assert_eq!(
            records,
            vec![
                Record::Lot {
                    id: "L-1001".into(),
                    estatus: "disponible".into(),
                    paquete: Some("PAQ-JARDIN-STD".into())
                },
                Record::Lot {
                    id: "L-1002".into(),
                    estatus: "ocupado".into(),
                    paquete: None
                },
                Record::Lot {
                    id: "L-1003".into(),
                    estatus: "disponible".into(),
                    paquete: None
                },
            ]
        );
    }

    #[test]
    fn section_name_falls_back_to_id() {
        let records = parse("SEC-002,\r\nSEC-003,San Andrés B", DocumentKind::Sections);
        assert_eq!(
            records[0],
            Record::Section {
                id: "SEC-002".into(),
                nombre: "SEC-002".into()
            }
        );
        assert_eq!(records[1].summary(), "SEC-003 — San Andrés B");
    }

    #[test]
    fn section_columns_skip_blanks_but_lot_columns_do_not() {
        let sections = parse("SEC-1,,Zona A", DocumentKind::Sections);
        assert_eq!(
            sections,
            vec![Record::Section {
                id: "SEC-1".into(),
                nombre: "Zona A".into()
            }]
        );
        let lots = parse("L-1,,PAQ-1", DocumentKind::Lots);
        assert_eq!(
            lots,
            vec![Record::Lot {
                id: "L-1".into(),
                estatus: DEFAULT_LOT_STATUS.into(),
                paquete: Some("PAQ-1".into())
            }]
        );
    }

    #[test]
    fn cursor_is_monotonic_and_capped() {
        let mut queue = BulkQueue::default();
        queue.load(parse("L-1\nL-2\nL-3", DocumentKind::Lots));
        queue.set_enabled(true);
        queue.skip();
        queue.skip();
        queue.consume();
        assert_eq!(queue.cursor(), 3);
        queue.skip();
        queue.consume();
        assert_eq!(queue.cursor(), 3);
        assert_eq!(queue.remaining(), 0);
        assert!(queue.next().is_none());
    }

    #[test]
    fn disabled_queue_is_not_consumed_or_offered() {
        let mut queue = BulkQueue::default();
        queue.load(parse("L-1\nL-2", DocumentKind::Lots));
        assert!(queue.prefill().is_none());
        queue.consume();
        assert_eq!(queue.cursor(), 0);
        queue.toggle();
        assert_eq!(queue.prefill().map(Record::id), Some("L-1"));
    }

    #[test]
    fn clear_resets_everything_and_load_keeps_flag() {
        let mut queue = BulkQueue::default();
        queue.load(parse("L-1\nL-2", DocumentKind::Lots));
        queue.set_enabled(true);
        queue.skip();
        queue.load(parse("L-9", DocumentKind::Lots));
        assert_eq!(queue.cursor(), 0);
        assert!(queue.is_enabled());
        queue.clear();
        assert!(queue.is_empty());
        assert_eq!(queue.cursor(), 0);
        assert!(!queue.is_enabled());
        assert!(queue.status_line().contains("(sin siguiente)"));
    }
}
