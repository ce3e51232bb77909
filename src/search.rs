use fuzzy_matcher::FuzzyMatcher;
use fuzzy_matcher::skim::SkimMatcherV2;

use crate::model::{FeatureCollection, FeatureRef};

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SearchOutcome {
    EmptyQuery,
    NoSection,
    NotFound(String),
    Found(FeatureRef),
}

/// Exact id match ignoring case; the first match in document order wins.
pub fn find_by_id_ci(collection: &FeatureCollection, query: &str) -> Option<FeatureRef> {
    let q = query.trim().to_lowercase();
    if q.is_empty() {
        return None;
    }
    collection
        .entries()
        .find(|(_, f)| f.id.to_lowercase() == q)
        .map(|(r, _)| r)
}

pub fn search_lot(lots: Option<&FeatureCollection>, query: &str) -> SearchOutcome {
    let q = query.trim();
    if q.is_empty() {
        return SearchOutcome::EmptyQuery;
    }
    let Some(lots) = lots else {
        return SearchOutcome::NoSection;
    };
    match find_by_id_ci(lots, q) {
        Some(r) => SearchOutcome::Found(r),
        None => SearchOutcome::NotFound(q.to_string()),
    }
}

/// Ids that fuzzily match `query`, best first.
pub fn suggest(collection: &FeatureCollection, query: &str, limit: usize) -> Vec<(FeatureRef, String)> {
    let q = query.trim();
    if q.is_empty() {
        return Vec::new();
    }
    let matcher = SkimMatcherV2::default();
    let mut out: Vec<_> = collection
        .entries()
        .filter_map(|(r, f)| matcher.fuzzy_match(&f.id, q).map(|score| (r, f.id.clone(), score)))
        .collect();
    out.sort_by(|a, b| b.2.cmp(&a.2).then_with(|| a.1.cmp(&b.1)));
    out.into_iter().take(limit).map(|(r, id, _)| (r, id)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Attributes, Feature, Point, Shape};

    fn lots(ids: &[&str]) -> FeatureCollection {
        ids.iter()
            .map(|id| Feature::new(*id, Shape::circle(Point::new(0.0, 0.0), 1.0), Attributes::new()))
            .collect()
    }

    #[test]
    fn id_lookup_ignores_case_and_whitespace() {
        let c = lots(&["L-1410", "L-1411"]);
        let r = find_by_id_ci(&c, "  l-1411 ").unwrap();
        assert_eq!(c.get(r).unwrap().id, "L-1411");
        assert_eq!(find_by_id_ci(&c, "L-14"), None);
    }

    #[test]
    fn search_reports_each_outcome() {
        let c = lots(&["L-1"]);
        assert_eq!(search_lot(Some(&c), " "), SearchOutcome::EmptyQuery);
        assert_eq!(search_lot(None, "L-1"), SearchOutcome::NoSection);
        assert_eq!(search_lot(Some(&c), "L-2"), SearchOutcome::NotFound("L-2".into()));
        assert!(matches!(search_lot(Some(&c), "l-1"), SearchOutcome::Found(_)));
    }

    #[test]
    fn suggestions_rank_closer_ids_first() {
        let c = lots(&["L-2001", "L-1411", "L-1410", "SEC-1"]);
        let ids: Vec<String> = suggest(&c, "l1411", 3).into_iter().map(|(_, id)| id).collect();
        assert_eq!(ids.first().map(String::as_str), Some("L-1411"));
        assert!(!ids.contains(&"SEC-1".to_string()));
        assert!(suggest(&c, "", 5).is_empty());
    }
}
