use std::collections::BTreeMap;

/// Facet name → value. Absent or empty entries mean "no constraint".
/// Values stay strings end to end; numeric facets are parsed loosely on
/// the server side.
pub type FilterState = BTreeMap<String, String>;

/// Draft/apply/clear semantics of the filter bars: the draft mirrors the
/// active values until submit, Apply emits the whole draft (never a
/// diff), Clear emits an empty state.
#[derive(Debug, Default, Clone)]
pub struct FilterForm {
    active: FilterState,
    draft: FilterState,
}

impl FilterForm {
    pub fn new(active: FilterState) -> Self {
        let draft = active.clone();
        Self { active, draft }
    }

    pub fn set(&mut self, facet: &str, value: &str) {
        if value.is_empty() {
            self.draft.remove(facet);
        } else {
            self.draft.insert(facet.to_string(), value.to_string());
        }
    }

    pub fn draft(&self) -> &FilterState {
        &self.draft
    }

    pub fn active(&self) -> &FilterState {
        &self.active
    }

    /// The Apply button guard: at least one facet chosen.
    pub fn can_search(&self) -> bool {
        self.draft.values().any(|v| !v.is_empty())
    }

    /// Submit: the full draft becomes the active state and is returned
    /// for the page to re-fetch with. Returns None when the guard holds
    /// the button disabled.
    pub fn apply(&mut self) -> Option<FilterState> {
        if !self.can_search() {
            return None;
        }
        self.active = self.draft.clone();
        Some(self.active.clone())
    }

    /// Reset both draft and active state to "no constraint".
    pub fn clear(&mut self) -> FilterState {
        self.draft.clear();
        self.active.clear();
        FilterState::new()
    }
}

/// Serialize filters into a query string, skipping empty entries and
/// percent-encoding values. An empty state serializes to "".
pub fn to_query_string(filters: &FilterState) -> String {
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for (facet, value) in filters {
        if !value.is_empty() {
            serializer.append_pair(facet, value);
        }
    }
    serializer.finish()
}
