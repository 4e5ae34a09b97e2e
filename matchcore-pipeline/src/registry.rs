use crate::adapter::SourceAdapter;
use hashbrown::HashMap;

/// Human-readable names for the adapters shipped with this binary, looked up
/// by id in CLI help and log lines. A `phf` map costs nothing at runtime and
/// needs no lazy-init, unlike the [`AdapterRegistry`] below which holds the
/// adapters' actual (non-const) `Arc<dyn Fn>` callbacks.
pub static KNOWN_ADAPTER_NAMES: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "ecnl" => "ECNL Platform",
    "gotsport" => "GotSport",
    "totalglobalsports" => "Total Global Sports",
    "demosphere" => "Demosphere",
};

/// Component B: Source Adapter Registry (spec.md §4.1, §9 "the registry is a
/// map from id to that value"). Adapters are inert value objects; the
/// registry just owns them and hands out clones to [`crate::engine`].
#[derive(Clone, Default)]
pub struct AdapterRegistry {
    adapters: HashMap<String, SourceAdapter>,
}

impl AdapterRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, adapter: SourceAdapter) {
        self.adapters.insert(adapter.id.clone(), adapter);
    }

    pub fn get(&self, id: &str) -> Option<&SourceAdapter> {
        self.adapters.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.adapters.keys().map(String::as_str)
    }
}
