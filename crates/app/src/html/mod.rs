//! Embedded static HTML assets served by the web UI.
//!
//! The assets are kept as `&'static str` so they can be bundled directly inside
//! the binary without filesystem lookups.

pub mod map;

/// Fill the map page template with the query endpoint and the result count
/// the page asks for.
pub fn render_map_page(endpoint: &str, limit: u32) -> String {
    map::MAP_PAGE_TEMPLATE
        .replace("{{NEAREST_ENDPOINT}}", endpoint)
        .replace("{{MAP_LIMIT}}", &limit.to_string())
}
