//! Turning definitions into editor locations.

use std::path::Path;

use tower_lsp::lsp_types::{Location, LocationLink, Position, Range, Url};

use crate::project::{DefId, Project};

/// Declaration sites of a definition. No definition means no locations.
pub fn to_locations(project: &dyn Project, definition: Option<DefId>) -> Vec<Location> {
    match definition {
        Some(definition) => project.locations(definition),
        None => Vec::new(),
    }
}

/// Wrap locations as links that remember the range the lookup started from.
pub fn to_location_links(locations: Vec<Location>, origin: Range) -> Vec<LocationLink> {
    locations
        .into_iter()
        .map(|location| LocationLink {
            origin_selection_range: Some(origin),
            target_uri: location.uri,
            target_range: location.range,
            target_selection_range: location.range,
        })
        .collect()
}

/// The start of a file, for navigation that targets a whole file.
pub fn source_location(path: &Path) -> Option<Location> {
    let uri = Url::from_file_path(path).ok()?;
    let start = Position::new(0, 0);
    Some(Location::new(uri, Range::new(start, start)))
}
