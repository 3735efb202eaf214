// Word cloud generation flow.
// Implements: upload intake, the extract → tag → layout → render pipeline,
// the HTML upload page and the JSON API.

pub mod handlers;
pub mod page;
pub mod pipeline;
pub mod upload;
