//! HTML preview of descriptor manifests.

pub mod html;

pub use html::render_html_report;
