//! FormFit: companion service for the FormFit smart-upload browser
//! extension.
//!
//! Two pure cores do the real work: [`detector`] parses image-upload
//! requirements (dimensions, size limit) out of free-form page text, and
//! [`fitter`] resizes/compresses an image until it satisfies them.
//! Everything else (the HTTP gateway the extension talks to, the per-tab
//! requirement cache, the preference store, the CLI) is glue around those
//! two calls.

pub mod cache;
pub mod cli;
pub mod config;
pub mod detector;
pub mod fitter;
pub mod gateway;
pub mod logging;
pub mod prefs;
