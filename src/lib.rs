//! # Surveyor - survey builder core
//!
//! Surveyor models survey definitions (sections, subsections, fields and
//! shared option sets) and the respondent-side form pipeline that renders,
//! collects and submits answers.
//!
//! ## Features
//!
//! - **Default resolution**: new fields inherit type and option set from their subsection or section
//! - **Option sets**: rating scales and radio / multi-select / select sets, loaded asynchronously
//! - **Form state**: per-field values and errors with default seeding
//! - **Submission**: ordered validation and descriptive response keys
//! - **Import/Export**: portable JSON documents with wholesale structural validation
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use surveyor::domain::SurveyConfig;
//! use surveyor::form::FormSession;
//! use surveyor::persistence::InMemoryStore;
//! use surveyor::resolver::InMemoryOptionSetCache;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let mut survey = SurveyConfig::new("Customer feedback");
//!     survey.add_section("About Us").add_field("Email Address");
//!
//!     let store = InMemoryStore::new();
//!     let mut session = FormSession::new(survey, Arc::new(InMemoryOptionSetCache::new()));
//!     let receipt = session.submit("instance-1", &store).await?;
//!     println!("stored {} answers", receipt.response_count);
//!     Ok(())
//! }
//! ```
//!
//! ## Architecture
//!
//! - **Domain**: survey schema types and admin editing operations
//! - **Resolver**: default chain and render-time option resolution
//! - **Form**: state store, renderer, submission, debouncing
//! - **Persistence**: store traits and the in-memory adapter
//! - **Transfer**: import/export documents
//! - **Config**: settings and on-disk survey loading

pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod form;
pub mod persistence;
pub mod resolver;
pub mod transfer;
