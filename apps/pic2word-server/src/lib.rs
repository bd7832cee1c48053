//! pic2word Server Library
//!
//! Turns a photographed page into a Word document: the image is transcribed
//! to LaTeX by a hosted vision model, then converted to DOCX by pandoc.
//!
//! # Modules
//!
//! - `config`: Environment-based configuration
//! - `temp`: Scoped temp files for intermediate artifacts
//! - `transcribe`: Image to LaTeX through the Gemini API
//! - `convert`: LaTeX to DOCX through pandoc
//! - `routes`: HTTP handlers and the application router

pub mod config;
pub mod convert;
pub mod error;
pub mod middleware;
pub mod routes;
pub mod state;
pub mod temp;
pub mod transcribe;
