//! Conversion pipeline for jup2jek.
//!
//! This crate ties together notebook discovery, the external nbconvert
//! command, asset folder relocation, and markdown link rewriting into a single
//! conversion pass over a Jekyll site (see [`pipeline::Orchestrator`]).

pub mod assets;
pub mod converter;
pub mod pipeline;
