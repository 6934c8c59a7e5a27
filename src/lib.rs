//! Core library for the lexicon command line application.
//!
//! The library keeps a tabular resource's data dictionary in step between a
//! local definitions file and a remote catalog's datastore. Responsibilities
//! are kept narrow: file adapters live under [`lexicon::tools::io`], the
//! shared records inside [`lexicon::tools::model`], the remote catalog behind
//! [`lexicon::tools::gateway`], the pre-write checks in
//! [`lexicon::tools::validate`] and [`lexicon::tools::confirm`], and the
//! download/upload orchestration under [`lexicon::tools::sync`].

pub mod lexicon;

pub use lexicon::tools::{
    Result, ToolError, config, confirm, error, gateway, io, logging, model, sync, validate,
};
