// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod app;
pub mod assistant;
pub mod book;
pub mod cli;
pub mod commands;
pub mod config;
pub mod db;
pub mod ingest;
pub mod models;
pub mod shell;
pub mod store;
pub mod summary;
pub mod sync;
pub mod utils;
