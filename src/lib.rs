// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod cli;
pub mod config;
pub mod diff;
pub mod error;
pub mod flows;
pub mod models;
pub mod ranker;
pub mod table;
pub mod utils;
pub mod window;
pub mod commands;
