// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod cli;
pub mod db;
pub mod models;
pub mod ledger;
pub mod rewards;
pub mod utils;
pub mod commands;
