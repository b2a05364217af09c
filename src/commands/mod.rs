// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod ask;
pub mod budgets;
pub mod categories;
pub mod cloud;
pub mod exporter;
pub mod importer;
pub mod ledgers;
pub mod reports;
pub mod settings;
pub mod smart;
pub mod transactions;
