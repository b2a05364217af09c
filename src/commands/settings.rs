// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::app::App;
use crate::config::{self, ASSISTANT_API_KEY_KEY, REMOTE_KEY_KEY, REMOTE_SESSION_KEY};
use crate::utils::{pretty_table, required};
use anyhow::Result;

fn masked(key: &str, value: &str) -> String {
    if [ASSISTANT_API_KEY_KEY, REMOTE_KEY_KEY, REMOTE_SESSION_KEY].contains(&key) {
        "********".to_string()
    } else {
        value.to_string()
    }
}

pub fn handle(app: &mut App, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("get", sub)) => {
            let key = required(sub, "key")?;
            match config::get_setting(app.connection(), key)? {
                Some(v) => println!("{}", masked(key, &v)),
                None => println!("{} is not set", key),
            }
        }
        Some(("set", sub)) => {
            let key = required(sub, "key")?;
            let value = required(sub, "value")?;
            config::validate(key, value)?;
            config::set_setting(app.connection(), key, value)?;
            app.reload_settings()?;
            println!("{} = {}", key, masked(key, value));
        }
        Some(("list", _)) => {
            let rows = config::list_settings(app.connection())?
                .into_iter()
                .map(|(k, v)| {
                    let shown = masked(&k, &v);
                    vec![k, shown]
                })
                .collect();
            println!("{}", pretty_table(&["Key", "Value"], rows));
        }
        _ => {}
    }
    Ok(())
}
